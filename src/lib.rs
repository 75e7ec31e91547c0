pub mod config;
pub mod core;
pub mod domain;
pub mod service;
pub mod soap;
pub mod utils;

#[cfg(feature = "cli")]
pub mod app;

#[cfg(feature = "cli")]
pub use crate::config::{cli::LocalStorage, CliConfig};

pub use crate::config::ConnectionConfig;
pub use crate::core::{AnalysisOrchestrator, AnalysisRun, RunOutcome, RunRequest};
pub use crate::domain::{CimExportOptions, ProjectRef};
pub use crate::service::NeplanService;
pub use crate::soap::HttpGateway;
pub use crate::utils::error::{NeplanError, Result};
