pub mod artifacts;
pub mod orchestrator;

pub use crate::domain::model::{AnalysisResponse, ProjectRef};
pub use crate::domain::ports::{ConfigProvider, RemoteGateway, Storage};
pub use crate::utils::error::Result;
pub use orchestrator::{AnalysisOrchestrator, AnalysisRun, RunOutcome, RunRequest, RunStep};
