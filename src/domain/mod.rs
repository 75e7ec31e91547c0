// Domain layer: what crosses the service boundary, and the ports the rest of the crate talks through.

pub mod catalog;
pub mod cim;
pub mod model;
pub mod ports;

pub use catalog::{AnalysisKind, ElementKind};
pub use cim::CimExportOptions;
pub use model::{
    AnalysisResponse, ElementRow, ElementTable, ExportReport, ImportReport, KeyValueTable,
    ProjectRef,
};
pub use ports::{ConfigProvider, RemoteGateway, Storage};
