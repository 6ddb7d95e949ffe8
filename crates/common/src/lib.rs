pub mod audit;
pub mod config;
pub mod csv;
pub mod entities;
pub mod error;
pub mod models;

pub use audit::{AuditDetail, AuditReportRow, normalize};
pub use config::AppConfig;
pub use csv::{CsvRow, to_csv};
pub use error::{InventoryError, Result};
