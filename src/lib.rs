//! Client reporting for the agency CRM: funnel, revenue, traffic sources,
//! growth timeline, KPIs, state distribution and origin performance,
//! computed from a collection of client records.

pub mod config;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod sample;
pub mod types;
pub mod util;

pub use config::{AppConfig, RecordSource};
pub use error::{ReportError, ReportResult};
pub use types::{ClientRecord, ClientStatus};
