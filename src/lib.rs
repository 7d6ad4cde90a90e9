// src/lib.rs

pub mod config;
pub mod error;

pub mod models {
    pub mod report;
}

pub mod services {
    pub mod void_oracle;
    pub mod report_collector;
    pub mod report_writer;
}

pub use config::OracleConfig;
pub use error::OracleError;
pub use models::report::{QueryId, Report};
pub use services::report_collector::{CollectPolicy, Collection, ReportCollector, StopReason};
pub use services::void_oracle::{OracleSource, VoidOracleService};
