use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp {value:?} on row {row}")]
    InvalidTimestamp { row: usize, value: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ReportResult<T> = Result<T, ReportError>;
