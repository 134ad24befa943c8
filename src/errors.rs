//! Error types for DataLens

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported input format: {0}")]
    UnsupportedFormat(String),

    #[error("Dataset contains no data rows")]
    EmptyDataset,

    #[error("Input is {actual} bytes, which exceeds the {limit} byte limit")]
    FileTooLarge { actual: usize, limit: usize },

    #[error("Inconsistent row shape: {0}")]
    RowShape(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

impl From<calamine::XlsxError> for ProfileError {
    fn from(err: calamine::XlsxError) -> Self {
        ProfileError::Spreadsheet(err.to_string())
    }
}
