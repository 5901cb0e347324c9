use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TabulaError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("Filter predicate must not be empty")]
    InvalidFilter,
    #[error("No table selected")]
    NoTableSelected,
    #[error("Schema '{0}' not found")]
    SchemaNotFound(String),
    #[error("Table '{0}' not found")]
    TableNotFound(String),
    #[error("Store read failed: {0}")]
    StoreReadFailure(String),
    #[error("Store write failed: {0}")]
    StoreWriteFailure(String),
    #[error("Frame conversion error: {0}")]
    FrameError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error("Arrow error: {0}")]
    ArrowError(String),
}

impl From<std::io::Error> for TabulaError {
    fn from(err: std::io::Error) -> Self {
        TabulaError::IoError(err.to_string())
    }
}

impl From<arrow::error::ArrowError> for TabulaError {
    fn from(err: arrow::error::ArrowError) -> Self {
        TabulaError::ArrowError(err.to_string())
    }
}
