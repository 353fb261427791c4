use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("SCHEMA_INVALID: {0}")]
    Schema(String),
    #[error("NO_DATA: {0}")]
    NoData(String),
    #[error("DISPATCH_FAILED: {0}")]
    Dispatch(String),
    #[error("PERSISTENCE_FAILED: {0}")]
    Persistence(String),
    #[error("CONFIG_INVALID: {0}")]
    Config(String),
    #[error("IO_FAILURE: {0}")]
    Io(String),
    #[error("INTERNAL: {0}")]
    Internal(String),
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(value: reqwest::Error) -> Self {
        Self::Dispatch(value.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(value: rust_xlsxwriter::XlsxError) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(value: anyhow::Error) -> Self {
        Self::Internal(value.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
