use thiserror::Error;

/// Application-level errors (command line layer)
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    ServiceError(#[from] mocca_service::error::ServiceError),

    #[error(transparent)]
    RfcError(#[from] mocca_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] mocca_core::error::CoreError),

    #[error("Usage error: {0}")]
    UsageError(String),
}

pub type AppResult<T> = std::result::Result<T, AppError>;
