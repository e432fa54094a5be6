use thiserror::Error;

/// Service layer errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    RfcError(#[from] mocca_rfc::error::RfcError),

    #[error(transparent)]
    CoreError(#[from] mocca_core::error::CoreError),

    #[error("Invalid recurrence series {series}: {reason}")]
    InvalidSeries { series: String, reason: String },

    #[error("Invariant violation: {0}")]
    InvariantViolation(&'static str),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
