use thiserror::Error;

use crate::rfc::ical::parse::ParseError;
use crate::rfc::ical::timezone::ConversionError;

/// RFC parsing and import errors
#[derive(Error, Debug)]
pub enum RfcError {
    #[error(transparent)]
    ParseError(#[from] ParseError),

    #[error("Missing required property {property} in {component}")]
    MissingProperty {
        component: String,
        property: &'static str,
    },

    #[error(transparent)]
    TimezoneError(#[from] ConversionError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    CoreError(#[from] mocca_core::error::CoreError),
}

pub type RfcResult<T> = std::result::Result<T, RfcError>;
