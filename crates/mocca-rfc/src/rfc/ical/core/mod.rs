//! iCalendar core models (RFC 5545).
//!
//! Values are kept as raw strings; interpretation happens in the import
//! layer where the default time zone and horizon are known.

mod component;
mod property;

pub use component::Component;
pub use property::{ContentLine, Parameter};
