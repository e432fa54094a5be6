pub mod calendar;
pub mod error;
pub mod recurrence;
