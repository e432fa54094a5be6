//! iCalendar (RFC 5545) support for calendar import.
//!
//! Only the subset needed to turn `VEVENT`s into recurrence series is
//! modelled: content lines, the component tree, date tokens and the
//! `FREQ`/`INTERVAL`/`BYDAY`/`UNTIL` rule parts.

pub mod core;
pub mod import;
pub mod parse;
pub mod timezone;
