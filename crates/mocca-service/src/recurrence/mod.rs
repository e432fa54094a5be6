//! Recurrence expansion: period generators, the window expander and the
//! exception overlay.
//!
//! Everything here is pure computation over immutable inputs. Wall-clock
//! arithmetic happens in the series' own time zone so that, for example, a
//! weekly 09:00 meeting stays at 09:00 across DST changes.

pub mod expander;
pub mod occurrence;
pub mod overlay;
pub mod period;
pub mod registry;
pub mod series;
pub mod weekday_set;

pub use expander::{Expansion, ExpansionOptions, expand};
pub use occurrence::{Occurrence, OccurrenceStatus};
pub use overlay::{
    ExceptionSet, InstanceKey, Modification, OverlayResult, ResolvedOccurrence, SeriesText,
    UnmatchedModification, apply_exceptions,
};
pub use period::Period;
pub use registry::{Strategy, strategy_for};
pub use series::{OccurrenceLength, RecurrenceSeries, RecurrenceSeriesBuilder, guess_end};
pub use weekday_set::weekdays_from_numbers;
