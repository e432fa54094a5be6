//! Maps each [`RecurrenceKind`] to the way its cursors advance.

use chrono::NaiveDateTime;
use mocca_core::types::RecurrenceKind;

use super::period::Period;

/// How a series produces its sequence of wall-clock cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One occurrence per period, starting at the anchor.
    Periodic(Period),
    /// One occurrence per selected weekday, every week.
    WeekdaySet,
}

/// ## Summary
/// Resolves the strategy for `kind`, deriving any parameters from the
/// series' local anchor (day of month, weekday ordinal).
#[must_use]
pub fn strategy_for(kind: RecurrenceKind, local_anchor: NaiveDateTime) -> Strategy {
    match kind {
        RecurrenceKind::Daily => Strategy::Periodic(Period::Days(1)),
        RecurrenceKind::Workdays => Strategy::Periodic(Period::Workdays),
        RecurrenceKind::Weekly => Strategy::Periodic(Period::Days(7)),
        RecurrenceKind::Biweekly => Strategy::Periodic(Period::Days(14)),
        RecurrenceKind::CustomWeekly => Strategy::WeekdaySet,
        RecurrenceKind::Monthly => Strategy::Periodic(Period::months_from(local_anchor, 1)),
        RecurrenceKind::MonthlySpecific => Strategy::Periodic(Period::nth_weekday_from(local_anchor)),
        RecurrenceKind::Yearly => Strategy::Periodic(Period::months_from(local_anchor, 12)),
    }
}
