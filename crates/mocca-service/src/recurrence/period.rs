//! Period generators: each advances a wall-clock cursor by one period.
//!
//! Generators are pure and strictly increasing. They return `None` only when
//! the next cursor falls outside the representable calendar.

use chrono::{Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};

/// One step of a single-period recurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// A fixed number of local days (daily, weekly, biweekly).
    Days(u32),
    /// The next Monday to Friday day.
    Workdays,
    /// `step` months later on `day_of_month`, clamped to the month's last day.
    Months { step: u32, day_of_month: u32 },
    /// The same weekday at the same ordinal in the next month, or the last
    /// such weekday when that month has fewer.
    NthWeekday { ordinal: u8 },
}

impl Period {
    /// ## Summary
    /// Period that keeps the anchor's day of month.
    #[must_use]
    pub fn months_from(anchor: NaiveDateTime, step: u32) -> Self {
        Self::Months {
            step,
            day_of_month: anchor.day(),
        }
    }

    /// ## Summary
    /// Period that keeps the anchor's weekday ordinal, e.g. the 3rd Friday.
    ///
    /// The ordinal counts occurrences of the anchor's weekday from the first
    /// of the month up to and including the anchor day.
    #[must_use]
    pub fn nth_weekday_from(anchor: NaiveDateTime) -> Self {
        Self::NthWeekday {
            ordinal: weekday_ordinal(anchor.date()),
        }
    }

    /// The cursor one period after `cursor`, keeping its time of day.
    #[must_use]
    pub fn next(&self, cursor: NaiveDateTime) -> Option<NaiveDateTime> {
        let time = cursor.time();
        let date = cursor.date();

        let next_date = match *self {
            Self::Days(days) => date.checked_add_days(Days::new(u64::from(days.max(1))))?,
            Self::Workdays => next_workday(date)?,
            Self::Months { step, day_of_month } => {
                let first = first_of_month(date).checked_add_months(Months::new(step.max(1)))?;
                let day = day_of_month.min(days_in_month(first)?);
                first.with_day(day)?
            }
            Self::NthWeekday { ordinal } => {
                let first = first_of_month(date).checked_add_months(Months::new(1))?;
                nth_weekday_or_last(first.year(), first.month(), date.weekday(), ordinal)?
            }
        };

        Some(next_date.and_time(time))
    }

    /// ## Summary
    /// Jumps from `anchor` towards `target` without passing it.
    ///
    /// Returns a cursor of this period's sequence that lies on or before
    /// `target`'s date, or `anchor` itself when no safe jump exists. Used to
    /// skip ahead of long-running series without stepping period by period.
    #[must_use]
    pub fn fast_forward(&self, anchor: NaiveDateTime, target: NaiveDate) -> NaiveDateTime {
        let gap = (target - anchor.date()).num_days();
        let stride = match *self {
            Self::Days(days) => u64::from(days.max(1)),
            Self::Workdays if is_workday(anchor.weekday()) => 7,
            Self::Workdays | Self::Months { .. } | Self::NthWeekday { .. } => return anchor,
        };
        if gap <= 0 {
            return anchor;
        }

        let jump = gap.unsigned_abs() / stride * stride;
        anchor
            .date()
            .checked_add_days(Days::new(jump))
            .map_or(anchor, |date| date.and_time(anchor.time()))
    }

    /// Lazily yields `start` followed by every later cursor.
    #[must_use]
    pub const fn cursors(self, start: NaiveDateTime) -> PeriodCursors {
        PeriodCursors {
            period: self,
            next: Some(start),
        }
    }
}

/// Iterator over the cursors of a [`Period`].
#[derive(Debug, Clone)]
pub struct PeriodCursors {
    period: Period,
    next: Option<NaiveDateTime>,
}

impl Iterator for PeriodCursors {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.period.next(current);
        Some(current)
    }
}

const fn is_workday(weekday: Weekday) -> bool {
    !matches!(weekday, Weekday::Sat | Weekday::Sun)
}

fn next_workday(date: NaiveDate) -> Option<NaiveDate> {
    let skip = match date.weekday() {
        Weekday::Fri => 3,
        Weekday::Sat => 2,
        _ => 1,
    };
    date.checked_add_days(Days::new(skip))
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn days_in_month(first: NaiveDate) -> Option<u32> {
    let next = first.checked_add_months(Months::new(1))?;
    Some(next.pred_opt()?.day())
}

/// 1-based ordinal of `date`'s weekday within its month.
fn weekday_ordinal(date: NaiveDate) -> u8 {
    // Days are 1..=31, so the ordinal is 1..=5.
    u8::try_from((date.day() - 1) / 7 + 1).unwrap_or(5)
}

fn nth_weekday_or_last(year: i32, month: u32, weekday: Weekday, ordinal: u8) -> Option<NaiveDate> {
    (1..=ordinal.max(1))
        .rev()
        .find_map(|n| NaiveDate::from_weekday_of_month_opt(year, month, weekday, n))
}
