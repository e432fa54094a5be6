//! Validated recurrence series and their occurrence arithmetic.

use chrono::{DateTime, Days, NaiveDateTime, TimeDelta, Utc, Weekday};
use chrono_tz::Tz;
use mocca_core::constants::DEFAULT_EVENT_DURATION_MINUTES;
use mocca_core::types::RecurrenceKind;
use mocca_rfc::rfc::ical::timezone::{localize, start_of_day};

use super::occurrence::Occurrence;
use crate::error::{ServiceError, ServiceResult};

/// ## Summary
/// End assumed for an event stored without one.
///
/// All-day events end on their start day; timed events last 30 minutes.
#[must_use]
pub fn guess_end(start: DateTime<Utc>, all_day: bool) -> DateTime<Utc> {
    if all_day {
        start
    } else {
        start + TimeDelta::minutes(DEFAULT_EVENT_DURATION_MINUTES)
    }
}

/// How far each occurrence's end lies after its start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OccurrenceLength {
    /// All-day: the end is midnight this many local days after the start.
    WholeDays(u64),
    /// Timed: a fixed span of real time.
    Exact(TimeDelta),
}

/// A validated recurrence definition.
///
/// Built through [`RecurrenceSeries::builder`], which normalizes all-day
/// anchors to local midnight and rejects inconsistent bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecurrenceSeries {
    id: String,
    kind: RecurrenceKind,
    anchor_start: DateTime<Utc>,
    anchor_end: DateTime<Utc>,
    all_day: bool,
    timezone: Tz,
    weekdays: Vec<Weekday>,
    first_instance: Option<DateTime<Utc>>,
    last_instance: Option<DateTime<Utc>>,
    length: OccurrenceLength,
}

impl RecurrenceSeries {
    #[must_use]
    pub fn builder(
        id: impl Into<String>,
        kind: RecurrenceKind,
        anchor_start: DateTime<Utc>,
    ) -> RecurrenceSeriesBuilder {
        RecurrenceSeriesBuilder {
            id: id.into(),
            kind,
            start: anchor_start,
            end: None,
            all_day: false,
            timezone: Tz::UTC,
            weekdays: Vec::new(),
            first_instance: None,
            last_instance: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn kind(&self) -> RecurrenceKind {
        self.kind
    }

    #[must_use]
    pub const fn anchor_start(&self) -> DateTime<Utc> {
        self.anchor_start
    }

    #[must_use]
    pub const fn anchor_end(&self) -> DateTime<Utc> {
        self.anchor_end
    }

    #[must_use]
    pub const fn all_day(&self) -> bool {
        self.all_day
    }

    #[must_use]
    pub const fn timezone(&self) -> Tz {
        self.timezone
    }

    /// Weekdays of a `customWeekly` series, Sunday first.
    #[must_use]
    pub fn weekdays(&self) -> &[Weekday] {
        &self.weekdays
    }

    #[must_use]
    pub const fn first_instance(&self) -> Option<DateTime<Utc>> {
        self.first_instance
    }

    #[must_use]
    pub const fn last_instance(&self) -> Option<DateTime<Utc>> {
        self.last_instance
    }

    #[must_use]
    pub const fn length(&self) -> OccurrenceLength {
        self.length
    }

    /// Real time between the anchor's start and end.
    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.anchor_end - self.anchor_start
    }

    /// The anchor start as wall-clock time in the series zone.
    #[must_use]
    pub fn local_anchor(&self) -> NaiveDateTime {
        self.to_local(self.anchor_start)
    }

    #[must_use]
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.timezone).naive_local()
    }

    /// ## Summary
    /// The occurrence starting at wall-clock time `local`.
    ///
    /// Returns `None` when the end cannot be represented.
    #[must_use]
    pub fn occurrence_at(&self, local: NaiveDateTime) -> Option<Occurrence> {
        let start = localize(self.timezone, local);
        let end = match self.length {
            OccurrenceLength::WholeDays(days) => start_of_day(
                self.timezone,
                local.date().checked_add_days(Days::new(days))?,
            ),
            OccurrenceLength::Exact(span) => start.checked_add_signed(span)?,
        };
        Some(Occurrence::regular(start, end))
    }

    /// ## Summary
    /// The occurrence whose rule-produced start is `original_start`.
    ///
    /// The start is not checked against the rule.
    #[must_use]
    pub fn occurrence_starting(&self, original_start: DateTime<Utc>) -> Option<Occurrence> {
        self.occurrence_at(self.to_local(original_start))
    }
}

/// Builder for [`RecurrenceSeries`].
#[derive(Debug, Clone)]
pub struct RecurrenceSeriesBuilder {
    id: String,
    kind: RecurrenceKind,
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    all_day: bool,
    timezone: Tz,
    weekdays: Vec<Weekday>,
    first_instance: Option<DateTime<Utc>>,
    last_instance: Option<DateTime<Utc>>,
}

impl RecurrenceSeriesBuilder {
    /// Sets the anchor's end. Without one, [`guess_end`] applies.
    #[must_use]
    pub fn with_end(mut self, end: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.end = end.into();
        self
    }

    #[must_use]
    pub const fn all_day(mut self, all_day: bool) -> Self {
        self.all_day = all_day;
        self
    }

    #[must_use]
    pub const fn with_timezone(mut self, timezone: Tz) -> Self {
        self.timezone = timezone;
        self
    }

    #[must_use]
    pub fn with_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_first_instance(mut self, first: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.first_instance = first.into();
        self
    }

    #[must_use]
    pub fn with_last_instance(mut self, last: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.last_instance = last.into();
        self
    }

    /// ## Summary
    /// Validates and normalizes the series.
    ///
    /// All-day anchors are moved to local midnight and their length becomes
    /// a whole number of days.
    ///
    /// ## Errors
    /// Returns `ServiceError::InvalidSeries` if the end precedes the start,
    /// the last instance precedes the first, or a `customWeekly` series has
    /// no weekdays.
    pub fn build(self) -> ServiceResult<RecurrenceSeries> {
        let invalid = |reason: &str| ServiceError::InvalidSeries {
            series: self.id.clone(),
            reason: reason.to_string(),
        };

        let tz = self.timezone;
        let raw_end = self.end.unwrap_or_else(|| guess_end(self.start, self.all_day));
        if raw_end < self.start {
            return Err(invalid("end precedes start"));
        }

        if let (Some(first), Some(last)) = (self.first_instance, self.last_instance)
            && last < first
        {
            return Err(invalid("last instance precedes first instance"));
        }

        let mut weekdays = self.weekdays.clone();
        weekdays.sort_by_key(Weekday::num_days_from_sunday);
        weekdays.dedup();
        if self.kind.uses_weekday_set() && weekdays.is_empty() {
            return Err(invalid("customWeekly series needs at least one weekday"));
        }

        let (anchor_start, anchor_end, length) = if self.all_day {
            let start_date = self.start.with_timezone(&tz).date_naive();
            let end_date = raw_end.with_timezone(&tz).date_naive();
            let days = (end_date - start_date).num_days().unsigned_abs();
            (
                start_of_day(tz, start_date),
                start_of_day(tz, end_date),
                OccurrenceLength::WholeDays(days),
            )
        } else {
            (
                self.start,
                raw_end,
                OccurrenceLength::Exact(raw_end - self.start),
            )
        };

        Ok(RecurrenceSeries {
            id: self.id,
            kind: self.kind,
            anchor_start,
            anchor_end,
            all_day: self.all_day,
            timezone: tz,
            weekdays,
            first_instance: self.first_instance,
            last_instance: self.last_instance,
            length,
        })
    }
}
