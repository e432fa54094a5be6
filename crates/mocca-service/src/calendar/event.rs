//! Stored calendar events and the instances materialized from them.

use chrono::{DateTime, Days, Utc, Weekday};
use chrono_tz::Tz;
use mocca_core::types::RecurrenceKind;
use mocca_rfc::rfc::ical::timezone::start_of_day;
use serde::Serialize;

use crate::error::ServiceResult;
use crate::recurrence::{ExceptionSet, Occurrence, RecurrenceSeries, guess_end, weekdays_from_numbers};

/// Recurrence settings stored with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recurrence {
    pub kind: RecurrenceKind,
    /// Only used by `customWeekly`.
    pub weekdays: Vec<Weekday>,
    pub first_instance: Option<DateTime<Utc>>,
    pub last_instance: Option<DateTime<Utc>>,
}

impl Recurrence {
    #[must_use]
    pub const fn new(kind: RecurrenceKind) -> Self {
        Self {
            kind,
            weekdays: Vec::new(),
            first_instance: None,
            last_instance: None,
        }
    }

    #[must_use]
    pub fn with_weekdays(mut self, weekdays: impl IntoIterator<Item = Weekday>) -> Self {
        self.weekdays = weekdays.into_iter().collect();
        self
    }

    /// Weekdays as stored calendar numbers, 1 = Sunday ... 7 = Saturday.
    /// Numbers outside that range are ignored.
    #[must_use]
    pub fn with_weekday_numbers(mut self, numbers: &[u8]) -> Self {
        self.weekdays = weekdays_from_numbers(numbers);
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
}

/// ## Summary
/// A stored calendar event, single or recurring.
///
/// The end is inclusive; all-day events end at the midnight that starts
/// their last day. Exceptions only apply to recurring events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub timezone: Tz,
    pub recurrence: Option<Recurrence>,
    pub exceptions: ExceptionSet,
    /// Name of the calendar or file the event came from.
    pub source: Option<String>,
}

impl CalendarEvent {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, start: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            start,
            end: None,
            all_day: false,
            timezone: Tz::UTC,
            recurrence: None,
            exceptions: ExceptionSet::new(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

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
    pub fn with_recurrence(mut self, recurrence: impl Into<Option<Recurrence>>) -> Self {
        self.recurrence = recurrence.into();
        self
    }

    #[must_use]
    pub fn with_exceptions(mut self, exceptions: ExceptionSet) -> Self {
        self.exceptions = exceptions;
        self
    }

    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    #[must_use]
    pub const fn is_recurrent(&self) -> bool {
        self.recurrence.is_some()
    }

    /// The stored end, or the guessed one.
    #[must_use]
    pub fn effective_end(&self) -> DateTime<Utc> {
        self.end.unwrap_or_else(|| guess_end(self.start, self.all_day))
    }

    /// ## Summary
    /// The recurrence series of a recurring event; `None` for single events.
    ///
    /// ## Errors
    /// The inner result fails if the stored recurrence is inconsistent.
    #[must_use]
    pub fn series(&self) -> Option<ServiceResult<RecurrenceSeries>> {
        let recurrence = self.recurrence.as_ref()?;
        Some(
            RecurrenceSeries::builder(self.id.clone(), recurrence.kind, self.start)
                .with_end(self.end)
                .all_day(self.all_day)
                .with_timezone(self.timezone)
                .with_weekdays(recurrence.weekdays.iter().copied())
                .with_first_instance(recurrence.first_instance)
                .with_last_instance(recurrence.last_instance)
                .build(),
        )
    }

    /// The event itself as its only occurrence.
    #[must_use]
    pub fn single_occurrence(&self) -> Occurrence {
        Occurrence::regular(self.start, self.effective_end().max(self.start))
    }

    pub(crate) fn instance(
        &self,
        occurrence: &Occurrence,
        title: String,
        description: String,
    ) -> EventInstance {
        let recurrent = self.is_recurrent();
        EventInstance {
            event_id: self.id.clone(),
            start: occurrence.start,
            end: occurrence.end,
            end_exclusive: exclusive_end(occurrence.end, self.all_day, self.timezone),
            original_start: recurrent.then_some(occurrence.original_start),
            all_day: self.all_day,
            recurrent,
            title,
            description,
            description_html: None,
            text_color: None,
            background_color: None,
            modifiable: true,
            movable: !recurrent,
            source: self.source.clone(),
        }
    }
}

/// Next local midnight after an all-day end; timed ends are returned as is.
fn exclusive_end(end: DateTime<Utc>, all_day: bool, tz: Tz) -> DateTime<Utc> {
    if !all_day {
        return end;
    }
    end.with_timezone(&tz)
        .date_naive()
        .checked_add_days(Days::new(1))
        .map_or(end, |next| start_of_day(tz, next))
}

/// One materialized occurrence as handed to renderers.
///
/// Colors and the HTML description belong to rendering and are left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInstance {
    pub event_id: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub end_exclusive: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_start: Option<DateTime<Utc>>,
    pub all_day: bool,
    pub recurrent: bool,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_html: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    pub modifiable: bool,
    pub movable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .expect("valid test datetime")
            .and_utc()
    }

    #[test]
    fn all_day_instance_ends_exclusively_at_next_midnight() {
        let event = CalendarEvent::new("e", "Holiday", utc("2024-03-30 23:00"))
            .with_end(utc("2024-03-30 23:00"))
            .with_timezone(chrono_tz::Europe::Berlin)
            .all_day(true);

        let instance = event.instance(&event.single_occurrence(), "Holiday".into(), String::new());
        // 2024-03-31 is 23 hours long; the next midnight is 00:00 CEST.
        assert_eq!(instance.end_exclusive, utc("2024-03-31 22:00"));
        assert!(instance.movable);
        assert_eq!(instance.original_start, None);
    }

    #[test]
    fn recurring_instances_are_not_movable() {
        let event = CalendarEvent::new("e", "Standup", utc("2024-03-04 09:00"))
            .with_recurrence(Recurrence::new(RecurrenceKind::Daily));
        let instance = event.instance(&event.single_occurrence(), "Standup".into(), String::new());

        assert!(instance.recurrent);
        assert!(!instance.movable);
        assert!(instance.modifiable);
        assert_eq!(instance.end, utc("2024-03-04 09:30"));
        assert_eq!(instance.end_exclusive, instance.end);
        assert_eq!(instance.original_start, Some(utc("2024-03-04 09:00")));
    }

    #[test]
    fn stored_weekday_numbers_feed_the_series() {
        let recurrence = Recurrence::new(RecurrenceKind::CustomWeekly).with_weekday_numbers(&[5, 3, 9]);
        assert_eq!(recurrence.weekdays, [Weekday::Thu, Weekday::Tue]);

        let series = CalendarEvent::new("gym", "Gym", utc("2024-03-05 10:00"))
            .with_recurrence(recurrence)
            .series()
            .expect("recurring event")
            .expect("valid series");
        assert_eq!(series.weekdays(), &[Weekday::Tue, Weekday::Thu]);
    }

    #[test]
    fn instance_serializes_camel_case() {
        let event = CalendarEvent::new("e", "Lunch", utc("2024-03-04 12:00")).with_source("team.ics");
        let instance = event.instance(&event.single_occurrence(), "Lunch".into(), String::new());
        let json = serde_json::to_value(&instance).expect("serializable");

        assert_eq!(json["eventId"], "e");
        assert_eq!(json["allDay"], false);
        assert_eq!(json["source"], "team.ics");
        assert!(json.get("textColor").is_none());
    }
}
