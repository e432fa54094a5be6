use chrono::{DateTime, FixedOffset, TimeDelta, Utc, Weekday};
use chrono_tz::Tz;
use mocca_core::types::RecurrenceKind;
use mocca_service::recurrence::{ExpansionOptions, RecurrenceSeries, expand};
use rrule::RRuleSet;

/// A series expanded from its anchor up to `window_end`, checked against
/// the `rrule` crate evaluating an equivalent rule bounded by `UNTIL`.
pub struct RecurrenceCase {
    pub name: &'static str,
    pub kind: RecurrenceKind,
    pub anchor: &'static str,
    pub duration_minutes: i64,
    pub timezone: Tz,
    pub weekdays: &'static [Weekday],
    pub window_end: &'static str,
    pub rruleset: &'static str,
    pub limit: u16,
}

pub fn recurrence_cases() -> Vec<RecurrenceCase> {
    vec![
        RecurrenceCase {
            name: "daily_utc",
            kind: RecurrenceKind::Daily,
            anchor: "2024-01-10T06:30:00+00:00",
            duration_minutes: 45,
            timezone: Tz::UTC,
            weekdays: &[],
            window_end: "2024-01-25T06:30:00+00:00",
            rruleset: "DTSTART:20240110T063000Z\nRRULE:FREQ=DAILY;UNTIL=20240125T063000Z",
            limit: 100,
        },
        RecurrenceCase {
            name: "weekly_across_dst",
            kind: RecurrenceKind::Weekly,
            anchor: "2024-03-01T09:00:00+01:00",
            duration_minutes: 60,
            timezone: chrono_tz::Europe::Berlin,
            weekdays: &[],
            window_end: "2024-05-01T00:00:00+00:00",
            rruleset: "DTSTART;TZID=Europe/Berlin:20240301T090000\nRRULE:FREQ=WEEKLY;UNTIL=20240501T000000Z",
            limit: 100,
        },
        RecurrenceCase {
            name: "biweekly_new_york",
            kind: RecurrenceKind::Biweekly,
            anchor: "2024-02-06T14:00:00-05:00",
            duration_minutes: 30,
            timezone: chrono_tz::America::New_York,
            weekdays: &[],
            window_end: "2024-07-01T00:00:00+00:00",
            rruleset: "DTSTART;TZID=America/New_York:20240206T140000\nRRULE:FREQ=WEEKLY;INTERVAL=2;UNTIL=20240701T000000Z",
            limit: 100,
        },
        RecurrenceCase {
            name: "workdays",
            kind: RecurrenceKind::Workdays,
            anchor: "2024-03-04T08:15:00+00:00",
            duration_minutes: 15,
            timezone: Tz::UTC,
            weekdays: &[],
            window_end: "2024-03-29T08:15:00+00:00",
            rruleset: "DTSTART:20240304T081500Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,TU,WE,TH,FR;UNTIL=20240329T081500Z",
            limit: 100,
        },
        RecurrenceCase {
            name: "custom_weekly_tue_thu",
            kind: RecurrenceKind::CustomWeekly,
            anchor: "1997-09-02T09:00:00+00:00",
            duration_minutes: 60,
            timezone: Tz::UTC,
            weekdays: &[Weekday::Tue, Weekday::Thu],
            window_end: "1997-10-01T00:00:00+00:00",
            rruleset: "DTSTART:19970902T090000Z\nRRULE:FREQ=WEEKLY;BYDAY=TU,TH;UNTIL=19971001T000000Z",
            limit: 100,
        },
        RecurrenceCase {
            name: "third_friday",
            kind: RecurrenceKind::MonthlySpecific,
            anchor: "2024-01-19T12:00:00+00:00",
            duration_minutes: 90,
            timezone: Tz::UTC,
            weekdays: &[],
            window_end: "2024-12-31T00:00:00+00:00",
            rruleset: "DTSTART:20240119T120000Z\nRRULE:FREQ=MONTHLY;BYDAY=3FR;UNTIL=20241231T000000Z",
            limit: 100,
        },
        RecurrenceCase {
            name: "yearly",
            kind: RecurrenceKind::Yearly,
            anchor: "2020-07-04T18:00:00+00:00",
            duration_minutes: 240,
            timezone: Tz::UTC,
            weekdays: &[],
            window_end: "2030-01-01T00:00:00+00:00",
            rruleset: "DTSTART:20200704T180000Z\nRRULE:FREQ=YEARLY;UNTIL=20300101T000000Z",
            limit: 100,
        },
    ]
}

pub fn parse_rfc3339(value: &str) -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(value)
        .unwrap_or_else(|err| panic!("Failed to parse datetime {value}: {err}"))
}

pub fn assert_case(case: &RecurrenceCase) {
    let anchor = parse_rfc3339(case.anchor).with_timezone(&Utc);
    let window_end = parse_rfc3339(case.window_end).with_timezone(&Utc);

    let series = RecurrenceSeries::builder(case.name, case.kind, anchor)
        .with_end(anchor + TimeDelta::minutes(case.duration_minutes))
        .with_timezone(case.timezone)
        .with_weekdays(case.weekdays.iter().copied())
        .build()
        .unwrap_or_else(|err| panic!("Invalid series {}: {}", case.name, err));

    let expansion = expand(&series, anchor, window_end, &ExpansionOptions::default());
    let actual: Vec<i64> = expansion
        .occurrences
        .iter()
        .map(|occurrence| occurrence.start.timestamp())
        .collect();

    let rrule_set: RRuleSet = case
        .rruleset
        .parse()
        .unwrap_or_else(|err| panic!("Failed to parse {}: {}", case.name, err));
    let expected: Vec<i64> = rrule_set
        .all(case.limit)
        .dates
        .iter()
        .map(chrono::DateTime::timestamp)
        .collect();

    assert!(!expected.is_empty(), "Case {} has no oracle dates", case.name);
    assert_eq!(actual, expected, "Case {} did not match", case.name);
    assert!(!expansion.truncated, "Case {} was truncated", case.name);
}
