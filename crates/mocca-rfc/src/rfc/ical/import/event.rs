//! Interpretation of single `VEVENT` components.

use chrono::{DateTime, Days, Months, Utc};
use chrono_tz::Tz;
use mocca_core::config::Settings;
use mocca_core::constants::DEFAULT_HORIZON_YEARS;

use super::description::assemble_description;
use super::rule::interpret_rule;
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::{Component, ContentLine};
use crate::rfc::ical::parse::{DateToken, parse_date_token};
use crate::rfc::ical::timezone::{TimeZoneResolver, localize, parse_zone, start_of_day};

/// Settings that shape how imported dates are read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Zone for floating date-times and all-day dates.
    pub default_zone: Tz,
    /// Years after the start at which a series without `UNTIL` ends.
    pub horizon_years: u32,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            default_zone: Tz::UTC,
            horizon_years: DEFAULT_HORIZON_YEARS,
        }
    }
}

impl ImportOptions {
    /// ## Summary
    /// Builds import options from the loaded settings.
    ///
    /// ## Errors
    /// Returns an error if the configured default time zone is unknown.
    pub fn from_settings(settings: &Settings) -> RfcResult<Self> {
        Ok(Self {
            default_zone: parse_zone(&settings.import.default_timezone)?,
            horizon_years: settings.recurrence.default_horizon_years,
        })
    }
}

/// When an imported event happens and whether it repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub start: DateTime<Utc>,
    /// Inclusive end; for all-day events the midnight of the last day.
    pub end: DateTime<Utc>,
    pub all_day: bool,
    /// Zone whose wall clock the event was written in.
    pub timezone: Tz,
    pub is_recurrent: bool,
    /// Recurrence kind tag; empty for single events.
    pub recurrence_frequency: String,
    /// Last allowed occurrence start of a recurring event.
    pub recurrence_end: Option<DateTime<Utc>>,
}

/// A `RECURRENCE-ID` override of one occurrence of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedModification {
    pub original_start: DateTime<Utc>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
}

/// A master `VEVENT` ready to be stored as a calendar event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedEvent {
    pub uid: String,
    pub title: String,
    pub description: String,
    pub schedule: Schedule,
    /// `EXDATE` instants.
    pub deletions: Vec<DateTime<Utc>>,
    pub modifications: Vec<ImportedModification>,
}

/// ## Summary
/// Reads `DTSTART`, `DTEND` and an optional `RRULE` into a [`Schedule`].
///
/// A token of at most eight characters makes the event all-day: its start
/// is midnight in the default zone and the exclusive `DTEND` date is moved
/// back one day. Timed tokens use their `TZID` or the default zone, unless
/// they end in `Z`. A recurring event ends at its `UNTIL` or, without one,
/// at the start date plus the configured horizon.
///
/// ## Errors
/// Returns an error if either date token is malformed.
pub fn interpret_schedule(
    dtstart: &ContentLine,
    dtend: &ContentLine,
    rrule: Option<&ContentLine>,
    resolver: &mut TimeZoneResolver,
    options: &ImportOptions,
) -> RfcResult<Schedule> {
    let start_token = parse_date_token(&dtstart.raw_value, dtstart.line)?;
    let end_token = parse_date_token(&dtend.raw_value, dtend.line)?;
    let all_day = start_token.is_all_day();

    let timezone = match start_token {
        DateToken::Date(_) => options.default_zone,
        DateToken::Utc(_) => Tz::UTC,
        DateToken::Local(_) => resolver.resolve_or_default(dtstart.tzid()),
    };

    let (start, mut end) = if all_day {
        let start_date = start_token.date();
        let last_day = end_token
            .date()
            .checked_sub_days(Days::new(1))
            .unwrap_or(start_date);
        (
            start_of_day(options.default_zone, start_date),
            start_of_day(options.default_zone, last_day),
        )
    } else {
        let end_zone = resolver.resolve_or_default(dtend.tzid().or(dtstart.tzid()));
        (
            token_instant(start_token, timezone),
            token_instant(end_token, end_zone),
        )
    };

    if end < start {
        tracing::warn!(
            line = dtend.line,
            %start,
            %end,
            "DTEND before DTSTART, clamping end to start"
        );
        end = start;
    }

    let mut schedule = Schedule {
        start,
        end,
        all_day,
        timezone,
        is_recurrent: false,
        recurrence_frequency: String::new(),
        recurrence_end: None,
    };

    if let Some(rrule) = rrule {
        let rule = interpret_rule(&rrule.raw_value);
        if rule.is_recurrent {
            schedule.is_recurrent = true;
            schedule.recurrence_frequency = rule.frequency;
            schedule.recurrence_end = Some(
                rule.until
                    .as_deref()
                    .and_then(|until| until_instant(until, rrule.line, timezone))
                    .unwrap_or_else(|| horizon_end(start, timezone, options.horizon_years)),
            );
        }
    }

    Ok(schedule)
}

/// Instant of a token read in `zone`; dates are taken at midnight.
fn token_instant(token: DateToken, zone: Tz) -> DateTime<Utc> {
    match token {
        DateToken::Date(date) => start_of_day(zone, date),
        DateToken::Local(local) => localize(zone, local),
        DateToken::Utc(utc) => utc.and_utc(),
    }
}

fn until_instant(raw: &str, line: usize, zone: Tz) -> Option<DateTime<Utc>> {
    match parse_date_token(raw, line) {
        Ok(token) => Some(token_instant(token, zone)),
        Err(e) => {
            tracing::debug!(error = %e, "Ignoring malformed UNTIL, using default horizon");
            None
        }
    }
}

/// Midnight of the start date plus `years`, in the event's zone.
fn horizon_end(start: DateTime<Utc>, zone: Tz, years: u32) -> DateTime<Utc> {
    let start_date = start.with_timezone(&zone).date_naive();
    let horizon_date = start_date
        .checked_add_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(start_date);
    start_of_day(zone, horizon_date)
}

fn required<'a>(event: &'a Component, property: &'static str) -> RfcResult<&'a ContentLine> {
    event
        .get_property(property)
        .ok_or_else(|| RfcError::MissingProperty {
            component: describe(event),
            property,
        })
}

fn describe(event: &Component) -> String {
    match event.raw_value("UID") {
        Some(uid) => format!("{} {uid} (line {})", event.name, event.line),
        None => format!("{} at line {}", event.name, event.line),
    }
}

/// ## Summary
/// Interprets a master `VEVENT` (one without `RECURRENCE-ID`).
///
/// `uid` is passed in because the batch importer substitutes a generated
/// one when the component has none. `EXDATE` values that cannot be parsed
/// are skipped.
///
/// ## Errors
/// Returns an error if `DTSTART` or `DTEND` is missing or malformed.
pub fn interpret_event(
    event: &Component,
    uid: String,
    resolver: &mut TimeZoneResolver,
    options: &ImportOptions,
) -> RfcResult<ImportedEvent> {
    let schedule = interpret_schedule(
        required(event, "DTSTART")?,
        required(event, "DTEND")?,
        event.get_property("RRULE"),
        resolver,
        options,
    )?;

    let deletions = event
        .get_properties("EXDATE")
        .into_iter()
        .flat_map(|exdate| exdate_instants(exdate, &schedule, resolver))
        .collect();

    Ok(ImportedEvent {
        uid,
        title: event
            .get_property("SUMMARY")
            .map(ContentLine::text)
            .unwrap_or_default(),
        description: assemble_description(event),
        schedule,
        deletions,
        modifications: Vec::new(),
    })
}

fn exdate_instants(
    exdate: &ContentLine,
    schedule: &Schedule,
    resolver: &mut TimeZoneResolver,
) -> Vec<DateTime<Utc>> {
    let zone = exdate
        .tzid()
        .map_or(schedule.timezone, |tzid| resolver.resolve_or_default(Some(tzid)));

    exdate
        .raw_value
        .split(',')
        .filter_map(|raw| match parse_date_token(raw, exdate.line) {
            Ok(token) => Some(token_instant(token, zone)),
            Err(e) => {
                tracing::debug!(error = %e, "Skipping malformed EXDATE");
                None
            }
        })
        .collect()
}

/// ## Summary
/// Interprets a `VEVENT` carrying `RECURRENCE-ID` as a modification of the
/// occurrence it names.
///
/// Only the parts the override actually carries are set. All-day values
/// follow the same rules as the master: midnight in the default zone, with
/// the exclusive end moved back a day.
///
/// ## Errors
/// Returns an error if `RECURRENCE-ID` is missing or any date is malformed.
pub fn interpret_override(
    event: &Component,
    master: &Schedule,
    resolver: &mut TimeZoneResolver,
    options: &ImportOptions,
) -> RfcResult<ImportedModification> {
    let recurrence_id = required(event, "RECURRENCE-ID")?;
    let original_token = parse_date_token(&recurrence_id.raw_value, recurrence_id.line)?;
    let original_start = override_instant(original_token, recurrence_id, master, resolver, options);

    let start = event
        .get_property("DTSTART")
        .map(|dtstart| {
            parse_date_token(&dtstart.raw_value, dtstart.line)
                .map(|token| override_instant(token, dtstart, master, resolver, options))
        })
        .transpose()?;

    let end = event
        .get_property("DTEND")
        .map(|dtend| {
            parse_date_token(&dtend.raw_value, dtend.line).map(|token| match token {
                DateToken::Date(date) => start_of_day(
                    options.default_zone,
                    date.checked_sub_days(Days::new(1)).unwrap_or(date),
                ),
                timed => override_instant(timed, dtend, master, resolver, options),
            })
        })
        .transpose()?;

    let description = assemble_description(event);

    Ok(ImportedModification {
        original_start,
        start,
        end,
        title: event.get_property("SUMMARY").map(ContentLine::text),
        description: (!description.is_empty()).then_some(description),
    })
}

fn override_instant(
    token: DateToken,
    property: &ContentLine,
    master: &Schedule,
    resolver: &mut TimeZoneResolver,
    options: &ImportOptions,
) -> DateTime<Utc> {
    let zone = match (token, property.tzid()) {
        (DateToken::Date(_), _) => options.default_zone,
        (_, Some(tzid)) => resolver.resolve_or_default(Some(tzid)),
        (_, None) => master.timezone,
    };
    token_instant(token, zone)
}
