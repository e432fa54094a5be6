//! Mapping of imported `RRULE`s onto the recurrence kinds the calendar stores.
//!
//! The mapping is intentionally lossy. Rules the generators cannot express
//! are imported as plain events instead of being approximated.

use crate::rfc::ical::parse::{RuleParts, parse_rule_parts};

const WORKDAY_TOKENS: [&str; 5] = ["MO", "TU", "WE", "TH", "FR"];

/// Result of interpreting an `RRULE` value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleInterpretation {
    pub is_recurrent: bool,
    /// Recurrence kind tag (`weekly`, `workdays`, ...); empty when not recurrent.
    pub frequency: String,
    /// Raw `UNTIL` token, resolved later with the event's time zone.
    pub until: Option<String>,
}

/// ## Summary
/// Interprets an `RRULE` value.
///
/// Never fails: unsupported or malformed content yields a non-recurrent
/// interpretation.
#[must_use]
pub fn interpret_rule(raw: &str) -> RuleInterpretation {
    let parts = parse_rule_parts(raw);
    let frequency = frequency_tag(&parts);
    tracing::trace!(rrule = raw, frequency = %frequency, "Interpreted RRULE");

    RuleInterpretation {
        is_recurrent: !frequency.is_empty(),
        frequency,
        until: parts.until,
    }
}

/// ## Summary
/// Picks the recurrence kind tag for the given rule parts.
///
/// `WEEKLY` becomes `workdays` when `BYDAY` lists Monday through Friday,
/// `biweekly` when `INTERVAL=2`, nothing when `BYDAY` names several days
/// (or an ordinal day) and `weekly` otherwise. Any other `FREQ` is
/// passed through lower-cased. A missing `FREQ` yields an empty tag.
#[must_use]
pub fn frequency_tag(parts: &RuleParts) -> String {
    let Some(freq) = parts.freq.as_deref() else {
        tracing::debug!("RRULE without FREQ, importing as single event");
        return String::new();
    };

    if !freq.eq_ignore_ascii_case("WEEKLY") {
        return freq.to_ascii_lowercase();
    }

    if WORKDAY_TOKENS
        .iter()
        .all(|day| parts.by_day.iter().any(|token| token == day))
    {
        return "workdays".to_string();
    }

    if parts.interval == Some(2) {
        return "biweekly".to_string();
    }

    let single_plain_day = match parts.by_day.as_slice() {
        [] => true,
        [day] => day.len() <= 2,
        _ => false,
    };
    if !single_plain_day {
        tracing::debug!(
            by_day = ?parts.by_day,
            "Weekly RRULE with unsupported BYDAY, importing as single event"
        );
        return String::new();
    }

    if parts.interval.is_some_and(|interval| interval > 2) {
        tracing::debug!(
            interval = parts.interval,
            "Weekly RRULE interval is not representable, importing as weekly"
        );
    }

    "weekly".to_string()
}
