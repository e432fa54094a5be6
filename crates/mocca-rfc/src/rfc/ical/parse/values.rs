//! Raw value parsers: text, date tokens and recurrence rule parts.

use chrono::{NaiveDate, NaiveDateTime};

use super::error::{ParseError, ParseErrorKind, ParseResult};

/// Unescapes text values (RFC 5545 §3.3.11).
///
/// Escape sequences: \\ \, \; \n \N
#[must_use]
pub fn unescape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => result.push('\n'),
            Some(escaped @ (',' | ';' | '\\')) => result.push(escaped),
            Some(other) => {
                result.push('\\');
                result.push(other);
            }
            None => result.push('\\'),
        }
    }

    result
}

/// A `DTSTART`/`DTEND`/`UNTIL`/`RECURRENCE-ID` token.
///
/// Tokens of at most 8 characters are dates (all-day); longer ones carry a
/// time of day, in UTC when suffixed with `Z` and in some zone otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateToken {
    /// `yyyyMMdd`
    Date(NaiveDate),
    /// `yyyyMMdd'T'HHmmss`, interpreted in a `TZID` or the default zone.
    Local(NaiveDateTime),
    /// `yyyyMMdd'T'HHmmssZ`
    Utc(NaiveDateTime),
}

impl DateToken {
    #[must_use]
    pub const fn is_all_day(&self) -> bool {
        matches!(self, Self::Date(_))
    }

    /// Calendar date of the token, ignoring any time of day.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::Local(dt) | Self::Utc(dt) => dt.date(),
        }
    }
}

/// Parses a date or date-time token.
///
/// ## Errors
/// Returns `InvalidDate` or `InvalidDateTime` when the token does not match
/// `yyyyMMdd` or `yyyyMMdd'T'HHmmss[Z]`.
pub fn parse_date_token(raw: &str, line: usize) -> ParseResult<DateToken> {
    let token = raw.trim();

    if token.len() <= 8 {
        if token.len() != 8 || !token.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseError::new(ParseErrorKind::InvalidDate, line, 1)
                .with_context(format!("'{token}'")));
        }
        return NaiveDate::parse_from_str(token, "%Y%m%d")
            .map(DateToken::Date)
            .map_err(|e| {
                ParseError::new(ParseErrorKind::InvalidDate, line, 1)
                    .with_context(format!("'{token}': {e}"))
            });
    }

    let (local, is_utc) = match token.strip_suffix(['Z', 'z']) {
        Some(stripped) => (stripped, true),
        None => (token, false),
    };

    if local.len() != 15 {
        return Err(ParseError::new(ParseErrorKind::InvalidDateTime, line, 1)
            .with_context(format!("'{token}'")));
    }

    let parsed = NaiveDateTime::parse_from_str(local, "%Y%m%dT%H%M%S").map_err(|e| {
        ParseError::new(ParseErrorKind::InvalidDateTime, line, 1)
            .with_context(format!("'{token}': {e}"))
    })?;

    Ok(if is_utc {
        DateToken::Utc(parsed)
    } else {
        DateToken::Local(parsed)
    })
}

/// The `RRULE` parts the importer understands.
///
/// Values are kept close to their textual form so the interpreter can apply
/// its own, deliberately lossy, mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleParts {
    pub freq: Option<String>,
    pub interval: Option<u32>,
    /// Upper-cased `BYDAY` tokens, e.g. `MO` or `1FR`.
    pub by_day: Vec<String>,
    /// Raw `UNTIL` token.
    pub until: Option<String>,
}

/// Splits an `RRULE` value into the parts the importer understands.
///
/// Parts may come in any order. Unknown keys and segments without `=` are
/// ignored, as is a non-numeric `INTERVAL`.
#[must_use]
pub fn parse_rule_parts(raw: &str) -> RuleParts {
    let mut parts = RuleParts::default();

    for segment in raw.split(';').map(str::trim).filter(|s| !s.is_empty()) {
        let Some((key, value)) = segment.split_once('=') else {
            tracing::trace!(segment, "Ignoring RRULE segment without '='");
            continue;
        };
        let value = value.trim();

        match key.trim().to_ascii_uppercase().as_str() {
            "FREQ" => parts.freq = Some(value.to_string()),
            "INTERVAL" => {
                parts.interval = value.parse().ok();
                if parts.interval.is_none() {
                    tracing::debug!(interval = value, "Ignoring non-numeric RRULE INTERVAL");
                }
            }
            "BYDAY" => {
                parts.by_day = value
                    .split(',')
                    .map(|day| day.trim().to_ascii_uppercase())
                    .filter(|day| !day.is_empty())
                    .collect();
            }
            "UNTIL" => parts.until = Some(value.to_string()),
            other => tracing::trace!(key = other, "Ignoring unsupported RRULE part"),
        }
    }

    parts
}
