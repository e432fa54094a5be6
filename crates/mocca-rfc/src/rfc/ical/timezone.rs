//! Time zone resolution and UTC conversion for imported date-times.
//!
//! Uses ICU4X for Windows time zone ID to IANA mapping and alias
//! canonicalization; offsets come from `chrono-tz`.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;
use icu::time::zone::WindowsParser;
use icu::time::zone::iana::IanaParserExtended;
use std::collections::HashMap;
use std::str::FromStr;

/// Error during time zone resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConversionError {
    #[error("Unknown timezone: {0}")]
    UnknownTimezone(String),
}

/// ## Summary
/// Resolves a zone name (IANA, IANA alias, Windows name or vendor-prefixed
/// `TZID`) to a `chrono_tz::Tz`.
///
/// ## Errors
/// Returns `ConversionError::UnknownTimezone` when no mapping exists.
pub fn parse_zone(name: &str) -> Result<Tz, ConversionError> {
    let normalized = normalize_tzid(name.trim());
    Tz::from_str(&normalized).map_err(|_e| ConversionError::UnknownTimezone(name.to_string()))
}

/// Resolver for `TZID` parameters during an import run.
///
/// Remembers every lookup, including failed ones, so an unknown zone is
/// reported once per import instead of once per property.
#[derive(Debug, Clone)]
pub struct TimeZoneResolver {
    default_zone: Tz,
    cache: HashMap<String, Option<Tz>>,
}

impl TimeZoneResolver {
    #[must_use]
    pub fn new(default_zone: Tz) -> Self {
        Self {
            default_zone,
            cache: HashMap::new(),
        }
    }

    /// Zone used for date-times without a `TZID`.
    #[must_use]
    pub const fn default_zone(&self) -> Tz {
        self.default_zone
    }

    /// ## Summary
    /// Resolves a `TZID` parameter value.
    ///
    /// ## Errors
    /// Returns `ConversionError::UnknownTimezone` if the TZID cannot be resolved.
    ///
    /// ## Side Effects
    /// Caches the outcome of the lookup.
    pub fn resolve(&mut self, tzid: &str) -> Result<Tz, ConversionError> {
        let resolved = *self
            .cache
            .entry(tzid.to_string())
            .or_insert_with(|| parse_zone(tzid).ok());
        resolved.ok_or_else(|| ConversionError::UnknownTimezone(tzid.to_string()))
    }

    /// ## Summary
    /// Resolves an optional `TZID`, falling back to the default zone when it is
    /// absent or unknown.
    ///
    /// ## Side Effects
    /// Logs a warning the first time an unknown TZID is seen.
    pub fn resolve_or_default(&mut self, tzid: Option<&str>) -> Tz {
        let Some(tzid) = tzid else {
            return self.default_zone;
        };
        let first_lookup = !self.cache.contains_key(tzid);
        match self.resolve(tzid) {
            Ok(tz) => tz,
            Err(e) => {
                if first_lookup {
                    tracing::warn!(
                        error = %e,
                        fallback = %self.default_zone,
                        "Unresolvable TZID, using default zone"
                    );
                }
                self.default_zone
            }
        }
    }
}

impl Default for TimeZoneResolver {
    fn default() -> Self {
        Self::new(Tz::UTC)
    }
}

/// Maps vendor-prefixed, Windows and aliased zone names to canonical IANA names.
///
/// Unrecognized names are returned with any vendor prefix removed.
fn normalize_tzid(tzid: &str) -> String {
    let stripped = ["/mozilla.org/", "/softwarestudio.org/", "/freeassociation.sourceforge.net/"]
        .into_iter()
        .find_map(|prefix| tzid.strip_prefix(prefix))
        .unwrap_or(tzid);

    let iana = IanaParserExtended::new();

    if let Some(zone) = WindowsParser::new().parse(stripped, None)
        && let Some(entry) = iana.iter().find(|entry| entry.time_zone == zone)
    {
        return entry.canonical.to_string();
    }

    let parsed = iana.parse(stripped);
    if parsed.time_zone == icu::time::TimeZone::UNKNOWN {
        stripped.to_string()
    } else {
        parsed.canonical.to_string()
    }
}

/// ## Summary
/// Converts a wall-clock time in `tz` to UTC without failing.
///
/// Times inside a DST gap are shifted forward by one hour; times inside a
/// DST fold resolve to the earlier instant.
#[must_use]
pub fn localize(tz: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => dt.with_timezone(&Utc),
        LocalResult::None => {
            let shifted = local + TimeDelta::hours(1);
            tz.from_local_datetime(&shifted)
                .earliest()
                .map_or_else(|| local.and_utc(), |dt| dt.with_timezone(&Utc))
        }
    }
}

/// Midnight of `date` in `tz`, as a UTC instant.
#[must_use]
pub fn start_of_day(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    localize(tz, date.and_time(NaiveTime::MIN))
}
