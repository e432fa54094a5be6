//! Command line arguments of the `mocca` binary.

use std::path::PathBuf;

use chrono::{DateTime, Days, NaiveDate, TimeDelta, Utc};
use chrono_tz::Tz;
use clap::Parser;
use mocca_core::types::SortOrder;
use mocca_rfc::rfc::ical::timezone::start_of_day;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(name = "mocca")]
#[command(about = "Materialize the events of an iCalendar file for a range of days")]
pub struct CliArgs {
    /// Calendar file to import (.ics)
    pub file: PathBuf,

    /// First day of the query (YYYY-MM-DD)
    #[arg(value_parser = parse_day)]
    pub from: NaiveDate,

    /// Last day of the query (YYYY-MM-DD); defaults to the first day
    #[arg(value_parser = parse_day)]
    pub to: Option<NaiveDate>,

    /// List the latest instances first
    #[arg(long)]
    pub desc: bool,
}

impl CliArgs {
    /// ## Summary
    /// Checks what clap cannot: the range must not run backwards.
    ///
    /// ## Errors
    /// Returns `AppError::UsageError` if `to` is before `from`.
    pub fn validate(&self) -> AppResult<()> {
        if let Some(to) = self.to
            && to < self.from
        {
            return Err(AppError::UsageError(format!("{to} is before {}", self.from)));
        }
        Ok(())
    }

    #[must_use]
    pub const fn order(&self) -> SortOrder {
        if self.desc {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    /// ## Summary
    /// The inclusive query window: midnight of `from` up to the last
    /// millisecond of the final day, both in `tz`.
    #[must_use]
    pub fn window(&self, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = start_of_day(tz, self.from);
        let last_day = self.to.unwrap_or(self.from);
        let end = last_day
            .checked_add_days(Days::new(1))
            .map_or(DateTime::<Utc>::MAX_UTC, |next| start_of_day(tz, next))
            - TimeDelta::milliseconds(1);
        (start, end.max(start))
    }
}

fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|err| format!("expected YYYY-MM-DD: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(values: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("mocca").chain(values.iter().copied()))
    }

    #[test]
    fn parses_range_and_order() {
        let parsed = parse(&["team.ics", "2024-03-01", "--desc", "2024-03-31"]).expect("valid arguments");
        assert_eq!(parsed.file, PathBuf::from("team.ics"));
        assert_eq!(parsed.from, NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"));
        assert_eq!(parsed.to, NaiveDate::from_ymd_opt(2024, 3, 31));
        assert_eq!(parsed.order(), SortOrder::Descending);
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn ascending_by_default() {
        let parsed = parse(&["team.ics", "2024-03-01"]).expect("valid arguments");
        assert_eq!(parsed.to, None);
        assert_eq!(parsed.order(), SortOrder::Ascending);
    }

    #[test]
    fn rejects_malformed_arguments() {
        for bad in [
            &[][..],
            &["team.ics"],
            &["team.ics", "03/01/2024"],
            &["team.ics", "2024-03-01", "2024-03-02", "extra"],
            &["team.ics", "2024-03-01", "--verbose"],
        ] {
            assert!(parse(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn rejects_backwards_range() {
        let parsed = parse(&["team.ics", "2024-03-02", "2024-03-01"]).expect("parses");
        assert!(matches!(parsed.validate(), Err(AppError::UsageError(_))));
    }

    #[test]
    fn single_day_window_in_zone() {
        let parsed = parse(&["team.ics", "2024-07-01"]).expect("valid arguments");
        let (start, end) = parsed.window(chrono_tz::Europe::Berlin);

        assert_eq!(start.to_rfc3339(), "2024-06-30T22:00:00+00:00");
        assert_eq!(end, start + TimeDelta::days(1) - TimeDelta::milliseconds(1));
    }
}
