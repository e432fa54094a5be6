//! Window expansion of a recurrence series into raw occurrences.

use chrono::{DateTime, Days, Utc};
use mocca_core::config::Settings;
use mocca_core::constants::MAX_INSTANCES;

use super::occurrence::Occurrence;
use super::registry::{Strategy, strategy_for};
use super::series::RecurrenceSeries;
use super::weekday_set::WeekdaySetCursors;

/// Days of slack kept when jumping ahead, so that occurrences stretched by a
/// DST change are not skipped.
const FAST_FORWARD_SLACK_DAYS: u64 = 2;

/// ## Summary
/// Options controlling recurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionOptions {
    /// Maximum number of occurrences a single call produces.
    pub max_instances: usize,
}

impl Default for ExpansionOptions {
    fn default() -> Self {
        Self {
            max_instances: MAX_INSTANCES,
        }
    }
}

impl ExpansionOptions {
    #[must_use]
    pub const fn from_settings(settings: &Settings) -> Self {
        Self {
            max_instances: settings.recurrence.max_instances,
        }
    }

    /// Sets the maximum number of instances.
    #[must_use]
    pub const fn with_max_instances(mut self, max: usize) -> Self {
        self.max_instances = max;
        self
    }
}

/// Raw occurrences of one series inside a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Expansion {
    /// Ascending by start.
    pub occurrences: Vec<Occurrence>,
    /// Set when the instance cap stopped the expansion early.
    pub truncated: bool,
}

/// ## Summary
/// Expands `series` into the occurrences that overlap `[date_from, date_to]`.
///
/// The window is first narrowed to the series' first and last instance. An
/// occurrence is kept when it has not ended before the window start and
/// starts by the window end; `customWeekly` occurrences must lie entirely
/// inside the window, and every selected weekday of the anchor's week
/// counts, including those before the anchor day.
///
/// ## Side Effects
/// Logs at `info` when the instance cap truncates the result.
#[must_use]
pub fn expand(
    series: &RecurrenceSeries,
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
    options: &ExpansionOptions,
) -> Expansion {
    let window_start = series
        .first_instance()
        .map_or(date_from, |first| first.max(date_from));
    let window_end = series
        .last_instance()
        .map_or(date_to, |last| last.min(date_to));

    if window_end < window_start {
        tracing::trace!(series = %series.id(), "Expansion window is empty");
        return Expansion::default();
    }

    let local_anchor = series.local_anchor();
    let earliest_start = window_start
        .checked_sub_signed(series.span())
        .unwrap_or(window_start);
    let target = series
        .to_local(earliest_start)
        .date()
        .checked_sub_days(Days::new(FAST_FORWARD_SLACK_DAYS))
        .unwrap_or(local_anchor.date());

    let mut collector = Collector::new(series, options.max_instances);

    match strategy_for(series.kind(), local_anchor) {
        Strategy::Periodic(period) => {
            let start = period.fast_forward(local_anchor, target);
            for cursor in period.cursors(start) {
                let Some(occurrence) = series.occurrence_at(cursor) else {
                    break;
                };
                if occurrence.start > window_end {
                    break;
                }
                if occurrence.end < window_start {
                    continue;
                }
                if !collector.push(occurrence) {
                    break;
                }
            }
        }
        Strategy::WeekdaySet => {
            let cursors =
                WeekdaySetCursors::new(local_anchor, series.weekdays()).starting_week_of(target);
            for cursor in cursors {
                let Some(occurrence) = series.occurrence_at(cursor) else {
                    break;
                };
                if occurrence.start > window_end {
                    break;
                }
                if occurrence.start < window_start || occurrence.end > window_end {
                    continue;
                }
                if !collector.push(occurrence) {
                    break;
                }
            }
        }
    }

    tracing::trace!(
        series = %series.id(),
        count = collector.expansion.occurrences.len(),
        "Expanded recurrence series"
    );

    collector.expansion
}

/// Accumulates occurrences up to the instance cap.
struct Collector<'a> {
    series: &'a RecurrenceSeries,
    limit: usize,
    expansion: Expansion,
}

impl<'a> Collector<'a> {
    fn new(series: &'a RecurrenceSeries, limit: usize) -> Self {
        Self {
            series,
            limit,
            expansion: Expansion::default(),
        }
    }

    /// Returns `false` once the cap is hit and expansion must stop.
    fn push(&mut self, occurrence: Occurrence) -> bool {
        if self.expansion.occurrences.len() >= self.limit {
            tracing::info!(
                series = %self.series.id(),
                limit = self.limit,
                "maximal number of events generated; stopping"
            );
            self.expansion.truncated = true;
            return false;
        }
        self.expansion.occurrences.push(occurrence);
        true
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDateTime, TimeDelta, Weekday};
    use mocca_core::types::RecurrenceKind;

    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .expect("valid test datetime")
            .and_utc()
    }

    fn starts(expansion: &Expansion) -> Vec<DateTime<Utc>> {
        expansion.occurrences.iter().map(|o| o.start).collect()
    }

    #[test]
    fn occurrence_ending_at_window_start_is_kept() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::Daily, utc("2024-01-01 08:00"))
            .with_end(utc("2024-01-01 10:00"))
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2024-01-05 10:00"),
            utc("2024-01-06 09:00"),
            &ExpansionOptions::default(),
        );
        assert_eq!(
            starts(&expansion),
            vec![utc("2024-01-05 08:00"), utc("2024-01-06 08:00")]
        );
    }

    #[test]
    fn first_instance_narrows_window() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::Daily, utc("2024-01-01 08:00"))
            .with_end(utc("2024-01-01 09:00"))
            .with_first_instance(utc("2024-01-04 00:00"))
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2024-01-01 00:00"),
            utc("2024-01-05 23:00"),
            &ExpansionOptions::default(),
        );
        assert_eq!(
            starts(&expansion),
            vec![utc("2024-01-04 08:00"), utc("2024-01-05 08:00")]
        );
    }

    #[test]
    fn window_before_anchor_is_empty() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::Weekly, utc("2024-01-01 08:00"))
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2023-01-01 00:00"),
            utc("2023-12-31 00:00"),
            &ExpansionOptions::default(),
        );
        assert!(expansion.occurrences.is_empty());
        assert!(!expansion.truncated);
    }

    #[test]
    fn cap_truncates_only_when_more_remain() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::Daily, utc("2024-01-01 08:00"))
            .build()
            .expect("valid series");
        let options = ExpansionOptions::default().with_max_instances(3);

        let exact = expand(&series, utc("2024-01-01 00:00"), utc("2024-01-03 23:00"), &options);
        assert_eq!(exact.occurrences.len(), 3);
        assert!(!exact.truncated);

        let more = expand(&series, utc("2024-01-01 00:00"), utc("2024-01-10 23:00"), &options);
        assert_eq!(more.occurrences.len(), 3);
        assert!(more.truncated);
    }

    #[test]
    fn weekday_set_covers_whole_anchor_week() {
        // Wednesday anchor; the Tuesday of the anchor week is still emitted.
        let series = RecurrenceSeries::builder("s", RecurrenceKind::CustomWeekly, utc("2024-03-13 10:00"))
            .with_end(utc("2024-03-13 11:00"))
            .with_weekdays([Weekday::Tue, Weekday::Thu])
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2024-03-10 00:00"),
            utc("2024-03-23 23:59"),
            &ExpansionOptions::default(),
        );
        assert_eq!(
            starts(&expansion),
            vec![
                utc("2024-03-12 10:00"),
                utc("2024-03-14 10:00"),
                utc("2024-03-19 10:00"),
                utc("2024-03-21 10:00"),
            ]
        );
    }

    #[test]
    fn weekday_set_respects_first_instance_and_window_end() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::CustomWeekly, utc("2024-03-13 18:00"))
            .with_end(utc("2024-03-13 20:00"))
            .with_weekdays([Weekday::Tue, Weekday::Thu])
            .with_first_instance(utc("2024-03-13 18:00"))
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2024-03-01 00:00"),
            utc("2024-03-21 19:00"),
            &ExpansionOptions::default(),
        );
        // The 12th precedes the first instance; the 21st would end at 20:00,
        // after the window end.
        assert_eq!(
            starts(&expansion),
            vec![utc("2024-03-14 18:00"), utc("2024-03-19 18:00")]
        );
    }

    #[test]
    fn weekday_set_stops_at_cap() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::CustomWeekly, utc("2024-01-01 09:00"))
            .with_weekdays([Weekday::Mon, Weekday::Wed, Weekday::Fri])
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2024-01-01 00:00"),
            utc("2030-12-31 00:00"),
            &ExpansionOptions::default().with_max_instances(4),
        );
        assert_eq!(
            starts(&expansion),
            vec![
                utc("2024-01-01 09:00"),
                utc("2024-01-03 09:00"),
                utc("2024-01-05 09:00"),
                utc("2024-01-08 09:00"),
            ]
        );
        assert!(expansion.truncated);
    }

    #[test]
    fn long_running_series_jumps_ahead() {
        let series = RecurrenceSeries::builder("s", RecurrenceKind::Daily, utc("1900-01-01 06:00"))
            .with_end(utc("1900-01-01 06:00") + TimeDelta::hours(1))
            .build()
            .expect("valid series");

        let expansion = expand(
            &series,
            utc("2024-06-01 00:00"),
            utc("2024-06-02 23:00"),
            &ExpansionOptions::default().with_max_instances(5),
        );
        assert_eq!(
            starts(&expansion),
            vec![utc("2024-06-01 06:00"), utc("2024-06-02 06:00")]
        );
        assert!(!expansion.truncated);
    }
}
