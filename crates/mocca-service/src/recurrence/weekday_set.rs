//! Cursor for `customWeekly` series: several weekdays every week.
//!
//! Weeks run Sunday to Saturday, and weekdays may be given as the
//! calendar numbers used by stored events (1 = Sunday ... 7 = Saturday).

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// ## Summary
/// Converts calendar weekday numbers (1 = Sunday ... 7 = Saturday).
///
/// Numbers outside `1..=7` are skipped.
#[must_use]
pub fn weekdays_from_numbers(numbers: &[u8]) -> Vec<Weekday> {
    numbers
        .iter()
        .filter_map(|&number| {
            let weekday = match number {
                1 => Some(Weekday::Sun),
                2 => Some(Weekday::Mon),
                3 => Some(Weekday::Tue),
                4 => Some(Weekday::Wed),
                5 => Some(Weekday::Thu),
                6 => Some(Weekday::Fri),
                7 => Some(Weekday::Sat),
                _ => None,
            };
            if weekday.is_none() {
                tracing::debug!(number, "Ignoring out-of-range weekday number");
            }
            weekday
        })
        .collect()
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_sunday())))
        .unwrap_or(date)
}

/// Lazily yields every selected weekday of every week, in order, starting
/// with the week that contains the anchor.
#[derive(Debug, Clone)]
pub struct WeekdaySetCursors {
    week: Option<NaiveDate>,
    time: NaiveTime,
    offsets: Vec<u64>,
    index: usize,
}

impl WeekdaySetCursors {
    /// Starts in the anchor's week, at the anchor's time of day.
    #[must_use]
    pub fn new(anchor: NaiveDateTime, weekdays: &[Weekday]) -> Self {
        let mut offsets: Vec<u64> = weekdays
            .iter()
            .map(|day| u64::from(day.num_days_from_sunday()))
            .collect();
        offsets.sort_unstable();
        offsets.dedup();

        Self {
            week: Some(week_start(anchor.date())),
            time: anchor.time(),
            offsets,
            index: 0,
        }
    }

    /// ## Summary
    /// Skips whole weeks so that the next cursor lies in the week of
    /// `target`. Never moves backwards.
    #[must_use]
    pub fn starting_week_of(mut self, target: NaiveDate) -> Self {
        let target_week = week_start(target);
        if self.week.is_some_and(|week| target_week > week) {
            self.week = Some(target_week);
            self.index = 0;
        }
        self
    }
}

impl Iterator for WeekdaySetCursors {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<Self::Item> {
        let week = self.week?;
        let offset = *self.offsets.get(self.index)?;
        let date = week.checked_add_days(Days::new(offset))?;

        self.index += 1;
        if self.index == self.offsets.len() {
            self.index = 0;
            self.week = week.checked_add_days(Days::new(7));
        }

        Some(date.and_time(self.time))
    }
}
