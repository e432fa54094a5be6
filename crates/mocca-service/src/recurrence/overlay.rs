//! Exception overlay: applies deletions and modifications, keyed by each
//! occurrence's original start, to a raw expansion.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, TimeDelta, Utc};

use super::occurrence::{Occurrence, OccurrenceStatus};
use super::series::guess_end;

/// Exception key: an original start as epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceKey(i64);

impl InstanceKey {
    #[must_use]
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    #[must_use]
    pub const fn millis(self) -> i64 {
        self.0
    }

    /// `None` for keys outside the representable range.
    #[must_use]
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.0)
    }
}

impl From<DateTime<Utc>> for InstanceKey {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant.timestamp_millis())
    }
}

impl std::fmt::Display for InstanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(instant) => write!(f, "{}", instant.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// Overrides for a single occurrence. Unset fields keep the occurrence's
/// own values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modification {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl Modification {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_start(mut self, start: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.start = start.into();
        self
    }

    #[must_use]
    pub fn with_end(mut self, end: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.end = end.into();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// ## Summary
    /// The occurrence after applying this modification to `original`.
    ///
    /// A moved start without an explicit end gets a guessed end, and the
    /// result never ends before it starts.
    #[must_use]
    pub fn resolve(&self, original: &Occurrence, all_day: bool) -> Occurrence {
        let start = self.start.unwrap_or(original.start);
        let end = match self.end {
            Some(end) => end,
            None if start == original.start => original.end,
            None => guess_end(start, all_day),
        };

        Occurrence {
            start,
            end: end.max(start),
            original_start: original.original_start,
            status: OccurrenceStatus::Modified,
        }
    }

    /// The interval this modification occupies, given the series span for
    /// unset fields.
    fn interval(&self, original_start: DateTime<Utc>, span: TimeDelta) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.start.unwrap_or(original_start);
        let end = self
            .end
            .or_else(|| start.checked_add_signed(span))
            .unwrap_or(start);
        (start, end.max(start))
    }
}

/// Deletions and modifications of one series.
///
/// A key is either deleted or modified; deleting a key also drops any
/// modification stored for it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExceptionSet {
    deletions: BTreeSet<InstanceKey>,
    modifications: BTreeMap<InstanceKey, Modification>,
}

impl ExceptionSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Suppresses the occurrence starting at `original_start`.
    pub fn delete(&mut self, original_start: impl Into<InstanceKey>) {
        self.deletions.insert(original_start.into());
    }

    /// ## Summary
    /// Stores a modification for the occurrence starting at `original_start`.
    ///
    /// ## Side Effects
    /// Logs at `warn` if an earlier modification for the same key is replaced.
    pub fn modify(&mut self, original_start: impl Into<InstanceKey>, modification: Modification) {
        let key = original_start.into();
        if self.modifications.insert(key, modification).is_some() {
            tracing::warn!(original_start = %key, "Replacing existing modification");
        }
    }

    #[must_use]
    pub fn with_deletion(mut self, original_start: impl Into<InstanceKey>) -> Self {
        self.delete(original_start);
        self
    }

    #[must_use]
    pub fn with_modification(
        mut self,
        original_start: impl Into<InstanceKey>,
        modification: Modification,
    ) -> Self {
        self.modify(original_start, modification);
        self
    }

    #[must_use]
    pub fn is_deleted(&self, original_start: impl Into<InstanceKey>) -> bool {
        self.deletions.contains(&original_start.into())
    }

    /// The modification for `original_start`, unless that key is deleted.
    #[must_use]
    pub fn modification(&self, original_start: impl Into<InstanceKey>) -> Option<&Modification> {
        let key = original_start.into();
        if self.deletions.contains(&key) {
            return None;
        }
        self.modifications.get(&key)
    }

    pub fn deletions(&self) -> impl Iterator<Item = InstanceKey> + '_ {
        self.deletions.iter().copied()
    }

    pub fn modifications(&self) -> impl Iterator<Item = (InstanceKey, &Modification)> + '_ {
        self.modifications.iter().map(|(key, m)| (*key, m))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.modifications.is_empty()
    }
}

/// Series-level text that overrides fall back to.
#[derive(Debug, Clone, Copy)]
pub struct SeriesText<'a> {
    pub title: &'a str,
    pub description: &'a str,
}

/// An occurrence with its effective title and description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOccurrence {
    pub occurrence: Occurrence,
    pub title: String,
    pub description: String,
}

/// A modification whose original occurrence was not among the raw
/// occurrences it was applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmatchedModification {
    pub original_start: InstanceKey,
    pub modification: Modification,
}

impl UnmatchedModification {
    /// ## Summary
    /// Whether the modification would have touched `[from, to]`, either at
    /// its original position or at its modified one.
    ///
    /// `span` is the series' occurrence length, used for unset ends.
    #[must_use]
    pub fn is_relevant(&self, span: TimeDelta, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        let Some(original_start) = self.original_start.to_datetime() else {
            return false;
        };
        let original_end = original_start
            .checked_add_signed(span)
            .unwrap_or(original_start);
        let (start, end) = self.modification.interval(original_start, span);

        let ended_before = end < from && original_end < from;
        let starts_after = start > to && original_start > to;
        !(ended_before || starts_after)
    }
}

/// Result of [`apply_exceptions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverlayResult {
    /// In the order of the raw occurrences.
    pub occurrences: Vec<ResolvedOccurrence>,
    /// Modifications that matched no raw occurrence, in key order.
    pub unmatched: Vec<UnmatchedModification>,
}

/// ## Summary
/// Applies `exceptions` to the raw occurrences of one series.
///
/// Deleted originals are dropped; deletion wins over a modification of the
/// same key. Modified originals are replaced by their resolved override and
/// keep their original start. Blank override titles and descriptions fall
/// back to `text`. Modifications matching no raw occurrence are returned as
/// unmatched and never turned into occurrences.
#[must_use]
pub fn apply_exceptions(
    raw: &[Occurrence],
    exceptions: &ExceptionSet,
    text: SeriesText<'_>,
    all_day: bool,
) -> OverlayResult {
    let mut pending: BTreeMap<InstanceKey, &Modification> = exceptions
        .modifications
        .iter()
        .filter(|(key, _)| !exceptions.deletions.contains(key))
        .map(|(key, m)| (*key, m))
        .collect();

    let mut occurrences = Vec::with_capacity(raw.len());
    for occurrence in raw {
        let key = InstanceKey::from(occurrence.original_start);
        if exceptions.deletions.contains(&key) {
            tracing::trace!(original_start = %key, "Skipping deleted occurrence");
            continue;
        }

        let resolved = match pending.remove(&key) {
            Some(modification) => ResolvedOccurrence {
                occurrence: modification.resolve(occurrence, all_day),
                title: non_blank(modification.title.as_deref()).unwrap_or(text.title).to_string(),
                description: non_blank(modification.description.as_deref())
                    .unwrap_or(text.description)
                    .to_string(),
            },
            None => ResolvedOccurrence {
                occurrence: *occurrence,
                title: text.title.to_string(),
                description: text.description.to_string(),
            },
        };
        occurrences.push(resolved);
    }

    let unmatched = pending
        .into_iter()
        .map(|(original_start, modification)| UnmatchedModification {
            original_start,
            modification: modification.clone(),
        })
        .collect();

    OverlayResult {
        occurrences,
        unmatched,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
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

    fn hourly(starts: &[&str]) -> Vec<Occurrence> {
        starts
            .iter()
            .map(|s| Occurrence::regular(utc(s), utc(s) + TimeDelta::hours(1)))
            .collect()
    }

    const TEXT: SeriesText<'static> = SeriesText {
        title: "Standup",
        description: "Daily sync",
    };

    #[test]
    fn deletion_wins_over_modification() {
        let raw = hourly(&["2024-01-01 09:00", "2024-01-02 09:00"]);
        let exceptions = ExceptionSet::new()
            .with_modification(utc("2024-01-01 09:00"), Modification::new().with_title("Moved"))
            .with_deletion(utc("2024-01-01 09:00"));

        let result = apply_exceptions(&raw, &exceptions, TEXT, false);
        assert_eq!(result.occurrences.len(), 1);
        assert_eq!(result.occurrences[0].occurrence.start, utc("2024-01-02 09:00"));
        assert!(result.unmatched.is_empty());
        assert!(exceptions.modification(utc("2024-01-01 09:00")).is_none());
    }

    #[test]
    fn modification_replaces_and_keeps_original_start() {
        let raw = hourly(&["2024-01-01 09:00", "2024-01-02 09:00"]);
        let exceptions = ExceptionSet::new().with_modification(
            utc("2024-01-02 09:00"),
            Modification::new()
                .with_start(utc("2024-01-02 11:00"))
                .with_title("  ")
                .with_description("Moved to 11"),
        );

        let result = apply_exceptions(&raw, &exceptions, TEXT, false);
        let moved = &result.occurrences[1];
        assert_eq!(moved.occurrence.start, utc("2024-01-02 11:00"));
        // Moved start without an end: guessed end of half an hour.
        assert_eq!(moved.occurrence.end, utc("2024-01-02 11:30"));
        assert_eq!(moved.occurrence.original_start, utc("2024-01-02 09:00"));
        assert!(moved.occurrence.is_modified());
        assert_eq!(moved.title, "Standup");
        assert_eq!(moved.description, "Moved to 11");

        assert_eq!(result.occurrences[0].title, "Standup");
        assert!(!result.occurrences[0].occurrence.is_modified());
    }

    #[test]
    fn unset_fields_keep_the_original_interval() {
        let raw = hourly(&["2024-01-01 09:00"]);
        let modification = Modification::new().with_title("Renamed");
        let resolved = modification.resolve(&raw[0], false);
        assert_eq!(resolved.start, raw[0].start);
        assert_eq!(resolved.end, raw[0].end);

        let backwards = Modification::new().with_end(utc("2024-01-01 08:00"));
        assert_eq!(backwards.resolve(&raw[0], false).end, raw[0].start);
    }

    #[test]
    fn unmatched_modifications_are_reported() {
        let raw = hourly(&["2024-01-01 09:00"]);
        let exceptions = ExceptionSet::new()
            .with_modification(utc("2024-01-01 09:00"), Modification::new().with_title("A"))
            .with_modification(utc("2023-12-25 09:00"), Modification::new().with_title("B"))
            .with_modification(InstanceKey::from_millis(7), Modification::new().with_title("C"));

        let result = apply_exceptions(&raw, &exceptions, TEXT, false);
        assert_eq!(result.occurrences.len(), 1);
        let keys: Vec<InstanceKey> = result.unmatched.iter().map(|u| u.original_start).collect();
        assert_eq!(
            keys,
            vec![InstanceKey::from_millis(7), utc("2023-12-25 09:00").into()]
        );
    }

    #[test]
    fn relevance_considers_both_positions() {
        let from = utc("2024-01-01 00:00");
        let to = utc("2024-01-07 23:59");
        let span = TimeDelta::hours(1);

        let moved_into_window = UnmatchedModification {
            original_start: utc("2023-12-25 09:00").into(),
            modification: Modification::new().with_start(utc("2024-01-03 09:00")),
        };
        assert!(moved_into_window.is_relevant(span, from, to));

        let moved_out_of_window = UnmatchedModification {
            original_start: utc("2024-01-02 09:00").into(),
            modification: Modification::new().with_start(utc("2024-02-01 09:00")),
        };
        assert!(moved_out_of_window.is_relevant(span, from, to));

        let far_away = UnmatchedModification {
            original_start: utc("2023-06-01 09:00").into(),
            modification: Modification::new().with_title("old"),
        };
        assert!(!far_away.is_relevant(span, from, to));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let raw = hourly(&["2024-01-01 09:00", "2024-01-02 09:00", "2024-01-03 09:00"]);
        let exceptions = ExceptionSet::new()
            .with_deletion(utc("2024-01-03 09:00"))
            .with_modification(utc("2024-01-01 09:00"), Modification::new().with_title("First"));

        let once = apply_exceptions(&raw, &exceptions, TEXT, false);
        let again: Vec<Occurrence> = once.occurrences.iter().map(|r| r.occurrence).collect();
        let twice = apply_exceptions(&again, &exceptions, TEXT, false);

        let starts = |r: &OverlayResult| -> Vec<_> {
            r.occurrences.iter().map(|o| (o.occurrence.start, o.occurrence.end)).collect()
        };
        assert_eq!(starts(&once), starts(&twice));
    }
}
