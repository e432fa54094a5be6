use chrono::{DateTime, Utc};

/// Whether an occurrence was produced by the rule alone or replaced by a
/// modification. Deleted occurrences are never materialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum OccurrenceStatus {
    #[default]
    Regular,
    Modified,
}

/// One concrete occurrence of a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Occurrence {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Start the rule produced; exceptions are keyed by it.
    pub original_start: DateTime<Utc>,
    pub status: OccurrenceStatus,
}

impl Occurrence {
    /// An unmodified occurrence.
    #[must_use]
    pub const fn regular(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            original_start: start,
            status: OccurrenceStatus::Regular,
        }
    }

    #[must_use]
    pub const fn is_modified(&self) -> bool {
        matches!(self.status, OccurrenceStatus::Modified)
    }

    /// Whether the occurrence has not ended before `from` and starts by `to`.
    #[must_use]
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.end >= from && self.start <= to
    }
}
