use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Recurrence kind tag stored with a series.
///
/// The tag names are the ones persisted by calendar documents, so they keep
/// their camel-case spelling on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecurrenceKind {
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "workdays")]
    Workdays,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "biweekly")]
    Biweekly,
    #[serde(rename = "customWeekly")]
    CustomWeekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "monthlySpecific")]
    MonthlySpecific,
    #[serde(rename = "yearly")]
    Yearly,
}

impl RecurrenceKind {
    pub const ALL: [Self; 8] = [
        Self::Daily,
        Self::Workdays,
        Self::Weekly,
        Self::Biweekly,
        Self::CustomWeekly,
        Self::Monthly,
        Self::MonthlySpecific,
        Self::Yearly,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Workdays => "workdays",
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::CustomWeekly => "customWeekly",
            Self::Monthly => "monthly",
            Self::MonthlySpecific => "monthlySpecific",
            Self::Yearly => "yearly",
        }
    }

    /// Whether occurrences come from a weekday set instead of a single period step.
    #[must_use]
    pub const fn uses_weekday_set(self) -> bool {
        matches!(self, Self::CustomWeekly)
    }
}

impl std::fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RecurrenceKind {
    type Err = CoreError;

    /// Tags are matched case-insensitively: importers write lower-case
    /// frequency names while stored series use camel case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| CoreError::UnknownRecurrenceKind(tag.to_string()))
    }
}

/// Ordering of materialized instances by start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "ascending",
            Self::Descending => "descending",
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_parses_from_its_tag() {
        for kind in RecurrenceKind::ALL {
            let parsed: RecurrenceKind = kind.as_str().parse().expect("tag should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!(
            "CUSTOMWEEKLY".parse::<RecurrenceKind>().ok(),
            Some(RecurrenceKind::CustomWeekly)
        );
        assert_eq!(
            " monthlyspecific ".parse::<RecurrenceKind>().ok(),
            Some(RecurrenceKind::MonthlySpecific)
        );
    }

    #[test]
    fn unknown_tag_is_an_error() {
        let err = "hourly".parse::<RecurrenceKind>().expect_err("should be unknown");
        assert!(matches!(err, CoreError::UnknownRecurrenceKind(tag) if tag == "hourly"));
    }

    #[test]
    fn serde_uses_stored_tags() {
        let json = serde_json::to_string(&RecurrenceKind::MonthlySpecific).expect("serialize");
        assert_eq!(json, "\"monthlySpecific\"");
        let kind: RecurrenceKind = serde_json::from_str("\"customWeekly\"").expect("deserialize");
        assert_eq!(kind, RecurrenceKind::CustomWeekly);
    }

    #[test]
    fn sort_order_defaults_to_ascending() {
        assert_eq!(SortOrder::default(), SortOrder::Ascending);
        assert_eq!(SortOrder::Descending.to_string(), "descending");
    }
}
