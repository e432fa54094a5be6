/// Upper bound on raw occurrences produced by a single expansion call.
pub const MAX_INSTANCES: usize = 1000;

/// Series imported without an `UNTIL` end this many years after their start.
pub const DEFAULT_HORIZON_YEARS: u32 = 5;

/// Length of a timed event stored without an end.
pub const DEFAULT_EVENT_DURATION_MINUTES: i64 = 30;

/// Zone used for floating import times and for series without their own zone.
pub const DEFAULT_TIMEZONE: &str = "UTC";

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Organizer placeholder some exporters write when no organizer is known.
pub const UNKNOWN_ORGANIZER_MARKER: &str = "unknownorganizer";
