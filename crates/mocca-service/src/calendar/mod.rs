//! Calendar events and the queries that turn them into instances.

pub mod event;
pub mod import;
pub mod query;

pub use event::{CalendarEvent, EventInstance, Recurrence};
pub use query::{
    DroppedModification, EventQuery, Materialization, QueryResult, SkippedEvent, event_instance_at,
    materialize_event, query_events, sort_instances,
};
