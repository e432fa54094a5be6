//! Window queries over a set of calendar events.

use chrono::{DateTime, Utc};
use mocca_core::types::SortOrder;

use super::event::{CalendarEvent, EventInstance};
use crate::error::{ServiceError, ServiceResult};
use crate::recurrence::{
    ExpansionOptions, InstanceKey, SeriesText, UnmatchedModification, apply_exceptions, expand,
};

/// A time window and how to present its instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventQuery {
    pub date_from: DateTime<Utc>,
    /// Inclusive; a missing end means a query for `date_from` alone.
    pub date_to: Option<DateTime<Utc>>,
    pub order: SortOrder,
    pub expansion: ExpansionOptions,
}

impl EventQuery {
    #[must_use]
    pub fn new(date_from: DateTime<Utc>) -> Self {
        Self {
            date_from,
            date_to: None,
            order: SortOrder::default(),
            expansion: ExpansionOptions::default(),
        }
    }

    #[must_use]
    pub fn with_date_to(mut self, date_to: impl Into<Option<DateTime<Utc>>>) -> Self {
        self.date_to = date_to.into();
        self
    }

    #[must_use]
    pub const fn with_order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn with_expansion(mut self, expansion: ExpansionOptions) -> Self {
        self.expansion = expansion;
        self
    }

    /// The inclusive window, with a missing end replaced by the start.
    #[must_use]
    pub fn window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (self.date_from, self.date_to.unwrap_or(self.date_from))
    }
}

/// Instances of one event inside a window.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Materialization {
    /// Ascending by original start.
    pub instances: Vec<EventInstance>,
    /// Unmatched modifications that would have touched the window.
    pub dropped: Vec<UnmatchedModification>,
    pub truncated: bool,
}

/// A modification lost because its original occurrence no longer exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedModification {
    pub event_id: String,
    pub modification: UnmatchedModification,
}

/// An event left out of a query because its series is invalid.
#[derive(Debug)]
pub struct SkippedEvent {
    pub event_id: String,
    pub error: ServiceError,
}

/// Outcome of [`query_events`].
#[derive(Debug, Default)]
pub struct QueryResult {
    pub instances: Vec<EventInstance>,
    pub dropped_modifications: Vec<DroppedModification>,
    /// Ids of events whose expansion hit the instance cap.
    pub truncated: Vec<String>,
    pub skipped: Vec<SkippedEvent>,
}

/// ## Summary
/// Materializes `event` inside `[date_from, date_to]`.
///
/// A single event yields itself when it overlaps the window. A recurring
/// event is expanded and its exceptions applied; modifications that match
/// no occurrence are dropped.
///
/// ## Errors
/// Returns `ServiceError::InvalidSeries` if the event's recurrence is
/// inconsistent.
///
/// ## Side Effects
/// Logs dropped modifications: the count at `info`, each one at `debug`.
pub fn materialize_event(
    event: &CalendarEvent,
    date_from: DateTime<Utc>,
    date_to: DateTime<Utc>,
    options: &ExpansionOptions,
) -> ServiceResult<Materialization> {
    let Some(series) = event.series().transpose()? else {
        let occurrence = event.single_occurrence();
        let instances = if occurrence.overlaps(date_from, date_to) {
            vec![event.instance(&occurrence, event.title.clone(), event.description.clone())]
        } else {
            Vec::new()
        };
        return Ok(Materialization {
            instances,
            ..Materialization::default()
        });
    };

    let expansion = expand(&series, date_from, date_to, options);
    let overlay = apply_exceptions(
        &expansion.occurrences,
        &event.exceptions,
        SeriesText {
            title: &event.title,
            description: &event.description,
        },
        event.all_day,
    );

    let (dropped, out_of_window): (Vec<_>, Vec<_>) = overlay
        .unmatched
        .into_iter()
        .partition(|unmatched| unmatched.is_relevant(series.span(), date_from, date_to));

    if !dropped.is_empty() {
        tracing::info!(event = %event.id, count = dropped.len(), "dropped some modifications");
        for unmatched in &dropped {
            tracing::debug!(
                event = %event.id,
                original_start = %unmatched.original_start,
                "Modification matches no occurrence in window"
            );
        }
    }
    for unmatched in &out_of_window {
        tracing::trace!(
            event = %event.id,
            original_start = %unmatched.original_start,
            "Modification outside of window"
        );
    }

    let instances = overlay
        .occurrences
        .into_iter()
        .map(|resolved| event.instance(&resolved.occurrence, resolved.title, resolved.description))
        .collect();

    Ok(Materialization {
        instances,
        dropped,
        truncated: expansion.truncated,
    })
}

/// ## Summary
/// Collects the instances of all `events` inside the query window, sorted
/// by start in the requested order.
///
/// Events whose series cannot be built are skipped and listed in the
/// result instead of failing the query.
///
/// ## Side Effects
/// Logs skipped events at `error`.
#[tracing::instrument(skip(events, query), fields(events = events.len()))]
pub fn query_events(events: &[CalendarEvent], query: &EventQuery) -> QueryResult {
    let (date_from, date_to) = query.window();
    let mut result = QueryResult::default();

    for event in events {
        match materialize_event(event, date_from, date_to, &query.expansion) {
            Ok(materialization) => {
                if materialization.truncated {
                    result.truncated.push(event.id.clone());
                }
                result.instances.extend(materialization.instances);
                result
                    .dropped_modifications
                    .extend(materialization.dropped.into_iter().map(|modification| {
                        DroppedModification {
                            event_id: event.id.clone(),
                            modification,
                        }
                    }));
            }
            Err(error) => {
                tracing::error!(event = %event.id, error = %error, "Skipping event with invalid recurrence");
                result.skipped.push(SkippedEvent {
                    event_id: event.id.clone(),
                    error,
                });
            }
        }
    }

    sort_instances(&mut result.instances, query.order);

    tracing::debug!(
        instances = result.instances.len(),
        skipped = result.skipped.len(),
        "Event query finished"
    );

    result
}

/// Sorts by start, then by event id so that ties are stable across runs.
pub fn sort_instances(instances: &mut [EventInstance], order: SortOrder) {
    instances.sort_by(|a, b| {
        let ordering = a.start.cmp(&b.start).then_with(|| a.event_id.cmp(&b.event_id));
        match order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    });
}

/// ## Summary
/// The instance of `event` whose original start is `original_start`, with
/// its modification applied. Deletions are ignored.
///
/// Without an original start, or for a single event, the event's own first
/// occurrence is returned. `None` means the occurrence cannot be
/// represented.
///
/// ## Errors
/// Returns `ServiceError::InvalidSeries` if the event's recurrence is
/// inconsistent.
pub fn event_instance_at(
    event: &CalendarEvent,
    original_start: Option<DateTime<Utc>>,
) -> ServiceResult<Option<EventInstance>> {
    let Some(series) = event.series().transpose()? else {
        let occurrence = event.single_occurrence();
        return Ok(Some(event.instance(
            &occurrence,
            event.title.clone(),
            event.description.clone(),
        )));
    };

    let original = original_start.unwrap_or_else(|| series.anchor_start());
    let Some(occurrence) = series.occurrence_starting(original) else {
        return Ok(None);
    };

    let key = InstanceKey::from(original);
    let instance = match event.exceptions.modifications().find(|(k, _)| *k == key) {
        Some((_, modification)) => {
            let resolved = modification.resolve(&occurrence, event.all_day);
            let title = modification
                .title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(&event.title);
            let description = modification
                .description
                .as_deref()
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(&event.description);
            event.instance(&resolved, title.to_string(), description.to_string())
        }
        None => event.instance(&occurrence, event.title.clone(), event.description.clone()),
    };

    Ok(Some(instance))
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;
    use mocca_core::types::RecurrenceKind;

    use super::*;
    use crate::calendar::event::Recurrence;
    use crate::recurrence::{ExceptionSet, Modification};

    fn utc(s: &str) -> DateTime<Utc> {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M")
            .expect("valid test datetime")
            .and_utc()
    }

    #[test]
    fn missing_end_queries_single_instant() {
        let query = EventQuery::new(utc("2024-01-01 00:00"));
        assert_eq!(query.window(), (utc("2024-01-01 00:00"), utc("2024-01-01 00:00")));
    }

    #[test]
    fn single_event_outside_window_is_excluded() {
        let event = CalendarEvent::new("e", "Lunch", utc("2024-01-02 12:00"));
        let inside = materialize_event(
            &event,
            utc("2024-01-02 00:00"),
            utc("2024-01-02 23:59"),
            &ExpansionOptions::default(),
        )
        .expect("single event");
        assert_eq!(inside.instances.len(), 1);

        let outside = materialize_event(
            &event,
            utc("2024-01-03 00:00"),
            utc("2024-01-03 23:59"),
            &ExpansionOptions::default(),
        )
        .expect("single event");
        assert!(outside.instances.is_empty());
    }

    #[test]
    fn descending_order_reverses_starts() {
        let events = vec![
            CalendarEvent::new("a", "A", utc("2024-01-01 09:00")),
            CalendarEvent::new("b", "B", utc("2024-01-01 08:00")),
            CalendarEvent::new("c", "C", utc("2024-01-01 10:00")),
        ];
        let query = EventQuery::new(utc("2024-01-01 00:00"))
            .with_date_to(utc("2024-01-01 23:59"))
            .with_order(SortOrder::Descending);

        let ids: Vec<_> = query_events(&events, &query)
            .instances
            .into_iter()
            .map(|i| i.event_id)
            .collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[test]
    fn instance_at_applies_modification_but_not_deletion() {
        let exceptions = ExceptionSet::new()
            .with_deletion(utc("2024-01-02 09:00"))
            .with_modification(
                utc("2024-01-03 09:00"),
                Modification::new().with_title("Moved").with_start(utc("2024-01-03 15:00")),
            );
        let event = CalendarEvent::new("d", "Daily", utc("2024-01-01 09:00"))
            .with_end(utc("2024-01-01 10:00"))
            .with_recurrence(Recurrence::new(RecurrenceKind::Daily))
            .with_exceptions(exceptions);

        let deleted = event_instance_at(&event, Some(utc("2024-01-02 09:00")))
            .expect("valid series")
            .expect("representable");
        assert_eq!(deleted.start, utc("2024-01-02 09:00"));
        assert_eq!(deleted.title, "Daily");

        let moved = event_instance_at(&event, Some(utc("2024-01-03 09:00")))
            .expect("valid series")
            .expect("representable");
        assert_eq!(moved.start, utc("2024-01-03 15:00"));
        assert_eq!(moved.original_start, Some(utc("2024-01-03 09:00")));
        assert_eq!(moved.title, "Moved");

        let anchor = event_instance_at(&event, None)
            .expect("valid series")
            .expect("representable");
        assert_eq!(anchor.start, utc("2024-01-01 09:00"));
        assert_eq!(anchor.end, utc("2024-01-01 10:00"));
    }
}
