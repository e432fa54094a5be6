//! Conversion of imported `VEVENT`s into calendar events.

use mocca_core::types::RecurrenceKind;
use mocca_rfc::rfc::ical::import::{ImportedEvent, ImportedModification};

use super::event::{CalendarEvent, Recurrence};
use crate::recurrence::{ExceptionSet, Modification};

impl From<ImportedEvent> for CalendarEvent {
    /// A recurring import keeps its frequency tag as the recurrence kind,
    /// starting at its first occurrence and ending at its recurrence end.
    /// Frequencies without a generator (e.g. `hourly`) are imported as
    /// single events.
    fn from(imported: ImportedEvent) -> Self {
        let schedule = imported.schedule;

        let recurrence = if schedule.is_recurrent {
            match schedule.recurrence_frequency.parse::<RecurrenceKind>() {
                Ok(kind) => Some(
                    Recurrence::new(kind)
                        .with_first_instance(schedule.start)
                        .with_last_instance(schedule.recurrence_end),
                ),
                Err(error) => {
                    tracing::warn!(
                        uid = %imported.uid,
                        frequency = %schedule.recurrence_frequency,
                        error = %error,
                        "Unsupported frequency, importing as single event"
                    );
                    None
                }
            }
        } else {
            None
        };

        let mut exceptions = ExceptionSet::new();
        if recurrence.is_some() {
            for deletion in imported.deletions {
                exceptions.delete(deletion);
            }
            for modification in imported.modifications {
                let ImportedModification {
                    original_start,
                    start,
                    end,
                    title,
                    description,
                } = modification;
                exceptions.modify(
                    original_start,
                    Modification {
                        start,
                        end,
                        title,
                        description,
                    },
                );
            }
        }

        Self::new(imported.uid, imported.title, schedule.start)
            .with_description(imported.description)
            .with_end(schedule.end)
            .all_day(schedule.all_day)
            .with_timezone(schedule.timezone)
            .with_recurrence(recurrence)
            .with_exceptions(exceptions)
    }
}
