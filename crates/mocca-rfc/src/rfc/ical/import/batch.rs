//! Import of whole `.ics` documents.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use super::event::{ImportOptions, ImportedEvent, interpret_event, interpret_override};
use crate::error::{RfcError, RfcResult};
use crate::rfc::ical::core::Component;
use crate::rfc::ical::parse::parse;
use crate::rfc::ical::timezone::TimeZoneResolver;

/// A `VEVENT` that could not be imported.
#[derive(Debug)]
pub struct ImportFailure {
    pub uid: String,
    /// Line of the component's `BEGIN:VEVENT`.
    pub line: usize,
    pub error: RfcError,
}

/// Outcome of importing one document.
#[derive(Debug, Default)]
pub struct ImportReport {
    /// Master events in `DTSTART` order, with their overrides attached.
    pub events: Vec<ImportedEvent>,
    /// UIDs skipped because an earlier event in the batch already used them.
    pub duplicates: Vec<String>,
    pub failures: Vec<ImportFailure>,
}

/// ## Summary
/// Imports every `VEVENT` of an iCalendar document.
///
/// Masters are processed in order of their raw `DTSTART` text and a UID is
/// only imported once per batch. Components with `RECURRENCE-ID` become
/// modifications of the master with the same UID. A failing event is
/// recorded in the report and the batch carries on; it does not claim its
/// UID, so a later valid master with that UID is still imported.
///
/// ## Errors
/// Returns an error only if the document itself cannot be parsed.
#[tracing::instrument(skip(input, options), fields(input_len = input.len()))]
pub fn import_calendar(input: &str, options: &ImportOptions) -> RfcResult<ImportReport> {
    let calendar = parse(input)?;
    let mut resolver = TimeZoneResolver::new(options.default_zone);
    let mut report = ImportReport::default();

    let (mut masters, overrides): (Vec<&Component>, Vec<&Component>) = calendar
        .events()
        .partition(|event| event.get_property("RECURRENCE-ID").is_none());
    masters.sort_by(|a, b| a.raw_value("DTSTART").cmp(&b.raw_value("DTSTART")));

    let mut seen: HashSet<String> = HashSet::new();
    for master in masters {
        let uid = event_uid(master);
        if seen.contains(&uid) {
            tracing::debug!(uid = %uid, line = master.line, "Skipping duplicate UID");
            report.duplicates.push(uid);
            continue;
        }

        match interpret_event(master, uid.clone(), &mut resolver, options) {
            Ok(event) => {
                seen.insert(uid);
                report.events.push(event);
            }
            Err(error) => {
                tracing::warn!(uid = %uid, line = master.line, error = %error, "Failed to import event");
                report.failures.push(ImportFailure {
                    uid,
                    line: master.line,
                    error,
                });
            }
        }
    }

    attach_overrides(&mut report, &overrides, &mut resolver, options);

    tracing::info!(
        imported = report.events.len(),
        duplicates = report.duplicates.len(),
        failed = report.failures.len(),
        "Calendar import finished"
    );

    Ok(report)
}

fn attach_overrides(
    report: &mut ImportReport,
    overrides: &[&Component],
    resolver: &mut TimeZoneResolver,
    options: &ImportOptions,
) {
    let index: HashMap<String, usize> = report
        .events
        .iter()
        .enumerate()
        .map(|(i, event)| (event.uid.clone(), i))
        .collect();

    for component in overrides {
        let uid = event_uid(component);
        let Some(&position) = index.get(&uid) else {
            report.failures.push(ImportFailure {
                error: RfcError::ValidationError(format!(
                    "RECURRENCE-ID override without a master event for {uid}"
                )),
                uid,
                line: component.line,
            });
            continue;
        };

        let master = &mut report.events[position];
        match interpret_override(component, &master.schedule, resolver, options) {
            Ok(modification) => {
                tracing::trace!(
                    uid = %uid,
                    original_start = %modification.original_start,
                    "Attached occurrence override"
                );
                master.modifications.push(modification);
            }
            Err(error) => report.failures.push(ImportFailure {
                uid,
                line: component.line,
                error,
            }),
        }
    }
}

/// The component's `UID`, or a stable one derived from its summary and start.
fn event_uid(event: &Component) -> String {
    if let Some(uid) = event.raw_value("UID").map(str::trim).filter(|uid| !uid.is_empty()) {
        return uid.to_string();
    }

    let seed = format!(
        "{}\u{1f}{}",
        event.raw_value("SUMMARY").unwrap_or_default(),
        event.raw_value("DTSTART").unwrap_or_default()
    );
    Uuid::new_v5(&Uuid::NAMESPACE_OID, seed.as_bytes()).to_string()
}
