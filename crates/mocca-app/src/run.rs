//! Import a calendar document and materialize its events for a window.

use mocca_rfc::rfc::ical::import::{ImportOptions, ImportReport, import_calendar};
use mocca_service::calendar::{CalendarEvent, EventQuery, QueryResult, query_events};
use mocca_service::recurrence::ExpansionOptions;

use crate::cli::CliArgs;
use crate::error::AppResult;

/// Everything one invocation produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub import: ImportReport,
    pub query: QueryResult,
}

/// ## Summary
/// Imports `input` and queries its events over the window in `args`.
///
/// Every event is tagged with `source`. The window's days are interpreted
/// in the import's default zone.
///
/// ## Errors
/// Returns an error if the document cannot be parsed.
#[tracing::instrument(skip(input, args, import, expansion))]
pub fn run(
    input: &str,
    source: &str,
    args: &CliArgs,
    import: &ImportOptions,
    expansion: ExpansionOptions,
) -> AppResult<RunOutcome> {
    let report = import_calendar(input, import)?;

    let events: Vec<CalendarEvent> = report
        .events
        .iter()
        .cloned()
        .map(|imported| CalendarEvent::from(imported).with_source(source))
        .collect();

    let (date_from, date_to) = args.window(import.default_zone);
    let query = EventQuery::new(date_from)
        .with_date_to(date_to)
        .with_order(args.order())
        .with_expansion(expansion);

    let result = query_events(&events, &query);

    Ok(RunOutcome {
        import: report,
        query: result,
    })
}

/// Human readable notes on what did not make it into the output.
#[must_use]
pub fn summary_lines(outcome: &RunOutcome) -> Vec<String> {
    let mut lines = vec![format!(
        "{} instance(s) from {} event(s)",
        outcome.query.instances.len(),
        outcome.import.events.len()
    )];

    lines.extend(
        outcome
            .import
            .failures
            .iter()
            .map(|failure| format!("import failed for {} (line {}): {}", failure.uid, failure.line, failure.error)),
    );
    lines.extend(
        outcome
            .import
            .duplicates
            .iter()
            .map(|uid| format!("duplicate UID skipped: {uid}")),
    );
    lines.extend(outcome.query.dropped_modifications.iter().map(|dropped| {
        format!(
            "dropped modification of {} originally at {}",
            dropped.event_id, dropped.modification.original_start
        )
    }));
    lines.extend(
        outcome
            .query
            .truncated
            .iter()
            .map(|id| format!("expansion of {id} stopped at the instance limit")),
    );
    lines.extend(
        outcome
            .query
            .skipped
            .iter()
            .map(|skipped| format!("skipped {}: {}", skipped.event_id, skipped.error)),
    );
    lines
}
