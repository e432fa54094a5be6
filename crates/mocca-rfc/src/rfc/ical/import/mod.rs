//! Calendar import: turns `VEVENT`s into schedules the recurrence engine
//! understands.

mod batch;
mod description;
mod event;
mod rule;

pub use batch::{ImportFailure, ImportReport, import_calendar};
pub use description::assemble_description;
pub use event::{
    ImportOptions, ImportedEvent, ImportedModification, Schedule, interpret_event,
    interpret_override, interpret_schedule,
};
pub use rule::{RuleInterpretation, frequency_tag, interpret_rule};
