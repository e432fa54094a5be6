//! iCalendar document parser (RFC 5545).
//!
//! Builds the component tree from content lines. Property values stay raw.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use super::lexer::{parse_content_line, split_lines};
use crate::rfc::ical::core::Component;

/// Parses an iCalendar document into its root `VCALENDAR` component.
///
/// Several concatenated `VCALENDAR` objects are merged into the first one,
/// which is how some exporters write multi-calendar files.
///
/// ## Errors
/// Returns an error if a content line is malformed, components are not
/// properly nested, or the root is not a `VCALENDAR`.
#[tracing::instrument(skip(input), fields(input_len = input.len()))]
pub fn parse(input: &str) -> ParseResult<Component> {
    let lines = split_lines(input);
    tracing::trace!(count = lines.len(), "Split content lines");

    let mut open: Vec<Component> = Vec::new();
    let mut root: Option<Component> = None;
    let mut last_line = 1;

    for (line_num, text) in lines {
        last_line = line_num;
        let content_line = parse_content_line(&text, line_num)?;

        match content_line.name.as_str() {
            "BEGIN" => {
                let mut component = Component::new(content_line.raw_value.trim());
                component.line = line_num;
                open.push(component);
            }
            "END" => {
                let end_name = content_line.raw_value.trim().to_ascii_uppercase();
                let Some(done) = open.pop() else {
                    return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
                        .with_context(format!("END:{end_name} without BEGIN")));
                };
                if done.name != end_name {
                    return Err(
                        ParseError::new(ParseErrorKind::MismatchedComponent, line_num, 1)
                            .with_context(format!(
                                "expected END:{}, got END:{end_name}",
                                done.name
                            )),
                    );
                }

                if let Some(parent) = open.last_mut() {
                    parent.children.push(done);
                } else if let Some(existing) = root.as_mut() {
                    tracing::debug!(line = line_num, "Merging additional top-level component");
                    existing.children.extend(done.children);
                } else {
                    root = Some(done);
                }
            }
            _ => {
                let Some(current) = open.last_mut() else {
                    return Err(ParseError::new(ParseErrorKind::MissingBegin, line_num, 1)
                        .with_context(format!("{} outside of a component", content_line.name)));
                };
                current.properties.push(content_line);
            }
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ParseError::new(ParseErrorKind::MissingEnd, last_line, 1)
            .with_context(format!("missing END:{}", unclosed.name)));
    }

    let root = root.ok_or_else(|| ParseError::new(ParseErrorKind::MissingBegin, 1, 1))?;
    if root.name != "VCALENDAR" {
        return Err(ParseError::new(ParseErrorKind::MissingBegin, root.line, 1)
            .with_context(format!("expected VCALENDAR, got {}", root.name)));
    }

    tracing::debug!(
        events = root.events().count(),
        "iCalendar document parsed"
    );

    Ok(root)
}
