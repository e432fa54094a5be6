//! Content line lexer for iCalendar (RFC 5545 §3.1).
//!
//! Handles line unfolding and tokenization of content lines.

use super::error::{ParseError, ParseErrorKind, ParseResult};
use crate::rfc::ical::core::{ContentLine, Parameter};

/// Splits input into logical content lines, merging folded continuations.
///
/// Accepts both CRLF and bare LF. A line starting with SP or HTAB continues
/// the previous one with that single whitespace character removed. Lines with
/// no `:` at all are also treated as continuations, since some exporters
/// break long descriptions without folding them.
///
/// Each entry carries the 1-based number of its first physical line.
#[must_use]
pub fn split_lines(input: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }

        let continuation = match line.strip_prefix([' ', '\t']) {
            Some(rest) => Some(rest),
            None if !line.contains(':') => Some(line),
            None => None,
        };

        match (continuation, lines.last_mut()) {
            (Some(rest), Some((_, previous))) => previous.push_str(rest),
            (Some(rest), None) => lines.push((index + 1, rest.to_string())),
            (None, _) => lines.push((index + 1, line.to_string())),
        }
    }

    lines
}

/// Parses a single unfolded content line.
///
/// Format: `name *(";" param) ":" value`
///
/// ## Errors
/// Returns an error if the name is missing or malformed, a parameter is
/// malformed, or the value separator is missing.
pub fn parse_content_line(line: &str, line_num: usize) -> ParseResult<ContentLine> {
    let name_end = line
        .find([';', ':'])
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, line.len()))?;

    if name_end == 0 {
        return Err(ParseError::new(
            ParseErrorKind::MissingPropertyName,
            line_num,
            1,
        ));
    }

    let name = &line[..name_end];
    if let Some(bad) = name.find(|c: char| !c.is_ascii_alphanumeric() && c != '-') {
        return Err(ParseError::new(
            ParseErrorKind::InvalidPropertyName,
            line_num,
            bad + 1,
        ));
    }

    let mut params = Vec::new();
    let mut rest = &line[name_end..];
    let mut offset = name_end;
    while let Some(after_semicolon) = rest.strip_prefix(';') {
        let (param, consumed) = parse_parameter(after_semicolon, line_num, offset + 2)?;
        params.push(param);
        rest = &after_semicolon[consumed..];
        offset += 1 + consumed;
    }

    let value = rest
        .strip_prefix(':')
        .ok_or_else(|| ParseError::new(ParseErrorKind::MissingColon, line_num, offset + 1))?;

    Ok(ContentLine {
        name: name.to_ascii_uppercase(),
        params,
        raw_value: value.to_string(),
        line: line_num,
    })
}

/// Parses `NAME=value[,value...]` and returns the parameter together with
/// the number of bytes consumed, stopping in front of the next `;` or `:`.
fn parse_parameter(input: &str, line_num: usize, column: usize) -> ParseResult<(Parameter, usize)> {
    let eq = input
        .find('=')
        .ok_or_else(|| ParseError::new(ParseErrorKind::InvalidParameter, line_num, column))?;
    let name = &input[..eq];
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(
            ParseError::new(ParseErrorKind::InvalidParameter, line_num, column)
                .with_context(format!("bad parameter name '{name}'")),
        );
    }

    let mut values = Vec::new();
    let mut pos = eq + 1;
    loop {
        let (value, consumed) = parse_param_value(&input[pos..], line_num, column + pos)?;
        values.push(value);
        pos += consumed;

        match input[pos..].chars().next() {
            Some(',') => pos += 1,
            Some(';' | ':') => return Ok((Parameter::with_values(name, values), pos)),
            Some(other) => {
                return Err(
                    ParseError::new(ParseErrorKind::InvalidParameter, line_num, column + pos)
                        .with_context(format!("unexpected character '{other}'")),
                );
            }
            None => {
                return Err(ParseError::new(
                    ParseErrorKind::MissingColon,
                    line_num,
                    column + pos,
                ));
            }
        }
    }
}

/// Parses one parameter value, quoted or bare, returning it with the bytes consumed.
fn parse_param_value(input: &str, line_num: usize, column: usize) -> ParseResult<(String, usize)> {
    if let Some(quoted) = input.strip_prefix('"') {
        let close = quoted
            .find('"')
            .ok_or_else(|| ParseError::new(ParseErrorKind::UnclosedQuote, line_num, column))?;
        return Ok((decode_caret(&quoted[..close]), close + 2));
    }

    let end = input.find([',', ';', ':']).unwrap_or(input.len());
    Ok((input[..end].to_string(), end))
}

/// Resolves RFC 6868 caret escapes. Unknown escapes are kept verbatim.
fn decode_caret(value: &str) -> String {
    let mut decoded = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '^' {
            decoded.push(c);
            continue;
        }
        match chars.peek() {
            Some('^') => decoded.push('^'),
            Some('n') => decoded.push('\n'),
            Some('\'') => decoded.push('"'),
            _ => {
                decoded.push('^');
                continue;
            }
        }
        chars.next();
    }

    decoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_merges_folded_lines() {
        let input = "DESCRIPTION:Quarterly\r\n  planning\r\n\tsession\r\nSUMMARY:Review\r\n";
        let lines = split_lines(input);
        assert_eq!(
            lines,
            vec![
                (1, "DESCRIPTION:Quarterly planningsession".to_string()),
                (4, "SUMMARY:Review".to_string()),
            ]
        );
    }

    #[test]
    fn split_accepts_bare_lf_and_skips_blank_lines() {
        let lines = split_lines("BEGIN:VEVENT\n\nUID:1\nEND:VEVENT");
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], (3, "UID:1".to_string()));
    }

    #[test]
    fn split_joins_unfolded_breaks_without_colon() {
        let lines = split_lines("DESCRIPTION:first part\nsecond part\nUID:1");
        assert_eq!(lines[0].1, "DESCRIPTION:first partsecond part");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn parse_simple_line() {
        let result = parse_content_line("summary:Team Meeting", 7).expect("should parse");
        assert_eq!(result.name, "SUMMARY");
        assert!(result.params.is_empty());
        assert_eq!(result.raw_value, "Team Meeting");
        assert_eq!(result.line, 7);
    }

    #[test]
    fn parse_line_with_tzid() {
        let result = parse_content_line("DTSTART;TZID=Europe/Berlin:20240311T090000", 1)
            .expect("should parse");
        assert_eq!(result.tzid(), Some("Europe/Berlin"));
        assert_eq!(result.raw_value, "20240311T090000");
    }

    #[test]
    fn parse_value_may_contain_colons() {
        let result =
            parse_content_line("ORGANIZER;CN=Ann:mailto:ann@example.com", 1).expect("should parse");
        assert_eq!(result.get_param_value("cn"), Some("Ann"));
        assert_eq!(result.raw_value, "mailto:ann@example.com");
    }

    #[test]
    fn parse_quoted_and_multi_valued_params() {
        let result = parse_content_line(
            "ATTENDEE;CN=\"Doe, Jane\";ROLE=CHAIR,REQ-PARTICIPANT:mailto:jane@example.com",
            1,
        )
        .expect("should parse");
        assert_eq!(result.get_param_value("CN"), Some("Doe, Jane"));
        let role = result.get_param("ROLE").expect("role param");
        assert_eq!(role.values, vec!["CHAIR", "REQ-PARTICIPANT"]);
    }

    #[test]
    fn parse_caret_escapes_in_quoted_value() {
        let result =
            parse_content_line("ATTENDEE;CN=\"A^nB ^'C^' ^^\":mailto:x@example.com", 1)
                .expect("should parse");
        assert_eq!(result.get_param_value("CN"), Some("A\nB \"C\" ^"));
    }

    #[test]
    fn parse_unclosed_quote_fails() {
        let err = parse_content_line("ATTENDEE;CN=\"Unclosed:mailto:x@example.com", 3)
            .expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::UnclosedQuote);
        assert_eq!(err.line, 3);
    }

    #[test]
    fn parse_missing_colon_fails() {
        let err = parse_content_line("INVALID", 1).expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::MissingColon);
    }

    #[test]
    fn parse_bad_name_reports_column() {
        let err = parse_content_line("SUM MARY:x", 1).expect_err("should fail");
        assert_eq!(err.kind, ParseErrorKind::InvalidPropertyName);
        assert_eq!(err.column, 4);
    }
}
