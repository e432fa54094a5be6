//! iCalendar text parsing: lexing, the component tree and raw values.

mod error;
mod lexer;
mod parser;
mod values;

pub use error::{ParseError, ParseErrorKind, ParseResult};
pub use lexer::{parse_content_line, split_lines};
pub use parser::parse;
pub use values::{DateToken, RuleParts, parse_date_token, parse_rule_parts, unescape_text};
