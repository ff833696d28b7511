//! Acceptance-time suggestion rewriting.
//!
//! Applied exactly once, after the user picks a suggestion and before the
//! host editor splices it into the document. Pure text transforms driven
//! by the classified context plus one character of lookahead.

use crate::types::CursorContext;

/// Rewrite an accepted suggestion for insertion.
///
/// `context` is the classification the suggestion came from, straight off
/// the result; `typed` is the text already typed at the cursor (the same
/// cursor-local run classification saw); `next_char` is the character
/// immediately following the cursor in the live document, `None` at end
/// of input.
///
/// Label keys get `=` appended when the cursor is at the end of a
/// selector, so accepting a key lands in value position. Label values
/// end up fully quoted, tolerating quote characters already present on
/// either side.
pub fn apply_suggestion(
    suggestion: &str,
    context: Option<&CursorContext>,
    typed: &str,
    next_char: Option<char>,
) -> String {
    match context {
        Some(CursorContext::Labels { .. }) => match next_char {
            None | Some('}') | Some(',') => format!("{suggestion}="),
            Some(_) => suggestion.to_string(),
        },
        Some(CursorContext::LabelValues { .. }) => {
            let mut out = String::new();
            if !starts_quoted(typed) {
                out.push('"');
            }
            out.push_str(suggestion);
            if next_char != Some('"') {
                out.push('"');
            }
            out
        }
        _ => suggestion.to_string(),
    }
}

/// Whether `typed` already opens the value's quote: a bare `"` or a
/// matcher operator (`=`, `!=`, `=~`) followed by `"`.
fn starts_quoted(typed: &str) -> bool {
    if typed.starts_with('"') {
        return true;
    }
    let rest = typed.strip_prefix('!').unwrap_or(typed);
    let Some(rest) = rest.strip_prefix('=') else {
        return false;
    };
    let rest = rest.strip_prefix('~').unwrap_or(rest);
    rest.starts_with('"')
}
