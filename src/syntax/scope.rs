//! Shallow cursor-scope analysis over partial query text.

use super::text::{GROUPING_KEYWORDS, is_callable};
use super::{CursorScope, TokenClass};

/// Structural view of one cursor position inside a partial query.
///
/// Built by a single tolerant scan: unclosed brackets and unterminated
/// strings count as open zones, so classification keeps working while the
/// user types. The known-metric list drives metric recognition, the same
/// way a highlighter is re-taught metric names after each fetch.
#[derive(Debug, Clone)]
pub struct QueryScope {
    classes: Vec<TokenClass>,
    local_text: String,
    local_offset: usize,
    metric: Option<String>,
    previous_key: Option<String>,
}

impl QueryScope {
    /// Analyze `query` around the byte offset `cursor`.
    ///
    /// Returns `None` when the offset is out of bounds or not on a char
    /// boundary.
    pub fn analyze(query: &str, cursor: usize, known_metrics: &[String]) -> Option<QueryScope> {
        if cursor > query.len() || !query.is_char_boundary(cursor) {
            return None;
        }
        let (stack, in_string) = open_brackets(query, cursor);
        let scope = match stack.last().copied() {
            Some(('[', open)) => range_scope(query, cursor, open, known_metrics),
            Some(('{', open)) => labels_scope(query, cursor, open, in_string, known_metrics),
            Some(('(', open)) => paren_scope(query, cursor, open, known_metrics),
            _ => expression_scope(query, cursor, 0, query.len(), known_metrics),
        };
        Some(scope)
    }

    /// Cursor-local text run (the analog of the text node under the cursor).
    pub fn text(&self) -> &str {
        &self.local_text
    }

    /// Cursor offset within [`text`](Self::text), in bytes.
    pub fn offset(&self) -> usize {
        self.local_offset
    }
}

impl CursorScope for QueryScope {
    fn has_class(&self, class: TokenClass) -> bool {
        self.classes.contains(&class)
    }

    fn find_ancestor(&self, class: TokenClass) -> Option<String> {
        match class {
            TokenClass::Metric => self.metric.clone(),
            _ => None,
        }
    }

    fn find_previous_sibling(&self, class: TokenClass) -> Option<String> {
        match class {
            TokenClass::AttrName => self.previous_key.clone(),
            _ => None,
        }
    }
}

/// Open brackets (with byte positions) and string state at `cursor`.
fn open_brackets(query: &str, cursor: usize) -> (Vec<(char, usize)>, bool) {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in query.char_indices() {
        if i >= cursor {
            break;
        }
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '(' | '[' | '{' => stack.push((ch, i)),
            ')' => pop_if(&mut stack, '('),
            ']' => pop_if(&mut stack, '['),
            '}' => pop_if(&mut stack, '{'),
            _ => {}
        }
    }
    (stack, in_string)
}

fn pop_if(stack: &mut Vec<(char, usize)>, open: char) {
    if stack.last().map(|(c, _)| *c) == Some(open) {
        stack.pop();
    }
}

/// Byte position of the bracket closing the zone opened at `open`, or the
/// end of the query while the zone is still unclosed. Skips strings.
fn matching_close(query: &str, open: usize, close: char) -> usize {
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in query[open + 1..].char_indices() {
        let at = open + 1 + i;
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        if ch == '"' {
            in_string = true;
        } else if ch == close {
            return at;
        }
    }
    query.len()
}

/// Byte position of the quote closing the string opened at `open`.
fn find_string_end(text: &str, open: usize) -> Option<usize> {
    let mut escaped = false;
    for (i, ch) in text[open + 1..].char_indices() {
        let at = open + 1 + i;
        if escaped {
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            return Some(at);
        }
    }
    None
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == ':'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == ':'
}

/// End of the identifier starting at `start`.
fn ident_end(text: &str, start: usize) -> usize {
    text[start..]
        .char_indices()
        .find(|(_, c)| !is_ident_char(*c))
        .map(|(i, _)| start + i)
        .unwrap_or(text.len())
}

/// Identifier ending just before `pos`, ignoring trailing whitespace.
fn ident_before(query: &str, pos: usize) -> Option<(usize, usize)> {
    let head = query[..pos].trim_end();
    let end = head.len();
    let start = head
        .char_indices()
        .rev()
        .take_while(|(_, c)| is_ident_char(*c))
        .last()
        .map(|(i, _)| i)?;
    let first = head[start..].chars().next()?;
    if !is_ident_start(first) {
        return None;
    }
    Some((start, end))
}

/// First identifier in the query naming a known metric.
fn lucky_guess(query: &str, known_metrics: &[String]) -> Option<String> {
    let mut in_string = false;
    let mut escaped = false;
    let mut pos = 0;
    while pos < query.len() {
        let ch = match query[pos..].chars().next() {
            Some(c) => c,
            None => break,
        };
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            pos += ch.len_utf8();
            continue;
        }
        if ch == '"' {
            in_string = true;
            pos += 1;
            continue;
        }
        if is_ident_start(ch) {
            let end = ident_end(query, pos);
            let word = &query[pos..end];
            if known_metrics.iter().any(|m| m == word) {
                return Some(word.to_string());
            }
            pos = end;
            continue;
        }
        pos += ch.len_utf8();
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunKind {
    /// Label key followed by a matcher operator.
    Key,
    /// Complete quoted matcher value.
    Value,
    /// Recognized expression token.
    Token,
    /// Known metric name.
    Metric,
    /// Unrecognized text.
    Plain,
}

#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    end: usize,
    kind: RunKind,
}

/// The run containing the cursor. Runs own their end position but not
/// their start, matching how an editor resolves a collapsed selection to
/// the text node just typed into. A cursor sitting right after the closing
/// quote of a value is outside it.
fn run_at_cursor(runs: &[Run], cursor: usize) -> (usize, usize, RunKind) {
    for run in runs {
        if run.start < cursor && cursor <= run.end {
            if run.kind == RunKind::Value && cursor == run.end {
                break;
            }
            return (run.start, run.end, run.kind);
        }
    }
    (cursor, cursor, RunKind::Plain)
}

fn flush_plain(runs: &mut Vec<Run>, plain_start: &mut Option<usize>, end: usize, base: usize) {
    if let Some(start) = plain_start.take() {
        if end > start {
            runs.push(Run {
                start: base + start,
                end: base + end,
                kind: RunKind::Plain,
            });
        }
    }
}

/// True when the next non-space characters form a matcher operator
/// (`=`, `!=`, `=~`, `!~`).
fn followed_by_matcher_op(body: &str, from: usize) -> bool {
    let rest = body[from..].trim_start();
    rest.starts_with('=') || rest.starts_with("!=") || rest.starts_with("!~")
}

/// Split a matcher body into label-key runs, complete quoted values, and
/// the plain text between them. Commas and operators stay plain.
fn matcher_runs(body: &str, base: usize) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut plain_start: Option<usize> = None;
    let mut pos = 0;
    while pos < body.len() {
        let ch = match body[pos..].chars().next() {
            Some(c) => c,
            None => break,
        };
        if ch == '"' {
            match find_string_end(body, pos) {
                Some(close) => {
                    flush_plain(&mut runs, &mut plain_start, pos, base);
                    runs.push(Run {
                        start: base + pos,
                        end: base + close + 1,
                        kind: RunKind::Value,
                    });
                    pos = close + 1;
                }
                None => {
                    if plain_start.is_none() {
                        plain_start = Some(pos);
                    }
                    pos = body.len();
                }
            }
            continue;
        }
        if is_ident_start(ch) {
            let end = ident_end(body, pos);
            if followed_by_matcher_op(body, end) {
                flush_plain(&mut runs, &mut plain_start, pos, base);
                runs.push(Run {
                    start: base + pos,
                    end: base + end,
                    kind: RunKind::Key,
                });
            } else if plain_start.is_none() {
                plain_start = Some(pos);
            }
            pos = end;
            continue;
        }
        if plain_start.is_none() {
            plain_start = Some(pos);
        }
        pos += ch.len_utf8();
    }
    flush_plain(&mut runs, &mut plain_start, body.len(), base);
    runs
}

fn labels_scope(
    query: &str,
    cursor: usize,
    open: usize,
    in_string: bool,
    known_metrics: &[String],
) -> QueryScope {
    let body_start = open + 1;
    let body_end = matching_close(query, open, '}');
    // Anchor to the identifier right before the brace when it is a known
    // metric; otherwise to the first known metric anywhere in the query.
    let metric = ident_before(query, open)
        .map(|(s, e)| &query[s..e])
        .filter(|name| known_metrics.iter().any(|m| m == name))
        .map(str::to_string)
        .or_else(|| lucky_guess(query, known_metrics));

    let runs = matcher_runs(&query[body_start..body_end], body_start);
    let (start, end, kind) = run_at_cursor(&runs, cursor);

    let mut classes = vec![TokenClass::Token, TokenClass::Labels];
    if in_string || (kind == RunKind::Value && cursor < end) {
        classes.push(TokenClass::AttrValue);
    }
    if kind == RunKind::Key {
        classes.push(TokenClass::AttrName);
    }

    let previous_key = runs
        .iter()
        .rfind(|r| r.kind == RunKind::Key && r.end <= start)
        .map(|r| query[r.start..r.end].to_string());

    QueryScope {
        classes,
        local_text: query[start..end].to_string(),
        local_offset: cursor - start,
        metric,
        previous_key,
    }
}

fn range_scope(query: &str, cursor: usize, open: usize, known_metrics: &[String]) -> QueryScope {
    let body_start = open + 1;
    let body_end = matching_close(query, open, ']');
    QueryScope {
        classes: vec![TokenClass::Token, TokenClass::Range],
        local_text: query[body_start..body_end].to_string(),
        local_offset: cursor - body_start,
        metric: lucky_guess(query, known_metrics),
        previous_key: None,
    }
}

fn paren_scope(query: &str, cursor: usize, open: usize, known_metrics: &[String]) -> QueryScope {
    let body_end = matching_close(query, open, ')');
    if let Some((s, e)) = ident_before(query, open) {
        let head = &query[s..e];
        if GROUPING_KEYWORDS.contains(&head) {
            return grouping_scope(query, cursor, open + 1, body_end, known_metrics);
        }
        if is_callable(head) {
            let mut scope = expression_scope(query, cursor, open + 1, body_end, known_metrics);
            scope.classes.push(TokenClass::Function);
            return scope;
        }
    }
    expression_scope(query, cursor, open + 1, body_end, known_metrics)
}

fn grouping_scope(
    query: &str,
    cursor: usize,
    body_start: usize,
    body_end: usize,
    known_metrics: &[String],
) -> QueryScope {
    let (start, end) = comma_piece(query, body_start, body_end, cursor);
    QueryScope {
        classes: vec![TokenClass::Token, TokenClass::Aggregation],
        local_text: query[start..end].to_string(),
        local_offset: cursor - start,
        metric: lucky_guess(query, known_metrics),
        previous_key: None,
    }
}

/// Bounds of the comma-separated piece containing `cursor`.
fn comma_piece(query: &str, lo: usize, hi: usize, cursor: usize) -> (usize, usize) {
    let mut start = lo;
    let mut end = hi;
    for (i, ch) in query[lo..hi].char_indices() {
        let at = lo + i;
        if ch == ',' {
            if at < cursor {
                start = at + 1;
            } else {
                end = at;
                break;
            }
        }
    }
    (start, end)
}

fn expression_scope(
    query: &str,
    cursor: usize,
    lo: usize,
    hi: usize,
    known_metrics: &[String],
) -> QueryScope {
    let runs = expression_runs(&query[lo..hi], lo, known_metrics);
    let (start, end, kind) = run_at_cursor(&runs, cursor);
    let mut classes = Vec::new();
    match kind {
        RunKind::Metric => {
            classes.push(TokenClass::Token);
            classes.push(TokenClass::Metric);
        }
        RunKind::Token => classes.push(TokenClass::Token),
        _ => {}
    }
    QueryScope {
        classes,
        local_text: query[start..end].to_string(),
        local_offset: cursor - start,
        metric: lucky_guess(query, known_metrics),
        previous_key: None,
    }
}

/// Split an expression region into recognized tokens (known metric names,
/// callable names followed by parens, numbers and durations, complete
/// strings) and the plain text between them. Operators stay plain so a
/// cursor after `+` lands in a run containing the operator.
fn expression_runs(region: &str, base: usize, known_metrics: &[String]) -> Vec<Run> {
    let mut runs = Vec::new();
    let mut plain_start: Option<usize> = None;
    let mut pos = 0;
    while pos < region.len() {
        let ch = match region[pos..].chars().next() {
            Some(c) => c,
            None => break,
        };
        if ch == '"' {
            match find_string_end(region, pos) {
                Some(close) => {
                    flush_plain(&mut runs, &mut plain_start, pos, base);
                    runs.push(Run {
                        start: base + pos,
                        end: base + close + 1,
                        kind: RunKind::Token,
                    });
                    pos = close + 1;
                }
                None => {
                    if plain_start.is_none() {
                        plain_start = Some(pos);
                    }
                    pos = region.len();
                }
            }
            continue;
        }
        if ch.is_ascii_digit() {
            let end = region[pos..]
                .char_indices()
                .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '.'))
                .map(|(i, _)| pos + i)
                .unwrap_or(region.len());
            flush_plain(&mut runs, &mut plain_start, pos, base);
            runs.push(Run {
                start: base + pos,
                end: base + end,
                kind: RunKind::Token,
            });
            pos = end;
            continue;
        }
        if is_ident_start(ch) {
            let end = ident_end(region, pos);
            let word = &region[pos..end];
            if known_metrics.iter().any(|m| m == word) {
                flush_plain(&mut runs, &mut plain_start, pos, base);
                runs.push(Run {
                    start: base + pos,
                    end: base + end,
                    kind: RunKind::Metric,
                });
            } else if is_callable(word) && next_is_open_paren(region, end) {
                flush_plain(&mut runs, &mut plain_start, pos, base);
                runs.push(Run {
                    start: base + pos,
                    end: base + end,
                    kind: RunKind::Token,
                });
            } else if plain_start.is_none() {
                plain_start = Some(pos);
            }
            pos = end;
            continue;
        }
        if plain_start.is_none() {
            plain_start = Some(pos);
        }
        pos += ch.len_utf8();
    }
    flush_plain(&mut runs, &mut plain_start, region.len(), base);
    runs
}

fn next_is_open_paren(region: &str, from: usize) -> bool {
    region[from..].trim_start().starts_with('(')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn known() -> Vec<String> {
        vec!["http_requests".to_string(), "node_cpu".to_string()]
    }

    #[test]
    fn range_zone_inside_brackets() {
        let query = "rate(http_requests[5m])";
        let scope = QueryScope::analyze(query, 20, &known()).unwrap();
        assert!(scope.has_class(TokenClass::Range));
        assert_eq!(scope.text(), "5m");
        assert_eq!(scope.offset(), 1);
    }

    #[test]
    fn labels_zone_key_position() {
        let query = "http_requests{jo";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Labels));
        assert!(!scope.has_class(TokenClass::AttrValue));
        assert_eq!(scope.text(), "jo");
        assert_eq!(
            scope.find_ancestor(TokenClass::Metric).as_deref(),
            Some("http_requests")
        );
    }

    #[test]
    fn labels_zone_value_position_after_equals() {
        let query = "http_requests{job=";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Labels));
        assert_eq!(scope.text(), "=");
        assert_eq!(
            scope.find_previous_sibling(TokenClass::AttrName).as_deref(),
            Some("job")
        );
    }

    #[test]
    fn labels_zone_inside_quoted_value() {
        let query = "http_requests{job=\"api\"}";
        // Cursor between 'a' and 'p'.
        let cursor = query.find("api").unwrap() + 1;
        let scope = QueryScope::analyze(query, cursor, &known()).unwrap();
        assert!(scope.has_class(TokenClass::AttrValue));
        assert_eq!(scope.text(), "\"api\"");
        assert_eq!(scope.offset(), 2);
        assert_eq!(
            scope.find_previous_sibling(TokenClass::AttrName).as_deref(),
            Some("job")
        );
    }

    #[test]
    fn labels_zone_unterminated_value_counts_as_value() {
        let query = "http_requests{job=\"a";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::AttrValue));
        assert_eq!(scope.text(), "=\"a");
    }

    #[test]
    fn cursor_after_closing_quote_is_outside_the_value() {
        let query = "http_requests{job=\"api\"";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(!scope.has_class(TokenClass::AttrValue));
        assert_eq!(scope.text(), "");
    }

    #[test]
    fn labels_zone_second_matcher_recovers_nearest_key() {
        let query = "http_requests{job=\"api\",instance=";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert_eq!(
            scope.find_previous_sibling(TokenClass::AttrName).as_deref(),
            Some("instance")
        );
    }

    #[test]
    fn labels_zone_without_known_metric_is_unanchored() {
        let query = "untracked_metric{jo";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Labels));
        assert_eq!(scope.find_ancestor(TokenClass::Metric), None);
    }

    #[test]
    fn labels_zone_falls_back_to_first_known_metric_in_query() {
        let query = "http_requests / untracked{";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Labels));
        assert_eq!(
            scope.find_ancestor(TokenClass::Metric).as_deref(),
            Some("http_requests")
        );
    }

    #[test]
    fn grouping_zone_carries_aggregation_class_and_lucky_metric() {
        let query = "sum(http_requests) by (";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Aggregation));
        assert_eq!(
            scope.find_ancestor(TokenClass::Metric).as_deref(),
            Some("http_requests")
        );
    }

    #[test]
    fn function_parens_carry_function_class() {
        let query = "rate(";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Function));
        assert_eq!(scope.text(), "");
    }

    #[test]
    fn known_metric_at_top_level_is_a_token() {
        let query = "http_requests";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(scope.has_class(TokenClass::Token));
        assert!(scope.has_class(TokenClass::Metric));
        assert_eq!(scope.text(), "http_requests");
    }

    #[test]
    fn text_after_operator_stays_plain() {
        let query = "http_requests + ";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(!scope.has_class(TokenClass::Token));
        assert_eq!(scope.text(), " + ");
    }

    #[test]
    fn unclosed_brace_still_opens_a_labels_zone() {
        let query = "{";
        let scope = QueryScope::analyze(query, 1, &known()).unwrap();
        assert!(scope.has_class(TokenClass::Labels));
        assert_eq!(scope.find_ancestor(TokenClass::Metric), None);
    }

    #[test]
    fn out_of_bounds_cursor_is_rejected() {
        assert!(QueryScope::analyze("abc", 4, &known()).is_none());
    }

    #[test]
    fn non_boundary_cursor_is_rejected() {
        assert!(QueryScope::analyze("ä", 1, &known()).is_none());
    }

    #[test]
    fn bracket_inside_string_does_not_open_a_zone() {
        let query = "http_requests{job=\"a[\"} + ";
        let scope = QueryScope::analyze(query, query.len(), &known()).unwrap();
        assert!(!scope.has_class(TokenClass::Range));
        assert!(!scope.has_class(TokenClass::Labels));
    }
}
