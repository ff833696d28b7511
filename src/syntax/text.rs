//! Shared text rules: prefix cleaning, range literals, keyword tables.

/// Duration literals offered inside range-vector brackets.
pub const RATE_RANGES: &[&str] = &["1m", "5m", "10m", "30m", "1h"];

/// Aggregation operators. Their argument parens take a vector expression;
/// their `by`/`without` clauses take label keys.
pub(crate) const AGGREGATION_OPERATORS: &[&str] = &[
    "sum",
    "min",
    "max",
    "avg",
    "stddev",
    "stdvar",
    "count",
    "count_values",
    "bottomk",
    "topk",
    "quantile",
];

/// Built-in query functions, used to recognize function-call parens.
pub(crate) const FUNCTIONS: &[&str] = &[
    "abs",
    "absent",
    "ceil",
    "changes",
    "clamp_max",
    "clamp_min",
    "count_scalar",
    "day_of_month",
    "day_of_week",
    "days_in_month",
    "delta",
    "deriv",
    "drop_common_labels",
    "exp",
    "floor",
    "histogram_quantile",
    "holt_winters",
    "hour",
    "idelta",
    "increase",
    "irate",
    "label_replace",
    "ln",
    "log2",
    "log10",
    "minute",
    "month",
    "predict_linear",
    "rate",
    "resets",
    "round",
    "scalar",
    "sort",
    "sort_desc",
    "sqrt",
    "time",
    "vector",
    "year",
];

/// Keywords that head a grouping clause.
pub(crate) const GROUPING_KEYWORDS: &[&str] = &["by", "without"];

/// Characters stripped when reducing cursor-local text to a prefix.
const STRUCTURAL_CHARS: &[char] = &[
    '{', '}', '[', ']', '=', '"', '(', ')', ',', '!', '~', '+', '-', '*', '/', '^', '%',
];

/// Reduce cursor-local text to the token-relevant prefix: drop matcher and
/// operator punctuation anywhere in the string, then trim whitespace.
pub fn clean_text(text: &str) -> String {
    let stripped: String = text.chars().filter(|c| !STRUCTURAL_CHARS.contains(c)).collect();
    stripped.trim().to_string()
}

/// Whether `name` is a known function or aggregation operator.
pub(crate) fn is_callable(name: &str) -> bool {
    FUNCTIONS.contains(&name) || AGGREGATION_OPERATORS.contains(&name)
}
