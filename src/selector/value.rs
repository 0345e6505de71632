//! Typed field values and the coercion rules shared by every filter mode
//!
//! Fields arrive as raw text. Depending on the declared type tag (`s`, `n`,
//! `d`) a field is compared as a string, a number, or a date. Coercion is
//! deliberately forgiving at evaluation time: garbage where a number or date
//! is expected never aborts the run, it fails the enclosing comparison and
//! is tallied in [`FilterStats`].

use chrono::NaiveDate;
use std::cmp::Ordering;
use std::fmt;

/// Declared type of a column value: `s` (string), `n` (number), `d` (date)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    String,
    Number,
    Date,
}

impl ValueType {
    /// Map a selector type tag to its value type
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "s" => Some(ValueType::String),
            "n" => Some(ValueType::Number),
            "d" => Some(ValueType::Date),
            _ => None,
        }
    }
}

/// Grouping/decimal separator convention for number coercion
///
/// `En` reads `1,234.5`, `De` reads `1.234,5`. Spaces are accepted as
/// grouping in both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumberLocale {
    #[default]
    En,
    De,
}

/// What a pivot column emits for a row
///
/// `Label` emits the pivot's display label when the predicate matches and
/// nothing otherwise (column-regex pivots emit the matched field value
/// instead). `Indicator` always emits `1` or `0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PivotValues {
    #[default]
    Label,
    Indicator,
}

/// Options shared by all filters built from one configuration
#[derive(Debug, Clone)]
pub struct FilterOptions {
    /// strftime-style format used to parse date literals and date fields
    pub date_format: String,
    pub number_locale: NumberLocale,
    pub pivot_values: PivotValues,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            number_locale: NumberLocale::En,
            pivot_values: PivotValues::Label,
        }
    }
}

/// Tally of recoverable evaluation failures across a run
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterStats {
    pub coercion_failures: u64,
}

impl FilterStats {
    pub fn record_coercion_failure(&mut self) {
        self.coercion_failures += 1;
    }
}

/// A parsed numeric field: integer when the raw text has no fractional
/// separator, float otherwise
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.as_f64().total_cmp(&other.as_f64()) == Ordering::Equal
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.as_f64().total_cmp(&other.as_f64()))
    }
}

/// Blank date fields coerce to this sentinel so they compare and sort after
/// every real date
pub fn far_future() -> NaiveDate {
    NaiveDate::from_ymd_opt(9999, 9, 9).expect("valid sentinel date")
}

/// Strip surrounding whitespace and one level of quote padding from a field
pub fn clean_field(raw: &str) -> &str {
    let trimmed = raw.trim();
    for quote in ['"', '\''] {
        if trimmed.len() >= 2 && trimmed.starts_with(quote) && trimmed.ends_with(quote) {
            return &trimmed[1..trimmed.len() - 1];
        }
    }
    trimmed
}

/// Parse a number per the locale's separator convention
///
/// Returns `None` for empty or non-numeric text; callers decide whether
/// that fails a comparison or falls back to a string value.
pub fn parse_number(raw: &str, locale: NumberLocale) -> Option<Number> {
    let cleaned = clean_field(raw);
    if cleaned.is_empty() {
        return None;
    }
    let normalized: String = match locale {
        NumberLocale::En => cleaned
            .chars()
            .filter(|c| *c != ',' && *c != ' ')
            .collect(),
        NumberLocale::De => cleaned
            .chars()
            .filter(|c| *c != '.' && *c != ' ')
            .map(|c| if c == ',' { '.' } else { c })
            .collect(),
    };
    if normalized.contains('.') {
        normalized.parse::<f64>().ok().map(Number::Float)
    } else {
        normalized.parse::<i64>().ok().map(Number::Int)
    }
}

/// Parse a date field with the given format, `None` when the text does not
/// conform. Blank text is the caller's business (see [`far_future`]).
pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(clean_field(raw), format).ok()
}

/// A projected field after type coercion, ordered for sorting. Numbers
/// compare numerically and dates chronologically; unparseable values fall
/// back to strings, which sort after both.
#[derive(Debug, Clone)]
pub enum TypedValue {
    Int(i64),
    Float(f64),
    Date(NaiveDate),
    Str(String),
}

impl TypedValue {
    fn rank(&self) -> u8 {
        match self {
            TypedValue::Int(_) | TypedValue::Float(_) => 0,
            TypedValue::Date(_) => 1,
            TypedValue::Str(_) => 2,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            TypedValue::Int(i) => Some(*i as f64),
            TypedValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl Ord for TypedValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_f64(), other.as_f64()) {
            (Some(a), Some(b)) => a.total_cmp(&b),
            _ => match (self, other) {
                (TypedValue::Date(a), TypedValue::Date(b)) => a.cmp(b),
                (TypedValue::Str(a), TypedValue::Str(b)) => a.cmp(b),
                _ => self.rank().cmp(&other.rank()),
            },
        }
    }
}

impl PartialOrd for TypedValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for TypedValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for TypedValue {}

impl fmt::Display for TypedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypedValue::Int(i) => write!(f, "{}", i),
            TypedValue::Float(v) => write!(f, "{}", v),
            TypedValue::Date(d) => write!(f, "{}", d),
            TypedValue::Str(s) => write!(f, "{}", s),
        }
    }
}
