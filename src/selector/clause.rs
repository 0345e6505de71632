//! Clause compilation: one selector clause to one predicate
//!
//! Dispatch is an ordered list of shape rules tried top to bottom; the
//! first hit wins. Order matters in two places: the boolean block is
//! checked before everything else, and date comparisons are tried before
//! number comparisons because a date literal also starts with digits.

use super::error::SelectorError;
use super::expr::BoolExpr;
use super::value::{FilterOptions, Number, ValueType, parse_number};
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static INDEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static TYPED_INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([snd]):(\d+)$").expect("valid regex"));
static RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)-(\d+)$").expect("valid regex"));
static TYPED_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([snd]):(\d+)-(\d+)$").expect("valid regex"));
static REGEX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^/(.*)/$").expect("valid regex"));
static COL_REGEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):/(.*)/$").expect("valid regex"));
static DATE_CMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([<=>])(\d+\D\d+\D\d+)$").expect("valid regex"));
static DATE_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+):(\d+\D\d+\D\d+-\d+\D\d+\D\d+)$").expect("valid regex")
});
static NUM_CMP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):([<=>])(-?\d+(?:\.\d+)?)$").expect("valid regex"));
static NUM_RANGE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+):(\d+(?:\.\d+)?)-(\d+(?:\.\d+)?)$").expect("valid regex"));

/// Operator of a simple column comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Lt,
    Eq,
    Gt,
}

impl CompareOp {
    fn from_symbol(symbol: &str) -> Self {
        match symbol {
            "<" => CompareOp::Lt,
            ">" => CompareOp::Gt,
            _ => CompareOp::Eq,
        }
    }
}

/// A comparison bound, either numeric or a date
#[derive(Debug, Clone, Copy)]
pub enum Bound {
    Number(f64),
    Date(NaiveDate),
}

/// The compiled form of one selector clause
#[derive(Debug, Clone)]
pub enum Predicate {
    Index(usize),
    TypedIndex(ValueType, usize),
    Range(usize, usize),
    TypedRange(ValueType, usize, usize),
    Pattern(Regex),
    ColumnPattern { col: usize, pattern: Regex },
    Comparison { col: usize, op: CompareOp, bound: Bound },
    Between { col: usize, lo: Bound, hi: Bound },
    Boolean(BoolExpr),
}

/// Compile a single clause, already cut out of the selector
pub fn compile(clause: &str, options: &FilterOptions) -> Result<Predicate, SelectorError> {
    if let Some(body) = clause.strip_prefix("BEGIN").and_then(|c| c.strip_suffix("END")) {
        return BoolExpr::parse(body, options).map(Predicate::Boolean);
    }
    if INDEX_RE.is_match(clause) {
        return Ok(Predicate::Index(parse_index(clause, clause)?));
    }
    if let Some(caps) = TYPED_INDEX_RE.captures(clause) {
        let ty = ValueType::from_tag(&caps[1]).expect("regex admits only valid tags");
        return Ok(Predicate::TypedIndex(ty, parse_index(&caps[2], clause)?));
    }
    if let Some(caps) = RANGE_RE.captures(clause) {
        return Ok(Predicate::Range(
            parse_index(&caps[1], clause)?,
            parse_index(&caps[2], clause)?,
        ));
    }
    if let Some(caps) = TYPED_RANGE_RE.captures(clause) {
        let ty = ValueType::from_tag(&caps[1]).expect("regex admits only valid tags");
        return Ok(Predicate::TypedRange(
            ty,
            parse_index(&caps[2], clause)?,
            parse_index(&caps[3], clause)?,
        ));
    }
    if let Some(caps) = REGEX_RE.captures(clause) {
        return Ok(Predicate::Pattern(compile_regex(&caps[1])?));
    }
    if let Some(caps) = COL_REGEX_RE.captures(clause) {
        return Ok(Predicate::ColumnPattern {
            col: parse_index(&caps[1], clause)?,
            pattern: compile_regex(&caps[2])?,
        });
    }
    if let Some(caps) = DATE_CMP_RE.captures(clause) {
        let date = parse_date_literal(&caps[3], options)?;
        return Ok(Predicate::Comparison {
            col: parse_index(&caps[1], clause)?,
            op: CompareOp::from_symbol(&caps[2]),
            bound: Bound::Date(date),
        });
    }
    if let Some(caps) = DATE_RANGE_RE.captures(clause) {
        let (lo, hi) = split_date_range(&caps[2], options)?;
        return Ok(Predicate::Between {
            col: parse_index(&caps[1], clause)?,
            lo: Bound::Date(lo),
            hi: Bound::Date(hi),
        });
    }
    if let Some(caps) = NUM_CMP_RE.captures(clause) {
        return Ok(Predicate::Comparison {
            col: parse_index(&caps[1], clause)?,
            op: CompareOp::from_symbol(&caps[2]),
            bound: Bound::Number(parse_bound_number(&caps[3], options, clause)?),
        });
    }
    if let Some(caps) = NUM_RANGE_RE.captures(clause) {
        return Ok(Predicate::Between {
            col: parse_index(&caps[1], clause)?,
            lo: Bound::Number(parse_bound_number(&caps[2], options, clause)?),
            hi: Bound::Number(parse_bound_number(&caps[3], options, clause)?),
        });
    }
    Err(SelectorError::UnknownClause(clause.to_string()))
}

fn parse_index(digits: &str, clause: &str) -> Result<usize, SelectorError> {
    digits
        .parse()
        .map_err(|_| SelectorError::UnknownClause(clause.to_string()))
}

fn compile_regex(pattern: &str) -> Result<Regex, SelectorError> {
    Regex::new(pattern).map_err(|source| SelectorError::BadRegex {
        pattern: pattern.to_string(),
        source,
    })
}

fn parse_date_literal(literal: &str, options: &FilterOptions) -> Result<NaiveDate, SelectorError> {
    NaiveDate::parse_from_str(literal, &options.date_format).map_err(|_| {
        SelectorError::BadDateLiteral {
            literal: literal.to_string(),
            format: options.date_format.clone(),
        }
    })
}

fn parse_bound_number(
    literal: &str,
    options: &FilterOptions,
    clause: &str,
) -> Result<f64, SelectorError> {
    match parse_number(literal, options.number_locale) {
        Some(Number::Int(i)) => Ok(i as f64),
        Some(Number::Float(f)) => Ok(f),
        None => Err(SelectorError::UnknownClause(clause.to_string())),
    }
}

/// A date range literal like `1.1.2013-31.12.2014` or
/// `2014-01-01-2014-12-31` carries a `-` both as range separator and,
/// depending on the date format, inside the dates themselves. Try each `-`
/// as the separator until both sides parse.
fn split_date_range(
    literal: &str,
    options: &FilterOptions,
) -> Result<(NaiveDate, NaiveDate), SelectorError> {
    for (i, _) in literal.match_indices('-') {
        let (lo_text, hi_text) = (&literal[..i], &literal[i + 1..]);
        if let (Some(lo), Some(hi)) = (
            NaiveDate::parse_from_str(lo_text, &options.date_format).ok(),
            NaiveDate::parse_from_str(hi_text, &options.date_format).ok(),
        ) {
            return Ok((lo, hi));
        }
    }
    Err(SelectorError::BadDateLiteral {
        literal: literal.to_string(),
        format: options.date_format.clone(),
    })
}
