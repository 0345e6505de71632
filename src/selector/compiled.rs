//! The compiled form of a selector: flattened predicate sets plus the two
//! evaluation modes (row membership and column projection)
//!
//! A `CompiledFilter` is built once per selector string, is immutable
//! afterwards, and may be shared across threads freely. Evaluation never
//! blocks and never fails; dirty data degrades to non-matches.

use super::clause::{self, Bound, CompareOp, Predicate};
use super::error::SelectorError;
use super::expr::BoolExpr;
use super::tokenize;
use super::value::{
    FilterOptions, FilterStats, Number, PivotValues, TypedValue, ValueType, clean_field,
    far_future, parse_date, parse_number,
};
use regex::Regex;
use std::cmp::Ordering;
use std::collections::HashSet;

/// Field separator of the row format
pub const FIELD_SEPARATOR: char = ';';

/// Split a line into fields, keeping a trailing empty field so positional
/// indexing stays aligned on lines that end with the separator
pub fn split_fields(line: &str) -> Vec<&str> {
    line.split(FIELD_SEPARATOR).collect()
}

/// One selected column position with its declared value type, if any
#[derive(Debug, Clone)]
struct ColumnPick {
    index: usize,
    ty: Option<ValueType>,
}

#[derive(Debug, Clone)]
enum PivotOp {
    Pattern(Regex),
    Compare(CompareOp, Bound),
    Between(Bound, Bound),
}

/// A column synthesized at projection time from a comparison predicate
#[derive(Debug, Clone)]
struct Pivot {
    label: String,
    col: usize,
    op: PivotOp,
}

/// A selector compiled into its flattened predicate sets
#[derive(Debug, Clone)]
pub struct CompiledFilter {
    positions: Vec<ColumnPick>,
    position_set: HashSet<usize>,
    patterns: Vec<Regex>,
    boolean: Option<BoolExpr>,
    pivots: Vec<Pivot>,
    options: FilterOptions,
}

impl CompiledFilter {
    /// Compile a selector string; `None` or empty builds the match-all,
    /// project-unchanged filter
    pub fn new(selector: Option<&str>, options: FilterOptions) -> Result<Self, SelectorError> {
        let mut filter = CompiledFilter {
            positions: Vec::new(),
            position_set: HashSet::new(),
            patterns: Vec::new(),
            boolean: None,
            pivots: Vec::new(),
            options,
        };
        let Some(selector) = selector else {
            return Ok(filter);
        };

        for clause_text in tokenize::clauses(selector) {
            let clause_text = clause_text?;
            match clause::compile(clause_text, &filter.options)? {
                Predicate::Index(i) => filter.add_position(i, None),
                Predicate::TypedIndex(ty, i) => filter.add_position(i, Some(ty)),
                Predicate::Range(lo, hi) => {
                    for i in lo..=hi {
                        filter.add_position(i, None);
                    }
                }
                Predicate::TypedRange(ty, lo, hi) => {
                    for i in lo..=hi {
                        filter.add_position(i, Some(ty));
                    }
                }
                Predicate::Pattern(pattern) => filter.patterns.push(pattern),
                Predicate::ColumnPattern { col, pattern } => filter.pivots.push(Pivot {
                    label: pivot_label(clause_text),
                    col,
                    op: PivotOp::Pattern(pattern),
                }),
                Predicate::Comparison { col, op, bound } => filter.pivots.push(Pivot {
                    label: pivot_label(clause_text),
                    col,
                    op: PivotOp::Compare(op, bound),
                }),
                Predicate::Between { col, lo, hi } => filter.pivots.push(Pivot {
                    label: pivot_label(clause_text),
                    col,
                    op: PivotOp::Between(lo, hi),
                }),
                Predicate::Boolean(expr) => {
                    if filter.boolean.is_some() {
                        return Err(SelectorError::MultipleBooleanBlocks);
                    }
                    filter.boolean = Some(expr);
                }
            }
        }
        Ok(filter)
    }

    /// Duplicate positions collapse at compile time; the first declaration
    /// wins, including its type tag.
    fn add_position(&mut self, index: usize, ty: Option<ValueType>) {
        if self.position_set.insert(index) {
            self.positions.push(ColumnPick { index, ty });
        }
    }

    /// The deduplicated position set, in declaration order
    pub fn positions(&self) -> Vec<usize> {
        self.positions.iter().map(|pick| pick.index).collect()
    }

    /// Whether any row-membership predicate kind is present. Without one,
    /// every row is included.
    pub fn has_row_constraint(&self) -> bool {
        !self.position_set.is_empty() || !self.patterns.is_empty() || self.boolean.is_some()
    }

    /// Membership mode: position OR full-row regex OR boolean expression
    pub fn row_matches(&self, row_index: usize, line: &str) -> bool {
        self.row_matches_with_stats(row_index, line, &mut FilterStats::default())
    }

    pub fn row_matches_with_stats(
        &self,
        row_index: usize,
        line: &str,
        stats: &mut FilterStats,
    ) -> bool {
        if !self.has_row_constraint() {
            return true;
        }
        if self.position_set.contains(&row_index) {
            return true;
        }
        if self.patterns.iter().any(|pattern| pattern.is_match(line)) {
            return true;
        }
        if let Some(expr) = &self.boolean {
            let fields = split_fields(line);
            if expr.evaluate(&fields, &self.options, stats) {
                return true;
            }
        }
        false
    }

    /// Whether projection would return the input unchanged
    pub fn is_identity_projection(&self) -> bool {
        self.positions.is_empty() && self.pivots.is_empty()
    }

    /// Projection mode: declared positions in clause order, then one entry
    /// per matching pivot in registration order
    pub fn project(&self, fields: &[&str], stats: &mut FilterStats) -> Vec<String> {
        let mut out: Vec<String> = self
            .positions
            .iter()
            .map(|pick| field_at(fields, pick.index).to_string())
            .collect();
        for pivot in &self.pivots {
            if let Some(value) = pivot.evaluate(fields, &self.options, stats) {
                out.push(value);
            }
        }
        out
    }

    /// Projection with per-position type coercion, for use as a sort key.
    /// Unparseable values degrade to strings, which order after numbers and
    /// dates, so dirty rows sink to the end instead of aborting the run.
    pub fn project_typed(&self, fields: &[&str], stats: &mut FilterStats) -> Vec<TypedValue> {
        if self.is_identity_projection() {
            return fields
                .iter()
                .map(|f| TypedValue::Str((*f).to_string()))
                .collect();
        }
        let mut out: Vec<TypedValue> = self
            .positions
            .iter()
            .map(|pick| self.coerce_pick(pick, fields, stats))
            .collect();
        for pivot in &self.pivots {
            if let Some(value) = pivot.evaluate(fields, &self.options, stats) {
                out.push(TypedValue::Str(value));
            }
        }
        out
    }

    fn coerce_pick(&self, pick: &ColumnPick, fields: &[&str], stats: &mut FilterStats) -> TypedValue {
        let raw = field_at(fields, pick.index);
        match pick.ty {
            None | Some(ValueType::String) => TypedValue::Str(raw.to_string()),
            Some(ValueType::Number) => match parse_number(raw, self.options.number_locale) {
                Some(Number::Int(i)) => TypedValue::Int(i),
                Some(Number::Float(f)) => TypedValue::Float(f),
                None => {
                    stats.record_coercion_failure();
                    TypedValue::Str(raw.to_string())
                }
            },
            Some(ValueType::Date) => {
                let cleaned = clean_field(raw);
                if cleaned.is_empty() {
                    TypedValue::Date(far_future())
                } else {
                    match parse_date(cleaned, &self.options.date_format) {
                        Some(date) => TypedValue::Date(date),
                        None => {
                            stats.record_coercion_failure();
                            TypedValue::Str(raw.to_string())
                        }
                    }
                }
            }
        }
    }
}

/// An index past the end of the row reads as an empty field
fn field_at<'a>(fields: &[&'a str], index: usize) -> &'a str {
    fields.get(index).copied().unwrap_or("")
}

/// Display label of a pivot: the clause text without its column prefix,
/// e.g. `<10` for `1:<10`
fn pivot_label(clause_text: &str) -> String {
    clause_text
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(clause_text)
        .to_string()
}

impl Pivot {
    fn evaluate(
        &self,
        fields: &[&str],
        options: &FilterOptions,
        stats: &mut FilterStats,
    ) -> Option<String> {
        let field = clean_field(field_at(fields, self.col));
        let matched = match &self.op {
            PivotOp::Pattern(pattern) => pattern.is_match(field),
            PivotOp::Compare(op, bound) => match coerce_to_bound(field, bound, options, stats) {
                Some(ord) => compare_holds(*op, ord),
                None => false,
            },
            PivotOp::Between(lo, hi) => {
                let after_lo = coerce_to_bound(field, lo, options, stats)
                    .is_some_and(|ord| ord != Ordering::Less);
                after_lo
                    && coerce_to_bound(field, hi, options, stats)
                        .is_some_and(|ord| ord != Ordering::Greater)
            }
        };
        match options.pivot_values {
            PivotValues::Indicator => Some(if matched { "1" } else { "0" }.to_string()),
            PivotValues::Label if !matched => None,
            PivotValues::Label => match &self.op {
                PivotOp::Pattern(_) => Some(field.to_string()),
                _ => Some(self.label.clone()),
            },
        }
    }
}

/// Coerce a field to the bound's domain and compare, `None` on coercion
/// failure (tallied)
fn coerce_to_bound(
    field: &str,
    bound: &Bound,
    options: &FilterOptions,
    stats: &mut FilterStats,
) -> Option<Ordering> {
    match bound {
        Bound::Number(bound) => match parse_number(field, options.number_locale) {
            Some(value) => Some(value.as_f64().total_cmp(bound)),
            None => {
                stats.record_coercion_failure();
                None
            }
        },
        Bound::Date(bound) => {
            let value = if field.is_empty() {
                far_future()
            } else {
                match parse_date(field, &options.date_format) {
                    Some(value) => value,
                    None => {
                        stats.record_coercion_failure();
                        return None;
                    }
                }
            };
            Some(value.cmp(bound))
        }
    }
}

fn compare_holds(op: CompareOp, ord: Ordering) -> bool {
    match op {
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Eq => ord == Ordering::Equal,
        CompareOp::Gt => ord == Ordering::Greater,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(selector: &str) -> CompiledFilter {
        CompiledFilter::new(Some(selector), FilterOptions::default()).unwrap()
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let filter = CompiledFilter::new(None, FilterOptions::default()).unwrap();
        assert!(filter.row_matches(0, "anything"));
        assert!(filter.is_identity_projection());

        let filter = CompiledFilter::new(Some(""), FilterOptions::default()).unwrap();
        assert!(filter.row_matches(42, "anything"));
    }

    #[test]
    fn test_positions_deduplicate_at_compile_time() {
        let filter = build("1,1,1-2");
        assert_eq!(filter.positions(), vec![1, 2]);
    }

    #[test]
    fn test_projection_follows_declaration_order() {
        let filter = build("3,1");
        let projected = filter.project(&["a", "b", "c", "d"], &mut FilterStats::default());
        assert_eq!(projected, vec!["d", "b"]);
    }

    #[test]
    fn test_membership_is_or_across_kinds() {
        let filter = build("1,/x/");
        assert!(filter.row_matches(1, "anything"));
        assert!(filter.row_matches(5, "has x in it"));
        assert!(!filter.row_matches(5, "no match"));
    }

    #[test]
    fn test_column_predicates_do_not_constrain_rows() {
        let filter = build("0:>5");
        assert!(!filter.has_row_constraint());
        assert!(filter.row_matches(9, "1;2;3"));
    }

    #[test]
    fn test_out_of_range_position_projects_empty() {
        let filter = build("0,9");
        let projected = filter.project(&["a", "b"], &mut FilterStats::default());
        assert_eq!(projected, vec!["a", ""]);
    }

    #[test]
    fn test_pivot_labels_on_match() {
        let filter = build("1:<10,1:10-50,1:>50");
        let projected = filter.project(&["Fink", "34"], &mut FilterStats::default());
        assert_eq!(projected, vec!["10-50"]);
    }

    #[test]
    fn test_pivot_indicators() {
        let options = FilterOptions {
            pivot_values: PivotValues::Indicator,
            ..FilterOptions::default()
        };
        let filter = CompiledFilter::new(Some("1:<10,1:10-50,1:>50"), options).unwrap();
        let projected = filter.project(&["Fink", "34"], &mut FilterStats::default());
        assert_eq!(projected, vec!["0", "1", "0"]);
    }

    #[test]
    fn test_column_regex_pivot_emits_the_field_value() {
        let filter = build("0,4:/con\\d+/");
        let projected = filter.project(
            &["Fink", "x", "x", "x", "con123"],
            &mut FilterStats::default(),
        );
        assert_eq!(projected, vec!["Fink", "con123"]);
        let projected = filter.project(
            &["Fink", "x", "x", "x", "dri111"],
            &mut FilterStats::default(),
        );
        assert_eq!(projected, vec!["Fink"]);
    }

    #[test]
    fn test_pivot_coercion_failure_counts_and_skips() {
        let filter = build("1:>50");
        let mut stats = FilterStats::default();
        let projected = filter.project(&["x", "garbage"], &mut stats);
        assert!(projected.is_empty());
        assert_eq!(stats.coercion_failures, 1);
    }

    #[test]
    fn test_typed_projection_for_sorting() {
        let filter = build("n:1");
        let mut keys: Vec<Vec<TypedValue>> = ["10", "2", "30"]
            .iter()
            .map(|v| filter.project_typed(&["x", v], &mut FilterStats::default()))
            .collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                vec![TypedValue::Int(2)],
                vec![TypedValue::Int(10)],
                vec![TypedValue::Int(30)],
            ]
        );
    }

    #[test]
    fn test_trailing_separator_keeps_the_final_empty_field() {
        let fields = split_fields("a;b;");
        assert_eq!(fields, vec!["a", "b", ""]);
        let filter = build("2");
        let projected = filter.project(&fields, &mut FilterStats::default());
        assert_eq!(projected, vec![""]);
    }

    #[test]
    fn test_second_boolean_block_is_rejected() {
        let result = CompiledFilter::new(
            Some("BEGINn1>5END,BEGINn2>5END"),
            FilterOptions::default(),
        );
        assert!(matches!(result, Err(SelectorError::MultipleBooleanBlocks)));
    }
}
