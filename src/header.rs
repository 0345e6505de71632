//! Header construction with schema-on-read columns
//!
//! A header template mixes literal column names with expressions evaluated
//! against the data rows: `c<n>` freezes a name from the first row, `*`
//! splats the whole first row, and concatenations (`c2+'-'+c3`) or pattern
//! extractions (`c0=~/\.(\d{4})/`) grow one column per distinct value as
//! rows stream past, keeping first-seen order.
//!
//! The accumulated state is owned by the caller and passed into every
//! [`HeaderTemplate::process`] call, so the template itself stays immutable
//! and shareable.

use crate::selector::{SelectorError, split_fields, tokenize};
use regex::Regex;
use std::sync::LazyLock;

static COLUMN_REF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^c(\d+)$").expect("valid regex"));
static EXTRACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^c(\d+)=~/(.*)/$").expect("valid regex"));

#[derive(Debug, Clone)]
enum ConcatPart {
    Col(usize),
    Lit(String),
}

#[derive(Debug, Clone)]
enum HeaderCol {
    Literal(String),
    /// `*`: every field of the first data row
    Splat,
    /// `c<n>`: field n of the first data row, frozen
    ColumnRef(usize),
    /// One column per distinct concatenated value, first-seen order
    Concat { parts: Vec<ConcatPart>, slot: usize },
    /// One column per distinct extracted value, first-seen order
    Extract { col: usize, pattern: Regex, slot: usize },
}

/// Caller-owned accumulation for one output file's header
#[derive(Debug, Clone, Default)]
pub struct HeaderState {
    first_row: Option<Vec<String>>,
    dynamic: Vec<Vec<String>>,
}

/// A parsed header template; immutable, reusable across files when each
/// gets its own [`HeaderState`]
#[derive(Debug, Clone)]
pub struct HeaderTemplate {
    cols: Vec<HeaderCol>,
    dynamic_slots: usize,
}

impl HeaderTemplate {
    /// Parse a comma-separated template; `None` or empty renders as an
    /// empty header line
    pub fn parse(template: Option<&str>) -> Result<Self, SelectorError> {
        let mut cols = Vec::new();
        let mut dynamic_slots = 0;
        if let Some(template) = template {
            for part in tokenize(template)? {
                cols.push(parse_column(part, &mut dynamic_slots)?);
            }
        }
        Ok(HeaderTemplate {
            cols,
            dynamic_slots,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.cols.is_empty()
    }

    /// Fold one data row into the header and return the header line as of
    /// the rows seen so far. Newly discovered dynamic values append within
    /// their template slot; earlier discoveries keep their positions.
    pub fn process(&self, state: &mut HeaderState, line: &str) -> String {
        if self.is_empty() {
            return String::new();
        }
        let fields: Vec<&str> = split_fields(line);
        if state.first_row.is_none() {
            state.first_row = Some(fields.iter().map(|f| (*f).to_string()).collect());
        }
        state.dynamic.resize(self.dynamic_slots, Vec::new());

        for col in &self.cols {
            match col {
                HeaderCol::Concat { parts, slot } => {
                    let value = concat_value(parts, &fields);
                    if !value.is_empty() && !state.dynamic[*slot].contains(&value) {
                        state.dynamic[*slot].push(value);
                    }
                }
                HeaderCol::Extract { col, pattern, slot } => {
                    if let Some(value) = extract_value(*col, pattern, &fields) {
                        if !value.is_empty() && !state.dynamic[*slot].contains(&value) {
                            state.dynamic[*slot].push(value);
                        }
                    }
                }
                _ => {}
            }
        }
        self.render(state)
    }

    /// The header line for everything accumulated so far
    pub fn render(&self, state: &HeaderState) -> String {
        let empty_row = Vec::new();
        let first_row = state.first_row.as_ref().unwrap_or(&empty_row);
        let mut out: Vec<String> = Vec::new();
        for col in &self.cols {
            match col {
                HeaderCol::Literal(name) => out.push(name.clone()),
                HeaderCol::Splat => out.extend(first_row.iter().cloned()),
                HeaderCol::ColumnRef(i) => {
                    out.push(first_row.get(*i).cloned().unwrap_or_default())
                }
                HeaderCol::Concat { slot, .. } | HeaderCol::Extract { slot, .. } => {
                    if let Some(values) = state.dynamic.get(*slot) {
                        out.extend(values.iter().cloned());
                    }
                }
            }
        }
        out.join(";")
    }
}

fn parse_column(text: &str, dynamic_slots: &mut usize) -> Result<HeaderCol, SelectorError> {
    if text == "*" {
        return Ok(HeaderCol::Splat);
    }
    if let Some(caps) = COLUMN_REF_RE.captures(text) {
        let index = caps[1]
            .parse()
            .map_err(|_| SelectorError::UnknownClause(text.to_string()))?;
        return Ok(HeaderCol::ColumnRef(index));
    }
    if let Some(caps) = EXTRACT_RE.captures(text) {
        let col = caps[1]
            .parse()
            .map_err(|_| SelectorError::UnknownClause(text.to_string()))?;
        let pattern = Regex::new(&caps[2]).map_err(|source| SelectorError::BadRegex {
            pattern: caps[2].to_string(),
            source,
        })?;
        let slot = *dynamic_slots;
        *dynamic_slots += 1;
        return Ok(HeaderCol::Extract { col, pattern, slot });
    }
    if let Some(parts) = parse_concat(text) {
        let slot = *dynamic_slots;
        *dynamic_slots += 1;
        return Ok(HeaderCol::Concat { parts, slot });
    }
    Ok(HeaderCol::Literal(text.to_string()))
}

/// `c2+c3` or `c2+'-'+c3`: splits on `+` outside quotes and accepts the
/// result only when at least one part is a column reference
fn parse_concat(text: &str) -> Option<Vec<ConcatPart>> {
    if !text.contains('+') {
        return None;
    }
    let mut parts = Vec::new();
    let mut saw_column = false;
    for piece in split_outside_quotes(text, '+') {
        let piece = piece.trim();
        if let Some(caps) = COLUMN_REF_RE.captures(piece) {
            let index = caps[1].parse().ok()?;
            parts.push(ConcatPart::Col(index));
            saw_column = true;
        } else if piece.len() >= 2
            && (piece.starts_with('\'') && piece.ends_with('\'')
                || piece.starts_with('"') && piece.ends_with('"'))
        {
            parts.push(ConcatPart::Lit(piece[1..piece.len() - 1].to_string()));
        } else {
            parts.push(ConcatPart::Lit(piece.to_string()));
        }
    }
    saw_column.then_some(parts)
}

fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == separator => {
                parts.push(&text[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

fn concat_value(parts: &[ConcatPart], fields: &[&str]) -> String {
    let mut value = String::new();
    for part in parts {
        match part {
            ConcatPart::Col(i) => value.push_str(fields.get(*i).copied().unwrap_or("")),
            ConcatPart::Lit(text) => value.push_str(text),
        }
    }
    value
}

fn extract_value(col: usize, pattern: &Regex, fields: &[&str]) -> Option<String> {
    let field = fields.get(col).copied().unwrap_or("");
    let caps = pattern.captures(field)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?;
    Some(matched.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process_all(template: &str, lines: &[&str]) -> Vec<String> {
        let parsed = HeaderTemplate::parse(Some(template)).unwrap();
        let mut state = HeaderState::default();
        lines
            .iter()
            .map(|line| parsed.process(&mut state, line))
            .collect()
    }

    #[test]
    fn test_splat_expands_the_first_row() {
        assert_eq!(process_all("*,A,B", &["a;b;c"]), vec!["a;b;c;A;B"]);
    }

    #[test]
    fn test_column_refs_freeze_on_the_first_row() {
        assert_eq!(
            process_all("A,c6,c1", &["a0;a1;a2;a3;a4;a5;a6", "x0;x1;x2;x3;x4;x5;x6"]),
            vec!["A;a6;a1", "A;a6;a1"]
        );
    }

    #[test]
    fn test_concat_grows_one_column_per_distinct_value() {
        assert_eq!(
            process_all("A,c1,c2+c3", &["a0;a1;a2;a3;a4;a5", "b0;b1;b2;b3;b4;b5"]),
            vec!["A;a1;a2a3", "A;a1;a2a3;b2b3"]
        );
    }

    #[test]
    fn test_concat_with_literal_separator() {
        assert_eq!(
            process_all("A,c1,c2+'-'+c3", &["a0;a1;a2;a3;a4;a5", "b0;b1;b2;b3;b4;b5"]),
            vec!["A;a1;a2-a3", "A;a1;a2-a3;b2-b3"]
        );
    }

    #[test]
    fn test_extract_inserts_at_template_position_first_seen_order() {
        let outputs = process_all(
            "c4,A,c0=~/\\.(\\d{4})/,c1,B",
            &[
                "a0;a1;a2;a3;a4;a5",
                "1.1.2012;b1;b2;b3;b4;b5",
                "3.4.2013;c1;c2;c3;c4;c5",
            ],
        );
        assert_eq!(outputs, vec!["a4;A;a1;B", "a4;A;2012;a1;B", "a4;A;2012;2013;a1;B"]);
    }

    #[test]
    fn test_repeated_values_are_not_duplicated() {
        let outputs = process_all(
            "c0=~/(\\d{4})/",
            &["2012;x", "2012;y", "2013;z"],
        );
        assert_eq!(outputs, vec!["2012", "2012", "2012;2013"]);
    }

    #[test]
    fn test_empty_template_renders_empty() {
        let template = HeaderTemplate::parse(None).unwrap();
        let mut state = HeaderState::default();
        assert_eq!(template.process(&mut state, "a;b"), "");
        assert!(template.is_empty());
    }

    #[test]
    fn test_literal_with_plus_but_no_column_ref_stays_literal() {
        assert_eq!(process_all("A+B", &["a;b"]), vec!["A+B"]);
    }
}
