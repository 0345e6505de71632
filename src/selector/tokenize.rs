//! Clause splitting for selector strings
//!
//! A selector is a comma-separated list of clauses. Two clause forms may
//! legitimately contain commas of their own: `/.../` regex literals and
//! `BEGIN...END` boolean blocks, so splitting walks the string instead of
//! calling `split(',')`.

use super::error::SelectorError;

/// Split a selector into clauses, yielding them lazily in original order
///
/// The iterator is cheap to clone, which restarts it. An empty selector
/// yields nothing; unbalanced delimiters and stray inner commas surface as
/// errors on the offending clause.
pub fn clauses(selector: &str) -> ClauseIter<'_> {
    ClauseIter {
        rest: selector,
        failed: false,
    }
}

/// Split a selector into clauses eagerly
pub fn tokenize(selector: &str) -> Result<Vec<&str>, SelectorError> {
    clauses(selector).collect()
}

#[derive(Debug, Clone)]
pub struct ClauseIter<'a> {
    rest: &'a str,
    failed: bool,
}

impl<'a> Iterator for ClauseIter<'a> {
    type Item = Result<&'a str, SelectorError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.rest.is_empty() {
            return None;
        }

        let (clause, rest) = match split_first_clause(self.rest) {
            Ok(split) => split,
            Err(err) => {
                self.failed = true;
                return Some(Err(err));
            }
        };
        self.rest = rest;

        let clause = clause.trim();
        if clause.is_empty() {
            // A trailing comma is tolerated, an inner empty clause is not.
            if self.rest.is_empty() {
                return None;
            }
            self.failed = true;
            return Some(Err(SelectorError::EmptyClause));
        }
        Some(Ok(clause))
    }
}

/// Cut the first clause off the selector, honoring block and regex spans
fn split_first_clause(input: &str) -> Result<(&str, &str), SelectorError> {
    let trimmed_start = input.trim_start();
    if trimmed_start.starts_with("BEGIN") {
        return split_block_clause(input);
    }

    let mut in_regex = false;
    for (i, c) in input.char_indices() {
        match c {
            '/' => in_regex = !in_regex,
            ',' if !in_regex => return Ok((&input[..i], &input[i + 1..])),
            _ => {}
        }
    }
    if in_regex {
        return Err(SelectorError::UnterminatedRegex(input.to_string()));
    }
    Ok((input, ""))
}

/// A `BEGIN...END` clause ends at the first `END` that is followed by a
/// comma or the end of the selector
fn split_block_clause(input: &str) -> Result<(&str, &str), SelectorError> {
    let mut search_from = 0;
    while let Some(found) = input[search_from..].find("END") {
        let end = search_from + found + "END".len();
        match input[end..].chars().next() {
            None => return Ok((input, "")),
            Some(',') => return Ok((&input[..end], &input[end + 1..])),
            _ => search_from = end,
        }
    }
    Err(SelectorError::UnterminatedBlock(input.to_string()))
}
