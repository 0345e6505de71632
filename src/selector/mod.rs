//! Selector compilation and evaluation
//!
//! A selector is a comma-separated list of clauses that picks rows or
//! columns of a semicolon-delimited file. It is compiled once into a
//! [`CompiledFilter`] and then applied to every line of a streaming pass.
//!
//! # Syntax
//!
//! ```text
//! 3                    Row/column at position 3
//! 3-5                  Positions 3 through 5, inclusive
//! n:3  d:4  s:5        Position with a declared value type
//! n:3-5                Typed position range
//! /\d{2,}/             Rows whose full text matches the pattern
//! 3:/Ruby/             Column 3 matches the pattern (pivot column)
//! 3:>50  3:=50  3:<50  Numeric comparison on column 3 (pivot column)
//! 3:10-50              Numeric between, inclusive (pivot column)
//! 3:<2014-06-16        Date comparison, using the configured date format
//! 3:1.1.2013-31.12.2014  Date between (with date format %d.%m.%Y)
//! BEGIN...END          Boolean expression over typed columns
//! ```
//!
//! Clauses combine per kind: positions, full-row patterns, and the boolean
//! expression OR together for row membership; `1,/foo/` reads "row 1, or
//! any row matching /foo/". An empty selector matches every row and
//! projects rows unchanged.
//!
//! # Examples
//!
//! ```text
//! 1-5                                  rows 1 through 5
//! 1,3-4,/closed/                       rows 1, 3, 4, and rows containing "closed"
//! BEGINn1>50&&s2=='Ruby'||n3<10END     boolean row filter
//! 0,2,4                                columns 0, 2, 4 in that order
//! 0,1:<10,1:10-50,1:>50                column 0 plus three pivot columns
//! ```

pub mod clause;
pub mod compiled;
pub mod error;
pub mod expr;
pub mod tokenize;
pub mod value;

pub use clause::{Bound, CompareOp, Predicate};
pub use compiled::{CompiledFilter, FIELD_SEPARATOR, split_fields};
pub use error::SelectorError;
pub use expr::BoolExpr;
pub use tokenize::{clauses, tokenize};
pub use value::{
    FilterOptions, FilterStats, Number, NumberLocale, PivotValues, TypedValue, ValueType,
};
