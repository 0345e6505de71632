use thiserror::Error;

/// Errors raised while compiling a selector string
///
/// All variants are construction-time failures: once a filter is built it
/// never errors during evaluation (dirty data degrades to non-matches, see
/// the coercion notes in the module docs).
#[derive(Debug, Error)]
pub enum SelectorError {
    #[error(
        "unrecognized clause '{0}'. Valid shapes: index (3), range (3-5), typed index (n:3), typed range (n:3-5), regex (/re/), column regex (3:/re/), comparison (3:>5, 3:<2014-01-01), comparison range (3:5-10), boolean block (BEGIN...END)"
    )]
    UnknownClause(String),

    #[error("empty clause in selector (stray comma?)")]
    EmptyClause,

    #[error("unterminated regex literal in '{0}'")]
    UnterminatedRegex(String),

    #[error("BEGIN without matching END in '{0}'")]
    UnterminatedBlock(String),

    #[error("selector has more than one BEGIN...END block")]
    MultipleBooleanBlocks,

    #[error("invalid regex '{pattern}': {source}")]
    BadRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid date literal '{literal}' for format '{format}'")]
    BadDateLiteral { literal: String, format: String },

    #[error("invalid boolean expression '{expr}': {reason}")]
    BadExpression { expr: String, reason: String },
}
