//! Boolean row expressions: the `BEGIN...END` clause body
//!
//! Terms have the shape `{s|n|d}{column}{op}{literal}` and combine with
//! `&&` (binds tighter) and `||`, with explicit parentheses. The expression
//! is parsed once at filter construction into a small AST and evaluated
//! per row; no general-purpose evaluator ever sees user input.
//!
//! ```text
//! n1>50&&s2=='Ruby'||n3<10      (n1>50 AND s2=='Ruby') OR n3<10
//! n1==50&&(d2<2014-06-16||s3=='Works?')
//! ```

use super::error::SelectorError;
use super::value::{
    FilterOptions, FilterStats, ValueType, clean_field, far_future, parse_date, parse_number,
};
use chrono::NaiveDate;
use regex::Regex;
use std::cmp::Ordering;
use std::sync::LazyLock;

static DATE_SHAPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+\D\d+\D\d+$").expect("valid date shape regex"));

/// Comparison operator of one expression term
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TermOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
}

#[derive(Debug, Clone)]
enum TermLiteral {
    Str(String),
    Num(f64),
    Date(NaiveDate),
    Pattern(Regex),
}

/// One `{type}{column}{op}{literal}` comparison
#[derive(Debug, Clone)]
struct BoolTerm {
    ty: ValueType,
    col: usize,
    op: TermOp,
    literal: TermLiteral,
    /// Raw literal text, the fallback comparison domain when the type tag
    /// and the literal kind disagree
    literal_text: String,
}

#[derive(Debug, Clone)]
enum Node {
    Or(Box<Node>, Box<Node>),
    And(Box<Node>, Box<Node>),
    Term(BoolTerm),
}

/// A compiled boolean expression, reusable across rows
#[derive(Debug, Clone)]
pub struct BoolExpr {
    root: Node,
}

impl BoolExpr {
    /// Parse the text between `BEGIN` and `END`
    ///
    /// Date and number literals are resolved against `options` here, so a
    /// malformed literal is a construction error, not a per-row surprise.
    pub fn parse(src: &str, options: &FilterOptions) -> Result<Self, SelectorError> {
        let tokens = lex(src, options)?;
        let mut parser = Parser {
            src,
            tokens,
            pos: 0,
        };
        let root = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(parser.error("trailing tokens after expression"));
        }
        Ok(BoolExpr { root })
    }

    /// Evaluate against one row's fields
    pub fn evaluate(&self, fields: &[&str], options: &FilterOptions, stats: &mut FilterStats) -> bool {
        eval_node(&self.root, fields, options, stats)
    }
}

fn eval_node(node: &Node, fields: &[&str], options: &FilterOptions, stats: &mut FilterStats) -> bool {
    match node {
        Node::Or(lhs, rhs) => {
            eval_node(lhs, fields, options, stats) || eval_node(rhs, fields, options, stats)
        }
        Node::And(lhs, rhs) => {
            eval_node(lhs, fields, options, stats) && eval_node(rhs, fields, options, stats)
        }
        Node::Term(term) => eval_term(term, fields, options, stats),
    }
}

fn eval_term(term: &BoolTerm, fields: &[&str], options: &FilterOptions, stats: &mut FilterStats) -> bool {
    let raw = fields.get(term.col).copied().unwrap_or("");
    let field = clean_field(raw);

    match &term.literal {
        TermLiteral::Pattern(re) => re.is_match(field),
        TermLiteral::Num(bound) if term.ty == ValueType::Number => {
            match parse_number(field, options.number_locale) {
                Some(value) => op_holds(term.op, value.as_f64().total_cmp(bound)),
                None => {
                    stats.record_coercion_failure();
                    false
                }
            }
        }
        TermLiteral::Date(bound) if term.ty == ValueType::Date => {
            let value = if field.is_empty() {
                far_future()
            } else {
                match parse_date(field, &options.date_format) {
                    Some(value) => value,
                    None => {
                        stats.record_coercion_failure();
                        return false;
                    }
                }
            };
            op_holds(term.op, value.cmp(bound))
        }
        // Type tag and literal kind disagree, or the tag is `s`: compare as
        // strings against the literal's source text.
        _ => op_holds(term.op, field.cmp(literal_fallback_text(term))),
    }
}

fn literal_fallback_text(term: &BoolTerm) -> &str {
    match &term.literal {
        TermLiteral::Str(s) => s,
        _ => &term.literal_text,
    }
}

fn op_holds(op: TermOp, ord: Ordering) -> bool {
    match op {
        TermOp::Eq => ord == Ordering::Equal,
        TermOp::Ne => ord != Ordering::Equal,
        TermOp::Lt => ord == Ordering::Less,
        TermOp::Le => ord != Ordering::Greater,
        TermOp::Gt => ord == Ordering::Greater,
        TermOp::Ge => ord != Ordering::Less,
        // Match terms always carry a Pattern literal and never reach here.
        TermOp::Match => false,
    }
}

#[derive(Debug, Clone)]
enum Token {
    And,
    Or,
    LParen,
    RParen,
    Term(BoolTerm),
}

struct Parser<'a> {
    src: &'a str,
    tokens: Vec<Token>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn parse_or(&mut self) -> Result<Node, SelectorError> {
        let mut node = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.pos += 1;
            let rhs = self.parse_and()?;
            node = Node::Or(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_and(&mut self) -> Result<Node, SelectorError> {
        let mut node = self.parse_primary()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.pos += 1;
            let rhs = self.parse_primary()?;
            node = Node::And(Box::new(node), Box::new(rhs));
        }
        Ok(node)
    }

    fn parse_primary(&mut self) -> Result<Node, SelectorError> {
        match self.peek().cloned() {
            Some(Token::LParen) => {
                self.pos += 1;
                let node = self.parse_or()?;
                match self.peek() {
                    Some(Token::RParen) => {
                        self.pos += 1;
                        Ok(node)
                    }
                    _ => Err(self.error("missing closing parenthesis")),
                }
            }
            Some(Token::Term(term)) => {
                self.pos += 1;
                Ok(Node::Term(term))
            }
            _ => Err(self.error("expected a comparison term")),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn error(&self, reason: &str) -> SelectorError {
        SelectorError::BadExpression {
            expr: self.src.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn lex(src: &str, options: &FilterOptions) -> Result<Vec<Token>, SelectorError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    let err = |reason: String| SelectorError::BadExpression {
        expr: src.to_string(),
        reason,
    };

    while pos < bytes.len() {
        match bytes[pos] {
            b' ' | b'\t' => pos += 1,
            b'&' => {
                if bytes.get(pos + 1) != Some(&b'&') {
                    return Err(err("single '&', expected '&&'".to_string()));
                }
                tokens.push(Token::And);
                pos += 2;
            }
            b'|' => {
                if bytes.get(pos + 1) != Some(&b'|') {
                    return Err(err("single '|', expected '||'".to_string()));
                }
                tokens.push(Token::Or);
                pos += 2;
            }
            b'(' => {
                tokens.push(Token::LParen);
                pos += 1;
            }
            b')' => {
                tokens.push(Token::RParen);
                pos += 1;
            }
            b's' | b'n' | b'd' if bytes.get(pos + 1).is_some_and(u8::is_ascii_digit) => {
                let (term, next) = lex_term(src, pos, options)?;
                tokens.push(Token::Term(term));
                pos = next;
            }
            other => {
                return Err(err(format!("unexpected character '{}'", other as char)));
            }
        }
    }
    Ok(tokens)
}

fn lex_term(
    src: &str,
    start: usize,
    options: &FilterOptions,
) -> Result<(BoolTerm, usize), SelectorError> {
    let bytes = src.as_bytes();
    let err = |reason: String| SelectorError::BadExpression {
        expr: src.to_string(),
        reason,
    };

    let ty = ValueType::from_tag(&src[start..start + 1]).expect("caller checked the tag");
    let mut pos = start + 1;
    let col_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let col: usize = src[col_start..pos]
        .parse()
        .map_err(|_| err(format!("column index out of range in '{}'", &src[start..pos])))?;

    let op = if let Some(two) = src.get(pos..pos + 2).filter(|two| {
        matches!(*two, "==" | "!=" | "<=" | ">=" | "=~")
    }) {
        pos += 2;
        match two {
            "==" => TermOp::Eq,
            "!=" => TermOp::Ne,
            "<=" => TermOp::Le,
            ">=" => TermOp::Ge,
            _ => TermOp::Match,
        }
    } else {
        match bytes.get(pos) {
            Some(b'<') => {
                pos += 1;
                TermOp::Lt
            }
            Some(b'>') => {
                pos += 1;
                TermOp::Gt
            }
            _ => return Err(err(format!("missing operator after '{}'", &src[start..pos]))),
        }
    };

    let (literal_text, next) = lex_literal(src, pos).map_err(|reason| err(reason))?;
    let literal = classify_literal(&literal_text, op, options).map_err(|reason| err(reason))?;
    Ok((
        BoolTerm {
            ty,
            col,
            op,
            literal,
            literal_text,
        },
        next,
    ))
}

/// Cut the literal text after an operator: quoted string, `/regex/`, or a
/// bare token running to the next operator boundary
fn lex_literal(src: &str, start: usize) -> Result<(String, usize), String> {
    let bytes = src.as_bytes();
    match bytes.get(start) {
        None => Err("missing literal after operator".to_string()),
        Some(&quote @ (b'\'' | b'"')) => {
            let mut pos = start + 1;
            while pos < bytes.len() && bytes[pos] != quote {
                pos += 1;
            }
            if pos >= bytes.len() {
                return Err("unterminated quoted literal".to_string());
            }
            Ok((src[start + 1..pos].to_string(), pos + 1))
        }
        Some(b'/') => {
            let mut pos = start + 1;
            while pos < bytes.len() && bytes[pos] != b'/' {
                if bytes[pos] == b'\\' {
                    pos += 1;
                }
                pos += 1;
            }
            if pos >= bytes.len() {
                return Err("unterminated regex literal".to_string());
            }
            Ok((src[start..pos + 1].to_string(), pos + 1))
        }
        Some(_) => {
            let rest = &src[start..];
            let end = rest
                .find(|c: char| c.is_whitespace() || matches!(c, '&' | '|' | '(' | ')'))
                .unwrap_or(rest.len());
            if end == 0 {
                return Err("missing literal after operator".to_string());
            }
            Ok((rest[..end].to_string(), start + end))
        }
    }
}

fn classify_literal(
    text: &str,
    op: TermOp,
    options: &FilterOptions,
) -> Result<TermLiteral, String> {
    if op == TermOp::Match {
        let pattern = text
            .strip_prefix('/')
            .and_then(|p| p.strip_suffix('/'))
            .unwrap_or(text);
        return Regex::new(pattern)
            .map(TermLiteral::Pattern)
            .map_err(|e| format!("invalid match pattern '{}': {}", text, e));
    }
    // Literal kind is inferred from the text; the type tag picks the
    // coercion domain at evaluation time.
    if DATE_SHAPE_RE.is_match(text) {
        if let Some(date) = parse_date(text, &options.date_format) {
            return Ok(TermLiteral::Date(date));
        }
    }
    if let Some(number) = parse_number(text, options.number_locale) {
        return Ok(TermLiteral::Num(number.as_f64()));
    }
    Ok(TermLiteral::Str(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str, row: &str) -> bool {
        let options = FilterOptions::default();
        let parsed = BoolExpr::parse(expr, &options).unwrap();
        let fields: Vec<&str> = row.split(';').collect();
        parsed.evaluate(&fields, &options, &mut FilterStats::default())
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let expr = "n1>50&&s2=='Ruby'||n3<10";
        assert!(eval(expr, "a;49;Rub;9"));
        assert!(eval(expr, "a;51;Ruby;11"));
        assert!(!eval(expr, "a;49;Ruby;11"));
    }

    #[test]
    fn test_parentheses_override_precedence() {
        let expr = "n1==50&&(d2<2014-06-16||s3=='Works?')";
        assert!(eval(expr, "x;50;2014-06-15;nope"));
        assert!(eval(expr, "x;50;2014-06-17;Works?"));
        assert!(!eval(expr, "x;49;2014-06-15;Works?"));
        assert!(!eval(expr, "x;50;2014-06-17;Worx?"));
    }

    #[test]
    fn test_regex_match_term() {
        assert!(eval("n2=~'/\\d+/'", "x;49;123;we"));
        assert!(eval("s2=~/[56789]\\d{2,}/", "x;50;99123;we"));
        assert!(!eval("s2=~/[56789]\\d{2,}/", "x;50;1;we"));
    }

    #[test]
    fn test_quoted_field_values_are_unwrapped() {
        assert!(eval("n2==\"Doesn't work\"", "x;49;\"Doesn't work\";we"));
        assert!(!eval("n2==\"Doesn't work\"", "x;50;2;we"));
    }

    #[test]
    fn test_not_equal() {
        assert!(eval("n1!=50", "x;49"));
        assert!(!eval("n1!=50", "x;50"));
    }

    #[test]
    fn test_unparseable_number_field_fails_the_term() {
        let options = FilterOptions::default();
        let parsed = BoolExpr::parse("n1>5", &options).unwrap();
        let mut stats = FilterStats::default();
        assert!(!parsed.evaluate(&["x", "garbage"], &options, &mut stats));
        assert_eq!(stats.coercion_failures, 1);
    }

    #[test]
    fn test_blank_date_field_is_far_future() {
        assert!(eval("d1>2030-01-01", "x;"));
        assert!(!eval("d1<2030-01-01", "x;"));
    }

    #[test]
    fn test_missing_column_reads_as_empty() {
        assert!(eval("s5==''", "a;b"));
    }

    #[test]
    fn test_invalid_syntax_is_rejected() {
        let options = FilterOptions::default();
        assert!(BoolExpr::parse("n2=~regex('\\d+')", &options).is_err());
        assert!(BoolExpr::parse("n1>", &options).is_err());
        assert!(BoolExpr::parse("n1>5&&(n2<3", &options).is_err());
        assert!(BoolExpr::parse("n1>5&n2<3", &options).is_err());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let options = FilterOptions::default();
        let parsed = BoolExpr::parse("d1<2020-01-01", &options).unwrap();
        let fields = ["x", "not-a-date"];
        let first = parsed.evaluate(&fields, &options, &mut FilterStats::default());
        let second = parsed.evaluate(&fields, &options, &mut FilterStats::default());
        assert_eq!(first, second);
    }
}
