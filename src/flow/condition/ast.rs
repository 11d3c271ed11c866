// SPDX-License-Identifier: MIT

//! Condition syntax tree

use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `path op literal`
    Compare {
        path: String,
        op: CompareOp,
        right: Literal,
    },
    /// Bare path, true when the value is truthy
    Truthy(String),
    And(Box<Expression>, Box<Expression>),
    Or(Box<Expression>, Box<Expression>),
    Not(Box<Expression>),
    True,
    False,
}

impl Expression {
    /// Context paths the expression reads, in order of appearance
    pub fn paths(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_paths(&mut out);
        out
    }

    fn collect_paths<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Expression::Compare { path, .. } | Expression::Truthy(path) => {
                if !out.contains(&path.as_str()) {
                    out.push(path);
                }
            }
            Expression::And(l, r) | Expression::Or(l, r) => {
                l.collect_paths(out);
                r.collect_paths(out);
            }
            Expression::Not(inner) => inner.collect_paths(out),
            Expression::True | Expression::False => {}
        }
    }
}

/// Fully parenthesized rendering, parseable back into the same tree
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Compare { path, op, right } => write!(f, "{} {} {}", path, op, right),
            Expression::Truthy(path) => f.write_str(path),
            Expression::And(l, r) => write!(f, "({} and {})", l, r),
            Expression::Or(l, r) => write!(f, "({} or {})", l, r),
            Expression::Not(inner) => write!(f, "not {}", inner),
            Expression::True => f.write_str("true"),
            Expression::False => f.write_str("false"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    /// Substring, array element or object key
    Contains,
}

impl CompareOp {
    pub fn symbol(self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::NotEq => "!=",
            CompareOp::Gt => ">",
            CompareOp::Gte => ">=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Contains => "contains",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Right-hand side of a comparison
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(s) if s.contains('\'') => write!(f, "\"{}\"", s),
            Literal::String(s) => write!(f, "'{}'", s),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Null => f.write_str("null"),
        }
    }
}
