//! Condition expression evaluator

use std::cmp::Ordering;

use super::ast::{CompareOp, Expression, Literal};
use crate::engine::Context;
use serde_json::Value;

static NULL: Value = Value::Null;

/// Evaluate a condition expression against the context; missing paths read as null
pub fn evaluate(expr: &Expression, ctx: &Context) -> bool {
    match expr {
        Expression::True => true,
        Expression::False => false,
        Expression::Compare { path, op, right } => compare(lookup(ctx, path), *op, right),
        Expression::Truthy(path) => is_truthy(lookup(ctx, path)),
        Expression::And(left, right) => evaluate(left, ctx) && evaluate(right, ctx),
        Expression::Or(left, right) => evaluate(left, ctx) || evaluate(right, ctx),
        Expression::Not(inner) => !evaluate(inner, ctx),
    }
}

fn lookup<'a>(ctx: &'a Context, path: &str) -> &'a Value {
    ctx.get_path(path).unwrap_or(&NULL)
}

fn compare(value: &Value, op: CompareOp, literal: &Literal) -> bool {
    match op {
        CompareOp::Eq => equals(value, literal),
        CompareOp::NotEq => !equals(value, literal),
        CompareOp::Gt => numeric_order(value, literal).is_some_and(Ordering::is_gt),
        CompareOp::Gte => numeric_order(value, literal).is_some_and(Ordering::is_ge),
        CompareOp::Lt => numeric_order(value, literal).is_some_and(Ordering::is_lt),
        CompareOp::Lte => numeric_order(value, literal).is_some_and(Ordering::is_le),
        CompareOp::Contains => contains(value, literal),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Same JSON type and value; numbers compare as f64
fn equals(value: &Value, literal: &Literal) -> bool {
    match literal {
        Literal::Null => value.is_null(),
        Literal::Boolean(b) => value.as_bool() == Some(*b),
        Literal::String(s) => value.as_str() == Some(s.as_str()),
        Literal::Number(n) => value.as_f64() == Some(*n),
    }
}

/// `None` unless both sides are numbers
fn numeric_order(value: &Value, literal: &Literal) -> Option<Ordering> {
    match literal {
        Literal::Number(n) => value.as_f64()?.partial_cmp(n),
        _ => None,
    }
}

fn contains(value: &Value, literal: &Literal) -> bool {
    match (value, literal) {
        (Value::String(s), Literal::String(needle)) => s.contains(needle.as_str()),
        (Value::Array(items), _) => items.iter().any(|item| equals(item, literal)),
        (Value::Object(map), Literal::String(key)) => map.contains_key(key),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::condition::parser::parse;
    use serde_json::json;

    fn ctx_with(pairs: Vec<(&str, Value)>) -> Context {
        let mut ctx = Context::new();
        for (k, v) in pairs {
            ctx.set(k, v);
        }
        ctx
    }

    fn check(source: &str, ctx: &Context) -> bool {
        evaluate(&parse(source).unwrap(), ctx)
    }

    #[test]
    fn test_string_equality() {
        let ctx = ctx_with(vec![("intent", json!("search"))]);
        assert!(check("intent == 'search'", &ctx));
        assert!(!check("intent == 'code'", &ctx));
        assert!(check("intent != 'code'", &ctx));
    }

    #[test]
    fn test_number_comparison() {
        let ctx = ctx_with(vec![("score", json!(75))]);
        assert!(check("score >= 60", &ctx));
        assert!(check("score > 74.5", &ctx));
        assert!(!check("score < 60", &ctx));
        assert!(check("score <= 75", &ctx));
        assert!(check("score == 75", &ctx));
    }

    #[test]
    fn test_type_mismatch_is_false() {
        let ctx = ctx_with(vec![("score", json!("75"))]);
        assert!(!check("score > 10", &ctx));
        assert!(!check("score == 75", &ctx));
    }

    #[test]
    fn test_missing_field_is_null() {
        let ctx = Context::new();
        assert!(check("missing == null", &ctx));
        assert!(!check("missing == 'value'", &ctx));
        assert!(!check("missing", &ctx));
    }

    #[test]
    fn test_contains() {
        let ctx = ctx_with(vec![
            ("message", json!("hello world")),
            ("tags", json!(["bug", 3, true])),
            ("meta", json!({"owner": "ana"})),
        ]);
        assert!(check("message contains 'world'", &ctx));
        assert!(!check("message contains 'foo'", &ctx));
        assert!(check("tags contains 'bug'", &ctx));
        assert!(check("tags contains 3", &ctx));
        assert!(check("tags contains true", &ctx));
        assert!(!check("tags contains 'frontend'", &ctx));
        assert!(check("meta contains 'owner'", &ctx));
    }

    #[test]
    fn test_logic() {
        let ctx = ctx_with(vec![
            ("intent", json!("code")),
            ("confidence", json!(0.9)),
            ("banned", json!(false)),
        ]);
        assert!(check("intent == 'code' and confidence > 0.8", &ctx));
        assert!(!check("intent == 'search' and confidence > 0.8", &ctx));
        assert!(check("intent == 'search' or confidence > 0.8", &ctx));
        assert!(check("not banned", &ctx));
        assert!(check("(intent == 'search' or intent == 'code') and not banned", &ctx));
    }

    #[test]
    fn test_nested_path() {
        let ctx = ctx_with(vec![("result", json!({"data": {"intent": "search"}}))]);
        assert!(check("result.data.intent == 'search'", &ctx));
        assert!(!check("result.data.intent == 'code'", &ctx));
    }

    #[test]
    fn test_truthiness() {
        let ctx = ctx_with(vec![
            ("empty", json!("")),
            ("zero", json!(0)),
            ("list", json!([1])),
            ("flag", json!(true)),
        ]);
        assert!(!check("empty", &ctx));
        assert!(!check("zero", &ctx));
        assert!(check("list", &ctx));
        assert!(check("flag", &ctx));
    }

    #[test]
    fn test_null_and_mixed_type_comparisons() {
        let ctx = ctx_with(vec![
            ("none", Value::Null),
            ("items", json!([null, 2.5])),
            ("zero", json!(0)),
        ]);
        assert!(check("none == null", &ctx));
        assert!(!check("none != null", &ctx));
        assert!(check("items contains null", &ctx));
        assert!(check("items contains 2.5", &ctx));
        assert!(!check("none > 0", &ctx));
        assert!(!check("zero == false", &ctx));
        assert!(check("zero >= 0 and zero <= 0", &ctx));
    }
}
