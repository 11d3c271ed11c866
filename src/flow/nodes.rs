// SPDX-License-Identifier: MIT

//! Builtin node kinds
//!
//! Every kind is built from `(kind, id, config)`; config is validated when the
//! node is built so that a bad definition fails before any run.

use serde_json::{json, Map, Value};

use super::condition;
use super::error::FlowError;
use crate::engine::{Context, Node, NodeError};

/// Kinds understood by [`build`]
pub const KINDS: &[&str] = &[
    "start",
    "end",
    "set",
    "template",
    "prompt_template",
    "json_parse",
    "llm",
    "if",
    "passthrough",
    "upper",
];

/// Model name reported by `llm` nodes without a `model` config
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Build a node of the given kind
pub fn build(kind: &str, id: &str, config: &Value) -> Result<Node, FlowError> {
    let config = match config {
        Value::Null => Map::new(),
        Value::Object(map) => map.clone(),
        _ => return Err(FlowError::invalid_config(id, "config must be an object")),
    };

    let node = match kind {
        "start" => Node::from_fn(id, |ctx: &Context| Ok(ctx.to_json())),
        "end" => Node::from_fn(id, |ctx: &Context| Ok(json!({ "final_output": ctx.to_json() })))
            .with_outputs(["final_output"]),
        "set" => set_node(id, &config)?,
        "template" => template_node(id, &config, "text")?,
        "prompt_template" => template_node(id, &config, "prompt")?,
        "json_parse" => json_parse_node(id, &config)?,
        "llm" => llm_node(id, &config)?,
        "if" => if_node(id, &config)?,
        "passthrough" => {
            let kind = kind.to_string();
            Node::from_fn(id, move |ctx: &Context| {
                let mut data = ctx.data().clone();
                data.insert("_node_type".to_string(), Value::String(kind.clone()));
                Ok(Value::Object(data))
            })
        }
        "upper" => upper_node(id, &config)?,
        other => return Err(FlowError::UnknownKind(other.to_string())),
    };

    let node = match config.get("description").and_then(Value::as_str) {
        Some(description) => node.with_description(description),
        None => node,
    };
    Ok(node.with_kind(kind))
}

fn required_str<'a>(
    id: &str,
    config: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a str, FlowError> {
    config
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| {
            FlowError::invalid_config(id, format!("missing string field '{}'", key))
        })
}

fn optional_str<'a>(
    id: &str,
    config: &'a Map<String, Value>,
    key: &str,
    default: &'a str,
) -> Result<&'a str, FlowError> {
    match config.get(key) {
        None => Ok(default),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(FlowError::invalid_config(
            id,
            format!("field '{}' must be a string", key),
        )),
    }
}

fn set_node(id: &str, config: &Map<String, Value>) -> Result<Node, FlowError> {
    let values = match config.get("values") {
        Some(Value::Object(values)) => values.clone(),
        _ => return Err(FlowError::invalid_config(id, "missing object field 'values'")),
    };
    let keys: Vec<String> = values.keys().cloned().collect();
    let values = Value::Object(values);
    Ok(Node::from_fn(id, move |_ctx: &Context| Ok(values.clone())).with_outputs(keys))
}

fn if_node(id: &str, config: &Map<String, Value>) -> Result<Node, FlowError> {
    let source = required_str(id, config, "condition")?;
    let expr = condition::parse(source).map_err(|source| FlowError::Condition {
        node: id.to_string(),
        source,
    })?;
    log::debug!("Node '{}' condition {} reads {:?}", id, expr, expr.paths());
    Ok(Node::from_fn(id, move |ctx: &Context| {
        Ok(json!({ "condition_met": condition::evaluate(&expr, ctx) }))
    })
    .with_outputs(["condition_met"]))
}

fn upper_node(id: &str, config: &Map<String, Value>) -> Result<Node, FlowError> {
    let key = optional_str(id, config, "key", "msg")?.to_string();
    let into = optional_str(id, config, "into", "result")?.to_string();
    let outputs = [into.clone()];
    Ok(Node::from_fn(id, move |ctx: &Context| {
        let text = ctx
            .get_path(&key)
            .and_then(Value::as_str)
            .ok_or_else(|| -> NodeError { format!("'{}' is not a string", key).into() })?;
        let mut update = Map::new();
        update.insert(into.clone(), Value::String(text.to_uppercase()));
        Ok(Value::Object(update))
    })
    .with_outputs(outputs))
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Text(String),
    Key(String),
}

/// `template` writes `text`, `prompt_template` writes `prompt`
fn template_node(id: &str, config: &Map<String, Value>, into: &str) -> Result<Node, FlowError> {
    let source = required_str(id, config, "template")?;
    let segments = parse_template(source).map_err(|e| FlowError::invalid_config(id, e))?;
    let key = into.to_string();
    Ok(Node::from_fn(id, move |ctx: &Context| {
        let mut update = Map::new();
        update.insert(key.clone(), Value::String(render(&segments, ctx)?));
        Ok(Value::Object(update))
    })
    .with_outputs([into]))
}

fn json_parse_node(id: &str, config: &Map<String, Value>) -> Result<Node, FlowError> {
    let key = optional_str(id, config, "key", "text")?.to_string();
    Ok(Node::from_fn(id, move |ctx: &Context| {
        let text = match ctx.get_path(&key) {
            Some(Value::String(text)) => text.as_str(),
            Some(_) => return Err(format!("'{}' is not a string", key).into()),
            None => "",
        };
        let parsed: Value = serde_json::from_str(text)
            .map_err(|e| -> NodeError { format!("JSON parse error: {}", e).into() })?;
        Ok(json!({ "parsed": parsed }))
    })
    .with_outputs(["parsed"]))
}

/// Offline stand-in for a model call: renders the prompt and echoes it back
fn llm_node(id: &str, config: &Map<String, Value>) -> Result<Node, FlowError> {
    let source = required_str(id, config, "prompt_template")?;
    let segments = parse_template(source).map_err(|e| FlowError::invalid_config(id, e))?;
    let model = optional_str(id, config, "model", DEFAULT_MODEL)?.to_string();
    Ok(Node::from_fn(id, move |ctx: &Context| {
        let prompt = render(&segments, ctx)?;
        let head: String = prompt.chars().take(50).collect();
        Ok(json!({
            "prompt": prompt,
            "model": model,
            "response": format!("LLM response to: {}...", head),
        }))
    })
    .with_outputs(["prompt", "model", "response"]))
}

/// Split a template into literal text and `{key}` placeholders
fn parse_template(source: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                text.push('{');
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                text.push('}');
            }
            '{' => {
                let mut key = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(ch) => key.push(ch),
                        None => return Err(format!("unclosed placeholder '{{{}'", key)),
                    }
                }
                let key = key.trim();
                if key.is_empty() {
                    return Err("empty placeholder '{}'".to_string());
                }
                if !text.is_empty() {
                    segments.push(Segment::Text(std::mem::take(&mut text)));
                }
                segments.push(Segment::Key(key.to_string()));
            }
            '}' => return Err("unmatched '}'".to_string()),
            other => text.push(other),
        }
    }

    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }
    Ok(segments)
}

fn render(segments: &[Segment], ctx: &Context) -> Result<String, NodeError> {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Key(key) => match ctx.get_path(key) {
                Some(Value::String(s)) => out.push_str(s),
                Some(other) => out.push_str(&other.to_string()),
                None => return Err(format!("Missing key: '{}'", key).into()),
            },
        }
    }
    Ok(out)
}
