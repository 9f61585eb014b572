//! FQ: the compact JSON form of a query tree.
//!
//! A search clause is an object with a `term` key plus `field` and `relation`
//! only where they differ from the server-choice defaults. A boolean node is
//! an object with `op`, `s1` and `s2`. Modifiers become one key each. Source
//! positions travel in `@pos`, `@range` and `relation@pos` keys.
//!
//! Relations are written as words (`lt`, `ge`, ...) and read back as symbols.

use std::ops::Range;

use serde_json::{Map, Value};

use crate::{
    ast::{BooleanNode, BooleanOp, CqlNode, Modifier, SearchClause, ServerChoice},
    error::{CqlError, ErrorKind},
    relation,
};

/// Default indent unit for nested nodes.
pub(crate) const DEFAULT_INDENT: &str = "  ";

/// Default newline string.
pub(crate) const DEFAULT_NEWLINE: &str = "\n";

/// Keys a clause reads back; other keys become modifiers.
const CLAUSE_KEYS: [&str; 3] = ["term", "field", "relation"];

/// Modifier names never written on a clause. The boolean keys are included
/// so a clause never decodes as a boolean node.
const CLAUSE_RESERVED: [&str; 6] = ["term", "field", "relation", "op", "s1", "s2"];

/// Keys a boolean node owns; modifiers with these names are dropped.
const BOOLEAN_KEYS: [&str; 3] = ["op", "s1", "s2"];

/// Renders `node` as FQ text.
pub(crate) fn render(node: &CqlNode, indent: &str, newline: &str) -> String {
    let mut out = String::new();
    write_node(&mut out, node, 0, indent, newline);
    out
}

/// Writes a node; nested operands go one `indent` deeper than `level`.
///
/// The left spine is walked in a loop, so long chains do not recurse.
fn write_node(out: &mut String, node: &CqlNode, level: usize, indent: &str, newline: &str) {
    let mut spine: Vec<&BooleanNode> = Vec::new();
    let mut current = node;
    while let CqlNode::Boolean(boolean) = current {
        let child_indent = indent.repeat(level + spine.len() + 1);
        out.push_str("{\"op\": ");
        out.push_str(&json_string(boolean.op.as_str()));
        write_modifiers(out, &boolean.modifiers, &BOOLEAN_KEYS);
        write_metadata(out, boolean.pos, boolean.range.as_ref(), None);
        out.push(',');
        out.push_str(newline);
        out.push_str(&child_indent);
        out.push_str("\"s1\": ");
        spine.push(boolean);
        current = &boolean.left;
    }
    if let CqlNode::Clause(clause) = current {
        write_clause(out, clause);
    }

    for (depth, boolean) in spine.iter().enumerate().rev() {
        out.push(',');
        out.push_str(newline);
        out.push_str(&indent.repeat(level + depth + 1));
        out.push_str("\"s2\": ");
        write_node(out, &boolean.right, level + depth + 1, indent, newline);
        out.push('}');
    }
}

/// Writes a clause on a single line.
fn write_clause(out: &mut String, clause: &SearchClause) {
    out.push_str("{\"term\": ");
    out.push_str(&json_string(&clause.term));
    if clause.has_explicit_field() {
        out.push_str(", \"field\": ");
        out.push_str(&json_string(&clause.field));
    }
    if clause.has_explicit_relation() {
        out.push_str(", \"relation\": ");
        out.push_str(&json_string(relation::to_word(&clause.relation)));
    }
    write_modifiers(out, &clause.modifiers, &CLAUSE_RESERVED);
    write_metadata(
        out,
        clause.pos,
        clause.range.as_ref(),
        clause.relation_pos,
    );
    out.push('}');
}

/// Writes one key per modifier, skipping names that would collide with `reserved`.
fn write_modifiers(out: &mut String, modifiers: &[Modifier], reserved: &[&str]) {
    for modifier in modifiers {
        if reserved.contains(&modifier.name.as_str()) || is_metadata_key(&modifier.name) {
            continue;
        }
        out.push_str(", ");
        out.push_str(&json_string(&modifier.name));
        out.push_str(": ");
        write_modifier_value(out, modifier);
    }
}

/// Writes the position keys that are present.
fn write_metadata(
    out: &mut String,
    pos: Option<usize>,
    range: Option<&Range<usize>>,
    relation_pos: Option<usize>,
) {
    if let Some(pos) = pos {
        out.push_str(&format!(", \"@pos\": {pos}"));
    }
    if let Some(range) = range {
        out.push_str(&format!(", \"@range\": [{}, {}]", range.start, range.end));
    }
    if let Some(pos) = relation_pos {
        out.push_str(&format!(", \"relation@pos\": {pos}"));
    }
}

/// Writes the FQ value of a modifier: `true` for a flag, a string for `=`,
/// an object carrying the relation word otherwise.
fn write_modifier_value(out: &mut String, modifier: &Modifier) {
    if modifier.is_flag() {
        out.push_str("true");
    } else if modifier.relation == "=" {
        out.push_str(&json_string(&modifier.value));
    } else {
        out.push_str("{\"relation\": ");
        out.push_str(&json_string(relation::to_word(&modifier.relation)));
        out.push_str(", \"value\": ");
        out.push_str(&json_string(&modifier.value));
        out.push('}');
    }
}

/// Encodes a JSON string literal.
fn json_string(text: &str) -> String {
    Value::from(text).to_string()
}

/// True for the position keys, which never become modifiers.
fn is_metadata_key(key: &str) -> bool {
    key.ends_with("@pos") || key.ends_with("@range")
}

/// Parses FQ text against the default server-choice field and relation.
pub fn parse_from_fq(text: &str) -> Result<CqlNode, CqlError> {
    parse_from_fq_with(text, &ServerChoice::default())
}

/// Parses FQ text against the given server-choice defaults.
pub fn parse_from_fq_with(text: &str, server_choice: &ServerChoice) -> Result<CqlNode, CqlError> {
    if text.trim().is_empty() {
        return Err(CqlError::new(ErrorKind::EmptyInput, 0));
    }
    let value: Value = serde_json::from_str(text).map_err(|err| json_error(text, &err))?;
    parse_from_fq_value(&value, server_choice)
}

/// Reconstructs a tree from an already-parsed FQ value.
pub fn parse_from_fq_value(
    value: &Value,
    server_choice: &ServerChoice,
) -> Result<CqlNode, CqlError> {
    if value.is_null() {
        return Err(CqlError::new(ErrorKind::EmptyInput, 0));
    }
    node_from_value(value, server_choice)
}

/// Converts a JSON syntax error, positioned at the failing byte.
fn json_error(text: &str, err: &serde_json::Error) -> CqlError {
    let line_start: usize = text
        .split_inclusive('\n')
        .take(err.line().saturating_sub(1))
        .map(str::len)
        .sum();
    let position = (line_start + err.column().saturating_sub(1)).min(text.len());
    CqlError::new(ErrorKind::InvalidFqJson, position)
        .with_message(format!("{}: {err}", ErrorKind::InvalidFqJson))
}

/// Dispatches on the shape of an FQ object.
fn node_from_value(value: &Value, server_choice: &ServerChoice) -> Result<CqlNode, CqlError> {
    let Value::Object(map) = value else {
        return Err(CqlError::malformed_fq(format!("expected an object, got {value}")));
    };

    if let (Some(op), Some(s1), Some(s2)) = (map.get("op"), map.get("s1"), map.get("s2")) {
        let op = op
            .as_str()
            .and_then(BooleanOp::from_keyword)
            .ok_or_else(|| CqlError::malformed_fq(format!("unknown operator {op}")))?;
        let mut node = BooleanNode::new(
            op,
            node_from_value(s1, server_choice)?,
            node_from_value(s2, server_choice)?,
        );
        node.modifiers = modifiers_from_map(map, &BOOLEAN_KEYS)?;
        node.pos = position(map, "@pos");
        node.range = range(map);
        return Ok(node.into());
    }

    if let Some(term) = map.get("term") {
        let mut clause = SearchClause::new(scalar(term, "term")?, server_choice);
        if let Some(field) = map.get("field") {
            clause.field = string(field, "field")?.to_string();
        }
        if let Some(rel) = map.get("relation") {
            clause.relation = relation::to_symbol(string(rel, "relation")?).to_string();
        }
        clause.modifiers = modifiers_from_map(map, &CLAUSE_KEYS)?;
        clause.pos = position(map, "@pos");
        clause.range = range(map);
        clause.relation_pos = position(map, "relation@pos");
        return Ok(clause.into());
    }

    Err(CqlError::malformed_fq(
        "object has neither op/s1/s2 nor term",
    ))
}

/// Builds modifiers from every non-reserved, non-metadata key.
fn modifiers_from_map(
    map: &Map<String, Value>,
    reserved: &[&str],
) -> Result<Vec<Modifier>, CqlError> {
    map.iter()
        .filter(|(key, _)| !reserved.contains(&key.as_str()) && !is_metadata_key(key))
        .map(|(key, value)| modifier_from_value(key, value))
        .collect()
}

/// Decodes one modifier value.
fn modifier_from_value(name: &str, value: &Value) -> Result<Modifier, CqlError> {
    match value {
        Value::Bool(true) => Ok(Modifier::flag(name)),
        Value::Object(object) => {
            let rel = object
                .get("relation")
                .map(|r| string(r, "modifier relation"))
                .transpose()?
                .unwrap_or("=");
            let val = object
                .get("value")
                .map(|v| scalar(v, "modifier value"))
                .transpose()?
                .unwrap_or_default();
            Ok(Modifier::new(name, relation::to_symbol(rel), val))
        }
        other => Ok(Modifier::new(name, "=", scalar(other, name)?)),
    }
}

/// Reads a string, number or boolean as text.
fn scalar(value: &Value, what: &str) -> Result<String, CqlError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(CqlError::malformed_fq(format!(
            "{what} must be a scalar, got {value}"
        ))),
    }
}

/// Reads a string.
fn string<'a>(value: &'a Value, what: &str) -> Result<&'a str, CqlError> {
    value
        .as_str()
        .ok_or_else(|| CqlError::malformed_fq(format!("{what} must be a string, got {value}")))
}

/// Reads an optional position key.
fn position(map: &Map<String, Value>, key: &str) -> Option<usize> {
    map.get(key)
        .and_then(Value::as_u64)
        .and_then(|n| usize::try_from(n).ok())
}

/// Reads an optional `@range` key.
fn range(map: &Map<String, Value>) -> Option<Range<usize>> {
    let [start, end] = map.get("@range")?.as_array()?.as_slice() else {
        return None;
    };
    let start = usize::try_from(start.as_u64()?).ok()?;
    let end = usize::try_from(end.as_u64()?).ok()?;
    Some(start..end)
}
