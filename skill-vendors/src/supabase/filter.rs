//! PostgREST row filters.
//!
//! A filter arrives as `{column, op, value}` and leaves as one query pair,
//! `column=op.operand`, with the operand encoded the way PostgREST parses it.

use serde_json::Value;
use skill_core::id;
use skill_core::ParamReader;

pub(super) const OPS: &[&str] = &["eq", "neq", "gt", "gte", "lt", "lte", "like", "ilike", "is", "in"];

/// One validated filter, already encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    /// `op.operand`, e.g. `eq.42` or `in.("a b",c)`.
    pub expr: String,
}

impl Filter {
    pub(super) fn pair(&self) -> (String, String) {
        (self.column.clone(), self.expr.clone())
    }
}

/// Scalar operand as PostgREST text.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Quotes a list element when PostgREST would otherwise split or misread it.
fn list_item(raw: &str) -> String {
    let reserved = raw.is_empty() || raw.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | '\\' | ' ' | '.' | ':'));
    if reserved {
        format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        raw.to_owned()
    }
}

fn operand(op: &str, value: &Value) -> Result<String, String> {
    match op {
        "is" => match value {
            Value::Null => Ok("null".to_owned()),
            Value::Bool(b) => Ok(b.to_string()),
            Value::String(s) if matches!(s.as_str(), "null" | "true" | "false") => Ok(s.clone()),
            _ => Err("must be null, true or false for op 'is'".to_owned()),
        },
        "in" => {
            let items = value
                .as_array()
                .filter(|items| !items.is_empty())
                .ok_or_else(|| "must be a non-empty array for op 'in'".to_owned())?;
            let encoded: Option<Vec<String>> = items.iter().map(|v| scalar(v).map(|s| list_item(&s))).collect();
            encoded
                .map(|parts| format!("({})", parts.join(",")))
                .ok_or_else(|| "must contain only strings, numbers or booleans".to_owned())
        }
        _ => scalar(value).ok_or_else(|| "must be a string, number or boolean".to_owned()),
    }
}

/// Reads the `filters` array, reporting failures as `filters[i].field`.
pub(super) fn read(r: &mut ParamReader<'_>, required: bool) -> Vec<Filter> {
    let Some(items) = r.opt_array("filters") else {
        if required && !r.has("filters") {
            r.reject("filters", "is required");
        }
        return Vec::new();
    };
    if required && items.is_empty() {
        r.reject("filters", "must not be empty; refusing to touch every row");
    }
    let mut out = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let at = |field: &str| format!("filters[{i}].{field}");
        let column = match item["column"].as_str().map(id::sql_ident) {
            Some(Ok(c)) => Some(c),
            Some(Err(reason)) => {
                r.reject(&at("column"), reason);
                None
            }
            None => {
                r.reject(&at("column"), "is required");
                None
            }
        };
        let op = item["op"].as_str().and_then(|op| OPS.iter().copied().find(|o| *o == op));
        if op.is_none() {
            r.reject(&at("op"), format!("must be one of: {}", OPS.join(", ")));
        }
        let expr = op.map(|op| (op, operand(op, &item["value"])));
        match (column, expr) {
            (Some(column), Some((op, Ok(value)))) => out.push(Filter { column, expr: format!("{op}.{value}") }),
            (_, Some((_, Err(reason)))) => r.reject(&at("value"), reason),
            _ => {}
        }
    }
    out
}
