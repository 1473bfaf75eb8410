//! Submit-time conversion of draft values into the stored JSON form.

use serde_json::{Map, Value};

use crate::editor::draft::{Draft, DraftValue};
use crate::editor::EditorError;
use crate::records::model::Record;
use crate::records::schema::{FieldDef, FieldKind, FieldSet};
use crate::records::validation::{canonical_number, format_timestamp, parse_timestamp};

/// Splits a delimited string (commas, semicolons or newlines) into trimmed,
/// non-empty items.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split([',', ';', '\n'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

/// Converts one draft value. Blank input becomes `null`, never zero or `""`.
pub fn coerce_value(def: &FieldDef, value: &DraftValue) -> Result<Value, EditorError> {
    let invalid = |expected: &str| EditorError::InvalidInput(format!("{} must be {expected}", def.name));

    let text = match value {
        DraftValue::Empty => return Ok(Value::Null),
        DraftValue::Text(s) if s.trim().is_empty() && def.kind != FieldKind::List => {
            return Ok(Value::Null)
        }
        DraftValue::Text(s) => s,
        DraftValue::Flag(b) => {
            return match def.kind {
                FieldKind::Boolean => Ok(Value::Bool(*b)),
                _ => Err(invalid("text")),
            }
        }
        DraftValue::List(items) => {
            return match def.kind {
                FieldKind::List => Ok(list_value(items.iter().map(String::as_str))),
                _ => Err(invalid("a single value")),
            }
        }
    };

    match def.kind {
        FieldKind::Text => Ok(Value::String(text.clone())),
        FieldKind::Enum(_) | FieldKind::ForeignKey(_) => Ok(Value::String(text.trim().to_string())),
        FieldKind::Number => text
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(canonical_number)
            .map(Value::Number)
            .ok_or_else(|| invalid("a number")),
        FieldKind::Date => parse_timestamp(text)
            .map(|ts| Value::String(format_timestamp(ts)))
            .ok_or_else(|| invalid("a date")),
        FieldKind::Boolean => match text.trim() {
            "true" => Ok(Value::Bool(true)),
            "false" => Ok(Value::Bool(false)),
            _ => Err(invalid("true or false")),
        },
        FieldKind::List => Ok(list_value(split_list(text).iter().map(String::as_str))),
    }
}

fn list_value<'a>(items: impl Iterator<Item = &'a str>) -> Value {
    Value::Array(
        items
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

/// Payload for a create: every filled field, coerced. Unset fields are omitted.
pub fn coerce_all<F: FieldSet>(draft: &Draft<F>) -> Result<Map<String, Value>, EditorError> {
    let mut payload = Map::new();
    for &field in F::ALL {
        let value = coerce_value(field.def(), draft.get(field))?;
        if !value.is_null() {
            payload.insert(field.name().to_string(), value);
        }
    }
    Ok(payload)
}

/// Payload for an update: only the fields whose coerced value differs from
/// `original`. A cleared field is sent as `null`.
pub fn changed_fields<F: FieldSet>(
    draft: &Draft<F>,
    original: &Record,
) -> Result<Map<String, Value>, EditorError> {
    let mut patch = Map::new();
    for &field in F::ALL {
        let def = field.def();
        let value = coerce_value(def, draft.get(field))?;
        if !same_value(def, original.get(def.name), &value) {
            patch.insert(def.name.to_string(), value);
        }
    }
    Ok(patch)
}

fn same_value(def: &FieldDef, stored: Option<&Value>, coerced: &Value) -> bool {
    let stored = stored.filter(|v| !is_blank_text(v));
    match (stored, coerced) {
        (None, Value::Null) => true,
        (None, _) | (Some(_), Value::Null) => false,
        // The editor edits whole days, so a stored time of day is not a change.
        (Some(Value::String(a)), Value::String(b)) if def.kind == FieldKind::Date => {
            match (parse_timestamp(a), parse_timestamp(b)) {
                (Some(a), Some(b)) => a.date_naive() == b.date_naive(),
                _ => a == b,
            }
        }
        (Some(stored), coerced) => stored == coerced,
    }
}

fn is_blank_text(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().is_empty())
}
