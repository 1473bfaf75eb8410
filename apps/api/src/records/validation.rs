//! Payload validation applied by every `RecordStore` before a write.
//!
//! Rejection always happens before anything is written. Values that pass are
//! normalized to their canonical stored form (integral numbers as integers,
//! timestamps as RFC 3339 UTC with milliseconds, UUIDs hyphenated).

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Map, Number, Value};
use tracing::debug;
use uuid::Uuid;

use crate::records::model::{RecordKind, AUDIT_KEYS};
use crate::records::schema::{FieldDef, FieldKind};
use crate::records::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Create,
    Update,
}

/// Validates and normalizes a client payload for `kind`.
///
/// Audit and system keys are dropped, unknown keys are rejected. On create the
/// type's defaults are applied and its required fields enforced; on update a
/// required field may not be cleared.
pub fn validate_payload(
    kind: RecordKind,
    payload: Map<String, Value>,
    mode: Mode,
) -> Result<Map<String, Value>, StoreError> {
    let mut out = Map::new();

    for (key, value) in payload {
        if AUDIT_KEYS.contains(&key.as_str()) || kind.system_fields().contains(&key.as_str()) {
            debug!("Dropping read-only key '{key}' from {} payload", kind.as_str());
            continue;
        }
        let def = kind
            .field(&key)
            .ok_or_else(|| StoreError::ValidationFailed(format!("unknown field '{key}'")))?;
        let normalized = normalize_value(def, value)?;
        out.insert(key, normalized);
    }

    if mode == Mode::Create {
        for (name, default) in kind.create_defaults() {
            let unset = out.get(*name).map_or(true, Value::is_null);
            if unset {
                out.insert((*name).to_string(), Value::String((*default).to_string()));
            }
        }
    }

    for name in kind.required_on_create() {
        let blank = match out.get(*name) {
            None => mode == Mode::Create,
            Some(value) => is_blank(value),
        };
        if blank {
            return Err(StoreError::ValidationFailed(format!("{name} is required")));
        }
    }

    Ok(out)
}

/// Foreign keys referenced by an already validated payload.
pub fn foreign_keys(kind: RecordKind, payload: &Map<String, Value>) -> Vec<(&'static str, RecordKind, Uuid)> {
    kind.fields()
        .iter()
        .filter_map(|def| match def.kind {
            FieldKind::ForeignKey(target) => payload
                .get(def.name)
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(|id| (def.name, target, id)),
            _ => None,
        })
        .collect()
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn normalize_value(def: &FieldDef, value: Value) -> Result<Value, StoreError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    let invalid = |expected: &str| {
        StoreError::ValidationFailed(format!("{} must be {expected}", def.name))
    };

    match def.kind {
        FieldKind::Text => match value {
            Value::String(_) => Ok(value),
            _ => Err(invalid("a string")),
        },
        FieldKind::Number => value
            .as_f64()
            .and_then(canonical_number)
            .map(Value::Number)
            .ok_or_else(|| invalid("a number")),
        FieldKind::Boolean => match value {
            Value::Bool(_) => Ok(value),
            _ => Err(invalid("a boolean")),
        },
        FieldKind::Date => value
            .as_str()
            .and_then(parse_timestamp)
            .map(|ts| Value::String(format_timestamp(ts)))
            .ok_or_else(|| invalid("a date (YYYY-MM-DD or RFC 3339)")),
        FieldKind::Enum(allowed) => match value.as_str() {
            Some(s) if allowed.contains(&s) => Ok(value),
            _ => Err(StoreError::ValidationFailed(format!(
                "{} must be one of {}",
                def.name,
                allowed.join(", ")
            ))),
        },
        FieldKind::List => {
            let all_strings = value
                .as_array()
                .is_some_and(|items| items.iter().all(Value::is_string));
            if all_strings {
                Ok(value)
            } else {
                Err(invalid("a list of strings"))
            }
        }
        FieldKind::ForeignKey(target) => value
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .map(|id| Value::String(id.to_string()))
            .ok_or_else(|| invalid(&format!("a {} id", target.label().to_lowercase()))),
    }
}

/// Stores integral values as integers so `150000` and `150000.0` compare equal.
pub fn canonical_number(n: f64) -> Option<Number> {
    if !n.is_finite() {
        return None;
    }
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        Some(Number::from(n as i64))
    } else {
        Number::from_f64(n)
    }
}

/// Accepts RFC 3339 or a bare `YYYY-MM-DD` (read as UTC midnight).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(input) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
