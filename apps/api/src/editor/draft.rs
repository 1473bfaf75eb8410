use std::marker::PhantomData;

use serde_json::Value;

use crate::records::model::Record;
use crate::records::schema::{FieldKind, FieldSet};
use crate::records::validation::parse_timestamp;

/// Date format shown in the editor (an `<input type="date">` value).
pub const EDITOR_DATE_FORMAT: &str = "%Y-%m-%d";

/// One field's value as the user typed it. Nothing is parsed until submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DraftValue {
    #[default]
    Empty,
    Text(String),
    Flag(bool),
    List(Vec<String>),
}

impl DraftValue {
    /// Whether the value satisfies a "required" rule.
    pub fn is_filled(&self) -> bool {
        match self {
            DraftValue::Empty => false,
            DraftValue::Text(s) => !s.trim().is_empty(),
            DraftValue::Flag(_) => true,
            DraftValue::List(items) => !items.is_empty(),
        }
    }

    fn from_stored(kind: FieldKind, value: &Value) -> Self {
        match value {
            Value::Null => DraftValue::Empty,
            Value::String(s) if kind == FieldKind::Date => match parse_timestamp(s) {
                Some(ts) => DraftValue::Text(ts.format(EDITOR_DATE_FORMAT).to_string()),
                None => DraftValue::Text(s.clone()),
            },
            Value::String(s) => DraftValue::Text(s.clone()),
            Value::Number(n) => DraftValue::Text(n.to_string()),
            Value::Bool(b) => DraftValue::Flag(*b),
            Value::Array(items) => DraftValue::List(
                items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
            ),
            Value::Object(_) => DraftValue::Text(value.to_string()),
        }
    }
}

impl From<&str> for DraftValue {
    fn from(s: &str) -> Self {
        DraftValue::Text(s.to_string())
    }
}

impl From<String> for DraftValue {
    fn from(s: String) -> Self {
        DraftValue::Text(s)
    }
}

impl From<bool> for DraftValue {
    fn from(b: bool) -> Self {
        DraftValue::Flag(b)
    }
}

impl From<Vec<String>> for DraftValue {
    fn from(items: Vec<String>) -> Self {
        DraftValue::List(items)
    }
}

/// Working copy of a record, one slot per field of `F`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft<F: FieldSet> {
    values: Vec<DraftValue>,
    _fields: PhantomData<F>,
}

impl<F: FieldSet> Draft<F> {
    pub fn empty() -> Self {
        Self {
            values: vec![DraftValue::Empty; F::ALL.len()],
            _fields: PhantomData,
        }
    }

    /// Field-for-field copy of a stored record, with dates shown as `YYYY-MM-DD`.
    pub fn hydrate(record: &Record) -> Self {
        let mut draft = Self::empty();
        for &field in F::ALL {
            if let Some(value) = record.get(field.name()) {
                draft.values[field.index()] = DraftValue::from_stored(field.def().kind, value);
            }
        }
        draft
    }

    pub fn get(&self, field: F) -> &DraftValue {
        &self.values[field.index()]
    }

    pub fn set(&mut self, field: F, value: DraftValue) {
        self.values[field.index()] = value;
    }

    /// Runs `edit` on the field's list. A typed delimited string is split first
    /// and an empty slot starts as an empty list.
    pub(crate) fn edit_list<R>(&mut self, field: F, edit: impl FnOnce(&mut Vec<String>) -> R) -> R {
        let slot = &mut self.values[field.index()];
        let mut items = match std::mem::take(slot) {
            DraftValue::List(items) => items,
            DraftValue::Text(s) => super::coercion::split_list(&s),
            DraftValue::Empty | DraftValue::Flag(_) => Vec::new(),
        };
        let out = edit(&mut items);
        *slot = DraftValue::List(items);
        out
    }
}

impl<F: FieldSet> Default for Draft<F> {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::model::RecordKind;
    use crate::records::schema::{CandidateField, MandateField};
    use chrono::Utc;
    use serde_json::{json, Map};
    use uuid::Uuid;

    fn record(kind: RecordKind, fields: Value) -> Record {
        Record {
            id: Uuid::new_v4(),
            kind,
            fields: fields.as_object().cloned().unwrap_or_else(Map::new),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            client: None,
        }
    }

    #[test]
    fn test_hydrate_normalizes_stored_values() {
        let stored = record(
            RecordKind::Mandate,
            json!({
                "title": "Senior Software Engineer",
                "salaryMin": 150000,
                "feePercentage": 22.5,
                "dateOpened": "2025-01-15T10:30:00.000Z",
                "pricingThresholdMet": true,
                "bonusStructure": null
            }),
        );
        let draft = Draft::<MandateField>::hydrate(&stored);
        assert_eq!(draft.get(MandateField::Title), &DraftValue::from("Senior Software Engineer"));
        assert_eq!(draft.get(MandateField::SalaryMin), &DraftValue::from("150000"));
        assert_eq!(draft.get(MandateField::FeePercentage), &DraftValue::from("22.5"));
        assert_eq!(draft.get(MandateField::DateOpened), &DraftValue::from("2025-01-15"));
        assert_eq!(draft.get(MandateField::PricingThresholdMet), &DraftValue::Flag(true));
        assert_eq!(draft.get(MandateField::BonusStructure), &DraftValue::Empty);
        assert_eq!(draft.get(MandateField::SalaryMax), &DraftValue::Empty);
    }

    #[test]
    fn test_edit_list_splits_typed_text() {
        let mut draft = Draft::<CandidateField>::empty();
        draft.set(CandidateField::KeySkills, "React, Node.js".into());
        draft.edit_list(CandidateField::KeySkills, |items| items.push("AWS".into()));
        assert_eq!(
            draft.get(CandidateField::KeySkills),
            &DraftValue::List(vec!["React".into(), "Node.js".into(), "AWS".into()])
        );
    }

    #[test]
    fn test_is_filled() {
        assert!(!DraftValue::Empty.is_filled());
        assert!(!DraftValue::from("   ").is_filled());
        assert!(!DraftValue::List(vec![]).is_filled());
        assert!(DraftValue::Flag(false).is_filled());
        assert!(DraftValue::from("0").is_filled());
    }
}
