#![allow(dead_code)]

//! Multi-section record editor.
//!
//! A `RecordEditor` owns one draft and walks the user through the record
//! type's sections in order. Leaving a section requires only that section's
//! required fields. Values stay as typed until `submit`, which coerces them
//! and hands them to the persistence collaborator.
//!
//! This is the form controller a front end drives against a `RecordStore`.
//! The HTTP server never calls it, so inside this binary it is reached only
//! from its tests; the `dead_code` allowance above covers that.

pub mod coercion;
pub mod draft;
pub mod list_view;

use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::{self, Session};
use crate::records::model::{Record, RecordKind};
use crate::records::schema::{CandidateField, ClientField, FieldKind, FieldSet, MandateField};
use crate::records::store::{RecordStore, StoreError};

use self::coercion::{changed_fields, coerce_all};
use self::draft::{Draft, DraftValue};

pub const SECTION_INCOMPLETE: &str = "Please fill all required fields in this section.";
pub const SUBMIT_FALLBACK: &str = "Failed to save record";

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("Please fill all required fields in this section.")]
    SectionIncomplete { section: usize },

    #[error("{0}")]
    InvalidInput(String),

    #[error("A new record has nothing to restore")]
    NothingToRestore,

    #[error("Cannot edit a {found:?} record as a {expected:?}")]
    WrongKind {
        expected: RecordKind,
        found: RecordKind,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EditorError {
    /// Text shown to the user. Backend failures get a generic fallback.
    pub fn user_message(&self) -> String {
        match self {
            EditorError::Store(err) => err
                .user_message()
                .unwrap_or_else(|| SUBMIT_FALLBACK.to_string()),
            other => other.to_string(),
        }
    }
}

pub type CandidateEditor = RecordEditor<CandidateField>;
pub type ClientEditor = RecordEditor<ClientField>;
pub type MandateEditor = RecordEditor<MandateField>;

#[derive(Debug, Clone)]
pub struct RecordEditor<F: FieldSet> {
    draft: Draft<F>,
    original: Option<Record>,
    section: usize,
    last_error: Option<String>,
}

impl<F: FieldSet> RecordEditor<F> {
    /// Editor for a new record.
    pub fn new() -> Self {
        Self {
            draft: Draft::empty(),
            original: None,
            section: 0,
            last_error: None,
        }
    }

    /// Editor for an existing record, hydrated from it.
    pub fn edit(record: Record) -> Result<Self, EditorError> {
        if record.kind != F::KIND {
            return Err(EditorError::WrongKind {
                expected: F::KIND,
                found: record.kind,
            });
        }
        Ok(Self {
            draft: Draft::hydrate(&record),
            original: Some(record),
            section: 0,
            last_error: None,
        })
    }

    /// Fetches the record fresh from `store` and opens it for editing.
    pub async fn open(
        store: &dyn RecordStore,
        session: Option<&Session>,
        id: Uuid,
    ) -> Result<Self, EditorError> {
        let session = auth::require(session)?;
        let record = store.get(session, F::KIND, id).await?;
        Self::edit(record)
    }

    pub fn draft(&self) -> &Draft<F> {
        &self.draft
    }

    pub fn value(&self, field: F) -> &DraftValue {
        self.draft.get(field)
    }

    pub fn original(&self) -> Option<&Record> {
        self.original.as_ref()
    }

    pub fn is_new(&self) -> bool {
        self.original.is_none()
    }

    pub fn section(&self) -> usize {
        self.section
    }

    pub fn section_name(&self) -> &'static str {
        F::KIND.sections()[self.section]
    }

    pub fn section_count(&self) -> usize {
        F::KIND.sections().len()
    }

    pub fn is_last_section(&self) -> bool {
        self.section + 1 >= self.section_count()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replaces one field's value. Never validates and never touches `last_error`.
    pub fn set_field(&mut self, field: F, value: impl Into<DraftValue>) {
        self.draft.set(field, value.into());
    }

    /// Appends `item` to a list field. Blank items and items already present
    /// are ignored. Returns whether the list changed.
    pub fn add_list_item(&mut self, field: F, item: &str) -> bool {
        let item = item.trim();
        if item.is_empty() || field.def().kind != FieldKind::List {
            return false;
        }
        self.draft.edit_list(field, |items| {
            if items.iter().any(|existing| existing == item) {
                false
            } else {
                items.push(item.to_string());
                true
            }
        })
    }

    pub fn remove_list_item(&mut self, field: F, item: &str) -> bool {
        if field.def().kind != FieldKind::List {
            return false;
        }
        self.draft.edit_list(field, |items| {
            let before = items.len();
            items.retain(|existing| existing != item);
            items.len() != before
        })
    }

    /// Checks the required fields of section `section` only.
    pub fn validate_section(&self, section: usize) -> Result<(), EditorError> {
        let missing: Vec<&str> = F::in_section(section)
            .into_iter()
            .filter(|f| f.def().required && !self.draft.get(*f).is_filled())
            .map(F::name)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            debug!("Section {section} of {:?} is missing {missing:?}", F::KIND);
            Err(EditorError::SectionIncomplete { section })
        }
    }

    pub fn go_next(&mut self) -> Result<(), EditorError> {
        if let Err(err) = self.validate_section(self.section) {
            self.last_error = Some(SECTION_INCOMPLETE.to_string());
            return Err(err);
        }
        self.last_error = None;
        if !self.is_last_section() {
            self.section += 1;
        }
        Ok(())
    }

    pub fn go_back(&mut self) {
        self.last_error = None;
        self.section = self.section.saturating_sub(1);
    }

    /// Restores the draft to the record as it was opened.
    pub fn cancel(&mut self) -> Result<(), EditorError> {
        let original = self.original.as_ref().ok_or(EditorError::NothingToRestore)?;
        self.draft = Draft::hydrate(original);
        self.section = 0;
        self.last_error = None;
        Ok(())
    }

    /// Validates the current section, coerces the draft and creates or
    /// updates the record.
    ///
    /// On failure the draft and section are left as they were and
    /// `last_error` holds the message to show. On success the editor is
    /// rehydrated from the returned record.
    pub async fn submit(
        &mut self,
        store: &dyn RecordStore,
        session: Option<&Session>,
    ) -> Result<Record, EditorError> {
        match self.try_submit(store, session).await {
            Ok(record) => {
                self.draft = Draft::hydrate(&record);
                self.original = Some(record.clone());
                self.last_error = None;
                Ok(record)
            }
            Err(err) => {
                if let EditorError::Store(store_err) = &err {
                    warn!("Saving {:?} failed: {store_err}", F::KIND);
                }
                self.last_error = Some(err.user_message());
                Err(err)
            }
        }
    }

    async fn try_submit(
        &self,
        store: &dyn RecordStore,
        session: Option<&Session>,
    ) -> Result<Record, EditorError> {
        self.validate_section(self.section)?;
        let record = match &self.original {
            None => {
                let payload = coerce_all(&self.draft)?;
                let session = auth::require(session)?;
                store.create(session, F::KIND, payload).await?
            }
            Some(original) => {
                let patch = changed_fields(&self.draft, original)?;
                let session = auth::require(session)?;
                store.update(session, F::KIND, original.id, patch).await?
            }
        };
        Ok(record)
    }
}

impl<F: FieldSet> Default for RecordEditor<F> {
    fn default() -> Self {
        Self::new()
    }
}
