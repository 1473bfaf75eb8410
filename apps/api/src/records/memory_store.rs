//! `RecordStore` kept in process memory. Applies the same validation and list
//! filtering as the PostgreSQL store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::auth::Session;
use crate::records::filter;
use crate::records::model::{ClientSummary, ListFilter, Record, RecordKind};
use crate::records::store::{RecordStore, StoreError};
use crate::records::validation::{foreign_keys, validate_payload, Mode};

#[derive(Default)]
pub struct InMemoryRecordStore {
    records: Mutex<HashMap<Uuid, Record>>,
    last_timestamp: Mutex<Option<DateTime<Utc>>>,
    writes: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of write operations (create, update, delete) attempted so far.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self, kind: RecordKind) -> usize {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.kind == kind)
            .count()
    }

    /// Strictly increasing timestamps, so creation order is always observable.
    fn tick(&self) -> DateTime<Utc> {
        let mut last = self.last_timestamp.lock().unwrap();
        let now = Utc::now();
        let next = match *last {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        *last = Some(next);
        next
    }

    fn client_of<'a>(records: &'a HashMap<Uuid, Record>, record: &Record) -> Option<&'a Record> {
        if record.kind != RecordKind::Mandate {
            return None;
        }
        record
            .text("clientId")
            .and_then(|id| Uuid::parse_str(id).ok())
            .and_then(|id| records.get(&id))
            .filter(|c| c.kind == RecordKind::Client)
    }

    fn client_name<'a>(records: &'a HashMap<Uuid, Record>, record: &Record) -> Option<&'a str> {
        Self::client_of(records, record).and_then(|c| c.text("name"))
    }

    /// The record as returned to callers, with a requirement's client embedded.
    fn view(records: &HashMap<Uuid, Record>, record: &Record) -> Record {
        let client = Self::client_of(records, record).map(|c| ClientSummary {
            id: c.id,
            name: c.text("name").unwrap_or_default().to_string(),
        });
        Record {
            client,
            ..record.clone()
        }
    }

    fn check_references(
        records: &HashMap<Uuid, Record>,
        kind: RecordKind,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        for (field, target, id) in foreign_keys(kind, fields) {
            if !records.get(&id).is_some_and(|r| r.kind == target) {
                return Err(StoreError::unknown_reference(field, target));
            }
        }
        Ok(())
    }

    fn check_email(
        records: &HashMap<Uuid, Record>,
        kind: RecordKind,
        fields: &Map<String, Value>,
        except: Option<Uuid>,
    ) -> Result<(), StoreError> {
        if kind != RecordKind::Candidate {
            return Ok(());
        }
        let Some(email) = fields.get("email").and_then(Value::as_str) else {
            return Ok(());
        };
        let taken = records.values().any(|r| {
            r.kind == RecordKind::Candidate
                && Some(r.id) != except
                && r.text("email")
                    .is_some_and(|e| e.to_lowercase() == email.to_lowercase())
        });
        if taken {
            return Err(StoreError::duplicate_email(email));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn create(
        &self,
        session: &Session,
        kind: RecordKind,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut fields = validate_payload(kind, fields, Mode::Create)?;

        let mut records = self.records.lock().unwrap();
        Self::check_references(&records, kind, &fields)?;
        Self::check_email(&records, kind, &fields, None)?;

        if kind == RecordKind::Mandate {
            fields.insert("recruiterId".into(), Value::String(session.user_id.to_string()));
        }
        let now = self.tick();
        let record = Record {
            id: Uuid::new_v4(),
            kind,
            fields,
            created_at: now,
            updated_at: now,
            client: None,
        };
        let view = Self::view(&records, &record);
        records.insert(record.id, record);
        Ok(view)
    }

    async fn update(
        &self,
        _session: &Session,
        kind: RecordKind,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let patch = validate_payload(kind, fields, Mode::Update)?;

        let mut records = self.records.lock().unwrap();
        if !records.get(&id).is_some_and(|r| r.kind == kind) {
            return Err(StoreError::not_found(kind, id));
        }
        Self::check_references(&records, kind, &patch)?;
        Self::check_email(&records, kind, &patch, Some(id))?;

        let now = self.tick();
        let record = records
            .get_mut(&id)
            .ok_or_else(|| StoreError::not_found(kind, id))?;
        record.fields.extend(patch);
        record.updated_at = now;
        let stored = record.clone();
        Ok(Self::view(&records, &stored))
    }

    async fn get(&self, _session: &Session, kind: RecordKind, id: Uuid) -> Result<Record, StoreError> {
        let records = self.records.lock().unwrap();
        records
            .get(&id)
            .filter(|r| r.kind == kind)
            .map(|r| Self::view(&records, r))
            .ok_or_else(|| StoreError::not_found(kind, id))
    }

    async fn list(
        &self,
        _session: &Session,
        kind: RecordKind,
        list_filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError> {
        let records = self.records.lock().unwrap();
        let mut rows: Vec<Record> = records
            .values()
            .filter(|r| r.kind == kind)
            .filter(|r| filter::matches(r, list_filter, Self::client_name(&records, r)))
            .map(|r| Self::view(&records, r))
            .collect();
        rows.sort_by(filter::newest_first);
        Ok(rows)
    }

    async fn delete(&self, _session: &Session, kind: RecordKind, id: Uuid) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        if !records.get(&id).is_some_and(|r| r.kind == kind) {
            return Err(StoreError::not_found(kind, id));
        }
        if kind == RecordKind::Client {
            let id_str = id.to_string();
            let in_use = records
                .values()
                .any(|r| r.kind == RecordKind::Mandate && r.text("clientId") == Some(id_str.as_str()));
            if in_use {
                return Err(StoreError::client_in_use(id));
            }
        }
        records.remove(&id);
        Ok(())
    }

    async fn set_resume_url(
        &self,
        _session: &Session,
        candidate_id: Uuid,
        url: &str,
    ) -> Result<Record, StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let now = self.tick();
        let mut records = self.records.lock().unwrap();
        let record = records
            .get_mut(&candidate_id)
            .filter(|r| r.kind == RecordKind::Candidate)
            .ok_or_else(|| StoreError::not_found(RecordKind::Candidate, candidate_id))?;
        record
            .fields
            .insert("resumeUrl".into(), Value::String(url.to_string()));
        record.updated_at = now;
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testing::recruiter;
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_rejects_unknown_client_reference() {
        let store = InMemoryRecordStore::new();
        let err = store
            .create(
                &recruiter(),
                RecordKind::Mandate,
                payload(json!({"title": "CFO", "clientId": Uuid::new_v4().to_string()})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::ValidationFailed(m) if m.contains("clientId")));
        assert_eq!(store.len(RecordKind::Mandate), 0);
    }

    #[tokio::test]
    async fn test_mandate_records_recruiter_and_blocks_client_delete() {
        let store = InMemoryRecordStore::new();
        let session = recruiter();
        let client = store
            .create(&session, RecordKind::Client, payload(json!({"name": "TechCorp Inc."})))
            .await
            .unwrap();
        assert_eq!(client.text("status"), Some("ACTIVE"));

        let mandate = store
            .create(
                &session,
                RecordKind::Mandate,
                payload(json!({
                    "title": "Senior Software Engineer",
                    "clientId": client.id.to_string(),
                    "recruiterId": Uuid::new_v4().to_string()
                })),
            )
            .await
            .unwrap();
        assert_eq!(
            mandate.text("recruiterId"),
            Some(session.user_id.to_string().as_str())
        );
        let embedded = Some(ClientSummary {
            id: client.id,
            name: "TechCorp Inc.".into(),
        });
        assert_eq!(mandate.client, embedded);
        assert_eq!(client.client, None);

        let fetched = store.get(&session, RecordKind::Mandate, mandate.id).await.unwrap();
        assert_eq!(fetched.client, embedded);
        let renamed = store
            .update(&session, RecordKind::Client, client.id, payload(json!({"name": "TechCorp"})))
            .await
            .unwrap();
        assert_eq!(renamed.client, None);
        let rows = store
            .list(&session, RecordKind::Mandate, &ListFilter::default())
            .await
            .unwrap();
        assert_eq!(rows[0].client.as_ref().map(|c| c.name.as_str()), Some("TechCorp"));

        let err = store.delete(&session, RecordKind::Client, client.id).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.delete(&session, RecordKind::Mandate, mandate.id).await.unwrap();
        store.delete(&session, RecordKind::Client, client.id).await.unwrap();
        assert_eq!(store.len(RecordKind::Client), 0);
    }

    #[tokio::test]
    async fn test_email_unique_case_insensitive_except_self() {
        let store = InMemoryRecordStore::new();
        let session = recruiter();
        let alice = store
            .create(
                &session,
                RecordKind::Candidate,
                payload(json!({"fullName": "Alice Johnson", "email": "alice@example.com"})),
            )
            .await
            .unwrap();

        let err = store
            .create(
                &session,
                RecordKind::Candidate,
                payload(json!({"fullName": "Alice J.", "email": "ALICE@example.com"})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let same = store
            .update(
                &session,
                RecordKind::Candidate,
                alice.id,
                payload(json!({"email": "Alice@Example.com"})),
            )
            .await
            .unwrap();
        assert_eq!(same.text("email"), Some("Alice@Example.com"));
    }

    #[tokio::test]
    async fn test_update_merges_and_bumps_updated_at() {
        let store = InMemoryRecordStore::new();
        let session = recruiter();
        let created = store
            .create(
                &session,
                RecordKind::Candidate,
                payload(json!({
                    "fullName": "Bob Lee",
                    "email": "bob.lee@example.com",
                    "phone": "555-0100"
                })),
            )
            .await
            .unwrap();

        let updated = store
            .update(
                &session,
                RecordKind::Candidate,
                created.id,
                payload(json!({"status": "HIRED", "phone": null})),
            )
            .await
            .unwrap();
        assert_eq!(updated.text("status"), Some("HIRED"));
        assert_eq!(updated.get("phone"), None);
        assert_eq!(updated.text("fullName"), Some("Bob Lee"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > created.updated_at);

        let err = store
            .update(&session, RecordKind::Client, created.id, Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_list_does_not_write() {
        let store = InMemoryRecordStore::new();
        let session = recruiter();
        let created = store
            .create(&session, RecordKind::Client, payload(json!({"name": "SaaSify"})))
            .await
            .unwrap();
        let writes = store.write_count();

        let rows = store
            .list(&session, RecordKind::Client, &ListFilter::default())
            .await
            .unwrap();
        assert_eq!(rows, vec![created]);
        assert_eq!(store.write_count(), writes);
    }
}
