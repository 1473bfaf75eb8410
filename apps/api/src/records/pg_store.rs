use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Map, Value};
use sqlx::{FromRow, PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Session;
use crate::records::model::{ClientSummary, ListFilter, Record, RecordKind};
use crate::records::store::{RecordStore, StoreError};
use crate::records::validation::{foreign_keys, validate_payload, Mode};

/// Runs `rows` (any statement yielding `records` rows) as a CTE and joins each
/// requirement to its client. `tail` may filter and order on `r` and `c`.
fn with_client(rows: &str, tail: &str) -> String {
    format!(
        r#"
        WITH r AS ({rows})
        SELECT r.id, r.kind, r.data, r.created_at, r.updated_at,
               c.id AS client_ref, c.data->>'name' AS client_name
        FROM r
        LEFT JOIN records c
            ON r.kind = 'mandate' AND c.kind = 'client' AND c.id::text = r.data->>'clientId'
        {tail}
        "#
    )
}

#[derive(Debug, FromRow)]
struct RecordRow {
    id: Uuid,
    kind: String,
    data: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    client_ref: Option<Uuid>,
    client_name: Option<String>,
}

impl RecordRow {
    fn into_record(self) -> Result<Record, StoreError> {
        let kind = RecordKind::from_db_str(&self.kind).ok_or_else(|| {
            StoreError::Database(sqlx::Error::Decode(
                format!("unknown record kind '{}'", self.kind).into(),
            ))
        })?;
        let fields = match self.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Ok(Record {
            id: self.id,
            kind,
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
            client: self.client_ref.map(|id| ClientSummary {
                id,
                name: self.client_name.unwrap_or_default(),
            }),
        })
    }
}

/// `RecordStore` over the `records` table. Field values live in the `data`
/// jsonb column; partial updates are a jsonb merge.
pub struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Share-locks each referenced record until `conn`'s transaction ends, so a
    /// concurrent delete of the target waits for the write to commit.
    async fn check_references(
        conn: &mut PgConnection,
        kind: RecordKind,
        fields: &Map<String, Value>,
    ) -> Result<(), StoreError> {
        for (field, target, id) in foreign_keys(kind, fields) {
            let found: Option<Uuid> = sqlx::query_scalar(
                "SELECT id FROM records WHERE id = $1 AND kind = $2 FOR SHARE",
            )
            .bind(id)
            .bind(target.as_str())
            .fetch_optional(&mut *conn)
            .await?;
            if found.is_none() {
                return Err(StoreError::unknown_reference(field, target));
            }
        }
        Ok(())
    }

    async fn check_email(
        conn: &mut PgConnection,
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
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM records
                WHERE kind = 'candidate'
                  AND lower(data->>'email') = lower($1)
                  AND ($2::uuid IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(email)
        .bind(except)
        .fetch_one(&mut *conn)
        .await?;
        if taken {
            return Err(StoreError::duplicate_email(email));
        }
        Ok(())
    }
}

/// The unique email index backs up `check_email` against concurrent inserts.
fn map_write_error(err: sqlx::Error, fields: &Map<String, Value>) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            let email = fields.get("email").and_then(Value::as_str).unwrap_or_default();
            StoreError::duplicate_email(email)
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn create(
        &self,
        session: &Session,
        kind: RecordKind,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let mut fields = validate_payload(kind, fields, Mode::Create)?;
        let mut tx = self.pool.begin().await?;
        Self::check_references(&mut tx, kind, &fields).await?;
        Self::check_email(&mut tx, kind, &fields, None).await?;

        if kind == RecordKind::Mandate {
            fields.insert("recruiterId".into(), Value::String(session.user_id.to_string()));
        }

        let row = sqlx::query_as::<_, RecordRow>(&with_client(
            "INSERT INTO records (id, kind, data) VALUES ($1, $2, $3) RETURNING *",
            "",
        ))
        .bind(Uuid::new_v4())
        .bind(kind.as_str())
        .bind(Value::Object(fields.clone()))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &fields))?;
        tx.commit().await?;

        info!("Created {} {} by {}", kind.as_str(), row.id, session.user_id);
        row.into_record()
    }

    async fn update(
        &self,
        session: &Session,
        kind: RecordKind,
        id: Uuid,
        fields: Map<String, Value>,
    ) -> Result<Record, StoreError> {
        let patch = validate_payload(kind, fields, Mode::Update)?;
        let mut tx = self.pool.begin().await?;
        Self::check_references(&mut tx, kind, &patch).await?;
        Self::check_email(&mut tx, kind, &patch, Some(id)).await?;

        let row = sqlx::query_as::<_, RecordRow>(&with_client(
            "UPDATE records SET data = data || $1, updated_at = now() \
             WHERE id = $2 AND kind = $3 RETURNING *",
            "",
        ))
        .bind(Value::Object(patch.clone()))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, &patch))?
        .ok_or_else(|| StoreError::not_found(kind, id))?;
        tx.commit().await?;

        info!(
            "Updated {} {} ({} fields) by {}",
            kind.as_str(),
            id,
            patch.len(),
            session.user_id
        );
        row.into_record()
    }

    async fn get(&self, _session: &Session, kind: RecordKind, id: Uuid) -> Result<Record, StoreError> {
        sqlx::query_as::<_, RecordRow>(&with_client(
            "SELECT * FROM records WHERE id = $1 AND kind = $2",
            "",
        ))
        .bind(id)
        .bind(kind.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found(kind, id))?
        .into_record()
    }

    async fn list(
        &self,
        _session: &Session,
        kind: RecordKind,
        filter: &ListFilter,
    ) -> Result<Vec<Record>, StoreError> {
        debug!("Listing {} with {:?}", kind.as_str(), filter);
        let search_fields: Vec<String> = kind.search_fields().iter().map(|f| f.to_string()).collect();

        // Mirrors records::filter::matches.
        let rows = sqlx::query_as::<_, RecordRow>(&with_client(
            "SELECT * FROM records WHERE kind = $1",
            r#"
            WHERE ($2::text IS NULL OR r.data->>'status' = $2)
              AND ($3::text IS NULL OR r.data->>'priority' = $3)
              AND ($4::text IS NULL OR r.data->>'source' = $4)
              AND ($5::text IS NULL OR r.data->>'clientId' = $5)
              AND (
                  $6::text IS NULL
                  OR $6 = ''
                  OR EXISTS (
                      SELECT 1 FROM unnest($7::text[]) AS f(name)
                      WHERE strpos(lower(r.data->>f.name), lower($6)) > 0
                  )
                  OR strpos(lower(c.data->>'name'), lower($6)) > 0
              )
            ORDER BY r.created_at DESC, r.id DESC
            "#,
        ))
        .bind(kind.as_str())
        .bind(filter.status.as_deref())
        .bind(filter.priority.as_deref())
        .bind(filter.source.as_deref())
        .bind(filter.client_id.as_deref())
        .bind(filter.search.as_deref())
        .bind(&search_fields)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RecordRow::into_record).collect()
    }

    async fn delete(&self, session: &Session, kind: RecordKind, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Locking the row first makes a concurrent requirement write that
        // references it either finish before the in-use check or fail after.
        let found: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM records WHERE id = $1 AND kind = $2 FOR UPDATE")
                .bind(id)
                .bind(kind.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        if found.is_none() {
            return Err(StoreError::not_found(kind, id));
        }

        if kind == RecordKind::Client {
            let in_use: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM records WHERE kind = 'mandate' AND data->>'clientId' = $1)",
            )
            .bind(id.to_string())
            .fetch_one(&mut *tx)
            .await?;
            if in_use {
                return Err(StoreError::client_in_use(id));
            }
        }

        sqlx::query("DELETE FROM records WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted {} {} by {}", kind.as_str(), id, session.user_id);
        Ok(())
    }

    async fn set_resume_url(
        &self,
        _session: &Session,
        candidate_id: Uuid,
        url: &str,
    ) -> Result<Record, StoreError> {
        sqlx::query_as::<_, RecordRow>(&with_client(
            "UPDATE records SET data = data || $1, updated_at = now() \
             WHERE id = $2 AND kind = 'candidate' RETURNING *",
            "",
        ))
        .bind(json!({ "resumeUrl": url }))
        .bind(candidate_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StoreError::not_found(RecordKind::Candidate, candidate_id))?
        .into_record()
    }
}
