//! Session collaborator.
//!
//! Sessions are issued by an external login flow and stored in Redis as JSON
//! under `session:<token>`. This service only resolves them.

pub mod middleware;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::records::store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Recruiter,
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Turns the `currentSession()` result into a session or `Unauthorized`.
/// Callers run this before touching any data.
pub fn require(session: Option<&Session>) -> Result<&Session, StoreError> {
    session.ok_or(StoreError::Unauthorized)
}

#[async_trait]
pub trait SessionResolver: Send + Sync {
    /// `Ok(None)` for an unknown or expired token.
    async fn resolve(&self, token: &str) -> Result<Option<Session>, StoreError>;
}

pub struct RedisSessionResolver {
    client: redis::Client,
}

impl RedisSessionResolver {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }
}

pub fn session_key(token: &str) -> String {
    format!("session:{token}")
}

#[async_trait]
impl SessionResolver for RedisSessionResolver {
    async fn resolve(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| StoreError::SessionBackend(e.to_string()))?;

        let raw: Option<String> = conn
            .get(session_key(token))
            .await
            .map_err(|e| StoreError::SessionBackend(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let session: Session = serde_json::from_str(&raw)
            .map_err(|e| StoreError::SessionBackend(format!("malformed session payload: {e}")))?;

        if session.is_expired(Utc::now()) {
            debug!("Session for {} has expired", session.user_id);
            return Ok(None);
        }
        Ok(Some(session))
    }
}
