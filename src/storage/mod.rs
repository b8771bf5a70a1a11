//! Storage contract for replay sessions
//!
//! Persistence itself is an external relational store. This module captures
//! what the capture and replay paths need from it, the server-side ingest
//! rules, and an in-memory implementation.

pub mod memory;

pub use memory::MemoryStore;

use crate::codec::EncodedAction;
use crate::upload::{ActionSource, TransportError, TransportResult, UploadRequest, Uploader};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Session {0} belongs to another user")]
    SessionOwnership(Uuid),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Backend error: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplaySession {
    pub id: Uuid,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

/// One stored action, keyed to its session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayActionRow {
    pub session_id: Uuid,
    pub t: String,
    pub ts: i64,
    pub d: Map<String, Value>,
}

impl ReplayActionRow {
    pub fn new(session_id: Uuid, action: EncodedAction) -> Self {
        Self {
            session_id,
            t: action.t,
            ts: action.ts,
            d: action.d,
        }
    }

    pub fn into_encoded(self) -> EncodedAction {
        EncodedAction {
            t: self.t,
            ts: self.ts,
            d: self.d,
        }
    }
}

#[async_trait]
pub trait ReplayStore: Send + Sync {
    /// Create the session if it does not exist, otherwise advance `ended_at`
    async fn upsert_session(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> StoreResult<ReplaySession>;

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<ReplaySession>>;

    async fn create_actions(&self, rows: Vec<ReplayActionRow>) -> StoreResult<usize>;

    /// Actions of a session ordered by `ts`, ties in insertion order
    async fn find_actions(&self, session_id: Uuid) -> StoreResult<Vec<EncodedAction>>;
}

/// Persist an upload batch on behalf of an authenticated user.
///
/// Returns the number of stored actions.
pub async fn ingest(store: &dyn ReplayStore, user_id: &str, request: UploadRequest) -> StoreResult<usize> {
    if let Some(existing) = store.find_session(request.session_id).await? {
        if existing.user_id != user_id {
            return Err(StoreError::SessionOwnership(request.session_id));
        }
    }

    store.upsert_session(request.session_id, user_id, Utc::now()).await?;

    let rows = request
        .actions
        .into_iter()
        .map(|action| ReplayActionRow::new(request.session_id, action))
        .collect();
    let stored = store.create_actions(rows).await?;

    tracing::debug!("Stored {} actions for session {}", stored, request.session_id);
    Ok(stored)
}

/// In-process transport: uploads go straight to a store as `user_id`
#[derive(Clone)]
pub struct StoreBackend {
    store: Arc<dyn ReplayStore>,
    user_id: String,
}

impl StoreBackend {
    pub fn new(store: Arc<dyn ReplayStore>, user_id: impl Into<String>) -> Self {
        Self {
            store,
            user_id: user_id.into(),
        }
    }
}

impl From<StoreError> for TransportError {
    fn from(err: StoreError) -> Self {
        TransportError::Storage(err.to_string())
    }
}

#[async_trait]
impl Uploader for StoreBackend {
    async fn upload(&self, session_id: Uuid, actions: &[EncodedAction]) -> TransportResult<()> {
        let request = UploadRequest {
            session_id,
            actions: actions.to_vec(),
        };
        ingest(self.store.as_ref(), &self.user_id, request).await?;
        Ok(())
    }
}

#[async_trait]
impl ActionSource for StoreBackend {
    async fn fetch(&self, session_id: Uuid) -> TransportResult<Vec<EncodedAction>> {
        if self.store.find_session(session_id).await?.is_none() {
            return Err(StoreError::SessionNotFound(session_id).into());
        }
        Ok(self.store.find_actions(session_id).await?)
    }
}
