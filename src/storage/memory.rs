use super::{ReplayActionRow, ReplaySession, ReplayStore, StoreError, StoreResult};
use crate::codec::EncodedAction;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex as ParkingMutex;
use std::collections::HashMap;
use uuid::Uuid;

/// Replay store kept entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    sessions: ParkingMutex<HashMap<Uuid, ReplaySession>>,
    actions: ParkingMutex<Vec<ReplayActionRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    /// Sessions owned by a user, most recent first
    pub fn sessions_for_user(&self, user_id: &str) -> Vec<ReplaySession> {
        let mut sessions: Vec<ReplaySession> = self
            .sessions
            .lock()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions
    }
}

#[async_trait]
impl ReplayStore for MemoryStore {
    async fn upsert_session(&self, id: Uuid, user_id: &str, now: DateTime<Utc>) -> StoreResult<ReplaySession> {
        let mut sessions = self.sessions.lock();
        let session = sessions.entry(id).or_insert_with(|| ReplaySession {
            id,
            user_id: user_id.to_string(),
            started_at: now,
            ended_at: now,
        });
        if now > session.ended_at {
            session.ended_at = now;
        }
        Ok(session.clone())
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<ReplaySession>> {
        Ok(self.sessions.lock().get(&id).cloned())
    }

    async fn create_actions(&self, rows: Vec<ReplayActionRow>) -> StoreResult<usize> {
        {
            let sessions = self.sessions.lock();
            if let Some(orphan) = rows.iter().find(|row| !sessions.contains_key(&row.session_id)) {
                return Err(StoreError::SessionNotFound(orphan.session_id));
            }
        }

        let count = rows.len();
        self.actions.lock().extend(rows);
        Ok(count)
    }

    async fn find_actions(&self, session_id: Uuid) -> StoreResult<Vec<EncodedAction>> {
        let mut rows: Vec<ReplayActionRow> = self
            .actions
            .lock()
            .iter()
            .filter(|row| row.session_id == session_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps
        rows.sort_by_key(|row| row.ts);
        Ok(rows.into_iter().map(ReplayActionRow::into_encoded).collect())
    }
}
