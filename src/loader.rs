//! Retrieval path: stored actions back to commands

use crate::codec::decode;
use crate::command::{Command, CommandError};
use crate::upload::{ActionSource, TransportError};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to fetch session {session_id}: {source}")]
    Fetch {
        session_id: Uuid,
        #[source]
        source: TransportError,
    },

    #[error("Malformed action at position {index}: {source}")]
    Decode {
        index: usize,
        #[source]
        source: CommandError,
    },
}

/// Loading status of a session, for display
#[derive(Debug)]
pub enum LoadState {
    Loading,
    Ready(Vec<Command>),
    Failed(LoadError),
}

impl From<Result<Vec<Command>, LoadError>> for LoadState {
    fn from(result: Result<Vec<Command>, LoadError>) -> Self {
        match result {
            Ok(commands) => LoadState::Ready(commands),
            Err(e) => LoadState::Failed(e),
        }
    }
}

/// Fetch a session's actions and decode them in storage order.
///
/// Actions of kinds that have no replayable command are skipped. A payload
/// that cannot be read fails the whole load. Nothing is retried.
pub async fn load_session(source: &dyn ActionSource, session_id: Uuid) -> Result<Vec<Command>, LoadError> {
    let encoded = source
        .fetch(session_id)
        .await
        .map_err(|source| LoadError::Fetch { session_id, source })?;

    let mut commands = Vec::with_capacity(encoded.len());
    for (index, action) in encoded.iter().enumerate() {
        match Command::try_from(decode(action)) {
            Ok(command) => commands.push(command),
            Err(CommandError::Unsupported(kind)) => {
                tracing::debug!("Skipping non-replayable {} action at {}", kind, index);
            }
            Err(source) => return Err(LoadError::Decode { index, source }),
        }
    }

    tracing::info!(
        "Loaded {} of {} actions for session {}",
        commands.len(),
        encoded.len(),
        session_id
    );
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{encode, EncodedAction};
    use crate::upload::TransportResult;
    use async_trait::async_trait;
    use serde_json::{json, Map};

    struct FixedSource(TransportResult<Vec<EncodedAction>>);

    #[async_trait]
    impl ActionSource for FixedSource {
        async fn fetch(&self, _session_id: Uuid) -> TransportResult<Vec<EncodedAction>> {
            match &self.0 {
                Ok(actions) => Ok(actions.clone()),
                Err(_) => Err(TransportError::Status(500)),
            }
        }
    }

    #[tokio::test]
    async fn test_decodes_in_storage_order_and_skips_other_kinds() {
        let input = EncodedAction {
            t: "i".to_string(),
            ts: 1_500,
            d: Map::from_iter([("f".to_string(), json!("email"))]),
        };
        let source = FixedSource(Ok(vec![
            encode(&Command::route(1_000, "/feed").to_action()),
            input,
            encode(&Command::activate(1_700, "like-post").to_action()),
        ]));

        let commands = load_session(&source, Uuid::new_v4()).await.unwrap();

        assert_eq!(
            commands,
            vec![Command::route(1_000, "/feed"), Command::activate(1_700, "like-post")]
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_becomes_failed_state() {
        let source = FixedSource(Err(TransportError::Status(500)));

        let state = LoadState::from(load_session(&source, Uuid::nil()).await);

        assert!(matches!(state, LoadState::Failed(LoadError::Fetch { .. })));
    }

    #[tokio::test]
    async fn test_malformed_payload_reports_position() {
        let source = FixedSource(Ok(vec![
            encode(&Command::route(1, "/").to_action()),
            EncodedAction {
                t: "r".to_string(),
                ts: 2,
                d: Map::new(),
            },
        ]));

        let err = load_session(&source, Uuid::nil()).await.unwrap_err();
        assert!(matches!(err, LoadError::Decode { index: 1, .. }));
    }
}
