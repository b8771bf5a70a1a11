//! Transport boundary between the capture pipeline and storage
//!
//! The buffer only knows [`Uploader`]; the replay loader only knows
//! [`ActionSource`]. [`http::HttpTransport`] implements both over HTTP and
//! [`crate::storage::StoreBackend`] implements both in process.

pub mod http;

pub use http::HttpTransport;

use crate::codec::EncodedAction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// Body of an upload request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub session_id: Uuid,
    pub actions: Vec<EncodedAction>,
}

/// Body of a retrieval response, actions in capture order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionActions {
    pub actions: Vec<EncodedAction>,
}

/// Persists a batch of encoded actions. A batch succeeds or fails as a whole.
#[async_trait]
pub trait Uploader: Send + Sync {
    async fn upload(&self, session_id: Uuid, actions: &[EncodedAction]) -> TransportResult<()>;
}

/// Reads back the encoded actions of a session
#[async_trait]
pub trait ActionSource: Send + Sync {
    async fn fetch(&self, session_id: Uuid) -> TransportResult<Vec<EncodedAction>>;
}
