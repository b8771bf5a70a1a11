//! HTTP transport backed by reqwest

use super::{ActionSource, SessionActions, TransportError, TransportResult, UploadRequest, Uploader};
use crate::codec::EncodedAction;
use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

const REPLAY_ENDPOINT: &str = "api/replay";

#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    /// Use a preconfigured client (timeouts, default headers, cookies)
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn upload_url(&self) -> String {
        format!("{}/{}", self.base_url, REPLAY_ENDPOINT)
    }

    fn session_url(&self, session_id: Uuid) -> String {
        format!(
            "{}/{}/{}",
            self.base_url,
            REPLAY_ENDPOINT,
            urlencoding::encode(&session_id.to_string())
        )
    }
}

#[async_trait]
impl Uploader for HttpTransport {
    async fn upload(&self, session_id: Uuid, actions: &[EncodedAction]) -> TransportResult<()> {
        let body = UploadRequest {
            session_id,
            actions: actions.to_vec(),
        };

        let response = self.client.post(self.upload_url()).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        tracing::debug!("Uploaded {} actions for session {}", actions.len(), session_id);
        Ok(())
    }
}

#[async_trait]
impl ActionSource for HttpTransport {
    async fn fetch(&self, session_id: Uuid) -> TransportResult<Vec<EncodedAction>> {
        let response = self.client.get(self.session_url(session_id)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body: SessionActions = response.json().await?;
        Ok(body.actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_strip_trailing_slash() {
        let transport = HttpTransport::new("https://app.example.com/");
        let id = Uuid::nil();

        assert_eq!(transport.upload_url(), "https://app.example.com/api/replay");
        assert_eq!(
            transport.session_url(id),
            "https://app.example.com/api/replay/00000000-0000-0000-0000-000000000000"
        );
    }
}
