//! Chat backend strategies: remote RPC calls or a local demo simulation.
//!
//! Both modes implement the same `ChatBackend` trait so the chat loop never
//! branches on connectivity. The demo backend fabricates replies locally
//! and tracks a client-only quota counter -- nothing persists and no server
//! call is made.

use std::time::Duration;

use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use parley_types::chat::{ChatMessage, ChatSession, MessageExchange, MessageRole};
use parley_types::quota::QuotaStatus;

/// Sentinel token used by the demo backend; never sent anywhere.
const DEMO_TOKEN: &str = "demo_session_token";

/// Fixed delay before a fabricated demo reply appears.
const DEMO_REPLY_DELAY: Duration = Duration::from_millis(1200);

/// Strategy trait for the chat loop's backend.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait ChatBackend: Send {
    /// Short mode label shown in the banner.
    fn mode(&self) -> &'static str;

    /// Acquire a session token and return the initial quota status.
    fn start(
        &mut self,
    ) -> impl std::future::Future<Output = anyhow::Result<QuotaStatus>> + Send;

    /// Send a message, creating the chat session on first use.
    fn send(
        &mut self,
        content: &str,
    ) -> impl std::future::Future<Output = anyhow::Result<MessageExchange>> + Send;

    /// Fetch the current quota status.
    fn quota(
        &mut self,
    ) -> impl std::future::Future<Output = anyhow::Result<QuotaStatus>> + Send;
}

// ---------------------------------------------------------------------------
// Remote backend
// ---------------------------------------------------------------------------

/// Envelope shape returned by every API endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    code: String,
    message: String,
}

/// Payload of POST /api/v1/anonymous-sessions. The embedded quota record is
/// ignored; the client re-fetches status through the quota endpoint.
#[derive(Debug, Deserialize)]
struct AnonymousGrant {
    session_token: String,
}

/// Backend that talks to a running Parley server over HTTP.
pub struct RemoteBackend {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
    session_id: Option<Uuid>,
}

impl RemoteBackend {
    /// Create a backend for the given server base URL.
    pub fn new(base_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token: None,
            session_id: None,
        }
    }

    /// Probe the server's health endpoint. `false` means the caller should
    /// fall back to demo mode.
    pub async fn probe(base_url: &str) -> bool {
        let url = format!("{}/health", base_url.trim_end_matches('/'));
        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(2))
            .build()
        {
            Ok(client) => client,
            Err(_) => return false,
        };
        matches!(client.get(&url).send().await, Ok(resp) if resp.status().is_success())
    }

    fn token(&self) -> anyhow::Result<&str> {
        self.token
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("backend not started"))
    }

    async fn unwrap_data<T: DeserializeOwned>(resp: reqwest::Response) -> anyhow::Result<T> {
        let envelope: Envelope<T> = resp.json().await?;
        if let Some(err) = envelope.errors.first() {
            anyhow::bail!("{} ({})", err.message, err.code);
        }
        envelope
            .data
            .ok_or_else(|| anyhow::anyhow!("empty response payload"))
    }

    async fn ensure_session(&mut self) -> anyhow::Result<Uuid> {
        if let Some(id) = self.session_id {
            return Ok(id);
        }

        let token = self.token()?.to_string();
        let resp = self
            .http
            .post(format!("{}/api/v1/sessions", self.base_url))
            .json(&serde_json::json!({ "session_token": token }))
            .send()
            .await?;
        let session: ChatSession = Self::unwrap_data(resp).await?;
        self.session_id = Some(session.id);
        Ok(session.id)
    }
}

impl ChatBackend for RemoteBackend {
    fn mode(&self) -> &'static str {
        "remote"
    }

    async fn start(&mut self) -> anyhow::Result<QuotaStatus> {
        let resp = self
            .http
            .post(format!("{}/api/v1/anonymous-sessions", self.base_url))
            .send()
            .await?;
        let grant: AnonymousGrant = Self::unwrap_data(resp).await?;
        self.token = Some(grant.session_token);
        self.quota().await
    }

    async fn send(&mut self, content: &str) -> anyhow::Result<MessageExchange> {
        let session_id = self.ensure_session().await?;
        let token = self.token()?.to_string();

        let resp = self
            .http
            .post(format!(
                "{}/api/v1/sessions/{session_id}/messages",
                self.base_url
            ))
            .json(&serde_json::json!({
                "content": content,
                "session_token": token,
            }))
            .send()
            .await?;
        Self::unwrap_data(resp).await
    }

    async fn quota(&mut self) -> anyhow::Result<QuotaStatus> {
        let token = self.token()?.to_string();
        let resp = self
            .http
            .get(format!("{}/api/v1/quota/{token}", self.base_url))
            .send()
            .await?;
        Self::unwrap_data(resp).await
    }
}

// ---------------------------------------------------------------------------
// Demo backend
// ---------------------------------------------------------------------------

/// Fully local simulation used when the backend is unreachable.
pub struct DemoBackend {
    session_id: Uuid,
    count: u32,
    limit: u32,
}

impl DemoBackend {
    /// Create a demo backend with the given message limit.
    pub fn new(limit: u32) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            count: 0,
            limit,
        }
    }
}

impl ChatBackend for DemoBackend {
    fn mode(&self) -> &'static str {
        "demo"
    }

    async fn start(&mut self) -> anyhow::Result<QuotaStatus> {
        tracing::debug!(token = DEMO_TOKEN, "Demo backend started");
        Ok(QuotaStatus::from_count(self.count, self.limit))
    }

    async fn send(&mut self, content: &str) -> anyhow::Result<MessageExchange> {
        if self.count >= self.limit {
            anyhow::bail!("message limit reached in demo mode");
        }

        tokio::time::sleep(DEMO_REPLY_DELAY).await;

        let now = Utc::now();
        let user_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: self.session_id,
            role: MessageRole::User,
            content: content.to_string(),
            created_at: now,
        };
        let assistant_message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: self.session_id,
            role: MessageRole::Assistant,
            content: "This is a demo response! The backend is not connected, so I can't \
                      provide real responses. Once the backend is running, you'll get \
                      actual conversations here."
                .to_string(),
            created_at: now,
        };

        self.count += 1;

        Ok(MessageExchange {
            user_message,
            assistant_message,
        })
    }

    async fn quota(&mut self) -> anyhow::Result<QuotaStatus> {
        Ok(QuotaStatus::from_count(self.count, self.limit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_demo_backend_counts_locally() {
        let mut backend = DemoBackend::new(2);
        let status = backend.start().await.unwrap();
        assert_eq!(status.remaining, 2);

        backend.send("hi").await.unwrap();
        backend.send("again").await.unwrap();

        let status = backend.quota().await.unwrap();
        assert!(!status.can_send);
        assert_eq!(status.count, 2);

        assert!(backend.send("over").await.is_err());
    }

    #[tokio::test]
    async fn test_demo_reply_is_fabricated() {
        let mut backend = DemoBackend::new(10);
        backend.start().await.unwrap();

        let exchange = backend.send("hello").await.unwrap();
        assert_eq!(exchange.user_message.content, "hello");
        assert_eq!(exchange.assistant_message.role, MessageRole::Assistant);
        assert!(exchange.assistant_message.content.contains("demo response"));
    }
}
