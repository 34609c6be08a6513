//! Streaming reply client

use std::pin::Pin;

use async_stream::stream;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use tokio_stream::Stream;

use crate::config::BackendConfig;
use crate::decoder::{RecordDecoder, ReplyEvent};
use crate::error::{Error, Result};

/// One history entry as the backend expects it on the wire
#[derive(Debug, Clone, Serialize)]
pub struct OutboundMessage {
    pub role: String,
    pub content: String,
    pub timestamp: i64,
    pub id: String,
}

#[derive(Debug, Serialize)]
struct StreamRequest<'a> {
    messages: &'a [OutboundMessage],
}

/// A stream of decoded reply events
pub type ReplyStream = Pin<Box<dyn Stream<Item = Result<ReplyEvent>> + Send>>;

/// Seam between the conversation store and the remote backend
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Open one streaming request carrying the full message history.
    async fn stream_reply(&self, history: Vec<OutboundMessage>) -> Result<ReplyStream>;
}

/// reqwest-backed implementation of [`ChatBackend`]
pub struct BackendClient {
    client: reqwest::Client,
    config: BackendConfig,
}

impl BackendClient {
    /// Create a client for the given endpoints
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        if let Some(ref token) = self.config.auth_token {
            match format!("Bearer {}", token).parse() {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(err) => tracing::warn!(%err, "auth token is not a valid header value"),
            }
        }
        headers
    }
}

#[async_trait]
impl ChatBackend for BackendClient {
    async fn stream_reply(&self, history: Vec<OutboundMessage>) -> Result<ReplyStream> {
        tracing::debug!(
            url = %self.config.stream_url,
            messages = history.len(),
            "opening reply stream"
        );

        let response = self
            .client
            .post(&self.config.stream_url)
            .headers(self.headers())
            .json(&StreamRequest { messages: &history })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }
        // Only catches servers that announce `Content-Length: 0`. A
        // chunked response that closes without data bypasses this and
        // settles as an empty reply via the synthesized done below.
        if response.content_length() == Some(0) {
            return Err(Error::EmptyBody);
        }

        let mut body = response.bytes_stream();
        Ok(Box::pin(stream! {
            let mut decoder = RecordDecoder::new();
            while let Some(chunk) = body.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(err) => {
                        yield Err(Error::Http(err));
                        return;
                    }
                };
                for event in decoder.feed(&chunk) {
                    let terminal = matches!(event, Ok(ReplyEvent::Done) | Err(_));
                    yield event;
                    if terminal {
                        return;
                    }
                }
            }
            // Connection closed without a done record; settle the stream.
            yield Ok(ReplyEvent::Done);
        }))
    }
}
