use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::embed::WebhookMessage;
use crate::errors::DeliveryError;
use crate::identity::{PartialWebhook, WebhookIdentity};
use crate::transport::WebhookTransport;

pub const MOCK_WEBHOOK_ID: &str = "100000000000000001";
const MOCK_TOKEN: &str = "mock-token";

/// Pre-programmed outcome for one transport call.
pub enum MockResponse {
    Ok,
    Error(DeliveryError),
    /// Wait a duration, then resolve the inner response.
    Delay(Duration, Box<MockResponse>),
}

impl MockResponse {
    pub fn delayed(delay: Duration, inner: MockResponse) -> Self {
        Self::Delay(delay, Box::new(inner))
    }
}

/// In-memory webhook that records every message and counts identity fetches.
///
/// Calls with no queued response succeed.
pub struct MockTransport {
    partial: PartialWebhook,
    identity: WebhookIdentity,
    fetch_responses: Mutex<VecDeque<MockResponse>>,
    execute_responses: Mutex<VecDeque<MockResponse>>,
    sent: Mutex<Vec<WebhookMessage>>,
    fetch_count: AtomicUsize,
    execute_count: AtomicUsize,
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            partial: PartialWebhook::new(MOCK_WEBHOOK_ID, MOCK_TOKEN),
            identity: WebhookIdentity {
                id: MOCK_WEBHOOK_ID.to_string(),
                name: Some("error-log".to_string()),
                avatar: None,
                channel_id: Some("200000000000000002".to_string()),
                guild_id: Some("300000000000000003".to_string()),
                token: Some(MOCK_TOKEN.to_string()),
            },
            fetch_responses: Mutex::new(VecDeque::new()),
            execute_responses: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            fetch_count: AtomicUsize::new(0),
            execute_count: AtomicUsize::new(0),
        }
    }

    /// Replace the identity returned by successful fetches.
    pub fn with_identity(mut self, identity: WebhookIdentity) -> Self {
        self.identity = identity;
        self
    }

    pub fn push_fetch(&self, response: MockResponse) {
        self.fetch_responses.lock().push_back(response);
    }

    pub fn push_execute(&self, response: MockResponse) {
        self.execute_responses.lock().push_back(response);
    }

    pub fn fetch_count(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }

    pub fn execute_count(&self) -> usize {
        self.execute_count.load(Ordering::SeqCst)
    }

    /// Messages that were accepted, in arrival order.
    pub fn sent(&self) -> Vec<WebhookMessage> {
        self.sent.lock().clone()
    }
}

/// Resolve a response, sleeping through any delays first.
async fn resolve(response: Option<MockResponse>) -> Result<(), DeliveryError> {
    let mut current = response.unwrap_or(MockResponse::Ok);
    loop {
        match current {
            MockResponse::Ok => return Ok(()),
            MockResponse::Error(e) => return Err(e),
            MockResponse::Delay(duration, inner) => {
                tokio::time::sleep(duration).await;
                current = *inner;
            }
        }
    }
}

#[async_trait]
impl WebhookTransport for MockTransport {
    fn partial(&self) -> &PartialWebhook {
        &self.partial
    }

    async fn fetch_identity(&self) -> Result<WebhookIdentity, DeliveryError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        let response = self.fetch_responses.lock().pop_front();
        resolve(response).await?;
        Ok(self.identity.clone())
    }

    async fn execute(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        self.execute_count.fetch_add(1, Ordering::SeqCst);
        let response = self.execute_responses.lock().pop_front();
        resolve(response).await?;
        self.sent.lock().push(message.clone());
        Ok(())
    }
}
