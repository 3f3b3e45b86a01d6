use async_trait::async_trait;

use crate::embed::WebhookMessage;
use crate::errors::DeliveryError;
use crate::identity::{PartialWebhook, WebhookIdentity};

/// Outbound side of the pipeline: one webhook, addressed by its URL.
///
/// Implemented over HTTP by [`crate::HttpWebhook`] and in tests by
/// [`crate::mock::MockTransport`].
#[async_trait]
pub trait WebhookTransport: Send + Sync {
    /// Identity known without any network call.
    fn partial(&self) -> &PartialWebhook;

    /// Fetch the full webhook object.
    async fn fetch_identity(&self) -> Result<WebhookIdentity, DeliveryError>;

    /// Post one message (at most ten embeds).
    async fn execute(&self, message: &WebhookMessage) -> Result<(), DeliveryError>;
}
