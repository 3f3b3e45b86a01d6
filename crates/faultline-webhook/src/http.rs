use std::time::Duration;

use async_trait::async_trait;
use faultline_core::ConfigError;
use reqwest::{Client, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::embed::WebhookMessage;
use crate::errors::DeliveryError;
use crate::identity::{PartialWebhook, WebhookIdentity};
use crate::transport::WebhookTransport;

/// HTTP client behaviour for [`HttpWebhook`].
#[derive(Clone, Debug)]
pub struct HttpOptions {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            user_agent: format!("faultline/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Discord-compatible webhook over HTTPS.
pub struct HttpWebhook {
    client: Client,
    url: SecretString,
    bot_token: Option<SecretString>,
    partial: PartialWebhook,
}

impl HttpWebhook {
    pub fn new(
        url: &str,
        bot_token: Option<&str>,
        options: &HttpOptions,
    ) -> Result<Self, ConfigError> {
        let partial = PartialWebhook::parse(url)?;
        let client = Client::builder()
            .connect_timeout(options.connect_timeout)
            .timeout(options.request_timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            client,
            url: SecretString::from(url.to_string()),
            bot_token: bot_token.map(|t| SecretString::from(t.to_string())),
            partial,
        })
    }

    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.bot_token {
            Some(token) => req.header("Authorization", format!("Bot {}", token.expose_secret())),
            None => req,
        }
    }
}

/// Turn a non-2xx response into a classified error.
async fn check_status(response: Response) -> Result<Response, DeliveryError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(DeliveryError::from_status(status.as_u16(), body))
}

#[async_trait]
impl WebhookTransport for HttpWebhook {
    fn partial(&self) -> &PartialWebhook {
        &self.partial
    }

    async fn fetch_identity(&self) -> Result<WebhookIdentity, DeliveryError> {
        debug!(webhook_id = %self.partial.id, "fetching webhook");
        let req = self.authorize(self.client.get(self.url.expose_secret()));
        let response = check_status(req.send().await?).await?;
        response
            .json::<WebhookIdentity>()
            .await
            .map_err(|e| DeliveryError::Decode(e.to_string()))
    }

    async fn execute(&self, message: &WebhookMessage) -> Result<(), DeliveryError> {
        debug!(
            webhook_id = %self.partial.id,
            embeds = message.embeds.len(),
            "executing webhook"
        );
        let req = self
            .client
            .post(self.url.expose_secret())
            .query(&[("wait", "true")])
            .json(message);
        check_status(self.authorize(req).send().await?).await?;
        Ok(())
    }
}
