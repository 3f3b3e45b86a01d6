//! # faultline-reporter
//!
//! Wires settings, the webhook transport and the [`ErrorAggregator`] into a
//! cloneable [`Reporter`] handle for the host process.

pub mod aggregator;

pub use aggregator::{ErrorAggregator, SignatureSummary};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use faultline_core::ConfigError;
use faultline_settings::{FaultlineSettings, ReportSettings, SettingsError};
use faultline_webhook::{DeliveryClient, HostIdentity, HttpOptions, HttpWebhook, WebhookTransport};
use tokio::task::JoinHandle;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum ReporterError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Shared handle to one aggregation pipeline.
#[derive(Clone)]
pub struct Reporter {
    inner: Arc<ErrorAggregator>,
}

impl Reporter {
    pub fn new(aggregator: ErrorAggregator) -> Self {
        Self {
            inner: Arc::new(aggregator),
        }
    }

    /// Build the HTTP pipeline described by validated `settings`.
    pub fn from_settings(settings: &FaultlineSettings) -> Result<Self, ReporterError> {
        settings.validate()?;

        let webhook = &settings.webhook;
        let options = HttpOptions {
            connect_timeout: Duration::from_secs(webhook.connect_timeout_secs),
            request_timeout: Duration::from_secs(webhook.request_timeout_secs),
            user_agent: webhook.user_agent.clone(),
        };
        let transport = HttpWebhook::new(&webhook.url, webhook.bot_token.as_deref(), &options)?;

        info!(
            webhook_id = %transport.partial().id,
            wrap_len = settings.report.wrap_len,
            batch_size = settings.report.batch_size,
            "reporter configured"
        );
        Self::with_transport(Arc::new(transport), &settings.report)
    }

    /// Build a pipeline over any transport, e.g. a mock in tests.
    pub fn with_transport(
        transport: Arc<dyn WebhookTransport>,
        report: &ReportSettings,
    ) -> Result<Self, ReporterError> {
        let delivery = DeliveryClient::new(transport, report.encoder()?, report.batch_size)?;
        let aggregator = ErrorAggregator::new(delivery).with_history_limit(report.history_limit);
        Ok(Self::new(aggregator))
    }

    pub fn aggregator(&self) -> &ErrorAggregator {
        &self.inner
    }

    /// Set how the host presents itself in reports.
    pub fn set_host(&self, host: HostIdentity) {
        self.inner.delivery().set_host(host);
    }

    /// Spawn `future` and report it if it panics or is cancelled.
    ///
    /// The returned handle completes once the task has finished and any
    /// report has been sent.
    pub fn spawn<F>(&self, event_name: &'static str, future: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(future);
        let reporter = self.clone();
        tokio::spawn(async move {
            if let Err(err) = task.await {
                reporter
                    .inner
                    .report_join_error(err, None, Some(event_name))
                    .await;
            }
        })
    }
}

impl std::ops::Deref for Reporter {
    type Target = ErrorAggregator;

    fn deref(&self) -> &ErrorAggregator {
        &self.inner
    }
}
