use std::sync::Arc;

use faultline_core::{fingerprint, ChunkEncoder, ConfigError, Occurrence};
use parking_lot::RwLock;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument};

use crate::embed::{HostIdentity, WebhookMessage};
use crate::errors::DeliveryError;
use crate::identity::WebhookIdentity;
use crate::report::{self, ReportPlan};
use crate::transport::WebhookTransport;

/// Most embeds a single webhook execution accepts.
pub const MAX_EMBEDS_PER_MESSAGE: usize = 10;

/// Sends failure reports through a webhook.
///
/// - The webhook identity is fetched on the first release and cached for the
///   life of the client; concurrent first releases share one fetch.
/// - The messages of one release go out back to back: no other release can
///   slip a message in between.
pub struct DeliveryClient {
    transport: Arc<dyn WebhookTransport>,
    encoder: ChunkEncoder,
    batch_size: usize,
    host: RwLock<Option<HostIdentity>>,
    identity: OnceCell<WebhookIdentity>,
    send_lock: Mutex<()>,
}

impl DeliveryClient {
    pub fn new(
        transport: Arc<dyn WebhookTransport>,
        encoder: ChunkEncoder,
        batch_size: usize,
    ) -> Result<Self, ConfigError> {
        if !(1..=MAX_EMBEDS_PER_MESSAGE).contains(&batch_size) {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        Ok(Self {
            transport,
            encoder,
            batch_size,
            host: RwLock::new(None),
            identity: OnceCell::new(),
            send_lock: Mutex::new(()),
        })
    }

    pub fn with_host(self, host: HostIdentity) -> Self {
        self.set_host(host);
        self
    }

    /// Set or replace how the reporting process presents itself. Typically
    /// called once the host has logged in.
    pub fn set_host(&self, host: HostIdentity) {
        *self.host.write() = Some(host);
    }

    pub fn host(&self) -> Option<HostIdentity> {
        self.host.read().clone()
    }

    pub fn encoder(&self) -> &ChunkEncoder {
        &self.encoder
    }

    /// `None` while the webhook is still partial.
    pub fn cached_identity(&self) -> Option<&WebhookIdentity> {
        self.identity.get()
    }

    /// Resolve the webhook identity, fetching it only if it is still partial.
    ///
    /// A failed fetch is not cached; the next call tries again.
    pub async fn resolve_identity(&self) -> Result<&WebhookIdentity, DeliveryError> {
        self.identity
            .get_or_try_init(|| async {
                let partial = self.transport.partial();
                debug!(webhook_id = %partial.id, "resolving partial webhook");

                let identity = self.transport.fetch_identity().await?;
                if identity.id != partial.id {
                    return Err(DeliveryError::InvalidIdentity(format!(
                        "fetched webhook {} does not match configured webhook {}",
                        identity.id, partial.id
                    )));
                }
                if !identity.can_execute() {
                    return Err(DeliveryError::InvalidIdentity(format!(
                        "webhook {} has no token and cannot be executed",
                        identity.id
                    )));
                }

                info!(
                    webhook_id = %identity.id,
                    name = identity.name.as_deref().unwrap_or("unnamed"),
                    channel_id = identity.channel_id.as_deref().unwrap_or("unknown"),
                    "webhook identity resolved"
                );
                Ok(identity)
            })
            .await
    }

    /// Lay out the messages for one occurrence without sending anything.
    pub fn plan(&self, signature: &str, occurrence: &Occurrence) -> ReportPlan {
        let host = self.host.read();
        report::plan(&self.encoder, signature, occurrence, host.as_ref())
    }

    /// Deliver the report for `occurrence`: the primary message first, then
    /// the overflow chunks in batches of at most `batch_size` embeds.
    ///
    /// Transport errors are returned as-is; nothing is retried.
    #[instrument(
        skip_all,
        fields(fingerprint = %fingerprint(signature), occurrence = %occurrence.id)
    )]
    pub async fn release(
        &self,
        signature: &str,
        occurrence: &Occurrence,
    ) -> Result<(), DeliveryError> {
        let ReportPlan { primary, overflow } = self.plan(signature, occurrence);
        let host = self.host();

        self.resolve_identity().await?;

        let _guard = self.send_lock.lock().await;

        self.transport
            .execute(&WebhookMessage::new(vec![primary], host.as_ref()))
            .await?;

        let batches = overflow.chunks(self.batch_size);
        let batch_count = batches.len();
        for batch in batches {
            self.transport
                .execute(&WebhookMessage::new(batch.to_vec(), host.as_ref()))
                .await?;
        }

        debug!(
            overflow = overflow.len(),
            batches = batch_count,
            "report delivered"
        );
        Ok(())
    }
}
