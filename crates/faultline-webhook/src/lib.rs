pub mod delivery;
pub mod embed;
pub mod errors;
pub mod http;
pub mod identity;
pub mod report;
pub mod transport;

pub mod mock;

pub use delivery::{DeliveryClient, MAX_EMBEDS_PER_MESSAGE};
pub use embed::{Embed, EmbedAuthor, EmbedField, HostIdentity, WebhookMessage};
pub use errors::DeliveryError;
pub use http::{HttpOptions, HttpWebhook};
pub use identity::{PartialWebhook, WebhookIdentity};
pub use mock::{MockResponse, MockTransport};
pub use report::ReportPlan;
pub use transport::WebhookTransport;
