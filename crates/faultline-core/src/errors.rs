/// Misconfiguration detected while building pipeline components.
///
/// These are raised once at startup, never while reporting a failure.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("marker overhead {overhead} leaves no payload within wrap length {wrap_len}")]
    NoUsablePayload { wrap_len: usize, overhead: usize },
    #[error("batch size must be between 1 and 10, got {0}")]
    InvalidBatchSize(usize),
    #[error("invalid webhook url: {0}")]
    InvalidWebhookUrl(String),
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}
