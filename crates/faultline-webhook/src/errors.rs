use std::time::Duration;

/// Failure to deliver a report to the webhook.
///
/// Deliveries are best-effort: nothing here is retried by the pipeline.
#[derive(Clone, Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request timed out: {0}")]
    Timeout(String),
    #[error("webhook rejected credentials: {0}")]
    Unauthorized(String),
    #[error("invalid webhook identity: {0}")]
    InvalidIdentity(String),
    #[error("webhook rejected payload: {0}")]
    InvalidPayload(String),
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode webhook response: {0}")]
    Decode(String),
}

impl DeliveryError {
    /// Short classification string for logging.
    pub fn error_kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Unauthorized(_) => "unauthorized",
            Self::InvalidIdentity(_) => "invalid_identity",
            Self::InvalidPayload(_) => "invalid_payload",
            Self::RateLimited { .. } => "rate_limited",
            Self::Status { .. } => "status",
            Self::Decode(_) => "decode",
        }
    }

    /// Classify a non-2xx webhook response.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 | 403 => Self::Unauthorized(body),
            404 => Self::InvalidIdentity(format!("webhook not found: {body}")),
            400 | 413 => Self::InvalidPayload(body),
            429 => Self::RateLimited {
                retry_after: retry_after_from_body(&body),
            },
            _ => Self::Status { status, body },
        }
    }
}

/// Rate-limit bodies carry `retry_after` in (fractional) seconds.
fn retry_after_from_body(body: &str) -> Option<Duration> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    let secs = value.get("retry_after")?.as_f64()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

impl From<reqwest::Error> for DeliveryError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::Decode(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_mapping() {
        assert!(matches!(
            DeliveryError::from_status(401, "unauthorized".into()),
            DeliveryError::Unauthorized(_)
        ));
        assert!(matches!(
            DeliveryError::from_status(403, "forbidden".into()),
            DeliveryError::Unauthorized(_)
        ));
        assert!(matches!(
            DeliveryError::from_status(404, "Unknown Webhook".into()),
            DeliveryError::InvalidIdentity(_)
        ));
        assert!(matches!(
            DeliveryError::from_status(400, "embeds[0].description".into()),
            DeliveryError::InvalidPayload(_)
        ));
        assert!(matches!(
            DeliveryError::from_status(502, "bad gateway".into()),
            DeliveryError::Status { status: 502, .. }
        ));
    }

    #[test]
    fn rate_limit_reads_retry_after() {
        let body = r#"{"message": "You are being rate limited.", "retry_after": 1.5, "global": false}"#;
        match DeliveryError::from_status(429, body.into()) {
            DeliveryError::RateLimited { retry_after } => {
                assert_eq!(retry_after, Some(Duration::from_millis(1500)));
            }
            other => panic!("expected RateLimited, got {other:?}"),
        }

        match DeliveryError::from_status(429, "slow down".into()) {
            DeliveryError::RateLimited { retry_after } => assert!(retry_after.is_none()),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn error_kind_strings() {
        assert_eq!(DeliveryError::Network("reset".into()).error_kind(), "network");
        assert_eq!(
            DeliveryError::RateLimited { retry_after: None }.error_kind(),
            "rate_limited"
        );
        assert_eq!(
            DeliveryError::Status { status: 500, body: String::new() }.error_kind(),
            "status"
        );
    }

    #[test]
    fn display_includes_status_and_body() {
        let err = DeliveryError::from_status(500, "internal".into());
        assert_eq!(err.to_string(), "unexpected status 500: internal");
    }
}
