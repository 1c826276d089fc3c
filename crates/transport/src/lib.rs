//! HTTP push gateway client.
//!
//! Herald does not speak a vendor push protocol itself; deliveries are
//! POSTed to an internal push gateway that fans out to the platform services
//! (APNs, FCM, web push). This crate implements the engine's transport seam
//! over that gateway and maps its responses onto the closed [`SendError`]
//! taxonomy the retry processor records.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use herald_common::config::AppConfig;
use herald_common::push::{PushTransport, SendError};
use herald_common::types::PushPayload;

/// Delivery request body accepted by the push gateway.
#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    to: &'a str,
    #[serde(flatten)]
    payload: &'a PushPayload,
}

/// reqwest-backed transport POSTing deliveries to the configured gateway.
pub struct HttpPushTransport {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpPushTransport {
    pub fn new(
        endpoint: String,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            auth_token,
        })
    }

    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(
            config.push_gateway_url.clone(),
            config.push_gateway_token.clone(),
            Duration::from_secs(config.push_timeout_secs),
        )
    }

    /// Map a gateway HTTP status onto the transport error taxonomy.
    ///
    /// `None` means the delivery was accepted. 404/410 mean the token is
    /// gone at the platform service; 400 means the gateway rejected the
    /// token format outright.
    fn classify_status(status: u16) -> Option<SendError> {
        match status {
            200..=299 => None,
            400 => Some(SendError::InvalidToken),
            404 | 410 => Some(SendError::Unregistered),
            429 => Some(SendError::RateLimited),
            other => Some(SendError::Gateway { status: other }),
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushTransport {
    async fn send(&self, destination_token: &str, payload: &PushPayload) -> Result<(), SendError> {
        let mut request = self.client.post(&self.endpoint).json(&PushRequest {
            to: destination_token,
            payload,
        });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                SendError::Timeout
            } else if e.is_connect() {
                SendError::Network(e.to_string())
            } else {
                SendError::Unavailable(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        match Self::classify_status(status) {
            None => Ok(()),
            Some(err) => {
                tracing::debug!(status, code = err.code(), "Push gateway rejected delivery");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_statuses_accepted() {
        assert!(HttpPushTransport::classify_status(200).is_none());
        assert!(HttpPushTransport::classify_status(202).is_none());
    }

    #[test]
    fn test_token_errors_classified() {
        assert!(matches!(
            HttpPushTransport::classify_status(400),
            Some(SendError::InvalidToken)
        ));
        assert!(matches!(
            HttpPushTransport::classify_status(404),
            Some(SendError::Unregistered)
        ));
        assert!(matches!(
            HttpPushTransport::classify_status(410),
            Some(SendError::Unregistered)
        ));
    }

    #[test]
    fn test_rate_limit_and_server_errors_classified() {
        assert!(matches!(
            HttpPushTransport::classify_status(429),
            Some(SendError::RateLimited)
        ));
        assert!(matches!(
            HttpPushTransport::classify_status(500),
            Some(SendError::Gateway { status: 500 })
        ));
        assert!(matches!(
            HttpPushTransport::classify_status(503),
            Some(SendError::Gateway { status: 503 })
        ));
    }

    #[test]
    fn test_request_body_shape() {
        let payload = PushPayload {
            title: "Mentioned in #planning".to_string(),
            body: "@sam tagged you".to_string(),
            data: None,
        };
        let request = PushRequest {
            to: "device-token-1",
            payload: &payload,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], "device-token-1");
        assert_eq!(json["title"], "Mentioned in #planning");
        assert_eq!(json["body"], "@sam tagged you");
        assert!(json.get("data").is_none());
    }
}
