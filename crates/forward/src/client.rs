//! HTTP delivery to the destination gateway.

use std::time::Duration;

use {
    chrono::{DateTime, Utc},
    reqwest::{Client, StatusCode},
    serde::{Deserialize, Serialize},
    tracing::{debug, error, info},
    url::Url,
};

use chanrelay_common::IncomingMessage;

use crate::{
    error::{Error, ForwardError, Result, UNKNOWN_REASON},
    stats::RelayStats,
};

/// Destination used when no endpoint is configured.
pub const DEFAULT_FORWARD_URL: &str = "http://localhost:3000/api/forward";

/// Budget for a single forward call, connect through body.
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(30);

/// Payload posted to the destination API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForwardRequest {
    pub text: String,
    pub channel_name: String,
    pub channel_id: String,
    pub message_id: i64,
    pub timestamp: DateTime<Utc>,
}

impl ForwardRequest {
    /// Build the payload for `message` carrying the already formatted `text`.
    pub fn from_message(message: &IncomingMessage, text: String) -> Result<Self> {
        if message.channel_id.trim().is_empty() {
            return Err(Error::invalid_message("message has no channel id"));
        }
        Ok(Self {
            text,
            channel_name: message.channel_name.clone(),
            channel_id: message.channel_id.clone(),
            message_id: message.message_id,
            timestamp: message.received_at,
        })
    }
}

/// Body returned by the destination API.
#[derive(Debug, Deserialize)]
struct ForwardResponse {
    #[serde(default)]
    success: serde_json::Value,
    #[serde(default)]
    message: Option<String>,
}

fn is_truthy(value: &serde_json::Value) -> bool {
    use serde_json::Value;
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Posts [`ForwardRequest`]s to the destination and accounts for the result.
#[derive(Debug, Clone)]
pub struct ForwardingClient {
    client: Client,
    endpoint: Url,
}

impl ForwardingClient {
    /// Create a client for `endpoint` with the standard [`FORWARD_TIMEOUT`].
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|source| Error::InvalidEndpoint {
            url: endpoint.to_string(),
            source,
        })?;
        let client = Client::builder().timeout(FORWARD_TIMEOUT).build()?;
        Ok(Self::with_client(client, endpoint))
    }

    /// Use a preconfigured reqwest client (custom timeout, proxy, ...).
    pub fn with_client(client: Client, endpoint: Url) -> Self {
        Self { client, endpoint }
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Deliver `request` and record the outcome in `stats`.
    ///
    /// Success bumps `messages_forwarded`; every failure bumps `errors`. The
    /// caller persists `stats`.
    pub async fn forward(
        &self,
        request: &ForwardRequest,
        stats: &mut RelayStats,
    ) -> std::result::Result<(), ForwardError> {
        match self.send(request).await {
            Ok(()) => {
                stats.record_forwarded();
                info!(
                    channel_id = %request.channel_id,
                    channel = %request.channel_name,
                    message_id = request.message_id,
                    "message forwarded"
                );
                Ok(())
            },
            Err(e) => {
                stats.record_error();
                error!(
                    channel_id = %request.channel_id,
                    channel = %request.channel_name,
                    message_id = request.message_id,
                    reason = e.reason().unwrap_or(UNKNOWN_REASON),
                    error = %e,
                    "failed to forward message"
                );
                Err(e)
            },
        }
    }

    /// One POST, no bookkeeping. Only HTTP 200 with a truthy `success` counts
    /// as delivered.
    pub async fn send(&self, request: &ForwardRequest) -> std::result::Result<(), ForwardError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;
        debug!(status = status.as_u16(), bytes = body.len(), "forward response");

        let parsed = serde_json::from_slice::<ForwardResponse>(&body);
        if status != StatusCode::OK {
            return Err(ForwardError::Status {
                status: status.as_u16(),
                message: parsed.ok().and_then(|r| r.message),
            });
        }

        let parsed = parsed.map_err(|source| ForwardError::MalformedResponse { source })?;
        if !is_truthy(&parsed.success) {
            return Err(ForwardError::Rejected {
                message: parsed.message,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        chrono::TimeZone,
        mockito::Matcher,
        serde_json::json,
    };

    fn request() -> ForwardRequest {
        ForwardRequest {
            text: "promo code...".into(),
            channel_name: "Deals".into(),
            channel_id: "42".into(),
            message_id: 7,
            timestamp: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    fn client_for(server: &mockito::Server) -> ForwardingClient {
        ForwardingClient::new(&format!("{}/api/forward", server.url())).unwrap()
    }

    #[test]
    fn payload_uses_camel_case_keys() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(
            value,
            json!({
                "text": "promo code...",
                "channelName": "Deals",
                "channelId": "42",
                "messageId": 7,
                "timestamp": "2025-01-02T03:04:05Z"
            })
        );
    }

    #[test]
    fn request_requires_channel_id() {
        let msg = IncomingMessage::new("  ", Some("Deals"), 1, "hi");
        assert!(matches!(
            ForwardRequest::from_message(&msg, "hi".into()),
            Err(Error::InvalidMessage { .. })
        ));
    }

    #[test]
    fn request_copies_message_fields() {
        let msg = IncomingMessage::new("42", Some("Deals"), 9, "original");
        let req = ForwardRequest::from_message(&msg, "formatted".into()).unwrap();
        assert_eq!(req.text, "formatted");
        assert_eq!(req.channel_id, "42");
        assert_eq!(req.channel_name, "Deals");
        assert_eq!(req.message_id, 9);
        assert_eq!(req.timestamp, msg.received_at);
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        assert!(matches!(
            ForwardingClient::new("not a url"),
            Err(Error::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn truthiness() {
        assert!(is_truthy(&json!(true)));
        assert!(is_truthy(&json!(1)));
        assert!(is_truthy(&json!("ok")));
        assert!(!is_truthy(&json!(false)));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(null)));
    }

    #[tokio::test]
    async fn success_counts_forwarded() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/forward")
            .match_header("content-type", "application/json")
            .match_body(Matcher::PartialJson(json!({
                "text": "promo code...",
                "channelId": "42",
                "messageId": 7
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"success": true, "message": "sent"}"#)
            .create_async()
            .await;

        let mut stats = RelayStats::default();
        client_for(&server)
            .forward(&request(), &mut stats)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(stats.messages_forwarded, 1);
        assert_eq!(stats.errors, 0);
    }

    #[tokio::test]
    async fn success_false_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/forward")
            .with_status(200)
            .with_body(r#"{"success": false, "message": "WhatsApp is not ready"}"#)
            .create_async()
            .await;

        let mut stats = RelayStats::default();
        let err = client_for(&server)
            .forward(&request(), &mut stats)
            .await
            .unwrap_err();

        assert!(matches!(err, ForwardError::Rejected { .. }));
        assert_eq!(err.reason(), Some("WhatsApp is not ready"));
        assert_eq!(stats.messages_forwarded, 0);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn missing_success_field_is_rejected() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/forward")
            .with_status(200)
            .with_body(r#"{"message": "queued?"}"#)
            .create_async()
            .await;

        let mut stats = RelayStats::default();
        let err = client_for(&server)
            .forward(&request(), &mut stats)
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Rejected { .. }));
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn non_200_status_is_an_error_even_with_success_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/forward")
            .with_status(201)
            .with_body(r#"{"success": true}"#)
            .create_async()
            .await;

        let mut stats = RelayStats::default();
        let err = client_for(&server)
            .forward(&request(), &mut stats)
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::Status { status: 201, .. }));
        assert_eq!(stats.messages_forwarded, 0);
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn server_error_reports_destination_message() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/forward")
            .with_status(400)
            .with_body(r#"{"success": false, "message": "text is required"}"#)
            .create_async()
            .await;

        let mut stats = RelayStats::default();
        let err = client_for(&server)
            .forward(&request(), &mut stats)
            .await
            .unwrap_err();
        match err {
            ForwardError::Status { status, message } => {
                assert_eq!(status, 400);
                assert_eq!(message.as_deref(), Some("text is required"));
            },
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn malformed_body_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/api/forward")
            .with_status(200)
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let mut stats = RelayStats::default();
        let err = client_for(&server)
            .forward(&request(), &mut stats)
            .await
            .unwrap_err();
        assert!(matches!(err, ForwardError::MalformedResponse { .. }));
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn connection_refused_is_an_error() {
        // Bind then drop a listener so the port is very likely closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = ForwardingClient::new(&format!("http://{addr}/api/forward")).unwrap();
        let mut stats = RelayStats::default();
        let err = client.forward(&request(), &mut stats).await.unwrap_err();
        assert!(matches!(err, ForwardError::Transport(_)));
        assert_eq!(stats.errors, 1);
    }

    #[tokio::test]
    async fn timeout_is_reported_as_timeout() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        // Accept and never answer.
        let server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let client = ForwardingClient::with_client(
            Client::builder()
                .timeout(Duration::from_millis(100))
                .build()
                .unwrap(),
            Url::parse(&format!("http://{addr}/api/forward")).unwrap(),
        );
        let mut stats = RelayStats::default();
        let err = client.forward(&request(), &mut stats).await.unwrap_err();
        assert!(matches!(err, ForwardError::Timeout), "{err:?}");
        assert_eq!(stats.errors, 1);
        server.abort();
    }
}
