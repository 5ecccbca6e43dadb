//! HTTP client for the monitoring API.

use serde_json::Value;
use tracing::debug;
use url::form_urlencoded;

use crate::{RemoteAdapter, RemoteOperation, TransportError};

/// Production endpoint of the monitoring API.
pub const DEFAULT_BASE_URL: &str = "https://monitoringapi.solaredge.com";

/// Stands in for the API key in logged URLs.
const REDACTED_KEY: &str = "[API_KEY_HIDDEN]";

/// Monitoring API client bound to one site.
///
/// The API key travels as the `api_key` query parameter, so URLs built by this
/// client are secrets and are only logged in redacted form.
#[derive(Clone)]
pub struct SolarEdgeClient {
    http: reqwest::Client,
    api_key: String,
    site_id: u64,
    base_url: String,
}

impl std::fmt::Debug for SolarEdgeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolarEdgeClient")
            .field("site_id", &self.site_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SolarEdgeClient {
    /// Create a client for `site_id` against the production endpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn new(api_key: impl Into<String>, site_id: u64) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(TransportError::network)?;
        Ok(Self::with_http_client(http, api_key, site_id))
    }

    /// Create a client that sends requests through `http`.
    #[must_use]
    pub fn with_http_client(http: reqwest::Client, api_key: impl Into<String>, site_id: u64) -> Self {
        Self {
            http,
            api_key: api_key.into(),
            site_id,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at another endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// The site every operation is scoped to.
    #[must_use]
    pub const fn site_id(&self) -> u64 {
        self.site_id
    }

    /// The endpoint requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Full request URL for `operation`, API key included.
    #[must_use]
    pub fn url(&self, operation: &RemoteOperation) -> String {
        let key: String = form_urlencoded::byte_serialize(self.api_key.as_bytes()).collect();
        self.build_url(operation, &key)
    }

    /// Request URL for `operation` with the API key masked, for logging.
    #[must_use]
    pub fn redacted_url(&self, operation: &RemoteOperation) -> String {
        self.build_url(operation, REDACTED_KEY)
    }

    fn build_url(&self, operation: &RemoteOperation, key: &str) -> String {
        let mut url = format!("{}{}?", self.base_url, operation.path(self.site_id));
        let query = operation.query();
        if !query.is_empty() {
            let encoded = form_urlencoded::Serializer::new(String::new())
                .extend_pairs(query)
                .finish();
            url.push_str(&encoded);
            url.push('&');
        }
        url.push_str("api_key=");
        url.push_str(key);
        url
    }
}

impl RemoteAdapter for SolarEdgeClient {
    async fn call(&self, operation: RemoteOperation) -> Result<Value, TransportError> {
        debug!("Making request to: {}", self.redacted_url(&operation));

        let response = self
            .http
            .get(self.url(&operation))
            .send()
            .await
            .map_err(TransportError::network)?;

        let status = response.status();
        if !status.is_success() {
            debug!("{} answered {}", operation.name(), status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await.map_err(TransportError::network)?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{SystemUnits, TimeUnit};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn client(base_url: &str) -> SolarEdgeClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        SolarEdgeClient::with_http_client(http, "SECRETKEY123", 42).with_base_url(base_url)
    }

    /// Accept one connection, answer it with `status_line` and `body`, and
    /// return the request line that was received.
    async fn respond_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut chunk = [0_u8; 1024];
            loop {
                let read = socket.read(&mut chunk).await.unwrap();
                request.extend_from_slice(&chunk[..read]);
                if read == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (base_url, handle)
    }

    #[test]
    fn url_without_query_still_carries_the_key() {
        let client = client("https://example.test/");
        assert_eq!(
            client.url(&RemoteOperation::SiteOverview),
            "https://example.test/site/42/overview?api_key=SECRETKEY123"
        );
        assert_eq!(
            client.url(&RemoteOperation::EnvironmentalBenefits { system_units: None }),
            "https://example.test/site/42/envBenefits?api_key=SECRETKEY123"
        );
    }

    #[test]
    fn url_encodes_query_before_the_key() {
        let client = client("https://example.test");
        let op = RemoteOperation::SitePower {
            start_time: "2024-05-01 00:00:00".to_string(),
            end_time: "2024-05-08 00:00:00".to_string(),
        };
        assert_eq!(
            client.url(&op),
            "https://example.test/site/42/power?startTime=2024-05-01+00%3A00%3A00&endTime=2024-05-08+00%3A00%3A00&api_key=SECRETKEY123"
        );

        let op = RemoteOperation::SiteEnergy {
            start_date: "2024-05-01".to_string(),
            end_date: "2024-05-31".to_string(),
            time_unit: Some(TimeUnit::Day),
        };
        assert_eq!(
            client.url(&op),
            "https://example.test/site/42/energy?startDate=2024-05-01&endDate=2024-05-31&timeUnit=DAY&api_key=SECRETKEY123"
        );
    }

    #[test]
    fn redacted_url_and_debug_hide_the_key() {
        let client = client("https://example.test");
        let op = RemoteOperation::EnvironmentalBenefits {
            system_units: Some(SystemUnits::Imperial),
        };
        assert_eq!(
            client.redacted_url(&op),
            "https://example.test/site/42/envBenefits?systemUnits=Imperial&api_key=[API_KEY_HIDDEN]"
        );
        assert!(!format!("{client:?}").contains("SECRETKEY123"));
    }

    #[tokio::test]
    async fn successful_response_is_parsed() {
        let (base_url, server) =
            respond_once("HTTP/1.1 200 OK", r#"{"overview":{"currentPower":{"power":1234.5}}}"#)
                .await;

        let value = client(&base_url)
            .call(RemoteOperation::SiteOverview)
            .await
            .unwrap();
        assert_eq!(value, json!({"overview": {"currentPower": {"power": 1234.5}}}));

        let request_line = server.await.unwrap();
        assert_eq!(
            request_line,
            "GET /site/42/overview?api_key=SECRETKEY123 HTTP/1.1"
        );
    }

    #[tokio::test]
    async fn error_status_is_reported_with_code_and_reason() {
        let (base_url, server) = respond_once("HTTP/1.1 403 Forbidden", "{}").await;

        let error = client(&base_url)
            .call(RemoteOperation::SiteDetails)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "API request failed: 403 Forbidden");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn non_json_body_is_a_decode_error() {
        let (base_url, server) = respond_once("HTTP/1.1 200 OK", "<html>oops</html>").await;

        let error = client(&base_url)
            .call(RemoteOperation::Inventory)
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::Decode(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_failures_do_not_leak_the_key() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let error = client(&base_url)
            .call(RemoteOperation::SiteOverview)
            .await
            .unwrap_err();
        assert!(matches!(error, TransportError::Network(_)));
        let message = error.to_string();
        assert!(message.starts_with("Request failed: "));
        assert!(!message.contains("SECRETKEY123"));
    }
}
