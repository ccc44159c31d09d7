//! Transport for the OSM web services.
//!
//! Every call is a form-encoded POST. The application credentials (and the
//! user's credentials once authorised) lead the body; endpoint parameters
//! follow. Responses are JSON.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use super::query::{append_query, QueryParams};
use super::ApiError;
use crate::auth::Session;

// ============================================================================
// Constants
// ============================================================================

/// Base URL for the OSM web services
const DEFAULT_BASE_URL: &str = "https://osm.scouts.org.nz";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Where and how to reach the remote service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: REQUEST_TIMEOUT_SECS,
        }
    }
}

/// Authenticated connection to OSM.
/// Clone is cheap - reqwest::Client and the session are shared via Arc.
#[derive(Clone)]
pub struct Connection {
    client: Client,
    base_url: Arc<str>,
    session: Arc<Session>,
}

impl Connection {
    pub fn new(session: Session, config: ConnectionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            session: Arc::new(session),
        })
    }

    /// Create a new connection carrying the user's identity, sharing the
    /// connection pool with `self`.
    pub fn with_authorisation(
        &self,
        user_id: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        Self {
            client: self.client.clone(),
            base_url: Arc::clone(&self.base_url),
            session: Arc::new(self.session.with_authorisation(user_id, secret)),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_authorised(&self) -> bool {
        self.session.is_authorised()
    }

    /// Baseline body parameters sent with every request.
    fn base_values(&self) -> QueryParams {
        let mut values = QueryParams::new()
            .with("token", self.session.token())
            .with("apiid", self.session.api_id());
        if let Some(data) = self.session.data() {
            values.push("secret", data.secret.as_str());
            values.push("userid", data.user_id.as_str());
        }
        values
    }

    fn url_for(&self, endpoint: &str, query: Option<&str>) -> String {
        format!(
            "{}/{}",
            self.base_url,
            append_query(endpoint.trim_start_matches('/'), query)
        )
    }

    fn form_body(&self, values: &QueryParams) -> String {
        self.base_values()
            .encoded_pairs()
            .chain(values.encoded_pairs())
            .collect::<Vec<_>>()
            .join("&")
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// POST to `endpoint` and return the raw response text.
    pub async fn post_text(
        &self,
        endpoint: &str,
        query: Option<&str>,
        values: &QueryParams,
    ) -> Result<String> {
        let url = self.url_for(endpoint, query);
        debug!(endpoint = endpoint, params = values.len(), "POST");

        let response = self
            .client
            .post(&url)
            .header(header::CONTENT_TYPE, FORM_CONTENT_TYPE)
            .body(self.form_body(values))
            .send()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to send POST request to {}", endpoint))?;

        let response = Self::check_response(response).await?;
        let text = response
            .text()
            .await
            .map_err(ApiError::from)
            .with_context(|| format!("Failed to read response body from {}", endpoint))?;
        debug!(endpoint = endpoint, bytes = text.len(), "Response received");
        Ok(text)
    }

    /// POST to `endpoint` and deserialize the JSON response.
    pub async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: Option<&str>,
        values: &QueryParams,
    ) -> Result<T> {
        let text = self.post_text(endpoint, query, values).await?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse JSON response from {}", endpoint))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::MockServer;

    fn connection(server: &MockServer) -> Connection {
        let config = ConnectionConfig {
            base_url: server.base_url(),
            ..Default::default()
        };
        Connection::new(Session::new("42", "tok"), config).expect("connection")
    }

    #[test]
    fn test_default_config_points_at_osm() {
        let config = ConnectionConfig::default();
        assert_eq!(config.base_url, "https://osm.scouts.org.nz");
        assert_eq!(config.timeout_secs, 30);
    }

    #[tokio::test]
    async fn test_unauthorised_body_has_only_app_credentials() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/users.php")
                    .query_param("action", "authorise")
                    .body("token=tok&apiid=42&email=a%40b.nz&password=p%20w");
                then.status(200).body("{}");
            })
            .await;

        let params = QueryParams::new().with("email", "a@b.nz").with("password", "p w");
        let text = connection(&server)
            .post_text("users.php?action=authorise", None, &params)
            .await
            .expect("post");
        assert_eq!(text, "{}");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_authorised_body_leads_with_all_credentials() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/ext/members/contact/grid/")
                    .query_param("action", "getMembers")
                    .body("token=tok&apiid=42&secret=s3&userid=7&section_id=1&term_id=2");
                then.status(200).body(r#"{"data":{}}"#);
            })
            .await;

        let params = QueryParams::new().with("section_id", "1").with("term_id", "2");
        let value: serde_json::Value = connection(&server)
            .with_authorisation("7", "s3")
            .post("ext/members/contact/grid/?action=getMembers", None, &params)
            .await
            .expect("post");
        assert!(value["data"].is_object());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_query_is_appended_to_endpoint() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method("POST")
                    .path("/ext/badges/records/")
                    .query_param("action", "getBadgeStructureByType")
                    .query_param("a", "1")
                    .query_param("section", "scouts");
                then.status(200).body("[]");
            })
            .await;

        let query = QueryParams::new().with("a", "1").with("section", "scouts").to_query_string();
        let value: Vec<String> = connection(&server)
            .post(
                "ext/badges/records/?action=getBadgeStructureByType",
                Some(&query),
                &QueryParams::new(),
            )
            .await
            .expect("post");
        assert!(value.is_empty());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api.php");
                then.status(503).body("down for maintenance");
            })
            .await;

        let err = connection(&server)
            .post_text("api.php?action=getTerms", None, &QueryParams::new())
            .await
            .expect_err("503 should fail");
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::ServerError(body)) if body == "down for maintenance"
        ));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("POST").path("/api.php");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let result: Result<Vec<String>> = connection(&server)
            .post("api.php?action=getUserRoles", None, &QueryParams::new())
            .await;
        let err = result.expect_err("html is not json");
        assert!(err.to_string().contains("api.php?action=getUserRoles"));
    }
}
