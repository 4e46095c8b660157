//! Shared JSON request helpers for the backend REST API.
//!
//! Wraps [`reqwest`] with the base URL, timeouts and bearer token from
//! [`ClientConfig`], and turns non-2xx responses into
//! [`ClientError::Api`] carrying the server's own message.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// HTTP client bound to one backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    api_token: Option<String>,
}

impl ApiClient {
    /// Build a client with the timeouts from `config`.
    pub fn new(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The underlying client, for requests that must not carry the
    /// backend's credentials (presigned storage URLs).
    pub fn http(&self) -> &reqwest::Client {
        &self.client
    }

    /// Absolute URL for an API path such as `/api/sucursales`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Start a request against the backend with credentials attached.
    pub fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.request(method, self.url(path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        let response = self.request(reqwest::Method::GET, path).send().await?;
        parse_response(response).await
    }

    pub async fn get_json_with_query<T, Q>(&self, path: &str, query: &Q) -> ClientResult<T>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let response = self
            .request(reqwest::Method::GET, path)
            .query(query)
            .send()
            .await?;
        parse_response(response).await
    }

    pub async fn post_json<T, B>(&self, path: &str, body: &B) -> ClientResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        parse_response(response).await
    }

    /// POST a JSON body and ignore whatever the server answers on success.
    pub async fn post_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::POST, path)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    pub async fn put_unit<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::PUT, path)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }

    pub async fn delete<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> ClientResult<()> {
        let response = self
            .request(reqwest::Method::DELETE, path)
            .query(query)
            .send()
            .await?;
        check_status(response).await
    }
}

// ---- response helpers ----

/// Ensure the response has a success status code. Returns the response
/// unchanged on success, or a [`ClientError::Api`] carrying the server's
/// message on failure.
pub async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(ClientError::Api {
            status: status.as_u16(),
            message: server_message(&body),
        });
    }
    Ok(response)
}

/// Parse a successful JSON response body into the expected type.
pub async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
    let response = ensure_success(response).await?;
    Ok(response.json::<T>().await?)
}

/// Assert the response has a success status code, discarding the body.
pub async fn check_status(response: reqwest::Response) -> ClientResult<()> {
    ensure_success(response).await?;
    Ok(())
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers errors as `{"message": ...}` or `{"error": ...}`;
/// anything else is returned verbatim (trimmed), and an empty body
/// becomes a generic message.
pub fn server_message(body: &str) -> String {
    if let Ok(serde_json::Value::Object(obj)) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(serde_json::Value::String(msg)) = obj.get(key) {
                if !msg.trim().is_empty() {
                    return msg.trim().to_string();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "The server returned an empty error response".to_string()
    } else {
        trimmed.to_string()
    }
}
