//! HTTP client for the admin backend.
//!
//! Every endpoint answers with a `{success, message?, data?}` envelope.
//! [`ApiClient`] attaches the session's bearer token and unwraps that
//! envelope into typed results or [`AdminError`]s.

pub mod auth;
pub mod banners;
pub mod help;
pub mod notifications;
pub mod products;
pub mod upload;
pub mod users;
pub mod withdrawals;

use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::AdminError;

/// Response envelope shared by every backend endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    fn rejection(&self, fallback: &str) -> AdminError {
        let message = self
            .message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback);
        AdminError::service(message)
    }

    /// Returns `data` when the server reported success.
    ///
    /// # Errors
    /// `Service` when `success` is false, `Decode` when `data` is missing.
    pub fn into_data(self, fallback: &str) -> Result<T, AdminError> {
        if self.success == Some(false) {
            return Err(self.rejection(fallback));
        }
        self.data
            .ok_or_else(|| AdminError::decode(format!("{fallback}: response carried no data")))
    }

    /// Succeeds unless the server explicitly reported failure.
    ///
    /// # Errors
    /// `Service` when `success` is false.
    pub fn into_ack(self, fallback: &str) -> Result<(), AdminError> {
        if self.success == Some(false) {
            return Err(self.rejection(fallback));
        }
        Ok(())
    }
}

/// Bearer-authorized client bound to one base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Creates a client for `base_url`, attaching `token` to every request.
    ///
    /// # Errors
    /// Returns a `Validation` error if `base_url` is not an absolute http(s) URL.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, AdminError> {
        let parsed = url::Url::parse(base_url.trim())
            .map_err(|e| AdminError::validation(format!("Invalid base URL '{base_url}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AdminError::validation(format!(
                "Invalid base URL '{base_url}': expected http or https"
            )));
        }

        Ok(Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Joins an absolute endpoint path onto the base URL, keeping any base path prefix.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Starts a request with JSON content type and the bearer token (if held).
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.endpoint(path);
        debug!(%method, %url, authorized = self.token.is_some(), "admin api request");

        let builder = self
            .http
            .request(method, url)
            .header("Content-Type", "application/json");
        match self.token.as_deref() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Sends a request and parses the envelope.
    ///
    /// # Errors
    /// `Network` on transport failure, `Service` on non-2xx, `Decode` on a bad body.
    pub async fn send<T: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> Result<Envelope<T>, AdminError> {
        let response = builder
            .send()
            .await
            .map_err(|e| AdminError::from_transport(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AdminError::from_transport(&e))?;

        if !status.is_success() {
            debug!(status = status.as_u16(), "admin api rejected request");
            return Err(AdminError::http_status(status.as_u16(), &body));
        }

        if body.trim().is_empty() {
            return Ok(Envelope {
                success: None,
                message: None,
                data: None,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| AdminError::decode(format!("Failed to parse response: {e}")))
    }

    pub(crate) async fn get_data<T: DeserializeOwned>(
        &self,
        path: &str,
        fallback: &str,
    ) -> Result<T, AdminError> {
        Self::send(self.request(Method::GET, path))
            .await?
            .into_data(fallback)
    }

    pub(crate) async fn post_data<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<T, AdminError> {
        Self::send(self.request(Method::POST, path).json(body))
            .await?
            .into_data(fallback)
    }

    pub(crate) async fn post_ack<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
    ) -> Result<(), AdminError> {
        Self::send::<serde_json::Value>(self.request(Method::POST, path).json(body))
            .await?
            .into_ack(fallback)
    }

    pub(crate) async fn delete_ack(&self, path: &str, fallback: &str) -> Result<(), AdminError> {
        Self::send::<serde_json::Value>(self.request(Method::DELETE, path))
            .await?
            .into_ack(fallback)
    }
}

/// Base URL of a local port that was bound and released, so nothing listens there.
#[cfg(test)]
pub(crate) fn closed_local_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}
