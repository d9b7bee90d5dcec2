use std::fmt;

use serde_json::Value;

/// Categories of admin errors for consistent handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminErrorKind {
    /// Transport could not reach the service (connect failure, timeout)
    Network,
    /// Server responded but rejected the request
    Service,
    /// OTP exchange was rejected
    Auth,
    /// Registration or form input was rejected
    Validation,
    /// A stored or received token/user blob or response body could not be parsed
    Decode,
    /// Durable session storage could not be written
    Storage,
}

impl fmt::Display for AdminErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminErrorKind::Network => write!(f, "network"),
            AdminErrorKind::Service => write!(f, "service"),
            AdminErrorKind::Auth => write!(f, "auth"),
            AdminErrorKind::Validation => write!(f, "validation"),
            AdminErrorKind::Decode => write!(f, "decode"),
            AdminErrorKind::Storage => write!(f, "storage"),
        }
    }
}

/// Structured error with kind and details.
///
/// `message` is what the user sees. For `Service`, `Auth` and `Validation`
/// errors it is the server-supplied message, forwarded verbatim when present.
#[derive(Debug, Clone)]
pub struct AdminError {
    pub kind: AdminErrorKind,
    pub message: String,
    /// Optional additional details (e.g., raw response body)
    pub details: Option<String>,
}

impl AdminError {
    pub fn new(kind: AdminErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(AdminErrorKind::Network, message)
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(AdminErrorKind::Service, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AdminErrorKind::Validation, message)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(AdminErrorKind::Decode, message)
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(AdminErrorKind::Storage, message)
    }

    /// Creates a service error from a non-2xx response.
    ///
    /// Prefers the `message` field of a JSON body; falls back to `HTTP <status>`.
    pub fn http_status(status: u16, body: &str) -> Self {
        if let Ok(json) = serde_json::from_str::<Value>(body)
            && let Some(msg) = json.get("message").and_then(|v| v.as_str())
            && !msg.trim().is_empty()
        {
            return Self {
                kind: AdminErrorKind::Service,
                message: msg.to_string(),
                details: Some(body.to_string()),
            };
        }

        Self {
            kind: AdminErrorKind::Service,
            message: format!("HTTP {status}"),
            details: (!body.is_empty()).then(|| body.to_string()),
        }
    }

    /// Classifies a transport failure.
    pub fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::network("Request timed out before the service responded");
        }
        if err.is_connect() {
            return Self::network(
                "Network Error: Unable to connect to the service. Check your connection and try again.",
            );
        }
        if err.is_decode() {
            return Self::decode(format!("Failed to read response: {err}"));
        }
        Self::network(format!("Request failed: {err}"))
    }

    /// Re-tags a server rejection with a more specific kind.
    ///
    /// Transport and decode failures keep their kind.
    #[must_use]
    pub fn rejected_as(mut self, kind: AdminErrorKind) -> Self {
        if self.kind == AdminErrorKind::Service {
            self.kind = kind;
        }
        self
    }
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AdminError {}
