//! Phone/OTP auth service collaborator.

use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::ApiClient;
use crate::error::{AdminError, AdminErrorKind};
use crate::registration::RegistrationRequest;

const PHONE_LOGIN_PATH: &str = "/v1/auth/phone/login";
const VERIFY_OTP_PATH: &str = "/v1/auth/phone/verify";
const REGISTER_ADMIN_PATH: &str = "/v1/admin/register";

/// Result payload of an OTP exchange.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpVerification {
    #[serde(rename = "accountExists", alias = "account_exists", default)]
    pub account_exists: bool,
    #[serde(default)]
    pub token: Option<String>,
}

/// HTTP client for phone login, OTP verification and admin registration.
#[derive(Debug, Clone)]
pub struct AuthClient {
    api: ApiClient,
    timeout: Option<Duration>,
}

impl AuthClient {
    /// Creates a client for the auth service at `base_url`.
    ///
    /// `timeout` applies to OTP verification and registration only.
    ///
    /// # Errors
    /// Returns a `Validation` error if `base_url` is invalid.
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, AdminError> {
        Ok(Self {
            api: ApiClient::new(base_url, None)?,
            timeout,
        })
    }

    /// Asks the service to send a one-time password to `phone`.
    ///
    /// # Errors
    /// `Network` when unreachable, `Service` with the server message otherwise.
    pub async fn request_otp(&self, phone: &str) -> Result<(), AdminError> {
        debug!("requesting otp");
        let builder = self
            .api
            .request(Method::POST, PHONE_LOGIN_PATH)
            .json(&json!({ "phone": phone }));
        ApiClient::send::<serde_json::Value>(builder)
            .await?
            .into_ack("Failed to send OTP. Please try again.")
    }

    /// Exchanges phone + code for a verification result.
    ///
    /// # Errors
    /// `Auth` when the server rejects the exchange, `Network` on transport failure.
    pub async fn verify_otp(&self, phone: &str, code: &str) -> Result<OtpVerification, AdminError> {
        debug!("verifying otp");
        let builder = self.with_timeout(
            self.api
                .request(Method::POST, VERIFY_OTP_PATH)
                .json(&json!({ "phone": phone, "otp": code })),
        );

        ApiClient::send::<OtpVerification>(builder)
            .await
            .and_then(|envelope| envelope.into_data("Authentication failed. Please try again."))
            .map_err(|e| e.rejected_as(AdminErrorKind::Auth))
    }

    /// Submits an admin registration, authorized by `token` when one is held.
    ///
    /// # Errors
    /// `Validation` with the server message, or `Network`.
    pub async fn register_admin(
        &self,
        request: &RegistrationRequest,
        token: Option<&str>,
    ) -> Result<(), AdminError> {
        debug!(authorized = token.is_some(), "registering admin");
        let mut builder = self
            .api
            .request(Method::POST, REGISTER_ADMIN_PATH)
            .json(request);
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }

        ApiClient::send::<serde_json::Value>(self.with_timeout(builder))
            .await
            .and_then(|envelope| envelope.into_ack("Registration failed. Please try again."))
            .map_err(|e| e.rejected_as(AdminErrorKind::Validation))
    }

    fn with_timeout(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.timeout {
            Some(timeout) => builder.timeout(timeout),
            None => builder,
        }
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    #[tokio::test]
    async fn test_request_otp_posts_phone() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PHONE_LOGIN_PATH))
            .and(body_json(json!({ "phone": "+911234567890" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "OTP sent"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), None).unwrap();
        client.request_otp("+911234567890").await.unwrap();
    }

    #[tokio::test]
    async fn test_request_otp_forwards_service_message() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(PHONE_LOGIN_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "Too many attempts"})),
            )
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), None).unwrap();
        let err = client.request_otp("+911234567890").await.unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Service);
        assert_eq!(err.message, "Too many attempts");
    }

    #[tokio::test]
    async fn test_verify_otp_rejection_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VERIFY_OTP_PATH))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"success": false, "message": "Invalid OTP"})),
            )
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), None).unwrap();
        let err = client.verify_otp("+911234567890", "111111").await.unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Auth);
        assert_eq!(err.message, "Invalid OTP");
    }

    #[tokio::test]
    async fn test_unreachable_auth_service_is_network_error() {
        let client = AuthClient::new(&crate::api::closed_local_url(), None).unwrap();

        let err = client.request_otp("+911234567890").await.unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Network);
        assert!(err.message.contains("Unable to connect"), "{}", err.message);

        let request = crate::registration::RegistrationForm {
            username: "admin".to_string(),
            password: "pw".to_string(),
            confirm_password: "pw".to_string(),
            email: "admin@example.com".to_string(),
            dob: "1990-01-01".to_string(),
            ..Default::default()
        }
        .into_request("-6k3cvb3xs")
        .unwrap();
        let err = client.register_admin(&request, None).await.unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Network);
    }

    #[tokio::test]
    async fn test_verify_otp_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(VERIFY_OTP_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(500))
                    .set_body_json(json!({"success": true, "data": {"accountExists": false}})),
            )
            .mount(&server)
            .await;

        let client = AuthClient::new(&server.uri(), Some(Duration::from_millis(50))).unwrap();
        let err = client.verify_otp("+911234567890", "000000").await.unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Network);
    }

    #[tokio::test]
    async fn test_register_admin_sends_token_and_maps_rejection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(REGISTER_ADMIN_PATH))
            .and(header("authorization", "Bearer pending-token"))
            .respond_with(
                ResponseTemplate::new(400)
                    .set_body_json(json!({"success": false, "message": "Email already in use"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = RegistrationRequest {
            id: "user_x_abcde".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            email: "admin@example.com".to_string(),
            address: String::new(),
            dob: "01-02-1990".to_string(),
            region: "-6k3cvb3xs".to_string(),
            referral_code: None,
            phone: None,
        };

        let client = AuthClient::new(&server.uri(), None).unwrap();
        let err = client
            .register_admin(&request, Some("pending-token"))
            .await
            .unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Validation);
        assert_eq!(err.message, "Email already in use");
    }

    #[test]
    fn test_otp_verification_accepts_both_casings() {
        let camel: OtpVerification =
            serde_json::from_value(json!({"accountExists": true, "token": "t"})).unwrap();
        let snake: OtpVerification =
            serde_json::from_value(json!({"account_exists": true, "token": "t"})).unwrap();
        assert_eq!(camel, snake);
    }
}
