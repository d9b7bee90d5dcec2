//! Multipart media upload to the public file service.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::AdminError;

#[derive(Debug, Deserialize)]
struct UploadResponse {
    #[serde(default)]
    url: Option<String>,
}

/// Uploads a file and returns its public URL.
///
/// # Errors
/// `Validation` if the API key is missing or the file cannot be read, otherwise
/// as [`upload_bytes`].
pub async fn upload_file(
    upload_url: &str,
    api_key: Option<&str>,
    path: &Path,
) -> Result<String, AdminError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| {
        AdminError::validation(format!("Failed to read {}: {e}", path.display()))
    })?;
    let file_name = path
        .file_name()
        .map_or_else(|| "upload".to_string(), |n| n.to_string_lossy().into_owned());
    upload_bytes(upload_url, api_key, &file_name, bytes).await
}

/// Uploads raw bytes under `file_name` and returns the public URL.
///
/// # Errors
/// `Validation` if the API key is missing or the URL is invalid, `Network` on
/// transport failure, `Service` on a non-2xx status, `Decode` when the
/// response carries no URL.
pub async fn upload_bytes(
    upload_url: &str,
    api_key: Option<&str>,
    file_name: &str,
    bytes: Vec<u8>,
) -> Result<String, AdminError> {
    let api_key = api_key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or_else(|| {
            AdminError::validation(
                "No upload API key configured (set upload_api_key in config.toml)",
            )
        })?;
    let url = url::Url::parse(upload_url.trim())
        .map_err(|e| AdminError::validation(format!("Invalid upload URL '{upload_url}': {e}")))?;

    debug!(%url, file_name, size = bytes.len(), "uploading file");
    let form = Form::new()
        .text("apiKey", api_key.to_string())
        .part("file", Part::bytes(bytes).file_name(file_name.to_string()));

    let response = reqwest::Client::new()
        .post(url)
        .multipart(form)
        .send()
        .await
        .map_err(|e| AdminError::from_transport(&e))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| AdminError::from_transport(&e))?;
    if !status.is_success() {
        return Err(AdminError::http_status(status.as_u16(), &body));
    }

    let parsed: UploadResponse = serde_json::from_str(&body)
        .map_err(|e| AdminError::decode(format!("Failed to parse upload response: {e}")))?;
    let public_url = parsed
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| AdminError::decode("Upload response carried no url"))?;

    info!(%public_url, "file uploaded");
    Ok(public_url)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::AdminErrorKind;

    #[tokio::test]
    async fn test_missing_api_key_is_validation_error() {
        let err = upload_bytes("http://localhost:9/upload", None, "a.png", vec![1])
            .await
            .unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_unreadable_file_is_validation_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.png");

        let err = upload_file("http://localhost:9/upload", Some("key"), &missing)
            .await
            .unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Validation);
        assert!(err.message.starts_with("Failed to read"));
    }

    #[tokio::test]
    async fn test_upload_file_returns_public_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .and(body_string_contains("name=\"apiKey\""))
            .and(body_string_contains("test-key"))
            .and(body_string_contains("filename=\"banner.png\""))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"url": "https://files.example.com/banner.png"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempdir().unwrap();
        let file = dir.path().join("banner.png");
        std::fs::write(&file, b"png-bytes").unwrap();

        let url = upload_file(&format!("{}/upload", server.uri()), Some("test-key"), &file)
            .await
            .unwrap();
        assert_eq!(url, "https://files.example.com/banner.png");
    }

    #[tokio::test]
    async fn test_response_without_url_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .mount(&server)
            .await;

        let err = upload_bytes(
            &format!("{}/upload", server.uri()),
            Some("k"),
            "a.txt",
            b"hi".to_vec(),
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, AdminErrorKind::Decode);
    }
}
