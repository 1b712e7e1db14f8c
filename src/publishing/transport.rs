//! HTTP implementation of [`RepositoryTransport`]

use crate::core::error::PublishError;
use crate::core::traits::RepositoryTransport;
use crate::security::UploadCredentials;
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use secrecy::ExposeSecret;

/// Maven repository access over HTTP(S)
///
/// Downloads are GET requests, uploads are PUT requests with basic
/// authentication. No timeout or retry is applied.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PublishError::NetworkError {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    fn authorize(request: RequestBuilder, credentials: Option<&UploadCredentials>) -> RequestBuilder {
        match credentials {
            Some(credentials) => request.basic_auth(
                credentials.username.expose_secret(),
                Some(credentials.password.expose_secret()),
            ),
            None => request,
        }
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

#[async_trait]
impl RepositoryTransport for HttpTransport {
    async fn fetch(
        &self,
        url: &str,
        credentials: Option<&UploadCredentials>,
    ) -> Result<Option<Vec<u8>>, PublishError> {
        tracing::debug!(%url, "GET");
        let response = Self::authorize(self.client.get(url), credentials)
            .send()
            .await
            .map_err(|e| PublishError::NetworkError {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if is_auth_failure(status) {
            return Err(PublishError::AuthenticationFailed {
                repository: url.to_string(),
            });
        }
        if !status.is_success() {
            return Err(PublishError::NetworkError {
                url: url.to_string(),
                message: format!("HTTP {}", status),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PublishError::NetworkError {
                url: url.to_string(),
                message: e.to_string(),
            })?;
        Ok(Some(bytes.to_vec()))
    }

    async fn upload(
        &self,
        url: &str,
        body: Vec<u8>,
        credentials: &UploadCredentials,
    ) -> Result<(), PublishError> {
        tracing::debug!(%url, bytes = body.len(), "PUT");
        let response = Self::authorize(self.client.put(url), Some(credentials))
            .body(body)
            .send()
            .await
            .map_err(|e| PublishError::NetworkError {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(PublishError::AuthenticationFailed {
                repository: url.to_string(),
            });
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(PublishError::UploadFailed {
                url: url.to_string(),
                message: format!("HTTP {} {}", status, detail.trim()),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_statuses() {
        assert!(is_auth_failure(StatusCode::UNAUTHORIZED));
        assert!(is_auth_failure(StatusCode::FORBIDDEN));
        assert!(!is_auth_failure(StatusCode::NOT_FOUND));
        assert!(!is_auth_failure(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpTransport::new().is_ok());
    }
}
