//! Test doubles shared by unit tests

use crate::core::error::PublishError;
use crate::core::traits::RepositoryTransport;
use crate::security::UploadCredentials;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Secret key exported with `gpg --armor --export-secret-keys`
pub(crate) const SIGNING_KEY: &str = include_str!("../tests/fixtures/signing-key.asc");
pub(crate) const SIGNING_PASSPHRASE: &str = "correct horse battery staple";
pub(crate) const SIGNING_PUBLIC_KEY: &str = include_str!("../tests/fixtures/signing-key.pub.asc");
/// `gpg --armor --detach-sign` over the bytes `primary contents`
pub(crate) const GPG_SIGNATURE: &str = include_str!("../tests/fixtures/primary-contents.asc");

/// In-memory repository keyed by absolute URL
#[derive(Default)]
pub(crate) struct MemoryTransport {
    pub files: Mutex<HashMap<String, Vec<u8>>>,
    pub fetched: Mutex<Vec<String>>,
    pub uploaded: Mutex<Vec<String>>,
    pub fail_fetch: bool,
    pub reject_uploads: bool,
}

impl MemoryTransport {
    pub fn with_file(self, url: &str, body: &[u8]) -> Self {
        self.files
            .lock()
            .unwrap()
            .insert(url.to_string(), body.to_vec());
        self
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }

    pub fn body(&self, url: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(url).cloned()
    }
}

#[async_trait]
impl RepositoryTransport for MemoryTransport {
    async fn fetch(
        &self,
        url: &str,
        _credentials: Option<&UploadCredentials>,
    ) -> Result<Option<Vec<u8>>, PublishError> {
        self.fetched.lock().unwrap().push(url.to_string());
        if self.fail_fetch {
            return Err(PublishError::NetworkError {
                url: url.to_string(),
                message: "connection refused".to_string(),
            });
        }
        Ok(self.files.lock().unwrap().get(url).cloned())
    }

    async fn upload(
        &self,
        url: &str,
        body: Vec<u8>,
        _credentials: &UploadCredentials,
    ) -> Result<(), PublishError> {
        if self.reject_uploads {
            return Err(PublishError::AuthenticationFailed {
                repository: url.to_string(),
            });
        }
        self.uploaded.lock().unwrap().push(url.to_string());
        self.files.lock().unwrap().insert(url.to_string(), body);
        Ok(())
    }
}
