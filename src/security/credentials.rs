//! Secure credential manager with memory-safe handling and masking capabilities
//!
//! Upload credentials and signing key material are injected through
//! environment variables and held in `secrecy` wrappers so they never reach
//! logs or debug output. Key material written to disk is readable by its
//! owner only.

use crate::core::config::{CredentialsConfig, SigningConfig};
use crate::core::error::PublishError;
use regex::Regex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Username/password pair for repository uploads
#[derive(Debug)]
pub struct UploadCredentials {
    pub username: SecretString,
    pub password: SecretString,
}

impl UploadCredentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: SecretString::from(username.to_string()),
            password: SecretString::from(password.to_string()),
        }
    }
}

/// Armored signing key and its passphrase
#[derive(Debug)]
pub struct SigningMaterial {
    pub key: SecretString,
    pub passphrase: SecretString,
}

/// Environment variables whose values must never be printed
pub fn secret_env_names(credentials: &CredentialsConfig, signing: &SigningConfig) -> Vec<String> {
    vec![
        credentials.username_env.clone(),
        credentials.password_env.clone(),
        signing.key_env.clone(),
        signing.password_env.clone(),
    ]
}

/// Write `contents` to `path` with mode 0600, replacing any existing file
pub fn write_private_file(path: &Path, contents: &str) -> std::io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    // the creation mode does not apply to a file that already existed
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
    }
    file.write_all(contents.as_bytes())
}

/// Secure credential manager
///
/// # Examples
///
/// ```
/// use maven_publisher::core::CredentialsConfig;
/// use maven_publisher::security::SecureCredentialManager;
/// use std::collections::HashMap;
///
/// let env = HashMap::from([
///     ("MAVEN_UPLOAD_USERNAME".to_string(), "deepl".to_string()),
///     ("MAVEN_UPLOAD_PASSWORD".to_string(), "s3cr3t-password".to_string()),
/// ]);
/// let manager = SecureCredentialManager::with_env(env);
/// assert!(manager.upload_credentials(&CredentialsConfig::default()).is_ok());
/// ```
#[derive(Default)]
pub struct SecureCredentialManager {
    env: HashMap<String, String>,
}

impl SecureCredentialManager {
    /// Snapshot of the process environment
    pub fn from_env() -> Self {
        Self {
            env: std::env::vars().collect(),
        }
    }

    pub fn with_env(env: HashMap<String, String>) -> Self {
        Self { env }
    }

    /// Value of `name`, treating empty strings as unset
    pub fn get_secret(&self, name: &str) -> Option<SecretString> {
        self.env
            .get(name)
            .filter(|value| !value.is_empty())
            .map(|value| SecretString::from(value.clone()))
    }

    /// Upload credentials named by `config`
    ///
    /// # Errors
    ///
    /// `PublishError::CredentialsMissing` naming the first unset variable.
    pub fn upload_credentials(
        &self,
        config: &CredentialsConfig,
    ) -> Result<UploadCredentials, PublishError> {
        let username =
            self.get_secret(&config.username_env)
                .ok_or_else(|| PublishError::CredentialsMissing {
                    variable: config.username_env.clone(),
                })?;
        let password =
            self.get_secret(&config.password_env)
                .ok_or_else(|| PublishError::CredentialsMissing {
                    variable: config.password_env.clone(),
                })?;

        Ok(UploadCredentials { username, password })
    }

    pub fn has_upload_credentials(&self, config: &CredentialsConfig) -> bool {
        self.upload_credentials(config).is_ok()
    }

    /// Signing key and passphrase named by `config`
    ///
    /// # Errors
    ///
    /// `PublishError::SigningKeyMissing` naming the first unset variable.
    pub fn signing_material(&self, config: &SigningConfig) -> Result<SigningMaterial, PublishError> {
        let key = self
            .get_secret(&config.key_env)
            .ok_or_else(|| PublishError::SigningKeyMissing {
                variable: config.key_env.clone(),
            })?;
        let passphrase =
            self.get_secret(&config.password_env)
                .ok_or_else(|| PublishError::SigningKeyMissing {
                    variable: config.password_env.clone(),
                })?;

        Ok(SigningMaterial { key, passphrase })
    }

    /// Masks a token for safe logging
    ///
    /// Shows only the first 3 and last 3 characters for identification purposes.
    /// Tokens shorter than 10 characters are fully masked as "****".
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::security::SecureCredentialManager;
    ///
    /// assert_eq!(SecureCredentialManager::mask_token("abcdef123456"), "abc...456");
    /// assert_eq!(SecureCredentialManager::mask_token("short"), "****");
    /// ```
    pub fn mask_token(token: &str) -> String {
        let chars: Vec<char> = token.chars().collect();
        if chars.len() < 10 {
            return "****".to_string();
        }

        let prefix: String = chars[..3].iter().collect();
        let suffix: String = chars[chars.len() - 3..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Masks every credential value named by `names` found in `text`
    pub fn mask_secrets_in_string(&self, text: &str, names: &[&str]) -> String {
        let mut masked = text.to_string();

        for name in names {
            if let Some(secret) = self.get_secret(name) {
                let value = secret.expose_secret();
                if let Ok(regex) = Regex::new(&regex::escape(value)) {
                    let masked_value = Self::mask_token(value);
                    masked = regex.replace_all(&masked, masked_value.as_str()).to_string();
                }
            }
        }

        masked
    }
}
