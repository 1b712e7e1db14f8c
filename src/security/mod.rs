pub mod command_executor;
pub mod credentials;
pub mod secrets_scanner;

pub use command_executor::{CommandError, SafeCommandExecutor};
pub use credentials::{
    secret_env_names, write_private_file, SecureCredentialManager, SigningMaterial,
    UploadCredentials,
};
pub use secrets_scanner::{ScanReport, SecretFinding, SecretsScanner, Severity};
