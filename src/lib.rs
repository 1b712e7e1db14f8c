pub mod build;
pub mod core;
pub mod orchestration;
pub mod publishing;
pub mod security;
pub mod validation;

#[cfg(test)]
mod testing;

pub use self::core::*;
pub use orchestration::{PipelineOptions, PublishReport, ReleasePipeline};
pub use publishing::{HttpTransport, MavenPublisher, PgpSigner, PublicationTarget};
pub use security::{
    CommandError, SafeCommandExecutor, ScanReport, SecretFinding, SecretsScanner,
    SecureCredentialManager,
};
