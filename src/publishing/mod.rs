//! Signing, routing and upload of a built publication

pub mod metadata;
pub mod repository;
pub mod signing;
pub mod transport;

pub use metadata::{MavenMetadata, METADATA_FILE};
pub use repository::{
    md5_hex, route, sha1_hex, sha256_hex, sha512_hex, MavenPublisher, PlannedUpload,
    PublicationTarget, PublishOutcome, UploadSource,
};
pub use signing::{
    parse_public_key, sign_artifacts, signature_path, verify_signature, PgpSigner,
};
pub use transport::HttpTransport;
