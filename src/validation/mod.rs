pub mod descriptor_validator;
pub mod version_validator;

pub use descriptor_validator::DescriptorValidator;
pub use version_validator::{VersionValidationResult, VersionValidator};
