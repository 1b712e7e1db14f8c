//! Build stages: dependency resolution, compilation, formatting,
//! archive assembly and POM generation

pub mod compiler;
pub mod dependencies;
pub mod formatter;
pub mod manifest;
pub mod packaging;
pub mod pom;

pub use compiler::{CompileOutput, JavaToolchain};
pub use dependencies::{DependencyResolver, ResolvedDependencies, ResolvedDependency};
pub use formatter::{FormatOutcome, SourceFormatter};
pub use manifest::Manifest;
pub use packaging::{Artifact, ArtifactKind, ArtifactPackager, ArtifactSet};
pub use pom::PomGenerator;

use crate::core::config::PublishConfig;
use std::path::{Path, PathBuf};

/// Locations of build inputs and outputs for one project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    pub project_root: PathBuf,
    pub build_dir: PathBuf,
    pub source_dir: PathBuf,
    pub resources_dir: PathBuf,
}

impl BuildLayout {
    pub fn new(project_root: &Path, config: &PublishConfig) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            build_dir: project_root.join(&config.build.output_dir),
            source_dir: project_root.join(&config.java.source_dir),
            resources_dir: project_root.join(&config.java.resources_dir),
        }
    }

    /// Downloaded dependency archives
    pub fn dependencies_dir(&self) -> PathBuf {
        self.build_dir.join("dependencies")
    }

    /// Compiler output
    pub fn classes_dir(&self) -> PathBuf {
        self.build_dir.join("classes").join("java").join("main")
    }

    /// Documentation tool output
    pub fn javadoc_dir(&self) -> PathBuf {
        self.build_dir.join("docs").join("javadoc")
    }

    /// Final archives
    pub fn libs_dir(&self) -> PathBuf {
        self.build_dir.join("libs")
    }

    /// Generated POM
    pub fn publications_dir(&self) -> PathBuf {
        self.build_dir.join("publications").join("maven")
    }

    /// Scratch space; each packaging run gets its own subdirectory
    pub fn tmp_dir(&self) -> PathBuf {
        self.build_dir.join("tmp")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let config = PublishConfig::default();
        let layout = BuildLayout::new(Path::new("/work/deepl-java"), &config);

        assert_eq!(layout.build_dir, Path::new("/work/deepl-java/build"));
        assert_eq!(
            layout.source_dir,
            Path::new("/work/deepl-java/src/main/java")
        );
        assert_eq!(
            layout.classes_dir(),
            Path::new("/work/deepl-java/build/classes/java/main")
        );
        assert_eq!(
            layout.javadoc_dir(),
            Path::new("/work/deepl-java/build/docs/javadoc")
        );
        assert_eq!(layout.libs_dir(), Path::new("/work/deepl-java/build/libs"));
    }
}
