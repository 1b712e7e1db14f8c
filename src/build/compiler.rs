//! Compilation and API documentation through the JDK tools

use super::BuildLayout;
use crate::core::config::JavaConfig;
use crate::core::error::PublishError;
use crate::security::{CommandError, SafeCommandExecutor};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;
use walkdir::WalkDir;

/// Result of a successful compiler run
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOutput {
    pub source_count: usize,
    pub class_count: usize,
    pub output_dir: PathBuf,
}

/// All `.java` files below `source_dir`, sorted
///
/// A missing directory or one without sources is a compilation error.
pub fn collect_java_sources(source_dir: &Path) -> Result<Vec<PathBuf>, PublishError> {
    if !source_dir.is_dir() {
        return Err(PublishError::CompilationFailed {
            message: format!(
                "ソースディレクトリが見つかりません: {}",
                source_dir.display()
            ),
        });
    }

    let sources: Vec<PathBuf> = WalkDir::new(source_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "java"))
        .map(|e| e.into_path())
        .collect();

    if sources.is_empty() {
        return Err(PublishError::CompilationFailed {
            message: format!(
                "Java ソースファイルがありません: {}",
                source_dir.display()
            ),
        });
    }

    Ok(sources)
}

/// `javac` / `javadoc` driver
pub struct JavaToolchain<'a> {
    executor: &'a SafeCommandExecutor,
    java: &'a JavaConfig,
    layout: &'a BuildLayout,
}

impl<'a> JavaToolchain<'a> {
    pub fn new(
        executor: &'a SafeCommandExecutor,
        java: &'a JavaConfig,
        layout: &'a BuildLayout,
    ) -> Self {
        Self {
            executor,
            java,
            layout,
        }
    }

    /// Compile `sources` into the classes directory
    ///
    /// The output directory is recreated so stale classes never reach the archive.
    pub fn compile(
        &self,
        sources: &[PathBuf],
        classpath: &[PathBuf],
    ) -> Result<CompileOutput, PublishError> {
        let output_dir = self.layout.classes_dir();
        recreate_dir(&output_dir)?;

        let args = self.javac_args(sources, classpath)?;
        let output = self.run("javac", args)?;
        check_status("javac", &output)?;

        let class_count = WalkDir::new(&output_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "class"))
            .count();

        tracing::info!(sources = sources.len(), classes = class_count, "compiled");

        Ok(CompileOutput {
            source_count: sources.len(),
            class_count,
            output_dir,
        })
    }

    /// Generate API documentation into the javadoc directory
    pub fn javadoc(&self, sources: &[PathBuf], classpath: &[PathBuf]) -> Result<PathBuf, PublishError> {
        let output_dir = self.layout.javadoc_dir();
        recreate_dir(&output_dir)?;

        let args = self.javadoc_args(sources, classpath)?;
        let output = self.run("javadoc", args)?;
        check_status("javadoc", &output)?;

        Ok(output_dir)
    }

    fn javac_args(
        &self,
        sources: &[PathBuf],
        classpath: &[PathBuf],
    ) -> Result<Vec<OsString>, PublishError> {
        let mut args: Vec<OsString> = vec![
            "-source".into(),
            self.java.source_compatibility.clone().into(),
            "-target".into(),
            self.java.target_compatibility.clone().into(),
            "-encoding".into(),
            self.java.source_encoding.clone().into(),
            "-d".into(),
            self.layout.classes_dir().into_os_string(),
        ];
        push_classpath(&mut args, classpath)?;
        args.extend(sources.iter().map(|s| s.clone().into_os_string()));
        Ok(args)
    }

    fn javadoc_args(
        &self,
        sources: &[PathBuf],
        classpath: &[PathBuf],
    ) -> Result<Vec<OsString>, PublishError> {
        let mut args: Vec<OsString> = vec![
            "-d".into(),
            self.layout.javadoc_dir().into_os_string(),
            "-encoding".into(),
            self.java.source_encoding.clone().into(),
        ];
        push_classpath(&mut args, classpath)?;
        args.push("-quiet".into());
        args.extend(sources.iter().map(|s| s.clone().into_os_string()));
        Ok(args)
    }

    fn run(&self, command: &str, args: Vec<OsString>) -> Result<Output, PublishError> {
        self.executor
            .execute(command, args)
            .map_err(|e| command_error(command, e))
    }
}

fn push_classpath(args: &mut Vec<OsString>, classpath: &[PathBuf]) -> Result<(), PublishError> {
    if classpath.is_empty() {
        return Ok(());
    }
    let joined = std::env::join_paths(classpath).map_err(|e| PublishError::CompilationFailed {
        message: format!("クラスパスを構成できません: {}", e),
    })?;
    args.push("-cp".into());
    args.push(joined);
    Ok(())
}

fn recreate_dir(dir: &Path) -> Result<(), PublishError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    fs::create_dir_all(dir)?;
    Ok(())
}

fn check_status(command: &str, output: &Output) -> Result<(), PublishError> {
    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let detail = if stderr.is_empty() { stdout } else { stderr };

    Err(PublishError::CompilationFailed {
        message: format!("{} の終了コード {:?}\n{}", command, output.status.code(), detail),
    })
}

pub(crate) fn command_error(command: &str, error: CommandError) -> PublishError {
    PublishError::CommandError {
        command: command.to_string(),
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::PublishConfig;
    use tempfile::TempDir;

    fn write_sources(root: &Path) -> PathBuf {
        let source_dir = root.join("src/main/java");
        let package_dir = source_dir.join("com/deepl/api");
        fs::create_dir_all(&package_dir).unwrap();
        fs::write(package_dir.join("Translator.java"), "package com.deepl.api;\nclass Translator {}\n").unwrap();
        fs::write(package_dir.join("DeepLException.java"), "package com.deepl.api;\nclass DeepLException {}\n").unwrap();
        fs::write(package_dir.join("package.html"), "<html/>").unwrap();
        source_dir
    }

    #[test]
    fn test_collect_java_sources() {
        let temp_dir = TempDir::new().unwrap();
        let source_dir = write_sources(temp_dir.path());

        let sources = collect_java_sources(&source_dir).unwrap();

        assert_eq!(sources.len(), 2);
        assert!(sources[0].ends_with("DeepLException.java"));
        assert!(sources[1].ends_with("Translator.java"));
    }

    #[test]
    fn test_missing_source_dir_is_compilation_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = collect_java_sources(&temp_dir.path().join("src/main/java"));

        assert!(matches!(result, Err(PublishError::CompilationFailed { .. })));
    }

    #[test]
    fn test_empty_source_dir_is_compilation_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = collect_java_sources(temp_dir.path());

        assert!(matches!(result, Err(PublishError::CompilationFailed { .. })));
    }

    #[test]
    fn test_javac_args() {
        let temp_dir = TempDir::new().unwrap();
        let config = PublishConfig::default();
        let layout = BuildLayout::new(temp_dir.path(), &config);
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let toolchain = JavaToolchain::new(&executor, &config.java, &layout);

        let args = toolchain
            .javac_args(
                &[PathBuf::from("A.java")],
                &[PathBuf::from("gson-2.9.0.jar")],
            )
            .unwrap();
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(&args[..6], ["-source", "1.8", "-target", "1.8", "-encoding", "UTF-8"]);
        assert_eq!(args[6], "-d");
        assert!(args[7].ends_with("main"));
        assert_eq!(args[8], "-cp");
        assert_eq!(args[9], "gson-2.9.0.jar");
        assert_eq!(args[10], "A.java");
    }

    #[test]
    fn test_javadoc_args_without_classpath() {
        let temp_dir = TempDir::new().unwrap();
        let config = PublishConfig::default();
        let layout = BuildLayout::new(temp_dir.path(), &config);
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let toolchain = JavaToolchain::new(&executor, &config.java, &layout);

        let args = toolchain
            .javadoc_args(&[PathBuf::from("A.java")], &[])
            .unwrap();
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        assert_eq!(args[0], "-d");
        assert!(args[1].ends_with("javadoc"));
        assert_eq!(&args[2..], ["-encoding", "UTF-8", "-quiet", "A.java"]);
    }
}
