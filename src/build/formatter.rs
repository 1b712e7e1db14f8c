//! Source formatting enforcement with google-java-format

use super::compiler::command_error;
use crate::core::config::{FormatMode, FormattingConfig};
use crate::core::error::PublishError;
use crate::security::SafeCommandExecutor;
use std::ffi::OsString;
use std::fs;
use std::path::PathBuf;

/// Result of a formatting pass
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOutcome {
    pub mode: FormatMode,
    pub files_checked: usize,
    /// Files rewritten in apply mode
    pub changed: Vec<PathBuf>,
}

/// Runs the configured formatter over the main source set
pub struct SourceFormatter<'a> {
    executor: &'a SafeCommandExecutor,
    config: &'a FormattingConfig,
}

impl<'a> SourceFormatter<'a> {
    pub fn new(executor: &'a SafeCommandExecutor, config: &'a FormattingConfig) -> Self {
        Self { executor, config }
    }

    /// Format `sources` in `mode`
    ///
    /// Apply mode rewrites files and reports which ones changed. Check mode
    /// fails with [`PublishError::FormattingViolation`] listing the files
    /// that would change.
    pub fn run(&self, sources: &[PathBuf], mode: FormatMode) -> Result<FormatOutcome, PublishError> {
        let tool = self.config.tool.as_str();
        let before = match mode {
            FormatMode::Apply => snapshot(sources)?,
            FormatMode::Check => Vec::new(),
        };

        let output = self
            .executor
            .execute(tool, self.args(sources, mode))
            .map_err(|e| command_error(tool, e))?;

        let changed = match mode {
            FormatMode::Apply => {
                if !output.status.success() {
                    return Err(PublishError::CommandError {
                        command: tool.to_string(),
                        message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                    });
                }
                let after = snapshot(sources)?;
                sources
                    .iter()
                    .zip(before.iter().zip(after.iter()))
                    .filter(|(_, (b, a))| b != a)
                    .map(|(path, _)| path.clone())
                    .collect()
            }
            FormatMode::Check => {
                if !output.status.success() {
                    let files = violations(&String::from_utf8_lossy(&output.stdout));
                    if files.is_empty() {
                        // non-zero without a file list means the tool itself failed
                        return Err(PublishError::CommandError {
                            command: tool.to_string(),
                            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                        });
                    }
                    return Err(PublishError::FormattingViolation { files });
                }
                Vec::new()
            }
        };

        tracing::info!(?mode, files = sources.len(), changed = changed.len(), "formatting done");

        Ok(FormatOutcome {
            mode,
            files_checked: sources.len(),
            changed,
        })
    }

    fn args(&self, sources: &[PathBuf], mode: FormatMode) -> Vec<OsString> {
        let mut args: Vec<OsString> = match mode {
            FormatMode::Apply => vec!["--replace".into()],
            FormatMode::Check => vec!["--dry-run".into(), "--set-exit-if-changed".into()],
        };
        if !self.config.remove_unused_imports {
            args.push("--skip-removing-unused-imports".into());
        }
        args.extend(sources.iter().map(|s| s.clone().into_os_string()));
        args
    }
}

fn snapshot(sources: &[PathBuf]) -> Result<Vec<Vec<u8>>, PublishError> {
    sources
        .iter()
        .map(|path| fs::read(path).map_err(PublishError::from))
        .collect()
}

/// File names printed by `--dry-run`, one per line
fn violations(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args_as_strings(args: Vec<OsString>) -> Vec<String> {
        args.iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_apply_args() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let config = FormattingConfig::default();
        let formatter = SourceFormatter::new(&executor, &config);

        let args = args_as_strings(formatter.args(&[PathBuf::from("A.java")], FormatMode::Apply));

        assert_eq!(args, vec!["--replace", "A.java"]);
    }

    #[test]
    fn test_check_args_keep_unused_imports() {
        let temp_dir = TempDir::new().unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let config = FormattingConfig {
            remove_unused_imports: false,
            ..Default::default()
        };
        let formatter = SourceFormatter::new(&executor, &config);

        let args = args_as_strings(formatter.args(&[PathBuf::from("A.java")], FormatMode::Check));

        assert_eq!(
            args,
            vec![
                "--dry-run",
                "--set-exit-if-changed",
                "--skip-removing-unused-imports",
                "A.java"
            ]
        );
    }

    #[test]
    fn test_violations_parse_dry_run_output() {
        let files = violations("src/main/java/com/deepl/api/Translator.java\n\n  src/main/java/com/deepl/api/Usage.java  \n");

        assert_eq!(
            files,
            vec![
                "src/main/java/com/deepl/api/Translator.java",
                "src/main/java/com/deepl/api/Usage.java"
            ]
        );
    }

    #[test]
    fn test_unlisted_formatter_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("A.java");
        fs::write(&source, "class A {}").unwrap();
        let executor = SafeCommandExecutor::new(temp_dir.path()).unwrap();
        let config = FormattingConfig {
            tool: "prettier".to_string(),
            ..Default::default()
        };
        let formatter = SourceFormatter::new(&executor, &config);

        let result = formatter.run(&[source], FormatMode::Check);

        assert!(matches!(result, Err(PublishError::CommandError { .. })));
    }
}
