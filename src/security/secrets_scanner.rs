//! Secrets scanner for detecting hardcoded secrets in configuration and sources
//!
//! Upload credentials and signing keys must only ever arrive through the
//! environment. This module finds private key blocks and password/token
//! literals that were committed instead.

use crate::core::error::PublishError;
use regex::Regex;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Severity level for detected secrets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::High => write!(f, "high"),
            Severity::Medium => write!(f, "medium"),
            Severity::Low => write!(f, "low"),
        }
    }
}

/// Pattern for detecting a specific type of secret
#[derive(Clone)]
pub struct SecretPattern {
    pub name: String,
    pub regex: Regex,
    pub severity: Severity,
}

/// A single finding from the secrets scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretFinding {
    pub file: PathBuf,
    pub line: usize,
    pub secret_type: String,
    pub severity: Severity,
    pub matched: String, // Masked version
}

/// Report from scanning files for secrets
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub has_secrets: bool,
    pub findings: Vec<SecretFinding>,
    pub scanned_files: usize,
    pub skipped_files: Vec<PathBuf>,
}

impl ScanReport {
    fn push_findings(&mut self, findings: Vec<SecretFinding>) {
        self.findings.extend(findings);
        self.has_secrets = !self.findings.is_empty();
    }
}

/// Scanner for detecting hardcoded secrets
///
/// # Examples
///
/// ```no_run
/// use maven_publisher::security::SecretsScanner;
/// use std::path::Path;
///
/// let scanner = SecretsScanner::new();
/// let report = scanner.scan_project(Path::new("src/main/java")).unwrap();
///
/// if report.has_secrets {
///     println!("Found {} secrets!", report.findings.len());
/// }
/// ```
pub struct SecretsScanner {
    patterns: Vec<SecretPattern>,
    default_ignore_patterns: Vec<Regex>,
    custom_ignore_patterns: Vec<Regex>,
}

impl Default for SecretsScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretsScanner {
    /// Creates a new SecretsScanner with default patterns
    pub fn new() -> Self {
        Self {
            patterns: Self::default_patterns(),
            default_ignore_patterns: Self::default_ignore_patterns(),
            custom_ignore_patterns: Vec::new(),
        }
    }

    /// Configures custom ignore patterns
    ///
    /// # Arguments
    ///
    /// * `patterns` - List of glob-style patterns to ignore
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::security::SecretsScanner;
    ///
    /// let mut scanner = SecretsScanner::new();
    /// scanner.configure(&["*Fixture.java", "generated/*"]);
    /// ```
    pub fn configure<S: AsRef<str>>(&mut self, patterns: &[S]) {
        self.custom_ignore_patterns = patterns
            .iter()
            .filter_map(|p| Self::glob_to_regex(p.as_ref()))
            .collect();
    }

    /// Scans every file below `root`
    ///
    /// Ignore patterns are matched against paths relative to `root`.
    pub fn scan_project(&self, root: &Path) -> Result<ScanReport, PublishError> {
        let mut report = ScanReport::default();

        if !root.exists() {
            return Ok(report);
        }

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);

            if self.should_ignore(relative) {
                report.skipped_files.push(path.to_path_buf());
                continue;
            }

            if let Ok(content) = fs::read_to_string(path) {
                report.push_findings(self.scan_content(&content, path));
                report.scanned_files += 1;
            } else {
                report.skipped_files.push(path.to_path_buf());
            }
        }

        Ok(report)
    }

    /// Scans a single file; the file must be readable text
    pub fn scan_file(&self, path: &Path) -> Result<ScanReport, PublishError> {
        let content = fs::read_to_string(path)?;
        let mut report = ScanReport {
            scanned_files: 1,
            ..Default::default()
        };
        report.push_findings(self.scan_content(&content, path));
        Ok(report)
    }

    /// Scans file content for secrets
    ///
    /// # Arguments
    ///
    /// * `content` - File content to scan
    /// * `file_path` - Path to the file (for reporting)
    pub fn scan_content(&self, content: &str, file_path: &Path) -> Vec<SecretFinding> {
        let mut findings = Vec::new();

        for (line_idx, line) in content.lines().enumerate() {
            for pattern in &self.patterns {
                for capture in pattern.regex.find_iter(line) {
                    findings.push(SecretFinding {
                        file: file_path.to_path_buf(),
                        line: line_idx + 1,
                        secret_type: pattern.name.clone(),
                        severity: pattern.severity,
                        matched: Self::mask_match(capture.as_str()),
                    });
                }
            }
        }

        findings
    }

    /// Masks a matched secret for safe display
    ///
    /// Shows first 5 and last 5 characters for identification.
    ///
    /// # Examples
    ///
    /// ```
    /// use maven_publisher::security::SecretsScanner;
    ///
    /// assert_eq!(SecretsScanner::mask_match("short"), "****");
    /// assert_eq!(SecretsScanner::mask_match("very-long-secret-key-12345"), "very-...12345");
    /// ```
    pub fn mask_match(matched: &str) -> String {
        let chars: Vec<char> = matched.chars().collect();
        if chars.len() <= 10 {
            return "****".to_string();
        }

        let prefix: String = chars[..5].iter().collect();
        let suffix: String = chars[chars.len() - 5..].iter().collect();
        format!("{}...{}", prefix, suffix)
    }

    /// Checks if a file path should be ignored
    pub fn should_ignore(&self, path: &Path) -> bool {
        let path_str = path.to_string_lossy().replace('\\', "/");

        self.default_ignore_patterns
            .iter()
            .chain(self.custom_ignore_patterns.iter())
            .any(|pattern| pattern.is_match(&path_str))
    }

    /// Returns default secret patterns
    fn default_patterns() -> Vec<SecretPattern> {
        let specs: &[(&str, &str, Severity)] = &[
            (
                "Private Key",
                r"-----BEGIN (?:RSA |EC |DSA |OPENSSH |PGP )?PRIVATE KEY(?: BLOCK)?-----",
                Severity::Critical,
            ),
            ("AWS Access Key", r"AKIA[0-9A-Z]{16}", Severity::Critical),
            ("GitHub Token", r"gh[ps]_[a-zA-Z0-9]{36,}", Severity::Critical),
            (
                "Generic API Key",
                r#"(?i)(?:api[_-]?key|apikey|api[_-]?secret|auth[_-]?key)\s*[:=]\s*['"]([a-zA-Z0-9_\-:]{20,})['"]"#,
                Severity::Critical,
            ),
            (
                "Generic Secret",
                r#"(?i)(?:secret|password|passwd|pwd|passphrase)\s*[:=]\s*['"]([^'"$]{8,})['"]"#,
                Severity::High,
            ),
            (
                "Unquoted Secret Assignment",
                r"(?i)^\s*(?:password|passwd|passphrase|secret|token)\s*:\s*[A-Za-z0-9_\-+/=.]{8,}\s*$",
                Severity::High,
            ),
            (
                "Generic Token",
                r#"(?i)(?:token|bearer)\s*[:=]\s*['"]([a-zA-Z0-9_\-\.]{20,})['"]"#,
                Severity::High,
            ),
            (
                "Base64 Secret (Suspicious)",
                r#"(?i)(?:secret|password|key|token)\s*[:=]\s*['"]([A-Za-z0-9+/]{40,}={0,2})['"]"#,
                Severity::Medium,
            ),
        ];

        specs
            .iter()
            .filter_map(|(name, pattern, severity)| {
                Regex::new(pattern).ok().map(|regex| SecretPattern {
                    name: name.to_string(),
                    regex,
                    severity: *severity,
                })
            })
            .collect()
    }

    /// Returns default ignore patterns
    fn default_ignore_patterns() -> Vec<Regex> {
        [
            r"(^|/)\.git/",
            r"(^|/)\.gradle/",
            r"(^|/)build/",
            r"(^|/)target/",
            r"\.class$",
            r"\.jar$",
            r"(^|/)src/test/",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    }

    /// Converts glob pattern to regex
    ///
    /// # Arguments
    ///
    /// * `glob` - Glob-style pattern (e.g., "*Fixture.java")
    fn glob_to_regex(glob: &str) -> Option<Regex> {
        let pattern = glob
            .replace('.', r"\.")
            .replace('*', ".*")
            .replace('?', ".");

        Regex::new(&pattern).ok()
    }
}
