//! SafeCommandExecutor: whitelisted execution of the JVM toolchain
//!
//! # Security Features
//!
//! - **Whitelist-based validation**: Only the compiler, documentation tool,
//!   JVM launcher and source formatter can execute
//! - **Injection prevention**: Uses `std::process::Command` which prevents shell injection
//! - **Argument sanitization**: Arguments passed as a list, never interpolated into shell strings
//! - **Working directory validation**: Validates existence before execution
//!
//! # Example
//!
//! ```rust,no_run
//! use maven_publisher::SafeCommandExecutor;
//!
//! let executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
//!
//! let output = executor.execute("javac", ["-version"]).unwrap();
//! println!("{}", String::from_utf8_lossy(&output.stderr));
//! ```

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use thiserror::Error;

/// Allowed commands whitelist.
///
/// Only these commands can be executed via SafeCommandExecutor.
const ALLOWED_COMMANDS: &[&str] = &["javac", "javadoc", "java", "google-java-format"];

/// Errors that can occur during command execution
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command is not in the allowed whitelist
    #[error("Command '{0}' is not in the allowed whitelist")]
    CommandNotAllowed(String),

    /// Working directory does not exist or is not accessible
    #[error("Working directory does not exist: {0}")]
    InvalidWorkingDirectory(PathBuf),

    /// Command execution failed (e.g., binary not found, permission denied)
    #[error("Command execution failed: {0}")]
    ExecutionFailed(String),
}

/// Safe command executor with security controls
#[derive(Debug)]
pub struct SafeCommandExecutor {
    /// Working directory where commands will be executed
    working_dir: PathBuf,
}

impl SafeCommandExecutor {
    /// Create a new SafeCommandExecutor with working directory validation.
    ///
    /// # Errors
    ///
    /// Returns `CommandError::InvalidWorkingDirectory` if the directory does not exist.
    ///
    /// # Example
    ///
    /// ```rust
    /// use maven_publisher::SafeCommandExecutor;
    ///
    /// let executor = SafeCommandExecutor::new(std::env::temp_dir()).unwrap();
    /// ```
    pub fn new<P: AsRef<Path>>(working_dir: P) -> Result<Self, CommandError> {
        let working_dir = working_dir.as_ref().to_path_buf();

        if !working_dir.exists() {
            return Err(CommandError::InvalidWorkingDirectory(working_dir));
        }

        Ok(Self { working_dir })
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Check a command against the whitelist without running it
    pub fn is_allowed(command: &str) -> bool {
        ALLOWED_COMMANDS.contains(&command)
    }

    /// Execute a command with whitelist validation.
    ///
    /// Arguments are handed to the process as a list; paths may be passed
    /// directly.
    ///
    /// # Errors
    ///
    /// - `CommandError::CommandNotAllowed` - Command not in whitelist
    /// - `CommandError::ExecutionFailed` - Binary not found or execution error
    pub fn execute<I, S>(&self, command: &str, args: I) -> Result<Output, CommandError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        if !Self::is_allowed(command) {
            return Err(CommandError::CommandNotAllowed(command.to_string()));
        }

        // The JDK ships .exe binaries, the formatter wrapper is a .bat/.cmd script
        #[cfg(target_os = "windows")]
        let command_name = if command == "google-java-format" {
            format!("{}.cmd", command)
        } else {
            command.to_string()
        };

        #[cfg(not(target_os = "windows"))]
        let command_name = command.to_string();

        let args: Vec<S> = args.into_iter().collect();
        tracing::debug!(command = %command_name, argc = args.len(), "executing");

        let output = Command::new(&command_name)
            .args(&args)
            .current_dir(&self.working_dir)
            .output()
            .map_err(|e| CommandError::ExecutionFailed(format!("{}: {}", command_name, e)))?;

        Ok(output)
    }
}
