//! State machine recording the progress of a release pipeline run
//!
//! Every stage transition is persisted atomically to `.publish-state.json`
//! so an operator can inspect where the last run stopped.

use super::error::PublishError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::fs;

/// State file name
const STATE_FILE: &str = ".publish-state.json";

/// Pipeline stage
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PipelineState {
    Initial,
    Resolving,
    Compiling,
    Formatting,
    Packaging,
    Signing,
    Publishing,
    Success,
    Failed,
}

impl PipelineState {
    /// Terminal states end a run
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Failed)
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Initial => "INITIAL",
            Self::Resolving => "RESOLVING",
            Self::Compiling => "COMPILING",
            Self::Formatting => "FORMATTING",
            Self::Packaging => "PACKAGING",
            Self::Signing => "SIGNING",
            Self::Publishing => "PUBLISHING",
            Self::Success => "SUCCESS",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: PipelineState,
    pub to: PipelineState,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

/// Persisted pipeline state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineStateData {
    #[serde(rename = "currentState")]
    pub current_state: PipelineState,

    /// Version being released
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Endpoint selected for upload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,

    pub transitions: Vec<StateTransition>,

    /// Last error message (if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State machine for tracking a pipeline run
pub struct PipelineStateMachine {
    current_state: PipelineState,
    transitions: Vec<StateTransition>,
    state_file_path: PathBuf,
    version: Option<String>,
    repository: Option<String>,
    error: Option<String>,
}

impl PipelineStateMachine {
    pub fn new<P: AsRef<Path>>(project_path: P) -> Self {
        let state_file_path = project_path.as_ref().join(STATE_FILE);

        Self {
            current_state: PipelineState::Initial,
            transitions: Vec::new(),
            state_file_path,
            version: None,
            repository: None,
            error: None,
        }
    }

    /// Transition to a new state and persist it
    ///
    /// Recognised metadata keys (`version`, `repository`, `error`) are
    /// lifted into the top-level state record.
    pub async fn transition(
        &mut self,
        to: PipelineState,
        metadata: Option<HashMap<String, serde_json::Value>>,
    ) -> Result<(), PublishError> {
        if let Some(meta) = &metadata {
            if let Some(serde_json::Value::String(version)) = meta.get("version") {
                self.version = Some(version.clone());
            }
            if let Some(serde_json::Value::String(repository)) = meta.get("repository") {
                self.repository = Some(repository.clone());
            }
            if let Some(serde_json::Value::String(error)) = meta.get("error") {
                self.error = Some(error.clone());
            }
        }

        self.transitions.push(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
            metadata,
        });
        self.current_state = to;

        self.save().await
    }

    /// Record a failure with its message
    pub async fn fail(&mut self, message: &str) -> Result<(), PublishError> {
        let mut metadata = HashMap::new();
        metadata.insert(
            "error".to_string(),
            serde_json::Value::String(message.to_string()),
        );
        self.transition(PipelineState::Failed, Some(metadata)).await
    }

    pub fn get_state(&self) -> PipelineState {
        self.current_state
    }

    pub fn get_state_data(&self) -> PipelineStateData {
        PipelineStateData {
            current_state: self.current_state,
            version: self.version.clone(),
            repository: self.repository.clone(),
            transitions: self.transitions.clone(),
            error: self.error.clone(),
        }
    }

    /// Restore state from file
    ///
    /// Returns `false` when no state file exists.
    pub async fn restore(&mut self) -> Result<bool, PublishError> {
        if !self.state_file_path.exists() {
            return Ok(false);
        }

        let content = fs::read_to_string(&self.state_file_path).await?;
        let data: PipelineStateData = serde_json::from_str(&content)
            .map_err(|e| PublishError::StateCorrupted(e.to_string()))?;

        self.current_state = data.current_state;
        self.version = data.version;
        self.repository = data.repository;
        self.error = data.error;
        self.transitions = data.transitions;

        Ok(true)
    }

    /// Save state to file (atomic operation)
    async fn save(&self) -> Result<(), PublishError> {
        let json = serde_json::to_string_pretty(&self.get_state_data())
            .map_err(|e| PublishError::StateCorrupted(e.to_string()))?;

        // write to temp file, then rename
        let temp_file = self.state_file_path.with_extension("json.tmp");
        fs::write(&temp_file, json).await?;
        fs::rename(&temp_file, &self.state_file_path).await?;

        Ok(())
    }

    /// Remove the state file and reset
    pub async fn clear(&mut self) -> Result<(), PublishError> {
        if self.state_file_path.exists() {
            fs::remove_file(&self.state_file_path).await?;
        }

        self.current_state = PipelineState::Initial;
        self.transitions.clear();
        self.version = None;
        self.repository = None;
        self.error = None;

        Ok(())
    }

    pub fn get_last_error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Milliseconds between the first and last recorded transition
    pub fn get_elapsed_time(&self) -> i64 {
        match (self.transitions.first(), self.transitions.last()) {
            (Some(first), Some(last)) => (last.timestamp - first.timestamp).num_milliseconds(),
            _ => 0,
        }
    }

    /// Get transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                let time = t.timestamp.to_rfc3339();
                let meta = if let Some(metadata) = &t.metadata {
                    format!(" ({})", serde_json::to_string(metadata).unwrap_or_default())
                } else {
                    String::new()
                };
                format!("{}: {} → {}{}", time, t.from, t.to, meta)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
