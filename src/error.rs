//! Error handling for the validation engine
//!
//! All engine-level failures are recoverable: the runner substitutes a
//! synthetic Critical Fail result for the offending rule and keeps the
//! batch alive. These types exist so rules can report failure through
//! `Result` instead of panicking, and so the substitution boundary has
//! something structured to log.

use thiserror::Error;

/// Errors surfaced by rule evaluation or engine configuration.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Rule '{rule_id}' not found in registry")]
    RuleNotFound { rule_id: String },

    #[error("Rule '{rule_id}' evaluation failed: {message}")]
    RuleExecution { rule_id: String, message: String },

    #[error("Rule '{rule_id}' timed out after {timeout_ms}ms")]
    RuleTimeout { rule_id: String, timeout_ms: u64 },

    #[error("Snapshot is missing required data: {message}")]
    MissingData { message: String },

    #[error("Invalid engine configuration: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn execution(rule_id: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::RuleExecution {
            rule_id: rule_id.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
