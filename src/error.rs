//! Error types for reload-trigger.
//!
//! Errors are strongly typed using thiserror. Most of the trigger protocol
//! degrades instead of failing (invalid patterns never match, foreign messages
//! are ignored, a closed activation gate is a `false` return), so these types
//! surface mainly from strict loading paths and from the host boundary.

use thiserror::Error;

use crate::tab::TabId;

/// Validation errors raised while building rules or decoding messages.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid URL pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: String,
    },

    #[error("Invalid rule spec: {reason}")]
    InvalidRuleSpec {
        reason: String,
    },

    #[error("Invalid unload message: {reason}")]
    InvalidMessage {
        reason: String,
    },
}

/// Execution errors raised while running the trigger protocol.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("Channel disconnected: {path}")]
    Disconnected {
        path: String,
    },

    #[error("I/O error on {path}: {message}")]
    Io {
        path: String,
        message: String,
    },

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
    },
}

/// Failures reported by the extension host.
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Script injection into tab {tab_id} failed: {message}")]
    ScriptInjection {
        tab_id: TabId,
        message: String,
    },

    #[error("Extension reload failed: {message}")]
    Reload {
        message: String,
    },

    #[error("Host API unavailable: {api}")]
    Unavailable {
        api: String,
    },
}

/// Top-level error type for reload-trigger.
#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Execution error: {0}")]
    Execution(#[from] ExecutionError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

impl TriggerError {
    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is an execution error.
    #[must_use]
    pub const fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Returns true if this is a host error.
    #[must_use]
    pub const fn is_host(&self) -> bool {
        matches!(self, Self::Host(_))
    }
}

/// Result type alias for reload-trigger operations.
pub type TriggerResult<T> = Result<T, TriggerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_pattern() {
        let err = ValidationError::InvalidPattern {
            pattern: "not-a-pattern".to_string(),
            reason: "missing delimiters".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("not-a-pattern"));
        assert!(msg.contains("missing delimiters"));
    }

    #[test]
    fn test_host_error_script_injection() {
        let err = HostError::ScriptInjection {
            tab_id: TabId::new(42),
            message: "no permission".to_string(),
        };
        let msg = format!("{err}");
        assert!(msg.contains("tab 42"));
        assert!(msg.contains("no permission"));
    }

    #[test]
    fn test_trigger_error_from_validation() {
        let err: TriggerError = ValidationError::InvalidRuleSpec {
            reason: "bad".to_string(),
        }
        .into();
        assert!(err.is_validation());
        assert!(!err.is_execution());
        assert!(!err.is_host());
    }

    #[test]
    fn test_trigger_error_from_execution() {
        let err: TriggerError = ExecutionError::Disconnected {
            path: "unload_signals".to_string(),
        }
        .into();
        assert!(err.is_execution());
        assert!(format!("{err}").contains("unload_signals"));
    }

    #[test]
    fn test_trigger_error_from_host() {
        let err: TriggerError = HostError::Reload {
            message: "runtime gone".to_string(),
        }
        .into();
        assert!(err.is_host());
        assert!(format!("{err}").contains("runtime gone"));
    }
}
