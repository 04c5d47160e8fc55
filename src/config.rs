//! Trigger configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for a [`TriggerCoordinator`](crate::trigger::TriggerCoordinator).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerConfig {
    /// Quiet period after the last unload signal before validation runs.
    pub debounce_ms: u64,
    /// Whether activation requires a development environment.
    pub env_check: bool,
    /// Environment variable read by the activation gate.
    pub env_var: String,
    /// Accepted values for `env_var`, compared trimmed and lower-cased.
    pub accepted_envs: Vec<String>,
    /// Max queued unload signals before new ones are dropped.
    pub signal_queue_capacity: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 50,
            env_check: true,
            env_var: "NODE_ENV".to_string(),
            accepted_envs: vec!["development".to_string(), "dev".to_string()],
            signal_queue_capacity: 1024,
        }
    }
}

impl TriggerConfig {
    /// Activates regardless of the environment.
    #[must_use]
    pub fn disable_env_check(mut self) -> Self {
        self.env_check = false;
        self
    }

    /// Sets the debounce window.
    #[must_use]
    pub fn with_debounce(mut self, window: Duration) -> Self {
        self.debounce_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// The debounce window.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = TriggerConfig::default();
        assert_eq!(cfg.debounce(), Duration::from_millis(50));
        assert!(cfg.env_check);
        assert_eq!(cfg.env_var, "NODE_ENV");
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let cfg: TriggerConfig = serde_json::from_str(r#"{"debounce_ms": 200}"#).unwrap();
        assert_eq!(cfg.debounce(), Duration::from_millis(200));
        assert!(cfg.env_check);
        assert_eq!(cfg.accepted_envs, vec!["development", "dev"]);
    }

    #[test]
    fn builders() {
        let cfg = TriggerConfig::default()
            .disable_env_check()
            .with_debounce(Duration::from_millis(10));
        assert!(!cfg.env_check);
        assert_eq!(cfg.debounce_ms, 10);
    }
}
