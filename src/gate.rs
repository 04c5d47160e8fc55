//! Development-mode activation gate.
//!
//! The trigger only wires itself up when the environment declares a
//! development build. Checks run in a fixed order: environment presence, then
//! the check flag, then the variable's value.

use std::collections::HashMap;

use crate::config::TriggerConfig;

/// Source of environment variables.
pub trait Environment: Send + Sync {
    /// Looks up a variable.
    fn var(&self, key: &str) -> Option<String>;
}

/// The current process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl Environment for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Outcome of the activation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// The host exposes no environment at all; nothing to check against.
    NoEnvironment,
    /// The check is disabled in configuration.
    Bypassed,
    /// The variable names a development environment.
    Accepted {
        /// Raw variable value.
        value: String,
    },
    /// The variable is unset or names another environment.
    Rejected {
        /// Raw variable value, if set.
        value: Option<String>,
    },
}

impl GateDecision {
    /// Returns true if activation may proceed.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Evaluates the gate for `config` against `env`.
#[must_use]
pub fn evaluate_gate(config: &TriggerConfig, env: Option<&dyn Environment>) -> GateDecision {
    let Some(env) = env else {
        return GateDecision::NoEnvironment;
    };

    if !config.env_check {
        return GateDecision::Bypassed;
    }

    match env.var(&config.env_var) {
        Some(value) => {
            let normalized = value.trim();
            if config
                .accepted_envs
                .iter()
                .any(|accepted| accepted.eq_ignore_ascii_case(normalized))
            {
                GateDecision::Accepted { value }
            } else {
                GateDecision::Rejected { value: Some(value) }
            }
        }
        None => GateDecision::Rejected { value: None },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env_with(value: &str) -> HashMap<String, String> {
        HashMap::from([("NODE_ENV".to_string(), value.to_string())])
    }

    #[test]
    fn accepts_development_values_case_and_space_insensitive() {
        let cfg = TriggerConfig::default();
        for value in ["development", "dev", "  Dev ", "DEVELOPMENT\n"] {
            let env = env_with(value);
            let decision = evaluate_gate(&cfg, Some(&env));
            assert!(decision.is_open(), "{value:?} should open the gate");
            assert!(matches!(decision, GateDecision::Accepted { .. }));
        }
    }

    #[test]
    fn rejects_other_values() {
        let cfg = TriggerConfig::default();
        let env = env_with("production");
        assert_eq!(
            evaluate_gate(&cfg, Some(&env)),
            GateDecision::Rejected {
                value: Some("production".to_string())
            }
        );
    }

    #[test]
    fn unset_variable_is_rejected() {
        let cfg = TriggerConfig::default();
        let env: HashMap<String, String> = HashMap::new();
        assert_eq!(evaluate_gate(&cfg, Some(&env)), GateDecision::Rejected { value: None });
    }

    #[test]
    fn disabled_check_bypasses() {
        let cfg = TriggerConfig::default().disable_env_check();
        let env = env_with("production");
        assert_eq!(evaluate_gate(&cfg, Some(&env)), GateDecision::Bypassed);
    }

    #[test]
    fn missing_environment_is_checked_before_the_flag() {
        assert_eq!(
            evaluate_gate(&TriggerConfig::default(), None),
            GateDecision::NoEnvironment
        );
        assert_eq!(
            evaluate_gate(&TriggerConfig::default().disable_env_check(), None),
            GateDecision::NoEnvironment
        );
    }

    #[test]
    fn custom_variable_name() {
        let cfg = TriggerConfig {
            env_var: "EXT_MODE".to_string(),
            ..TriggerConfig::default()
        };
        let env = HashMap::from([("EXT_MODE".to_string(), "dev".to_string())]);
        assert!(evaluate_gate(&cfg, Some(&env)).is_open());
        assert!(!evaluate_gate(&cfg, Some(&env_with("dev"))).is_open());
    }
}
