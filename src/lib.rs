//! # reload-trigger - Rule-gated self-reload for extensions under development
//!
//! While an extension is being developed, reloading it by hand after every
//! change gets old fast. reload-trigger watches the pages a developer is
//! iterating on and reloads the extension when one of them navigates away,
//! but only for tabs that pass a configurable set of rules.
//!
//! ## Core Concepts
//!
//! - **TabDescriptor**: A value snapshot of a browser tab (URL, id, host fields)
//! - **RuleSet**: Ordered predicates combined with all-must-pass semantics
//! - **TriggerCoordinator**: Debounces unload signals and dispatches the reload
//! - **ExtensionHost**: The host API boundary (listeners, script injection, reload)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use reload_trigger::{RuleSet, TriggerConfig, TriggerCoordinator};
//!
//! let mut rules = RuleSet::new();
//! rules
//!     .add_pattern_rule(r"/^https:\/\/localhost:8080\//")
//!     .add_custom_rule(|tab| tab.id.is_some());
//!
//! let trigger = TriggerCoordinator::new(rules, TriggerConfig::default());
//! let active = trigger.activate_with_process_env(host);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod gate;
pub mod host;
pub mod message;
pub mod pattern;
pub mod rule;
pub mod tab;
pub mod trigger;

// Re-export primary types at crate root for convenience
pub use config::TriggerConfig;
pub use error::{ExecutionError, HostError, TriggerError, TriggerResult, ValidationError};
pub use gate::{evaluate_gate, Environment, GateDecision, ProcessEnv};
pub use host::{ExtensionHost, InMemoryHost, MessageListener, TabUpdatedListener};
pub use message::{content_script, UnloadMessage, INJECT_ACTION};
pub use pattern::UrlPattern;
pub use rule::{Predicate, Rule, RuleKind, RuleSet, RuleSpec};
pub use tab::{ChangeInfo, TabDescriptor, TabId, TabStatus};
pub use trigger::{Debouncer, TriggerCoordinator, TriggerStats};
