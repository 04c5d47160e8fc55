//! Debounced reload trigger.
//!
//! Content scripts report page unloads; the coordinator debounces those
//! signals into one settled descriptor, validates it against a [`RuleSet`]
//! and asks the host to reload the extension when it passes.
//!
//! [`RuleSet`]: crate::rule::RuleSet

/// Host event wiring and activation.
pub mod coordinator;
/// Trailing-edge debounce state machine.
pub mod debounce;
/// Debounce worker, decision and dispatch.
pub mod dispatcher;

pub use coordinator::TriggerCoordinator;
pub use debounce::Debouncer;
pub use dispatcher::TriggerStats;
