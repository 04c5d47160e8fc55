//! Trigger coordinator: wires host events to the debounce worker.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread;

use crossbeam_channel::{bounded, Sender, TrySendError};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::TriggerConfig;
use crate::gate::{evaluate_gate, Environment, ProcessEnv};
use crate::host::ExtensionHost;
use crate::message::{content_script, UnloadMessage};
use crate::rule::RuleSet;
use crate::tab::{ChangeInfo, TabDescriptor, TabId};

use super::debounce::Debouncer;
use super::dispatcher::{worker_loop, StatsCounters, TriggerStats};

/// State that exists only once the coordinator is active.
///
/// Host listeners hold an `Arc` to this, so the signal channel stays open as
/// long as the host keeps them registered. The host is held weakly since it
/// owns those listeners.
struct ActiveState {
    host: Weak<dyn ExtensionHost>,
    signal_tx: Sender<TabDescriptor>,
    stats: Arc<StatsCounters>,
}

impl ActiveState {
    fn handle_tab_updated(&self, tab_id: TabId, change: &ChangeInfo, tab: &TabDescriptor) {
        if !change.is_complete() {
            return;
        }

        let code = match content_script(tab) {
            Ok(code) => code,
            Err(err) => {
                StatsCounters::bump(&self.stats.injection_failures);
                warn!(%tab_id, error = %err, "could not build unload watcher script");
                return;
            }
        };

        let Some(host) = self.host.upgrade() else {
            debug!(%tab_id, "host dropped; skipping unload watcher");
            return;
        };

        match host.execute_script(tab_id, &code) {
            Ok(()) => {
                StatsCounters::bump(&self.stats.injections);
                debug!(%tab_id, url = tab.url(), "unload watcher injected");
            }
            Err(err) => {
                StatsCounters::bump(&self.stats.injection_failures);
                warn!(%tab_id, error = %err, "unload watcher injection failed");
            }
        }
    }

    fn handle_message(&self, message: &Value) {
        let tab = match UnloadMessage::from_value(message) {
            Ok(Some(msg)) => msg.tab,
            Ok(None) => {
                StatsCounters::bump(&self.stats.messages_ignored);
                return;
            }
            Err(err) => {
                StatsCounters::bump(&self.stats.messages_ignored);
                debug!(error = %err, "dropping malformed unload message");
                return;
            }
        };

        StatsCounters::bump(&self.stats.signals_received);
        match self.signal_tx.try_send(tab) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                StatsCounters::bump(&self.stats.signals_dropped);
                debug!("unload signal queue full; signal dropped");
            }
            Err(TrySendError::Disconnected(_)) => {
                StatsCounters::bump(&self.stats.signals_dropped);
                warn!("debounce worker is gone; unload signal dropped");
            }
        }
    }
}

/// Debounced, rule-gated reload trigger.
///
/// Create one per background process. Until [`activate`](Self::activate)
/// succeeds the coordinator is dormant: its event handlers do nothing.
pub struct TriggerCoordinator {
    rules: Arc<RuleSet>,
    config: TriggerConfig,
    stats: Arc<StatsCounters>,
    active: Mutex<Option<Arc<ActiveState>>>,
}

impl std::fmt::Debug for TriggerCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TriggerCoordinator")
            .field("rules", &self.rules)
            .field("config", &self.config)
            .field("active", &self.is_active())
            .finish_non_exhaustive()
    }
}

impl TriggerCoordinator {
    /// Creates a dormant coordinator validating against `rules`.
    #[must_use]
    pub fn new(rules: RuleSet, config: TriggerConfig) -> Self {
        Self {
            rules: Arc::new(rules),
            config,
            stats: Arc::new(StatsCounters::default()),
            active: Mutex::new(None),
        }
    }

    /// Creates a coordinator with the default configuration.
    #[must_use]
    pub fn with_rules(rules: RuleSet) -> Self {
        Self::new(rules, TriggerConfig::default())
    }

    /// The rules this coordinator validates against.
    #[must_use]
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// The coordinator configuration.
    #[must_use]
    pub const fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Returns true once activation has succeeded.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active_state().is_some()
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> TriggerStats {
        self.stats.snapshot()
    }

    /// Activates against the current process environment.
    pub fn activate_with_process_env(&self, host: Arc<dyn ExtensionHost>) -> bool {
        self.activate(host, Some(&ProcessEnv))
    }

    /// Evaluates the activation gate and, if it opens, starts the debounce
    /// worker and attaches the tab-updated and message listeners to `host`.
    ///
    /// Returns false when the gate is closed; nothing is attached and the
    /// coordinator stays dormant. Activating an active coordinator is a no-op
    /// returning true.
    pub fn activate(&self, host: Arc<dyn ExtensionHost>, env: Option<&dyn Environment>) -> bool {
        let mut active = self.lock_active();
        if active.is_some() {
            debug!("trigger already active");
            return true;
        }

        let decision = evaluate_gate(&self.config, env);
        if !decision.is_open() {
            info!(env_var = %self.config.env_var, ?decision, "reload trigger not activated");
            return false;
        }

        let (signal_tx, signal_rx) =
            bounded::<TabDescriptor>(self.config.signal_queue_capacity.max(1));
        let debouncer = Debouncer::new(self.config.debounce());

        let worker_rules = Arc::clone(&self.rules);
        let worker_host = Arc::downgrade(&host);
        let worker_stats = Arc::clone(&self.stats);
        let spawned = thread::Builder::new()
            .name("reload-trigger-debounce".to_string())
            .spawn(move || {
                worker_loop(worker_rules, worker_host, worker_stats, debouncer, signal_rx);
            });

        if let Err(err) = spawned {
            warn!(error = %err, "failed to spawn debounce worker; trigger not activated");
            return false;
        }

        let state = Arc::new(ActiveState {
            host: Arc::downgrade(&host),
            signal_tx,
            stats: Arc::clone(&self.stats),
        });
        *active = Some(Arc::clone(&state));
        // Release before calling into the host so listener registration may
        // re-enter the coordinator.
        drop(active);

        let on_message = Arc::clone(&state);
        host.add_message_listener(Box::new(move |message: &Value| {
            on_message.handle_message(message);
        }));

        let on_tab = state;
        host.add_tab_updated_listener(Box::new(
            move |tab_id: TabId, change: &ChangeInfo, tab: &TabDescriptor| {
                on_tab.handle_tab_updated(tab_id, change, tab);
            },
        ));

        info!(
            ?decision,
            rules = self.rules.len(),
            debounce_ms = self.config.debounce_ms,
            "reload trigger activated"
        );
        true
    }

    /// Handles a tab lifecycle update. On load completion, injects the unload
    /// watcher into that tab. Does nothing while dormant.
    pub fn on_tab_ready(&self, tab_id: TabId, change: &ChangeInfo, tab: &TabDescriptor) {
        if let Some(state) = self.active_state() {
            state.handle_tab_updated(tab_id, change, tab);
        }
    }

    /// Handles a runtime message. Unload messages feed the debouncer; others
    /// are ignored. Does nothing while dormant.
    pub fn on_unload_signal(&self, message: &Value) {
        if let Some(state) = self.active_state() {
            state.handle_message(message);
        }
    }

    fn lock_active(&self) -> MutexGuard<'_, Option<Arc<ActiveState>>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn active_state(&self) -> Option<Arc<ActiveState>> {
        self.lock_active().clone()
    }
}
