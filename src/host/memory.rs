//! In-memory extension host.
//!
//! Records injected scripts and reload requests, and lets callers emit
//! synthetic tab and message events into registered listeners. Intended for
//! tests and for exercising rule sets without a browser.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, Sender};
use serde_json::Value;

use crate::error::{HostError, TriggerResult};
use crate::message::UnloadMessage;
use crate::tab::{ChangeInfo, TabDescriptor, TabId};

use super::{ExtensionHost, MessageListener, TabUpdatedListener};

type SharedTabListener = Arc<dyn Fn(TabId, &ChangeInfo, &TabDescriptor) + Send + Sync>;
type SharedMessageListener = Arc<dyn Fn(&Value) + Send + Sync>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A script injection recorded by [`InMemoryHost`].
#[allow(missing_docs)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injection {
    pub tab_id: TabId,
    pub code: String,
}

/// Thread-safe in-process [`ExtensionHost`].
pub struct InMemoryHost {
    tab_listeners: Mutex<Vec<SharedTabListener>>,
    message_listeners: Mutex<Vec<SharedMessageListener>>,
    injections: Mutex<Vec<Injection>>,
    reloads: AtomicU64,
    reload_tx: Sender<()>,
    reload_rx: Receiver<()>,
    fail_injections: AtomicBool,
    fail_reloads: AtomicBool,
}

impl Default for InMemoryHost {
    fn default() -> Self {
        let (reload_tx, reload_rx) = unbounded();
        Self {
            tab_listeners: Mutex::new(Vec::new()),
            message_listeners: Mutex::new(Vec::new()),
            injections: Mutex::new(Vec::new()),
            reloads: AtomicU64::new(0),
            reload_tx,
            reload_rx,
            fail_injections: AtomicBool::new(false),
            fail_reloads: AtomicBool::new(false),
        }
    }
}

impl std::fmt::Debug for InMemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryHost")
            .field("tab_listeners", &lock(&self.tab_listeners).len())
            .field("message_listeners", &lock(&self.message_listeners).len())
            .field("injections", &lock(&self.injections).len())
            .field("reloads", &self.reload_count())
            .finish_non_exhaustive()
    }
}

impl InMemoryHost {
    /// Creates a host with no listeners.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delivers a tab update to every registered tab listener.
    pub fn emit_tab_updated(&self, tab_id: TabId, change: &ChangeInfo, tab: &TabDescriptor) {
        // Snapshot so listeners may call back into the host.
        let listeners = lock(&self.tab_listeners).clone();
        for listener in listeners {
            listener(tab_id, change, tab);
        }
    }

    /// Delivers a message to every registered message listener.
    pub fn emit_message(&self, message: &Value) {
        let listeners = lock(&self.message_listeners).clone();
        for listener in listeners {
            listener(message);
        }
    }

    /// Delivers the message an injected content script sends when `tab` unloads.
    pub fn emit_unload(&self, tab: &TabDescriptor) -> TriggerResult<()> {
        let message = UnloadMessage::new(tab.clone()).to_value()?;
        self.emit_message(&message);
        Ok(())
    }

    /// Number of registered tab listeners.
    #[must_use]
    pub fn tab_listener_count(&self) -> usize {
        lock(&self.tab_listeners).len()
    }

    /// Number of registered message listeners.
    #[must_use]
    pub fn message_listener_count(&self) -> usize {
        lock(&self.message_listeners).len()
    }

    /// Scripts injected so far, oldest first.
    #[must_use]
    pub fn injections(&self) -> Vec<Injection> {
        lock(&self.injections).clone()
    }

    /// Number of successful reloads.
    #[must_use]
    pub fn reload_count(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    /// Blocks until the next reload, or returns false after `timeout`.
    #[must_use]
    pub fn wait_for_reload(&self, timeout: Duration) -> bool {
        self.reload_rx.recv_timeout(timeout).is_ok()
    }

    /// Makes subsequent script injections fail.
    pub fn set_fail_injections(&self, fail: bool) {
        self.fail_injections.store(fail, Ordering::Relaxed);
    }

    /// Makes subsequent reloads fail.
    pub fn set_fail_reloads(&self, fail: bool) {
        self.fail_reloads.store(fail, Ordering::Relaxed);
    }
}

impl ExtensionHost for InMemoryHost {
    fn add_tab_updated_listener(&self, listener: TabUpdatedListener) {
        lock(&self.tab_listeners).push(Arc::from(listener));
    }

    fn add_message_listener(&self, listener: MessageListener) {
        lock(&self.message_listeners).push(Arc::from(listener));
    }

    fn execute_script(&self, tab_id: TabId, code: &str) -> Result<(), HostError> {
        if self.fail_injections.load(Ordering::Relaxed) {
            return Err(HostError::ScriptInjection {
                tab_id,
                message: "injection disabled".to_string(),
            });
        }

        lock(&self.injections).push(Injection {
            tab_id,
            code: code.to_string(),
        });
        Ok(())
    }

    fn reload_extension(&self) -> Result<(), HostError> {
        if self.fail_reloads.load(Ordering::Relaxed) {
            return Err(HostError::Reload {
                message: "reload disabled".to_string(),
            });
        }

        self.reloads.fetch_add(1, Ordering::Relaxed);
        let _ = self.reload_tx.send(());
        Ok(())
    }
}
