//! Debounce worker.
//!
//! Host callbacks enqueue unload signals on a bounded channel and never block.
//! A dedicated worker thread owns the single debounce slot; when the slot
//! settles it validates the latest descriptor and, only if that passes,
//! dispatches the reload through the host.
//!
//! Each settle runs on a short-lived scoped thread. A panicking custom rule
//! unwinds that thread and reaches the panic hook; the worker keeps serving
//! later signals.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::thread;
use std::time::Instant;

use chrono::{DateTime, Utc};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use tracing::{debug, info, warn};

use crate::host::ExtensionHost;
use crate::rule::RuleSet;
use crate::tab::TabDescriptor;

use super::debounce::Debouncer;

/// Point-in-time snapshot of trigger counters.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerStats {
    pub signals_received: u64,
    pub signals_superseded: u64,
    pub signals_dropped: u64,
    pub messages_ignored: u64,
    pub injections: u64,
    pub injection_failures: u64,
    pub validations: u64,
    pub rule_panics: u64,
    pub reloads: u64,
    pub reload_failures: u64,
    pub last_reload_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    pub signals_received: AtomicU64,
    pub signals_superseded: AtomicU64,
    pub signals_dropped: AtomicU64,
    pub messages_ignored: AtomicU64,
    pub injections: AtomicU64,
    pub injection_failures: AtomicU64,
    pub validations: AtomicU64,
    pub rule_panics: AtomicU64,
    pub reloads: AtomicU64,
    pub reload_failures: AtomicU64,
    pub last_reload_at: Mutex<Option<DateTime<Utc>>>,
}

impl StatsCounters {
    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> TriggerStats {
        TriggerStats {
            signals_received: self.signals_received.load(Ordering::Relaxed),
            signals_superseded: self.signals_superseded.load(Ordering::Relaxed),
            signals_dropped: self.signals_dropped.load(Ordering::Relaxed),
            messages_ignored: self.messages_ignored.load(Ordering::Relaxed),
            injections: self.injections.load(Ordering::Relaxed),
            injection_failures: self.injection_failures.load(Ordering::Relaxed),
            validations: self.validations.load(Ordering::Relaxed),
            rule_panics: self.rule_panics.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
            reload_failures: self.reload_failures.load(Ordering::Relaxed),
            last_reload_at: *self
                .last_reload_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Outcome of validating a settled descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Reload,
    Skip,
}

pub(crate) fn decide(rules: &RuleSet, tab: &TabDescriptor) -> Decision {
    if rules.validate(tab) {
        Decision::Reload
    } else {
        Decision::Skip
    }
}

pub(crate) fn dispatch(host: &dyn ExtensionHost, stats: &StatsCounters, decision: Decision) {
    if decision == Decision::Skip {
        return;
    }

    match host.reload_extension() {
        Ok(()) => {
            StatsCounters::bump(&stats.reloads);
            *stats
                .last_reload_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());
            info!("extension reload dispatched");
        }
        Err(err) => {
            StatsCounters::bump(&stats.reload_failures);
            warn!(error = %err, "extension reload failed");
        }
    }
}

/// Validates and dispatches one settled descriptor off the worker's stack.
pub(crate) fn settle(
    rules: &RuleSet,
    host: &dyn ExtensionHost,
    stats: &StatsCounters,
    tab: &TabDescriptor,
) {
    let outcome = thread::scope(|scope| {
        thread::Builder::new()
            .name("reload-trigger-settle".to_string())
            .spawn_scoped(scope, || {
                let decision = decide(rules, tab);
                debug!(url = tab.url(), ?decision, "debounce settled");
                dispatch(host, stats, decision);
            })
            .map(|handle| handle.join().is_ok())
    });

    match outcome {
        Ok(true) => {}
        Ok(false) => {
            StatsCounters::bump(&stats.rule_panics);
            warn!(url = tab.url(), "rule evaluation panicked; signal discarded");
        }
        Err(err) => {
            warn!(error = %err, "failed to spawn settle thread; signal discarded");
        }
    }
}

pub(crate) fn worker_loop(
    rules: Arc<RuleSet>,
    host: Weak<dyn ExtensionHost>,
    stats: Arc<StatsCounters>,
    mut debouncer: Debouncer<TabDescriptor>,
    signal_rx: Receiver<TabDescriptor>,
) {
    loop {
        let received = match debouncer.deadline() {
            None => match signal_rx.recv() {
                Ok(tab) => Some(tab),
                Err(_) => break,
            },
            Some(deadline) => match signal_rx.recv_deadline(deadline) {
                Ok(tab) => Some(tab),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
        };

        if let Some(tab) = received {
            if let Some(superseded) = debouncer.push(tab, Instant::now()) {
                StatsCounters::bump(&stats.signals_superseded);
                debug!(url = superseded.url(), "unload signal superseded");
            }
            continue;
        }

        if let Some(tab) = debouncer.poll(Instant::now()) {
            let Some(host) = host.upgrade() else {
                debug!("host dropped; worker exiting");
                break;
            };
            StatsCounters::bump(&stats.validations);
            settle(&rules, host.as_ref(), &stats, &tab);
        }
    }

    debug!(pending = debouncer.is_pending(), "unload signal channel closed; worker exiting");
}

#[cfg(test)]
mod tests {
    use crate::host::InMemoryHost;

    use super::*;

    #[test]
    fn decide_separates_decision_from_action() {
        let mut rules = RuleSet::new();
        rules.add_url_rule("https://a.test");

        assert_eq!(decide(&rules, &TabDescriptor::new("https://a.test")), Decision::Reload);
        assert_eq!(decide(&rules, &TabDescriptor::new("https://b.test")), Decision::Skip);
    }

    #[test]
    fn dispatch_skip_does_not_touch_host() {
        let host = InMemoryHost::new();
        let stats = StatsCounters::default();
        dispatch(&host, &stats, Decision::Skip);
        assert_eq!(host.reload_count(), 0);
        assert_eq!(stats.snapshot(), TriggerStats::default());
    }

    #[test]
    fn dispatch_reload_records_outcome() {
        let host = InMemoryHost::new();
        let stats = StatsCounters::default();

        dispatch(&host, &stats, Decision::Reload);
        assert_eq!(host.reload_count(), 1);
        let snap = stats.snapshot();
        assert_eq!(snap.reloads, 1);
        assert!(snap.last_reload_at.is_some());

        host.set_fail_reloads(true);
        dispatch(&host, &stats, Decision::Reload);
        assert_eq!(stats.snapshot().reload_failures, 1);
    }

    #[test]
    fn settle_contains_rule_panics() {
        let host = InMemoryHost::new();
        let stats = StatsCounters::default();
        let mut rules = RuleSet::new();
        rules.add_custom_rule(|tab| {
            assert!(tab.url() != Some("https://boom.test"), "rule blew up");
            true
        });

        settle(&rules, &host, &stats, &TabDescriptor::new("https://boom.test"));
        assert_eq!(stats.snapshot().rule_panics, 1);
        assert_eq!(host.reload_count(), 0);

        settle(&rules, &host, &stats, &TabDescriptor::new("https://a.test"));
        let snap = stats.snapshot();
        assert_eq!(snap.rule_panics, 1);
        assert_eq!(snap.reloads, 1);
        assert_eq!(host.reload_count(), 1);
    }
}
