//! Extension host boundary.
//!
//! The trigger never talks to browser APIs directly. Hosts implement
//! [`ExtensionHost`] over whatever runtime they live in (a WebExtension
//! binding, a test harness, [`memory::InMemoryHost`]).

use serde_json::Value;

use crate::error::HostError;
use crate::tab::{ChangeInfo, TabDescriptor, TabId};

/// In-process host for tests and embedding.
pub mod memory;

pub use memory::InMemoryHost;

/// Callback for tab lifecycle updates.
pub type TabUpdatedListener = Box<dyn Fn(TabId, &ChangeInfo, &TabDescriptor) + Send + Sync>;

/// Callback for cross-context messages.
pub type MessageListener = Box<dyn Fn(&Value) + Send + Sync>;

/// Host APIs consumed by the trigger.
///
/// Listeners stay registered for the life of the host.
pub trait ExtensionHost: Send + Sync {
    /// Registers a callback invoked on every tab state change.
    fn add_tab_updated_listener(&self, listener: TabUpdatedListener);

    /// Registers a callback invoked on every runtime message.
    fn add_message_listener(&self, listener: MessageListener);

    /// Executes `code` in the content context of a tab.
    fn execute_script(&self, tab_id: TabId, code: &str) -> Result<(), HostError>;

    /// Restarts the extension's own process.
    fn reload_extension(&self) -> Result<(), HostError>;
}
