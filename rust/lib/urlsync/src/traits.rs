use std::sync::Arc;

use crate::query::{QueryParams, QueryUpdate};
use crate::value::{StateValue, SubscriptionId};

/// Callback for view-state changes: `(path, new value or None when unset)`.
pub type ChangeHandler = Arc<dyn Fn(&str, Option<&StateValue>) + Send + Sync>;

/// Callback for location changes, receives the query after the change.
pub type LocationHandler = Arc<dyn Fn(&QueryParams) + Send + Sync>;

/// The view-state store the engine reads from and writes to.
///
/// Paths are `/`-separated. Watch patterns accept `+` and `#` wildcards.
/// Implementations must not hold internal locks while invoking handlers,
/// since handlers write back into the store.
pub trait ViewState: Send + Sync + 'static {
    /// Current value at `path`, `None` when unset.
    fn get(&self, path: &str) -> Option<StateValue>;

    /// Write a value, or unset the path with `None`, and notify watchers.
    fn set(&self, path: &str, value: Option<StateValue>);

    /// Register a handler for changes on paths matching `pattern`.
    fn watch(&self, pattern: &str, handler: ChangeHandler) -> SubscriptionId;

    /// Remove a handler registered with `watch`.
    fn unwatch(&self, pattern: &str, id: SubscriptionId);
}

/// How an outbound URL update interacts with navigation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryMode {
    /// Create a new history entry.
    #[default]
    Push,
    /// Overwrite the current history entry.
    Replace,
}

/// The URL/location service holding the query string.
pub trait Location: Send + Sync + 'static {
    /// Snapshot of the current query parameters.
    fn query(&self) -> QueryParams;

    /// Merge `changes` into the query; a `None` value removes the key.
    fn update(&self, changes: QueryUpdate, mode: HistoryMode);

    /// Register a handler called after every location change.
    fn listen(&self, handler: LocationHandler) -> SubscriptionId;

    fn unlisten(&self, id: SubscriptionId);
}
