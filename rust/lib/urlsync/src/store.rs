use std::any::Any;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::pattern::Pattern;
use crate::traits::{ChangeHandler, ViewState};
use crate::value::{StateValue, SubscriptionId};

/// Path-keyed view-state store with pattern-routed change notifications.
///
/// - `set(path, value)` stores a value and notifies matching watchers.
/// - `unset(path)` removes a value and notifies matching watchers with `None`.
/// - `get(path)` reads the current value (Arc clone, cheap).
/// - `subscribe(pattern, handler)` registers a change handler.
///
/// Handlers run after all internal locks are released, so they may read,
/// write and (un)subscribe on the same store.
pub struct StateStore {
    values: RwLock<BTreeMap<String, StateValue>>,
    handlers: RwLock<Vec<HandlerEntry>>,
    next_id: AtomicU64,
}

#[derive(Clone)]
struct HandlerEntry {
    id: SubscriptionId,
    pattern: Pattern,
    handler: ChangeHandler,
}

impl StateStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(BTreeMap::new()),
            handlers: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Set a typed value at the given path and notify matching watchers.
    pub fn set<T: Any + Send + Sync>(&self, path: &str, value: T) {
        self.set_value(path, StateValue::new(value));
    }

    pub fn set_value(&self, path: &str, value: StateValue) {
        {
            let mut values = self.values.write().unwrap();
            values.insert(path.to_string(), value.clone());
        }
        self.notify(path, Some(&value));
    }

    /// Remove the value at `path` and notify watchers with `None`.
    ///
    /// Unsetting a path that holds nothing is silent.
    pub fn unset(&self, path: &str) {
        let removed = {
            let mut values = self.values.write().unwrap();
            values.remove(path)
        };
        if removed.is_some() {
            self.notify(path, None);
        }
    }

    /// Remove the value at `path` without notifying anyone.
    pub fn remove(&self, path: &str) -> Option<StateValue> {
        let mut values = self.values.write().unwrap();
        values.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<StateValue> {
        let values = self.values.read().unwrap();
        values.get(path).cloned()
    }

    /// Typed read; `None` when unset or holding another type.
    pub fn get_as<T: Any + Clone>(&self, path: &str) -> Option<T> {
        self.get(path).and_then(|v| v.downcast_ref::<T>().cloned())
    }

    pub fn contains(&self, path: &str) -> bool {
        let values = self.values.read().unwrap();
        values.contains_key(path)
    }

    pub fn len(&self) -> usize {
        let values = self.values.read().unwrap();
        values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Subscribe to changes on paths matching `pattern`.
    ///
    /// The handler is called synchronously on the thread that writes.
    pub fn subscribe<F>(&self, pattern: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&str, Option<&StateValue>) + Send + Sync + 'static,
    {
        self.subscribe_handler(pattern, Arc::new(handler))
    }

    fn subscribe_handler(&self, pattern: &str, handler: ChangeHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self.handlers.write().unwrap();
        handlers.push(HandlerEntry {
            id,
            pattern: Pattern::parse(pattern),
            handler,
        });
        id
    }

    /// Unsubscribe a handler by its ID and the pattern it was registered with.
    pub fn unsubscribe(&self, pattern: &str, id: SubscriptionId) {
        let mut handlers = self.handlers.write().unwrap();
        handlers.retain(|entry| !(entry.id == id && entry.pattern.as_str() == pattern));
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.handlers.read().unwrap().len()
    }

    fn notify(&self, path: &str, value: Option<&StateValue>) {
        let matched: Vec<ChangeHandler> = {
            let handlers = self.handlers.read().unwrap();
            handlers
                .iter()
                .filter(|entry| entry.pattern.matches(path))
                .map(|entry| Arc::clone(&entry.handler))
                .collect()
        };
        for handler in matched {
            handler(path, value);
        }
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewState for StateStore {
    fn get(&self, path: &str) -> Option<StateValue> {
        StateStore::get(self, path)
    }

    fn set(&self, path: &str, value: Option<StateValue>) {
        match value {
            Some(v) => self.set_value(path, v),
            None => self.unset(path),
        }
    }

    fn watch(&self, pattern: &str, handler: ChangeHandler) -> SubscriptionId {
        self.subscribe_handler(pattern, handler)
    }

    fn unwatch(&self, pattern: &str, id: SubscriptionId) {
        self.unsubscribe(pattern, id);
    }
}
