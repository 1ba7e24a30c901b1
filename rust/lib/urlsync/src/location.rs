use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::debug;

use crate::query::{QueryParams, QueryUpdate};
use crate::traits::{HistoryMode, Location, LocationHandler};
use crate::value::SubscriptionId;

/// In-memory location service with a navigable history stack.
///
/// Programmatic writes go through [`Location::update`] and never notify
/// listeners. Listeners hear about external navigation only: `navigate`,
/// `back` and `forward`, the way a browser reports user-driven changes.
pub struct MemoryLocation {
    history: Mutex<History>,
    listeners: RwLock<Vec<(SubscriptionId, LocationHandler)>>,
    next_id: AtomicU64,
}

struct History {
    entries: Vec<QueryParams>,
    index: usize,
    pushes: u64,
    replaces: u64,
}

/// Counters for programmatic writes, split by history mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocationStats {
    pub pushes: u64,
    pub replaces: u64,
}

impl LocationStats {
    pub fn writes(&self) -> u64 {
        self.pushes + self.replaces
    }
}

impl MemoryLocation {
    pub fn new() -> Self {
        Self::with_query("")
    }

    /// Start with a single history entry holding `query`.
    pub fn with_query(query: &str) -> Self {
        Self {
            history: Mutex::new(History {
                entries: vec![QueryParams::parse(query)],
                index: 0,
                pushes: 0,
                replaces: 0,
            }),
            listeners: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Current query as `?key=value...`, or `""` when empty.
    pub fn search(&self) -> String {
        let query = self.query().to_query_string();
        if query.is_empty() {
            query
        } else {
            format!("?{query}")
        }
    }

    /// Encoded query string of every history entry, oldest first.
    pub fn history(&self) -> Vec<String> {
        let history = self.history.lock().unwrap();
        history.entries.iter().map(QueryParams::to_query_string).collect()
    }

    pub fn current_index(&self) -> usize {
        self.history.lock().unwrap().index
    }

    pub fn stats(&self) -> LocationStats {
        let history = self.history.lock().unwrap();
        LocationStats {
            pushes: history.pushes,
            replaces: history.replaces,
        }
    }

    /// External navigation to a new query (address bar, link click).
    ///
    /// Drops any forward entries, pushes, and notifies listeners.
    pub fn navigate(&self, query: &str) {
        let next = QueryParams::parse(query);
        {
            let mut history = self.history.lock().unwrap();
            let keep = history.index + 1;
            history.entries.truncate(keep);
            history.entries.push(next.clone());
            history.index += 1;
        }
        debug!("MemoryLocation: navigated to ?{}", next.to_query_string());
        self.notify(&next);
    }

    /// Step back one entry. Returns `false` at the start of history.
    pub fn back(&self) -> bool {
        self.step(-1)
    }

    /// Step forward one entry. Returns `false` at the end of history.
    pub fn forward(&self) -> bool {
        self.step(1)
    }

    fn step(&self, delta: isize) -> bool {
        let current = {
            let mut history = self.history.lock().unwrap();
            let Some(index) = history.index.checked_add_signed(delta) else {
                return false;
            };
            if index >= history.entries.len() {
                return false;
            }
            history.index = index;
            history.entries[index].clone()
        };
        debug!("MemoryLocation: moved to ?{}", current.to_query_string());
        self.notify(&current);
        true
    }

    fn notify(&self, query: &QueryParams) {
        let listeners: Vec<LocationHandler> = {
            let listeners = self.listeners.read().unwrap();
            listeners.iter().map(|(_, h)| Arc::clone(h)).collect()
        };
        for listener in listeners {
            listener(query);
        }
    }
}

impl Default for MemoryLocation {
    fn default() -> Self {
        Self::new()
    }
}

impl Location for MemoryLocation {
    fn query(&self) -> QueryParams {
        let history = self.history.lock().unwrap();
        history.entries[history.index].clone()
    }

    fn update(&self, changes: QueryUpdate, mode: HistoryMode) {
        let mut history = self.history.lock().unwrap();
        let mut next = history.entries[history.index].clone();
        if !next.apply(&changes) {
            return;
        }
        match mode {
            HistoryMode::Push => {
                let keep = history.index + 1;
                history.entries.truncate(keep);
                history.entries.push(next);
                history.index += 1;
                history.pushes += 1;
            }
            HistoryMode::Replace => {
                let index = history.index;
                history.entries[index] = next;
                history.replaces += 1;
            }
        }
    }

    fn listen(&self, handler: LocationHandler) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners.write().unwrap().push((id, handler));
        id
    }

    fn unlisten(&self, id: SubscriptionId) {
        self.listeners.write().unwrap().retain(|(i, _)| *i != id);
    }
}
