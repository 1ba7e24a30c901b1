//! UrlSync: two-way binding between view state and URL query parameters.
//!
//! Selected view-state paths are mirrored into the query string so a page
//! can be bookmarked, shared and navigated with back/forward. Rust owns the
//! sync rules; the host only supplies a view store and a location.
//!
//! # Parameter Encoding
//!
//! - Scalar: `?page=2` for `page = "2"`
//! - Record: `?filter.owner=me&filter.state=open` for `filter = {owner, state}`
//! - Unset: no key at all. `""` and `{}` are treated as unset.
//!
//! # Sync Rules
//!
//! - Registration: URL value, else initializer, else unset.
//! - View change: written to the URL (push, or replace when history is
//!   suppressed for the parameter).
//! - External navigation: every parameter is read back into the view.
//! - A write that would not change its target is skipped, so the two
//!   directions never ping-pong.
//!
//! # Example
//!
//! ```ignore
//! use openerp_urlsync::{MemoryLocation, ParamConfig, StateStore, UrlSync};
//!
//! let view = Arc::new(StateStore::new());
//! let location = Arc::new(MemoryLocation::with_query("?tab=orders"));
//! let sync = UrlSync::new(view.clone(), location.clone());
//!
//! sync.sync([("tab", ParamConfig::bind::<String>("app/tab"))])?;
//! assert_eq!(view.get_as::<String>("app/tab").as_deref(), Some("orders"));
//!
//! view.set("app/tab", "billing".to_string());
//! assert_eq!(location.search(), "?tab=billing");
//! ```

pub mod binding;
pub mod eng;
pub mod engine;
pub mod error;
pub mod location;
pub mod manifest;
pub mod map_reduce;
pub mod pattern;
pub mod query;
pub mod store;
pub mod traits;
pub mod value;

// Re-export primary types at crate root.
pub use binding::{Binding, ComputeFn, Initializer, ParamConfig, UrlParam};
pub use engine::UrlSync;
pub use error::SyncError;
pub use location::{LocationStats, MemoryLocation};
pub use manifest::{ParamSpec, SyncManifest};
pub use query::{QueryParams, QueryUpdate};
pub use store::StateStore;
pub use traits::{ChangeHandler, HistoryMode, Location, LocationHandler, ViewState};
pub use value::{ParamValue, StateValue, SubscriptionId};
