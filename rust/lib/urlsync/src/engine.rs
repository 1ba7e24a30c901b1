use std::sync::{Arc, Mutex, RwLock};

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::binding::{Initializer, ParamConfig};
use crate::error::SyncError;
use crate::query::QueryParams;
use crate::traits::{HistoryMode, Location, ViewState};
use crate::value::{describe, ParamValue, StateValue, SubscriptionId};

/// UrlSync keeps view-state parameters and URL query parameters equal.
///
/// Each registered parameter binds one view path to one query namespace
/// (`name` for scalars, `name.leaf` for records):
/// - on registration the URL value wins, then the initializer, else unset
/// - every view change is written out to the URL
/// - every external navigation is read back into the view
///
/// Loop avoidance is purely value based: a write that would not change the
/// target (after normalizing `""`/`{}` to unset) is skipped.
///
/// # Example
///
/// ```ignore
/// let view = Arc::new(StateStore::new());
/// let location = Arc::new(MemoryLocation::with_query("?q=rust"));
/// let sync = UrlSync::new(view.clone(), location.clone());
///
/// sync.sync([
///     ("q", ParamConfig::bind::<String>("search/query")),
///     ("page", ParamConfig::bind::<u32>("search/page").with_init(Initializer::value("1"))),
/// ])?;
///
/// view.set("search/page", 2u32); // URL becomes ?page=2&q=rust
/// ```
pub struct UrlSync<V: ViewState, L: Location> {
    inner: Arc<Inner<V, L>>,
}

struct Inner<V, L> {
    view: Arc<V>,
    location: Arc<L>,
    /// Registered parameters in registration order.
    params: RwLock<IndexMap<String, Param>>,
    /// Location listener installed by `new`.
    listener: Mutex<Option<SubscriptionId>>,
}

struct Param {
    config: ParamConfig,
    watcher: Option<SubscriptionId>,
    /// Watch pattern and subscription of an initializer not yet resolved.
    pending_init: Option<(String, SubscriptionId)>,
}

impl<V: ViewState, L: Location> UrlSync<V, L> {
    /// Create a sync session and start listening for external navigation.
    pub fn new(view: Arc<V>, location: Arc<L>) -> Self {
        let inner = Arc::new(Inner {
            view,
            location,
            params: RwLock::new(IndexMap::new()),
            listener: Mutex::new(None),
        });

        let weak = Arc::downgrade(&inner);
        let id = inner.location.listen(Arc::new(move |_query: &QueryParams| {
            if let Some(inner) = weak.upgrade() {
                if let Err(e) = inner.resync_all() {
                    warn!("UrlSync: failed to apply location change: {}", e);
                }
            }
        }));
        *inner.listener.lock().unwrap() = Some(id);

        Self { inner }
    }

    /// Register parameters and resolve their starting values.
    ///
    /// Parameters are processed in iteration order. Registering a name that
    /// already exists replaces its configuration. The first decode failure
    /// aborts the pass and is returned; the failing parameter is left
    /// unregistered.
    pub fn sync<I, N>(&self, mapping: I) -> Result<(), SyncError>
    where
        I: IntoIterator<Item = (N, ParamConfig)>,
        N: Into<String>,
    {
        for (name, config) in mapping {
            let name = name.into();
            self.inner.register(&name, config);
            if let Err(e) = self.inner.resolve(&name) {
                self.inner.unregister(&name);
                return Err(e.for_param(&name));
            }
            self.inner.install_watcher(&name);
        }
        Ok(())
    }

    /// Re-read every registered parameter from the URL.
    ///
    /// Called automatically on external navigation. Idempotent: when the
    /// URL already matches the view, nothing is written.
    pub fn location_changed(&self) -> Result<(), SyncError> {
        self.inner.resync_all()
    }

    /// Registered parameter names, in registration order.
    pub fn param_names(&self) -> Vec<String> {
        self.inner.params.read().unwrap().keys().cloned().collect()
    }

    /// Whether `name` is currently registered.
    pub fn is_registered(&self, name: &str) -> bool {
        self.inner.params.read().unwrap().contains_key(name)
    }

    /// Whether `name` is still waiting for its initializer.
    pub fn is_pending(&self, name: &str) -> bool {
        self.inner
            .params
            .read()
            .unwrap()
            .get(name)
            .is_some_and(|p| p.pending_init.is_some())
    }

    /// Drop every registration and subscription owned by this session.
    pub fn detach(&self) {
        self.inner.detach();
    }
}

impl<V: ViewState, L: Location> Drop for UrlSync<V, L> {
    fn drop(&mut self) {
        self.inner.detach();
    }
}

impl<V: ViewState, L: Location> Inner<V, L> {
    fn config(&self, name: &str) -> Option<ParamConfig> {
        let params = self.params.read().unwrap();
        params.get(name).map(|p| p.config.clone())
    }

    fn register(&self, name: &str, config: ParamConfig) {
        let superseded = {
            let mut params = self.params.write().unwrap();
            params.insert(
                name.to_string(),
                Param {
                    config,
                    watcher: None,
                    pending_init: None,
                },
            )
        };
        if let Some(old) = superseded {
            debug!("UrlSync: replacing configuration of {}", name);
            self.release(&old);
        }
    }

    fn unregister(&self, name: &str) {
        let removed = self.params.write().unwrap().shift_remove(name);
        if let Some(param) = removed {
            debug!("UrlSync: dropping registration of {}", name);
            self.release(&param);
        }
    }

    fn release(&self, param: &Param) {
        if let Some(id) = param.watcher {
            self.view.unwatch(param.config.binding().path(), id);
        }
        if let Some((pattern, id)) = &param.pending_init {
            self.view.unwatch(pattern, *id);
        }
    }

    fn detach(&self) {
        if let Some(id) = self.listener.lock().unwrap().take() {
            self.location.unlisten(id);
        }
        let params: Vec<Param> = {
            let mut params = self.params.write().unwrap();
            params.drain(..).map(|(_, p)| p).collect()
        };
        for param in &params {
            self.release(param);
        }
    }

    fn resync_all(self: &Arc<Self>) -> Result<(), SyncError> {
        let names: Vec<String> = self.params.read().unwrap().keys().cloned().collect();
        let mut first_error = None;
        for name in names {
            if let Err(e) = self.resolve(&name) {
                first_error.get_or_insert(e.for_param(&name));
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Bring the view in line with the URL, falling back to the initializer.
    fn resolve(self: &Arc<Self>, name: &str) -> Result<(), SyncError> {
        let Some(config) = self.config(name) else {
            return Ok(());
        };
        let query = self.location.query();
        if let Some(value) = query.load(name) {
            // The URL won; a still-pending initializer is discarded.
            if let Some((pattern, id)) = self.take_pending_init(name) {
                self.view.unwatch(&pattern, id);
            }
            // Rewrite non-canonical input (`02` for `2`) in place before the
            // view changes, so the view watcher finds the URL already equal.
            let canonical = self.canonical(&config, &value)?;
            if canonical.as_ref() != Some(&value) {
                self.write_location(
                    name,
                    canonical.as_ref(),
                    "canonical form",
                    HistoryMode::Replace,
                    false,
                );
            }
            self.write_view(name, &config, Some(&value), "location")
        } else if let Some(init) = config.init() {
            self.write_view(name, &config, None, "pending initializer")?;
            self.arm_initializer(name, &config, init)
        } else {
            self.write_view(name, &config, None, "no location or initializer")
        }
    }

    fn arm_initializer(
        self: &Arc<Self>,
        name: &str,
        config: &ParamConfig,
        init: &Initializer,
    ) -> Result<(), SyncError> {
        if self.has_pending_init(name) {
            return Ok(());
        }
        if let Some(value) = init.poll(&*self.view, config.binding())? {
            return self.complete_init(name, config, &value, &init.describe());
        }
        // A blank constant can never become available.
        let Some(pattern) = init.watch_pattern() else {
            return Ok(());
        };

        let weak = Arc::downgrade(self);
        let param = name.to_string();
        let id = self.view.watch(
            pattern,
            Arc::new(move |_path: &str, _value: Option<&StateValue>| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = inner.poll_initializer(&param) {
                        warn!("UrlSync: initializer for {} failed: {}", param, e);
                    }
                }
            }),
        );

        let registered = {
            let mut params = self.params.write().unwrap();
            match params.get_mut(name) {
                Some(p) => {
                    p.pending_init = Some((pattern.to_string(), id));
                    true
                }
                None => false,
            }
        };
        if !registered {
            self.view.unwatch(pattern, id);
        }
        Ok(())
    }

    /// `value` as the bound type writes it back.
    fn canonical(
        &self,
        config: &ParamConfig,
        value: &ParamValue,
    ) -> Result<Option<ParamValue>, SyncError> {
        let binding = config.binding();
        let decoded = binding.decode(value)?;
        Ok(ParamValue::normalize(binding.encode(&decoded)?))
    }

    fn has_pending_init(&self, name: &str) -> bool {
        let params = self.params.read().unwrap();
        params.get(name).is_some_and(|p| p.pending_init.is_some())
    }

    fn take_pending_init(&self, name: &str) -> Option<(String, SubscriptionId)> {
        let mut params = self.params.write().unwrap();
        params.get_mut(name).and_then(|p| p.pending_init.take())
    }

    fn poll_initializer(self: &Arc<Self>, name: &str) -> Result<(), SyncError> {
        let Some(config) = self.config(name) else {
            return Ok(());
        };
        let Some(init) = config.init() else {
            return Ok(());
        };
        let Some(value) = init.poll(&*self.view, config.binding())? else {
            return Ok(());
        };
        // One-shot: whoever takes the subscription completes the initializer.
        let Some((pattern, id)) = self.take_pending_init(name) else {
            return Ok(());
        };
        self.view.unwatch(&pattern, id);
        self.complete_init(name, &config, &value, &init.describe())
    }

    fn complete_init(
        &self,
        name: &str,
        config: &ParamConfig,
        value: &ParamValue,
        from: &str,
    ) -> Result<(), SyncError> {
        // The URL is written first, so the view write below sees an equal
        // URL and its watcher does not write a second history entry.
        self.write_location(name, Some(value), from, config.history_mode(), true);
        self.write_view(name, config, Some(value), from)
    }

    fn install_watcher(self: &Arc<Self>, name: &str) {
        let Some(config) = self.config(name) else {
            return;
        };
        let weak = Arc::downgrade(self);
        let param = name.to_string();
        let path = config.binding().path().to_string();
        let id = self.view.watch(
            &path,
            Arc::new(move |_path: &str, value: Option<&StateValue>| {
                if let Some(inner) = weak.upgrade() {
                    if let Err(e) = inner.view_changed(&param, value) {
                        warn!("UrlSync: cannot write {} to location: {}", param, e);
                    }
                }
            }),
        );

        let registered = {
            let mut params = self.params.write().unwrap();
            match params.get_mut(name) {
                Some(p) => {
                    p.watcher = Some(id);
                    true
                }
                None => false,
            }
        };
        if !registered {
            self.view.unwatch(&path, id);
        }
    }

    fn view_changed(&self, name: &str, value: Option<&StateValue>) -> Result<(), SyncError> {
        let Some(config) = self.config(name) else {
            return Ok(());
        };
        let encoded = match value {
            Some(v) => config.binding().encode(v)?,
            None => None,
        };
        self.write_location(
            name,
            encoded.as_ref(),
            config.binding().path(),
            config.history_mode(),
            false,
        );
        Ok(())
    }

    /// Write a URL value into the view unless the view already holds it.
    fn write_view(
        &self,
        name: &str,
        config: &ParamConfig,
        value: Option<&ParamValue>,
        from: &str,
    ) -> Result<(), SyncError> {
        let binding = config.binding();
        let decoded = match value.filter(|v| !v.is_blank()) {
            Some(v) => Some(binding.decode(v)?),
            None => None,
        };
        let incoming = match &decoded {
            Some(v) => ParamValue::normalize(binding.encode(v)?),
            None => None,
        };
        let current = ParamValue::normalize(binding.read(&*self.view)?);
        if incoming == current {
            return Ok(());
        }

        debug!(
            "UrlSync: set view {} ({}) to {} from {}",
            binding.path(),
            name,
            describe(incoming.as_ref()),
            from
        );
        self.view.set(binding.path(), decoded);
        Ok(())
    }

    /// Write a view value into the URL unless the URL already holds it.
    ///
    /// `force` skips the equality check; used for the first write after an
    /// initializer resolves.
    fn write_location(
        &self,
        name: &str,
        value: Option<&ParamValue>,
        from: &str,
        mode: HistoryMode,
        force: bool,
    ) {
        let value = ParamValue::normalize(value.cloned());
        let query = self.location.query();
        if !force && value == query.load(name) {
            return;
        }

        let update = query.namespace_update(name, value.as_ref());
        debug!(
            "UrlSync: set location {} to {} from {}{}",
            name,
            describe(value.as_ref()),
            from,
            if mode == HistoryMode::Replace { " (no history)" } else { "" }
        );
        self.location.update(update, mode);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::MemoryLocation;
    use crate::store::StateStore;
    use std::collections::BTreeMap;

    fn session(query: &str) -> (Arc<StateStore>, Arc<MemoryLocation>, UrlSync<StateStore, MemoryLocation>) {
        let view = Arc::new(StateStore::new());
        let location = Arc::new(MemoryLocation::with_query(query));
        let sync = UrlSync::new(view.clone(), location.clone());
        (view, location, sync)
    }

    fn record(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    #[test]
    fn initializes_from_location_scalar() {
        let (view, location, sync) = session("?foo=bar");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        assert_eq!(view.get_as::<String>("foo"), Some("bar".to_string()));
        assert_eq!(location.search(), "?foo=bar");
        assert_eq!(location.stats().writes(), 0);
    }

    #[test]
    fn initializes_from_location_record() {
        let (view, location, sync) = session("?foo.a=A&foo.b=B&foo.c=C");
        sync.sync([("foo", ParamConfig::bind::<BTreeMap<String, String>>("foo"))])
            .unwrap();

        assert_eq!(
            view.get_as::<BTreeMap<String, String>>("foo"),
            Some(record(&[("a", "A"), ("b", "B"), ("c", "C")]))
        );
        assert_eq!(location.search(), "?foo.a=A&foo.b=B&foo.c=C");
    }

    #[test]
    fn initializes_from_value_initializer() {
        let (view, location, sync) = session("");
        sync.sync([(
            "foo",
            ParamConfig::bind::<String>("foo").with_init(Initializer::value("bar")),
        )])
        .unwrap();

        assert_eq!(view.get_as::<String>("foo"), Some("bar".to_string()));
        assert_eq!(location.search(), "?foo=bar");
        assert_eq!(location.stats().pushes, 1);
        assert!(!sync.is_pending("foo"));
    }

    #[test]
    fn location_beats_initializer() {
        let (view, location, sync) = session("?foo=location");
        sync.sync([(
            "foo",
            ParamConfig::bind::<String>("foo").with_init(Initializer::value("init")),
        )])
        .unwrap();

        assert_eq!(view.get_as::<String>("foo"), Some("location".to_string()));
        assert_eq!(location.search(), "?foo=location");
    }

    #[test]
    fn no_source_leaves_view_unset() {
        let (view, location, sync) = session("?other=1");
        view.set("foo", "stale".to_string());
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        assert!(!view.contains("foo"));
        assert_eq!(location.search(), "?other=1");
    }

    #[test]
    fn decode_failure_aborts_registration() {
        let (_view, _location, sync) = session("?page=abc");
        let err = sync
            .sync([("page", ParamConfig::bind::<u32>("page"))])
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "parameter `page`: cannot decode \"abc\" as u32"
        );
    }

    #[test]
    fn failed_registration_leaves_nothing_behind() {
        let (view, location, sync) = session("?page=abc");
        assert!(sync.sync([("page", ParamConfig::bind::<u32>("page"))]).is_err());
        assert!(!sync.is_registered("page"));
        assert_eq!(view.subscription_count(), 0);

        location.navigate("?page=4");
        assert!(!view.contains("page"));
        assert_eq!(location.search(), "?page=4");
    }

    #[test]
    fn failed_registration_keeps_earlier_parameters() {
        let (view, location, sync) = session("?page=abc");
        let err = sync.sync([
            ("q", ParamConfig::bind::<String>("q")),
            ("page", ParamConfig::bind::<u32>("page")),
        ]);
        assert!(err.is_err());
        assert_eq!(sync.param_names(), vec!["q"]);

        view.set("q", "rust".to_string());
        assert_eq!(location.search(), "?page=abc&q=rust");
    }

    #[test]
    fn non_canonical_location_is_rewritten_in_place() {
        let (view, location, sync) = session("?page=02");
        sync.sync([("page", ParamConfig::bind::<u32>("page"))]).unwrap();

        assert_eq!(view.get_as::<u32>("page"), Some(2));
        assert_eq!(location.history(), vec!["page=2"]);
        assert_eq!(location.stats(), crate::location::LocationStats { pushes: 0, replaces: 1 });
    }

    #[test]
    fn reregistration_replaces_configuration() {
        let (view, location, sync) = session("");
        sync.sync([("foo", ParamConfig::bind::<String>("old/path"))]).unwrap();
        sync.sync([("foo", ParamConfig::bind::<String>("new/path"))]).unwrap();
        assert_eq!(sync.param_names(), vec!["foo"]);

        view.set("old/path", "ignored".to_string());
        assert_eq!(location.search(), "");

        view.set("new/path", "used".to_string());
        assert_eq!(location.search(), "?foo=used");
    }

    #[test]
    fn registration_order_is_kept() {
        let (_view, _location, sync) = session("");
        sync.sync([
            ("b", ParamConfig::bind::<String>("b")),
            ("a", ParamConfig::bind::<String>("a")),
        ])
        .unwrap();
        sync.sync([("b", ParamConfig::bind::<String>("b2"))]).unwrap();
        assert_eq!(sync.param_names(), vec!["b", "a"]);
    }

    // ========================================================================
    // View -> location
    // ========================================================================

    #[test]
    fn view_change_updates_location() {
        let (view, location, sync) = session("?foo=location");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        view.set("foo", "changed".to_string());
        assert_eq!(location.search(), "?foo=changed");
        assert_eq!(location.stats().pushes, 1);
    }

    #[test]
    fn unchanged_view_write_is_skipped() {
        let (view, location, sync) = session("?foo=bar");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        view.set("foo", "bar".to_string());
        assert_eq!(location.stats().writes(), 0);
    }

    #[test]
    fn empty_string_clears_location() {
        let (view, location, sync) = session("?foo=bar");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        view.set("foo", String::new());
        assert_eq!(location.search(), "");
    }

    #[test]
    fn typed_values_are_encoded() {
        let (view, location, sync) = session("?page=2");
        sync.sync([("page", ParamConfig::bind::<u32>("search/page"))]).unwrap();
        assert_eq!(view.get_as::<u32>("search/page"), Some(2));

        view.set("search/page", 3u32);
        assert_eq!(location.search(), "?page=3");
    }

    #[test]
    fn wrong_view_type_leaves_location_alone() {
        let (view, location, sync) = session("?page=2");
        sync.sync([("page", ParamConfig::bind::<u32>("page"))]).unwrap();

        view.set("page", "two".to_string());
        assert_eq!(location.search(), "?page=2");
    }

    #[test]
    fn suppressed_history_replaces_entry() {
        let (view, location, sync) = session("");
        sync.sync([("foo", ParamConfig::bind::<String>("foo").without_history())])
            .unwrap();

        view.set("foo", "a".to_string());
        view.set("foo", "b".to_string());
        assert_eq!(location.history(), vec!["foo=b"]);
        assert_eq!(location.stats().replaces, 2);
        assert_eq!(location.stats().pushes, 0);
    }

    // ========================================================================
    // Location -> view
    // ========================================================================

    #[test]
    fn navigation_updates_view() {
        let (view, location, sync) = session("?foo=location");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        location.navigate("?foo=changed");
        assert_eq!(view.get_as::<String>("foo"), Some("changed".to_string()));
        assert_eq!(location.stats().writes(), 0);
    }

    #[test]
    fn non_canonical_navigation_replaces_entry() {
        let (view, location, sync) = session("?page=1");
        sync.sync([("page", ParamConfig::bind::<u32>("page"))]).unwrap();

        location.navigate("?page=02");
        assert_eq!(view.get_as::<u32>("page"), Some(2));
        assert_eq!(location.history(), vec!["page=1", "page=2"]);
        assert_eq!(location.stats().pushes, 0);

        // Re-reading the same URL writes nothing.
        sync.location_changed().unwrap();
        assert_eq!(location.stats().writes(), 1);
    }

    #[test]
    fn back_navigation_restores_view() {
        let (view, location, sync) = session("?foo=one");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();
        view.set("foo", "two".to_string());

        assert!(location.back());
        assert_eq!(view.get_as::<String>("foo"), Some("one".to_string()));
        assert!(location.forward());
        assert_eq!(view.get_as::<String>("foo"), Some("two".to_string()));
        assert_eq!(location.history().len(), 2);
    }

    #[test]
    fn navigation_without_param_unsets_view() {
        let (view, location, sync) = session("?foo=bar");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();

        location.navigate("?other=1");
        assert!(!view.contains("foo"));
        assert_eq!(location.search(), "?other=1");
    }

    #[test]
    fn location_changed_is_idempotent() {
        let (view, location, sync) = session("?foo=bar&rec.a=A");
        sync.sync([
            ("foo", ParamConfig::bind::<String>("foo")),
            ("rec", ParamConfig::bind::<BTreeMap<String, String>>("rec")),
        ])
        .unwrap();

        let writes = Arc::new(std::sync::atomic::AtomicU64::new(0));
        let writes_c = writes.clone();
        view.subscribe("#", move |_, _| {
            writes_c.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        });

        for _ in 0..3 {
            sync.location_changed().unwrap();
        }
        assert_eq!(writes.load(std::sync::atomic::Ordering::Relaxed), 0);
        assert_eq!(location.stats().writes(), 0);
    }

    // ========================================================================
    // Deferred initializers
    // ========================================================================

    #[test]
    fn path_initializer_resolves_later() {
        let (view, location, sync) = session("");
        sync.sync([(
            "foo",
            ParamConfig::bind::<String>("foo").with_init(Initializer::path("defaults/foo")),
        )])
        .unwrap();
        assert!(sync.is_pending("foo"));
        assert!(!view.contains("foo"));
        assert_eq!(location.search(), "");

        view.set("defaults/foo", "loaded".to_string());
        assert!(!sync.is_pending("foo"));
        assert_eq!(view.get_as::<String>("foo"), Some("loaded".to_string()));
        assert_eq!(location.search(), "?foo=loaded");
        assert_eq!(location.stats().pushes, 1);

        // One-shot: later changes of the source are not followed.
        view.set("defaults/foo", "again".to_string());
        assert_eq!(view.get_as::<String>("foo"), Some("loaded".to_string()));
    }

    #[test]
    fn compute_initializer_waits_for_data() {
        let (view, location, sync) = session("");
        sync.sync([(
            "first",
            ParamConfig::bind::<String>("selection").with_init(Initializer::compute(|view| {
                view.get("items")
                    .and_then(|v| v.downcast_ref::<Vec<String>>().and_then(|i| i.first().cloned()))
                    .map(ParamValue::Scalar)
            })),
        )])
        .unwrap();
        assert!(sync.is_pending("first"));

        view.set("unrelated", 1u32);
        assert!(sync.is_pending("first"));

        view.set("items", vec!["x".to_string(), "y".to_string()]);
        assert_eq!(view.get_as::<String>("selection"), Some("x".to_string()));
        assert_eq!(location.search(), "?first=x");
    }

    #[test]
    fn repeated_navigation_arms_one_initializer() {
        let (view, _location, sync) = session("");
        sync.sync([(
            "foo",
            ParamConfig::bind::<String>("foo").with_init(Initializer::path("defaults/foo")),
        )])
        .unwrap();
        let before = view.subscription_count();

        sync.location_changed().unwrap();
        sync.location_changed().unwrap();
        assert_eq!(view.subscription_count(), before);
    }

    #[test]
    fn location_arriving_first_discards_initializer() {
        let (view, location, sync) = session("");
        sync.sync([(
            "foo",
            ParamConfig::bind::<String>("foo").with_init(Initializer::path("defaults/foo")),
        )])
        .unwrap();

        location.navigate("?foo=linked");
        assert_eq!(view.get_as::<String>("foo"), Some("linked".to_string()));
        assert!(!sync.is_pending("foo"));

        view.set("defaults/foo", "loaded".to_string());
        assert_eq!(view.get_as::<String>("foo"), Some("linked".to_string()));
        assert_eq!(location.search(), "?foo=linked");
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    #[test]
    fn detach_releases_subscriptions() {
        let (view, location, sync) = session("");
        sync.sync([
            ("foo", ParamConfig::bind::<String>("foo")),
            (
                "bar",
                ParamConfig::bind::<String>("bar").with_init(Initializer::path("defaults/bar")),
            ),
        ])
        .unwrap();
        assert_eq!(view.subscription_count(), 3);

        sync.detach();
        assert_eq!(view.subscription_count(), 0);
        assert!(sync.param_names().is_empty());

        view.set("foo", "x".to_string());
        location.navigate("?bar=y");
        assert_eq!(location.search(), "?bar=y");
        assert!(!view.contains("bar"));
    }

    #[test]
    fn drop_releases_subscriptions() {
        let (view, _location, sync) = session("");
        sync.sync([("foo", ParamConfig::bind::<String>("foo"))]).unwrap();
        assert_eq!(view.subscription_count(), 1);

        drop(sync);
        assert_eq!(view.subscription_count(), 0);
    }
}
