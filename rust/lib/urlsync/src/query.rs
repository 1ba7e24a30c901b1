use std::collections::BTreeMap;

use url::form_urlencoded;

use crate::value::ParamValue;

/// A partial query update: `Some` sets a key, `None` removes it.
pub type QueryUpdate = BTreeMap<String, Option<String>>;

/// Parsed URL query string: `foo=bar&filter.a=A`.
///
/// Keys are kept ordered so prefix scans over `name.` keys are a range walk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Parse a query string, with or without the leading `?`.
    ///
    /// Keys and values are percent-decoded. A repeated key keeps its last value.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        Self(
            form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    }

    /// Encode back to `key=value&...` (no leading `?`).
    pub fn to_query_string(&self) -> String {
        form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    /// Raw value of a single query key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of query keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merge a partial update. Returns `true` if anything changed.
    pub fn apply(&mut self, update: &QueryUpdate) -> bool {
        let mut changed = false;
        for (key, value) in update {
            match value {
                Some(v) => {
                    let old = self.0.insert(key.clone(), v.clone());
                    changed |= old.as_deref() != Some(v.as_str());
                }
                None => changed |= self.0.remove(key).is_some(),
            }
        }
        changed
    }

    /// Read the value of parameter `name`.
    ///
    /// A non-empty scalar key `name` wins. Otherwise every `name.leaf` key is
    /// gathered into a record. `None` when neither form is present.
    pub fn load(&self, name: &str) -> Option<ParamValue> {
        if let Some(value) = self.0.get(name).filter(|v| !v.is_empty()) {
            return Some(ParamValue::Scalar(value.clone()));
        }
        let prefix = format!("{name}.");
        let leaves: BTreeMap<String, String> = self
            .prefixed(&prefix)
            .map(|(k, v)| (k[prefix.len()..].to_string(), v.clone()))
            .collect();
        if leaves.is_empty() {
            None
        } else {
            Some(ParamValue::Record(leaves))
        }
    }

    /// Build the update that makes parameter `name` hold `value`.
    ///
    /// Every key currently in the namespace (`name` and `name.*`) that the new
    /// value does not set is removed, so dropping a leaf from a record drops
    /// its key. Blank or absent values clear the whole namespace.
    pub fn namespace_update(&self, name: &str, value: Option<&ParamValue>) -> QueryUpdate {
        let prefix = format!("{name}.");
        let mut update = QueryUpdate::new();
        if self.0.contains_key(name) {
            update.insert(name.to_string(), None);
        }
        for (key, _) in self.prefixed(&prefix) {
            update.insert(key.clone(), None);
        }
        match value.filter(|v| !v.is_blank()) {
            None => {}
            Some(ParamValue::Scalar(s)) => {
                update.insert(name.to_string(), Some(s.clone()));
            }
            Some(ParamValue::Record(leaves)) => {
                for (leaf, v) in leaves {
                    update.insert(format!("{prefix}{leaf}"), Some(v.clone()));
                }
            }
        }
        update
    }

    fn prefixed<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a String, &'a String)> {
        self.0
            .range(prefix.to_string()..)
            .take_while(move |(k, _)| k.starts_with(prefix))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
