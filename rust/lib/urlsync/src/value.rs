use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A parameter value as it appears in the URL.
///
/// A scalar is stored under the query key `name`; a record is stored as one
/// key per leaf, `name.leaf`. Absence is modelled as `Option::None` by the
/// callers, never as a variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    Record(BTreeMap<String, String>),
}

impl ParamValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        ParamValue::Scalar(value.into())
    }

    pub fn record<I, K, V>(leaves: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        ParamValue::Record(
            leaves
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// `""` and `{}` carry no URL representation.
    pub fn is_blank(&self) -> bool {
        match self {
            ParamValue::Scalar(s) => s.is_empty(),
            ParamValue::Record(leaves) => leaves.is_empty(),
        }
    }

    /// Collapse blank values to `None` so that "unset", `""` and `{}` all
    /// compare equal.
    pub fn normalize(value: Option<ParamValue>) -> Option<ParamValue> {
        value.filter(|v| !v.is_blank())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            ParamValue::Record(_) => None,
        }
    }

    pub fn as_record(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            ParamValue::Scalar(_) => None,
            ParamValue::Record(leaves) => Some(leaves),
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Scalar(s) => write!(f, "{s:?}"),
            ParamValue::Record(leaves) => {
                f.write_str("{")?;
                for (i, (k, v)) in leaves.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v:?}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        ParamValue::Scalar(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        ParamValue::Scalar(s)
    }
}

impl From<BTreeMap<String, String>> for ParamValue {
    fn from(leaves: BTreeMap<String, String>) -> Self {
        ParamValue::Record(leaves)
    }
}

/// Render an optional value for trace lines.
pub(crate) fn describe(value: Option<&ParamValue>) -> String {
    match value {
        Some(v) => v.to_string(),
        None => "null".to_string(),
    }
}

/// A type-erased, reference-counted view-state value.
///
/// Clone is an atomic increment; readers share the same allocation.
#[derive(Clone)]
pub struct StateValue {
    inner: Arc<dyn Any + Send + Sync>,
}

impl StateValue {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Self {
            inner: Arc::new(value),
        }
    }

    /// Returns `None` if the stored type doesn't match `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref::<T>()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("type_id", &(*self.inner).type_id())
            .finish()
    }
}

/// Handle for a store watcher or location listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);
