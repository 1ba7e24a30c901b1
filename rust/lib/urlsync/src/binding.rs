use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::SyncError;
use crate::traits::{HistoryMode, ViewState};
use crate::value::{ParamValue, StateValue};

/// A view-state type that has a URL representation.
///
/// `to_param` returning `None` means "no URL value" and clears the
/// parameter's keys. `from_param` is where malformed URL input is rejected.
pub trait UrlParam: Any + Send + Sync + Sized {
    fn to_param(&self) -> Option<ParamValue>;

    fn from_param(value: &ParamValue) -> Result<Self, SyncError>;
}

impl UrlParam for ParamValue {
    fn to_param(&self) -> Option<ParamValue> {
        Some(self.clone())
    }

    fn from_param(value: &ParamValue) -> Result<Self, SyncError> {
        Ok(value.clone())
    }
}

impl UrlParam for String {
    fn to_param(&self) -> Option<ParamValue> {
        Some(ParamValue::Scalar(self.clone()))
    }

    fn from_param(value: &ParamValue) -> Result<Self, SyncError> {
        match value {
            ParamValue::Scalar(s) => Ok(s.clone()),
            ParamValue::Record(_) => Err(SyncError::Decode {
                expected: "string",
                found: value.to_string(),
            }),
        }
    }
}

impl UrlParam for BTreeMap<String, String> {
    fn to_param(&self) -> Option<ParamValue> {
        Some(ParamValue::Record(self.clone()))
    }

    fn from_param(value: &ParamValue) -> Result<Self, SyncError> {
        match value {
            ParamValue::Record(leaves) => Ok(leaves.clone()),
            ParamValue::Scalar(_) => Err(SyncError::Decode {
                expected: "record",
                found: value.to_string(),
            }),
        }
    }
}

macro_rules! impl_url_param_via_str {
    ($($t:ty),* $(,)?) => {
        $(
            impl UrlParam for $t {
                fn to_param(&self) -> Option<ParamValue> {
                    Some(ParamValue::Scalar(self.to_string()))
                }

                fn from_param(value: &ParamValue) -> Result<Self, SyncError> {
                    value
                        .as_scalar()
                        .and_then(|s| s.parse::<$t>().ok())
                        .ok_or_else(|| SyncError::Decode {
                            expected: stringify!($t),
                            found: value.to_string(),
                        })
                }
            }
        )*
    };
}

impl_url_param_via_str!(bool, u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);

type EncodeFn = Arc<dyn Fn(&StateValue) -> Option<Option<ParamValue>> + Send + Sync>;
type DecodeFn = Arc<dyn Fn(&ParamValue) -> Result<StateValue, SyncError> + Send + Sync>;

/// Typed accessor/mutator for one view-state location.
///
/// Holds the view path plus the encode/decode pair for the bound
/// [`UrlParam`] type, so the engine never evaluates expressions.
#[derive(Clone)]
pub struct Binding {
    path: String,
    type_name: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl Binding {
    pub fn new<T: UrlParam>(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            type_name: std::any::type_name::<T>(),
            encode: Arc::new(|value: &StateValue| value.downcast_ref::<T>().map(T::to_param)),
            decode: Arc::new(|value: &ParamValue| T::from_param(value).map(StateValue::new)),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// URL representation of a view value of the bound type.
    pub fn encode(&self, value: &StateValue) -> Result<Option<ParamValue>, SyncError> {
        (self.encode)(value).ok_or_else(|| SyncError::TypeMismatch(self.path.clone()))
    }

    /// Parse a URL value into a view value of the bound type.
    pub fn decode(&self, value: &ParamValue) -> Result<StateValue, SyncError> {
        (self.decode)(value)
    }

    /// Current view value at the bound path, as its URL representation.
    pub fn read<V: ViewState + ?Sized>(&self, view: &V) -> Result<Option<ParamValue>, SyncError> {
        match view.get(&self.path) {
            Some(value) => self.encode(&value),
            None => Ok(None),
        }
    }
}

impl fmt::Debug for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("path", &self.path)
            .field("type", &self.type_name)
            .finish()
    }
}

pub type ComputeFn = Arc<dyn Fn(&dyn ViewState) -> Option<ParamValue> + Send + Sync>;

/// Source of a parameter's starting value when the URL has none.
#[derive(Clone)]
pub enum Initializer {
    /// Available immediately.
    Value(ParamValue),
    /// The first value written at another view path, read through the
    /// parameter's binding.
    Path(String),
    /// Re-evaluated after every view-state change until it yields a value.
    Compute(ComputeFn),
}

impl Initializer {
    pub fn value(value: impl Into<ParamValue>) -> Self {
        Initializer::Value(value.into())
    }

    pub fn path(path: impl Into<String>) -> Self {
        Initializer::Path(path.into())
    }

    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&dyn ViewState) -> Option<ParamValue> + Send + Sync + 'static,
    {
        Initializer::Compute(Arc::new(f))
    }

    /// The view pattern whose changes may make this initializer available.
    pub(crate) fn watch_pattern(&self) -> Option<&str> {
        match self {
            Initializer::Value(_) => None,
            Initializer::Path(path) => Some(path.as_str()),
            Initializer::Compute(_) => Some("#"),
        }
    }

    /// Try to produce a value now. Blank results count as not yet available.
    pub(crate) fn poll<V: ViewState>(
        &self,
        view: &V,
        binding: &Binding,
    ) -> Result<Option<ParamValue>, SyncError> {
        let value = match self {
            Initializer::Value(value) => Some(value.clone()),
            Initializer::Path(path) => match view.get(path) {
                Some(value) => binding.encode(&value)?,
                None => None,
            },
            Initializer::Compute(f) => f(view),
        };
        Ok(ParamValue::normalize(value))
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Initializer::Value(_) => "initializer".to_string(),
            Initializer::Path(path) => format!("initializer {path}"),
            Initializer::Compute(_) => "computed initializer".to_string(),
        }
    }
}

impl fmt::Debug for Initializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initializer::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Initializer::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Initializer::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Synchronization settings for one parameter.
#[derive(Debug, Clone)]
pub struct ParamConfig {
    binding: Binding,
    init: Option<Initializer>,
    suppress_history: bool,
}

impl ParamConfig {
    pub fn new(binding: Binding) -> Self {
        Self {
            binding,
            init: None,
            suppress_history: false,
        }
    }

    /// Shorthand for `ParamConfig::new(Binding::new::<T>(path))`.
    pub fn bind<T: UrlParam>(path: impl Into<String>) -> Self {
        Self::new(Binding::new::<T>(path))
    }

    pub fn with_init(mut self, init: Initializer) -> Self {
        self.init = Some(init);
        self
    }

    /// Outbound URL writes replace the current history entry.
    pub fn without_history(mut self) -> Self {
        self.suppress_history = true;
        self
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn init(&self) -> Option<&Initializer> {
        self.init.as_ref()
    }

    pub fn suppresses_history(&self) -> bool {
        self.suppress_history
    }

    pub fn history_mode(&self) -> HistoryMode {
        if self.suppress_history {
            HistoryMode::Replace
        } else {
            HistoryMode::Push
        }
    }
}
