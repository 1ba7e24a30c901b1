//! Declarative parameter mappings loaded from JSON.
//!
//! ```json
//! {
//!   "q":    { "path": "search/text", "suppress_history": true },
//!   "page": { "path": "list/page", "init": "1" },
//!   "sort": { "path": "list/sort", "init_path": "prefs/sort" }
//! }
//! ```
//!
//! Every parameter binds its view path as a raw [`ParamValue`]; use
//! [`ParamConfig::bind`] directly for typed bindings.

use indexmap::IndexMap;
use serde::Deserialize;

use crate::binding::{Initializer, ParamConfig};
use crate::error::SyncError;
use crate::value::ParamValue;

/// Ordered parameter declarations. Registration follows document order.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct SyncManifest {
    params: IndexMap<String, ParamSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParamSpec {
    pub path: String,
    #[serde(default)]
    pub init: Option<ParamValue>,
    #[serde(default)]
    pub init_path: Option<String>,
    #[serde(default)]
    pub suppress_history: bool,
}

impl ParamSpec {
    fn into_config(self, name: &str) -> Result<ParamConfig, SyncError> {
        let init = match (self.init, self.init_path) {
            (Some(_), Some(_)) => {
                return Err(SyncError::Manifest(format!(
                    "parameter `{name}` sets both init and init_path"
                )))
            }
            (Some(value), None) => Some(Initializer::Value(value)),
            (None, Some(path)) => Some(Initializer::Path(path)),
            (None, None) => None,
        };

        let mut config = ParamConfig::bind::<ParamValue>(self.path);
        if let Some(init) = init {
            config = config.with_init(init);
        }
        if self.suppress_history {
            config = config.without_history();
        }
        Ok(config)
    }
}

impl SyncManifest {
    pub fn from_json(json: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ParamSpec> {
        self.params.get(name)
    }

    /// Convert into `(name, config)` pairs for [`crate::UrlSync::sync`].
    pub fn into_mapping(self) -> Result<Vec<(String, ParamConfig)>, SyncError> {
        self.params
            .into_iter()
            .map(|(name, param)| {
                let config = param.into_config(&name)?;
                Ok((name, config))
            })
            .collect()
    }
}
