use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot decode {found} as {expected}")]
    Decode {
        expected: &'static str,
        found: String,
    },

    #[error("view value at `{0}` does not have the bound type")]
    TypeMismatch(String),

    #[error("parameter `{name}`: {source}")]
    Param {
        name: String,
        source: Box<SyncError>,
    },

    #[error("manifest error: {0}")]
    Manifest(String),
}

impl SyncError {
    /// Attach the parameter name to an error raised while syncing it.
    pub fn for_param(self, name: &str) -> Self {
        match self {
            SyncError::Param { .. } => self,
            other => SyncError::Param {
                name: name.to_string(),
                source: Box::new(other),
            },
        }
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::Manifest(e.to_string())
    }
}
