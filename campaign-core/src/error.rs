//! Error types for campaign-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise while resolving or writing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, unreadable file, etc.).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parse error on load; includes the file path and serde_yaml's line context.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required value was found neither in the environment nor in the file.
    #[error("missing required setting `{field}` (set {env} or add it to the config file)")]
    Missing {
        field: &'static str,
        env: &'static str,
    },

    /// A setting is present but unusable.
    #[error("invalid setting `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// `init` refuses to overwrite an existing config file.
    #[error("config already exists at {path}")]
    AlreadyExists { path: PathBuf },

    /// `dirs::home_dir()` returned `None`, so `~/.campaign-sync/` cannot be located.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,
}
