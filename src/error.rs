// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while assembling a dispatcher: registration, router
/// construction and manifest population. Dispatch never returns these;
/// runtime failures funnel through the formatter hooks instead.
#[derive(Error, Debug)]
pub enum SetupError {
    #[error("A command definition must have a non-empty name")]
    UnnamedCommand,

    #[error("Command '{name}' declares an empty alias")]
    EmptyAlias { name: String },

    #[error("Router '{name}' was built without children")]
    ChildlessRouter { name: String },

    #[error("Failed to read manifest directory '{}'", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read manifest file '{}'", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest file '{}'", path.display())]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Manifest '{}' names unknown handler '{handler}'", path.display())]
    UnknownHandler { path: PathBuf, handler: String },
}
