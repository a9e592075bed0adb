use fedql_engine::EngineError;
use fedql_model::ConfigurationError;
use std::io;
use std::path::PathBuf;

/// An error raised while loading a federation from a configuration file.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The configuration file could not be read.
    #[error("Could not read the configuration file '{path}': {error}")]
    Io {
        /// The configuration file.
        path: PathBuf,
        /// The I/O error.
        #[source]
        error: io::Error,
    },
    /// The configuration document is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// The engine could not be created, e.g., because a local store could not be loaded.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
