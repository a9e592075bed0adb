use fedql_model::ConfigurationError;
use fedql_store::StoreError;
use sparesults::QueryResultsParseError;
use std::time::Duration;

/// An error raised while a source adapter executes a fragment or an update.
///
/// Adapter errors are isolated per execution unit: the failing unit contributes an empty result
/// and the error is reported alongside the response.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AdapterError {
    /// The HTTP request to a remote endpoint failed.
    #[error("Request to the remote endpoint failed: {0}")]
    Http(#[from] reqwest::Error),
    /// The remote endpoint returned a body that is not a valid SPARQL results document.
    #[error(transparent)]
    ResultsParsing(#[from] QueryResultsParseError),
    /// The remote endpoint answered a `SELECT` query with a boolean.
    #[error("The remote endpoint returned a boolean instead of solutions")]
    UnexpectedBoolean,
    /// The local store rejected the query or the update.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// The fragment could not be compiled.
    #[error(transparent)]
    Compilation(#[from] ConfigurationError),
    /// The backend did not answer within the deadline.
    #[error("The backend did not answer within {0:?}")]
    Timeout(Duration),
    /// The worker pool was shut down.
    #[error("The worker pool is closed")]
    PoolClosed,
    /// A fan-out without member services.
    #[error("The fan-out '{0}' has no member services")]
    NoMembers(String),
    /// The adapter cannot apply updates.
    #[error("The service '{0}' does not support updates")]
    UpdateUnsupported(String),
}

/// An error that aborts a whole request.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The configuration or the query is invalid.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    /// A local store could not be opened.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// An update could not be applied.
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}
