use oxigraph::io::RdfFormat;
use oxigraph::sparql::EvaluationError;
use oxigraph::store::{LoaderError, SerializerError, StorageError};
use std::io;
use std::path::PathBuf;

/// An error raised by a [`MemoryStore`](crate::MemoryStore).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The query or update is invalid or failed to evaluate.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    /// An error while loading an RDF file.
    #[error(transparent)]
    Loading(#[from] LoaderError),
    /// An error while serializing the content of the store.
    #[error(transparent)]
    Serializing(#[from] SerializerError),
    /// An error of the underlying storage.
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// An error while reading the backing file.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The RDF format could not be determined.
    #[error("The RDF format '{0}' is unknown")]
    UnknownFormat(String),
    /// The file format cannot hold the named graphs of the store.
    #[error("The store contains named graphs which cannot be written as {0}")]
    DatasetFormatExpected(RdfFormat),
    /// The query form is not supported.
    #[error("Unsupported SPARQL feature: {0}")]
    Unsupported(String),
    /// The store could not write the file.
    #[error("Could not persist the store to {path}: {error}")]
    Persist {
        /// The backing file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        error: io::Error,
    },
    /// The evaluation task panicked or was cancelled.
    #[error("The evaluation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
