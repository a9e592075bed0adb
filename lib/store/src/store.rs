//! The [`MemoryStore`] behind local services.
//!
//! Usage example:
//! ```
//! use fedql_store::{MemoryStore, RdfFormat};
//!
//! # tokio_test::block_on(async {
//! let file = b"<http://example.com/a> <http://example.com/p> \"v\" .";
//! let store = MemoryStore::from_reader(RdfFormat::NTriples, file.as_ref())?;
//!
//! let solutions = store.query("SELECT ?o WHERE { ?s <http://example.com/p> ?o }").await?;
//! assert_eq!(solutions.len(), 1);
//! # Result::<_, Box<dyn std::error::Error>>::Ok(())
//! # }).unwrap();
//! ```

use crate::format::{rdf_format_from_name, rdf_format_from_path};
use crate::StoreError;
use oxigraph::io::RdfFormat;
use oxigraph::model::GraphNameRef;
use oxigraph::sparql::{QueryResults, QuerySolution};
use oxigraph::store::Store;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// The file a store is loaded from and persisted to.
#[derive(Debug, Clone)]
struct BackingFile {
    path: PathBuf,
    format: RdfFormat,
}

/// An in-memory [RDF dataset](https://www.w3.org/TR/rdf11-concepts/#dfn-rdf-dataset) backed by
/// an [`oxigraph`] [`Store`].
///
/// Queries and updates run on the blocking thread pool of the runtime. Queries evaluate against
/// the content visible when they start. Updates of a store with a backing file are applied to a
/// copy which only replaces the content once the file has been written, so the store never shows
/// data the file does not hold. Cloning the store is cheap and the clones share the same content.
#[derive(Clone)]
pub struct MemoryStore {
    content: Arc<RwLock<Store>>,
    backing: Option<BackingFile>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("backing", &self.backing)
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Creates an empty store without backing file.
    pub fn new() -> Result<Self, StoreError> {
        Ok(Self::with_content(Store::new()?, None))
    }

    /// Creates a store without backing file from serialized RDF.
    pub fn from_reader(format: RdfFormat, reader: impl Read) -> Result<Self, StoreError> {
        let store = Store::new()?;
        store.load_from_reader(format, reader)?;
        Ok(Self::with_content(store, None))
    }

    /// Loads a store from `path`.
    ///
    /// `filetype` is an extension, media type or format name. If it is absent, the format is
    /// guessed from the file extension. Updates are persisted back to the same file in the same
    /// format.
    pub fn open(path: impl AsRef<Path>, filetype: Option<&str>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let format = match filetype {
            Some(filetype) => rdf_format_from_name(filetype)?,
            None => rdf_format_from_path(path)?,
        };
        let store = Store::new()?;
        store.load_from_reader(format, BufReader::new(File::open(path)?))?;
        debug!(path = %path.display(), quads = store.len()?, "Loaded local store");
        Ok(Self::with_content(
            store,
            Some(BackingFile {
                path: path.to_owned(),
                format,
            }),
        ))
    }

    fn with_content(store: Store, backing: Option<BackingFile>) -> Self {
        Self {
            content: Arc::new(RwLock::new(store)),
            backing,
        }
    }

    /// The number of quads in the store.
    pub async fn len(&self) -> Result<usize, StoreError> {
        Ok(self.content.read().await.len()?)
    }

    /// Returns whether the store contains no quads.
    pub async fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.content.read().await.is_empty()?)
    }

    /// Evaluates a SPARQL `SELECT` query.
    pub async fn query(&self, query: &str) -> Result<Vec<QuerySolution>, StoreError> {
        let store = self.content.read().await.clone();
        let query = query.to_owned();
        tokio::task::spawn_blocking(move || match store.query(query.as_str())? {
            QueryResults::Solutions(solutions) => Ok(solutions.collect::<Result<Vec<_>, _>>()?),
            QueryResults::Boolean(_) | QueryResults::Graph(_) => Err(StoreError::Unsupported(
                "only SELECT queries are supported".to_owned(),
            )),
        })
        .await?
    }

    /// Applies a SPARQL update to the store.
    ///
    /// If the store has a backing file, the updated content is written to it before it becomes
    /// visible. A failed write leaves both the store and the file unchanged.
    pub async fn update(&self, update: &str) -> Result<(), StoreError> {
        let mut content = Arc::clone(&self.content).write_owned().await;
        let backing = self.backing.clone();
        let update = update.to_owned();
        tokio::task::spawn_blocking(move || {
            let Some(backing) = backing else {
                return Ok(content.update(update.as_str())?);
            };
            let staged = Store::new()?;
            staged.extend(content.iter().collect::<Result<Vec<_>, _>>()?)?;
            staged.update(update.as_str())?;
            persist(&staged, &backing)?;
            *content = staged;
            Ok(())
        })
        .await?
    }

    /// Serializes the content of the store.
    pub async fn dump_to_writer<W: Write>(
        &self,
        format: RdfFormat,
        writer: W,
    ) -> Result<W, StoreError> {
        let store = self.content.read().await.clone();
        dump(&store, format, writer)
    }
}

/// Writes `store` to a temporary file next to the backing file and moves it into place.
fn persist(store: &Store, backing: &BackingFile) -> Result<(), StoreError> {
    let temporary = backing.path.with_extension("tmp");
    let persist_error = |error| StoreError::Persist {
        path: backing.path.clone(),
        error,
    };

    let writer = BufWriter::new(File::create(&temporary).map_err(persist_error)?);
    let mut writer = dump(store, backing.format, writer)?;
    writer.flush().map_err(persist_error)?;
    drop(writer);
    fs::rename(&temporary, &backing.path).map_err(persist_error)?;
    debug!(path = %backing.path.display(), "Persisted local store");
    Ok(())
}

fn dump<W: Write>(store: &Store, format: RdfFormat, writer: W) -> Result<W, StoreError> {
    if format.supports_datasets() {
        return Ok(store.dump_to_writer(format, writer)?);
    }
    if store.named_graphs().next().transpose()?.is_some() {
        return Err(StoreError::DatasetFormatExpected(format));
    }
    Ok(store.dump_graph_to_writer(GraphNameRef::DefaultGraph, format, writer)?)
}
