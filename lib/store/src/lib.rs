//! An in-memory RDF dataset that answers SPARQL queries and updates.
//!
//! Evaluation is done by [`oxigraph`]. This crate adds loading from and persisting to a backing
//! file and runs the evaluation off the async runtime.

mod error;
mod format;
mod store;

pub use error::StoreError;
pub use format::{rdf_format_from_name, rdf_format_from_path};
pub use oxigraph::io::RdfFormat;
pub use oxigraph::sparql::QuerySolution;
pub use store::MemoryStore;
