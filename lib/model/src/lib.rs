mod error;
pub mod pattern;
mod schema;
mod service;
pub mod vocab;

pub use error::*;
pub use schema::*;
pub use service::*;

// Re-export the oxrdf types that appear in the public API of the engine.
pub use oxiri::Iri;
pub use oxrdf::{Literal, NamedNode, Term, Variable};
