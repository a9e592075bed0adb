//! Well-known names and IRIs used throughout the federation engine.

pub use oxrdf::vocab::rdf;

/// Namespace used for fields that have no IRI in the schema's field table.
pub const QUERY_NAMESPACE: &str = "http://hypergraphql.org/query/";

/// Name of the root type of every query.
pub const QUERY_TYPE: &str = "Query";

/// Built-in field that returns the identifier of an entity.
pub const ID_FIELD: &str = "_id";

/// Built-in field that returns the type IRI of an entity.
pub const TYPE_FIELD: &str = "_type";

/// Placeholder object type that wraps a literal value.
pub const LITERAL_TYPE: &str = "hgqls_Literal";

/// The single field of [`LITERAL_TYPE`] that carries the literal itself.
pub const LITERAL_VALUE_FIELD: &str = "hgqls_value";

/// Built-in scalar types.
pub const SCALAR_TYPES: [&str; 4] = ["String", "Int", "Boolean", "ID"];

/// Prefix of the deterministic identity given to fan-out services.
pub const FAN_OUT_PREFIX: &str = "fanout";

/// Returns whether `field` is a built-in field that is answered without querying a store.
pub fn is_builtin_field(field: &str) -> bool {
    field == ID_FIELD || field == TYPE_FIELD
}

/// Returns whether `field` belongs to the introspection system.
pub fn is_introspection_field(field: &str) -> bool {
    field.starts_with("__")
}
