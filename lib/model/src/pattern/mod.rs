//! The query pattern: the intermediate representation of a single query.
//!
//! A pattern is built once per request from the requested [`Selection`]s and the
//! [`FederationSchema`](crate::FederationSchema). Every requested field becomes a [`QueryNode`] with
//! a request-wide unique node id that doubles as the variable of the field in generated SPARQL.

mod builder;
mod selection;

pub use builder::{QueryPattern, QueryPatternBuilder};
pub use selection::Selection;

use crate::vocab::FAN_OUT_PREFIX;
use crate::ConfigurationError;
use std::fmt::{Display, Formatter};

/// Sort direction of the `order` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Ascending,
    Descending,
}

impl Order {
    /// Parses the value of an `order` argument.
    pub fn parse(value: &str) -> Result<Self, ConfigurationError> {
        match value.to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" => Ok(Self::Ascending),
            "DESC" | "DESCENDING" => Ok(Self::Descending),
            _ => Err(ConfigurationError::InvalidOrder(value.to_owned())),
        }
    }
}

/// The arguments of a field that the engine understands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldArgs {
    /// Maximum number of returned entities or values.
    pub limit: Option<usize>,
    /// Number of entities or values to skip.
    pub offset: Option<usize>,
    /// Sort direction, applied to the entity identifiers or scalar values.
    pub order: Option<Order>,
    /// Language tag literals must carry.
    pub lang: Option<String>,
    /// Identifiers the field is restricted to (`_id`).
    pub ids: Vec<String>,
}

impl FieldArgs {
    /// Returns whether the arguments restrict the number or order of entities.
    pub fn has_paging(&self) -> bool {
        self.limit.is_some() || self.offset.is_some() || self.order.is_some()
    }
}

/// The sorted set of services that own a field.
///
/// A single service owns the field directly, several services own it through a fan-out whose
/// identity is derived from the sorted member ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServiceSet(Vec<String>);

impl ServiceSet {
    /// Creates a new set, sorting and de-duplicating the members.
    pub fn new(members: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let mut members: Vec<String> = members.into_iter().map(Into::into).collect();
        members.sort();
        members.dedup();
        Self(members)
    }

    /// The id of the service answering for this set.
    pub fn id(&self) -> String {
        match self.0.as_slice() {
            [single] => single.clone(),
            members => format!("{FAN_OUT_PREFIX}_{}", members.join("_")),
        }
    }

    /// The member services.
    pub fn members(&self) -> &[String] {
        &self.0
    }

    /// Returns whether more than one service owns the field.
    pub fn is_fan_out(&self) -> bool {
        self.0.len() > 1
    }
}

impl Display for ServiceSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id())
    }
}

/// Identity of the field a split-off group hangs from.
///
/// It is stamped onto the first-level nodes of a group whose owner differs from the owner of the
/// enclosing field so the group can be compiled and merged on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRef {
    pub name: String,
    /// The node id of the parent field, i.e., the boundary variable.
    pub id: String,
    pub alias: Option<String>,
    pub args: FieldArgs,
    /// The output type of the parent field.
    pub type_name: String,
    pub is_list: bool,
}

/// A requested field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryNode {
    pub name: String,
    pub alias: Option<String>,
    /// Unique within one request. Used as SPARQL variable name.
    pub node_id: String,
    pub args: FieldArgs,
    /// The output type of the field.
    pub target_type: String,
    pub is_list: bool,
    /// The services that own this field.
    pub services: ServiceSet,
    /// The sub-selection, if any.
    pub fields: Option<QueryGroup>,
    /// Set if the owner of this field differs from the owner of the enclosing field.
    pub parent: Option<ParentRef>,
}

impl QueryNode {
    /// The key of this field in the rendered output.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Returns the identity of this field as seen by its split-off children.
    pub fn as_parent(&self) -> ParentRef {
        ParentRef {
            name: self.name.clone(),
            id: self.node_id.clone(),
            alias: self.alias.clone(),
            args: self.args.clone(),
            type_name: self.target_type.clone(),
            is_list: self.is_list,
        }
    }

    /// Iterates over the direct children of this node.
    pub fn children(&self) -> impl Iterator<Item = &QueryNode> {
        self.fields.iter().flat_map(|g| g.nodes.iter())
    }
}

/// An ordered list of sibling fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryGroup {
    pub nodes: Vec<QueryNode>,
}

impl QueryGroup {
    pub fn new(nodes: Vec<QueryNode>) -> Self {
        Self { nodes }
    }

    /// The field this group hangs from, if the group was split off from it.
    pub fn parent(&self) -> Option<&ParentRef> {
        self.nodes.first().and_then(|n| n.parent.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// The portion of a query tree assigned to one service for one execution call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    /// A root field of the query.
    Node(QueryNode),
    /// Sibling fields split off from a field owned by another service.
    Group(QueryGroup),
}

impl Fragment {
    /// Iterates over the top-level nodes of the fragment.
    pub fn nodes(&self) -> impl Iterator<Item = &QueryNode> {
        let nodes: &[QueryNode] = match self {
            Self::Node(node) => std::slice::from_ref(node),
            Self::Group(group) => &group.nodes,
        };
        nodes.iter()
    }
}
