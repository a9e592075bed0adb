//! The result model: a tree of [`FieldResult`]s that mirrors the query tree.
//!
//! Every execution unit produces a partial result. Partial results of the same field are combined
//! with [`FieldResult::merge`], results of split-off units are attached to the entities of their
//! parent unit with [`FieldResult::graft`]. Once all units have finished, the tree is rendered to
//! JSON with [`FieldResult::render`].

mod object;
mod root;
mod string;

pub use object::{ObjectResult, Subfields};
pub use root::QueryRootResult;
pub use string::StringResult;

use fedql_model::pattern::{FieldArgs, Order, ParentRef, QueryNode};
use fedql_model::vocab::QUERY_TYPE;
use serde_json::Value;

/// The identity of the field a result belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    /// The node id of the field, unique within one request.
    pub node_id: String,
    pub name: String,
    pub alias: Option<String>,
    pub args: FieldArgs,
    pub is_list: bool,
}

impl FieldInfo {
    /// The identity of the result root.
    pub fn query_root() -> Self {
        Self {
            node_id: String::new(),
            name: QUERY_TYPE.to_owned(),
            alias: None,
            args: FieldArgs::default(),
            is_list: false,
        }
    }

    /// The identity of the results of `node`.
    pub fn from_node(node: &QueryNode) -> Self {
        Self {
            node_id: node.node_id.clone(),
            name: node.name.clone(),
            alias: node.alias.clone(),
            args: node.args.clone(),
            is_list: node.is_list,
        }
    }

    /// The identity of the field a split-off group hangs from.
    pub fn from_parent(parent: &ParentRef) -> Self {
        Self {
            node_id: parent.id.clone(),
            name: parent.name.clone(),
            alias: parent.alias.clone(),
            args: parent.args.clone(),
            is_list: parent.is_list,
        }
    }

    /// The key of the field in the rendered output.
    pub fn output_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Applies `order`, then `offset`, then `limit` to already sorted items.
    fn paginate<T>(&self, mut items: Vec<T>) -> Vec<T> {
        if self.args.order == Some(Order::Descending) {
            items.reverse();
        }
        let offset = self.args.offset.unwrap_or(0);
        let limit = self.args.limit.unwrap_or(usize::MAX);
        items.into_iter().skip(offset).take(limit).collect()
    }

    /// Renders `items` as a list or as a single value, depending on the cardinality of the field.
    ///
    /// A singleton field with more than one value is rendered as a list and `diagnostics` receives
    /// a schema violation.
    fn render_cardinality(&self, mut items: Vec<Value>, diagnostics: &mut Vec<String>) -> Value {
        if self.is_list {
            return Value::Array(items);
        }
        match items.len() {
            0 => Value::Null,
            1 => items.pop().unwrap_or(Value::Null),
            _ => {
                diagnostics.push(format!(
                    "Schema Error for {}: Only one result should exist, all queried values are \
                     returned in a list.",
                    self.output_name()
                ));
                Value::Array(items)
            }
        }
    }
}

/// The result of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldResult {
    /// Entities keyed by their IRI.
    Object(ObjectResult),
    /// Scalar values.
    Strings(StringResult),
    /// The root of a response.
    Root(QueryRootResult),
}

impl FieldResult {
    pub fn info(&self) -> &FieldInfo {
        match self {
            Self::Object(result) => result.info(),
            Self::Strings(result) => result.info(),
            Self::Root(result) => result.info(),
        }
    }

    /// The diagnostics recorded on this result, not including the ones of nested results.
    pub fn errors(&self) -> &[String] {
        match self {
            Self::Object(result) => result.errors(),
            Self::Strings(result) => result.errors(),
            Self::Root(result) => result.errors(),
        }
    }

    /// Unions `other` into this result.
    ///
    /// Results of different fields or of different kinds are not merged: the mismatch is
    /// recorded as a diagnostic and `other` is dropped.
    pub fn merge(&mut self, other: FieldResult) {
        match (self, other) {
            (Self::Root(this), other) => this.merge(other),
            (Self::Object(this), Self::Object(other)) => this.merge(other),
            (Self::Strings(this), Self::Strings(other)) => this.merge(other),
            (this, other) => {
                let message = format!(
                    "Cannot merge the {} result of '{}' with the {} result of '{}'",
                    this.kind(),
                    this.info().name,
                    other.kind(),
                    other.info().name
                );
                tracing::warn!("{message}");
                this.push_error(message);
            }
        }
    }

    /// Attaches the sub-results of `fragment` to the matching entities in this tree.
    ///
    /// The object result whose node id equals the node id of `fragment` receives the sub-results
    /// of every entity it already contains. Entities only known to `fragment` are ignored.
    pub fn graft(&mut self, fragment: &ObjectResult) {
        match self {
            Self::Root(root) => root.graft(fragment),
            Self::Object(object) => object.graft(fragment),
            Self::Strings(_) => {}
        }
    }

    /// Renders this result to JSON, collecting diagnostics in `diagnostics`.
    pub fn render(&self, diagnostics: &mut Vec<String>) -> Value {
        match self {
            Self::Object(result) => result.render(diagnostics),
            Self::Strings(result) => result.render(diagnostics),
            Self::Root(result) => result.render(diagnostics),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Strings(_) => "string",
            Self::Root(_) => "root",
        }
    }

    fn push_error(&mut self, error: String) {
        match self {
            Self::Object(result) => result.push_error(error),
            Self::Strings(result) => result.push_error(error),
            Self::Root(result) => result.push_error(error),
        }
    }
}

impl From<ObjectResult> for FieldResult {
    fn from(result: ObjectResult) -> Self {
        Self::Object(result)
    }
}

impl From<StringResult> for FieldResult {
    fn from(result: StringResult) -> Self {
        Self::Strings(result)
    }
}

impl From<QueryRootResult> for FieldResult {
    fn from(result: QueryRootResult) -> Self {
        Self::Root(result)
    }
}
