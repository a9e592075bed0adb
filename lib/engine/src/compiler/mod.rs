//! Compiles fragments of a query pattern into SPARQL `SELECT` queries.
//!
//! Every node of a fragment is bound to the variable named after its node id, so the solutions
//! of the generated query can be mapped back onto the query tree without any further bookkeeping.
//! Mutation fields are compiled to SPARQL updates by the [`MutationCompiler`].

mod batch;
mod mutation;

pub use batch::batches;
pub use mutation::{CompiledMutation, MutationCompiler};

use fedql_model::pattern::{Fragment, Order, QueryNode};
use fedql_model::vocab::{is_builtin_field, rdf, LITERAL_TYPE, LITERAL_VALUE_FIELD};
use fedql_model::{ConfigurationError, FederationSchema};
use itertools::Itertools;

/// Translates [`Fragment`]s into SPARQL for one service.
#[derive(Debug, Clone, Copy)]
pub struct FragmentCompiler<'a> {
    schema: &'a FederationSchema,
    graph: Option<&'a str>,
}

impl<'a> FragmentCompiler<'a> {
    /// Creates a compiler for a service that reads from `graph`, or from the default graph if
    /// `graph` is `None`.
    pub fn new(schema: &'a FederationSchema, graph: Option<&'a str>) -> Self {
        Self { schema, graph }
    }

    /// Compiles `fragment` restricted to the entities in `input`.
    ///
    /// For a root fragment, `input` restricts the root entities. For a group fragment, `input`
    /// holds the entities of the parent field. An empty `input` leaves the fragment unrestricted.
    pub fn compile(&self, fragment: &Fragment, input: &[String]) -> Result<String, ConfigurationError> {
        let body = match fragment {
            Fragment::Node(node) => self.root_pattern(node, input)?,
            Fragment::Group(group) => {
                let Some(parent) = group.parent() else {
                    // A group without parent is answered like a list of root fields.
                    return group
                        .nodes
                        .iter()
                        .map(|node| self.root_pattern(node, input))
                        .collect::<Result<Vec<_>, _>>()
                        .map(|patterns| self.select(&patterns.join(" ")));
                };
                let anchor = if input.is_empty() {
                    self.type_pattern(&parent.id, &parent.type_name)?
                } else {
                    values_clause(&parent.id, input)
                };
                let fields = group
                    .nodes
                    .iter()
                    .map(|node| self.field_pattern(node, &parent.id))
                    .collect::<Result<Vec<_>, _>>()?;
                join_patterns(std::iter::once(anchor).chain(fields))
            }
        };
        Ok(self.select(&body))
    }

    fn select(&self, body: &str) -> String {
        match self.graph {
            Some(graph) => format!("SELECT * WHERE {{ GRAPH <{graph}> {{ {body} }} }}"),
            None => format!("SELECT * WHERE {{ {body} }}"),
        }
    }

    /// The pattern of a root field. Paging is applied to the root entities in a sub-select so
    /// that it does not count the rows produced by the sub-fields.
    fn root_pattern(&self, node: &QueryNode, input: &[String]) -> Result<String, ConfigurationError> {
        let var = &node.node_id;
        let ids = if input.is_empty() { &node.args.ids[..] } else { input };
        let mut root = Vec::new();
        if !ids.is_empty() {
            root.push(values_clause(var, ids));
        }
        root.push(self.type_pattern(var, &node.target_type)?);
        let mut root = join_patterns(root);

        if node.args.has_paging() {
            let mut modifiers = Vec::new();
            if let Some(order) = node.args.order {
                modifiers.push(match order {
                    Order::Ascending => format!("ORDER BY ASC(?{var})"),
                    Order::Descending => format!("ORDER BY DESC(?{var})"),
                });
            }
            if let Some(limit) = node.args.limit {
                modifiers.push(format!("LIMIT {limit}"));
            }
            if let Some(offset) = node.args.offset {
                modifiers.push(format!("OFFSET {offset}"));
            }
            root = format!(
                "{{ SELECT ?{var} WHERE {{ {root} }} {} }}",
                modifiers.join(" ")
            );
        }

        let fields = node
            .children()
            .map(|child| self.field_pattern(child, var))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(join_patterns(std::iter::once(root).chain(fields)))
    }

    /// The optional pattern of a non-root field hanging from the entity bound to `parent_var`.
    fn field_pattern(&self, node: &QueryNode, parent_var: &str) -> Result<String, ConfigurationError> {
        if is_builtin_field(&node.name) {
            return Ok(String::new());
        }
        let var = &node.node_id;
        let predicate = self
            .schema
            .field_iris(&node.name)?
            .into_iter()
            .map(|iri| format!("<{iri}>"))
            .join("|");
        let mut parts = vec![format!("?{parent_var} {predicate} ?{var} .")];

        if node.target_type == LITERAL_TYPE {
            parts.push(format!("FILTER(isLiteral(?{var}))"));
            let lang = node
                .children()
                .find(|c| c.name == LITERAL_VALUE_FIELD)
                .and_then(|c| c.args.lang.as_deref())
                .or(node.args.lang.as_deref());
            if let Some(lang) = lang {
                parts.push(lang_filter(var, lang));
            }
        } else {
            if self.schema.is_object_type(&node.target_type) {
                parts.push(self.type_pattern(var, &node.target_type)?);
            }
            if !node.args.ids.is_empty() {
                parts.push(values_clause(var, &node.args.ids));
            }
            if let Some(lang) = &node.args.lang {
                parts.push(lang_filter(var, lang));
            }
            for child in node.children() {
                parts.push(self.field_pattern(child, var)?);
            }
        }
        Ok(format!("OPTIONAL {{ {} }}", join_patterns(parts)))
    }

    /// The pattern typing `var`. Equivalent types are alternatives.
    fn type_pattern(&self, var: &str, type_name: &str) -> Result<String, ConfigurationError> {
        let iris = self.schema.type_iris(type_name)?;
        let rdf_type = rdf::TYPE.as_str();
        Ok(match iris.as_slice() {
            [iri] => format!("?{var} <{rdf_type}> <{iri}> ."),
            iris => iris
                .iter()
                .map(|iri| format!("{{ ?{var} <{rdf_type}> <{iri}> . }}"))
                .join(" UNION "),
        })
    }
}

fn values_clause(var: &str, ids: &[String]) -> String {
    format!(
        "VALUES ?{var} {{ {} }}",
        ids.iter().map(|id| format!("<{id}>")).join(" ")
    )
}

fn lang_filter(var: &str, lang: &str) -> String {
    format!("FILTER(lang(?{var}) = \"{lang}\")")
}

fn join_patterns(patterns: impl IntoIterator<Item = String>) -> String {
    patterns.into_iter().filter(|p| !p.is_empty()).join(" ")
}
