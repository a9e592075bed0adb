use crate::error::validate_iri;
use crate::pattern::{FieldArgs, Order, QueryGroup, QueryNode, Selection, ServiceSet};
use crate::vocab::{
    is_introspection_field, ID_FIELD, LITERAL_TYPE, LITERAL_VALUE_FIELD, TYPE_FIELD,
};
use crate::{ConfigurationError, FederationSchema, QueryFieldKind};
use serde_json::{Map, Value};

const LIMIT: &str = "limit";
const OFFSET: &str = "offset";
const ORDER: &str = "order";
const LANG: &str = "lang";

/// The query pattern of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPattern {
    /// The root fields.
    pub root: QueryGroup,
    /// Root fields that were skipped because no service answers them.
    pub warnings: Vec<String>,
}

/// Builds a [`QueryPattern`] from parsed selections.
///
/// Root fields are numbered `x_1`, `x_2`, ... and the children of a field with node id `p` are
/// numbered `p_1`, `p_2`, ..., which keeps all node ids of a request distinct.
pub struct QueryPatternBuilder<'schema> {
    schema: &'schema FederationSchema,
}

impl<'schema> QueryPatternBuilder<'schema> {
    pub fn new(schema: &'schema FederationSchema) -> Self {
        Self { schema }
    }

    /// Builds the pattern for the given root selections.
    pub fn build(&self, selections: &[Selection]) -> Result<QueryPattern, ConfigurationError> {
        let mut nodes = Vec::with_capacity(selections.len());
        let mut warnings = Vec::new();

        for (index, selection) in selections.iter().enumerate() {
            if is_introspection_field(&selection.name) {
                continue;
            }

            let config = self.schema.query_field(&selection.name)?;
            if config.services.is_empty() {
                warnings.push(format!(
                    "The query field '{}' has no assigned service and is skipped",
                    selection.name
                ));
                continue;
            }

            let node_id = format!("x_{}", index + 1);
            let mut args = parse_args(&selection.name, &selection.args)?;
            if config.kind == QueryFieldKind::Get && !args.ids.is_empty() {
                return Err(ConfigurationError::invalid_argument(
                    &selection.name,
                    ID_FIELD,
                    "only fields looking up entities by id accept identifiers",
                ));
            }
            if config.kind == QueryFieldKind::GetById {
                args.ids.dedup();
            }

            let services = ServiceSet::new(config.services.iter().cloned());
            let fields = self.build_children(
                &selection.selections,
                &config.target_name,
                &node_id,
                &services,
            )?;
            let mut node = QueryNode {
                name: selection.name.clone(),
                alias: selection.alias.clone(),
                node_id,
                args,
                target_type: config.target_name.clone(),
                is_list: config.is_list,
                services,
                fields,
                parent: None,
            };
            stamp_parent(&mut node);
            nodes.push(node);
        }

        Ok(QueryPattern {
            root: QueryGroup::new(nodes),
            warnings,
        })
    }

    fn build_children(
        &self,
        selections: &[Selection],
        owner_type: &str,
        parent_id: &str,
        parent_services: &ServiceSet,
    ) -> Result<Option<QueryGroup>, ConfigurationError> {
        let mut nodes = Vec::with_capacity(selections.len());

        for (index, selection) in selections.iter().enumerate() {
            if is_introspection_field(&selection.name) {
                continue;
            }
            let node_id = format!("{parent_id}_{}", index + 1);
            let args = parse_args(&selection.name, &selection.args)?;

            let node = if selection.name == ID_FIELD || selection.name == TYPE_FIELD {
                QueryNode {
                    name: selection.name.clone(),
                    alias: selection.alias.clone(),
                    node_id,
                    args,
                    target_type: "ID".to_owned(),
                    is_list: false,
                    services: parent_services.clone(),
                    fields: None,
                    parent: None,
                }
            } else if owner_type == LITERAL_TYPE {
                if selection.name != LITERAL_VALUE_FIELD {
                    return Err(ConfigurationError::UnknownField {
                        type_name: owner_type.to_owned(),
                        field: selection.name.clone(),
                    });
                }
                QueryNode {
                    name: selection.name.clone(),
                    alias: selection.alias.clone(),
                    node_id,
                    args,
                    target_type: "String".to_owned(),
                    is_list: false,
                    services: parent_services.clone(),
                    fields: None,
                    parent: None,
                }
            } else {
                let config = self.schema.field_of_type(owner_type, &selection.name)?;
                if config.services.is_empty() {
                    return Err(ConfigurationError::UnassignedField {
                        type_name: owner_type.to_owned(),
                        field: selection.name.clone(),
                    });
                }
                let services = ServiceSet::new(config.services.iter().cloned());
                let fields = if self.has_sub_selection(&config.target_name) {
                    self.build_children(
                        &selection.selections,
                        &config.target_name,
                        &node_id,
                        &services,
                    )?
                } else {
                    None
                };
                let mut node = QueryNode {
                    name: selection.name.clone(),
                    alias: selection.alias.clone(),
                    node_id,
                    args,
                    target_type: config.target_name.clone(),
                    is_list: config.is_list,
                    services,
                    fields,
                    parent: None,
                };
                stamp_parent(&mut node);
                node
            };
            nodes.push(node);
        }

        Ok((!nodes.is_empty()).then(|| QueryGroup::new(nodes)))
    }

    fn has_sub_selection(&self, target_type: &str) -> bool {
        target_type == LITERAL_TYPE || self.schema.is_object_type(target_type)
    }
}

/// Marks the children of `node` that are owned by another service than `node` itself.
fn stamp_parent(node: &mut QueryNode) {
    let parent = node.as_parent();
    let services = node.services.clone();
    if let Some(group) = node.fields.as_mut() {
        for child in &mut group.nodes {
            if child.services != services {
                child.parent = Some(parent.clone());
            }
        }
    }
}

fn parse_args(field: &str, args: &Map<String, Value>) -> Result<FieldArgs, ConfigurationError> {
    let mut result = FieldArgs::default();
    for (name, value) in args {
        match name.as_str() {
            LIMIT => result.limit = Some(parse_count(field, name, value)?),
            OFFSET => result.offset = Some(parse_count(field, name, value)?),
            ORDER => {
                let order = value.as_str().ok_or_else(|| {
                    ConfigurationError::invalid_argument(field, name, "expected a string")
                })?;
                result.order = Some(Order::parse(order)?);
            }
            LANG => {
                let lang = value.as_str().ok_or_else(|| {
                    ConfigurationError::invalid_argument(field, name, "expected a string")
                })?;
                if lang.is_empty() || !lang.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                    return Err(ConfigurationError::invalid_argument(
                        field,
                        name,
                        format!("'{lang}' is not a language tag"),
                    ));
                }
                result.lang = Some(lang.to_owned());
            }
            ID_FIELD => {
                let ids = match value {
                    Value::String(id) => vec![id.clone()],
                    Value::Array(ids) => ids
                        .iter()
                        .map(|id| {
                            id.as_str().map(str::to_owned).ok_or_else(|| {
                                ConfigurationError::invalid_argument(
                                    field,
                                    name,
                                    "expected a list of IRIs",
                                )
                            })
                        })
                        .collect::<Result<_, _>>()?,
                    _ => {
                        return Err(ConfigurationError::invalid_argument(
                            field,
                            name,
                            "expected a list of IRIs",
                        ))
                    }
                };
                ids.iter().try_for_each(|id| validate_iri(id))?;
                result.ids = ids;
            }
            // Other arguments are not interpreted by the engine.
            _ => {}
        }
    }
    Ok(result)
}

fn parse_count(field: &str, name: &str, value: &Value) -> Result<usize, ConfigurationError> {
    value
        .as_u64()
        .and_then(|v| usize::try_from(v).ok())
        .ok_or_else(|| {
            ConfigurationError::invalid_argument(field, name, "expected a non-negative integer")
        })
}
