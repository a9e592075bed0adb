use fedql_model::pattern::Selection;
use fedql_model::vocab::{rdf, ID_FIELD, LITERAL_TYPE, LITERAL_VALUE_FIELD, TYPE_FIELD};
use fedql_model::{ConfigurationError, FederationSchema, Literal, MutationAction, NamedNode};
use serde_json::{Map, Value};

/// Variable bound to the entities matched by a delete without identifier.
const ENTITY_VAR: &str = "?entity";

/// A mutation field translated to SPARQL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledMutation {
    /// The update to apply. `None` if the arguments describe nothing to change.
    pub update: Option<String>,
    /// The type of the written entities.
    pub target_type: String,
    /// The entity given in `_id`.
    pub id: Option<String>,
}

/// Translates the arguments of mutation fields into SPARQL updates for one service.
///
/// Inserts add the entity, its type and every given value. Deletes remove the given values of the
/// entity `_id`, every triple mentioning `_id` if no value is given, or the given values of all
/// entities of the target type that have them if `_id` is missing.
#[derive(Debug, Clone, Copy)]
pub struct MutationCompiler<'a> {
    schema: &'a FederationSchema,
    graph: Option<&'a str>,
}

impl<'a> MutationCompiler<'a> {
    /// Creates a compiler for a service that stores its data in `graph`, or in the default graph
    /// if `graph` is `None`.
    pub fn new(schema: &'a FederationSchema, graph: Option<&'a str>) -> Self {
        Self { schema, graph }
    }

    pub fn compile(&self, selection: &Selection) -> Result<CompiledMutation, ConfigurationError> {
        let config = self.schema.mutation_field(&selection.name)?;
        let id = selection
            .args
            .get(ID_FIELD)
            .map(|value| named_node(&selection.name, ID_FIELD, value))
            .transpose()?;
        let subject = id.as_ref().map(ToString::to_string);
        let has_values = selection.args.keys().any(|arg| arg != ID_FIELD);

        let update = match (config.action, &subject) {
            (MutationAction::Insert, None) => {
                return Err(ConfigurationError::invalid_argument(
                    &selection.name,
                    ID_FIELD,
                    "inserting an entity requires an identifier",
                ))
            }
            (MutationAction::Insert, Some(id)) => {
                let mut triples = vec![self.type_triple(id, &config.target_name)?];
                self.value_triples(id, &config.target_name, &selection.args, true, &mut triples)?;
                Some(format!("INSERT DATA {{ {} }}", self.in_graph(&triples.join(" "))))
            }
            (MutationAction::Delete, Some(id)) if has_values => {
                let mut triples = Vec::new();
                self.value_triples(id, &config.target_name, &selection.args, false, &mut triples)?;
                Some(format!("DELETE DATA {{ {} }}", self.in_graph(&triples.join(" "))))
            }
            (MutationAction::Delete, Some(id)) => Some(format!(
                "DELETE WHERE {{ {} }} ; DELETE WHERE {{ {} }}",
                self.in_graph(&format!("{id} ?p ?o .")),
                self.in_graph(&format!("?s ?p {id} ."))
            )),
            (MutationAction::Delete, None) if has_values => {
                let mut triples = Vec::new();
                self.value_triples(
                    ENTITY_VAR,
                    &config.target_name,
                    &selection.args,
                    false,
                    &mut triples,
                )?;
                let template = triples.join(" ");
                let condition = format!(
                    "{} {template}",
                    self.type_triple(ENTITY_VAR, &config.target_name)?
                );
                Some(format!(
                    "DELETE {{ {} }} WHERE {{ {} }}",
                    self.in_graph(&template),
                    self.in_graph(&condition)
                ))
            }
            (MutationAction::Delete, None) => None,
        };

        Ok(CompiledMutation {
            update,
            target_type: config.target_name.clone(),
            id: id.map(NamedNode::into_string),
        })
    }

    fn in_graph(&self, triples: &str) -> String {
        match self.graph {
            Some(graph) => format!("GRAPH <{graph}> {{ {triples} }}"),
            None => triples.to_owned(),
        }
    }

    fn type_triple(&self, subject: &str, type_name: &str) -> Result<String, ConfigurationError> {
        let type_iri = &self.schema.type_config(type_name)?.id;
        Ok(format!("{subject} <{}> <{type_iri}> .", rdf::TYPE.as_str()))
    }

    /// Appends the triples linking `subject` to the values in `args`. Nested entities are typed
    /// only if `typed` is set.
    fn value_triples(
        &self,
        subject: &str,
        type_name: &str,
        args: &Map<String, Value>,
        typed: bool,
        triples: &mut Vec<String>,
    ) -> Result<(), ConfigurationError> {
        for (field, value) in args {
            if field == ID_FIELD {
                continue;
            }
            if field == TYPE_FIELD {
                return Err(ConfigurationError::invalid_argument(
                    type_name,
                    field,
                    "the type of an entity is derived from the mutation field",
                ));
            }
            let target = &self.schema.field_of_type(type_name, field)?.target_name;
            let predicate = self.schema.field_iri(field).ok_or_else(|| {
                ConfigurationError::UnknownField {
                    type_name: type_name.to_owned(),
                    field: field.clone(),
                }
            })?;
            let values = match value {
                Value::Array(values) => values.iter().collect(),
                value => vec![value],
            };
            for value in values {
                let object = self.object(field, target, value, typed, triples)?;
                triples.push(format!("{subject} <{predicate}> {object} ."));
            }
        }
        Ok(())
    }

    /// The term a field value is written as.
    fn object(
        &self,
        field: &str,
        target: &str,
        value: &Value,
        typed: bool,
        triples: &mut Vec<String>,
    ) -> Result<String, ConfigurationError> {
        if target == LITERAL_TYPE {
            return match value {
                Value::Object(object) => {
                    let value = object.get(LITERAL_VALUE_FIELD).ok_or_else(|| {
                        ConfigurationError::invalid_argument(
                            field,
                            LITERAL_VALUE_FIELD,
                            "a literal needs a value",
                        )
                    })?;
                    literal(field, value)
                }
                value => literal(field, value),
            };
        }
        if !self.schema.is_object_type(target) {
            return literal(field, value);
        }
        match value {
            Value::String(_) => Ok(named_node(field, ID_FIELD, value)?.to_string()),
            Value::Object(object) => {
                let id = object.get(ID_FIELD).ok_or_else(|| {
                    ConfigurationError::invalid_argument(
                        field,
                        ID_FIELD,
                        "a linked entity needs an identifier",
                    )
                })?;
                let id = named_node(field, ID_FIELD, id)?.to_string();
                if typed {
                    triples.push(self.type_triple(&id, target)?);
                }
                self.value_triples(&id, target, object, typed, triples)?;
                Ok(id)
            }
            _ => Err(ConfigurationError::invalid_argument(
                field,
                ID_FIELD,
                "expected an IRI or an entity",
            )),
        }
    }
}

fn named_node(field: &str, argument: &str, value: &Value) -> Result<NamedNode, ConfigurationError> {
    let iri = value
        .as_str()
        .ok_or_else(|| ConfigurationError::invalid_argument(field, argument, "expected an IRI"))?;
    NamedNode::new(iri).map_err(|error| ConfigurationError::InvalidIri {
            iri: iri.to_owned(),
            error,
        })
}

/// Writes a scalar as a literal. Strings become simple literals; numbers and booleans keep their
/// XSD datatype.
fn literal(field: &str, value: &Value) -> Result<String, ConfigurationError> {
    let literal = match value {
        Value::String(value) => Literal::new_simple_literal(value),
        Value::Bool(value) => Literal::from(*value),
        Value::Number(number) => match (number.as_i64(), number.as_f64()) {
            (Some(value), _) => Literal::from(value),
            (None, Some(value)) => Literal::from(value),
            (None, None) => {
                return Err(ConfigurationError::invalid_argument(
                    field,
                    field,
                    "the number is out of range",
                ))
            }
        },
        _ => {
            return Err(ConfigurationError::invalid_argument(
                field,
                field,
                "expected a string, a number or a boolean",
            ))
        }
    };
    Ok(literal.to_string())
}
