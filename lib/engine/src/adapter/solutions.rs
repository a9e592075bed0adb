use crate::adapter::{ExecutionOutcome, ExecutionRequest, ResolvedIds};
use crate::results::{FieldInfo, FieldResult, ObjectResult, StringResult, Subfields};
use fedql_model::pattern::{Fragment, QueryNode};
use fedql_model::vocab::{ID_FIELD, LITERAL_TYPE, LITERAL_VALUE_FIELD, TYPE_FIELD};
use fedql_model::FederationSchema;
use oxrdf::Term;
use sparesults::QuerySolution;

/// The outcome of a unit that found nothing.
pub(crate) fn empty_outcome(request: ExecutionRequest<'_>) -> ExecutionOutcome {
    let info = match request.fragment {
        Fragment::Node(root) => root_info(root),
        Fragment::Group(group) => group
            .parent()
            .map_or_else(FieldInfo::query_root, FieldInfo::from_parent),
    };
    ExecutionOutcome {
        resolved: ResolvedIds::new(),
        result: ObjectResult::new(info).into(),
        errors: Vec::new(),
    }
}

/// Maps the solutions of one backend call onto the result model.
pub(crate) fn to_outcome(
    request: ExecutionRequest<'_>,
    solutions: &[QuerySolution],
) -> ExecutionOutcome {
    let mut outcome = empty_outcome(request);
    outcome.resolved = resolved_ids(request, solutions);

    let (anchor, nodes, owner_type): (&str, Vec<&QueryNode>, &str) = match request.fragment {
        Fragment::Node(root) => (&root.node_id, root.children().collect(), &root.target_type),
        Fragment::Group(group) => match group.parent() {
            Some(parent) => (&parent.id, group.nodes.iter().collect(), &parent.type_name),
            None => return outcome,
        },
    };
    if let FieldResult::Object(result) = &mut outcome.result {
        for solution in solutions {
            if let Some(Term::NamedNode(id)) = solution.get(anchor) {
                let fields = subfields(
                    request.schema,
                    nodes.iter().copied(),
                    owner_type,
                    id.as_str(),
                    solution,
                );
                result.add_object_with(id.as_str(), fields);
            }
        }
    }
    outcome
}

/// Root results are paged by the backend already, so the offset must not be applied again.
fn root_info(root: &QueryNode) -> FieldInfo {
    let mut info = FieldInfo::from_node(root);
    info.args.offset = None;
    info
}

/// Literal placeholders take their paging from the value field unless they have their own.
fn literal_info(node: &QueryNode) -> FieldInfo {
    let mut info = FieldInfo::from_node(node);
    if info.args.has_paging() {
        return info;
    }
    if let Some(value) = node.children().find(|c| c.name == LITERAL_VALUE_FIELD) {
        info.args.order = value.args.order;
        info.args.limit = value.args.limit;
        info.args.offset = value.args.offset;
    }
    info
}

fn resolved_ids(request: ExecutionRequest<'_>, solutions: &[QuerySolution]) -> ResolvedIds {
    request
        .boundary
        .iter()
        .map(|variable| {
            let ids = solutions
                .iter()
                .filter_map(|s| match s.get(variable.as_str()) {
                    Some(Term::NamedNode(id)) => Some(id.as_str().to_owned()),
                    _ => None,
                })
                .collect();
            (variable.clone(), ids)
        })
        .collect()
}

/// The sub-results of the entity `id` of type `owner_type` found in one solution.
///
/// Fields without a value in the solution still get an empty result, so they render as `null`
/// or `[]` instead of being omitted.
fn subfields<'a>(
    schema: &FederationSchema,
    nodes: impl Iterator<Item = &'a QueryNode>,
    owner_type: &str,
    id: &str,
    solution: &QuerySolution,
) -> Subfields {
    let mut fields = Subfields::new();
    for node in nodes {
        let info = FieldInfo::from_node(node);
        let value = solution.get(node.node_id.as_str());
        let result: FieldResult = if node.name == ID_FIELD {
            let mut ids = StringResult::new(info);
            ids.add(id);
            ids.into()
        } else if node.name == TYPE_FIELD {
            let mut types = StringResult::new(info);
            if let Ok(config) = schema.type_config(owner_type) {
                types.add(config.id.as_str());
            }
            types.into()
        } else if node.target_type == LITERAL_TYPE {
            let mut literals = ObjectResult::new(literal_info(node));
            if let Some(Term::Literal(literal)) = value {
                let values: Subfields = node
                    .children()
                    .map(|child| {
                        let mut value = StringResult::new(FieldInfo::from_node(child));
                        value.add(literal.value());
                        (child.node_id.clone(), value.into())
                    })
                    .collect();
                // Keyed by the whole literal so that equal values in different languages stay apart.
                literals.add_object_with(literal.to_string(), values);
            }
            literals.into()
        } else if schema.is_object_type(&node.target_type) {
            let mut objects = ObjectResult::new(info);
            if let Some(Term::NamedNode(child)) = value {
                let nested = subfields(
                    schema,
                    node.children(),
                    &node.target_type,
                    child.as_str(),
                    solution,
                );
                objects.add_object_with(child.as_str(), nested);
            }
            objects.into()
        } else {
            let mut values = StringResult::new(info);
            if let Some(term) = value {
                values.add(lexical_form(term));
            }
            values.into()
        };
        fields.insert(node.node_id.clone(), result);
    }
    fields
}

fn lexical_form(term: &Term) -> String {
    match term {
        Term::NamedNode(node) => node.as_str().to_owned(),
        Term::BlankNode(node) => node.as_str().to_owned(),
        Term::Literal(literal) => literal.value().to_owned(),
        #[allow(unreachable_patterns, reason = "Depends on the enabled oxrdf features")]
        other => other.to_string(),
    }
}
