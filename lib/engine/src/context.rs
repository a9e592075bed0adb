use crate::plan::ExecutionPlan;
use fedql_model::pattern::QueryNode;
use fedql_model::vocab::{ID_FIELD, QUERY_NAMESPACE, TYPE_FIELD};
use fedql_model::FederationSchema;
use std::collections::BTreeMap;

/// The JSON-LD `@context` of a response.
///
/// Every output key maps to the predicate IRI of its field. Fields the schema has no IRI for are
/// placed in the query namespace.
pub fn ld_context(plan: &ExecutionPlan, schema: &FederationSchema) -> BTreeMap<String, String> {
    let mut context = BTreeMap::from([
        (ID_FIELD.to_owned(), "@id".to_owned()),
        (TYPE_FIELD.to_owned(), "@type".to_owned()),
    ]);
    for unit in plan.units() {
        for node in unit.fragment.nodes() {
            collect(node, schema, &mut context);
        }
    }
    context
}

fn collect(node: &QueryNode, schema: &FederationSchema, context: &mut BTreeMap<String, String>) {
    if node.name != ID_FIELD && node.name != TYPE_FIELD {
        let iri = schema
            .field_iri(&node.name)
            .map_or_else(|| format!("{QUERY_NAMESPACE}{}", node.name), str::to_owned);
        context.entry(node.output_name().to_owned()).or_insert(iri);
    }
    for child in node.children() {
        collect(child, schema, context);
    }
}
