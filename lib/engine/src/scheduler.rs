use crate::adapter::{ExecutionOutcome, ExecutionRequest};
use crate::plan::{ExecutionForest, ExecutionPlan, UnitId};
use crate::pool::ExecutionEnv;
use crate::results::{FieldResult, QueryRootResult};
use fedql_model::FederationSchema;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::collections::BTreeSet;
use tracing::{debug, info_span, warn, Instrument};

/// What one unit and its descendants produced.
#[derive(Debug, Default)]
struct UnitOutcome {
    result: Option<FieldResult>,
    errors: Vec<String>,
}

/// Runs an [`ExecutionPlan`].
///
/// Sibling units run concurrently. A unit starts its child forests as soon as its own backend
/// calls have returned, and the results of the children are grafted onto its result before it
/// reports back to its parent.
pub struct Scheduler<'a> {
    plan: &'a ExecutionPlan,
    schema: &'a FederationSchema,
    env: &'a ExecutionEnv,
}

impl<'a> Scheduler<'a> {
    pub fn new(plan: &'a ExecutionPlan, schema: &'a FederationSchema, env: &'a ExecutionEnv) -> Self {
        Self { plan, schema, env }
    }

    /// Executes the plan and returns the merged result together with the errors of the failed
    /// units.
    pub async fn execute(&self) -> (QueryRootResult, Vec<String>) {
        let no_input = BTreeSet::new();
        let mut root = QueryRootResult::new();
        let mut errors = Vec::new();
        for outcome in self.execute_forest(self.plan.roots(), &no_input).await {
            errors.extend(outcome.errors);
            if let Some(result) = outcome.result {
                root.merge(result);
            }
        }
        (root, errors)
    }

    fn execute_forest<'s>(
        &'s self,
        forest: &'s ExecutionForest,
        input: &'s BTreeSet<String>,
    ) -> BoxFuture<'s, Vec<UnitOutcome>> {
        async move {
            join_all(
                forest
                    .units()
                    .iter()
                    .map(|unit| self.execute_unit(*unit, input)),
            )
            .await
        }
        .boxed()
    }

    async fn execute_unit(&self, id: UnitId, input: &BTreeSet<String>) -> UnitOutcome {
        let unit = self.plan.unit(id);
        let input = if input.is_empty() { &unit.seed } else { input };
        let boundary = unit.boundary();
        let span = info_span!(
            "unit",
            execution_id = %unit.execution_id,
            adapter = unit.adapter.id(),
            root_type = %unit.root_type,
        );

        let request = ExecutionRequest {
            fragment: &unit.fragment,
            input,
            boundary: &boundary,
            root_type: &unit.root_type,
            schema: self.schema,
            env: self.env,
        };
        let outcome = unit.adapter.execute(request).instrument(span.clone()).await;
        let ExecutionOutcome {
            resolved,
            mut result,
            mut errors,
        } = match outcome {
            Ok(outcome) => outcome,
            Err(error) => {
                span.in_scope(|| warn!(%error, "Execution unit failed"));
                return UnitOutcome {
                    result: None,
                    errors: vec![format!(
                        "Execution on service '{}' failed: {error}",
                        unit.adapter.id()
                    )],
                };
            }
        };

        let children = unit.children.iter().filter_map(|(variable, forest)| {
            let ids = resolved.get(variable).filter(|ids| !ids.is_empty());
            if ids.is_none() {
                span.in_scope(|| debug!(%variable, "No identifiers resolved, skipping child forest"));
            }
            ids.map(|ids| self.execute_forest(forest, ids))
        });
        for child in join_all(children).await.into_iter().flatten() {
            errors.extend(child.errors);
            if let Some(FieldResult::Object(fragment)) = &child.result {
                result.graft(fragment);
            }
        }

        UnitOutcome {
            result: Some(result),
            errors,
        }
    }
}
