//! Source adapters answer fragments against one kind of backend.

mod fan_out;
mod local;
mod registry;
mod remote;
mod solutions;

pub use fan_out::FanOutAdapter;
pub use local::LocalStoreAdapter;
pub use registry::AdapterRegistry;
pub use remote::RemoteStoreAdapter;

use crate::compiler::{batches, FragmentCompiler};
use crate::error::AdapterError;
use crate::pool::ExecutionEnv;
use crate::results::FieldResult;
use async_trait::async_trait;
use fedql_model::pattern::Fragment;
use fedql_model::FederationSchema;
use futures::future::join_all;
use sparesults::QuerySolution;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;
use std::future::Future;
use tracing::debug;

/// The identifiers bound to each boundary variable, keyed by variable name.
pub type ResolvedIds = BTreeMap<String, BTreeSet<String>>;

/// Everything an adapter needs to answer one execution unit.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionRequest<'a> {
    pub fragment: &'a Fragment,
    /// The entities the fragment is restricted to. Empty for unrestricted root fragments.
    pub input: &'a BTreeSet<String>,
    /// The variables whose bindings are handed to child units.
    pub boundary: &'a BTreeSet<String>,
    /// The type the fragment is anchored on.
    pub root_type: &'a str,
    pub schema: &'a FederationSchema,
    pub env: &'a ExecutionEnv,
}

/// The outcome of an execution unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub resolved: ResolvedIds,
    pub result: FieldResult,
    /// Failures that only removed part of the result, e.g. a failed member of a fan-out.
    pub errors: Vec<String>,
}

impl ExecutionOutcome {
    /// Unions `other` into this outcome.
    pub fn merge(&mut self, other: ExecutionOutcome) {
        for (variable, ids) in other.resolved {
            self.resolved.entry(variable).or_default().extend(ids);
        }
        self.result.merge(other.result);
        self.errors.extend(other.errors);
    }
}

/// A backend that can answer fragments of a query.
#[async_trait]
pub trait SourceAdapter: Debug + Send + Sync {
    /// The service id of this adapter.
    fn id(&self) -> &str;

    /// The named graph the adapter reads from, if any.
    fn graph(&self) -> Option<&str> {
        None
    }

    /// Answers `request.fragment` and returns the identifiers bound to the boundary variables
    /// together with the partial result of the fragment.
    async fn execute(&self, request: ExecutionRequest<'_>) -> Result<ExecutionOutcome, AdapterError>;

    /// Applies a SPARQL update.
    async fn update(&self, _update: &str) -> Result<(), AdapterError> {
        Err(AdapterError::UpdateUnsupported(self.id().to_owned()))
    }
}

/// Compiles the fragment of `request` once per batch of input identifiers, runs every batch with
/// `run` on the worker pool and merges the outcomes.
///
/// The unit fails as a whole if any batch fails.
pub(crate) async fn execute_batched<F, Fut>(
    adapter: &str,
    graph: Option<&str>,
    request: ExecutionRequest<'_>,
    run: F,
) -> Result<ExecutionOutcome, AdapterError>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<Vec<QuerySolution>, AdapterError>>,
{
    let compiler = FragmentCompiler::new(request.schema, graph);
    let queries = batches(request.input, request.env.batch_size)
        .iter()
        .map(|batch| compiler.compile(request.fragment, batch))
        .collect::<Result<Vec<_>, _>>()?;

    debug!(adapter, batches = queries.len(), "Executing fragment");
    let responses = join_all(queries.into_iter().map(|query| {
        debug!(adapter, %query, "Sending query");
        request.env.call(run(query))
    }))
    .await;

    let mut outcome = solutions::empty_outcome(request);
    for solutions in responses {
        outcome.merge(solutions::to_outcome(request, &solutions?));
    }
    Ok(outcome)
}
