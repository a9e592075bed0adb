use crate::adapter::AdapterRegistry;
use crate::compiler::{CompiledMutation, MutationCompiler};
use crate::context::ld_context;
use crate::error::EngineError;
use crate::plan::{ExecutionPlan, PlanBuilder};
use crate::pool::ExecutionEnv;
use crate::response::Response;
use crate::results::FieldResult;
use crate::scheduler::Scheduler;
use fedql_model::pattern::{QueryPatternBuilder, Selection};
use fedql_model::vocab::{is_introspection_field, ID_FIELD};
use fedql_model::{
    ConfigurationError, ExecutionConfig, FederationConfig, FederationSchema, QueryFieldKind,
};
use tracing::{debug, info, warn};

/// Answers queries over a federation of RDF sources.
///
/// An engine owns one adapter per configured service and a worker pool shared by all requests.
/// Requests do not share any other state, so an engine can serve concurrent queries.
#[derive(Debug)]
pub struct FederationEngine {
    schema: FederationSchema,
    registry: AdapterRegistry,
    env: ExecutionEnv,
}

impl FederationEngine {
    /// Creates an engine for `config`, loading all local stores.
    pub fn new(config: FederationConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let registry = AdapterRegistry::from_services(&config.services)?;
        Ok(Self {
            env: ExecutionEnv::new(&config.execution),
            schema: config.schema,
            registry,
        })
    }

    /// Creates an engine from adapters that were set up by the caller.
    pub fn with_registry(
        schema: FederationSchema,
        registry: AdapterRegistry,
        execution: &ExecutionConfig,
    ) -> Result<Self, EngineError> {
        schema.validate(|id| registry.contains(id))?;
        execution.validate()?;
        Ok(Self {
            schema,
            registry,
            env: ExecutionEnv::new(execution),
        })
    }

    pub fn schema(&self) -> &FederationSchema {
        &self.schema
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Plans `selections` without executing them. Skipped root fields are logged as warnings.
    pub fn plan(&self, selections: &[Selection]) -> Result<ExecutionPlan, EngineError> {
        let pattern = QueryPatternBuilder::new(&self.schema).build(selections)?;
        let plan = PlanBuilder::new(&self.schema, &self.registry).build(&pattern)?;
        for warning in plan.warnings() {
            warn!("{warning}");
        }
        Ok(plan)
    }

    /// Answers `selections`.
    ///
    /// Invalid queries fail as a whole. Failures of single sources are reported in
    /// [`Response::errors`] and only remove the contribution of the failed source.
    pub async fn query(&self, selections: &[Selection]) -> Result<Response, EngineError> {
        let plan = self.plan(selections)?;
        info!(
            fields = selections.len(),
            units = plan.units().count(),
            "Executing query"
        );
        debug!("Execution plan:\n{plan}");

        let (root, mut errors) = Scheduler::new(&plan, &self.schema, &self.env)
            .execute()
            .await;
        let data = FieldResult::from(root).render(&mut errors);
        if !errors.is_empty() {
            info!(errors = errors.len(), "Query finished with errors");
        }

        Ok(Response {
            data,
            errors,
            warnings: plan.warnings().to_vec(),
            context: ld_context(&plan, &self.schema),
        })
    }

    /// Applies the mutation fields in `selections` to the mutation service and answers their
    /// sub-selections as if they were asked on a root field returning the written type.
    ///
    /// All mutations are compiled before the first one is applied, so an invalid mutation does not
    /// leave the service half updated. Entities given by `_id` are read back by identifier; other
    /// mutations read back all entities of their type.
    pub async fn mutate(&self, selections: &[Selection]) -> Result<Response, EngineError> {
        let service = self
            .schema
            .mutation_service
            .as_deref()
            .ok_or(ConfigurationError::MissingMutationService)?;
        let adapter = self
            .registry
            .get(service)
            .ok_or_else(|| ConfigurationError::UnknownService(service.to_owned()))?;

        let compiler = MutationCompiler::new(&self.schema, adapter.graph());
        let mut updates = Vec::new();
        let mut read_back = Vec::new();
        for selection in selections {
            if is_introspection_field(&selection.name) {
                continue;
            }
            let mutation = compiler.compile(selection)?;
            read_back.push(self.read_back(selection, &mutation)?);
            updates.extend(mutation.update.map(|update| (selection.name.as_str(), update)));
        }

        for (field, update) in &updates {
            debug!(field, %update, "Applying mutation");
            adapter.update(update).await?;
        }
        info!(service, updates = updates.len(), "Applied mutations");

        self.query(&read_back).await
    }

    /// The root field selection that reads the entities written by `mutation`.
    fn read_back(
        &self,
        selection: &Selection,
        mutation: &CompiledMutation,
    ) -> Result<Selection, ConfigurationError> {
        let find = |kind: QueryFieldKind| {
            self.schema
                .query_fields
                .iter()
                .find(|(_, config)| config.kind == kind && config.target_name == mutation.target_type)
                .map(|(name, _)| name)
        };
        let by_id = mutation
            .id
            .as_ref()
            .and_then(|id| find(QueryFieldKind::GetById).map(|name| (name, id)));
        let read_back = match by_id {
            Some((name, id)) => Selection::field(name).with_arg(ID_FIELD, id.as_str()),
            None => Selection::field(
                find(QueryFieldKind::Get)
                    .ok_or_else(|| ConfigurationError::UnreadableType(mutation.target_type.clone()))?,
            ),
        };
        Ok(read_back
            .with_alias(selection.alias.as_ref().unwrap_or(&selection.name))
            .with_selections(selection.selections.iter().cloned()))
    }

    /// Applies a SPARQL update to the service `service`.
    pub async fn update(&self, service: &str, update: &str) -> Result<(), EngineError> {
        let adapter = self
            .registry
            .get(service)
            .ok_or_else(|| ConfigurationError::UnknownService(service.to_owned()))?;
        adapter.update(update).await?;
        info!(service, "Applied update");
        Ok(())
    }
}
