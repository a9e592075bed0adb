use crate::adapter::AdapterRegistry;
use crate::compiler::FragmentCompiler;
use crate::plan::{ExecutionForest, ExecutionPlan, ExecutionUnit, UnitId};
use fedql_model::pattern::{Fragment, QueryGroup, QueryNode, QueryPattern, ServiceSet};
use fedql_model::vocab::QUERY_TYPE;
use fedql_model::{ConfigurationError, FederationSchema};
use std::collections::{BTreeMap, BTreeSet};
use uuid::Uuid;

/// Splits a [`QueryPattern`] into execution units.
///
/// Every root field becomes a root unit. Below a field, the children owned by the same services
/// as the field stay in its unit. Children owned by other services are grouped by owner into
/// child units that hang from the node id of the field.
pub struct PlanBuilder<'a> {
    schema: &'a FederationSchema,
    registry: &'a AdapterRegistry,
    units: Vec<ExecutionUnit>,
}

impl<'a> PlanBuilder<'a> {
    pub fn new(schema: &'a FederationSchema, registry: &'a AdapterRegistry) -> Self {
        Self {
            schema,
            registry,
            units: Vec::new(),
        }
    }

    /// Builds the plan and checks that every fragment compiles.
    pub fn build(mut self, pattern: &QueryPattern) -> Result<ExecutionPlan, ConfigurationError> {
        let mut roots = ExecutionForest::default();
        for node in &pattern.root.nodes {
            let unit = self.push_unit(&node.services, QUERY_TYPE, node.args.ids.iter().cloned())?;
            let fields = self.split(unit, node)?;
            self.units[unit.0].fragment = Fragment::Node(QueryNode {
                fields,
                ..node.clone()
            });
            roots.push(unit);
        }

        for unit in &self.units {
            FragmentCompiler::new(self.schema, unit.adapter.graph()).compile(&unit.fragment, &[])?;
        }

        Ok(ExecutionPlan {
            units: self.units,
            roots,
            warnings: pattern.warnings.clone(),
        })
    }

    fn push_unit(
        &mut self,
        services: &ServiceSet,
        root_type: &str,
        seed: impl IntoIterator<Item = String>,
    ) -> Result<UnitId, ConfigurationError> {
        let adapter = self.registry.resolve(services)?;
        let id = UnitId(self.units.len());
        self.units.push(ExecutionUnit {
            execution_id: Uuid::new_v4(),
            services: services.clone(),
            adapter,
            fragment: Fragment::Group(QueryGroup::default()),
            root_type: root_type.to_owned(),
            seed: seed.into_iter().collect::<BTreeSet<_>>(),
            children: BTreeMap::new(),
        });
        Ok(id)
    }

    /// Returns the children of `node` that stay in `unit` and registers child units for the
    /// others.
    fn split(&mut self, unit: UnitId, node: &QueryNode) -> Result<Option<QueryGroup>, ConfigurationError> {
        let Some(group) = &node.fields else {
            return Ok(None);
        };

        // Owners in order of first appearance, so units are planned in query order.
        let mut owners: Vec<(&ServiceSet, Vec<&QueryNode>)> = Vec::new();
        for child in &group.nodes {
            match owners.iter_mut().find(|(services, _)| **services == child.services) {
                Some((_, nodes)) => nodes.push(child),
                None => owners.push((&child.services, vec![child])),
            }
        }

        let own_services = self.units[unit.0].services.clone();
        let mut kept = Vec::new();
        for (services, nodes) in owners {
            if *services == own_services {
                for child in nodes {
                    kept.push(self.fold(unit, child)?);
                }
                continue;
            }

            let child_unit = self.push_unit(services, &node.target_type, [])?;
            let mut split_off = Vec::with_capacity(nodes.len());
            for child in nodes {
                split_off.push(self.fold(child_unit, child)?);
            }
            self.units[child_unit.0].fragment = Fragment::Group(QueryGroup::new(split_off));
            self.units[unit.0]
                .children
                .entry(node.node_id.clone())
                .or_default()
                .push(child_unit);
        }

        Ok((!kept.is_empty()).then(|| QueryGroup::new(kept)))
    }

    fn fold(&mut self, unit: UnitId, node: &QueryNode) -> Result<QueryNode, ConfigurationError> {
        let fields = self.split(unit, node)?;
        Ok(QueryNode {
            fields,
            ..node.clone()
        })
    }
}
