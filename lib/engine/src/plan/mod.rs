//! The execution plan: a forest of execution units, one per group of fields owned by the same
//! service.
//!
//! Units live in an arena owned by the [`ExecutionPlan`] and refer to their children by
//! [`UnitId`]. A unit answers its fragment and hands the identifiers bound to each boundary
//! variable to the child forest registered under that variable.

mod builder;

pub use builder::PlanBuilder;

use crate::adapter::SourceAdapter;
use fedql_model::pattern::{Fragment, QueryNode, ServiceSet};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;
use uuid::Uuid;

/// The index of a unit in its [`ExecutionPlan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(usize);

/// A set of units that run concurrently on the same input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionForest {
    units: Vec<UnitId>,
}

impl ExecutionForest {
    pub fn units(&self) -> &[UnitId] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    fn push(&mut self, unit: UnitId) {
        self.units.push(unit);
    }
}

/// A fragment bound to the adapter that answers it.
#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    /// Unique per unit, used to correlate log events.
    pub execution_id: Uuid,
    pub services: ServiceSet,
    pub adapter: Arc<dyn SourceAdapter>,
    pub fragment: Fragment,
    /// The type the fragment is anchored on.
    pub root_type: String,
    /// Identifiers a root unit is restricted to before any parent has run (`_id` arguments).
    pub seed: BTreeSet<String>,
    /// The child forest of each boundary variable.
    pub children: BTreeMap<String, ExecutionForest>,
}

impl ExecutionUnit {
    /// The variables whose bindings are handed to child units.
    pub fn boundary(&self) -> BTreeSet<String> {
        self.children.keys().cloned().collect()
    }
}

/// The plan of one request.
#[derive(Debug, Clone, Default)]
pub struct ExecutionPlan {
    units: Vec<ExecutionUnit>,
    roots: ExecutionForest,
    warnings: Vec<String>,
}

impl ExecutionPlan {
    pub fn roots(&self) -> &ExecutionForest {
        &self.roots
    }

    /// # Panics
    ///
    /// Panics if `id` belongs to another plan.
    pub fn unit(&self, id: UnitId) -> &ExecutionUnit {
        &self.units[id.0]
    }

    pub fn units(&self) -> impl Iterator<Item = &ExecutionUnit> {
        self.units.iter()
    }

    /// Root fields that were skipped while planning.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    fn fmt_unit(&self, f: &mut Formatter<'_>, id: UnitId, depth: usize) -> std::fmt::Result {
        let unit = self.unit(id);
        let indent = "  ".repeat(depth);
        writeln!(f, "{indent}{} ({})", unit.services, unit.root_type)?;
        for node in unit.fragment.nodes() {
            writeln!(f, "{indent}  {}", describe(node))?;
        }
        for (variable, forest) in &unit.children {
            writeln!(f, "{indent}  ?{variable} =>")?;
            for child in forest.units() {
                self.fmt_unit(f, *child, depth + 2)?;
            }
        }
        Ok(())
    }
}

impl Display for ExecutionPlan {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for root in self.roots.units() {
            self.fmt_unit(f, *root, 0)?;
        }
        Ok(())
    }
}

fn describe(node: &QueryNode) -> String {
    let name = format!("{}(?{})", node.output_name(), node.node_id);
    if node.fields.is_none() {
        return name;
    }
    let children: Vec<String> = node.children().map(describe).collect();
    format!("{name} {{ {} }}", children.join(", "))
}
