// src/dag/graph.rs

use std::collections::{BTreeMap, BTreeSet};

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;

use crate::dag::node::TaskNode;
use crate::engine::TaskId;
use crate::errors::{Result, RundagError};

/// In-memory task graph keyed by task id.
///
/// Tasks are registered with [`add_task`](Self::add_task), then
/// [`build`](Self::build) validates the graph and fills in the reverse
/// (`dependents`) index. After a successful build the graph is read-only.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: BTreeMap<TaskId, TaskNode>,
    built: bool,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task and the ids it must wait for.
    ///
    /// Dependencies may name tasks that are added later; they only have to
    /// exist by the time [`build`](Self::build) is called.
    pub fn add_task<I, S>(&mut self, id: impl Into<TaskId>, dependencies: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskId>,
    {
        if self.built {
            return Err(RundagError::AlreadyBuilt);
        }

        let id = id.into();
        if self.nodes.contains_key(&id) {
            return Err(RundagError::DuplicateTask(id));
        }

        let deps: BTreeSet<TaskId> = dependencies.into_iter().map(Into::into).collect();
        debug!(task = %id, ?deps, "task added to graph");
        self.nodes.insert(id.clone(), TaskNode::new(id, deps));
        Ok(())
    }

    /// Validate the graph and compute every node's dependents.
    ///
    /// On error the graph is left untouched (and still unbuilt).
    pub fn build(&mut self) -> Result<()> {
        if self.built {
            return Err(RundagError::AlreadyBuilt);
        }

        self.validate_dependencies()?;
        self.validate_acyclic()?;

        let edges: Vec<(TaskId, TaskId)> = self
            .nodes
            .values()
            .flat_map(|node| {
                node.dependencies()
                    .iter()
                    .map(move |dep| (dep.clone(), node.id().to_string()))
            })
            .collect();

        for (dep, dependent) in edges {
            if let Some(dep_node) = self.nodes.get_mut(&dep) {
                dep_node.add_dependent(dependent);
            }
        }

        self.built = true;
        debug!(tasks = self.nodes.len(), "dependency graph built");
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&TaskNode> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &TaskNode> {
        self.nodes.values()
    }

    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// Tasks with no declared dependencies.
    ///
    /// Returned in id order, but callers should not rely on any ordering.
    pub fn initial_frontier(&self) -> Vec<&TaskNode> {
        self.nodes
            .values()
            .filter(|node| node.dependencies().is_empty())
            .collect()
    }

    /// Immediate dependencies of a task (empty for unknown ids).
    pub fn dependencies_of(&self, id: &str) -> Vec<&TaskNode> {
        self.related(id, TaskNode::dependencies)
    }

    /// Immediate dependents of a task (empty before `build` or for unknown ids).
    pub fn dependents_of(&self, id: &str) -> Vec<&TaskNode> {
        self.related(id, TaskNode::dependents)
    }

    /// A topological order of all task ids (dependencies first).
    pub fn topological_order(&self) -> Result<Vec<TaskId>> {
        let graph = self.as_petgraph();
        toposort(&graph, None)
            .map(|order| order.into_iter().map(str::to_string).collect())
            .map_err(|cycle| RundagError::CycleDetected(cycle.node_id().to_string()))
    }

    fn related<'a>(
        &'a self,
        id: &str,
        select: fn(&TaskNode) -> &BTreeSet<TaskId>,
    ) -> Vec<&'a TaskNode> {
        self.nodes
            .get(id)
            .map(|node| {
                select(node)
                    .iter()
                    .filter_map(|other| self.nodes.get(other))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn validate_dependencies(&self) -> Result<()> {
        for node in self.nodes.values() {
            for dep in node.dependencies() {
                if !self.nodes.contains_key(dep) {
                    return Err(RundagError::UnknownDependency {
                        task: node.id().to_string(),
                        dependency: dep.clone(),
                    });
                }
                if dep == node.id() {
                    return Err(RundagError::CycleDetected(dep.clone()));
                }
            }
        }
        Ok(())
    }

    fn validate_acyclic(&self) -> Result<()> {
        // A topological sort fails if there is a back-edge anywhere.
        self.topological_order().map(|_| ())
    }

    /// Edge direction: dependency -> dependent.
    fn as_petgraph(&self) -> DiGraphMap<&str, ()> {
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

        for id in self.nodes.keys() {
            graph.add_node(id.as_str());
        }

        for node in self.nodes.values() {
            for dep in node.dependencies() {
                graph.add_edge(dep.as_str(), node.id(), ());
            }
        }

        graph
    }
}
