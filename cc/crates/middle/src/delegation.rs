use std::collections::VecDeque;

use itertools::Itertools;
use petgraph::{
    algo::tarjan_scc,
    graph::{
        DiGraph,
        NodeIndex,
    },
    Direction,
};
use rustc_hash::FxHashMap;
use tracing::{
    debug,
    info,
};

use crate::{
    FxIndexMap,
    RegisterUsage,
};

#[derive(Debug, Clone, Eq, PartialEq, thiserror::Error)]
pub enum ResolveError {
    #[error("Calling conventions delegate to each other in a cycle: {}", conventions.iter().join(", "))]
    Cycle { conventions: Vec<String> },
}

/// Which calling conventions delegate to which.
///
/// There is one node per calling convention, in the order the conventions were added, and an
/// edge from every convention to each convention it delegates to.
#[derive(Debug, Clone, Default)]
pub struct DelegationGraph {
    graph: DiGraph<String, ()>,
    nodes: FxHashMap<String, NodeIndex>,
}

impl DelegationGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node for `convention` unless it already has one.
    pub fn add_convention(&mut self, convention: &str) -> NodeIndex {
        if let Some(node) = self.nodes.get(convention) {
            return *node;
        }
        let node = self.graph.add_node(convention.to_string());
        self.nodes.insert(convention.to_string(), node);
        node
    }

    /// Records that `convention` delegates to `target`.
    ///
    /// Returns false if the delegation was already known.
    pub fn add_delegation(&mut self, convention: &str, target: &str) -> bool {
        let from = self.add_convention(convention);
        let to = self.add_convention(target);
        if self.graph.contains_edge(from, to) {
            return false;
        }
        self.graph.add_edge(from, to, ());
        true
    }

    pub fn contains(&self, convention: &str) -> bool {
        self.nodes.contains_key(convention)
    }

    /// The conventions `convention` delegates to directly, in no particular order.
    pub fn delegates<'a>(&'a self, convention: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.nodes
            .get(convention)
            .into_iter()
            .flat_map(|node| self.graph.neighbors_directed(*node, Direction::Outgoing))
            .map(|target| self.graph[target].as_str())
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Closes the `direct` usage of every convention under delegation.
    ///
    /// A convention is ready once every convention it delegates to is; its closed usage is then
    /// merged into every convention delegating to it. Ready conventions are processed in the
    /// order they were added.
    ///
    /// Fails if some conventions delegate to each other in a cycle.
    pub fn resolve(
        self,
        direct: &FxIndexMap<String, RegisterUsage>,
    ) -> Result<ResolvedUsage, ResolveError> {
        let graph = self.graph;
        let mut outstanding = graph
            .node_indices()
            .map(|node| {
                graph
                    .neighbors_directed(node, Direction::Outgoing)
                    .count()
            })
            .collect::<Vec<_>>();
        let mut closed = graph
            .node_indices()
            .map(|node| direct.get(&graph[node]).cloned().unwrap_or_default())
            .collect::<Vec<_>>();
        let mut ready = graph
            .node_indices()
            .filter(|node| outstanding[node.index()] == 0)
            .collect::<VecDeque<_>>();
        let mut resolved = 0;
        while let Some(node) = ready.pop_front() {
            resolved += 1;
            let usage = closed[node.index()].clone();
            for referrer in graph.neighbors_directed(node, Direction::Incoming) {
                debug!("Merging usage of {} into {}", graph[node], graph[referrer]);
                closed[referrer.index()].join(&usage);
                outstanding[referrer.index()] -= 1;
                if outstanding[referrer.index()] == 0 {
                    ready.push_back(referrer);
                }
            }
        }
        if resolved != graph.node_count() {
            return Err(Self::find_cycle(&graph, &outstanding));
        }
        info!("Resolved delegations of {} calling conventions", resolved);
        let usage = graph
            .node_indices()
            .zip(closed)
            .map(|(node, usage)| (graph[node].clone(), usage))
            .collect();
        Ok(ResolvedUsage { usage })
    }

    fn find_cycle(graph: &DiGraph<String, ()>, outstanding: &[usize]) -> ResolveError {
        let cycle = tarjan_scc(graph).into_iter().find(|component| {
            component.len() > 1
                || component
                    .iter()
                    .any(|node| graph.contains_edge(*node, *node))
        });
        let mut members = cycle.unwrap_or_else(|| {
            graph
                .node_indices()
                .filter(|node| outstanding[node.index()] != 0)
                .collect()
        });
        members.sort();
        ResolveError::Cycle {
            conventions: members
                .into_iter()
                .map(|node| graph[node].clone())
                .collect(),
        }
    }
}

/// The closed register usage of every calling convention, in the order the conventions were
/// added to the delegation graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedUsage {
    usage: FxIndexMap<String, RegisterUsage>,
}

impl ResolvedUsage {
    pub fn get(&self, convention: &str) -> Option<&RegisterUsage> {
        self.usage.get(convention)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisterUsage)> {
        self.usage
            .iter()
            .map(|(convention, usage)| (convention.as_str(), usage))
    }
}
