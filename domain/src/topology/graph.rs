//! DAG validation and scheduling for Graph topologies.
//!
//! Edges are resolved against the agent list, validated (bounds, names,
//! self-loops), and ordered with an iterative Kahn traversal. Ties are
//! broken by declaration order so the execution order is deterministic for
//! a fixed agent and edge list.

use crate::core::ConfigError;
use std::collections::BTreeSet;

use super::{GraphEdge, NodeRef};

/// Validated execution plan for a Graph topology.
#[derive(Debug, Clone)]
pub struct GraphPlan {
    /// Topological order over agent indices, declaration-order tie-broken
    order: Vec<usize>,
    /// Direct predecessors per agent index, in declaration order
    predecessors: Vec<Vec<usize>>,
}

impl GraphPlan {
    /// Resolve and validate `edges` against `agent_names`.
    ///
    /// Fails with a [`ConfigError`] on unknown names, out-of-bounds
    /// indices, self-loops, or any cycle. Duplicate edges are collapsed.
    pub fn new(agent_names: &[String], edges: &[GraphEdge]) -> Result<Self, ConfigError> {
        let n = agent_names.len();

        let resolve = |node: &NodeRef| -> Result<usize, ConfigError> {
            match node {
                NodeRef::Index(i) => {
                    if *i < n {
                        Ok(*i)
                    } else {
                        Err(ConfigError::EdgeOutOfBounds(*i, n))
                    }
                }
                NodeRef::Name(name) => agent_names
                    .iter()
                    .position(|candidate| candidate == name)
                    .ok_or_else(|| ConfigError::UnknownAgent(name.clone())),
            }
        };

        let mut predecessor_sets: Vec<BTreeSet<usize>> = vec![BTreeSet::new(); n];
        for edge in edges {
            let from = resolve(&edge.from)?;
            let to = resolve(&edge.to)?;
            if from == to {
                return Err(ConfigError::SelfLoop(agent_names[from].clone()));
            }
            predecessor_sets[to].insert(from);
        }

        let predecessors: Vec<Vec<usize>> = predecessor_sets
            .iter()
            .map(|set| set.iter().copied().collect())
            .collect();

        let order = kahn_order(&predecessors)?;
        Ok(Self {
            order,
            predecessors,
        })
    }

    /// Agent indices in execution order.
    pub fn order(&self) -> &[usize] {
        &self.order
    }

    /// Direct predecessors of `index`, in declaration order.
    pub fn predecessors(&self, index: usize) -> &[usize] {
        &self.predecessors[index]
    }
}

/// Iterative Kahn's algorithm over a predecessor list.
///
/// The ready set is kept ordered so that among simultaneously-ready nodes
/// the lowest declaration index always runs first.
fn kahn_order(predecessors: &[Vec<usize>]) -> Result<Vec<usize>, ConfigError> {
    let n = predecessors.len();
    let mut in_degree: Vec<usize> = predecessors.iter().map(Vec::len).collect();

    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (node, preds) in predecessors.iter().enumerate() {
        for &pred in preds {
            successors[pred].push(node);
        }
    }

    let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(&next) = ready.iter().next() {
        ready.remove(&next);
        order.push(next);
        for &succ in &successors[next] {
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                ready.insert(succ);
            }
        }
    }

    if order.len() < n {
        return Err(ConfigError::CyclicGraph);
    }
    Ok(order)
}
