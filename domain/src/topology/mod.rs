//! Interaction topologies.
//!
//! A topology describes which agents run when and what portion of the
//! deliberation each one may see. Ensemble, Chain and Debate are ordered
//! (or unordered) passes over the agent list; Graph is a general
//! dependency DAG described by an edge list.

pub mod graph;

pub use graph::GraphPlan;

use serde::Serialize;
use std::fmt;

/// Reference to an agent in a graph edge: by list position or by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NodeRef {
    Index(usize),
    Name(String),
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeRef::Index(i) => write!(f, "#{i}"),
            NodeRef::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for NodeRef {
    fn from(i: usize) -> Self {
        NodeRef::Index(i)
    }
}

impl From<&str> for NodeRef {
    fn from(name: &str) -> Self {
        NodeRef::Name(name.to_string())
    }
}

impl From<String> for NodeRef {
    fn from(name: String) -> Self {
        NodeRef::Name(name)
    }
}

/// Directed edge: the `from` agent's response is visible to the `to` agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: NodeRef,
    pub to: NodeRef,
}

impl GraphEdge {
    pub fn new(from: impl Into<NodeRef>, to: impl Into<NodeRef>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl<F: Into<NodeRef>, T: Into<NodeRef>> From<(F, T)> for GraphEdge {
    fn from((from, to): (F, T)) -> Self {
        Self::new(from, to)
    }
}

/// The interaction topology of a structure.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Topology {
    /// Mutually independent agents; one wave per cycle
    #[default]
    Ensemble,
    /// Linear sequence, each agent building on prior turns
    Chain,
    /// Two agents alternating; a constrained Chain
    Debate,
    /// Arbitrary producer-visible-to-consumer DAG
    Graph { edges: Vec<GraphEdge> },
}

impl Topology {
    pub fn graph(edges: impl IntoIterator<Item = impl Into<GraphEdge>>) -> Self {
        Topology::Graph {
            edges: edges.into_iter().map(Into::into).collect(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Topology::Ensemble => "ensemble",
            Topology::Chain => "chain",
            Topology::Debate => "debate",
            Topology::Graph { .. } => "graph",
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_from_tuples() {
        let by_index = GraphEdge::from((0usize, 1usize));
        assert_eq!(by_index.from, NodeRef::Index(0));
        assert_eq!(by_index.to, NodeRef::Index(1));

        let by_name = GraphEdge::from(("a", "b"));
        assert_eq!(by_name.from, NodeRef::Name("a".to_string()));
    }

    #[test]
    fn test_topology_kind() {
        assert_eq!(Topology::Ensemble.kind(), "ensemble");
        assert_eq!(Topology::graph([(0usize, 1usize)]).kind(), "graph");
        assert_eq!(Topology::Debate.to_string(), "debate");
    }
}
