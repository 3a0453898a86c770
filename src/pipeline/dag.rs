// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! DAG (Directed Acyclic Graph) of node dependencies
//!
//! Edges run from the node producing a dataset to every node consuming it.
//! Building the graph rejects datasets with more than one producer; ordering
//! it rejects cycles.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet, VecDeque};
use std::sync::Arc;

use crate::errors::{FlowError, FlowResult};
use crate::pipeline::Node;

/// Dependency graph over a node list; graph weights are list positions
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<usize, ()>,
    indices: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph for `nodes`, failing on ambiguous producers
    pub fn build(nodes: &[Arc<Node>]) -> FlowResult<Self> {
        let mut graph = DiGraph::new();
        let indices: Vec<NodeIndex> = (0..nodes.len()).map(|i| graph.add_node(i)).collect();

        let mut producers: HashMap<&str, usize> = HashMap::new();
        for (idx, node) in nodes.iter().enumerate() {
            for output in node.outputs() {
                if let Some(&first) = producers.get(output) {
                    return Err(FlowError::AmbiguousOutput {
                        dataset: output.to_string(),
                        first: nodes[first].name(),
                        second: node.name(),
                    });
                }
                producers.insert(output, idx);
            }
        }

        for (idx, node) in nodes.iter().enumerate() {
            for input in node.inputs() {
                if let Some(&producer) = producers.get(input) {
                    // update_edge keeps a single edge per producer/consumer pair
                    graph.update_edge(indices[producer], indices[idx], ());
                }
            }
        }

        Ok(Self { graph, indices })
    }

    /// Positions in execution order
    ///
    /// Among nodes whose dependencies are all resolved, the one inserted
    /// first runs first.
    pub fn topological_order(&self, nodes: &[Arc<Node>]) -> FlowResult<Vec<usize>> {
        let mut remaining: Vec<usize> = self
            .indices
            .iter()
            .map(|&n| self.graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BinaryHeap<Reverse<usize>> = remaining
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(pos, _)| Reverse(pos))
            .collect();

        let mut order = Vec::with_capacity(self.indices.len());
        while let Some(Reverse(pos)) = ready.pop() {
            order.push(pos);
            for next in self
                .graph
                .neighbors_directed(self.indices[pos], Direction::Outgoing)
            {
                let next_pos = self.graph[next];
                remaining[next_pos] -= 1;
                if remaining[next_pos] == 0 {
                    ready.push(Reverse(next_pos));
                }
            }
        }

        if order.len() < self.indices.len() {
            let cycle = self.find_cycle();
            return Err(FlowError::CyclicPipeline {
                nodes: cycle.into_iter().map(|pos| nodes[pos].name()).collect(),
            });
        }

        Ok(order)
    }

    /// One cycle as positions, first position repeated at the end
    fn find_cycle(&self) -> Vec<usize> {
        let component = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .min_by_key(|scc| scc.iter().map(|&n| self.graph[n]).min());

        let Some(component) = component else {
            return Vec::new();
        };

        let members: HashSet<NodeIndex> = component.iter().copied().collect();
        let start = component
            .iter()
            .copied()
            .min_by_key(|&n| self.graph[n])
            .unwrap_or(component[0]);

        let mut path = Vec::new();
        let mut visited = HashSet::from([start]);
        self.walk_cycle(start, start, &members, &mut visited, &mut path);

        let mut cycle: Vec<usize> = path.into_iter().map(|n| self.graph[n]).collect();
        cycle.push(self.graph[start]);
        cycle
    }

    fn walk_cycle(
        &self,
        current: NodeIndex,
        start: NodeIndex,
        members: &HashSet<NodeIndex>,
        visited: &mut HashSet<NodeIndex>,
        path: &mut Vec<NodeIndex>,
    ) -> bool {
        path.push(current);

        let mut next: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(current, Direction::Outgoing)
            .filter(|n| members.contains(n))
            .collect();
        next.sort_by_key(|&n| self.graph[n]);

        for n in next {
            if n == start {
                return true;
            }
            if visited.insert(n) && self.walk_cycle(n, start, members, visited, path) {
                return true;
            }
        }

        path.pop();
        false
    }

    /// Positions of nodes that `pos` directly depends on
    pub fn dependencies(&self, pos: usize) -> BTreeSet<usize> {
        self.neighbors(pos, Direction::Incoming)
    }

    /// Positions of nodes that directly depend on `pos`
    pub fn dependents(&self, pos: usize) -> BTreeSet<usize> {
        self.neighbors(pos, Direction::Outgoing)
    }

    fn neighbors(&self, pos: usize, direction: Direction) -> BTreeSet<usize> {
        self.indices
            .get(pos)
            .map(|&n| {
                self.graph
                    .neighbors_directed(n, direction)
                    .map(|m| self.graph[m])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// `start` plus everything reachable from it in `direction`
    pub fn reachable(
        &self,
        start: impl IntoIterator<Item = usize>,
        direction: Direction,
    ) -> BTreeSet<usize> {
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<usize> = start.into_iter().collect();

        while let Some(pos) = queue.pop_front() {
            if !seen.insert(pos) {
                continue;
            }
            queue.extend(self.neighbors(pos, direction));
        }

        seen
    }
}
