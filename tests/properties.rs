// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Property-based tests for pipeline ordering and construction checks

use proptest::prelude::*;
use serde_json::Value;

use nodeflow::{FlowError, FlowResult, Node, NodeFn, NodeInputs, Pipeline};

fn dataset(k: usize) -> String {
    format!("d{}", k)
}

fn make_node(name: &str, inputs: Vec<String>, output: &str) -> Node {
    let func = NodeFn::variadic(inputs.len(), |_| Ok(Value::Null));
    Node::new(func, NodeInputs::Positional(inputs), output)
        .unwrap()
        .named(name)
}

/// Nodes of a random DAG: node `k` produces `d<k>` and may read any `d<j>`
/// with `j < k`
fn dag_nodes(edges: &[Vec<bool>]) -> Vec<Node> {
    edges
        .iter()
        .enumerate()
        .map(|(k, row)| {
            let inputs = (0..k).filter(|&j| row[j]).map(dataset).collect();
            make_node(&format!("n{}", k), inputs, &dataset(k))
        })
        .collect()
}

/// Put nodes in the given insertion order
fn shuffled(nodes: Vec<Node>, order: &[usize]) -> Vec<Node> {
    order.iter().map(|&i| nodes[i].clone()).collect()
}

prop_compose! {
    /// Edge matrix plus an insertion order for a DAG of 1 to 10 nodes
    fn arb_dag()(n in 1usize..10)(
        edges in prop::collection::vec(prop::collection::vec(any::<bool>(), n), n),
        order in Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
    ) -> (Vec<Vec<bool>>, Vec<usize>) {
        (edges, order)
    }
}

prop_compose! {
    /// Chain length, back-edge target and insertion order for a cyclic chain
    fn arb_cyclic_chain()(n in 1usize..8)(
        target in 0..n,
        order in Just((0..n).collect::<Vec<_>>()).prop_shuffle(),
        n in Just(n),
    ) -> (usize, usize, Vec<usize>) {
        (n, target, order)
    }
}

fn build(nodes: Vec<Node>) -> FlowResult<Pipeline> {
    Pipeline::new(nodes)
}

proptest! {
    /// Property: every dependency runs before its dependent
    #[test]
    fn test_order_respects_dependencies((edges, order) in arb_dag()) {
        let pipeline = build(shuffled(dag_nodes(&edges), &order)).unwrap();
        let names = pipeline.node_names();
        let pos = |name: &str| names.iter().position(|n| n == name).unwrap();

        prop_assert_eq!(names.len(), edges.len());
        for name in &names {
            for dep in pipeline.dependencies(name).unwrap() {
                prop_assert!(pos(&dep) < pos(name), "{} ran after {}", dep, name);
            }
        }
    }

    /// Property: a chain with any back edge is rejected as cyclic
    #[test]
    fn test_back_edge_is_a_cycle((n, target, order) in arb_cyclic_chain()) {
        let nodes: Vec<Node> = (0..n)
            .map(|k| {
                let mut inputs = Vec::new();
                if k > 0 {
                    inputs.push(dataset(k - 1));
                }
                if k == target {
                    inputs.push(dataset(n - 1));
                }
                make_node(&format!("n{}", k), inputs, &dataset(k))
            })
            .collect();

        match build(shuffled(nodes, &order)) {
            Err(FlowError::CyclicPipeline { nodes }) => {
                prop_assert!(nodes.len() >= 2);
                prop_assert_eq!(nodes.first(), nodes.last());
                let members: Vec<String> = (target..n).map(|k| format!("n{}", k)).collect();
                for name in &nodes {
                    prop_assert!(members.contains(name), "{} is not on the cycle", name);
                }
            }
            other => prop_assert!(false, "expected a cycle, got {:?}", other),
        }
    }

    /// Property: a second producer of any dataset is rejected
    #[test]
    fn test_second_producer_is_ambiguous(
        (edges, order) in arb_dag(),
        pick in any::<prop::sample::Index>(),
    ) {
        let duplicated = dataset(pick.index(edges.len()));
        let mut nodes = shuffled(dag_nodes(&edges), &order);
        nodes.push(make_node("dup", Vec::new(), &duplicated));

        match build(nodes) {
            Err(FlowError::AmbiguousOutput { dataset, .. }) => {
                prop_assert_eq!(dataset, duplicated);
            }
            other => prop_assert!(false, "expected an ambiguous output, got {:?}", other),
        }
    }
}
