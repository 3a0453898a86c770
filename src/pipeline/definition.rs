// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Pipeline definition
//!
//! A pipeline is an immutable set of nodes with a fixed execution order.
//! Composition and filtering always build a new pipeline and re-run every
//! construction check on the result.

use petgraph::Direction;
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::ops::Add;
use std::sync::Arc;

use crate::errors::{FlowError, FlowResult};
use crate::pipeline::dag::DependencyGraph;
use crate::pipeline::Node;

/// Something that can be added to a pipeline
#[derive(Debug, Clone)]
pub enum PipelineItem {
    Node(Arc<Node>),
    Pipeline(Pipeline),
}

impl From<Node> for PipelineItem {
    fn from(node: Node) -> Self {
        Self::Node(Arc::new(node))
    }
}

impl From<Arc<Node>> for PipelineItem {
    fn from(node: Arc<Node>) -> Self {
        Self::Node(node)
    }
}

impl From<Pipeline> for PipelineItem {
    fn from(pipeline: Pipeline) -> Self {
        Self::Pipeline(pipeline)
    }
}

impl From<&Pipeline> for PipelineItem {
    fn from(pipeline: &Pipeline) -> Self {
        Self::Pipeline(pipeline.clone())
    }
}

/// Immutable DAG of nodes
#[derive(Clone, Default)]
pub struct Pipeline {
    /// Nodes in insertion order
    nodes: Vec<Arc<Node>>,
    /// Positions into `nodes` in execution order
    order: Vec<usize>,
    graph: DependencyGraph,
}

impl Pipeline {
    /// Build a pipeline from nodes and nested pipelines
    ///
    /// Nested pipelines are flattened into their nodes. Including the same
    /// node twice keeps one copy.
    pub fn new<I, T>(items: I) -> FlowResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<PipelineItem>,
    {
        let mut nodes = Vec::new();
        for item in items {
            match item.into() {
                PipelineItem::Node(node) => nodes.push(node),
                PipelineItem::Pipeline(pipeline) => nodes.extend(pipeline.nodes),
            }
        }
        Self::build(nodes)
    }

    pub(crate) fn build(candidates: Vec<Arc<Node>>) -> FlowResult<Self> {
        let mut nodes: Vec<Arc<Node>> = Vec::with_capacity(candidates.len());
        for node in candidates {
            if !nodes.iter().any(|n| Arc::ptr_eq(n, &node)) {
                nodes.push(node);
            }
        }

        let graph = DependencyGraph::build(&nodes)?;

        let mut names = HashSet::new();
        for node in &nodes {
            if !names.insert(node.name()) {
                return Err(FlowError::DuplicateNode { node: node.name() });
            }
        }

        let order = graph.topological_order(&nodes)?;
        Ok(Self { nodes, order, graph })
    }

    /// Nodes in execution order
    pub fn nodes(&self) -> impl Iterator<Item = &Arc<Node>> + '_ {
        self.order.iter().map(move |&i| &self.nodes[i])
    }

    /// Node names in execution order
    pub fn node_names(&self) -> Vec<String> {
        self.nodes().map(|n| n.name()).collect()
    }

    /// Look up a node by name
    pub fn node(&self, name: &str) -> Option<&Arc<Node>> {
        self.position(name).map(|pos| &self.nodes[pos])
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pipeline has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every dataset consumed by some node
    pub fn all_inputs(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .flat_map(|n| n.inputs())
            .map(String::from)
            .collect()
    }

    /// Every dataset produced by some node
    pub fn all_outputs(&self) -> BTreeSet<String> {
        self.nodes
            .iter()
            .flat_map(|n| n.outputs())
            .map(String::from)
            .collect()
    }

    /// Every dataset the pipeline touches
    pub fn datasets(&self) -> BTreeSet<String> {
        let mut all = self.all_inputs();
        all.extend(self.all_outputs());
        all
    }

    /// Datasets consumed but never produced within the pipeline
    pub fn free_inputs(&self) -> BTreeSet<String> {
        let outputs = self.all_outputs();
        self.all_inputs()
            .into_iter()
            .filter(|d| !outputs.contains(d))
            .collect()
    }

    /// Datasets produced but never consumed within the pipeline
    pub fn free_outputs(&self) -> BTreeSet<String> {
        let inputs = self.all_inputs();
        self.all_outputs()
            .into_iter()
            .filter(|d| !inputs.contains(d))
            .collect()
    }

    /// Names of the nodes `node` directly depends on
    pub fn dependencies(&self, node: &str) -> Option<Vec<String>> {
        let pos = self.position(node)?;
        Some(
            self.graph
                .dependencies(pos)
                .into_iter()
                .map(|i| self.nodes[i].name())
                .collect(),
        )
    }

    /// Union of two pipelines
    pub fn union(&self, other: &Pipeline) -> FlowResult<Pipeline> {
        Pipeline::new([self, other])
    }

    /// This pipeline plus one node
    pub fn with_node(&self, node: impl Into<PipelineItem>) -> FlowResult<Pipeline> {
        Pipeline::new([PipelineItem::from(self), node.into()])
    }

    /// Nodes of this pipeline that are not in `other`
    pub fn difference(&self, other: &Pipeline) -> FlowResult<Pipeline> {
        self.retain(|n| !other.nodes.iter().any(|o| Arc::ptr_eq(o, n)))
    }

    /// Nodes present in both pipelines
    pub fn intersection(&self, other: &Pipeline) -> FlowResult<Pipeline> {
        self.retain(|n| other.nodes.iter().any(|o| Arc::ptr_eq(o, n)))
    }

    /// Only the named nodes
    pub fn only_nodes<S: AsRef<str>>(&self, names: &[S]) -> FlowResult<Pipeline> {
        let positions = self.positions(names)?;
        self.subset(&positions)
    }

    /// Only nodes carrying at least one of `tags`
    pub fn only_nodes_with_tags<S: AsRef<str>>(&self, tags: &[S]) -> FlowResult<Pipeline> {
        self.retain(|n| tags.iter().any(|t| n.has_tag(t.as_ref())))
    }

    /// Nodes that consume any of `datasets`, plus everything downstream
    pub fn from_inputs<S: AsRef<str>>(&self, datasets: &[S]) -> FlowResult<Pipeline> {
        let wanted = self.known_datasets(datasets)?;
        let start: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.inputs().iter().any(|i| wanted.contains(*i)))
            .map(|(pos, _)| pos)
            .collect();
        self.subset(&self.graph.reachable(start, Direction::Outgoing))
    }

    /// Nodes that produce any of `datasets`, plus everything upstream
    pub fn to_outputs<S: AsRef<str>>(&self, datasets: &[S]) -> FlowResult<Pipeline> {
        let wanted = self.known_datasets(datasets)?;
        let start: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.outputs().iter().any(|o| wanted.contains(*o)))
            .map(|(pos, _)| pos)
            .collect();
        self.subset(&self.graph.reachable(start, Direction::Incoming))
    }

    /// The named nodes plus everything downstream of them
    pub fn from_nodes<S: AsRef<str>>(&self, names: &[S]) -> FlowResult<Pipeline> {
        let start = self.positions(names)?;
        self.subset(&self.graph.reachable(start, Direction::Outgoing))
    }

    /// The named nodes plus everything upstream of them
    pub fn to_nodes<S: AsRef<str>>(&self, names: &[S]) -> FlowResult<Pipeline> {
        let start = self.positions(names)?;
        self.subset(&self.graph.reachable(start, Direction::Incoming))
    }

    /// Numbered execution plan, one node per line
    pub fn describe(&self) -> String {
        let mut out = String::new();

        for (i, &pos) in self.order.iter().enumerate() {
            let node = &self.nodes[pos];
            out.push_str(&format!("{}. {}", i + 1, node.name()));
            // Derived names already spell out the datasets
            if node.explicit_name().is_some() {
                out.push_str(&format!(
                    " [{}] -> [{}]",
                    node.inputs().join(", "),
                    node.outputs().join(", ")
                ));
            }

            let deps: Vec<String> = self
                .graph
                .dependencies(pos)
                .into_iter()
                .map(|d| self.nodes[d].name())
                .collect();
            if !deps.is_empty() {
                out.push_str(&format!(" (depends: {})", deps.join(", ")));
            }

            out.push('\n');
        }

        out
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.name() == name)
    }

    fn positions<S: AsRef<str>>(&self, names: &[S]) -> FlowResult<BTreeSet<usize>> {
        names
            .iter()
            .map(|name| {
                self.position(name.as_ref()).ok_or_else(|| FlowError::UnknownNode {
                    node: name.as_ref().to_string(),
                })
            })
            .collect()
    }

    fn known_datasets<S: AsRef<str>>(&self, datasets: &[S]) -> FlowResult<BTreeSet<String>> {
        let known = self.datasets();
        datasets
            .iter()
            .map(|d| {
                let d = d.as_ref();
                if known.contains(d) {
                    Ok(d.to_string())
                } else {
                    Err(FlowError::UnknownDataset {
                        dataset: d.to_string(),
                    })
                }
            })
            .collect()
    }

    fn retain(&self, keep: impl Fn(&Arc<Node>) -> bool) -> FlowResult<Pipeline> {
        Self::build(self.nodes.iter().filter(|n| keep(n)).cloned().collect())
    }

    fn subset(&self, positions: &BTreeSet<usize>) -> FlowResult<Pipeline> {
        Self::build(
            positions
                .iter()
                .map(|&pos| Arc::clone(&self.nodes[pos]))
                .collect(),
        )
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("nodes", &self.node_names())
            .finish()
    }
}

impl Add for Pipeline {
    type Output = FlowResult<Pipeline>;

    fn add(self, rhs: Pipeline) -> Self::Output {
        self.union(&rhs)
    }
}

impl Add<&Pipeline> for &Pipeline {
    type Output = FlowResult<Pipeline>;

    fn add(self, rhs: &Pipeline) -> Self::Output {
        self.union(rhs)
    }
}

impl Add<Node> for Pipeline {
    type Output = FlowResult<Pipeline>;

    fn add(self, rhs: Node) -> Self::Output {
        self.with_node(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{NodeFn, NodeInputs, NodeOutputs};
    use serde_json::Value;

    fn make_node(name: &str, inputs: &[&str], outputs: &[&str]) -> Node {
        let inputs: Vec<String> = inputs.iter().map(|s| s.to_string()).collect();
        let outputs: Vec<String> = outputs.iter().map(|s| s.to_string()).collect();
        let func = NodeFn::variadic(inputs.len(), |_| Ok(Value::Null));
        let inputs = if inputs.is_empty() {
            NodeInputs::none()
        } else {
            NodeInputs::Positional(inputs)
        };
        Node::new(func, inputs, outputs).unwrap().named(name)
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn etl() -> Pipeline {
        Pipeline::new([
            make_node("extract", &["raw"], &["clean"]).tagged(["ingest"]),
            make_node("features", &["clean", "params:k"], &["features"]),
            make_node("train", &["features"], &["model"]).tagged(["ml"]),
            make_node("report", &["clean"], &["summary"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_free_inputs_and_outputs() {
        let p = etl();

        assert_eq!(p.free_inputs(), set(&["params:k", "raw"]));
        assert_eq!(p.free_outputs(), set(&["model", "summary"]));
        assert_eq!(p.len(), 4);
    }

    #[test]
    fn test_nested_pipelines_are_flattened() {
        let inner = Pipeline::new([make_node("a", &[], &["x"])]).unwrap();
        let outer = Pipeline::new([
            PipelineItem::from(inner),
            make_node("b", &["x"], &["y"]).into(),
        ])
        .unwrap();

        assert_eq!(outer.node_names(), vec!["a", "b"]);
        assert_eq!(outer.free_outputs(), set(&["y"]));
    }

    #[test]
    fn test_same_node_shared_between_pipelines() {
        let shared = Arc::new(make_node("shared", &[], &["s"]));
        let left = Pipeline::new([Arc::clone(&shared)]).unwrap();
        let right = Pipeline::new([
            PipelineItem::from(Arc::clone(&shared)),
            make_node("use", &["s"], &["u"]).into(),
        ])
        .unwrap();

        let both = (&left + &right).unwrap();
        assert_eq!(both.node_names(), vec!["shared", "use"]);
    }

    #[test]
    fn test_union_rechecks_producers() {
        let left = Pipeline::new([make_node("x", &[], &["a"])]).unwrap();
        let right = Pipeline::new([make_node("y", &[], &["a"])]).unwrap();

        assert!(matches!(left + right, Err(FlowError::AmbiguousOutput { .. })));
    }

    #[test]
    fn test_union_rechecks_cycles() {
        let left = Pipeline::new([make_node("x", &["b"], &["a"])]).unwrap();
        let right = Pipeline::new([make_node("y", &["a"], &["b"])]).unwrap();

        assert!(matches!(left.union(&right), Err(FlowError::CyclicPipeline { .. })));
    }

    #[test]
    fn test_duplicate_node_names() {
        let result = Pipeline::new([
            make_node("same", &[], &["a"]),
            make_node("same", &[], &["b"]),
        ]);
        assert!(matches!(result, Err(FlowError::DuplicateNode { .. })));
    }

    #[test]
    fn test_unnamed_sinks_on_one_dataset_collide() {
        let sink = || Node::new(NodeFn::unary(|_| Ok(Value::Null)), "x", NodeOutputs::none());
        let result = Pipeline::new([sink().unwrap(), sink().unwrap()]);

        match result {
            Err(FlowError::DuplicateNode { node }) => assert_eq!(node, "[x] -> []"),
            other => panic!("expected duplicate name, got {:?}", other),
        }
    }

    #[test]
    fn test_add_node() {
        let p = Pipeline::new([make_node("a", &[], &["x"])]).unwrap();
        let p = (p + make_node("b", &["x"], &["y"])).unwrap();
        assert_eq!(p.node_names(), vec!["a", "b"]);
    }

    #[test]
    fn test_difference_and_intersection() {
        let p = etl();
        let ml = p.only_nodes_with_tags(&["ml"]).unwrap();

        assert_eq!(p.difference(&ml).unwrap().len(), 3);
        assert_eq!(p.intersection(&ml).unwrap().node_names(), vec!["train"]);
    }

    #[test]
    fn test_only_nodes() {
        let p = etl();
        assert_eq!(
            p.only_nodes(&["report", "extract"]).unwrap().node_names(),
            vec!["extract", "report"]
        );
        assert!(matches!(
            p.only_nodes(&["missing"]),
            Err(FlowError::UnknownNode { .. })
        ));
    }

    #[test]
    fn test_from_inputs_and_to_outputs() {
        let p = etl();

        assert_eq!(
            p.from_inputs(&["features"]).unwrap().node_names(),
            vec!["train"]
        );
        assert_eq!(
            p.to_outputs(&["model"]).unwrap().node_names(),
            vec!["extract", "features", "train"]
        );
        assert!(matches!(
            p.to_outputs(&["nope"]),
            Err(FlowError::UnknownDataset { .. })
        ));
    }

    #[test]
    fn test_from_nodes_and_to_nodes() {
        let p = etl();

        assert_eq!(
            p.from_nodes(&["features"]).unwrap().node_names(),
            vec!["features", "train"]
        );
        assert_eq!(
            p.to_nodes(&["report"]).unwrap().node_names(),
            vec!["extract", "report"]
        );
    }

    #[test]
    fn test_describe_lists_execution_order() {
        let text = etl().describe();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("1. extract [raw] -> [clean]"));
        assert!(lines[1].contains("(depends: extract)"));
        assert_eq!(
            etl().dependencies("train"),
            Some(vec!["features".to_string()])
        );
    }

    #[test]
    fn test_describe_unnamed_node_once() {
        let p = Pipeline::new([Node::new(NodeFn::unary(Ok), "in", "out").unwrap()]).unwrap();
        assert_eq!(p.describe(), "1. [in] -> [out]\n");
    }

    #[test]
    fn test_node_lookup() {
        let p = etl();
        assert_eq!(p.node("train").map(|n| n.name()), Some("train".to_string()));
        assert!(p.node("missing").is_none());
    }

    #[test]
    fn test_empty_pipeline() {
        let p = Pipeline::new(Vec::<Node>::new()).unwrap();
        assert!(p.is_empty());
        assert!(p.free_inputs().is_empty());
    }
}
