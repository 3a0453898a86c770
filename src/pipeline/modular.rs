// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Modular pipelines
//!
//! Reuse a pipeline under different dataset names: rename its free inputs,
//! rename its outputs, and prefix everything else with a namespace.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::{PARAMETERS, PARAMS_PREFIX};
use crate::errors::{FlowError, FlowResult};
use crate::pipeline::Pipeline;

/// How to rewrite dataset and node names
#[derive(Debug, Clone, Default)]
pub struct ModularOptions {
    /// Free input renames, `old -> new`
    pub inputs: BTreeMap<String, String>,
    /// Output renames, `old -> new`
    pub outputs: BTreeMap<String, String>,
    /// Prefix for every other dataset and for node names
    pub namespace: Option<String>,
}

impl ModularOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename a free input
    pub fn input(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.inputs.insert(from.into(), to.into());
        self
    }

    /// Rename an output
    pub fn output(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.outputs.insert(from.into(), to.into());
        self
    }

    /// Set the namespace
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn rename(&self, dataset: &str) -> String {
        if let Some(mapped) = self.inputs.get(dataset).or_else(|| self.outputs.get(dataset)) {
            return mapped.clone();
        }
        match &self.namespace {
            Some(ns) if !is_parameter(dataset) => format!("{}.{}", ns, dataset),
            _ => dataset.to_string(),
        }
    }
}

fn is_parameter(dataset: &str) -> bool {
    dataset == PARAMETERS || dataset.starts_with(PARAMS_PREFIX)
}

impl Pipeline {
    /// Copy of the pipeline with datasets and node names rewritten
    pub fn modular(&self, options: &ModularOptions) -> FlowResult<Pipeline> {
        let free_inputs = self.free_inputs();
        for name in options.inputs.keys() {
            if !free_inputs.contains(name) {
                return Err(FlowError::InvalidMapping {
                    dataset: name.clone(),
                    reason: "not a free input of the pipeline".into(),
                });
            }
        }

        let outputs = self.all_outputs();
        for name in options.outputs.keys() {
            if !outputs.contains(name) {
                return Err(FlowError::InvalidMapping {
                    dataset: name.clone(),
                    reason: "not an output of the pipeline".into(),
                });
            }
        }

        let rename = |dataset: &str| options.rename(dataset);
        let nodes = self
            .nodes()
            .map(|node| {
                // Unnamed nodes derive their name from the renamed datasets
                let name = options
                    .namespace
                    .as_ref()
                    .zip(node.explicit_name())
                    .map(|(ns, name)| format!("{}.{}", ns, name));
                Arc::new(node.renamed(&rename, name))
            })
            .collect();

        Pipeline::build(nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Node, NodeFn};
    use std::collections::BTreeSet;

    fn cleaning() -> Pipeline {
        Pipeline::new([
            Node::new(NodeFn::binary(|a, _| Ok(a)), ["raw", "params:threshold"], "filtered")
                .unwrap()
                .named("filter"),
            Node::new(NodeFn::unary(Ok), "filtered", "clean")
                .unwrap()
                .named("finish"),
        ])
        .unwrap()
    }

    fn set(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_namespace_prefixes_internal_names() {
        let p = cleaning()
            .modular(&ModularOptions::new().namespace("eu"))
            .unwrap();

        assert_eq!(p.node_names(), vec!["eu.filter", "eu.finish"]);
        assert_eq!(p.free_inputs(), set(&["eu.raw", "params:threshold"]));
        assert_eq!(p.free_outputs(), set(&["eu.clean"]));
        assert!(p.all_outputs().contains("eu.filtered"));
    }

    #[test]
    fn test_mapped_names_escape_namespace() {
        let options = ModularOptions::new()
            .namespace("eu")
            .input("raw", "eu_raw_rows")
            .output("clean", "eu_clean_rows");
        let p = cleaning().modular(&options).unwrap();

        assert_eq!(p.free_inputs(), set(&["eu_raw_rows", "params:threshold"]));
        assert_eq!(p.free_outputs(), set(&["eu_clean_rows"]));
    }

    #[test]
    fn test_two_instances_compose() {
        let eu = cleaning()
            .modular(&ModularOptions::new().namespace("eu"))
            .unwrap();
        let us = cleaning()
            .modular(&ModularOptions::new().namespace("us"))
            .unwrap();

        let both = eu.union(&us).unwrap();
        assert_eq!(both.len(), 4);
        assert_eq!(both.free_inputs().len(), 3);
    }

    #[test]
    fn test_without_namespace_only_mapped_names_change() {
        let p = cleaning()
            .modular(&ModularOptions::new().input("raw", "source"))
            .unwrap();

        assert_eq!(p.node_names(), vec!["filter", "finish"]);
        assert_eq!(p.free_inputs(), set(&["params:threshold", "source"]));
    }

    #[test]
    fn test_unnamed_nodes_rederive_names() {
        let p = Pipeline::new([Node::new(NodeFn::unary(Ok), "raw", "clean").unwrap()])
            .unwrap()
            .modular(&ModularOptions::new().namespace("eu"))
            .unwrap();

        assert_eq!(p.node_names(), vec!["[eu.raw] -> [eu.clean]"]);
    }

    #[test]
    fn test_invalid_mappings() {
        let not_free = cleaning().modular(&ModularOptions::new().input("filtered", "x"));
        let not_output = cleaning().modular(&ModularOptions::new().output("raw", "x"));

        assert!(matches!(not_free, Err(FlowError::InvalidMapping { .. })));
        assert!(matches!(not_output, Err(FlowError::InvalidMapping { .. })));
    }

    #[test]
    fn test_original_is_untouched() {
        let original = cleaning();
        let _ = original
            .modular(&ModularOptions::new().namespace("eu"))
            .unwrap();

        assert_eq!(original.free_inputs(), set(&["params:threshold", "raw"]));
    }
}
