// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Error types for pipeline construction and execution
//!
//! Every failure the engine can report is a [`FlowError`] variant. Errors
//! raised while building a node or pipeline fail fast before anything runs;
//! errors raised during a run stop it at the failing node.

use miette::Diagnostic;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::catalog::DatasetError;

/// Result type for nodeflow operations
pub type FlowResult<T> = Result<T, FlowError>;

/// Why a dataset could not be read from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No entry is registered under the name
    NotRegistered,
    /// An entry exists but nothing has been saved into it yet
    Unset,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRegistered => f.write_str("not registered in the catalog"),
            Self::Unset => f.write_str("registered but no value has been saved"),
        }
    }
}

/// Main error type for nodeflow
#[derive(Error, Debug, Diagnostic)]
pub enum FlowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Node Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Node '{node}': {reason}")]
    #[diagnostic(
        code(nodeflow::arity),
        help("The declared inputs/outputs must match the function's parameters and return shape")
    )]
    Arity { node: String, reason: String },

    #[error("Node '{node}' is invalid: {reason}")]
    #[diagnostic(code(nodeflow::invalid_node))]
    InvalidNode { node: String, reason: String },

    #[error("Node '{node}' failed")]
    #[diagnostic(code(nodeflow::node_failed))]
    NodeFailed {
        node: String,
        #[source]
        source: anyhow::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Pipeline Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Dataset '{dataset}' is produced by both '{first}' and '{second}'")]
    #[diagnostic(
        code(nodeflow::ambiguous_output),
        help("Every dataset must have exactly one producing node; rename one of the outputs")
    )]
    AmbiguousOutput {
        dataset: String,
        first: String,
        second: String,
    },

    #[error("Circular dependency detected: {}", .nodes.join(" -> "))]
    #[diagnostic(
        code(nodeflow::cyclic_pipeline),
        help("Review the node inputs and outputs to remove the cycle")
    )]
    CyclicPipeline { nodes: Vec<String> },

    #[error("Two different nodes are named '{node}'")]
    #[diagnostic(
        code(nodeflow::duplicate_node),
        help("Give each node a unique name with Node::named")
    )]
    DuplicateNode { node: String },

    #[error("Cannot map dataset '{dataset}': {reason}")]
    #[diagnostic(code(nodeflow::invalid_mapping))]
    InvalidMapping { dataset: String, reason: String },

    #[error("Node '{node}' not found in pipeline")]
    #[diagnostic(code(nodeflow::unknown_node))]
    UnknownNode { node: String },

    #[error("Dataset '{dataset}' is not used by the pipeline")]
    #[diagnostic(code(nodeflow::unknown_dataset))]
    UnknownDataset { dataset: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Catalog Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Dataset '{name}' is already registered")]
    #[diagnostic(
        code(nodeflow::dataset_already_exists),
        help("Pass replace = true to swap the registered handle")
    )]
    DatasetAlreadyExists { name: String },

    #[error("Dataset '{name}' not found: {reason}")]
    #[diagnostic(code(nodeflow::dataset_not_found))]
    DatasetNotFound { name: String, reason: NotFoundReason },

    #[error("Failed to load dataset '{name}'")]
    #[diagnostic(code(nodeflow::dataset_load))]
    DatasetLoad {
        name: String,
        #[source]
        source: DatasetError,
    },

    #[error("Failed to save dataset '{name}'")]
    #[diagnostic(code(nodeflow::dataset_save))]
    DatasetSave {
        name: String,
        #[source]
        source: DatasetError,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline input(s) missing from the catalog: {}", .names.join(", "))]
    #[diagnostic(
        code(nodeflow::missing_input),
        help("Seed these datasets in the catalog before running")
    )]
    MissingInput { names: Vec<String> },

    #[error("Pipeline failed at node '{node}' (#{index})")]
    #[diagnostic(code(nodeflow::pipeline_execution))]
    PipelineExecution {
        node: String,
        index: usize,
        #[source]
        source: Box<FlowError>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read config file '{path}': {error}")]
    #[diagnostic(code(nodeflow::config_read))]
    ConfigRead { path: PathBuf, error: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(nodeflow::config_parse))]
    ConfigParse { message: String },

    #[error("Invalid seed '{seed}': {reason}")]
    #[diagnostic(
        code(nodeflow::invalid_seed),
        help("Seeds are written as name=<json>, e.g. greeting_words='\"Hi\"'")
    )]
    InvalidSeed { seed: String, reason: String },
}

impl From<toml::de::Error> for FlowError {
    fn from(e: toml::de::Error) -> Self {
        Self::ConfigParse { message: e.to_string() }
    }
}

impl FlowError {
    /// Wrap an error raised while executing a node
    pub fn execution(node: &str, index: usize, source: FlowError) -> Self {
        Self::PipelineExecution {
            node: node.to_string(),
            index,
            source: Box::new(source),
        }
    }

    /// Whether the error comes from catalog access rather than node logic
    pub fn is_catalog_error(&self) -> bool {
        matches!(
            self,
            Self::DatasetNotFound { .. } | Self::DatasetLoad { .. } | Self::DatasetSave { .. }
        )
    }

    /// The innermost nodeflow error, looking through execution wrappers
    pub fn root(&self) -> &FlowError {
        match self {
            Self::PipelineExecution { source, .. } => source.root(),
            other => other,
        }
    }
}
