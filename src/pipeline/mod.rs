// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Nodes and pipelines
//!
//! This module defines the node model, the pipeline DAG with its derived
//! execution order, and modular pipeline rewriting.

mod dag;
mod definition;
mod modular;
mod node;

pub use dag::DependencyGraph;
pub use definition::{Pipeline, PipelineItem};
pub use modular::ModularOptions;
pub use node::{Node, NodeFn, NodeInputs, NodeOutputs, NodeResult, ValueProvider};
