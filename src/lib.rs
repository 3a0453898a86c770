// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! # nodeflow - Dataflow Pipeline Engine
//!
//! `nodeflow` runs pipelines of pure nodes against a data catalog.
//!
//! ## Features
//!
//! - **Nodes** - functions with declared input and output datasets
//! - **Pipelines** - immutable DAGs with a deterministic execution order
//! - **Data catalog** - named datasets behind pluggable storage handles
//! - **Sequential runner** - dependency-ordered, fail-fast execution
//!
//! ## Quick Start
//!
//! ```
//! use nodeflow::{DataCatalog, Node, NodeFn, NodeInputs, Pipeline, SequentialRunner};
//! use serde_json::json;
//!
//! let greeting = Node::new(NodeFn::nullary(|| Ok(json!("Hello"))), NodeInputs::none(), "words")?;
//! let shout = Node::new(
//!     NodeFn::unary(|w| Ok(json!(format!("{}!", w.as_str().unwrap_or_default())))),
//!     "words",
//!     "shout",
//! )?;
//!
//! let pipeline = Pipeline::new([greeting, shout])?;
//! let result = SequentialRunner::new().run(&pipeline, &mut DataCatalog::new())?;
//! assert_eq!(result["shout"], json!("Hello!"));
//! # Ok::<(), nodeflow::FlowError>(())
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod errors;
pub mod hello;
pub mod pipeline;
pub mod runner;
pub mod utils;

// Re-export commonly used types
pub use catalog::{DataCatalog, Dataset, DatasetError, LambdaDataset, MemoryDataset};
pub use errors::{FlowError, FlowResult};
pub use pipeline::{ModularOptions, Node, NodeFn, NodeInputs, NodeOutputs, Pipeline};
pub use runner::{RunOptions, RunOutput, RunState, SequentialRunner};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
