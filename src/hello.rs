// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! The "Hello, AIMedic!" pipeline
//!
//! Two nodes: `greeting` produces `greeting_words`, and `introduce` turns it
//! into `message`. Seeding `greeting_words` in the catalog and running only
//! `introduce` replaces the greeting.

use anyhow::anyhow;
use serde_json::{json, Value};

use crate::errors::FlowResult;
use crate::pipeline::{Node, NodeFn, NodeInputs, Pipeline};

/// Dataset holding the greeting
pub const GREETING_WORDS: &str = "greeting_words";

/// Dataset holding the final message
pub const MESSAGE: &str = "message";

/// Node producing the literal greeting
pub fn greeting() -> FlowResult<Node> {
    Ok(Node::new(
        NodeFn::nullary(|| Ok(json!("Hello"))),
        NodeInputs::none(),
        GREETING_WORDS,
    )?
    .named("greeting"))
}

/// Node appending the addressee to the greeting
pub fn introduce() -> FlowResult<Node> {
    Ok(Node::new(NodeFn::unary(introduce_fn), GREETING_WORDS, MESSAGE)?.named("introduce"))
}

fn introduce_fn(words: Value) -> anyhow::Result<Value> {
    let words = words
        .as_str()
        .ok_or_else(|| anyhow!("{} must be a string, got {}", GREETING_WORDS, words))?;
    Ok(json!(format!("{}, AIMedic!", words)))
}

/// Both nodes
pub fn hello_pipeline() -> FlowResult<Pipeline> {
    Pipeline::new([greeting()?, introduce()?])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_shape() {
        let p = hello_pipeline().unwrap();

        assert_eq!(p.node_names(), vec!["greeting", "introduce"]);
        assert!(p.free_inputs().is_empty());
        assert_eq!(p.free_outputs().into_iter().collect::<Vec<_>>(), vec![MESSAGE]);
    }

    #[test]
    fn test_introduce_rejects_non_string() {
        assert!(introduce_fn(json!(5)).is_err());
        assert_eq!(introduce_fn(json!("Hey")).unwrap(), json!("Hey, AIMedic!"));
    }
}
