// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Describe command - show the execution order

use miette::Result;

use super::Selection;
use crate::hello::hello_pipeline;
use crate::utils::{print_header, print_section};

/// Run the describe command
pub fn run(selection: Selection, verbose: bool) -> Result<()> {
    let pipeline = selection.apply(&hello_pipeline()?)?;

    print_header("Pipeline");
    print!("{}", pipeline.describe());

    let free_inputs = pipeline.free_inputs();
    if !free_inputs.is_empty() {
        print_section("Inputs");
        for name in &free_inputs {
            println!("  - {}", name);
        }
    }

    print_section("Outputs");
    for name in pipeline.free_outputs() {
        println!("  - {}", name);
    }

    if verbose {
        print_section("Tags");
        for name in pipeline.node_names() {
            let tags = pipeline
                .node(&name)
                .map(|node| node.tags().iter().cloned().collect::<Vec<_>>())
                .unwrap_or_default();
            if tags.is_empty() {
                println!("  {}: -", name);
            } else {
                println!("  {}: {}", name, tags.join(", "));
            }
        }
    }

    Ok(())
}
