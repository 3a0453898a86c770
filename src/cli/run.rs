// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Run command - execute the pipeline

use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use super::{OutputFormat, Selection};
use crate::config::Settings;
use crate::hello::hello_pipeline;
use crate::runner::{RunOptions, SequentialRunner};
use crate::utils::{print_header, print_numbered};

/// Run the pipeline
pub fn run(
    config: Option<PathBuf>,
    seeds: Vec<String>,
    outputs: Vec<String>,
    format: OutputFormat,
    selection: Selection,
    verbose: bool,
) -> Result<()> {
    let settings = match config {
        Some(path) => Settings::from_file(&path)?,
        None => Settings::default(),
    };
    let settings = settings.with_seeds(&seeds)?;

    let pipeline = selection.apply(&hello_pipeline()?)?;
    let mut catalog = settings.build_catalog()?;

    if verbose && format == OutputFormat::Text {
        print_header("Execution plan");
        for (i, name) in pipeline.node_names().iter().enumerate() {
            print_numbered(i + 1, name);
        }
        println!();
    }

    let options = RunOptions {
        extra_outputs: outputs,
    };
    let result = SequentialRunner::new().run_with(&pipeline, &mut catalog, &options)?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result).into_diagnostic()?);
        }
        OutputFormat::Text => {
            for (name, value) in &result {
                println!("{} = {}", name.bold(), value);
            }
        }
    }

    Ok(())
}
