// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for nodeflow.

pub mod describe;
pub mod run;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::errors::FlowResult;
use crate::pipeline::Pipeline;

/// Dataflow pipeline runner
#[derive(Parser, Debug)]
#[clap(
    name = "nodeflow",
    version,
    about = "Run dataflow pipelines of nodes against a data catalog",
    long_about = None,
    after_help = "Examples:\n\
        nodeflow run                                   Run the hello pipeline\n\
        nodeflow run --seed greeting_words=Hi \\\n\
            --from-inputs greeting_words               Run with a seeded greeting\n\
        nodeflow describe                              Show the execution order\n\n\
        See 'nodeflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the pipeline
    Run {
        /// Settings file (TOML)
        #[clap(short, long, env = "NODEFLOW_CONFIG")]
        config: Option<PathBuf>,

        /// Seed a dataset, as name=<json>
        #[clap(short, long, value_name = "NAME=VALUE")]
        seed: Vec<String>,

        /// Also return these datasets
        #[clap(short, long, value_name = "DATASET")]
        output: Vec<String>,

        /// Output format
        #[clap(short, long, default_value = "text")]
        format: OutputFormat,

        #[clap(flatten)]
        selection: Selection,
    },

    /// Show the execution order
    Describe {
        #[clap(flatten)]
        selection: Selection,
    },
}

/// Which part of the pipeline to use
#[derive(Args, Debug, Clone, Default)]
pub struct Selection {
    /// Only nodes with one of these tags
    #[clap(short, long)]
    pub tag: Vec<String>,

    /// Only these nodes
    #[clap(short, long)]
    pub node: Vec<String>,

    /// Start from nodes consuming these datasets
    #[clap(long, value_name = "DATASET")]
    pub from_inputs: Vec<String>,

    /// Stop at nodes producing these datasets
    #[clap(long, value_name = "DATASET")]
    pub to_outputs: Vec<String>,
}

impl Selection {
    /// Narrow `pipeline` by every filter that was given
    pub fn apply(&self, pipeline: &Pipeline) -> FlowResult<Pipeline> {
        let mut selected = pipeline.clone();

        if !self.tag.is_empty() {
            selected = selected.only_nodes_with_tags(&self.tag)?;
        }
        if !self.node.is_empty() {
            selected = selected.only_nodes(&self.node)?;
        }
        if !self.from_inputs.is_empty() {
            selected = selected.from_inputs(&self.from_inputs)?;
        }
        if !self.to_outputs.is_empty() {
            selected = selected.to_outputs(&self.to_outputs)?;
        }

        Ok(selected)
    }
}

/// Output format for run results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hello::hello_pipeline;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::parse_from([
            "nodeflow",
            "run",
            "--seed",
            "greeting_words=Hi",
            "--from-inputs",
            "greeting_words",
            "--format",
            "json",
        ]);

        match cli.command {
            Commands::Run {
                seed,
                format,
                selection,
                ..
            } => {
                assert_eq!(seed, vec!["greeting_words=Hi"]);
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(selection.from_inputs, vec!["greeting_words"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_empty_selection_keeps_everything() {
        let p = hello_pipeline().unwrap();
        let selected = Selection::default().apply(&p).unwrap();
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_selection_from_inputs() {
        let p = hello_pipeline().unwrap();
        let selection = Selection {
            from_inputs: vec!["greeting_words".into()],
            ..Default::default()
        };

        assert_eq!(selection.apply(&p).unwrap().node_names(), vec!["introduce"]);
    }
}
