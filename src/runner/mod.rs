// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Pipeline runner
//!
//! Executes a pipeline's nodes one at a time, in dependency order, against a
//! data catalog.

mod state;

pub use state::RunState;

use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, info, info_span, warn};

use crate::catalog::DataCatalog;
use crate::errors::{FlowError, FlowResult, NotFoundReason};
use crate::pipeline::Pipeline;
use state::RunTracker;

/// Values returned by a run, keyed by dataset name
pub type RunOutput = BTreeMap<String, Value>;

/// Run options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Datasets to return in addition to the free outputs
    pub extra_outputs: Vec<String>,
}

/// Sequential, single-threaded runner
///
/// Holds no state between runs. A failed run leaves whatever outputs earlier
/// nodes saved in the catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialRunner;

impl SequentialRunner {
    /// Create a runner
    pub fn new() -> Self {
        Self
    }

    /// Run `pipeline` and return its free outputs
    pub fn run(&self, pipeline: &Pipeline, catalog: &mut DataCatalog) -> FlowResult<RunOutput> {
        self.run_with(pipeline, catalog, &RunOptions::default())
    }

    /// Run `pipeline` with options
    pub fn run_with(
        &self,
        pipeline: &Pipeline,
        catalog: &mut DataCatalog,
        options: &RunOptions,
    ) -> FlowResult<RunOutput> {
        let span = info_span!("run", nodes = pipeline.len());
        let _guard = span.enter();

        let mut tracker = RunTracker::new();
        tracker.transition(RunState::Running);
        let start = Instant::now();

        match self.execute(pipeline, catalog, options) {
            Ok(output) => {
                tracker.transition(RunState::Succeeded);
                info!(
                    state = %tracker.state(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Pipeline execution completed successfully"
                );
                Ok(output)
            }
            Err(e) => {
                tracker.transition(RunState::Failed);
                warn!(state = %tracker.state(), error = %e, "Pipeline execution failed");
                Err(e)
            }
        }
    }

    fn execute(
        &self,
        pipeline: &Pipeline,
        catalog: &mut DataCatalog,
        options: &RunOptions,
    ) -> FlowResult<RunOutput> {
        Self::preflight(pipeline, catalog, options)?;

        let total = pipeline.len();
        for (index, node) in pipeline.nodes().enumerate() {
            let name = node.name();
            debug!(node = %name, "running node");

            let outputs = node.invoke(&*catalog).map_err(|e| {
                if e.is_catalog_error() {
                    e
                } else {
                    FlowError::execution(&name, index, e)
                }
            })?;

            for (dataset, value) in outputs {
                debug!(node = %name, dataset = %dataset, "saving output");
                catalog.set(&dataset, value)?;
            }

            info!(node = %name, "Completed {} out of {} tasks", index + 1, total);
        }

        let mut wanted = pipeline.free_outputs();
        wanted.extend(options.extra_outputs.iter().cloned());

        wanted
            .into_iter()
            .map(|name| catalog.get(&name).map(|value| (name, value)))
            .collect()
    }

    /// Checks made before any node runs
    fn preflight(
        pipeline: &Pipeline,
        catalog: &DataCatalog,
        options: &RunOptions,
    ) -> FlowResult<()> {
        let missing: Vec<String> = pipeline
            .free_inputs()
            .into_iter()
            .filter(|name| !catalog.exists(name))
            .collect();
        if !missing.is_empty() {
            return Err(FlowError::MissingInput { names: missing });
        }

        let datasets = pipeline.datasets();
        if let Some(unknown) = options
            .extra_outputs
            .iter()
            .find(|name| !datasets.contains(name.as_str()))
        {
            return Err(FlowError::UnknownDataset {
                dataset: unknown.clone(),
            });
        }

        if !catalog.auto_creates_intermediates() {
            if let Some(unregistered) = pipeline
                .all_outputs()
                .into_iter()
                .find(|name| !catalog.contains(name))
            {
                return Err(FlowError::DatasetNotFound {
                    name: unregistered,
                    reason: NotFoundReason::NotRegistered,
                });
            }
        }

        Ok(())
    }
}
