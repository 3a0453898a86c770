// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Data catalog
//!
//! Maps logical dataset names to storage handles. The runner reads node
//! inputs from the catalog and writes node outputs back into it.

mod lambda;
mod memory;

pub use lambda::LambdaDataset;
pub use memory::MemoryDataset;

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::errors::{FlowError, FlowResult, NotFoundReason};
use crate::pipeline::ValueProvider;

/// Name of the dataset holding the whole parameters object
pub const PARAMETERS: &str = "parameters";

/// Prefix for individual parameter datasets
pub const PARAMS_PREFIX: &str = "params:";

/// Failure reported by a dataset handle
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("no value has been saved")]
    Empty,

    #[error("dataset does not support {operation}")]
    Unsupported { operation: &'static str },

    #[error("dataset lock poisoned")]
    Poisoned,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Storage handle for a single dataset
pub trait Dataset: Send + Sync {
    /// Load the current value
    ///
    /// Returns [`DatasetError::Empty`] when nothing has been stored yet.
    fn load(&self) -> Result<Value, DatasetError>;

    /// Store a value, replacing any previous one
    fn save(&self, value: Value) -> Result<(), DatasetError>;

    /// Whether a value is currently loadable
    fn exists(&self) -> bool {
        self.load().is_ok()
    }

    /// Drop any cached data held by the handle
    fn release(&self) {}

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Registry of datasets by name
pub struct DataCatalog {
    datasets: BTreeMap<String, Arc<dyn Dataset>>,
    auto_create_intermediates: bool,
}

impl DataCatalog {
    /// Create an empty catalog that auto-creates in-memory intermediates
    pub fn new() -> Self {
        Self {
            datasets: BTreeMap::new(),
            auto_create_intermediates: true,
        }
    }

    /// Control whether `set` may create missing entries
    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create_intermediates = enabled;
        self
    }

    /// Whether `set` creates missing entries
    pub fn auto_creates_intermediates(&self) -> bool {
        self.auto_create_intermediates
    }

    /// Register a dataset handle
    ///
    /// Registering the same handle twice is a no-op. A different handle under
    /// an existing name is rejected unless `replace` is set.
    pub fn add(&mut self, name: &str, handle: Arc<dyn Dataset>, replace: bool) -> FlowResult<()> {
        if let Some(existing) = self.datasets.get(name) {
            if Arc::ptr_eq(existing, &handle) {
                return Ok(());
            }
            if !replace {
                return Err(FlowError::DatasetAlreadyExists {
                    name: name.to_string(),
                });
            }
            debug!(dataset = name, "replacing dataset handle");
        }

        self.datasets.insert(name.to_string(), handle);
        Ok(())
    }

    /// Load the current value of a dataset
    pub fn get(&self, name: &str) -> FlowResult<Value> {
        let handle = self.datasets.get(name).ok_or_else(|| FlowError::DatasetNotFound {
            name: name.to_string(),
            reason: NotFoundReason::NotRegistered,
        })?;

        handle.load().map_err(|e| match e {
            DatasetError::Empty => FlowError::DatasetNotFound {
                name: name.to_string(),
                reason: NotFoundReason::Unset,
            },
            source => FlowError::DatasetLoad {
                name: name.to_string(),
                source,
            },
        })
    }

    /// Save a value, creating an in-memory entry if permitted
    pub fn set(&mut self, name: &str, value: Value) -> FlowResult<()> {
        if !self.datasets.contains_key(name) {
            if !self.auto_create_intermediates {
                return Err(FlowError::DatasetNotFound {
                    name: name.to_string(),
                    reason: NotFoundReason::NotRegistered,
                });
            }
            debug!(dataset = name, "creating in-memory dataset");
            self.datasets
                .insert(name.to_string(), Arc::new(MemoryDataset::new()));
        }

        let handle = &self.datasets[name];
        handle.save(value).map_err(|source| FlowError::DatasetSave {
            name: name.to_string(),
            source,
        })
    }

    /// Whether a value is loadable for `name`
    pub fn exists(&self, name: &str) -> bool {
        self.datasets.get(name).is_some_and(|h| h.exists())
    }

    /// Whether an entry is registered for `name`, loadable or not
    pub fn contains(&self, name: &str) -> bool {
        self.datasets.contains_key(name)
    }

    /// Save every value in `values`
    pub fn seed<I, K>(&mut self, values: I) -> FlowResult<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        for (name, value) in values {
            self.set(name.as_ref(), value)?;
        }
        Ok(())
    }

    /// Register a parameters object
    ///
    /// The whole object is stored as `parameters`, and every key as
    /// `params:<key>`, recursing into nested objects as `params:<a>.<b>`.
    pub fn add_parameters(&mut self, parameters: Value) -> FlowResult<()> {
        let mut flat = Vec::new();
        if let Value::Object(map) = &parameters {
            for (key, value) in map {
                flatten_parameter(key, value, &mut flat);
            }
        }

        self.add(
            PARAMETERS,
            Arc::new(MemoryDataset::with_value(parameters)),
            true,
        )?;
        for (key, value) in flat {
            self.add(
                &format!("{}{}", PARAMS_PREFIX, key),
                Arc::new(MemoryDataset::with_value(value)),
                true,
            )?;
        }
        Ok(())
    }

    /// Release cached data held by a dataset
    pub fn release(&self, name: &str) {
        if let Some(handle) = self.datasets.get(name) {
            handle.release();
        }
    }

    /// Registered dataset names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.datasets.keys().map(String::as_str).collect()
    }
}

fn flatten_parameter(key: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    out.push((key.to_string(), value.clone()));
    if let Value::Object(map) = value {
        for (child, child_value) in map {
            flatten_parameter(&format!("{}.{}", key, child), child_value, out);
        }
    }
}

impl Default for DataCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.datasets.iter().map(|(k, v)| (k, v.describe())))
            .finish()
    }
}

impl ValueProvider for DataCatalog {
    fn value(&self, name: &str) -> FlowResult<Value> {
        self.get(name)
    }
}
