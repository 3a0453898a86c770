// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Closure-backed dataset
//!
//! Adapts caller-provided load/save functions to the [`Dataset`] contract,
//! which is how external storage is plugged into a catalog.

use serde_json::Value;
use std::fmt;

use super::{Dataset, DatasetError};

type LoadFn = Box<dyn Fn() -> anyhow::Result<Value> + Send + Sync>;
type SaveFn = Box<dyn Fn(Value) -> anyhow::Result<()> + Send + Sync>;
type ExistsFn = Box<dyn Fn() -> bool + Send + Sync>;

/// Dataset whose storage is defined by closures
pub struct LambdaDataset {
    load: Option<LoadFn>,
    save: Option<SaveFn>,
    exists: Option<ExistsFn>,
    description: String,
}

impl LambdaDataset {
    /// Create a dataset with no operations; add them with the builder methods
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            load: None,
            save: None,
            exists: None,
            description: description.into(),
        }
    }

    /// Set the load operation
    pub fn with_load<F>(mut self, load: F) -> Self
    where
        F: Fn() -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        self.load = Some(Box::new(load));
        self
    }

    /// Set the save operation
    pub fn with_save<F>(mut self, save: F) -> Self
    where
        F: Fn(Value) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.save = Some(Box::new(save));
        self
    }

    /// Set an existence check; without one, existence means a successful load
    pub fn with_exists<F>(mut self, exists: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.exists = Some(Box::new(exists));
        self
    }
}

impl Dataset for LambdaDataset {
    fn load(&self) -> Result<Value, DatasetError> {
        let load = self.load.as_ref().ok_or(DatasetError::Unsupported {
            operation: "load",
        })?;
        load().map_err(DatasetError::from)
    }

    fn save(&self, value: Value) -> Result<(), DatasetError> {
        let save = self.save.as_ref().ok_or(DatasetError::Unsupported {
            operation: "save",
        })?;
        save(value).map_err(DatasetError::from)
    }

    fn exists(&self) -> bool {
        match &self.exists {
            Some(exists) => exists(),
            None => self.load().is_ok(),
        }
    }

    fn describe(&self) -> String {
        format!("LambdaDataset({})", self.description)
    }
}

impl fmt::Debug for LambdaDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LambdaDataset")
            .field("description", &self.description)
            .field("load", &self.load.is_some())
            .field("save", &self.save.is_some())
            .finish()
    }
}
