// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Settings
//!
//! Loaded from a TOML file:
//!
//! ```toml
//! [catalog]
//! auto_create_intermediates = true
//!
//! [parameters]
//! threshold = 0.5
//!
//! [seeds]
//! greeting_words = "Hi"
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::catalog::{DataCatalog, MemoryDataset};
use crate::errors::{FlowError, FlowResult};

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Catalog behaviour
    pub catalog: CatalogSettings,

    /// Registered as `parameters` and `params:<key>`
    pub parameters: Map<String, Value>,

    /// Initial dataset values
    pub seeds: BTreeMap<String, Value>,
}

/// Catalog settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Create in-memory entries for outputs that are not registered
    #[serde(default = "default_auto_create")]
    pub auto_create_intermediates: bool,
}

fn default_auto_create() -> bool {
    true
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            auto_create_intermediates: default_auto_create(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> FlowResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| FlowError::ConfigRead {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::from_toml(&content)
    }

    /// Parse settings from a TOML string
    pub fn from_toml(content: &str) -> FlowResult<Self> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Add seeds written as `name=<value>`
    pub fn with_seeds<S: AsRef<str>>(mut self, seeds: &[S]) -> FlowResult<Self> {
        for seed in seeds {
            let (name, value) = parse_seed(seed.as_ref())?;
            self.seeds.insert(name, value);
        }
        Ok(self)
    }

    /// Build a catalog holding the parameters and seeds
    pub fn build_catalog(&self) -> FlowResult<DataCatalog> {
        let mut catalog =
            DataCatalog::new().with_auto_create(self.catalog.auto_create_intermediates);

        if !self.parameters.is_empty() {
            catalog.add_parameters(Value::Object(self.parameters.clone()))?;
        }
        // Seeds are inputs, registered whether or not intermediates auto-create
        for (name, value) in &self.seeds {
            catalog.add(name, Arc::new(MemoryDataset::with_value(value.clone())), true)?;
        }

        Ok(catalog)
    }
}

/// Parse `name=<value>`
///
/// The value is read as JSON; anything that is not valid JSON is taken as a
/// plain string.
pub fn parse_seed(seed: &str) -> FlowResult<(String, Value)> {
    let (name, raw) = seed.split_once('=').ok_or_else(|| FlowError::InvalidSeed {
        seed: seed.to_string(),
        reason: "expected name=value".into(),
    })?;

    let name = name.trim();
    if name.is_empty() {
        return Err(FlowError::InvalidSeed {
            seed: seed.to_string(),
            reason: "dataset name is empty".into(),
        });
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}
