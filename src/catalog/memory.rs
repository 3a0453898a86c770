// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 nodeflow contributors

//! Volatile in-memory dataset
//!
//! Holds a single value for the lifetime of the process. This is the handle
//! the catalog creates implicitly for pipeline intermediates.

use serde_json::Value;
use std::sync::RwLock;

use super::{Dataset, DatasetError};

/// In-memory dataset handle
#[derive(Debug, Default)]
pub struct MemoryDataset {
    value: RwLock<Option<Value>>,
}

impl MemoryDataset {
    /// Create an empty dataset
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a dataset that already holds `value`
    pub fn with_value(value: Value) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }
}

impl Dataset for MemoryDataset {
    fn load(&self) -> Result<Value, DatasetError> {
        let guard = self.value.read().map_err(|_| DatasetError::Poisoned)?;
        // Callers get their own copy; mutating it never changes the stored value
        guard.clone().ok_or(DatasetError::Empty)
    }

    fn save(&self, value: Value) -> Result<(), DatasetError> {
        let mut guard = self.value.write().map_err(|_| DatasetError::Poisoned)?;
        *guard = Some(value);
        Ok(())
    }

    fn exists(&self) -> bool {
        self.value.read().map(|v| v.is_some()).unwrap_or(false)
    }

    fn release(&self) {
        if let Ok(mut guard) = self.value.write() {
            *guard = None;
        }
    }

    fn describe(&self) -> String {
        "MemoryDataset".to_string()
    }
}
