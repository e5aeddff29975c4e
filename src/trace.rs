// src/trace.rs

//! Optional debug sink for the colliders.
//!
//! Every collider entry point takes an `Option<&mut Trace>`. When one is
//! supplied the collider appends JSON records describing what it saw and
//! decided; when it is `None` nothing is recorded. Results never depend on
//! whether a trace is attached.

use anyhow::{Context, Result};
use serde_json::Value;

/// Append-only list of JSON trace records.
#[derive(Debug, Clone, Default)]
pub struct Trace {
    records: Vec<Value>,
}

impl Trace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Value) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Last record whose `"event"` field equals `event`.
    pub fn last_event(&self, event: &str) -> Option<&Value> {
        self.records
            .iter()
            .rev()
            .find(|r| r.get("event").and_then(Value::as_str) == Some(event))
    }

    /// Drains the collected records.
    pub fn take(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.records)
    }

    pub fn to_json(&self) -> Value {
        Value::Array(self.records.clone())
    }

    pub fn to_string_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.records).context("Failed to serialize collision trace")
    }
}

/// Appends `record` to `trace` if there is one.
pub(crate) fn emit(trace: Option<&mut Trace>, record: impl FnOnce() -> Value) {
    if let Some(t) = trace {
        t.push(record());
    }
}
