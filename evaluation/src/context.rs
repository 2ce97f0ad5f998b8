//! Telemetry context for the current operation
//!
//! Collects string properties that end up on the operation's trace.

use parking_lot::Mutex;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct EventContext {
    operation: String,
    properties: Mutex<HashMap<String, String>>,
}

impl EventContext {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            properties: Mutex::new(HashMap::new()),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn add_property(&self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.lock().insert(key.into(), value.into());
    }

    pub fn add_properties(&self, properties: impl IntoIterator<Item = (String, String)>) {
        self.properties.lock().extend(properties);
    }

    pub fn property(&self, key: &str) -> Option<String> {
        self.properties.lock().get(key).cloned()
    }

    /// Snapshot of all properties recorded so far
    pub fn properties(&self) -> HashMap<String, String> {
        self.properties.lock().clone()
    }
}
