//! Per-execution scratch context.
//!
//! One `RunContext` is created per inbound message, threaded by reference
//! through every step of that execution, and dropped when control returns
//! to the caller. Nothing in it is persisted; durable state lives in
//! thread memory. Keeping it explicit (instead of a process-global map)
//! confines transient values to the request that produced them.

use std::collections::HashMap;

use crate::domain::foundation::{ResourceId, ThreadId};
use crate::domain::insurance::AuthToken;

/// Transient values shared between the steps of one execution.
#[derive(Debug, Clone)]
pub struct RunContext {
    thread_id: ThreadId,
    resource_id: ResourceId,
    trace_id: String,
    /// Bearer token cached across steps; restored from thread memory at
    /// entry and written back when a step refreshes it.
    authentication: Option<AuthToken>,
    values: HashMap<String, serde_json::Value>,
}

impl RunContext {
    /// Creates a context for one execution.
    pub fn new(thread_id: ThreadId, resource_id: ResourceId, trace_id: impl Into<String>) -> Self {
        Self {
            thread_id,
            resource_id,
            trace_id: trace_id.into(),
            authentication: None,
            values: HashMap::new(),
        }
    }

    /// Thread this execution belongs to.
    pub fn thread_id(&self) -> &ThreadId {
        &self.thread_id
    }

    /// Resource (end user) this execution belongs to.
    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    /// Trace id for log correlation.
    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    /// Currently cached bearer token, if any.
    pub fn authentication(&self) -> Option<&AuthToken> {
        self.authentication.as_ref()
    }

    /// Stores a refreshed bearer token.
    pub fn set_authentication(&mut self, token: Option<AuthToken>) {
        self.authentication = token;
    }

    /// Reads an ad-hoc transient value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.values.get(key)
    }

    /// Stores an ad-hoc transient value.
    pub fn set(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.values.insert(key.into(), value);
    }

    /// Removes an ad-hoc transient value.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.values.remove(key)
    }
}
