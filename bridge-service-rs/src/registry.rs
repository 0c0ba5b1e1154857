//! Tool registry.
//!
//! Central lookup from tool name to implementation. Tools are registered at
//! startup and never removed while the server runs.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::protocol::{ToolDescriptor, ToolResponse};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    NotFound(String),

    #[error("tool already registered: {0}")]
    AlreadyRegistered(String),
}

/// One callable tool.
///
/// `execute` never fails at the trait level: tool failures are rendered
/// into the response with `isError` set, so the protocol layer needs no
/// error handling of its own.
#[async_trait]
pub trait Tool: Send + Sync {
    fn descriptor(&self) -> ToolDescriptor;

    async fn execute(&self, arguments: Value) -> ToolResponse;
}

pub struct ToolRegistry {
    tools: RwLock<HashMap<String, Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
        }
    }

    /// Register a tool under its descriptor name.
    pub fn register(&self, tool: Arc<dyn Tool>) -> Result<(), ToolError> {
        let name = tool.descriptor().name;
        let mut tools = self.tools.write().unwrap();
        if tools.contains_key(&name) {
            return Err(ToolError::AlreadyRegistered(name));
        }
        info!(tool = %name, "tool registered");
        tools.insert(name, tool);
        Ok(())
    }

    /// Look up a tool by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        let tools = self.tools.read().unwrap();
        tools
            .get(name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// All descriptors, sorted by name for a stable listing.
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        let tools = self.tools.read().unwrap();
        let mut descriptors: Vec<ToolDescriptor> =
            tools.values().map(|tool| tool.descriptor()).collect();
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        descriptors
    }
}
