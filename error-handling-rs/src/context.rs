//! # Operation Context
//!
//! What the caller knows about the operation at the classification call
//! site. The classifier never infers any of this from environment state.

use uuid::Uuid;

/// Generate a fresh opaque correlation id.
pub fn new_correlation_id() -> String {
    Uuid::new_v4().to_string()
}

/// Caller-supplied context for one classification.
///
/// The correlation id, when present, threads every diagnostic emitted for
/// one logical operation (including retries) through logs and history.
/// When absent, a fresh one is generated at classification time.
#[derive(Debug, Clone, Default)]
pub struct OperationContext {
    pub operation: String,
    pub correlation_id: Option<String>,
    pub endpoint: Option<String>,
}

impl OperationContext {
    /// Context for the named operation.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            correlation_id: None,
            endpoint: None,
        }
    }

    /// Attach an existing correlation id.
    pub fn correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Attach the target endpoint.
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let ctx = OperationContext::new("create_story")
            .correlation_id("abc")
            .endpoint("hierarchicalrequirement");
        assert_eq!(ctx.operation, "create_story");
        assert_eq!(ctx.correlation_id.as_deref(), Some("abc"));
        assert_eq!(ctx.endpoint.as_deref(), Some("hierarchicalrequirement"));
    }

    #[test]
    fn correlation_ids_are_unique() {
        assert_ne!(new_correlation_id(), new_correlation_id());
    }
}
