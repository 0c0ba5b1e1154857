//! Artifact tools.
//!
//! One generic tool implementation covers every artifact kind and
//! operation; registration enumerates the product. Tool arguments arrive in
//! the internal kebab-case convention, are transformed to Rally's external
//! convention on the way out, and every response transforms back before it
//! reaches the agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::error;

use error_handling_rs::{new_correlation_id, ErrorClassifier, OperationContext, RawFailure};
use rally_sdk::{ArtifactType, QuerySpec, RallyClient, RallyError};

use crate::protocol::{ToolDescriptor, ToolResponse};
use crate::recovery;
use crate::registry::{Tool, ToolError, ToolRegistry};

/// The operations exposed per artifact kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactOperation {
    Create,
    Get,
    Update,
    Delete,
    Query,
}

impl ArtifactOperation {
    pub const ALL: [ArtifactOperation; 5] = [
        ArtifactOperation::Create,
        ArtifactOperation::Get,
        ArtifactOperation::Update,
        ArtifactOperation::Delete,
        ArtifactOperation::Query,
    ];

    fn verb(&self) -> &'static str {
        match self {
            ArtifactOperation::Create => "create",
            ArtifactOperation::Get => "get",
            ArtifactOperation::Update => "update",
            ArtifactOperation::Delete => "delete",
            ArtifactOperation::Query => "query",
        }
    }
}

/// A failure inside one tool invocation, before classification.
#[derive(Debug)]
enum ToolFailure {
    Arguments(String),
    Rally(RallyError),
}

impl ToolFailure {
    fn into_raw(self) -> RawFailure {
        match self {
            // Argument problems are schema violations, not remote failures.
            ToolFailure::Arguments(message) => RawFailure::Exception {
                name: Some("SchemaValidationError".to_string()),
                message,
            },
            ToolFailure::Rally(err) => err.to_raw_failure(),
        }
    }
}

impl From<RallyError> for ToolFailure {
    fn from(err: RallyError) -> Self {
        ToolFailure::Rally(err)
    }
}

/// One artifact operation, callable as an MCP tool.
pub struct ArtifactTool {
    artifact: ArtifactType,
    operation: ArtifactOperation,
    client: Arc<RallyClient>,
    classifier: ErrorClassifier,
}

impl ArtifactTool {
    pub fn new(
        artifact: ArtifactType,
        operation: ArtifactOperation,
        client: Arc<RallyClient>,
        classifier: ErrorClassifier,
    ) -> Self {
        Self {
            artifact,
            operation,
            client,
            classifier,
        }
    }

    pub fn name(&self) -> String {
        match self.operation {
            ArtifactOperation::Query => {
                format!("query_{}", self.artifact.tool_name_plural())
            }
            other => format!("{}_{}", other.verb(), self.artifact.tool_name()),
        }
    }

    fn description(&self) -> String {
        let kind = self.artifact.tool_name();
        match self.operation {
            ArtifactOperation::Create => format!(
                "Create a new {kind} in the tracking workspace. Field names use kebab-case \
                 (e.g. name, description, plan-estimate)."
            ),
            ArtifactOperation::Get => {
                format!("Read one {kind} by its object id.")
            }
            ArtifactOperation::Update => {
                format!("Update fields of an existing {kind}, addressed by object id.")
            }
            ArtifactOperation::Delete => {
                format!("Delete a {kind} by its object id. This cannot be undone.")
            }
            ArtifactOperation::Query => format!(
                "Query {} with filter clauses that AND together. Field names use kebab-case.",
                self.artifact.tool_name_plural()
            ),
        }
    }

    fn input_schema(&self) -> Value {
        let fields_property = json!({
            "type": "object",
            "description": "Artifact fields in the kebab-case convention"
        });
        let object_id_property = json!({
            "type": "string",
            "description": "The artifact's object id"
        });
        let fetch_property = json!({
            "type": "array",
            "items": {"type": "string"},
            "description": "Kebab-case field names to fetch; all fields when omitted"
        });

        match self.operation {
            ArtifactOperation::Create => json!({
                "type": "object",
                "properties": {"fields": fields_property},
                "required": ["fields"]
            }),
            ArtifactOperation::Get => json!({
                "type": "object",
                "properties": {
                    "object-id": object_id_property,
                    "fetch": fetch_property
                },
                "required": ["object-id"]
            }),
            ArtifactOperation::Update => json!({
                "type": "object",
                "properties": {
                    "object-id": object_id_property,
                    "fields": fields_property
                },
                "required": ["object-id", "fields"]
            }),
            ArtifactOperation::Delete => json!({
                "type": "object",
                "properties": {"object-id": object_id_property},
                "required": ["object-id"]
            }),
            ArtifactOperation::Query => json!({
                "type": "object",
                "properties": {
                    "where": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "field": {"type": "string"},
                                "operator": {"type": "string"},
                                "value": {}
                            },
                            "required": ["field", "operator", "value"]
                        },
                        "description": "Filter clauses, AND-ed together"
                    },
                    "fetch": fetch_property,
                    "page-size": {"type": "integer"},
                    "start": {"type": "integer"},
                    "order": {"type": "string"}
                }
            }),
        }
    }

    async fn run(&self, arguments: &Value) -> Result<Value, ToolFailure> {
        match self.operation {
            ArtifactOperation::Create => {
                let fields = require_object(arguments, "fields")?;
                let external = transform_rs::to_external(&fields);
                let created = self.client.create(self.artifact, external).await?;
                Ok(transform_rs::to_internal(&created))
            }
            ArtifactOperation::Get => {
                let object_id = require_string(arguments, "object-id")?;
                let fetch = optional_fetch(arguments)?;
                let found = self
                    .client
                    .get(self.artifact, &object_id, fetch.as_deref())
                    .await?;
                Ok(transform_rs::to_internal(&found))
            }
            ArtifactOperation::Update => {
                let object_id = require_string(arguments, "object-id")?;
                let fields = require_object(arguments, "fields")?;
                let external = transform_rs::to_external(&fields);
                let updated = self
                    .client
                    .update(self.artifact, &object_id, external)
                    .await?;
                Ok(transform_rs::to_internal(&updated))
            }
            ArtifactOperation::Delete => {
                let object_id = require_string(arguments, "object-id")?;
                self.client.delete(self.artifact, &object_id).await?;
                Ok(json!({"deleted": true, "object-id": object_id}))
            }
            ArtifactOperation::Query => {
                let spec = build_query_spec(arguments)?;
                let page = self.client.query(self.artifact, &spec).await?;
                Ok(json!({
                    "total-result-count": page.total_result_count,
                    "start-index": page.start_index,
                    "page-size": page.page_size,
                    "results": page
                        .results
                        .iter()
                        .map(transform_rs::to_internal)
                        .collect::<Vec<Value>>(),
                }))
            }
        }
    }
}

#[async_trait]
impl Tool for ArtifactTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: self.input_schema(),
        }
    }

    async fn execute(&self, arguments: Value) -> ToolResponse {
        let context = OperationContext::new(self.name())
            .correlation_id(new_correlation_id())
            .endpoint(self.artifact.wsapi_path());

        let operation = || {
            let args = arguments.clone();
            async move { self.run(&args).await.map_err(ToolFailure::into_raw) }
        };

        match recovery::run_with_recovery(&self.classifier, &context, operation).await {
            Ok(value) => {
                let text = serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string());
                ToolResponse::text(text)
            }
            Err(record) => {
                // Operator-facing detail goes to the log; the agent sees the
                // fixed template and the correlation id only.
                error!(
                    tool = %record.context.operation,
                    category = %record.category,
                    severity = %record.severity,
                    correlation_id = %record.correlation_id,
                    source_error_code = record.source_error_code.as_deref().unwrap_or("-"),
                    details = record.details.as_deref().unwrap_or("-"),
                    "tool invocation failed"
                );
                ToolResponse::error(format!(
                    "{} (correlation id: {})",
                    record.message, record.correlation_id
                ))
            }
        }
    }
}

/// Register every artifact tool on `registry`.
pub fn register_artifact_tools(
    registry: &ToolRegistry,
    client: Arc<RallyClient>,
    classifier: ErrorClassifier,
) -> Result<(), ToolError> {
    for artifact in ArtifactType::ALL {
        for operation in ArtifactOperation::ALL {
            registry.register(Arc::new(ArtifactTool::new(
                artifact,
                operation,
                client.clone(),
                classifier.clone(),
            )))?;
        }
    }
    Ok(())
}

fn require_object(arguments: &Value, key: &str) -> Result<Value, ToolFailure> {
    match arguments.get(key) {
        Some(value) if value.is_object() => Ok(value.clone()),
        Some(_) => Err(ToolFailure::Arguments(format!("'{key}' must be an object"))),
        None => Err(ToolFailure::Arguments(format!(
            "missing required argument '{key}'"
        ))),
    }
}

fn require_string(arguments: &Value, key: &str) -> Result<String, ToolFailure> {
    match arguments.get(key) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(_) => Err(ToolFailure::Arguments(format!(
            "'{key}' must be a non-empty string"
        ))),
        None => Err(ToolFailure::Arguments(format!(
            "missing required argument '{key}'"
        ))),
    }
}

/// `fetch` lists arrive in the internal convention and go to Rally in the
/// external one.
fn optional_fetch(arguments: &Value) -> Result<Option<Vec<String>>, ToolFailure> {
    match arguments.get("fetch") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => {
            let mut fields = Vec::with_capacity(items.len());
            for item in items {
                match item.as_str() {
                    Some(name) => fields.push(transform_rs::field_name_to_external(name)),
                    None => {
                        return Err(ToolFailure::Arguments(
                            "'fetch' entries must be strings".to_string(),
                        ))
                    }
                }
            }
            Ok(Some(fields))
        }
        Some(_) => Err(ToolFailure::Arguments(
            "'fetch' must be an array of strings".to_string(),
        )),
    }
}

fn build_query_spec(arguments: &Value) -> Result<QuerySpec, ToolFailure> {
    let mut spec = QuerySpec::new();

    if let Some(clauses) = arguments.get("where") {
        let clauses = clauses.as_array().ok_or_else(|| {
            ToolFailure::Arguments("'where' must be an array of clauses".to_string())
        })?;
        for clause in clauses {
            let field = clause
                .get("field")
                .and_then(Value::as_str)
                .ok_or_else(|| ToolFailure::Arguments("clause 'field' must be a string".to_string()))?;
            let operator = clause
                .get("operator")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ToolFailure::Arguments("clause 'operator' must be a string".to_string())
                })?;
            let value = clause
                .get("value")
                .ok_or_else(|| ToolFailure::Arguments("clause 'value' is required".to_string()))?;
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            spec = spec.filter(transform_rs::field_name_to_external(field), operator, rendered);
        }
    }

    if let Some(fetch) = optional_fetch(arguments)? {
        spec = spec.fetch(fetch);
    }
    if let Some(size) = optional_u32(arguments, "page-size")? {
        spec = spec.page_size(size);
    }
    if let Some(start) = optional_u32(arguments, "start")? {
        spec = spec.start(start);
    }
    if let Some(order) = arguments.get("order").and_then(Value::as_str) {
        // The leading token is a field name; any direction suffix rides along.
        let mut parts = order.splitn(2, ' ');
        let field = parts.next().unwrap_or_default();
        let rest = parts.next();
        let external = transform_rs::field_name_to_external(field);
        spec = spec.order(match rest {
            Some(direction) => format!("{external} {direction}"),
            None => external,
        });
    }

    Ok(spec)
}

fn optional_u32(arguments: &Value, key: &str) -> Result<Option<u32>, ToolFailure> {
    match arguments.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|n| u32::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                ToolFailure::Arguments(format!("'{key}' must be a non-negative integer"))
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rally_sdk::RallyConfig;

    fn test_client() -> Arc<RallyClient> {
        let config = RallyConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            api_key: Some("_test".to_string()),
            ..RallyConfig::default()
        };
        Arc::new(RallyClient::new(config).unwrap())
    }

    fn tool(artifact: ArtifactType, operation: ArtifactOperation) -> ArtifactTool {
        ArtifactTool::new(artifact, operation, test_client(), ErrorClassifier::new())
    }

    #[test]
    fn tool_names_follow_the_verb_noun_pattern() {
        assert_eq!(tool(ArtifactType::Story, ArtifactOperation::Create).name(), "create_story");
        assert_eq!(tool(ArtifactType::Defect, ArtifactOperation::Get).name(), "get_defect");
        assert_eq!(tool(ArtifactType::Task, ArtifactOperation::Delete).name(), "delete_task");
        assert_eq!(tool(ArtifactType::Story, ArtifactOperation::Query).name(), "query_stories");
    }

    #[test]
    fn registration_yields_one_tool_per_artifact_operation() {
        let registry = ToolRegistry::new();
        register_artifact_tools(&registry, test_client(), ErrorClassifier::new()).unwrap();
        let descriptors = registry.descriptors();
        assert_eq!(
            descriptors.len(),
            ArtifactType::ALL.len() * ArtifactOperation::ALL.len()
        );
        assert!(descriptors.iter().any(|d| d.name == "query_defects"));
    }

    #[test]
    fn schemas_require_the_expected_arguments() {
        let create = tool(ArtifactType::Story, ArtifactOperation::Create).input_schema();
        assert_eq!(create["required"], json!(["fields"]));

        let update = tool(ArtifactType::Task, ArtifactOperation::Update).input_schema();
        assert_eq!(update["required"], json!(["object-id", "fields"]));
    }

    #[test]
    fn query_spec_builds_external_expressions() {
        let arguments = json!({
            "where": [
                {"field": "schedule-state", "operator": "=", "value": "Defined"},
                {"field": "plan-estimate", "operator": ">", "value": 3}
            ],
            "page-size": 10,
            "order": "formatted-id desc"
        });
        let spec = build_query_spec(&arguments).unwrap();
        assert_eq!(
            spec.expression().unwrap(),
            "((ScheduleState = Defined) AND (PlanEstimate > 3))"
        );
        assert_eq!(spec.page_size, Some(10));
        assert_eq!(spec.order.as_deref(), Some("FormattedID desc"));
    }

    #[test]
    fn fetch_names_are_converted_to_external() {
        let arguments = json!({"fetch": ["formatted-id", "plan-estimate", "metadata-ref"]});
        let fetch = optional_fetch(&arguments).unwrap().unwrap();
        assert_eq!(fetch, vec!["FormattedID", "PlanEstimate", "_ref"]);
    }

    #[tokio::test]
    async fn missing_arguments_fail_without_a_remote_call() {
        let tool = tool(ArtifactType::Story, ArtifactOperation::Create);
        let response = tool.execute(json!({})).await;
        assert!(response.is_error);
        let text = &response.content[0].text;
        assert!(text.contains("did not match the expected input schema"));
        assert!(text.contains("correlation id:"));
        // The raw argument detail stays out of the agent-facing message.
        assert!(!text.contains("missing required argument"));
    }
}
