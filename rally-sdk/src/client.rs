//! The Rally WSAPI client.
//!
//! All operations speak JSON over HTTPS to the WSAPI v2.0 surface. Rally's
//! quirk of reporting field-level failures inside a 200 response is handled
//! here: envelope `Errors` surface as `RallyError::Wsapi`, never as a
//! silently empty result.

use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::artifacts::{
    ArtifactType, CreateResponse, OperationResponse, QueryResponse, QueryResultPage, QuerySpec,
    ResultEnvelope,
};
use crate::config::RallyConfig;
use crate::error::{RallyError, Result};
use crate::metrics;

const USER_AGENT: &str = concat!("rally-bridge/", env!("CARGO_PKG_VERSION"), " (rally-sdk)");

/// Client for one Rally instance.
pub struct RallyClient {
    http: reqwest::Client,
    config: RallyConfig,
}

impl RallyClient {
    /// Build a client from validated configuration.
    pub fn new(config: RallyConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let mut value = HeaderValue::from_str(api_key).map_err(|_| {
                RallyError::Configuration(
                    "API key contains characters not allowed in a header".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert("ZSESSIONID", value);
        } else if let (Some(username), Some(password)) = (&config.username, &config.password) {
            let token = BASE64.encode(format!("{username}:{password}"));
            let mut value = HeaderValue::from_str(&format!("Basic {token}")).map_err(|_| {
                RallyError::Configuration(
                    "credentials contain characters not allowed in a header".to_string(),
                )
            })?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .build()
            .map_err(|e| RallyError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &RallyConfig {
        &self.config
    }

    /// Create an artifact from external-convention `fields`.
    /// Returns the created object as Rally echoes it back.
    pub async fn create(&self, artifact: ArtifactType, fields: Value) -> Result<Value> {
        let url = self.endpoint(&[artifact.wsapi_path(), "create"]);
        let body = json!({ artifact.wsapi_element(): fields });
        debug!(artifact = artifact.tool_name(), %url, "creating artifact");

        let parsed: CreateResponse = self.post_json(&url, &body, &self.common_params()).await?;
        self.unwrap_envelope(parsed.create_result, "create")
    }

    /// Read one artifact by object id.
    pub async fn get(
        &self,
        artifact: ArtifactType,
        object_id: &str,
        fetch: Option<&[String]>,
    ) -> Result<Value> {
        let url = self.endpoint(&[artifact.wsapi_path(), object_id]);
        let mut params = self.common_params();
        params.push(("fetch".to_string(), fetch_param(fetch)));
        debug!(artifact = artifact.tool_name(), %url, "reading artifact");

        let response = self.send(self.http.get(&url).query(&params)).await?;
        let raw: Value = self.read_json(response, None).await?;

        // A read of a missing or inaccessible object comes back as an
        // OperationResult envelope instead of the element.
        if let Some(result) = raw.get("OperationResult") {
            let envelope: ResultEnvelope = serde_json::from_value(result.clone())?;
            return self.unwrap_envelope(envelope, "read");
        }
        raw.get(artifact.wsapi_element()).cloned().ok_or_else(|| {
            RallyError::Decode(format!(
                "response missing the {} element",
                artifact.wsapi_element()
            ))
        })
    }

    /// Update an artifact with external-convention `fields`.
    /// Returns the updated object.
    pub async fn update(
        &self,
        artifact: ArtifactType,
        object_id: &str,
        fields: Value,
    ) -> Result<Value> {
        let url = self.endpoint(&[artifact.wsapi_path(), object_id]);
        let body = json!({ artifact.wsapi_element(): fields });
        debug!(artifact = artifact.tool_name(), %url, "updating artifact");

        let parsed: OperationResponse = self.post_json(&url, &body, &self.common_params()).await?;
        self.unwrap_envelope(parsed.operation_result, "update")
    }

    /// Delete an artifact by object id.
    pub async fn delete(&self, artifact: ArtifactType, object_id: &str) -> Result<()> {
        let url = self.endpoint(&[artifact.wsapi_path(), object_id]);
        debug!(artifact = artifact.tool_name(), %url, "deleting artifact");

        let response = self
            .send(self.http.delete(&url).query(&self.common_params()))
            .await?;
        let parsed: OperationResponse = self.read_json(response, None).await?;
        self.unwrap_envelope(parsed.operation_result, "delete")?;
        Ok(())
    }

    /// Run a query and return one page of results.
    pub async fn query(&self, artifact: ArtifactType, spec: &QuerySpec) -> Result<QueryResultPage> {
        let url = self.endpoint(&[artifact.wsapi_path()]);
        let mut params = self.common_params();
        if let Some(expression) = spec.expression() {
            params.push(("query".to_string(), expression));
        }
        params.push(("fetch".to_string(), fetch_param(spec.fetch.as_deref())));
        params.push((
            "pagesize".to_string(),
            spec.page_size.unwrap_or(self.config.page_size).to_string(),
        ));
        params.push(("start".to_string(), spec.start.unwrap_or(1).to_string()));
        if let Some(order) = &spec.order {
            params.push(("order".to_string(), order.clone()));
        }
        if let Some(project) = &self.config.project {
            params.push(("project".to_string(), project.clone()));
        }
        debug!(artifact = artifact.tool_name(), %url, "querying artifacts");

        let response = self.send(self.http.get(&url).query(&params)).await?;
        let parsed: QueryResponse = self.read_json(response, None).await?;
        let envelope = parsed.query_result;

        for warning in &envelope.warnings {
            warn!(operation = "query", warning = %warning, "Rally warning");
        }
        if !envelope.errors.is_empty() {
            return Err(RallyError::Wsapi {
                messages: envelope.errors,
            });
        }
        Ok(envelope.into())
    }

    fn endpoint(&self, segments: &[&str]) -> String {
        format!("{}/{}", self.config.base_url, segments.join("/"))
    }

    fn common_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(workspace) = &self.config.workspace {
            params.push(("workspace".to_string(), workspace.clone()));
        }
        params
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        url: &str,
        body: &Value,
        params: &[(String, String)],
    ) -> Result<T> {
        let payload =
            serde_json::to_vec(body).map_err(|e| RallyError::Decode(e.to_string()))?;
        let bytes_sent = payload.len() as u64;
        let request = self
            .http
            .post(url)
            .query(params)
            .header(header::CONTENT_TYPE, "application/json")
            .body(payload);
        let response = self.send(request).await?;
        self.read_json(response, Some(bytes_sent)).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        match request.send().await {
            Ok(response) => Ok(response),
            Err(err) => {
                metrics::record_request(false, None, None);
                Err(RallyError::from(err))
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
        bytes_sent: Option<u64>,
    ) -> Result<T> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.ok().filter(|body| !body.is_empty());
            metrics::record_request(false, bytes_sent, None);
            return Err(RallyError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = match response.bytes().await {
            Ok(bytes) => bytes,
            Err(err) => {
                metrics::record_request(false, bytes_sent, None);
                return Err(RallyError::from(err));
            }
        };
        metrics::record_request(true, bytes_sent, Some(bytes.len() as u64));
        serde_json::from_slice(&bytes).map_err(|e| RallyError::Decode(e.to_string()))
    }

    fn unwrap_envelope(&self, envelope: ResultEnvelope, operation: &str) -> Result<Value> {
        for warning in &envelope.warnings {
            warn!(operation, warning = %warning, "Rally warning");
        }
        if !envelope.errors.is_empty() {
            return Err(RallyError::Wsapi {
                messages: envelope.errors,
            });
        }
        Ok(envelope.object.unwrap_or(Value::Null))
    }
}

fn fetch_param(fetch: Option<&[String]>) -> String {
    match fetch {
        Some(fields) if !fields.is_empty() => fields.join(","),
        _ => "true".to_string(),
    }
}
