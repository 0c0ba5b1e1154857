//! Artifact types, WSAPI result envelopes, and the query-expression
//! builder.
//!
//! Rally wraps every response in a named envelope (`CreateResult`,
//! `OperationResult`, `QueryResult`) and reports field-level problems in an
//! `Errors` array on an otherwise successful response. Envelope handling
//! lives here so the client only deals with unwrapped objects.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The work-tracking artifact kinds the bridge exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactType {
    Story,
    Defect,
    Task,
}

impl ArtifactType {
    pub const ALL: [ArtifactType; 3] = [ArtifactType::Story, ArtifactType::Defect, ArtifactType::Task];

    /// URL path segment in WSAPI routes.
    pub fn wsapi_path(&self) -> &'static str {
        match self {
            ArtifactType::Story => "hierarchicalrequirement",
            ArtifactType::Defect => "defect",
            ArtifactType::Task => "task",
        }
    }

    /// Element name wrapping request and response bodies.
    pub fn wsapi_element(&self) -> &'static str {
        match self {
            ArtifactType::Story => "HierarchicalRequirement",
            ArtifactType::Defect => "Defect",
            ArtifactType::Task => "Task",
        }
    }

    /// Singular name used in tool identifiers.
    pub fn tool_name(&self) -> &'static str {
        match self {
            ArtifactType::Story => "story",
            ArtifactType::Defect => "defect",
            ArtifactType::Task => "task",
        }
    }

    /// Plural name used in query tool identifiers.
    pub fn tool_name_plural(&self) -> &'static str {
        match self {
            ArtifactType::Story => "stories",
            ArtifactType::Defect => "defects",
            ArtifactType::Task => "tasks",
        }
    }
}

/// Envelope of create, update, and delete responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResultEnvelope {
    #[serde(default, rename = "Errors")]
    pub errors: Vec<String>,
    #[serde(default, rename = "Warnings")]
    pub warnings: Vec<String>,
    #[serde(rename = "Object")]
    pub object: Option<Value>,
}

/// Envelope of query responses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryEnvelope {
    #[serde(default, rename = "Errors")]
    pub errors: Vec<String>,
    #[serde(default, rename = "Warnings")]
    pub warnings: Vec<String>,
    #[serde(default, rename = "TotalResultCount")]
    pub total_result_count: u64,
    #[serde(default, rename = "StartIndex")]
    pub start_index: u64,
    #[serde(default, rename = "PageSize")]
    pub page_size: u64,
    #[serde(default, rename = "Results")]
    pub results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateResponse {
    #[serde(rename = "CreateResult")]
    pub create_result: ResultEnvelope,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OperationResponse {
    #[serde(rename = "OperationResult")]
    pub operation_result: ResultEnvelope,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(rename = "QueryResult")]
    pub query_result: QueryEnvelope,
}

/// One page of query results, already unwrapped.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResultPage {
    pub total_result_count: u64,
    pub start_index: u64,
    pub page_size: u64,
    pub results: Vec<Value>,
}

impl From<QueryEnvelope> for QueryResultPage {
    fn from(envelope: QueryEnvelope) -> Self {
        Self {
            total_result_count: envelope.total_result_count,
            start_index: envelope.start_index,
            page_size: envelope.page_size,
            results: envelope.results,
        }
    }
}

/// Builder for Rally query expressions and paging parameters.
///
/// Clauses render as Rally's parenthesized form and AND-chain left to
/// right: `((A = 1) AND (B = 2))`.
#[derive(Debug, Clone, Default)]
pub struct QuerySpec {
    clauses: Vec<String>,
    pub fetch: Option<Vec<String>>,
    pub page_size: Option<u32>,
    pub start: Option<u32>,
    pub order: Option<String>,
}

impl QuerySpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one `(Field operator value)` clause.
    pub fn filter(
        mut self,
        field: impl AsRef<str>,
        operator: impl AsRef<str>,
        value: impl AsRef<str>,
    ) -> Self {
        self.clauses.push(format!(
            "({} {} {})",
            field.as_ref(),
            operator.as_ref(),
            literal(value.as_ref())
        ));
        self
    }

    /// Restrict the attributes Rally returns.
    pub fn fetch(mut self, fields: Vec<String>) -> Self {
        self.fetch = Some(fields);
        self
    }

    /// Page size for this query.
    pub fn page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// 1-based start index for this query.
    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// Sort order, e.g. `Rank ASC`.
    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }

    /// The combined query expression, if any clauses were added.
    pub fn expression(&self) -> Option<String> {
        let mut clauses = self.clauses.iter();
        let first = clauses.next()?.clone();
        Some(clauses.fold(first, |acc, clause| format!("({acc} AND {clause})")))
    }
}

/// Quote a literal when Rally's parser needs it: embedded whitespace
/// requires double quotes, bare numbers and refs do not.
fn literal(value: &str) -> String {
    if value.is_empty() || value.contains(char::is_whitespace) {
        format!("\"{value}\"")
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wsapi_names_line_up() {
        assert_eq!(ArtifactType::Story.wsapi_path(), "hierarchicalrequirement");
        assert_eq!(ArtifactType::Story.wsapi_element(), "HierarchicalRequirement");
        assert_eq!(ArtifactType::Defect.tool_name_plural(), "defects");
    }

    #[test]
    fn single_clause_stays_parenthesized() {
        let spec = QuerySpec::new().filter("FormattedID", "=", "US1234");
        assert_eq!(spec.expression().unwrap(), "(FormattedID = US1234)");
    }

    #[test]
    fn clauses_and_chain_left_to_right() {
        let spec = QuerySpec::new()
            .filter("ScheduleState", "=", "Defined")
            .filter("PlanEstimate", ">", "3");
        assert_eq!(
            spec.expression().unwrap(),
            "((ScheduleState = Defined) AND (PlanEstimate > 3))"
        );

        let triple = QuerySpec::new()
            .filter("A", "=", "1")
            .filter("B", "=", "2")
            .filter("C", "=", "3");
        assert_eq!(
            triple.expression().unwrap(),
            "(((A = 1) AND (B = 2)) AND (C = 3))"
        );
    }

    #[test]
    fn values_with_spaces_are_quoted() {
        let spec = QuerySpec::new().filter("Name", "contains", "login page");
        assert_eq!(spec.expression().unwrap(), "(Name contains \"login page\")");
    }

    #[test]
    fn no_clauses_means_no_expression() {
        assert!(QuerySpec::new().expression().is_none());
    }

    #[test]
    fn envelopes_deserialize_with_defaults() {
        let raw = json!({
            "QueryResult": {
                "TotalResultCount": 2,
                "StartIndex": 1,
                "PageSize": 20,
                "Results": [{"FormattedID": "US1"}, {"FormattedID": "US2"}]
            }
        });
        let parsed: QueryResponse = serde_json::from_value(raw).unwrap();
        assert!(parsed.query_result.errors.is_empty());
        assert_eq!(parsed.query_result.results.len(), 2);
    }
}
