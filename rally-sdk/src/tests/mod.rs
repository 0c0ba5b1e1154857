//! HTTP-level tests for the Rally client, against a wiremock double.

use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::artifacts::{ArtifactType, QuerySpec};
use crate::client::RallyClient;
use crate::config::RallyConfig;
use crate::error::RallyError;

fn config_for(server: &MockServer) -> RallyConfig {
    RallyConfig {
        base_url: server.uri(),
        api_key: Some("_testkey".to_string()),
        ..RallyConfig::default()
    }
}

#[tokio::test]
async fn create_posts_wrapped_fields_and_unwraps_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hierarchicalrequirement/create"))
        .and(header("ZSESSIONID", "_testkey"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CreateResult": {
                "Errors": [],
                "Warnings": [],
                "Object": {"FormattedID": "US1234", "ObjectID": 111, "Name": "Login page"}
            }
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let created = client
        .create(ArtifactType::Story, json!({"Name": "Login page"}))
        .await
        .unwrap();
    assert_eq!(created["FormattedID"], "US1234");
}

#[tokio::test]
async fn wsapi_errors_in_success_responses_surface() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/defect/create"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "CreateResult": {
                "Errors": ["Could not parse: Severity"],
                "Warnings": [],
                "Object": null
            }
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let err = client
        .create(ArtifactType::Defect, json!({"Severity": "Bogus"}))
        .await
        .unwrap_err();
    match err {
        RallyError::Wsapi { messages } => {
            assert_eq!(messages, vec!["Could not parse: Severity".to_string()]);
        }
        other => panic!("expected Wsapi error, got {other:?}"),
    }
}

#[tokio::test]
async fn get_unwraps_the_element_by_type_name() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/defect/222"))
        .and(query_param("fetch", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Defect": {"FormattedID": "DE17", "State": "Open"}
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let defect = client.get(ArtifactType::Defect, "222", None).await.unwrap();
    assert_eq!(defect["FormattedID"], "DE17");
}

#[tokio::test]
async fn get_of_missing_object_reports_wsapi_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/task/999"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "OperationResult": {"Errors": ["Cannot find object to read"], "Warnings": []}
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let err = client.get(ArtifactType::Task, "999", None).await.unwrap_err();
    assert!(matches!(err, RallyError::Wsapi { .. }));
}

#[tokio::test]
async fn update_posts_to_the_object_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/task/456"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "OperationResult": {
                "Errors": [],
                "Warnings": [],
                "Object": {"FormattedID": "TA7", "State": "Completed"}
            }
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let updated = client
        .update(ArtifactType::Task, "456", json!({"State": "Completed"}))
        .await
        .unwrap();
    assert_eq!(updated["State"], "Completed");
}

#[tokio::test]
async fn delete_succeeds_on_clean_operation_result() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/defect/333"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "OperationResult": {"Errors": [], "Warnings": []}
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    client.delete(ArtifactType::Defect, "333").await.unwrap();
}

#[tokio::test]
async fn query_sends_expression_and_paging_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hierarchicalrequirement"))
        .and(query_param("query", "(ScheduleState = Defined)"))
        .and(query_param("pagesize", "5"))
        .and(query_param("start", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResult": {
                "Errors": [],
                "Warnings": [],
                "TotalResultCount": 1,
                "StartIndex": 1,
                "PageSize": 5,
                "Results": [{"FormattedID": "US9"}]
            }
        })))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let spec = QuerySpec::new()
        .filter("ScheduleState", "=", "Defined")
        .page_size(5);
    let page = client.query(ArtifactType::Story, &spec).await.unwrap();
    assert_eq!(page.total_result_count, 1);
    assert_eq!(page.results[0]["FormattedID"], "US9");
}

#[tokio::test]
async fn http_failures_keep_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/defect/1"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance window"))
        .mount(&server)
        .await;

    let client = RallyClient::new(config_for(&server)).unwrap();
    let err = client.get(ArtifactType::Defect, "1", None).await.unwrap_err();
    match err {
        RallyError::Http { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body.as_deref(), Some("maintenance window"));
        }
        other => panic!("expected Http error, got {other:?}"),
    }
}

#[tokio::test]
async fn basic_auth_is_used_when_no_api_key_is_set() {
    let server = MockServer::start().await;
    // base64("user:pass")
    Mock::given(method("GET"))
        .and(path("/task/1"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "Task": {"FormattedID": "TA1"}
        })))
        .mount(&server)
        .await;

    let config = RallyConfig {
        base_url: server.uri(),
        username: Some("user".to_string()),
        password: Some("pass".to_string()),
        ..RallyConfig::default()
    };
    let client = RallyClient::new(config).unwrap();
    let task = client.get(ArtifactType::Task, "1", None).await.unwrap();
    assert_eq!(task["FormattedID"], "TA1");
}

#[tokio::test]
async fn workspace_ref_is_attached_when_configured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/hierarchicalrequirement"))
        .and(query_param("workspace", "/workspace/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "QueryResult": {
                "Errors": [], "Warnings": [],
                "TotalResultCount": 0, "StartIndex": 1, "PageSize": 20, "Results": []
            }
        })))
        .mount(&server)
        .await;

    let config = RallyConfig {
        base_url: server.uri(),
        api_key: Some("_k".to_string()),
        workspace: Some("/workspace/42".to_string()),
        ..RallyConfig::default()
    };
    let client = RallyClient::new(config).unwrap();
    let page = client
        .query(ArtifactType::Story, &QuerySpec::new())
        .await
        .unwrap();
    assert_eq!(page.total_result_count, 0);
}
