//! Published API description HTTP Handler Tests

use super::{build_test_router, create_test_config, get_json, TestAppState};
use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::Value;

#[tokio::test]
async fn test_api_docs_lists_registry_paths_only() {
    let app = build_test_router(TestAppState::new());

    let (status, body): (StatusCode, Option<Value>) = get_json(&app, "/v2/api-docs").await;

    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/oidc/api/orgs"));
    assert!(paths.contains_key("/x509/api/orgs"));
    assert!(paths.contains_key("/oidc/api/org/{short_name}/logo"));
    assert!(!paths.contains_key("/health"));
    assert!(!paths.contains_key("/v2/api-docs"));
}

#[tokio::test]
async fn test_api_docs_metadata() {
    let app = build_test_router(TestAppState::new());

    let (_, body): (StatusCode, Option<Value>) = get_json(&app, "/v2/api-docs").await;

    let info = &body.unwrap()["info"];
    assert_eq!(info["title"], "Maritime Cloud Identity Registry API");
    assert_eq!(info["version"], "0.0.1");
    assert_eq!(info["contact"]["email"], "info@maritimecloud.net");
}

#[tokio::test]
async fn test_api_docs_follow_configured_pattern() {
    let mut config = create_test_config();
    config.api_docs.path_pattern = "/x509/api/.*".to_string();
    config.api_docs.title = "Registry".to_string();
    let app = build_test_router(TestAppState::with_config(config));

    let (_, body): (StatusCode, Option<Value>) = get_json(&app, "/v2/api-docs").await;

    let body = body.unwrap();
    let paths = body["paths"].as_object().unwrap();
    assert!(!paths.is_empty());
    assert!(paths.keys().all(|p| p.starts_with("/x509/api/")));
    assert_eq!(body["info"]["title"], "Registry");
}

#[tokio::test]
async fn test_api_docs_update_requires_full_attribute_list() {
    let app = build_test_router(TestAppState::new());

    let (_, body): (StatusCode, Option<Value>) = get_json(&app, "/v2/api-docs").await;

    let put = &body.unwrap()["paths"]["/oidc/api/org/{short_name}"]["put"];
    let text = format!(
        "{} {}",
        put["summary"].as_str().unwrap_or_default(),
        put["description"].as_str().unwrap_or_default()
    );
    assert!(text.contains("identityProviderAttributes"));
    assert!(text.contains("always resend the complete list"));
}
