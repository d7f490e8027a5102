//! HTTP transport tests using the actix-web test harness.

use actix_web::{App, http::StatusCode, test, web};
use demo_mcp_server::core::config::ServerConfig;
use demo_mcp_server::core::server::{AppState, configure_routes, initialize_tools};
use serde_json::{Value, json};

fn config() -> ServerConfig {
    ServerConfig {
        name: "http-test".to_string(),
        dice_seed: Some(7),
        ..ServerConfig::default()
    }
}

macro_rules! test_app {
    () => {{
        let config = config();
        test::init_service(
            App::new()
                .app_data(web::Data::new(AppState::from(&config)))
                .app_data(web::Data::from(initialize_tools(&config)))
                .configure(configure_routes),
        )
        .await
    }};
}

#[actix_rt::test]
async fn health_reports_service_name() {
    let app = test_app!();

    for uri in ["/health", "/"] {
        let req = test::TestRequest::get().uri(uri).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!({"status": "ok", "service": "http-test"}));
    }
}

#[actix_rt::test]
async fn post_mcp_dispatches_tool_calls() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({
            "jsonrpc": "2.0",
            "id": 9,
            "method": "tools/call",
            "params": { "name": "add_numbers", "arguments": { "a": 2.5, "b": 3.5 } }
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["id"], 9);
    assert_eq!(body["result"]["isError"], false);
    assert_eq!(body["result"]["content"][0]["text"], r#"{"result":6.0}"#);
}

#[actix_rt::test]
async fn root_post_lists_tools() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/")
        .set_json(json!({"jsonrpc": "2.0", "id": "l", "method": "tools/list"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    let names: Vec<&str> = body["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["roll_dice", "add_numbers"]);
}

#[actix_rt::test]
async fn notifications_are_accepted_without_body() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .set_json(json!({"jsonrpc": "2.0", "method": "notifications/initialized"}))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

#[actix_rt::test]
async fn malformed_body_is_rejected() {
    let app = test_app!();

    let req = test::TestRequest::post()
        .uri("/mcp")
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
