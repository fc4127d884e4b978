use std::time::Duration;

use serde_json::json;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{body_json, header, method, path, query_param},
};

use sieve_providers::{EngineClient, Error};

fn engine(url: &str, api_key: Option<&str>) -> EngineClient {
	let cfg = sieve_config::Engine {
		url: format!("{url}/"),
		index: "gitlab".to_string(),
		api_key: api_key.map(str::to_string),
		count_timeout_ms: 1_000,
		search_timeout_ms: 30_000,
	};

	EngineClient::new(&cfg).expect("Failed to build engine client.")
}

#[tokio::test]
async fn search_sends_routing_and_timeout() {
	let server = MockServer::start().await;
	let body = json!({ "query": { "match_all": { "_name": "issue:match_all" } }, "size": 0 });

	Mock::given(method("POST"))
		.and(path("/gitlab/_search"))
		.and(query_param("routing", "project_1,project_2"))
		.and(query_param("timeout", "1000ms"))
		.and(header("authorization", "ApiKey secret"))
		.and(body_json(body.clone()))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"took": 2,
			"timed_out": false,
			"hits": { "total": { "value": 42, "relation": "eq" }, "hits": [] }
		})))
		.expect(1)
		.mount(&server)
		.await;

	let response = engine(&server.uri(), Some("secret"))
		.search(&body, Some("project_1,project_2"), Duration::from_secs(1))
		.await
		.expect("Search failed.");

	assert_eq!(response.total(), 42);
}

#[tokio::test]
async fn engine_side_timeout_is_reported() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/gitlab/_search"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"timed_out": true,
			"hits": { "total": { "value": 3, "relation": "gte" }, "hits": [] }
		})))
		.mount(&server)
		.await;

	let err = engine(&server.uri(), None)
		.search(&json!({}), None, Duration::from_millis(250))
		.await
		.expect_err("Expected a timeout.");

	assert!(err.is_timeout());
	assert!(matches!(err, Error::Timeout { timeout_ms: 250 }));
}

#[tokio::test]
async fn slow_engine_times_out_on_the_client() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/gitlab/_search"))
		.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
		.mount(&server)
		.await;

	let err = engine(&server.uri(), None)
		.search(&json!({}), None, Duration::from_millis(100))
		.await
		.expect_err("Expected a timeout.");

	assert!(err.is_timeout());
}

#[tokio::test]
async fn error_status_keeps_the_body() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/gitlab/_search"))
		.respond_with(ResponseTemplate::new(400).set_body_string("parsing_exception"))
		.mount(&server)
		.await;

	let err = engine(&server.uri(), None)
		.search(&json!({}), None, Duration::from_secs(1))
		.await
		.expect_err("Expected a status error.");

	match err {
		Error::Status { status, body } => {
			assert_eq!(status, 400);
			assert_eq!(body, "parsing_exception");
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn delete_by_query_proceeds_on_conflicts() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/gitlab/_delete_by_query"))
		.and(query_param("conflicts", "proceed"))
		.and(query_param("routing", "n_9"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"deleted": 12,
			"version_conflicts": 1,
			"failures": []
		})))
		.expect(1)
		.mount(&server)
		.await;

	let response = engine(&server.uri(), None)
		.delete_by_query(&json!({ "query": { "match_all": {} } }), Some("n_9"), "proceed")
		.await
		.expect("Delete failed.");

	assert_eq!(response.deleted, 12);
	assert_eq!(response.version_conflicts, 1);
}

#[test]
fn blank_api_key_sends_no_authorization() {
	let headers = sieve_providers::auth_headers(Some("  ")).expect("Failed to build headers.");

	assert!(headers.get("authorization").is_none());
	assert_eq!(
		headers.get("content-type").map(|value| value.as_bytes()),
		Some(&b"application/json"[..])
	);
}
