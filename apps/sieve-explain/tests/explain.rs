use serde_json::json;
use wiremock::{
	Mock, MockServer, ResponseTemplate,
	matchers::{method, path},
};

use sieve_config::{Config, Engine, Highlight, Results, Routing, Service};
use sieve_domain::{EntityKind, Requester, SearchRequest, SearchScope, User};
use sieve_explain::fixture::Fixture;

fn config(url: &str) -> Config {
	Config {
		service: Service { log_level: "info".to_string() },
		engine: Engine {
			url: url.to_string(),
			index: "gitlab".to_string(),
			api_key: None,
			count_timeout_ms: 1_000,
			search_timeout_ms: 30_000,
		},
		routing: Routing::default(),
		highlight: Highlight::default(),
		results: Results::default(),
	}
}

fn member_fixture() -> Fixture {
	serde_json::from_value(json!({
		"projects": [{ "id": 7, "access": "developer" }, { "id": 8, "access": "guest" }],
		"deleted_projects": [8]
	}))
	.expect("Fixture should parse.")
}

fn member() -> Requester {
	Requester::User(User::new(5, "ada"))
}

#[tokio::test]
async fn anonymous_searches_compile_without_a_fixture() {
	let service = sieve_explain::build_service(config("http://127.0.0.1:9200"), Fixture::default())
		.expect("Service should build.");
	let request = SearchRequest::new("crash", EntityKind::Issue, SearchScope::Global);
	let explanation =
		sieve_explain::explain(&service, request, false).await.expect("Explain should succeed.");

	assert_eq!(explanation.entity, EntityKind::Issue);
	assert!(!explanation.count_only);
	assert_eq!(explanation.timeout_ms, 30_000);
	assert!(explanation.body.get("query").is_some());
}

#[tokio::test]
async fn count_explanations_use_the_count_timeout() {
	let service = sieve_explain::build_service(config("http://127.0.0.1:9200"), member_fixture())
		.expect("Service should build.");
	let request = SearchRequest {
		requester: member(),
		..SearchRequest::new("crash", EntityKind::Issue, SearchScope::Global)
	};
	let explanation =
		sieve_explain::explain(&service, request, true).await.expect("Explain should succeed.");

	assert!(explanation.count_only);
	assert_eq!(explanation.timeout_ms, 1_000);
	assert_eq!(explanation.body["size"], json!(0));
}

#[tokio::test]
async fn project_scoped_blob_searches_route_to_the_project() {
	let service = sieve_explain::build_service(config("http://127.0.0.1:9200"), member_fixture())
		.expect("Service should build.");
	let request = SearchRequest {
		requester: member(),
		project_ids: vec![7],
		..SearchRequest::new("bug", EntityKind::Blob, SearchScope::Project)
	};
	let explanation =
		sieve_explain::explain(&service, request, false).await.expect("Explain should succeed.");

	assert_eq!(explanation.routing.as_deref(), Some("project_7"));
}

#[tokio::test]
async fn executed_searches_drop_hits_of_deleted_projects() {
	let server = MockServer::start().await;

	Mock::given(method("POST"))
		.and(path("/gitlab/_search"))
		.respond_with(ResponseTemplate::new(200).set_body_json(json!({
			"took": 3,
			"timed_out": false,
			"hits": {
				"total": { "value": 2, "relation": "eq" },
				"hits": [
					{ "_id": "issue_1", "_score": 2.0, "_source": { "id": 1, "project_id": 7 } },
					{ "_id": "issue_2", "_score": 1.0, "_source": { "id": 2, "project_id": 8 } }
				]
			}
		})))
		.expect(1)
		.mount(&server)
		.await;

	let service = sieve_explain::build_service(config(&server.uri()), member_fixture())
		.expect("Service should build.");
	let request = SearchRequest {
		requester: member(),
		..SearchRequest::new("crash", EntityKind::Issue, SearchScope::Global)
	};
	let results = service.search(request).await.expect("Search should succeed.");

	assert_eq!(results.total, 1);
	assert_eq!(results.items.len(), 1);
}
