use proptest::{
	prelude::*,
	test_runner::{Config, RngAlgorithm, TestRng, TestRunner},
};

use sieve_domain::{
	EntityKind, Error, Requester, SearchRequest, SearchScope, Sort, User, operators, sha,
};

fn request_json(options: serde_json::Value) -> serde_json::Value {
	serde_json::json!({
		"query_text": "fix bug",
		"entity": "issue",
		"scope": "global",
		"options": options,
	})
}

#[test]
fn unknown_options_are_rejected_at_the_boundary() {
	let payload = request_json(serde_json::json!({ "inlcude_archived": true }));
	let parsed = serde_json::from_value::<SearchRequest>(payload);

	assert!(parsed.is_err(), "A misspelled option must not be silently ignored.");
}

#[test]
fn omitted_options_take_documented_defaults() {
	let payload = request_json(serde_json::json!({}));
	let request: SearchRequest = serde_json::from_value(payload).expect("Failed to parse request.");

	assert!(request.options.highlight);
	assert!(!request.options.count_only);
	assert_eq!(request.options.sort, Sort::Relevance);
	assert_eq!(request.requester, Requester::Anonymous);
	assert_eq!(request.page, 1);
}

#[test]
fn group_scope_requires_group_ids() {
	let request = SearchRequest::new("bug", EntityKind::Issue, SearchScope::Group);
	let err = request.validate(20, 100).expect_err("Expected missing group ids.");

	assert_eq!(err, Error::MissingScopeIds { scope: "group", field: "group id" });
}

#[test]
fn epics_cannot_be_scoped_to_a_project() {
	let mut request = SearchRequest::new("roadmap", EntityKind::Epic, SearchScope::Project);

	request.project_ids = vec![7];

	assert!(matches!(
		request.validate(20, 100),
		Err(Error::InvalidOption { option: "scope", .. })
	));
}

#[test]
fn public_and_internal_defaults_follow_scope() {
	let mut project = SearchRequest::new("bug", EntityKind::Issue, SearchScope::Project);

	project.project_ids = vec![1];

	let project = project.validate(20, 100).expect("Expected a valid request.");
	let global = SearchRequest::new("bug", EntityKind::Issue, SearchScope::Global)
		.validate(20, 100)
		.expect("Expected a valid request.");

	assert!(!project.public_and_internal());
	assert!(global.public_and_internal());
}

#[test]
fn pagination_is_offset_based() {
	let mut request = SearchRequest::new("bug", EntityKind::Issue, SearchScope::Global);

	request.page = 3;
	request.per_page = Some(25);
	request.requester = Requester::User(User::new(1, "ada"));

	let validated = request.validate(20, 100).expect("Expected a valid request.");

	assert_eq!(validated.from(), 50);
	assert_eq!(validated.size(), 25);
	assert_eq!(validated.into_count_only().size(), 0);
}

#[test]
fn oversized_pages_are_rejected() {
	let mut request = SearchRequest::new("bug", EntityKind::Issue, SearchScope::Global);

	request.per_page = Some(101);

	assert!(matches!(request.validate(20, 100), Err(Error::InvalidPage { .. })));
}

fn token_strategy() -> impl Strategy<Value = String> {
	prop_oneof![
		"[0-9a-f]{1,45}",
		"[a-zA-Z_]{1,12}",
		"[0-9a-f]{5,40}\\*",
	]
}

#[test]
fn sha_rewrite_is_idempotent_fixed_seed() {
	let seed = [7u8; 32];
	let mut runner = TestRunner::new_with_rng(
		Config { cases: 256, max_shrink_iters: 64, ..Config::default() },
		TestRng::from_seed(RngAlgorithm::ChaCha, &seed),
	);
	let strategy = prop::collection::vec(token_strategy(), 0..8);

	runner
		.run(&strategy, |tokens| {
			let query = tokens.join(" ");
			let once = sha::rewrite_sha_prefixes(&query);
			let twice = sha::rewrite_sha_prefixes(&once);

			prop_assert_eq!(&once, &twice);

			for (original, rewritten) in query.split(' ').zip(once.split(' ')) {
				if sha::is_sha_token(original) {
					prop_assert_eq!(rewritten, format!("{original}*"));
				} else {
					prop_assert_eq!(rewritten, original);
				}
			}

			Ok(())
		})
		.expect("SHA rewrite must be idempotent.");
}

#[test]
fn operators_survive_sha_rewrite() {
	let parsed = operators::parse("blob:0f3a9c2 deadbeef");

	assert_eq!(parsed.term, "deadbeef");
	assert_eq!(sha::rewrite_sha_prefixes(&parsed.term), "deadbeef*");
	assert_eq!(parsed.operators[0].value, "0f3a9c2");
}
