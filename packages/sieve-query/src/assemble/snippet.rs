use serde_json::Value;
use sieve_domain::{Feature, ValidatedRequest};

use crate::{
	AuthorizationContext, NameContext, QueryDocument, QuerySettings,
	assemble::{self, base_query},
	authorization,
	clause::{self, BoolQuery},
};

pub(crate) fn assemble(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	let fields = request.schema().fields;
	let (query, track_scores) = base_query(request, fields, request.query_text());
	let query = query
		.filters(authorization::search_level_filter(auth, request))
		.filter(snippet_filter(auth, request));

	assemble::finish(request, settings, query, fields, track_scores)
}

/// Personal snippets (no project) by visibility or authorship, unioned with project snippets
/// of readable projects whose snippets feature is visible. Unrestricted readers see every
/// personal snippet but project snippets still need the feature enabled or private.
fn snippet_filter(auth: &AuthorizationContext, request: &ValidatedRequest) -> Value {
	let requester = auth.requester();
	let context = NameContext::new("filters").child("snippets");
	let personal = context.child("personal");
	let mut visible = vec![clause::terms(
		"visibility_level",
		requester.visibility_levels().into_iter().map(|visibility| visibility.level()),
		personal.leaf("visibility_level"),
	)];

	if let Some(user) = requester.user() {
		visible.push(clause::term("author_id", user.id, personal.leaf("as_author")));
	}

	let mut branches = vec![
		BoolQuery::named(personal.name())
			.must_not(clause::exists("project_id", personal.leaf("project_id")))
			.filter(clause::any_of(personal.leaf("visible"), visible))
			.into_clause(),
	];

	if requester.can_read_cross_project() {
		let project = context.child("project");
		let conditions = authorization::project_conditions(
			auth,
			&project,
			&[Feature::Snippets],
			"id",
			request.public_and_internal(),
		);

		branches.push(
			BoolQuery::named(project.name())
				.filter(clause::exists("project_id", project.leaf("project_id")))
				.filter(clause::has_parent(
					"project",
					clause::any_of(project.leaf("conditions"), conditions),
					project.leaf("parent"),
				))
				.into_clause(),
		);
	}

	clause::any_of(context.name(), branches)
}
