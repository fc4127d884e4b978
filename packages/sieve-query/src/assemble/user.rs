use serde_json::Value;
use sieve_domain::{SearchScope, ValidatedRequest};

use crate::{
	AuthorizationContext, NameContext, QueryDocument, QuerySettings, assemble, authorization,
	clause::{self, BoolQuery},
	filters, text,
};

const ADMIN_ONLY_FIELDS: [&str; 1] = ["email"];
const FORBIDDEN_STATES: [&str; 5] =
	["blocked", "banned", "ldap_blocked", "blocked_pending_approval", "deactivated"];

/// The user directory is not project-owned. Administrators additionally search private email
/// addresses and see users in forbidden states.
pub(crate) fn assemble(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	let schema = request.schema();
	let admin = request.requester().can_admin_all_resources();
	let mut fields = schema.fields.to_vec();

	if admin {
		fields.extend(ADMIN_ONLY_FIELDS);
	}

	let query_text = request.query_text().trim();
	let count_only = request.options().count_only;
	let (query, track_scores) =
		if query_text.is_empty() || text::uses_advanced_syntax(query_text) {
			assemble::base_query(request, &fields, query_text)
		} else {
			let fuzzy = text::fuzzy(schema.doc_type, &fields, query_text);
			let query = BoolQuery::named(NameContext::new(schema.doc_type).leaf("search"))
				.filter(filters::doc_type_filter(schema.doc_type));

			if count_only { (query.filter(fuzzy), false) } else { (query.must(fuzzy), false) }
		};
	let mut query = query.filters(level_filter(request, auth));

	if !admin {
		let name = NameContext::new("filters").leaf("not_forbidden_state");

		query = query.filter(
			BoolQuery::named(name.clone())
				.must_not(clause::terms("state", FORBIDDEN_STATES, format!("{name}:state")))
				.into_clause(),
		);
	}

	assemble::finish(request, settings, query, &fields, track_scores)
}

/// Users carry the ancestry of every namespace they belong to and the ids of their projects.
fn level_filter(request: &ValidatedRequest, auth: &AuthorizationContext) -> Option<Value> {
	match request.scope() {
		SearchScope::Project => Some(clause::terms(
			"project_ids",
			auth.scoped_requested_project_ids(),
			NameContext::new("filters").child("level").leaf("project"),
		)),
		_ => authorization::search_level_filter(auth, request),
	}
}
