//! Entity query assemblers. Each combines the text clauses, the authorization filters and its
//! entity filters into a [`QueryDocument`].

mod epic;
mod git;
mod issuable;
mod snippet;
mod user;

use serde_json::{Value, json};
use sieve_domain::{EntityKind, Sort, ValidatedRequest};

use crate::{
	AuthorizationContext, CompiledQuery, Error, NameContext, QueryDocument, QuerySettings, Result,
	authorization,
	clause::BoolQuery,
	filters, routing, text,
};

const AGGREGATION_SIZE: u32 = 100;

/// Compiles a validated request against the authorization facts resolved for it.
pub fn compile(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> Result<CompiledQuery> {
	if auth.requested_project_ids() != request.request().project_ids.as_slice()
		|| auth.requested_group_ids() != request.request().group_ids.as_slice()
	{
		return Err(Error::InvalidRequest {
			message: "Authorization facts were resolved for a different scope.".to_string(),
		});
	}

	let document = match request.entity() {
		EntityKind::Issue => issuable::issue(request, auth, settings),
		EntityKind::MergeRequest => issuable::merge_request(request, auth, settings),
		EntityKind::Project => project_bound(request, auth, settings, request.query_text()),
		EntityKind::Epic => epic::assemble(request, auth, settings),
		EntityKind::Snippet => snippet::assemble(request, auth, settings),
		EntityKind::User => user::assemble(request, auth, settings),
		EntityKind::Commit => git::commit(request, auth, settings),
		EntityKind::Blob | EntityKind::WikiBlob => git::blob(request, auth, settings),
	};
	let count_only = request.options().count_only;

	Ok(CompiledQuery {
		entity: request.entity(),
		document,
		routing: routing::select(request, auth, settings),
		timeout: settings.timeout(count_only),
		count_only,
	})
}

/// Text clauses plus the document type filter.
pub(crate) fn base_query(
	request: &ValidatedRequest,
	fields: &[&str],
	query: &str,
) -> (BoolQuery, bool) {
	let doc_type = request.schema().doc_type;
	let text = text::build(doc_type, fields, query, request.options().count_only);
	let query = BoolQuery::named(NameContext::new(doc_type).leaf("search"))
		.musts(text.must)
		.filters(text.filter)
		.filter(filters::doc_type_filter(doc_type));

	(query, text.track_scores)
}

/// Documents owned by a project: issues, merge requests, projects and their git content.
pub(crate) fn project_bound(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
	query: &str,
) -> QueryDocument {
	let schema = request.schema();
	let (query, track_scores) = base_query(request, schema.fields, query);
	let query = authorize_project_bound(request, auth, query);

	finish(request, settings, query, schema.fields, track_scores)
}

pub(crate) fn authorize_project_bound(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	query: BoolQuery,
) -> BoolQuery {
	let schema = request.schema();
	let mut query =
		authorization::project_authorization(auth, request, schema.features).apply(query);

	if schema.confidential {
		query = query.filters(authorization::confidentiality_filter(auth));
	}
	if schema.hidden {
		query = query.filters(filters::not_hidden(request.requester()));
	}

	query.filters(filters::entity_filters(request))
}

/// Attaches pagination, sort, highlight and aggregations.
pub(crate) fn finish(
	request: &ValidatedRequest,
	settings: &QuerySettings,
	query: BoolQuery,
	fields: &[&str],
	track_scores: bool,
) -> QueryDocument {
	let options = request.options();
	let size = request.size();
	let from = if size == 0 { 0 } else { request.from() };
	let highlight = (options.highlight && size > 0 && !fields.is_empty())
		.then(|| text::highlight(fields, settings));

	QueryDocument::new(query)
		.with_page(size, from)
		.with_sort(sort(request))
		.with_highlight(highlight)
		.with_aggs(aggregations(request))
		.with_track_scores(track_scores)
}

fn sort(request: &ValidatedRequest) -> Option<Value> {
	let fields = request.schema().sort?;
	let (field, order) = match request.options().sort {
		Sort::Relevance => return None,
		Sort::CreatedAsc => (fields.created, "asc"),
		Sort::CreatedDesc => (fields.created, "desc"),
		Sort::UpdatedAsc => (fields.updated, "asc"),
		Sort::UpdatedDesc => (fields.updated, "desc"),
	};

	Some(json!([{ field: { "order": order } }]))
}

fn aggregations(request: &ValidatedRequest) -> Option<Value> {
	if !request.options().aggregation {
		return None;
	}

	let aggregation = request.schema().aggregation?;
	let name = aggregation.name;

	Some(json!({ name: { "terms": { "field": aggregation.field, "size": AGGREGATION_SIZE } } }))
}
