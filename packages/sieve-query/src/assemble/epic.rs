use sieve_domain::ValidatedRequest;

use crate::{
	AuthorizationContext, QueryDocument, QuerySettings,
	assemble::{self, base_query},
	authorization, filters,
};

/// Epics live in groups: the level filter narrows to the searched hierarchy and the group
/// membership union decides visibility.
pub(crate) fn assemble(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	let fields = request.schema().fields;
	let (query, track_scores) = base_query(request, fields, request.query_text());
	let query = query
		.filters(authorization::search_level_filter(auth, request))
		.filters(authorization::group_membership_filter(auth, request))
		.filters(filters::entity_filters(request));

	assemble::finish(request, settings, query, fields, track_scores)
}
