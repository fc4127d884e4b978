use sieve_domain::{Id, ValidatedRequest};

use crate::{
	AuthorizationContext, NameContext, QueryDocument, QuerySettings,
	assemble::{self, authorize_project_bound},
	clause::{self, BoolQuery},
	filters,
};

pub(crate) fn issue(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	match iid_reference(request.query_text(), '#') {
		Some(iid) => iid_lookup(request, auth, settings, iid),
		None => assemble::project_bound(request, auth, settings, request.query_text()),
	}
}

pub(crate) fn merge_request(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	match iid_reference(request.query_text(), '!') {
		Some(iid) => iid_lookup(request, auth, settings, iid),
		None => assemble::project_bound(request, auth, settings, request.query_text()),
	}
}

/// `#12` for issues and `!12` for merge requests.
fn iid_reference(query: &str, sigil: char) -> Option<Id> {
	query.trim().strip_prefix(sigil)?.parse::<Id>().ok().filter(|iid| *iid > 0)
}

/// Exact lookup by project-local id, still subject to every authorization filter.
fn iid_lookup(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
	iid: Id,
) -> QueryDocument {
	let doc_type = request.schema().doc_type;
	let context = NameContext::new(doc_type);
	let query = BoolQuery::named(context.leaf("search"))
		.filter(clause::term("iid", iid, context.child("related").leaf("iid")))
		.filter(filters::doc_type_filter(doc_type));
	let query = authorize_project_bound(request, auth, query);

	assemble::finish(request, settings, query, &[], false)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_only_sigil_prefixed_numbers() {
		assert_eq!(iid_reference(" #12 ", '#'), Some(12));
		assert_eq!(iid_reference("!7", '!'), Some(7));
		assert_eq!(iid_reference("#12", '!'), None);
		assert_eq!(iid_reference("#0", '#'), None);
		assert_eq!(iid_reference("#12 bug", '#'), None);
	}
}
