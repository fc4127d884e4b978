//! Commits, code blobs and wiki blobs.

use serde_json::Value;
use sieve_domain::{
	EntityKind, ValidatedRequest,
	operators::{self, OperatorKind, QueryOperator},
	sha,
};

use crate::{
	AuthorizationContext, NameContext, QueryDocument, QuerySettings,
	assemble::{self, authorize_project_bound, base_query},
	clause::{self, BoolQuery},
};

/// Partial SHAs in commit queries become prefix matches.
pub(crate) fn commit(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	let query = sha::rewrite_sha_prefixes(request.query_text());

	assemble::project_bound(request, auth, settings, &query)
}

/// Code and wiki search with `filename:`, `path:`, `extension:` and `blob:` operators lifted
/// out of the text into filters.
pub(crate) fn blob(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> QueryDocument {
	let fields = request.schema().fields;
	let parsed = operators::parse(request.query_text());
	let blob_fields = BlobFields::for_kind(request.entity());
	let (query, track_scores) = base_query(request, fields, &parsed.term);
	let query = query.filters(
		parsed.operators.iter().map(|operator| operator_filter(&blob_fields, operator)),
	);
	let query = authorize_project_bound(request, auth, query);

	assemble::finish(request, settings, query, fields, track_scores)
}

struct BlobFields {
	file_name: &'static str,
	path: &'static str,
	oid: &'static str,
}
impl BlobFields {
	fn for_kind(kind: EntityKind) -> Self {
		match kind {
			EntityKind::Blob =>
				Self { file_name: "blob.file_name", path: "blob.path", oid: "blob.oid" },
			_ => Self { file_name: "file_name", path: "path", oid: "oid" },
		}
	}
}

fn operator_filter(fields: &BlobFields, operator: &QueryOperator) -> Value {
	let context = NameContext::new("filters");
	let label = operator.kind.as_str();
	let name =
		if operator.negated { context.leaf(format!("not_{label}")) } else { context.leaf(label) };
	let leaf_name = format!("{name}:{label}");
	let clause = match operator.kind {
		OperatorKind::Filename =>
			clause::term(fields.file_name, operator.value.as_str(), leaf_name),
		OperatorKind::Path => clause::wildcard(
			fields.path,
			format!("*{}*", operator.value.to_lowercase()),
			leaf_name,
		),
		OperatorKind::Extension => clause::wildcard(
			fields.file_name,
			format!("*.{}", operator.value.trim_start_matches('.')),
			leaf_name,
		),
		OperatorKind::Blob => clause::term(fields.oid, operator.value.as_str(), leaf_name),
	};

	if operator.negated {
		BoolQuery::named(name).must_not(clause).into_clause()
	} else {
		BoolQuery::named(name).filter(clause).into_clause()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn path_operator_is_a_case_insensitive_substring() {
		let operator = QueryOperator {
			kind: OperatorKind::Path,
			value: "App/Models".to_string(),
			negated: false,
		};
		let filter = operator_filter(&BlobFields::for_kind(EntityKind::Blob), &operator);

		assert_eq!(filter["bool"]["_name"], "filters:path");
		assert_eq!(filter["bool"]["filter"][0]["wildcard"]["blob.path"]["value"], "*app/models*");
	}

	#[test]
	fn negated_extension_is_excluded() {
		let operator = QueryOperator {
			kind: OperatorKind::Extension,
			value: ".md".to_string(),
			negated: true,
		};
		let filter = operator_filter(&BlobFields::for_kind(EntityKind::WikiBlob), &operator);

		assert_eq!(filter["bool"]["_name"], "filters:not_extension");
		assert_eq!(filter["bool"]["must_not"][0]["wildcard"]["file_name"]["value"], "*.md");
	}
}
