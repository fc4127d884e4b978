//! Entity-specific narrowing filters. Each returns clauses for the root `filter` list.

use serde_json::Value;
use sieve_domain::{EntityKind, Requester, SetFilter, ValidatedRequest};

use crate::{
	NameContext,
	clause::{self, BoolQuery},
};

const SCOPED_LABEL_WILDCARD: &str = "::*";

pub fn doc_type_filter(doc_type: &str) -> Value {
	clause::term("type", doc_type, NameContext::new("doc").child("is_a").leaf(doc_type))
}

/// Hidden documents belong to banned authors and are only shown to administrators.
pub fn not_hidden(requester: &Requester) -> Option<Value> {
	if requester.can_admin_all_resources() {
		return None;
	}

	Some(clause::term("hidden", false, NameContext::new("filters").leaf("not_hidden")))
}

pub fn entity_filters(request: &ValidatedRequest) -> Vec<Value> {
	let context = NameContext::new("filters");
	let filters = &request.options().filters;
	let mut out = Vec::new();

	if let Some(state) = filters.state.as_deref().filter(|state| *state != "all") {
		out.push(clause::term("state", state, context.leaf("state")));
	}
	if let Some(confidential) = filters.confidential {
		out.push(clause::term("confidential", confidential, context.leaf("confidential")));
	}

	out.extend(pair_filter(
		&context,
		"source_branch",
		filters.source_branch.as_deref(),
		filters.not_source_branch.as_deref(),
	));
	out.extend(pair_filter(
		&context,
		"target_branch",
		filters.target_branch.as_deref(),
		filters.not_target_branch.as_deref(),
	));

	if let Some(author) = filters.author_id {
		out.push(clause::term("author_id", author, context.leaf("author")));
	}
	if let Some(author) = filters.not_author_id {
		out.push(
			BoolQuery::named(context.leaf("not_author"))
				.must_not(clause::term("author_id", author, context.leaf("not_author:author_id")))
				.into_clause(),
		);
	}

	out.extend(assignee_filters(&context, &filters.assignees));
	out.extend(milestone_filters(&context, &filters.milestones));
	out.extend(label_filters(&context, &filters.labels));

	if !filters.language.is_empty() {
		let field = if request.entity() == EntityKind::Blob { "blob.language" } else { "language" };

		out.push(clause::terms(field, filters.language.iter().cloned(), context.leaf("language")));
	}

	out
}

fn pair_filter(
	context: &NameContext,
	field: &str,
	wanted: Option<&str>,
	unwanted: Option<&str>,
) -> Vec<Value> {
	let mut out = Vec::new();

	if let Some(wanted) = wanted {
		out.push(clause::term(field, wanted, context.leaf(field)));
	}
	if let Some(unwanted) = unwanted {
		let name = context.leaf(format!("not_{field}"));

		out.push(
			BoolQuery::named(name.clone())
				.must_not(clause::term(field, unwanted, format!("{name}:{field}")))
				.into_clause(),
		);
	}

	out
}

fn assignee_filters(context: &NameContext, assignees: &SetFilter<i64>) -> Vec<Value> {
	let field = "assignee_id";
	let mut out = Vec::new();

	if !assignees.all.is_empty() {
		let name = context.leaf("assignee_ids");

		out.push(
			BoolQuery::named(name.clone())
				.musts(assignees.all.iter().map(|id| clause::term(field, *id, name.clone())))
				.into_clause(),
		);
	}
	if !assignees.not.is_empty() {
		out.push(must_not_terms(context, field, "not_assignee_ids", assignees.not.clone()));
	}
	if !assignees.or.is_empty() {
		out.push(clause::terms(
			field,
			assignees.or.iter().copied(),
			context.leaf("or_assignee_ids"),
		));
	}

	out.extend(presence_filters(context, field, "assignees", assignees.any, assignees.none));

	out
}

fn milestone_filters(context: &NameContext, milestones: &SetFilter<String>) -> Vec<Value> {
	let field = "milestone_title";
	let mut out = Vec::new();

	if !milestones.all.is_empty() || !milestones.or.is_empty() {
		let titles = milestones.all.iter().chain(milestones.or.iter()).cloned();

		out.push(clause::terms(field, titles, context.leaf("milestone_title")));
	}
	if !milestones.not.is_empty() {
		out.push(must_not_terms(context, field, "not_milestone_title", milestones.not.clone()));
	}

	out.extend(presence_filters(context, field, "milestones", milestones.any, milestones.none));

	out
}

fn label_filters(context: &NameContext, labels: &SetFilter<String>) -> Vec<Value> {
	let field = "label_names";
	let mut out = Vec::new();

	if !labels.all.is_empty() {
		let name = context.leaf("label_names");

		out.push(
			BoolQuery::named(name.clone()).musts(label_clauses(&labels.all, &name)).into_clause(),
		);
	}
	if !labels.not.is_empty() {
		let name = context.leaf("not_label_names");

		out.push(
			BoolQuery::named(name.clone())
				.must_nots(label_clauses(&labels.not, &name))
				.into_clause(),
		);
	}
	if !labels.or.is_empty() {
		let name = context.leaf("or_label_names");

		out.push(clause::any_of(name.clone(), label_clauses(&labels.or, &name)));
	}

	out.extend(presence_filters(context, field, "label_names", labels.any, labels.none));

	out
}

/// `scope::*` selects every label of a scoped label family.
fn label_clauses(names: &[String], name: &str) -> Vec<Value> {
	names
		.iter()
		.map(|label| match label.strip_suffix('*') {
			Some(prefix) if label.ends_with(SCOPED_LABEL_WILDCARD) =>
				clause::prefix("label_names", prefix, name),
			_ => clause::term("label_names", label.as_str(), name),
		})
		.collect()
}

fn must_not_terms<V>(context: &NameContext, field: &str, label: &str, values: Vec<V>) -> Value
where
	V: Into<Value>,
{
	let name = context.leaf(label);

	BoolQuery::named(name.clone())
		.must_not(clause::terms(field, values, format!("{name}:{field}")))
		.into_clause()
}

fn presence_filters(
	context: &NameContext,
	field: &str,
	label: &str,
	any: bool,
	none: bool,
) -> Vec<Value> {
	let mut out = Vec::new();

	if any {
		let name = context.leaf(format!("any_{label}"));

		out.push(
			BoolQuery::named(name.clone())
				.must(clause::exists(field, format!("{name}:exists")))
				.into_clause(),
		);
	}
	if none {
		out.push(clause::missing(field, context.leaf(format!("none_{label}"))));
	}

	out
}

#[cfg(test)]
mod tests {
	use sieve_domain::{SearchRequest, SearchScope};

	use super::*;

	#[test]
	fn scoped_label_wildcards_become_prefixes() {
		let clauses = label_clauses(&["priority::*".to_string(), "bug".to_string()], "n");

		assert_eq!(clauses[0]["prefix"]["label_names"]["value"], "priority::");
		assert_eq!(clauses[1]["term"]["label_names"]["value"], "bug");
	}

	#[test]
	fn state_all_adds_nothing() {
		let mut request = SearchRequest::new("bug", EntityKind::MergeRequest, SearchScope::Global);

		request.options.filters.state = Some("all".to_string());
		request.options.filters.target_branch = Some("main".to_string());

		let validated = request.validate(20, 100).expect("Expected a valid request.");
		let filters = entity_filters(&validated);

		assert_eq!(filters.len(), 1);
		assert_eq!(filters[0]["term"]["target_branch"]["_name"], "filters:target_branch");
	}

	#[test]
	fn admins_see_hidden_documents() {
		let mut admin = sieve_domain::User::new(1, "root");

		admin.admin = true;

		assert!(not_hidden(&Requester::User(admin)).is_none());
		assert!(not_hidden(&Requester::Anonymous).is_some());
	}
}
