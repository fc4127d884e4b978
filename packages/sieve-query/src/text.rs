//! Turns free text into relevance clauses.
//!
//! Queries containing engine syntax become one `simple_query_string` clause. Plain text becomes
//! an AND `multi_match` plus a phrase `multi_match`, either of which may match, so exact phrases
//! rank higher without being required.

use serde_json::{Map, Value, json};

use crate::{NameContext, QuerySettings, clause};

const ADVANCED_SYNTAX: [char; 9] = ['+', '*', '"', '-', '|', '(', ')', '~', '\\'];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextClauses {
	pub must: Vec<Value>,
	pub filter: Vec<Value>,
	pub track_scores: bool,
}

pub fn uses_advanced_syntax(query: &str) -> bool {
	query.contains(ADVANCED_SYNTAX)
}

pub fn strip_boost(field: &str) -> &str {
	field.split('^').next().unwrap_or(field)
}

/// Builds the relevance clauses for `query` over `fields` of documents of `doc_type`.
///
/// Counting only needs a match signal: the phrase clause is dropped, boosts are removed and the
/// clause moves to filter context where it is not scored.
pub fn build(doc_type: &str, fields: &[&str], query: &str, count_only: bool) -> TextClauses {
	let query = query.trim();
	let context = NameContext::new(doc_type);

	if query.is_empty() {
		return TextClauses {
			must: vec![clause::match_all(context.leaf("match_all"))],
			filter: Vec::new(),
			track_scores: true,
		};
	}

	let fields = if count_only {
		fields.iter().map(|field| strip_boost(field)).collect::<Vec<_>>()
	} else {
		fields.to_vec()
	};
	let clause = if uses_advanced_syntax(query) {
		simple_query_string(&context, &fields, query)
	} else if count_only {
		multi_match(&context, &fields, query)
	} else {
		clause::any_of(
			context.leaf("match_or_phrase:search_terms"),
			vec![multi_match(&context, &fields, query), phrase(&context, &fields, query)],
		)
	};

	if count_only {
		TextClauses { must: Vec::new(), filter: vec![clause], track_scores: false }
	} else {
		TextClauses { must: vec![clause], filter: Vec::new(), track_scores: false }
	}
}

/// Misspelling-tolerant match used by the user directory when no engine syntax is present.
pub fn fuzzy(doc_type: &str, fields: &[&str], query: &str) -> Value {
	let name = NameContext::new(doc_type).leaf("fuzzy:search_terms");

	json!({
		"multi_match": {
			"_name": name,
			"fields": fields,
			"query": query.trim(),
			"fuzziness": "AUTO",
			"lenient": true,
		}
	})
}

/// Highlight directive returning whole matched fields between collision-free markers.
pub fn highlight(fields: &[&str], settings: &QuerySettings) -> Value {
	let mut by_field = Map::new();

	for field in fields {
		by_field.insert(strip_boost(field).to_string(), json!({}));
	}

	json!({
		"fields": by_field,
		"number_of_fragments": 0,
		"pre_tags": [settings.pre_tag],
		"post_tags": [settings.post_tag],
	})
}

pub(crate) fn simple_query_string(context: &NameContext, fields: &[&str], query: &str) -> Value {
	json!({
		"simple_query_string": {
			"_name": context.leaf("match:search_terms"),
			"fields": fields,
			"query": query,
			"lenient": true,
			"default_operator": "and",
		}
	})
}

fn multi_match(context: &NameContext, fields: &[&str], query: &str) -> Value {
	json!({
		"multi_match": {
			"_name": context.leaf("multi_match:and:search_terms"),
			"fields": fields,
			"query": query,
			"operator": "and",
			"lenient": true,
		}
	})
}

fn phrase(context: &NameContext, fields: &[&str], query: &str) -> Value {
	json!({
		"multi_match": {
			"_name": context.leaf("multi_match_phrase:search_terms"),
			"type": "phrase",
			"fields": fields,
			"query": query,
			"lenient": true,
		}
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	const FIELDS: [&str; 3] = ["iid^50", "title^2", "description"];

	#[test]
	fn plain_text_uses_match_and_phrase() {
		let text = build("issue", &FIELDS, "fix bug", false);

		assert_eq!(text.must.len(), 1);
		assert_eq!(text.must[0]["bool"]["minimum_should_match"], 1);
		assert_eq!(
			text.must[0]["bool"]["should"][1]["multi_match"]["_name"],
			"issue:multi_match_phrase:search_terms"
		);
	}

	#[test]
	fn backslash_counts_as_advanced_syntax() {
		let text = build("issue", &FIELDS, r"C:\path", false);

		assert_eq!(text.must[0]["simple_query_string"]["default_operator"], "and");
	}

	#[test]
	fn counting_strips_boosts_and_phrase() {
		let text = build("issue", &FIELDS, "fix bug", true);

		assert!(text.must.is_empty());
		assert_eq!(text.filter.len(), 1);
		assert_eq!(text.filter[0]["multi_match"]["fields"], json!(["iid", "title", "description"]));
	}

	#[test]
	fn empty_query_matches_everything() {
		let text = build("issue", &FIELDS, "   ", false);

		assert!(text.track_scores);
		assert_eq!(text.must[0]["match_all"]["_name"], "issue:match_all");
	}

	#[test]
	fn highlight_uses_bare_field_names() {
		let value = highlight(&FIELDS, &QuerySettings::default());

		assert_eq!(value["number_of_fragments"], 0);
		assert!(value["fields"].get("title").is_some());
		assert!(value["fields"].get("title^2").is_none());
	}
}
