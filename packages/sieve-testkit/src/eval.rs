//! A small evaluator for the query DSL the compiler emits, enough to check authorization
//! properties without a search cluster.
//!
//! Documents are plain JSON objects. A joined document carries its parent project document
//! under `_parent`. Text queries match by case-insensitive substring. Unknown clause kinds never
//! match.

use serde_json::Value;

const SYNTAX: [char; 9] = ['+', '*', '"', '-', '|', '(', ')', '~', '\\'];

/// Whether `doc` satisfies `query`, given either a single clause or a whole query document.
pub fn matches(doc: &Value, query: &Value) -> bool {
	eval(doc, query.get("query").unwrap_or(query))
}

fn eval(doc: &Value, clause: &Value) -> bool {
	let Some((kind, body)) = clause.as_object().and_then(|map| map.iter().next()) else {
		return false;
	};

	match kind.as_str() {
		"bool" => eval_bool(doc, body),
		"term" => leaf(body).is_some_and(|(field, expected)| {
			lookup(doc, field).into_iter().any(|value| value == expected)
		}),
		"terms" => body
			.as_object()
			.and_then(|map| map.iter().find(|(key, _)| key.as_str() != "_name"))
			.and_then(|(field, values)| values.as_array().map(|values| (field, values)))
			.is_some_and(|(field, values)| {
				lookup(doc, field).into_iter().any(|value| values.contains(value))
			}),
		"prefix" => leaf(body).is_some_and(|(field, prefix)| {
			let prefix = prefix.as_str().unwrap_or_default();

			strings(doc, field).any(|value| value.starts_with(prefix))
		}),
		"wildcard" => leaf(body).is_some_and(|(field, pattern)| {
			let pattern = pattern.as_str().unwrap_or_default().chars().collect::<Vec<_>>();

			strings(doc, field).any(|value| glob(&pattern, &value.chars().collect::<Vec<_>>()))
		}),
		"exists" => body
			.get("field")
			.and_then(Value::as_str)
			.is_some_and(|field| !lookup(doc, field).is_empty()),
		"match_all" => true,
		"match_none" => false,
		"has_parent" => match (doc.get("_parent"), body.get("query")) {
			(Some(parent), Some(query)) => eval(parent, query),
			_ => false,
		},
		"multi_match" => eval_multi_match(doc, body),
		"simple_query_string" => eval_text(doc, body, true),
		_ => false,
	}
}

/// Elasticsearch semantics: `should` is optional beside `must` or `filter` unless a minimum is
/// given, and required otherwise.
fn eval_bool(doc: &Value, body: &Value) -> bool {
	let must = clauses(body, "must");
	let filter = clauses(body, "filter");
	let should = clauses(body, "should");

	if !must.iter().chain(filter).all(|clause| eval(doc, clause))
		|| clauses(body, "must_not").iter().any(|clause| eval(doc, clause))
	{
		return false;
	}
	if should.is_empty() {
		return true;
	}

	let minimum = match body.get("minimum_should_match").and_then(Value::as_u64) {
		Some(minimum) => usize::try_from(minimum).unwrap_or(usize::MAX),
		None if must.is_empty() && filter.is_empty() => 1,
		None => 0,
	};

	should.iter().filter(|clause| eval(doc, clause)).count() >= minimum
}

fn eval_multi_match(doc: &Value, body: &Value) -> bool {
	if body.get("type").and_then(Value::as_str) == Some("phrase") {
		let phrase = body.get("query").and_then(Value::as_str).unwrap_or_default().to_lowercase();

		return text_fields(doc, body).iter().any(|text| text.contains(&phrase));
	}

	let all = body.get("operator").and_then(Value::as_str) == Some("and");

	eval_text(doc, body, all)
}

fn eval_text(doc: &Value, body: &Value, all: bool) -> bool {
	let texts = text_fields(doc, body);
	let query = body.get("query").and_then(Value::as_str).unwrap_or_default().to_lowercase();
	let mut required = Vec::new();
	let mut excluded = Vec::new();

	for token in query.split_whitespace() {
		let word = token.trim_matches(|c: char| SYNTAX.contains(&c));

		if word.is_empty() {
			continue;
		}
		if token.starts_with('-') {
			excluded.push(word.to_string());
		} else {
			required.push(word.to_string());
		}
	}

	let found = |word: &String| texts.iter().any(|text| text.contains(word.as_str()));

	if excluded.iter().any(found) {
		return false;
	}
	if required.is_empty() {
		return !excluded.is_empty();
	}
	if all { required.iter().all(found) } else { required.iter().any(found) }
}

fn text_fields(doc: &Value, body: &Value) -> Vec<String> {
	clauses(body, "fields")
		.iter()
		.filter_map(Value::as_str)
		.map(|field| field.split('^').next().unwrap_or(field))
		.flat_map(|field| strings(doc, field).map(str::to_lowercase).collect::<Vec<_>>())
		.collect()
}

fn clauses<'a>(body: &'a Value, key: &str) -> &'a [Value] {
	body.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

/// `{ field: { "value": .. } }` into the field and its value.
fn leaf(body: &Value) -> Option<(&str, &Value)> {
	let (field, inner) = body.as_object()?.iter().next()?;

	Some((field.as_str(), inner.get("value")?))
}

/// Values at `field`, read as a flat key first and then as a dotted path. Arrays are
/// flattened and nulls dropped.
fn lookup<'a>(doc: &'a Value, field: &str) -> Vec<&'a Value> {
	let value = doc
		.get(field)
		.or_else(|| field.split('.').try_fold(doc, |value, segment| value.get(segment)));

	match value {
		None | Some(Value::Null) => Vec::new(),
		Some(Value::Array(items)) => items.iter().filter(|item| !item.is_null()).collect(),
		Some(value) => vec![value],
	}
}

fn strings<'a>(doc: &'a Value, field: &str) -> impl Iterator<Item = &'a str> {
	lookup(doc, field).into_iter().filter_map(Value::as_str)
}

fn glob(pattern: &[char], text: &[char]) -> bool {
	match (pattern.first(), text.first()) {
		(None, None) => true,
		(Some('*'), _) =>
			glob(&pattern[1..], text) || (!text.is_empty() && glob(pattern, &text[1..])),
		(Some('?'), Some(_)) => glob(&pattern[1..], &text[1..]),
		(Some(expected), Some(actual)) if expected == actual => glob(&pattern[1..], &text[1..]),
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn bool_should_defaults_follow_the_engine() {
		let doc = json!({ "state": "opened", "labels": ["bug", "ux"] });
		let only_should = json!({ "bool": { "should": [
			{ "term": { "state": { "value": "closed" } } },
			{ "terms": { "_name": "labels", "labels": ["ux"] } }
		] } });
		let optional_should = json!({ "bool": {
			"filter": [{ "term": { "state": { "value": "opened" } } }],
			"should": [{ "match_none": {} }]
		} });
		let required_should = json!({ "bool": {
			"filter": [{ "term": { "state": { "value": "opened" } } }],
			"should": [{ "match_none": {} }],
			"minimum_should_match": 1
		} });

		assert!(matches(&doc, &only_should));
		assert!(matches(&doc, &optional_should));
		assert!(!matches(&doc, &required_should));
	}

	#[test]
	fn leaves_read_nested_and_parent_fields() {
		let doc = json!({
			"blob": { "path": "app/models/user.rb" },
			"traversal_ids": "1-3-",
			"_parent": { "visibility_level": 20 }
		});

		assert!(matches(&doc, &json!({ "wildcard": { "blob.path": { "value": "*models*" } } })));
		assert!(matches(&doc, &json!({ "prefix": { "traversal_ids": { "value": "1-" } } })));
		assert!(matches(&doc, &json!({ "exists": { "field": "blob.path" } })));
		assert!(!matches(&doc, &json!({ "exists": { "field": "archived" } })));
		assert!(matches(
			&doc,
			&json!({ "has_parent": {
				"parent_type": "project",
				"query": { "term": { "visibility_level": { "value": 20 } } }
			} })
		));
		assert!(!matches(&json!({}), &json!({ "has_parent": { "query": { "match_all": {} } } })));
	}

	#[test]
	fn text_queries_match_by_substring() {
		let doc = json!({ "title": "Fix login bug", "description": "Users cannot log in" });
		let and = json!({ "multi_match": {
			"fields": ["title^2", "description"], "query": "fix users", "operator": "and"
		} });
		let phrase = json!({ "multi_match": {
			"type": "phrase", "fields": ["title"], "query": "login bug"
		} });
		let negated = json!({ "simple_query_string": {
			"fields": ["title"], "query": "fix -login"
		} });

		assert!(matches(&doc, &and));
		assert!(matches(&doc, &phrase));
		assert!(!matches(&doc, &negated));
		assert!(!matches(&doc, &json!({ "unknown": {} })));
	}
}
