//! Named clause constructors for the search DSL. Every clause carries a `_name` so a response's
//! `matched_queries` explains why a document matched.

use serde_json::{Map, Value, json};

pub fn term(field: &str, value: impl Into<Value>, name: impl Into<String>) -> Value {
	leaf("term", field, value.into(), name.into())
}

/// Matches nothing when `values` is empty.
pub fn terms<V>(field: &str, values: impl IntoIterator<Item = V>, name: impl Into<String>) -> Value
where
	V: Into<Value>,
{
	let name: String = name.into();
	let values = values.into_iter().map(Into::into).collect::<Vec<Value>>();

	json!({ "terms": { "_name": name, field: values } })
}

pub fn prefix(field: &str, value: impl Into<Value>, name: impl Into<String>) -> Value {
	leaf("prefix", field, value.into(), name.into())
}

pub fn wildcard(field: &str, value: impl Into<Value>, name: impl Into<String>) -> Value {
	leaf("wildcard", field, value.into(), name.into())
}

pub fn exists(field: &str, name: impl Into<String>) -> Value {
	let name: String = name.into();

	json!({ "exists": { "_name": name, "field": field } })
}

pub fn match_all(name: impl Into<String>) -> Value {
	let name: String = name.into();

	json!({ "match_all": { "_name": name } })
}

pub fn match_none(name: impl Into<String>) -> Value {
	let name: String = name.into();

	json!({ "match_none": { "_name": name } })
}

pub fn has_parent(parent_type: &str, query: Value, name: impl Into<String>) -> Value {
	let name: String = name.into();

	json!({ "has_parent": { "_name": name, "parent_type": parent_type, "query": query } })
}

/// At least one of `clauses` must match. An empty union is an explicit `match_none`.
pub fn any_of(name: impl Into<String>, clauses: Vec<Value>) -> Value {
	if clauses.is_empty() {
		return match_none(name);
	}

	BoolQuery::named(name).shoulds(clauses).minimum_should_match(1).into_clause()
}

/// Matches documents indexed without `field`.
pub fn missing(field: &str, name: impl Into<String>) -> Value {
	let name: String = name.into();

	BoolQuery::named(name.clone()).must_not(exists(field, format!("{name}:exists"))).into_clause()
}

fn leaf(kind: &str, field: &str, value: Value, name: String) -> Value {
	json!({ kind: { field: { "_name": name, "value": value } } })
}

/// Boolean query under construction. Builders consume and return `self`; a finished query
/// becomes a plain clause through [`BoolQuery::into_clause`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
	name: Option<String>,
	must: Vec<Value>,
	should: Vec<Value>,
	filter: Vec<Value>,
	must_not: Vec<Value>,
	minimum_should_match: Option<u32>,
}
impl BoolQuery {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn named(name: impl Into<String>) -> Self {
		Self { name: Some(name.into()), ..Self::default() }
	}

	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	pub fn must(mut self, clause: Value) -> Self {
		self.must.push(clause);

		self
	}

	pub fn musts(mut self, clauses: impl IntoIterator<Item = Value>) -> Self {
		self.must.extend(clauses);

		self
	}

	pub fn should(mut self, clause: Value) -> Self {
		self.should.push(clause);

		self
	}

	pub fn shoulds(mut self, clauses: impl IntoIterator<Item = Value>) -> Self {
		self.should.extend(clauses);

		self
	}

	pub fn filter(mut self, clause: Value) -> Self {
		self.filter.push(clause);

		self
	}

	pub fn filters(mut self, clauses: impl IntoIterator<Item = Value>) -> Self {
		self.filter.extend(clauses);

		self
	}

	pub fn must_not(mut self, clause: Value) -> Self {
		self.must_not.push(clause);

		self
	}

	pub fn must_nots(mut self, clauses: impl IntoIterator<Item = Value>) -> Self {
		self.must_not.extend(clauses);

		self
	}

	pub fn minimum_should_match(mut self, value: u32) -> Self {
		self.minimum_should_match = Some(value);

		self
	}

	pub fn is_empty(&self) -> bool {
		self.must.is_empty()
			&& self.should.is_empty()
			&& self.filter.is_empty()
			&& self.must_not.is_empty()
	}

	pub fn must_clauses(&self) -> &[Value] {
		&self.must
	}

	pub fn should_clauses(&self) -> &[Value] {
		&self.should
	}

	pub fn filter_clauses(&self) -> &[Value] {
		&self.filter
	}

	pub fn must_not_clauses(&self) -> &[Value] {
		&self.must_not
	}

	/// The inner `bool` object. Empty clause lists are omitted.
	pub fn into_body(self) -> Map<String, Value> {
		let mut body = Map::new();

		if let Some(name) = self.name {
			body.insert("_name".to_string(), Value::String(name));
		}

		for (key, clauses) in [
			("must", self.must),
			("should", self.should),
			("filter", self.filter),
			("must_not", self.must_not),
		] {
			if !clauses.is_empty() {
				body.insert(key.to_string(), Value::Array(clauses));
			}
		}

		if let Some(minimum) = self.minimum_should_match {
			body.insert("minimum_should_match".to_string(), Value::from(minimum));
		}

		body
	}

	pub fn into_clause(self) -> Value {
		json!({ "bool": self.into_body() })
	}
}
