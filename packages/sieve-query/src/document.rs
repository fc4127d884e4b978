use std::time::Duration;

use serde_json::{Map, Value};
use sieve_domain::EntityKind;

use crate::clause::BoolQuery;

/// The composed search body before serialization.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDocument {
	pub query: BoolQuery,
	pub sort: Option<Value>,
	pub highlight: Option<Value>,
	pub aggs: Option<Value>,
	pub size: u32,
	pub from: u64,
	pub track_scores: bool,
}
impl QueryDocument {
	pub fn new(query: BoolQuery) -> Self {
		Self {
			query,
			sort: None,
			highlight: None,
			aggs: None,
			size: 0,
			from: 0,
			track_scores: false,
		}
	}

	pub fn with_page(mut self, size: u32, from: u64) -> Self {
		self.size = size;
		self.from = from;

		self
	}

	pub fn with_sort(mut self, sort: Option<Value>) -> Self {
		self.sort = sort;

		self
	}

	pub fn with_highlight(mut self, highlight: Option<Value>) -> Self {
		self.highlight = highlight;

		self
	}

	pub fn with_aggs(mut self, aggs: Option<Value>) -> Self {
		self.aggs = aggs;

		self
	}

	pub fn with_track_scores(mut self, track_scores: bool) -> Self {
		self.track_scores = track_scores;

		self
	}

	pub fn to_value(&self) -> Value {
		let mut body = Map::new();

		body.insert("query".to_string(), self.query.clone().into_clause());
		body.insert("size".to_string(), Value::from(self.size));
		body.insert("from".to_string(), Value::from(self.from));

		if let Some(sort) = &self.sort {
			body.insert("sort".to_string(), sort.clone());
		}
		if let Some(highlight) = &self.highlight {
			body.insert("highlight".to_string(), highlight.clone());
		}
		if let Some(aggs) = &self.aggs {
			body.insert("aggs".to_string(), aggs.clone());
		}
		if self.track_scores {
			body.insert("track_scores".to_string(), Value::Bool(true));
		}

		Value::Object(body)
	}
}

/// A query ready to send: body, shard routing and the timeout for its kind of call.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
	pub entity: EntityKind,
	pub document: QueryDocument,
	pub routing: Option<String>,
	pub timeout: Duration,
	pub count_only: bool,
}
impl CompiledQuery {
	pub fn body(&self) -> Value {
		self.document.to_value()
	}
}
