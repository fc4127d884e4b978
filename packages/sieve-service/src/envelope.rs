//! Maps raw engine responses into typed pages of results.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use sieve_domain::{EntityKind, Id, ValidatedRequest};
use sieve_providers::{RawHit, RawResponse};

use crate::{
	FoundBlob,
	blob::{self, BlobWindow},
};

/// Container a hit belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Owner {
	Project(Id),
	Group(Id),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
	pub id: String,
	pub score: Option<f64>,
	pub source: Value,
	pub highlight: BTreeMap<String, Vec<String>>,
	pub matched_queries: Vec<String>,
	/// `None` for users and for hits whose owner could not be read from the source.
	pub owner: Option<Owner>,
	pub blob: Option<FoundBlob>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationBucket {
	pub key: String,
	pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregationResult {
	pub name: String,
	pub buckets: Vec<AggregationBucket>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
	pub entity: EntityKind,
	pub page: u32,
	pub per_page: u32,
	pub total: u64,
	pub total_is_lower_bound: bool,
	pub items: Vec<SearchHit>,
	pub aggregations: Vec<AggregationResult>,
}
impl SearchResults {
	pub fn empty(request: &ValidatedRequest) -> Self {
		Self {
			entity: request.entity(),
			page: request.request().page,
			per_page: request.per_page(),
			total: 0,
			total_is_lower_bound: false,
			items: Vec::new(),
			aggregations: Vec::new(),
		}
	}

	pub fn from_response(
		request: &ValidatedRequest,
		response: RawResponse,
		window: &BlobWindow<'_>,
	) -> Self {
		let entity = request.entity();
		let total = response.total();
		let total_is_lower_bound = response.total_is_lower_bound();
		let aggregations =
			response.aggregations.as_ref().map(parse_aggregations).unwrap_or_default();
		let items = response
			.hits
			.hits
			.into_iter()
			.map(|hit| {
				let blob = matches!(entity, EntityKind::Blob | EntityKind::WikiBlob)
					.then(|| blob::parse_found_blob(&hit, window));

				SearchHit {
					owner: owner_of(entity, &hit.source),
					blob,
					id: hit.id,
					score: hit.score,
					source: hit.source,
					highlight: hit.highlight,
					matched_queries: hit.matched_queries,
				}
			})
			.collect();

		Self { items, total, total_is_lower_bound, aggregations, ..Self::empty(request) }
	}
}

/// Reads the owning container from a hit's source.
pub fn owner_of(entity: EntityKind, source: &Value) -> Option<Owner> {
	let id = |field: &str| source.get(field).and_then(Value::as_i64);

	match entity {
		EntityKind::User => None,
		EntityKind::Project => id("id").map(Owner::Project),
		EntityKind::Epic => id("group_id").map(Owner::Group),
		EntityKind::WikiBlob => id("project_id")
			.map(Owner::Project)
			.or_else(|| id("group_id").map(Owner::Group)),
		_ => id("project_id").map(Owner::Project),
	}
}

/// `{ name: { buckets: [{ key, doc_count }] } }` into named bucket lists, in name order.
pub fn parse_aggregations(raw: &Value) -> Vec<AggregationResult> {
	let Some(aggregations) = raw.as_object() else {
		return Vec::new();
	};
	let mut out = aggregations
		.iter()
		.map(|(name, aggregation)| AggregationResult {
			name: name.clone(),
			buckets: aggregation
				.get("buckets")
				.and_then(Value::as_array)
				.map(|buckets| buckets.iter().filter_map(parse_bucket).collect())
				.unwrap_or_default(),
		})
		.collect::<Vec<_>>();

	out.sort_by(|a, b| a.name.cmp(&b.name));

	out
}

fn parse_bucket(bucket: &Value) -> Option<AggregationBucket> {
	let key = match bucket.get("key")? {
		Value::String(key) => key.clone(),
		other => other.to_string(),
	};
	let count = bucket.get("doc_count").and_then(Value::as_u64).unwrap_or(0);

	Some(AggregationBucket { key, count })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_owner_per_entity() {
		let source = serde_json::json!({ "id": 3, "project_id": 7, "group_id": 9 });

		assert_eq!(owner_of(EntityKind::Issue, &source), Some(Owner::Project(7)));
		assert_eq!(owner_of(EntityKind::Project, &source), Some(Owner::Project(3)));
		assert_eq!(owner_of(EntityKind::Epic, &source), Some(Owner::Group(9)));
		assert_eq!(owner_of(EntityKind::User, &source), None);
		assert_eq!(
			owner_of(EntityKind::WikiBlob, &serde_json::json!({ "group_id": 9 })),
			Some(Owner::Group(9))
		);
	}

	#[test]
	fn parses_term_buckets() {
		let raw = serde_json::json!({
			"language": { "buckets": [
				{ "key": "Ruby", "doc_count": 12 },
				{ "key": 42, "doc_count": 1 },
				{ "doc_count": 5 }
			] }
		});
		let parsed = parse_aggregations(&raw);

		assert_eq!(parsed.len(), 1);
		assert_eq!(parsed[0].name, "language");
		assert_eq!(
			parsed[0].buckets,
			vec![
				AggregationBucket { key: "Ruby".to_string(), count: 12 },
				AggregationBucket { key: "42".to_string(), count: 1 },
			]
		);
	}
}
