//! Wire shapes of search responses. Only the parts the service reads are modeled.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawResponse {
	#[serde(default)]
	pub took: u64,
	#[serde(default)]
	pub timed_out: bool,
	#[serde(default)]
	pub hits: RawHits,
	#[serde(default)]
	pub aggregations: Option<Value>,
}
impl RawResponse {
	/// Total matches, or 0 when the engine did not report one.
	pub fn total(&self) -> u64 {
		match &self.hits.total {
			Some(Total::Count(count)) => *count,
			Some(Total::Tracked { value, .. }) => *value,
			None => 0,
		}
	}

	/// Whether the total is a lower bound because tracking stopped early.
	pub fn total_is_lower_bound(&self) -> bool {
		matches!(
			&self.hits.total,
			Some(Total::Tracked { relation: Some(relation), .. }) if relation == "gte"
		)
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawHits {
	#[serde(default)]
	pub total: Option<Total>,
	#[serde(default)]
	pub max_score: Option<f64>,
	#[serde(default)]
	pub hits: Vec<RawHit>,
}

/// Engines report totals either as a bare number or as `{ value, relation }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Total {
	Count(u64),
	Tracked { value: u64, relation: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawHit {
	#[serde(rename = "_id")]
	pub id: String,
	#[serde(rename = "_score", default)]
	pub score: Option<f64>,
	#[serde(rename = "_routing", default)]
	pub routing: Option<String>,
	#[serde(rename = "_source", default)]
	pub source: Value,
	#[serde(default)]
	pub highlight: BTreeMap<String, Vec<String>>,
	#[serde(default)]
	pub matched_queries: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DeleteByQueryResponse {
	#[serde(default)]
	pub deleted: u64,
	#[serde(default)]
	pub version_conflicts: u64,
	#[serde(default)]
	pub failures: Vec<Value>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reads_both_total_shapes() {
		let tracked: RawResponse = serde_json::from_value(serde_json::json!({
			"took": 3,
			"hits": { "total": { "value": 10000, "relation": "gte" }, "hits": [] }
		}))
		.expect("Failed to parse response.");
		let bare: RawResponse =
			serde_json::from_value(serde_json::json!({ "hits": { "total": 4, "hits": [] } }))
				.expect("Failed to parse response.");

		assert_eq!(tracked.total(), 10_000);
		assert!(tracked.total_is_lower_bound());
		assert_eq!(bare.total(), 4);
		assert!(!bare.total_is_lower_bound());
	}

	#[test]
	fn hits_keep_matched_queries_and_highlights() {
		let response: RawResponse = serde_json::from_value(serde_json::json!({
			"hits": {
				"total": { "value": 1, "relation": "eq" },
				"hits": [{
					"_id": "issue_7",
					"_score": 1.5,
					"_source": { "id": 7, "project_id": 2 },
					"highlight": { "title": ["<em>fix</em> bug"] },
					"matched_queries": ["issue:multi_match:and:search_terms"]
				}]
			}
		}))
		.expect("Failed to parse response.");
		let hit = &response.hits.hits[0];

		assert_eq!(hit.id, "issue_7");
		assert_eq!(hit.source["project_id"], 2);
		assert_eq!(hit.highlight["title"], vec!["<em>fix</em> bug".to_string()]);
		assert_eq!(hit.matched_queries, vec!["issue:multi_match:and:search_terms".to_string()]);
	}
}
