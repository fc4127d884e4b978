use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub engine: Engine,
	#[serde(default)]
	pub routing: Routing,
	#[serde(default)]
	pub highlight: Highlight,
	#[serde(default)]
	pub results: Results,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Engine {
	pub url: String,
	pub index: String,
	/// Optional. Sent as an `ApiKey` authorization header when present.
	pub api_key: Option<String>,
	/// Count-only queries run on every page load and must fail fast.
	#[serde(default = "default_count_timeout_ms")]
	pub count_timeout_ms: u64,
	#[serde(default = "default_search_timeout_ms")]
	pub search_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Routing {
	#[serde(default = "default_true")]
	pub enabled: bool,
	/// Requests spanning more ids than this are broadcast to every shard.
	#[serde(default = "default_routing_max_ids")]
	pub max_ids: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Highlight {
	#[serde(default = "default_pre_tag")]
	pub pre_tag: String,
	#[serde(default = "default_post_tag")]
	pub post_tag: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Results {
	#[serde(default = "default_count_limit")]
	pub count_limit: u64,
	#[serde(default = "default_per_page")]
	pub default_per_page: u32,
	#[serde(default = "default_max_per_page")]
	pub max_per_page: u32,
	#[serde(default = "default_context_lines")]
	pub default_context_lines: u32,
	#[serde(default = "default_max_context_lines")]
	pub max_context_lines: u32,
}

impl Default for Routing {
	fn default() -> Self {
		Self { enabled: true, max_ids: default_routing_max_ids() }
	}
}

impl Default for Highlight {
	fn default() -> Self {
		Self { pre_tag: default_pre_tag(), post_tag: default_post_tag() }
	}
}

impl Default for Results {
	fn default() -> Self {
		Self {
			count_limit: default_count_limit(),
			default_per_page: default_per_page(),
			max_per_page: default_max_per_page(),
			default_context_lines: default_context_lines(),
			max_context_lines: default_max_context_lines(),
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_count_timeout_ms() -> u64 {
	1_000
}

fn default_search_timeout_ms() -> u64 {
	30_000
}

fn default_routing_max_ids() -> usize {
	128
}

fn default_pre_tag() -> String {
	"gitlabelasticsearch→".to_string()
}

fn default_post_tag() -> String {
	"←gitlabelasticsearch".to_string()
}

fn default_count_limit() -> u64 {
	10_000
}

fn default_per_page() -> u32 {
	20
}

fn default_max_per_page() -> u32 {
	100
}

fn default_context_lines() -> u32 {
	2
}

fn default_max_context_lines() -> u32 {
	20
}
