use std::time::Duration;

/// Compiler knobs taken from the `[engine]`, `[routing]` and `[highlight]` config sections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySettings {
	pub pre_tag: String,
	pub post_tag: String,
	pub routing_enabled: bool,
	pub routing_max_ids: usize,
	pub count_timeout: Duration,
	pub search_timeout: Duration,
	pub max_context_lines: u32,
}
impl QuerySettings {
	pub fn from_config(cfg: &sieve_config::Config) -> Self {
		Self {
			pre_tag: cfg.highlight.pre_tag.clone(),
			post_tag: cfg.highlight.post_tag.clone(),
			routing_enabled: cfg.routing.enabled,
			routing_max_ids: cfg.routing.max_ids,
			count_timeout: Duration::from_millis(cfg.engine.count_timeout_ms),
			search_timeout: Duration::from_millis(cfg.engine.search_timeout_ms),
			max_context_lines: cfg.results.max_context_lines,
		}
	}

	pub fn timeout(&self, count_only: bool) -> Duration {
		if count_only { self.count_timeout } else { self.search_timeout }
	}
}

impl Default for QuerySettings {
	fn default() -> Self {
		let highlight = sieve_config::Highlight::default();
		let routing = sieve_config::Routing::default();

		Self {
			pre_tag: highlight.pre_tag,
			post_tag: highlight.post_tag,
			routing_enabled: routing.enabled,
			routing_max_ids: routing.max_ids,
			count_timeout: Duration::from_secs(1),
			search_timeout: Duration::from_secs(30),
			max_context_lines: sieve_config::Results::default().max_context_lines,
		}
	}
}
