use std::{
	env, fs,
	path::PathBuf,
	sync::atomic::{AtomicU64, Ordering},
	time::{SystemTime, UNIX_EPOCH},
};

use toml::Value;

use sieve_config::Config;

const SAMPLE_CONFIG_TEMPLATE_TOML: &str = include_str!("fixtures/sample_config.template.toml");

fn sample_toml_with(section: &str, key: &str, value: Value) -> String {
	let mut root: Value =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse template config.");
	let table = root
		.as_table_mut()
		.expect("Template config must be a table.")
		.get_mut(section)
		.and_then(Value::as_table_mut)
		.expect("Template config must include the section.");

	table.insert(key.to_string(), value);

	toml::to_string(&root).expect("Failed to render template config.")
}

fn write_temp_config(payload: String) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	let nanos = SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.expect("System time must be valid.")
		.as_nanos();
	let ordinal = COUNTER.fetch_add(1, Ordering::SeqCst);
	let pid = std::process::id();
	let mut path = env::temp_dir();

	path.push(format!("sieve_config_test_{nanos}_{pid}_{ordinal}.toml"));

	fs::write(&path, payload).expect("Failed to write test config.");

	path
}

fn load_err(payload: String) -> String {
	let path = write_temp_config(payload);
	let result = sieve_config::load(&path);

	fs::remove_file(&path).expect("Failed to remove test config.");

	result.expect_err("Expected validation error.").to_string()
}

#[test]
fn template_config_loads() {
	let path = write_temp_config(SAMPLE_CONFIG_TEMPLATE_TOML.to_string());
	let cfg = sieve_config::load(&path).expect("Template config must load.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(cfg.engine.index, "gitlab-production");
	assert_eq!(cfg.routing.max_ids, 128);
	assert!(cfg.engine.api_key.is_none(), "Blank api_key must normalize to None.");
}

#[test]
fn optional_sections_fall_back_to_defaults() {
	let payload = "\
[service]
log_level = \"debug\"

[engine]
url   = \"http://localhost:9200/\"
index = \"main\"
";
	let path = write_temp_config(payload.to_string());
	let cfg = sieve_config::load(&path).expect("Minimal config must load.");

	fs::remove_file(&path).expect("Failed to remove test config.");

	assert_eq!(cfg.engine.url, "http://localhost:9200");
	assert_eq!(cfg.engine.count_timeout_ms, 1_000);
	assert_eq!(cfg.engine.search_timeout_ms, 30_000);
	assert!(cfg.routing.enabled);
	assert_eq!(cfg.results.count_limit, 10_000);
	assert_eq!(cfg.highlight.pre_tag, "gitlabelasticsearch→");
}

#[test]
fn count_timeout_must_be_shorter_than_search_timeout() {
	let message = load_err(sample_toml_with("engine", "count_timeout_ms", Value::Integer(30_000)));

	assert!(
		message.contains("engine.count_timeout_ms must be less than engine.search_timeout_ms."),
		"Unexpected error message: {message}"
	);
}

#[test]
fn routing_max_ids_must_be_positive() {
	let message = load_err(sample_toml_with("routing", "max_ids", Value::Integer(0)));

	assert!(message.contains("routing.max_ids"), "Unexpected error message: {message}");
}

#[test]
fn highlight_tags_must_differ() {
	let message = load_err(sample_toml_with(
		"highlight",
		"post_tag",
		Value::String("gitlabelasticsearch→".to_string()),
	));

	assert!(
		message.contains("highlight.pre_tag must differ"),
		"Unexpected error message: {message}"
	);
}

#[test]
fn engine_url_requires_scheme() {
	let message =
		load_err(sample_toml_with("engine", "url", Value::String("localhost".to_string())));

	assert!(message.contains("engine.url must start with"), "Unexpected error message: {message}");
}

#[test]
fn per_page_bounds_are_checked() {
	let message = load_err(sample_toml_with("results", "default_per_page", Value::Integer(500)));

	assert!(message.contains("results.default_per_page"), "Unexpected error message: {message}");
}

#[test]
fn validate_accepts_parsed_template() {
	let cfg: Config =
		toml::from_str(SAMPLE_CONFIG_TEMPLATE_TOML).expect("Failed to parse test config.");

	sieve_config::validate(&cfg).expect("Template config must validate.");
}
