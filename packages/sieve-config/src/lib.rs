mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Engine, Highlight, Results, Routing, Service};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	for (label, value) in [
		("service.log_level", &cfg.service.log_level),
		("engine.url", &cfg.engine.url),
		("engine.index", &cfg.engine.index),
	] {
		if value.trim().is_empty() {
			return Err(Error::Validation { message: format!("{label} must be non-empty.") });
		}
	}

	if !cfg.engine.url.starts_with("http://") && !cfg.engine.url.starts_with("https://") {
		return Err(Error::Validation {
			message: "engine.url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.engine.count_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "engine.count_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.engine.search_timeout_ms == 0 {
		return Err(Error::Validation {
			message: "engine.search_timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.engine.count_timeout_ms >= cfg.engine.search_timeout_ms {
		return Err(Error::Validation {
			message: "engine.count_timeout_ms must be less than engine.search_timeout_ms."
				.to_string(),
		});
	}
	if cfg.routing.max_ids == 0 {
		return Err(Error::Validation {
			message: "routing.max_ids must be greater than zero.".to_string(),
		});
	}
	if cfg.highlight.pre_tag.is_empty() || cfg.highlight.post_tag.is_empty() {
		return Err(Error::Validation {
			message: "highlight.pre_tag and highlight.post_tag must be non-empty.".to_string(),
		});
	}
	if cfg.highlight.pre_tag == cfg.highlight.post_tag {
		return Err(Error::Validation {
			message: "highlight.pre_tag must differ from highlight.post_tag.".to_string(),
		});
	}
	if cfg.results.default_per_page == 0 {
		return Err(Error::Validation {
			message: "results.default_per_page must be greater than zero.".to_string(),
		});
	}
	if cfg.results.default_per_page > cfg.results.max_per_page {
		return Err(Error::Validation {
			message: "results.default_per_page must not exceed results.max_per_page.".to_string(),
		});
	}
	if cfg.results.default_context_lines > cfg.results.max_context_lines {
		return Err(Error::Validation {
			message: "results.default_context_lines must not exceed results.max_context_lines."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.engine.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.engine.api_key = None;
	}

	let trimmed = cfg.engine.url.trim().trim_end_matches('/').to_string();

	cfg.engine.url = trimmed;
}
