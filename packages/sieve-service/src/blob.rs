//! Reconstructs code and wiki blob hits into a window of lines around the first highlight.

use serde::Serialize;
use serde_json::Value;
use sieve_domain::Id;
use sieve_providers::RawHit;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FoundBlob {
	pub path: String,
	/// Path without its extension.
	pub basename: String,
	pub git_ref: Option<String>,
	/// One-based number of the first line in `data`.
	pub startline: usize,
	/// One-based line holding the first highlight, when the engine returned one.
	pub highlight_line: Option<usize>,
	pub data: String,
	pub project_id: Option<Id>,
	pub group_id: Option<Id>,
	/// Group wiki pages belong to a group rather than a project.
	pub group_level: bool,
}

pub struct BlobWindow<'a> {
	pub pre_tag: &'a str,
	pub context_lines: usize,
}

pub fn parse_found_blob(hit: &RawHit, window: &BlobWindow<'_>) -> FoundBlob {
	let source = &hit.source;
	let wiki = source.get("type").and_then(Value::as_str) == Some("wiki_blob");
	let (prefix, content_key) = if wiki { ("", "content") } else { ("blob.", "blob.content") };
	let field = |name: &str| nested_str(source, &format!("{prefix}{name}"));
	let path = field("path").unwrap_or_default();
	let content = field("content").unwrap_or_default();
	let highlighted =
		hit.highlight.get(content_key).and_then(|values| values.first()).map(String::as_str);
	let found = highlighted
		.and_then(|text| text.lines().position(|line| line.contains(window.pre_tag)));
	let lines = content.split_inclusive('\n').collect::<Vec<_>>();
	let line = found.unwrap_or(0);
	let from = line.saturating_sub(window.context_lines).min(lines.len());
	let to = (line + window.context_lines + 1).min(lines.len()).max(from);
	let project_id = source.get("project_id").and_then(Value::as_i64);

	FoundBlob {
		basename: basename(&path),
		path,
		git_ref: field("commit_sha"),
		startline: from + 1,
		highlight_line: found.map(|line| line + 1),
		data: lines[from..to].concat(),
		project_id,
		group_id: source.get("group_id").and_then(Value::as_i64),
		group_level: project_id.is_none(),
	}
}

fn basename(path: &str) -> String {
	let (dir, file) = match path.rsplit_once('/') {
		Some((dir, file)) => (Some(dir), file),
		None => (None, path),
	};
	let stem = match file.rsplit_once('.') {
		Some((stem, _)) if !stem.is_empty() => stem,
		_ => file,
	};

	match dir {
		Some(dir) => format!("{dir}/{stem}"),
		None => stem.to_string(),
	}
}

/// Reads `a.b` either as a nested object or as a flattened key.
fn nested_str(source: &Value, path: &str) -> Option<String> {
	let value = source.get(path).or_else(|| {
		path.split('.').try_fold(source, |value, segment| value.get(segment))
	})?;

	value.as_str().map(str::to_string)
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use super::*;

	const PRE: &str = "gitlabelasticsearch→";

	fn hit(source: Value, highlight: Option<(&str, String)>) -> RawHit {
		let mut highlights = BTreeMap::new();

		if let Some((key, text)) = highlight {
			highlights.insert(key.to_string(), vec![text]);
		}

		RawHit {
			id: "blob_1".to_string(),
			score: Some(1.0),
			routing: None,
			source,
			highlight: highlights,
			matched_queries: Vec::new(),
		}
	}

	#[test]
	fn windows_around_the_first_highlight() {
		let content = "one\ntwo\nthree\nfour\nfive\nsix\n";
		let highlighted = format!("one\ntwo\nthree\n{PRE}four←\nfive\nsix\n");
		let source = serde_json::json!({
			"type": "blob",
			"project_id": 4,
			"blob": { "path": "app/models/user.rb", "content": content, "commit_sha": "abc" }
		});
		let found = parse_found_blob(
			&hit(source, Some(("blob.content", highlighted))),
			&BlobWindow { pre_tag: PRE, context_lines: 1 },
		);

		assert_eq!(found.startline, 3);
		assert_eq!(found.highlight_line, Some(4));
		assert_eq!(found.data, "three\nfour\nfive\n");
		assert_eq!(found.basename, "app/models/user");
		assert_eq!(found.git_ref.as_deref(), Some("abc"));
		assert!(!found.group_level);
	}

	#[test]
	fn group_wiki_pages_without_highlight_start_at_the_top() {
		let source = serde_json::json!({
			"type": "wiki_blob",
			"group_id": 9,
			"path": "home.md",
			"content": "# Home\nWelcome\nMore\nEven more\n",
			"commit_sha": "def"
		});
		let found =
			parse_found_blob(&hit(source, None), &BlobWindow { pre_tag: PRE, context_lines: 2 });

		assert_eq!(found.startline, 1);
		assert_eq!(found.highlight_line, None);
		assert_eq!(found.data, "# Home\nWelcome\nMore\n");
		assert_eq!(found.basename, "home");
		assert!(found.group_level);
		assert_eq!(found.group_id, Some(9));
	}

	#[test]
	fn empty_content_yields_an_empty_window() {
		let source = serde_json::json!({ "type": "blob", "project_id": 1, "blob": {} });
		let found =
			parse_found_blob(&hit(source, None), &BlobWindow { pre_tag: PRE, context_lines: 2 });

		assert_eq!(found.data, "");
		assert_eq!(found.path, "");
		assert_eq!(found.startline, 1);
	}
}
