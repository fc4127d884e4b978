//! Structured operators embedded in code search queries (`filename:`, `path:`, `extension:`,
//! `blob:`), optionally negated with a leading `-`.

use regex::Regex;

const OPERATOR_PATTERN: &str = r#"(?:^|\s)(-?)(filename|path|extension|blob):("[^"]*"|\S+)"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorKind {
	Filename,
	Path,
	Extension,
	Blob,
}
impl OperatorKind {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Filename => "filename",
			Self::Path => "path",
			Self::Extension => "extension",
			Self::Blob => "blob",
		}
	}

	fn parse(raw: &str) -> Option<Self> {
		match raw {
			"filename" => Some(Self::Filename),
			"path" => Some(Self::Path),
			"extension" => Some(Self::Extension),
			"blob" => Some(Self::Blob),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOperator {
	pub kind: OperatorKind,
	pub value: String,
	pub negated: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedQuery {
	/// Query text with every recognized operator removed.
	pub term: String,
	pub operators: Vec<QueryOperator>,
}

pub fn parse(query: &str) -> ParsedQuery {
	let Ok(re) = Regex::new(OPERATOR_PATTERN) else {
		return ParsedQuery { term: query.trim().to_string(), operators: Vec::new() };
	};
	let mut operators = Vec::new();
	let mut term = String::with_capacity(query.len());
	let mut cursor = 0;

	for caps in re.captures_iter(query) {
		let (Some(whole), Some(sign), Some(name), Some(value)) =
			(caps.get(0), caps.get(1), caps.get(2), caps.get(3))
		else {
			continue;
		};
		let Some(kind) = OperatorKind::parse(name.as_str()) else {
			continue;
		};
		let value = value.as_str().trim_matches('"');

		term.push_str(&query[cursor..whole.start()]);
		term.push(' ');

		cursor = whole.end();

		if value.is_empty() {
			continue;
		}

		operators.push(QueryOperator {
			kind,
			value: value.to_string(),
			negated: !sign.as_str().is_empty(),
		});
	}

	term.push_str(&query[cursor..]);

	ParsedQuery { term: term.split_whitespace().collect::<Vec<_>>().join(" "), operators }
}
