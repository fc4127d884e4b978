use serde::Serialize;

/// Outcome of a count-only query. Counts are advisory, so engine failures degrade instead of
/// failing the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CountOutcome {
	Counted { count: u64, lower_bound: bool },
	Degraded { count: u64, reason: String },
}
impl CountOutcome {
	pub fn count(&self) -> u64 {
		match self {
			Self::Counted { count, .. } | Self::Degraded { count, .. } => *count,
		}
	}

	pub fn is_degraded(&self) -> bool {
		matches!(self, Self::Degraded { .. })
	}

	pub fn formatted(&self, limit: u64) -> String {
		format_count(Some(self.count()), limit)
	}
}

/// Renders a count for display: thousands separated by commas, and `limit+` once the engine
/// stopped counting.
pub fn format_count(count: Option<u64>, limit: u64) -> String {
	match count {
		None => "0".to_string(),
		Some(count) if count >= limit => format!("{}+", with_delimiter(limit)),
		Some(count) => with_delimiter(count),
	}
}

fn with_delimiter(value: u64) -> String {
	let digits = value.to_string();
	let mut out = String::with_capacity(digits.len() + digits.len() / 3);

	for (index, digit) in digits.chars().enumerate() {
		if index > 0 && (digits.len() - index) % 3 == 0 {
			out.push(',');
		}

		out.push(digit);
	}

	out
}
