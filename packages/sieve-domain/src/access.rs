use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Project or namespace visibility as stored in the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
	Private,
	Internal,
	Public,
}
impl Visibility {
	pub const ALL: [Self; 3] = [Self::Private, Self::Internal, Self::Public];

	pub fn level(self) -> i64 {
		match self {
			Self::Private => 0,
			Self::Internal => 10,
			Self::Public => 20,
		}
	}
}

impl Display for Visibility {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.level().fmt(f)
	}
}

/// Per-project feature setting gating a feature's documents independently of project visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureAccess {
	Disabled,
	Private,
	Enabled,
}
impl FeatureAccess {
	pub fn level(self) -> i64 {
		match self {
			Self::Disabled => 0,
			Self::Private => 10,
			Self::Enabled => 20,
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
	Issues,
	MergeRequests,
	Repository,
	Wiki,
	Snippets,
}
impl Feature {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Issues => "issues",
			Self::MergeRequests => "merge_requests",
			Self::Repository => "repository",
			Self::Wiki => "wiki",
			Self::Snippets => "snippets",
		}
	}

	/// Name of the denormalized field holding this feature's [`FeatureAccess`] level.
	pub fn access_level_field(self) -> String {
		format!("{}_access_level", self.as_str())
	}
}

impl Display for Feature {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

/// Membership role thresholds used when asking for authorized projects or namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessLevel {
	Guest,
	Reporter,
	Developer,
	Maintainer,
	Owner,
}
impl AccessLevel {
	pub fn value(self) -> i64 {
		match self {
			Self::Guest => 10,
			Self::Reporter => 20,
			Self::Developer => 30,
			Self::Maintainer => 40,
			Self::Owner => 50,
		}
	}
}

/// A group or user namespace with its materialized ancestry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
	pub id: crate::Id,
	/// Ids from the root namespace down to and including this one.
	pub traversal_ids: Vec<crate::Id>,
	/// Every project below this namespace, descendants included.
	#[serde(default)]
	pub project_ids: Vec<crate::Id>,
}
impl Namespace {
	/// Dash-joined ancestry with a trailing dash, so `1-2-` never prefixes `1-23-`.
	pub fn ancestry(&self) -> String {
		let mut out = String::new();

		for id in &self.traversal_ids {
			out.push_str(&id.to_string());
			out.push('-');
		}

		out
	}

	pub fn root_id(&self) -> crate::Id {
		self.traversal_ids.first().copied().unwrap_or(self.id)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn ancestry_ends_with_separator() {
		let namespace = Namespace { id: 3, traversal_ids: vec![1, 2, 3], project_ids: Vec::new() };

		assert_eq!(namespace.ancestry(), "1-2-3-");
		assert_eq!(namespace.root_id(), 1);
	}
}
