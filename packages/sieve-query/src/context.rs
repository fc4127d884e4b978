use std::fmt::Display;

/// Colon-joined path naming the clause being built, e.g. `filters:project:membership:id`.
///
/// Contexts are values: [`NameContext::child`] returns a new context and never alters the
/// receiver, so sibling branches cannot leak segments into each other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameContext {
	path: String,
}
impl NameContext {
	pub fn root() -> Self {
		Self::default()
	}

	pub fn new(segment: impl Display) -> Self {
		Self { path: segment.to_string() }
	}

	pub fn child(&self, segment: impl Display) -> Self {
		Self { path: self.leaf(segment) }
	}

	pub fn name(&self) -> String {
		self.path.clone()
	}

	pub fn leaf(&self, segment: impl Display) -> String {
		if self.path.is_empty() { segment.to_string() } else { format!("{}:{segment}", self.path) }
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn children_do_not_touch_their_parent() {
		let filters = NameContext::new("filters");
		let project = filters.child("project");

		assert_eq!(project.leaf("membership:id"), "filters:project:membership:id");
		assert_eq!(filters.name(), "filters");
		assert_eq!(NameContext::root().leaf("doc"), "doc");
	}
}
