use serde::{Deserialize, Serialize};

use crate::{Id, Visibility};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
	pub id: Id,
	pub username: String,
	#[serde(default)]
	pub admin: bool,
	#[serde(default)]
	pub auditor: bool,
	#[serde(default)]
	pub external: bool,
	#[serde(default = "default_cross_project")]
	pub can_read_cross_project: bool,
}
impl User {
	pub fn new(id: Id, username: impl Into<String>) -> Self {
		Self {
			id,
			username: username.into(),
			admin: false,
			auditor: false,
			external: false,
			can_read_cross_project: true,
		}
	}

	/// Admins and auditors may read every resource but are still bound by feature gating.
	pub fn can_read_all_resources(&self) -> bool {
		self.admin || self.auditor
	}

	pub fn can_admin_all_resources(&self) -> bool {
		self.admin
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Requester {
	#[default]
	Anonymous,
	User(User),
}
impl Requester {
	pub fn user(&self) -> Option<&User> {
		match self {
			Self::Anonymous => None,
			Self::User(user) => Some(user),
		}
	}

	pub fn is_anonymous(&self) -> bool {
		matches!(self, Self::Anonymous)
	}

	pub fn can_read_all_resources(&self) -> bool {
		self.user().map(User::can_read_all_resources).unwrap_or(false)
	}

	pub fn can_admin_all_resources(&self) -> bool {
		self.user().map(User::can_admin_all_resources).unwrap_or(false)
	}

	/// Authenticated, non-external users see internal content.
	pub fn sees_internal(&self) -> bool {
		self.user().map(|user| !user.external).unwrap_or(false)
	}

	/// Anonymous users keep cross-project reads; only an explicit denial on a user disables them.
	pub fn can_read_cross_project(&self) -> bool {
		self.user().map(|user| user.can_read_cross_project).unwrap_or(true)
	}

	/// Visibility levels readable without membership.
	pub fn visibility_levels(&self) -> Vec<Visibility> {
		if self.can_read_all_resources() {
			return Visibility::ALL.to_vec();
		}
		if self.sees_internal() {
			return vec![Visibility::Internal, Visibility::Public];
		}

		vec![Visibility::Public]
	}
}

fn default_cross_project() -> bool {
	true
}
