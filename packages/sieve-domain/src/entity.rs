use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::Feature;

/// Every searchable document kind sharing the physical index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
	Issue,
	MergeRequest,
	Project,
	Epic,
	WikiBlob,
	Snippet,
	Commit,
	Blob,
	User,
}
impl EntityKind {
	pub const ALL: [Self; 9] = [
		Self::Project,
		Self::Blob,
		Self::WikiBlob,
		Self::Commit,
		Self::Issue,
		Self::MergeRequest,
		Self::Epic,
		Self::Snippet,
		Self::User,
	];

	pub fn doc_type(self) -> &'static str {
		self.schema().doc_type
	}

	pub fn schema(self) -> &'static EntitySchema {
		match self {
			Self::Issue => &ISSUE,
			Self::MergeRequest => &MERGE_REQUEST,
			Self::Project => &PROJECT,
			Self::Epic => &EPIC,
			Self::WikiBlob => &WIKI_BLOB,
			Self::Snippet => &SNIPPET,
			Self::Commit => &COMMIT,
			Self::Blob => &BLOB,
			Self::User => &USER,
		}
	}

	/// Commits, blobs and wiki blobs are hydrated against their owning containers.
	pub fn is_git_content(self) -> bool {
		matches!(self, Self::Commit | Self::Blob | Self::WikiBlob)
	}
}

impl Display for EntityKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.doc_type().fmt(f)
	}
}

/// How a document relates to the project that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentKind {
	/// Child document physically joined under a `project` parent document.
	Project,
	/// Project permissions are copied onto the document; the project id lives in the field.
	Denormalized { project_id_field: &'static str },
	/// Group-level document authorized through namespace visibility and traversal ids.
	Namespace,
	None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingKind {
	/// `project_<id>`
	Project,
	/// `group_<root id>`
	RootNamespace,
	/// `n_<root id>`
	Namespace,
	None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortFields {
	pub created: &'static str,
	pub updated: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aggregation {
	pub name: &'static str,
	pub field: &'static str,
}

#[derive(Debug)]
pub struct EntitySchema {
	pub kind: EntityKind,
	pub doc_type: &'static str,
	/// Searchable fields, optionally boosted with a `^n` suffix.
	pub fields: &'static [&'static str],
	pub features: &'static [Feature],
	pub parent: ParentKind,
	pub traversal_ids_field: Option<&'static str>,
	pub visibility_field: &'static str,
	pub confidential: bool,
	pub hidden: bool,
	pub archived: bool,
	pub routing: RoutingKind,
	pub sort: Option<SortFields>,
	pub aggregation: Option<Aggregation>,
}
impl EntitySchema {
	pub fn is_joined(&self) -> bool {
		matches!(self.parent, ParentKind::Project)
	}

	pub fn project_id_field(&self) -> &'static str {
		match self.parent {
			ParentKind::Denormalized { project_id_field } => project_id_field,
			_ => "project_id",
		}
	}

	pub fn supports_traversal(&self) -> bool {
		self.traversal_ids_field.is_some()
	}
}

const TIMESTAMPS: SortFields = SortFields { created: "created_at", updated: "updated_at" };
const LABELS: Aggregation = Aggregation { name: "labels", field: "label_names" };

static ISSUE: EntitySchema = EntitySchema {
	kind: EntityKind::Issue,
	doc_type: "issue",
	fields: &["iid^50", "title^2", "description"],
	features: &[Feature::Issues],
	parent: ParentKind::Denormalized { project_id_field: "project_id" },
	traversal_ids_field: Some("traversal_ids"),
	visibility_field: "visibility_level",
	confidential: true,
	hidden: true,
	archived: true,
	routing: RoutingKind::Project,
	sort: Some(TIMESTAMPS),
	aggregation: Some(LABELS),
};
static MERGE_REQUEST: EntitySchema = EntitySchema {
	kind: EntityKind::MergeRequest,
	doc_type: "merge_request",
	fields: &["iid^3", "title^2", "description"],
	features: &[Feature::MergeRequests],
	parent: ParentKind::Denormalized { project_id_field: "project_id" },
	traversal_ids_field: Some("traversal_ids"),
	visibility_field: "visibility_level",
	confidential: false,
	hidden: true,
	archived: true,
	routing: RoutingKind::Project,
	sort: Some(TIMESTAMPS),
	aggregation: Some(LABELS),
};
static PROJECT: EntitySchema = EntitySchema {
	kind: EntityKind::Project,
	doc_type: "project",
	fields: &["name^10", "name_with_namespace^2", "path_with_namespace", "path^9", "description"],
	features: &[],
	parent: ParentKind::Denormalized { project_id_field: "id" },
	traversal_ids_field: Some("traversal_ids"),
	visibility_field: "visibility_level",
	confidential: false,
	hidden: false,
	archived: true,
	routing: RoutingKind::None,
	sort: Some(TIMESTAMPS),
	aggregation: None,
};
static EPIC: EntitySchema = EntitySchema {
	kind: EntityKind::Epic,
	doc_type: "epic",
	fields: &["title^2", "description"],
	features: &[],
	parent: ParentKind::Namespace,
	traversal_ids_field: Some("traversal_ids"),
	visibility_field: "namespace_visibility_level",
	confidential: true,
	hidden: false,
	archived: false,
	routing: RoutingKind::RootNamespace,
	sort: Some(TIMESTAMPS),
	aggregation: None,
};
static WIKI_BLOB: EntitySchema = EntitySchema {
	kind: EntityKind::WikiBlob,
	doc_type: "wiki_blob",
	fields: &["content", "file_name", "path"],
	features: &[Feature::Wiki],
	parent: ParentKind::Denormalized { project_id_field: "project_id" },
	traversal_ids_field: Some("traversal_ids"),
	visibility_field: "visibility_level",
	confidential: false,
	hidden: false,
	archived: true,
	routing: RoutingKind::Namespace,
	sort: None,
	aggregation: None,
};
static SNIPPET: EntitySchema = EntitySchema {
	kind: EntityKind::Snippet,
	doc_type: "snippet",
	fields: &["title^2", "file_name", "content", "description"],
	features: &[Feature::Snippets],
	parent: ParentKind::Project,
	traversal_ids_field: None,
	visibility_field: "visibility_level",
	confidential: false,
	hidden: false,
	archived: false,
	routing: RoutingKind::None,
	sort: Some(TIMESTAMPS),
	aggregation: None,
};
static COMMIT: EntitySchema = EntitySchema {
	kind: EntityKind::Commit,
	doc_type: "commit",
	fields: &[
		"commit.message^10",
		"commit.sha^5",
		"commit.author.name^2",
		"commit.author.email^2",
		"commit.committer.name",
		"commit.committer.email",
	],
	features: &[Feature::Repository],
	parent: ParentKind::Project,
	traversal_ids_field: None,
	visibility_field: "visibility_level",
	confidential: false,
	hidden: false,
	archived: true,
	routing: RoutingKind::Project,
	sort: Some(SortFields {
		created: "commit.committed_date",
		updated: "commit.committed_date",
	}),
	aggregation: None,
};
static BLOB: EntitySchema = EntitySchema {
	kind: EntityKind::Blob,
	doc_type: "blob",
	fields: &["blob.content", "blob.file_name", "blob.path"],
	features: &[Feature::Repository],
	parent: ParentKind::Project,
	traversal_ids_field: None,
	visibility_field: "visibility_level",
	confidential: false,
	hidden: false,
	archived: true,
	routing: RoutingKind::Project,
	sort: None,
	aggregation: Some(Aggregation { name: "language", field: "blob.language" }),
};
static USER: EntitySchema = EntitySchema {
	kind: EntityKind::User,
	doc_type: "user",
	fields: &["name^3", "username^2", "public_email"],
	features: &[],
	parent: ParentKind::None,
	traversal_ids_field: Some("namespace_ancestry_ids"),
	visibility_field: "visibility_level",
	confidential: false,
	hidden: false,
	archived: false,
	routing: RoutingKind::None,
	sort: Some(TIMESTAMPS),
	aggregation: None,
};

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schemas_are_indexed_by_their_own_kind() {
		for kind in EntityKind::ALL {
			assert_eq!(kind.schema().kind, kind, "schema mismatch for {kind}");
		}
	}

	#[test]
	fn joined_entities_have_features() {
		for kind in EntityKind::ALL {
			let schema = kind.schema();

			if schema.is_joined() {
				assert!(!schema.features.is_empty(), "{kind} is joined but ungated");
			}
		}
	}
}
