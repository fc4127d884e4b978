//! Delete-by-query bodies used when a container is torn down. They share the filter primitives
//! of the search path but never carry text or authorization clauses.

use serde_json::{Value, json};
use sieve_domain::{EntityKind, Id, ParentKind, RoutingKind};

use crate::{
	Error, NameContext, Result,
	clause::{self, BoolQuery},
	filters, routing,
};

/// Version conflicts with concurrent indexing must not abort the deletion.
pub const CONFLICTS: &str = "proceed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WikiContainer {
	Project(Id),
	Group(Id),
}
impl WikiContainer {
	/// Routing id stored on every wiki blob.
	pub fn rid(self) -> String {
		match self {
			Self::Project(id) => format!("wiki_project_{id}"),
			Self::Group(id) => format!("wiki_group_{id}"),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteQuery {
	pub body: Value,
	pub routing: Option<String>,
	pub conflicts: &'static str,
}

/// Removes every wiki blob of `container`. Wiki blobs are routed by root namespace.
pub fn wiki_teardown(container: WikiContainer, root_namespace_id: Option<Id>) -> DeleteQuery {
	let context = NameContext::new("delete").child("wiki");
	let query = BoolQuery::named(context.name())
		.filter(filters::doc_type_filter(EntityKind::WikiBlob.doc_type()))
		.filter(clause::term("rid", container.rid(), context.leaf("rid")));
	let routing =
		root_namespace_id.and_then(|root| routing::namespace_routing(&[root], usize::MAX));

	DeleteQuery { body: json!({ "query": query.into_clause() }), routing, conflicts: CONFLICTS }
}

/// Removes the documents of `kinds` owned by `project_id`.
pub fn project_teardown(project_id: Id, kinds: &[EntityKind]) -> Result<DeleteQuery> {
	let context = NameContext::new("delete").child("project");
	let mut branches = Vec::with_capacity(kinds.len());

	for kind in kinds {
		let schema = kind.schema();

		if matches!(schema.parent, ParentKind::Namespace | ParentKind::None) {
			return Err(Error::InvalidRequest {
				message: format!("{kind} documents are not owned by a project."),
			});
		}

		let branch = context.child(kind);

		branches.push(
			BoolQuery::named(branch.name())
				.filter(filters::doc_type_filter(schema.doc_type))
				.filter(clause::term(
					schema.project_id_field(),
					project_id,
					branch.leaf("project_id"),
				))
				.into_clause(),
		);
	}

	let project_routed = kinds.iter().all(|kind| kind.schema().routing == RoutingKind::Project);
	let routing = if project_routed {
		routing::project_routing(&[project_id], usize::MAX)
	} else {
		None
	};
	let query =
		BoolQuery::named(context.name()).filter(clause::any_of(context.leaf("owned"), branches));

	Ok(DeleteQuery { body: json!({ "query": query.into_clause() }), routing, conflicts: CONFLICTS })
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn wiki_teardown_targets_rid_and_namespace_shard() {
		let delete = wiki_teardown(WikiContainer::Group(4), Some(1));
		let filters = &delete.body["query"]["bool"]["filter"];

		assert_eq!(filters[1]["term"]["rid"]["value"], "wiki_group_4");
		assert_eq!(delete.routing.as_deref(), Some("n_1"));
		assert_eq!(delete.conflicts, "proceed");
	}

	#[test]
	fn project_teardown_rejects_group_documents() {
		assert!(project_teardown(3, &[EntityKind::Epic]).is_err());
	}

	#[test]
	fn project_teardown_routes_only_project_routed_kinds() {
		let routed = project_teardown(3, &[EntityKind::Issue, EntityKind::Blob])
			.expect("Expected a delete query.");
		let mixed = project_teardown(3, &[EntityKind::Issue, EntityKind::WikiBlob])
			.expect("Expected a delete query.");

		assert_eq!(routed.routing.as_deref(), Some("project_3"));
		assert_eq!(mixed.routing, None);
	}
}
