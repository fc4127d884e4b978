//! Authorization facts read from a JSON file, standing in for the membership database.

use std::{
	collections::{BTreeMap, BTreeSet},
	fs,
	path::Path,
};

use color_eyre::eyre;
use serde::Deserialize;

use sieve_domain::{AccessLevel, Feature, Id, Namespace, User};
use sieve_query::ProjectIds;
use sieve_service::{Authorizer, BoxFuture, ContainerLoader, ContainerState};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Fixture {
	/// Reads every project, as admins and auditors do.
	pub all_projects: bool,
	pub projects: Vec<ProjectGrant>,
	pub groups: Vec<GroupGrant>,
	/// Namespaces the requester holds no role in but which requests may still name.
	pub namespaces: Vec<Namespace>,
	/// Projects where a feature is hidden from the requester.
	pub hidden_features: BTreeMap<Feature, Vec<Id>>,
	pub deleted_projects: Vec<Id>,
	pub deleted_groups: Vec<Id>,
}
impl Fixture {
	pub fn load(path: &Path) -> color_eyre::Result<Self> {
		let raw = fs::read_to_string(path)
			.map_err(|err| eyre::eyre!("Failed to read fixture {}: {err}", path.display()))?;
		let fixture: Self = serde_json::from_str(&raw)?;

		Ok(fixture)
	}

	fn readable_project_ids(&self) -> BTreeSet<Id> {
		let direct = self.projects.iter().map(|grant| grant.id);
		let inherited =
			self.groups.iter().flat_map(|grant| grant.namespace.project_ids.iter().copied());

		direct.chain(inherited).collect()
	}

	fn lookup(&self, id: Id) -> Option<&Namespace> {
		self.groups
			.iter()
			.map(|grant| &grant.namespace)
			.chain(self.namespaces.iter())
			.find(|namespace| namespace.id == id)
	}

	/// A role on an ancestor group covers every descendant.
	fn covers_group(&self, id: Id) -> bool {
		let granted: BTreeSet<Id> = self.groups.iter().map(|grant| grant.namespace.id).collect();

		match self.lookup(id) {
			Some(namespace) => namespace.traversal_ids.iter().any(|id| granted.contains(id)),
			None => granted.contains(&id),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectGrant {
	pub id: Id,
	pub access: AccessLevel,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GroupGrant {
	pub namespace: Namespace,
	pub access: AccessLevel,
}

impl Authorizer for Fixture {
	fn authorized_project_ids<'a>(
		&'a self,
		_user: &'a User,
		candidates: Option<&'a [Id]>,
	) -> BoxFuture<'a, color_eyre::Result<ProjectIds>> {
		Box::pin(async move {
			if self.all_projects {
				return Ok(ProjectIds::Any);
			}

			let readable = self.readable_project_ids();

			Ok(match candidates {
				Some(candidates) =>
					candidates.iter().copied().filter(|id| readable.contains(id)).collect(),
				None => ProjectIds::Ids(readable),
			})
		})
	}

	fn authorized_namespace_ids<'a>(
		&'a self,
		_user: &'a User,
		group_ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		Box::pin(async move {
			Ok(group_ids.iter().copied().filter(|id| self.covers_group(*id)).collect())
		})
	}

	fn feature_visible_project_ids<'a>(
		&'a self,
		ids: &'a [Id],
		_user: &'a User,
		feature: Feature,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		Box::pin(async move {
			let hidden = self.hidden_features.get(&feature);

			Ok(ids
				.iter()
				.copied()
				.filter(|id| hidden.map(|hidden| !hidden.contains(id)).unwrap_or(true))
				.collect())
		})
	}

	fn namespaces<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>> {
		Box::pin(
			async move { Ok(ids.iter().filter_map(|id| self.lookup(*id)).cloned().collect()) },
		)
	}

	fn member_namespaces<'a>(
		&'a self,
		_user: &'a User,
		min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>> {
		Box::pin(async move {
			Ok(self
				.groups
				.iter()
				.filter(|grant| grant.access >= min_access)
				.map(|grant| grant.namespace.clone())
				.collect())
		})
	}

	fn member_project_ids<'a>(
		&'a self,
		_user: &'a User,
		min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		Box::pin(async move {
			Ok(self
				.projects
				.iter()
				.filter(|grant| grant.access >= min_access)
				.map(|grant| grant.id)
				.collect())
		})
	}
}

impl ContainerLoader for Fixture {
	fn projects<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>> {
		Box::pin(async move { Ok(states(ids, &self.deleted_projects)) })
	}

	fn groups<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>> {
		Box::pin(async move { Ok(states(ids, &self.deleted_groups)) })
	}
}

fn states(ids: &[Id], deleted: &[Id]) -> Vec<ContainerState> {
	ids.iter()
		.map(|id| ContainerState {
			pending_delete: deleted.contains(id),
			..ContainerState::live(*id)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn fixture() -> Fixture {
		serde_json::from_value(serde_json::json!({
			"projects": [
				{ "id": 1, "access": "guest" },
				{ "id": 2, "access": "developer" }
			],
			"groups": [
				{
					"namespace": { "id": 10, "traversal_ids": [10], "project_ids": [3, 4] },
					"access": "reporter"
				}
			],
			"namespaces": [
				{ "id": 11, "traversal_ids": [10, 11], "project_ids": [4] },
				{ "id": 20, "traversal_ids": [20], "project_ids": [9] }
			],
			"hidden_features": { "issues": [2] },
			"deleted_projects": [3]
		}))
		.expect("Fixture should parse.")
	}

	fn user() -> User {
		User::new(5, "ada")
	}

	#[tokio::test]
	async fn group_roles_grant_their_projects() {
		let fixture = fixture();
		let user = user();
		let projects = fixture
			.authorized_project_ids(&user, None)
			.await
			.expect("Lookup should succeed.");

		assert_eq!(projects, ProjectIds::from_iter([1, 2, 3, 4]));

		let candidates = [2, 9];
		let projects = fixture
			.authorized_project_ids(&user, Some(&candidates[..]))
			.await
			.expect("Lookup should succeed.");

		assert_eq!(projects, ProjectIds::from_iter([2]));
	}

	#[tokio::test]
	async fn ancestor_roles_cover_subgroups() {
		let fixture = fixture();
		let user = user();
		let ids = fixture
			.authorized_namespace_ids(&user, &[10, 11, 20])
			.await
			.expect("Lookup should succeed.");

		assert_eq!(ids, vec![10, 11]);
	}

	#[tokio::test]
	async fn member_lookups_respect_minimum_access() {
		let fixture = fixture();
		let user = user();
		let reporter = fixture
			.member_project_ids(&user, AccessLevel::Reporter)
			.await
			.expect("Lookup should succeed.");
		let guest = fixture
			.member_project_ids(&user, AccessLevel::Guest)
			.await
			.expect("Lookup should succeed.");

		assert_eq!(reporter, vec![2]);
		assert_eq!(guest, vec![1, 2]);

		let groups = fixture
			.member_namespaces(&user, AccessLevel::Developer)
			.await
			.expect("Lookup should succeed.");

		assert!(groups.is_empty());
	}

	#[tokio::test]
	async fn hidden_features_and_deleted_containers() {
		let fixture = fixture();
		let user = user();
		let visible = fixture
			.feature_visible_project_ids(&[1, 2], &user, Feature::Issues)
			.await
			.expect("Lookup should succeed.");

		assert_eq!(visible, vec![1]);

		let states = fixture.projects(&[3, 4]).await.expect("Lookup should succeed.");

		assert!(!states[0].is_live());
		assert!(states[1].is_live());
	}

	#[test]
	fn unknown_fields_are_rejected() {
		let parsed = serde_json::from_value::<Fixture>(serde_json::json!({ "admin": true }));

		assert!(parsed.is_err());
	}
}
