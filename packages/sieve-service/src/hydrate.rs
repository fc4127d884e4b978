//! Drops hits whose owning project or group was deleted after indexing.
//!
//! Owners are loaded in one batch per container kind. A dropped hit lowers the reported total
//! so pagination stays consistent.

use std::collections::BTreeSet;

use sieve_domain::{EntityKind, Id};

use crate::{ContainerLoader, ContainerState, Error, Owner, Result, SearchResults};

pub async fn hydrate(
	loader: &dyn ContainerLoader,
	mut results: SearchResults,
) -> Result<SearchResults> {
	if results.entity == EntityKind::User || results.items.is_empty() {
		return Ok(results);
	}

	let mut project_ids = BTreeSet::new();
	let mut group_ids = BTreeSet::new();

	for owner in results.items.iter().filter_map(|item| item.owner) {
		match owner {
			Owner::Project(id) => project_ids.insert(id),
			Owner::Group(id) => group_ids.insert(id),
		};
	}

	let live_projects = if project_ids.is_empty() {
		BTreeSet::new()
	} else {
		live(loader.projects(&collect(&project_ids)).await, "projects")?
	};
	let live_groups = if group_ids.is_empty() {
		BTreeSet::new()
	} else {
		live(loader.groups(&collect(&group_ids)).await, "groups")?
	};
	let entity = results.entity;
	let before = results.items.len();

	results.items.retain(|item| {
		let kept = match item.owner {
			Some(Owner::Project(id)) => live_projects.contains(&id),
			Some(Owner::Group(id)) => live_groups.contains(&id),
			None => owner_optional(entity),
		};

		if !kept {
			tracing::warn!(
				entity = %entity,
				hit = %item.id,
				owner = ?item.owner,
				"Dropping hit whose owner is gone or scheduled for deletion."
			);
		}

		kept
	});

	let dropped = u64::try_from(before - results.items.len()).unwrap_or(u64::MAX);

	results.total = results.total.saturating_sub(dropped);

	Ok(results)
}

/// Personal snippets belong to no container and have nothing to check.
fn owner_optional(entity: EntityKind) -> bool {
	entity == EntityKind::Snippet
}

fn collect(ids: &BTreeSet<Id>) -> Vec<Id> {
	ids.iter().copied().collect()
}

fn live(
	loaded: color_eyre::Result<Vec<ContainerState>>,
	kind: &'static str,
) -> Result<BTreeSet<Id>> {
	let states = loaded.map_err(|err| Error::Hydration {
		message: format!("Failed to load {kind}: {err}"),
	})?;

	Ok(states.into_iter().filter(ContainerState::is_live).map(|state| state.id).collect())
}
