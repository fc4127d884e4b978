//! Shard routing. Routing only narrows which shards are asked; omitting it broadcasts the query
//! and never changes which documents match.

use sieve_domain::{Id, RoutingKind, SearchScope, ValidatedRequest};

use crate::{AuthorizationContext, ProjectIds, QuerySettings};

/// Routing key for `ids`, or `None` when the list is empty or wider than `max_ids`.
pub fn routing_key(prefix: &str, ids: &[Id], max_ids: usize) -> Option<String> {
	if ids.is_empty() || ids.len() > max_ids {
		return None;
	}

	Some(ids.iter().map(|id| format!("{prefix}_{id}")).collect::<Vec<_>>().join(","))
}

pub fn project_routing(ids: &[Id], max_ids: usize) -> Option<String> {
	routing_key("project", ids, max_ids)
}

pub fn group_routing(root_ids: &[Id], max_ids: usize) -> Option<String> {
	routing_key("group", root_ids, max_ids)
}

pub fn namespace_routing(root_ids: &[Id], max_ids: usize) -> Option<String> {
	routing_key("n", root_ids, max_ids)
}

/// Picks routing for a compiled request. Requests spanning public and internal projects can
/// match anywhere and are never routed.
pub fn select(
	request: &ValidatedRequest,
	auth: &AuthorizationContext,
	settings: &QuerySettings,
) -> Option<String> {
	if !settings.routing_enabled
		|| request.options().routing_disabled
		|| request.public_and_internal()
	{
		return None;
	}

	let max_ids = settings.routing_max_ids;
	let routing = match request.schema().routing {
		RoutingKind::Project if request.scope() == SearchScope::Project =>
			project_routing(&auth.scoped_requested_project_ids(), max_ids),
		RoutingKind::Project => match auth.scoped_projects() {
			ProjectIds::Any => None,
			ProjectIds::Ids(ids) => project_routing(&ids.into_iter().collect::<Vec<_>>(), max_ids),
		},
		RoutingKind::RootNamespace => group_routing(&request.options().root_ancestor_ids, max_ids),
		RoutingKind::Namespace => namespace_routing(&request.options().root_ancestor_ids, max_ids),
		RoutingKind::None => None,
	};

	if routing.is_none() {
		tracing::debug!(entity = %request.entity(), "Broadcasting query without routing.");
	}

	routing
}
