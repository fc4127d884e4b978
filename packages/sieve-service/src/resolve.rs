//! Builds the [`AuthorizationContext`] for a request from the authorization collaborator.
//!
//! Resolution never fails: a lookup error leaves the corresponding fact empty, which the query
//! compiler turns into clauses that match nothing.

use std::collections::BTreeSet;

use sieve_domain::{AccessLevel, EntityKind, Id, ParentKind, SearchScope, User, ValidatedRequest};
use sieve_query::{AuthorizationContext, ProjectIds};

use crate::{Authorizer, BoxFuture};

pub async fn resolve(
	authorizer: &dyn Authorizer,
	request: &ValidatedRequest,
) -> AuthorizationContext {
	let mut auth = AuthorizationContext::for_request(request);
	let group_ids = &request.request().group_ids;

	if request.scope() == SearchScope::Group {
		let requested = fail_closed("namespaces", authorizer.namespaces(group_ids)).await;

		auth = auth.with_requested_namespaces(requested);
	}

	let Some(user) = request.requester().user() else {
		return auth;
	};

	if request.entity() == EntityKind::User {
		return auth;
	}

	let candidates = candidate_project_ids(&auth, request);
	let projects = match &candidates {
		Some(ids) if ids.is_empty() => ProjectIds::none(),
		candidates => {
			fail_closed(
				"authorized_project_ids",
				authorizer.authorized_project_ids(user, candidates.as_deref()),
			)
			.await
		},
	};

	auth = auth.with_authorized_projects(projects);

	if let ProjectIds::Ids(ids) = auth.scoped_projects() {
		let ids = ids.into_iter().collect::<Vec<_>>();

		for feature in request.schema().features {
			let visible = if ids.is_empty() {
				Vec::new()
			} else {
				fail_closed(
					"feature_visible_project_ids",
					authorizer.feature_visible_project_ids(&ids, user, *feature),
				)
				.await
			};

			auth = auth.with_feature_projects(*feature, visible);
		}
	}

	if request.scope() == SearchScope::Group && !group_ids.is_empty() {
		let authorized = fail_closed(
			"authorized_namespace_ids",
			authorizer.authorized_namespace_ids(user, group_ids),
		)
		.await
		.into_iter()
		.collect::<BTreeSet<_>>();
		let namespaces = auth
			.requested_namespaces()
			.iter()
			.filter(|namespace| authorized.contains(&namespace.id))
			.cloned()
			.collect();

		auth = auth.with_authorized_namespaces(namespaces);
	}

	if request.requester().can_read_all_resources() {
		return auth;
	}

	resolve_membership(authorizer, request, user, auth).await
}

/// Membership facts only the group-level and confidentiality filters consume.
async fn resolve_membership(
	authorizer: &dyn Authorizer,
	request: &ValidatedRequest,
	user: &User,
	mut auth: AuthorizationContext,
) -> AuthorizationContext {
	let schema = request.schema();

	if schema.parent == ParentKind::Namespace {
		let members = fail_closed(
			"member_namespaces",
			authorizer.member_namespaces(user, AccessLevel::Guest),
		)
		.await;
		let reporters = fail_closed(
			"member_namespaces",
			authorizer.member_namespaces(user, AccessLevel::Reporter),
		)
		.await;

		auth = auth.with_member_namespaces(members).with_reporter_namespaces(reporters);
	} else if schema.confidential {
		let reporters = fail_closed(
			"member_project_ids",
			authorizer.member_project_ids(user, AccessLevel::Reporter),
		)
		.await;

		auth = auth.with_reporter_projects(reporters);
	}

	auth
}

/// Projects worth asking about: the requested ones, those under the requested groups, or
/// every membership for global searches.
fn candidate_project_ids(
	auth: &AuthorizationContext,
	request: &ValidatedRequest,
) -> Option<Vec<Id>> {
	match request.scope() {
		SearchScope::Global => None,
		SearchScope::Group => Some(
			auth.requested_namespaces()
				.iter()
				.flat_map(|namespace| namespace.project_ids.iter().copied())
				.collect::<BTreeSet<_>>()
				.into_iter()
				.collect(),
		),
		SearchScope::Project => Some(request.request().project_ids.clone()),
	}
}

async fn fail_closed<T>(fact: &'static str, lookup: BoxFuture<'_, color_eyre::Result<T>>) -> T
where
	T: Default,
{
	match lookup.await {
		Ok(value) => value,
		Err(err) => {
			tracing::warn!(error = %err, fact, "Authorization lookup failed. Denying access.");

			T::default()
		},
	}
}
