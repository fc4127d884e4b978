//! Restricts a query to documents the requester may read.
//!
//! Every builder here fails closed: missing facts produce clauses that match nothing, never an
//! absent filter.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use sieve_domain::{
	Feature, FeatureAccess, Id, Namespace, Requester, SearchScope, ValidatedRequest, Visibility,
};

use crate::{
	NameContext,
	clause::{self, BoolQuery},
};

/// Project ids a requester may read, or every project for unrestricted readers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectIds {
	Any,
	Ids(BTreeSet<Id>),
}
impl ProjectIds {
	pub fn none() -> Self {
		Self::Ids(BTreeSet::new())
	}

	pub fn is_empty(&self) -> bool {
		matches!(self, Self::Ids(ids) if ids.is_empty())
	}
}

impl Default for ProjectIds {
	fn default() -> Self {
		Self::none()
	}
}

impl FromIterator<Id> for ProjectIds {
	fn from_iter<I: IntoIterator<Item = Id>>(iter: I) -> Self {
		Self::Ids(iter.into_iter().collect())
	}
}

/// Authorization facts resolved for one request. Every fact defaults to "nothing".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationContext {
	requester: Requester,
	requested_project_ids: Vec<Id>,
	requested_group_ids: Vec<Id>,
	authorized_projects: ProjectIds,
	feature_projects: BTreeMap<Feature, BTreeSet<Id>>,
	reporter_projects: BTreeSet<Id>,
	requested_namespaces: Vec<Namespace>,
	authorized_namespaces: Vec<Namespace>,
	member_namespaces: Vec<Namespace>,
	reporter_namespaces: Vec<Namespace>,
}
impl AuthorizationContext {
	pub fn new(
		requester: Requester,
		requested_project_ids: Vec<Id>,
		requested_group_ids: Vec<Id>,
	) -> Self {
		Self {
			requester,
			requested_project_ids,
			requested_group_ids,
			authorized_projects: ProjectIds::none(),
			feature_projects: BTreeMap::new(),
			reporter_projects: BTreeSet::new(),
			requested_namespaces: Vec::new(),
			authorized_namespaces: Vec::new(),
			member_namespaces: Vec::new(),
			reporter_namespaces: Vec::new(),
		}
	}

	pub fn for_request(request: &ValidatedRequest) -> Self {
		let inner = request.request();

		Self::new(inner.requester.clone(), inner.project_ids.clone(), inner.group_ids.clone())
	}

	/// `Any` is only honored for requesters that may read every resource.
	pub fn with_authorized_projects(mut self, projects: ProjectIds) -> Self {
		self.authorized_projects = match projects {
			ProjectIds::Any if !self.requester.can_read_all_resources() => {
				tracing::warn!(
					"Unrestricted project access reported for a regular requester. Denying."
				);

				ProjectIds::none()
			},
			projects => projects,
		};

		self
	}

	pub fn with_feature_projects(
		mut self,
		feature: Feature,
		ids: impl IntoIterator<Item = Id>,
	) -> Self {
		self.feature_projects.insert(feature, ids.into_iter().collect());

		self
	}

	pub fn with_reporter_projects(mut self, ids: impl IntoIterator<Item = Id>) -> Self {
		self.reporter_projects = ids.into_iter().collect();

		self
	}

	pub fn with_requested_namespaces(mut self, namespaces: Vec<Namespace>) -> Self {
		self.requested_namespaces = namespaces;

		self
	}

	pub fn with_authorized_namespaces(mut self, namespaces: Vec<Namespace>) -> Self {
		self.authorized_namespaces = namespaces;

		self
	}

	pub fn with_member_namespaces(mut self, namespaces: Vec<Namespace>) -> Self {
		self.member_namespaces = namespaces;

		self
	}

	pub fn with_reporter_namespaces(mut self, namespaces: Vec<Namespace>) -> Self {
		self.reporter_namespaces = namespaces;

		self
	}

	pub fn requester(&self) -> &Requester {
		&self.requester
	}

	pub fn requested_project_ids(&self) -> &[Id] {
		&self.requested_project_ids
	}

	pub fn requested_group_ids(&self) -> &[Id] {
		&self.requested_group_ids
	}

	pub fn requested_namespaces(&self) -> &[Namespace] {
		&self.requested_namespaces
	}

	pub fn authorized_namespaces(&self) -> &[Namespace] {
		&self.authorized_namespaces
	}

	pub fn member_namespaces(&self) -> &[Namespace] {
		&self.member_namespaces
	}

	pub fn reporter_namespaces(&self) -> &[Namespace] {
		&self.reporter_namespaces
	}

	pub fn reporter_projects(&self) -> &BTreeSet<Id> {
		&self.reporter_projects
	}

	/// Effective authorized projects. Without cross-project reads a requester may only search a
	/// single project; any wider set collapses to nothing.
	pub fn scoped_projects(&self) -> ProjectIds {
		match &self.authorized_projects {
			ProjectIds::Any => ProjectIds::Any,
			ProjectIds::Ids(ids) if !self.requester.can_read_cross_project() && ids.len() > 1 =>
				ProjectIds::none(),
			ProjectIds::Ids(ids) => ProjectIds::Ids(ids.clone()),
		}
	}

	/// Requested project ids under the same single-project restriction.
	pub fn scoped_requested_project_ids(&self) -> Vec<Id> {
		if !self.requester.can_read_cross_project() && self.requested_project_ids.len() > 1 {
			return Vec::new();
		}

		self.requested_project_ids.clone()
	}

	/// Scoped projects whose `feature` the requester may see.
	pub fn feature_project_ids(&self, feature: Feature) -> BTreeSet<Id> {
		let visible = self.feature_projects.get(&feature);

		match (self.scoped_projects(), visible) {
			(_, None) => BTreeSet::new(),
			(ProjectIds::Any, Some(visible)) => visible.clone(),
			(ProjectIds::Ids(ids), Some(visible)) => ids.intersection(visible).copied().collect(),
		}
	}
}

/// Clauses the authorization layer contributes to a document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthorizationFilters {
	pub filter: Vec<Value>,
	pub must_not: Vec<Value>,
}
impl AuthorizationFilters {
	pub fn apply(self, query: BoolQuery) -> BoolQuery {
		query.filters(self.filter).must_nots(self.must_not)
	}
}

/// Search level, project authorization and archived exclusion for project-owned documents.
pub fn project_authorization(
	auth: &AuthorizationContext,
	request: &ValidatedRequest,
	features: &[Feature],
) -> AuthorizationFilters {
	let mut filters = AuthorizationFilters::default();

	if let Some(level) = search_level_filter(auth, request) {
		filters.filter.push(level);
	}

	match traversal_filters(auth, request, features) {
		Some(traversal) => {
			filters.filter.push(traversal.filter);
			filters.must_not.extend(traversal.must_not);
		},
		None => filters.filter.push(project_ids_filter(auth, request, features)),
	}

	if let Some(archived) = archived_filter(request) {
		filters.filter.push(archived);
	}

	filters
}

/// Selects documents belonging to readable projects, either through the `project` parent
/// document or through the project id copied onto the document.
pub fn project_ids_filter(
	auth: &AuthorizationContext,
	request: &ValidatedRequest,
	features: &[Feature],
) -> Value {
	let context = NameContext::new("filters").child("project");
	let id_field =
		if request.no_join_project() { request.schema().project_id_field() } else { "id" };
	let conditions =
		project_conditions(auth, &context, features, id_field, request.public_and_internal());

	if request.no_join_project() {
		clause::any_of(context.name(), conditions)
	} else {
		clause::has_parent(
			"project",
			clause::any_of(context.name(), conditions),
			context.leaf("parent"),
		)
	}
}

/// Conditions selecting readable projects; at least one must hold.
pub fn project_conditions(
	auth: &AuthorizationContext,
	context: &NameContext,
	features: &[Feature],
	id_field: &str,
	public_and_internal: bool,
) -> Vec<Value> {
	let mut conditions = membership_conditions(auth, context, features, id_field);

	if public_and_internal {
		let visibility = context.child("visibility");
		let requester = auth.requester();

		if requester.sees_internal() {
			conditions.extend(visibility_conditions(
				requester,
				&visibility,
				Visibility::Internal,
				features,
			));
		}

		conditions.extend(visibility_conditions(
			requester,
			&visibility,
			Visibility::Public,
			features,
		));
	}

	conditions
}

/// Members see every project they belong to unless the feature is disabled. Unrestricted
/// readers see every private project here; internal and public ones come from visibility.
fn membership_conditions(
	auth: &AuthorizationContext,
	context: &NameContext,
	features: &[Feature],
	id_field: &str,
) -> Vec<Value> {
	let scoped = auth.scoped_projects();
	let condition = |ids: BTreeSet<Id>| match scoped {
		ProjectIds::Any =>
			clause::term("visibility_level", Visibility::Private.level(), context.leaf("any")),
		ProjectIds::Ids(_) => clause::terms(id_field, ids, context.leaf("membership:id")),
	};

	if features.is_empty() {
		let ids = match &scoped {
			ProjectIds::Any => BTreeSet::new(),
			ProjectIds::Ids(ids) => ids.clone(),
		};

		return vec![condition(ids)];
	}

	features
		.iter()
		.map(|feature| {
			let feature_context = context.child(feature);
			let limit = clause::terms(
				&feature.access_level_field(),
				[FeatureAccess::Enabled.level(), FeatureAccess::Private.level()],
				feature_context.leaf("enabled_or_private"),
			);

			BoolQuery::named(feature_context.leaf("membership"))
				.filter(condition(auth.feature_project_ids(*feature)))
				.filter(limit)
				.into_clause()
		})
		.collect()
}

/// Grants projects of `visibility`. With a feature, it must be enabled, or private for
/// unrestricted readers. Disabled features never match.
fn visibility_conditions(
	requester: &Requester,
	context: &NameContext,
	visibility: Visibility,
	features: &[Feature],
) -> Vec<Value> {
	let context = context.child(visibility);
	let condition = clause::term("visibility_level", visibility.level(), context.name());

	if features.is_empty() {
		return vec![condition];
	}

	features
		.iter()
		.map(|feature| {
			let access = context.child(feature).child("access_level");
			let field = feature.access_level_field();
			let limit = if requester.can_read_all_resources() {
				clause::terms(
					&field,
					[FeatureAccess::Enabled.level(), FeatureAccess::Private.level()],
					access.leaf("enabled_or_private"),
				)
			} else {
				clause::term(&field, FeatureAccess::Enabled.level(), access.leaf("enabled"))
			};

			BoolQuery::named(access.name()).filter(condition.clone()).filter(limit).into_clause()
		})
		.collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct TraversalFilters {
	pub filter: Value,
	pub must_not: Option<Value>,
}

/// Group searches by members of the searched groups match on traversal id prefixes instead of
/// listing projects. Descendant projects the requester cannot read are excluded explicitly.
pub fn traversal_filters(
	auth: &AuthorizationContext,
	request: &ValidatedRequest,
	features: &[Feature],
) -> Option<TraversalFilters> {
	let traversal_field = request.schema().traversal_ids_field?;

	if request.scope() != SearchScope::Group || auth.authorized_namespaces().is_empty() {
		return None;
	}

	let ProjectIds::Ids(scoped) = auth.scoped_projects() else {
		return None;
	};
	let allowed = if features.is_empty() {
		scoped
	} else {
		features.iter().flat_map(|feature| auth.feature_project_ids(*feature)).collect()
	};
	let rejected = auth
		.authorized_namespaces()
		.iter()
		.flat_map(|namespace| namespace.project_ids.iter().copied())
		.filter(|id| !allowed.contains(id))
		.collect::<BTreeSet<_>>();
	let filters = NameContext::new("filters");
	let must_not = (!rejected.is_empty()).then(|| {
		clause::terms(
			request.schema().project_id_field(),
			rejected,
			filters.leaf("reject_projects"),
		)
	});
	let ancestry = filters.child("namespace").child("ancestry_filter").child("descendants");
	let prefixes = auth
		.authorized_namespaces()
		.iter()
		.map(|namespace| clause::prefix(traversal_field, namespace.ancestry(), ancestry.name()))
		.collect();

	Some(TraversalFilters {
		filter: clause::any_of(filters.leaf("namespace"), prefixes),
		must_not,
	})
}

/// Restricts results to the searched group hierarchy or projects.
pub fn search_level_filter(
	auth: &AuthorizationContext,
	request: &ValidatedRequest,
) -> Option<Value> {
	let context = NameContext::new("filters").child("level");
	let schema = request.schema();

	match request.scope() {
		SearchScope::Global => None,
		SearchScope::Group => {
			let name = context.leaf("group");

			match schema.traversal_ids_field {
				Some(field) => Some(clause::any_of(
					name.clone(),
					auth.requested_namespaces()
						.iter()
						.map(|namespace| clause::prefix(field, namespace.ancestry(), name.clone()))
						.collect(),
				)),
				None => Some(clause::terms(
					schema.project_id_field(),
					auth.requested_namespaces()
						.iter()
						.flat_map(|namespace| namespace.project_ids.iter().copied())
						.collect::<BTreeSet<_>>(),
					name,
				)),
			}
		},
		SearchScope::Project => Some(clause::terms(
			schema.project_id_field(),
			auth.scoped_requested_project_ids(),
			context.leaf("project"),
		)),
	}
}

/// Excludes archived projects unless asked for or searching a single known project. Documents
/// indexed before the field existed have no `archived` value and stay visible.
pub fn archived_filter(request: &ValidatedRequest) -> Option<Value> {
	if !request.schema().archived
		|| request.options().include_archived
		|| request.scope() == SearchScope::Project
	{
		return None;
	}

	let context = NameContext::new("filters").child("non_archived");

	Some(clause::any_of(
		context.name(),
		vec![
			BoolQuery::named(context.leaf("false"))
				.filter(clause::term("archived", false, context.leaf("archived")))
				.into_clause(),
			clause::missing("archived", context.leaf("missing")),
		],
	))
}

/// Confidential documents are visible to their author, their assignees and reporters of the
/// owning project. Unrestricted readers skip the filter.
pub fn confidentiality_filter(auth: &AuthorizationContext) -> Option<Value> {
	let requester = auth.requester();
	let context = NameContext::new("filters").child("confidentiality");
	let non_confidential = clause::term("confidential", false, context.leaf("non_confidential"));

	if requester.can_read_all_resources() {
		return None;
	}

	let Some(user) = requester.user() else {
		return Some(non_confidential);
	};
	let mut branches = vec![
		non_confidential,
		clause::term("author_id", user.id, context.leaf("as_author")),
		clause::term("assignee_id", user.id, context.leaf("as_assignee")),
	];

	if !auth.reporter_projects().is_empty() {
		branches.push(clause::terms(
			"project_id",
			auth.reporter_projects().iter().copied(),
			context.child("project").leaf("membership:reporter"),
		));
	}

	Some(clause::any_of(context.name(), branches))
}

/// Group-level documents: a union of public, internal, private-with-membership and
/// confidential-with-membership branches. Each branch is only added when it can match.
pub fn group_membership_filter(
	auth: &AuthorizationContext,
	request: &ValidatedRequest,
) -> Option<Value> {
	let requester = auth.requester();

	if requester.can_read_all_resources() {
		return None;
	}

	let schema = request.schema();
	let visibility_field = schema.visibility_field;
	let traversal_field = schema.traversal_ids_field.unwrap_or("traversal_ids");
	let context = NameContext::new("filters").child("permissions").child(request.scope().as_str());
	let not_confidential = |name: String| clause::term("confidential", false, name);
	let visible = |visibility: Visibility| {
		let branch = context.child(visibility_field).child(visibility_name(visibility));

		BoolQuery::named(branch.name())
			.filter(clause::term(visibility_field, visibility.level(), branch.leaf("level")))
			.filter(not_confidential(branch.leaf("non_confidential")))
			.into_clause()
	};
	let ancestry = |namespaces: &[Namespace], name: String| {
		clause::any_of(
			name.clone(),
			namespaces
				.iter()
				.map(|namespace| {
					clause::prefix(traversal_field, namespace.ancestry(), name.clone())
				})
				.collect(),
		)
	};
	let mut branches = vec![visible(Visibility::Public)];

	if requester.sees_internal() {
		branches.push(visible(Visibility::Internal));
	}
	if !auth.member_namespaces().is_empty() {
		let branch = context.child(visibility_field).child("private");

		branches.push(
			BoolQuery::named(branch.name())
				.filter(clause::term(
					visibility_field,
					Visibility::Private.level(),
					branch.leaf("level"),
				))
				.filter(not_confidential(branch.leaf("non_confidential")))
				.filter(ancestry(auth.member_namespaces(), branch.leaf("membership")))
				.into_clause(),
		);
	}
	if !auth.reporter_namespaces().is_empty() {
		let branch = context.child("confidential");

		branches.push(
			BoolQuery::named(branch.name())
				.filter(clause::term("confidential", true, branch.leaf("confidential")))
				.filter(ancestry(auth.reporter_namespaces(), branch.leaf("membership:reporter")))
				.into_clause(),
		);
	}

	Some(clause::any_of(context.name(), branches))
}

fn visibility_name(visibility: Visibility) -> &'static str {
	match visibility {
		Visibility::Private => "private",
		Visibility::Internal => "internal",
		Visibility::Public => "public",
	}
}

#[cfg(test)]
mod tests {
	use sieve_domain::{EntityKind, SearchRequest, User};

	use super::*;

	fn validated(scope: SearchScope, requester: Requester) -> ValidatedRequest {
		let mut request = SearchRequest::new("bug", EntityKind::Issue, scope);

		request.requester = requester;
		request.project_ids = vec![1, 2];
		request.group_ids = vec![9];

		request.validate(20, 100).expect("Expected a valid request.")
	}

	#[test]
	fn cross_project_denial_collapses_multiple_ids() {
		let mut user = User::new(5, "ada");

		user.can_read_cross_project = false;

		let auth = AuthorizationContext::new(Requester::User(user), vec![1, 2], Vec::new())
			.with_authorized_projects([1, 2].into_iter().collect());

		assert!(auth.scoped_projects().is_empty());
		assert!(auth.scoped_requested_project_ids().is_empty());
	}

	#[test]
	fn any_is_denied_for_regular_users() {
		let requester = Requester::User(User::new(5, "ada"));
		let auth = AuthorizationContext::new(requester, Vec::new(), Vec::new())
			.with_authorized_projects(ProjectIds::Any);

		assert!(auth.scoped_projects().is_empty());
	}

	#[test]
	fn missing_feature_facts_deny_membership() {
		let requester = Requester::User(User::new(5, "ada"));
		let request = validated(SearchScope::Global, requester.clone());
		let auth = AuthorizationContext::for_request(&request)
			.with_authorized_projects([1, 2].into_iter().collect());
		let filter = project_ids_filter(&auth, &request, &[Feature::Issues]);
		let membership = &filter["bool"]["should"][0]["bool"]["filter"][0]["terms"];

		assert_eq!(membership["project_id"], serde_json::json!([]));
	}

	#[test]
	fn anonymous_requesters_only_get_public_projects() {
		let request = validated(SearchScope::Global, Requester::Anonymous);
		let auth = AuthorizationContext::for_request(&request);
		let filter = project_ids_filter(&auth, &request, &[Feature::Issues]);
		let names = filter["bool"]["should"]
			.as_array()
			.expect("Expected a should union.")
			.iter()
			.filter_map(|branch| branch["bool"]["_name"].as_str())
			.collect::<Vec<_>>();

		assert_eq!(
			names,
			vec![
				"filters:project:issues:membership",
				"filters:project:visibility:20:issues:access_level",
			]
		);
	}

	#[test]
	fn archived_filter_is_skipped_for_project_scope() {
		let request = validated(SearchScope::Project, Requester::Anonymous);

		assert!(archived_filter(&request).is_none());
		assert!(archived_filter(&validated(SearchScope::Global, Requester::Anonymous)).is_some());
	}
}
