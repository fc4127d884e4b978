use serde::{Deserialize, Serialize};

use crate::{EntityKind, EntitySchema, Error, Id, ParentKind, Requester, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchScope {
	Global,
	Group,
	Project,
}
impl SearchScope {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Global => "global",
			Self::Group => "group",
			Self::Project => "project",
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sort {
	#[default]
	Relevance,
	CreatedAsc,
	CreatedDesc,
	UpdatedAsc,
	UpdatedDesc,
}

/// Set-valued filter over labels, milestones or assignees.
///
/// `all` requires every value, `or` requires at least one, `not` excludes each value,
/// `any` and `none` test for presence of the field at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SetFilter<T> {
	#[serde(default = "Vec::new")]
	pub all: Vec<T>,
	#[serde(default = "Vec::new")]
	pub or: Vec<T>,
	#[serde(default = "Vec::new")]
	pub not: Vec<T>,
	#[serde(default)]
	pub any: bool,
	#[serde(default)]
	pub none: bool,
}
impl<T> SetFilter<T> {
	pub fn is_empty(&self) -> bool {
		self.all.is_empty() && self.or.is_empty() && self.not.is_empty() && !self.any && !self.none
	}

	fn check(&self, option: &'static str) -> Result<()> {
		if self.any && self.none {
			return Err(Error::InvalidOption {
				option,
				message: "any and none are mutually exclusive.".to_string(),
			});
		}
		if self.none && !(self.all.is_empty() && self.or.is_empty()) {
			return Err(Error::InvalidOption {
				option,
				message: "none cannot be combined with required values.".to_string(),
			});
		}

		Ok(())
	}
}

impl<T> Default for SetFilter<T> {
	fn default() -> Self {
		Self { all: Vec::new(), or: Vec::new(), not: Vec::new(), any: false, none: false }
	}
}

pub type LabelFilter = SetFilter<String>;
pub type MilestoneFilter = SetFilter<String>;
pub type AssigneeFilter = SetFilter<Id>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityFilters {
	#[serde(default)]
	pub state: Option<String>,
	#[serde(default)]
	pub confidential: Option<bool>,
	#[serde(default)]
	pub source_branch: Option<String>,
	#[serde(default)]
	pub not_source_branch: Option<String>,
	#[serde(default)]
	pub target_branch: Option<String>,
	#[serde(default)]
	pub not_target_branch: Option<String>,
	#[serde(default)]
	pub author_id: Option<Id>,
	#[serde(default)]
	pub not_author_id: Option<Id>,
	#[serde(default)]
	pub assignees: AssigneeFilter,
	#[serde(default)]
	pub milestones: MilestoneFilter,
	#[serde(default)]
	pub labels: LabelFilter,
	#[serde(default)]
	pub language: Vec<String>,
}
impl EntityFilters {
	fn check(&self, kind: EntityKind) -> Result<()> {
		if let Some(state) = self.state.as_deref() {
			let allowed: &[&str] = match kind {
				EntityKind::Issue | EntityKind::Epic => &["opened", "closed", "all"],
				EntityKind::MergeRequest => &["opened", "closed", "merged", "locked", "all"],
				_ => &[],
			};

			if !allowed.contains(&state) {
				return Err(Error::InvalidOption {
					option: "filters.state",
					message: format!("state {state:?} is not supported for {kind}."),
				});
			}
		}

		let branches = self.source_branch.is_some()
			|| self.not_source_branch.is_some()
			|| self.target_branch.is_some()
			|| self.not_target_branch.is_some();

		if branches && kind != EntityKind::MergeRequest {
			return Err(Error::InvalidOption {
				option: "filters.branch",
				message: format!("branch filters are not supported for {kind}."),
			});
		}
		if self.confidential.is_some() && !kind.schema().confidential {
			return Err(Error::InvalidOption {
				option: "filters.confidential",
				message: format!("{kind} has no confidentiality."),
			});
		}

		let tracked = matches!(kind, EntityKind::Issue | EntityKind::MergeRequest);

		if (self.author_id.is_some() || self.not_author_id.is_some())
			&& !tracked
			&& kind != EntityKind::Epic
		{
			return Err(Error::InvalidOption {
				option: "filters.author_id",
				message: format!("author filters are not supported for {kind}."),
			});
		}
		if !self.labels.is_empty() && !tracked && kind != EntityKind::Epic {
			return Err(Error::InvalidOption {
				option: "filters.labels",
				message: format!("label filters are not supported for {kind}."),
			});
		}
		if (!self.assignees.is_empty() || !self.milestones.is_empty()) && !tracked {
			return Err(Error::InvalidOption {
				option: "filters.assignees",
				message: format!("assignee and milestone filters are not supported for {kind}."),
			});
		}
		if !self.language.is_empty() && !matches!(kind, EntityKind::Blob | EntityKind::WikiBlob)
		{
			return Err(Error::InvalidOption {
				option: "filters.language",
				message: format!("language filters are not supported for {kind}."),
			});
		}

		self.assignees.check("filters.assignees")?;
		self.milestones.check("filters.milestones")?;
		self.labels.check("filters.labels")?;

		Ok(())
	}
}

/// Every recognized search flag. Unknown keys are rejected at deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SearchOptions {
	#[serde(default)]
	pub count_only: bool,
	#[serde(default = "default_true")]
	pub highlight: bool,
	#[serde(default)]
	pub include_archived: bool,
	#[serde(default)]
	pub aggregation: bool,
	#[serde(default)]
	pub no_join_project: bool,
	#[serde(default)]
	pub routing_disabled: bool,
	/// Defaults to every scope except project scope.
	#[serde(default)]
	pub public_and_internal_projects: Option<bool>,
	#[serde(default)]
	pub sort: Sort,
	#[serde(default)]
	pub num_context_lines: Option<u32>,
	/// Root namespace ids used to route group-level documents.
	#[serde(default)]
	pub root_ancestor_ids: Vec<Id>,
	#[serde(default)]
	pub filters: EntityFilters,
}
impl SearchOptions {
	/// Checks the options against the target entity and resolves the effective flags.
	pub fn validate(&self, kind: EntityKind) -> Result<EffectiveOptions> {
		let schema = kind.schema();
		let no_join_project = match schema.parent {
			ParentKind::Denormalized { .. } => true,
			ParentKind::Project => {
				if self.no_join_project {
					return Err(Error::InvalidOption {
						option: "no_join_project",
						message: format!("{kind} documents are joined under their project."),
					});
				}

				false
			},
			ParentKind::Namespace | ParentKind::None => {
				if self.no_join_project {
					return Err(Error::InvalidOption {
						option: "no_join_project",
						message: format!("{kind} documents carry no project id."),
					});
				}

				false
			},
		};

		if self.aggregation && schema.aggregation.is_none() {
			return Err(Error::InvalidOption {
				option: "aggregation",
				message: format!("{kind} has no aggregation."),
			});
		}
		if self.sort != Sort::Relevance && schema.sort.is_none() {
			return Err(Error::InvalidOption {
				option: "sort",
				message: format!("{kind} results can only be ordered by relevance."),
			});
		}
		if self.num_context_lines.is_some()
			&& !matches!(kind, EntityKind::Blob | EntityKind::WikiBlob)
		{
			return Err(Error::InvalidOption {
				option: "num_context_lines",
				message: format!("{kind} results have no context lines."),
			});
		}

		self.filters.check(kind)?;

		Ok(EffectiveOptions { no_join_project })
	}
}

impl Default for SearchOptions {
	fn default() -> Self {
		Self {
			count_only: false,
			highlight: true,
			include_archived: false,
			aggregation: false,
			no_join_project: false,
			routing_disabled: false,
			public_and_internal_projects: None,
			sort: Sort::default(),
			num_context_lines: None,
			root_ancestor_ids: Vec::new(),
			filters: EntityFilters::default(),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveOptions {
	pub no_join_project: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
	pub query_text: String,
	pub entity: EntityKind,
	pub scope: SearchScope,
	#[serde(default)]
	pub requester: Requester,
	#[serde(default)]
	pub group_ids: Vec<Id>,
	#[serde(default)]
	pub project_ids: Vec<Id>,
	#[serde(default = "default_page")]
	pub page: u32,
	#[serde(default)]
	pub per_page: Option<u32>,
	#[serde(default)]
	pub options: SearchOptions,
}
impl SearchRequest {
	pub fn new(query_text: impl Into<String>, entity: EntityKind, scope: SearchScope) -> Self {
		Self {
			query_text: query_text.into(),
			entity,
			scope,
			requester: Requester::Anonymous,
			group_ids: Vec::new(),
			project_ids: Vec::new(),
			page: 1,
			per_page: None,
			options: SearchOptions::default(),
		}
	}

	/// Validates the request once; everything downstream consumes the validated form.
	pub fn validate(self, default_per_page: u32, max_per_page: u32) -> Result<ValidatedRequest> {
		match self.scope {
			SearchScope::Group if self.group_ids.is_empty() =>
				return Err(Error::MissingScopeIds { scope: "group", field: "group id" }),
			SearchScope::Project if self.project_ids.is_empty() =>
				return Err(Error::MissingScopeIds { scope: "project", field: "project id" }),
			SearchScope::Project if self.entity == EntityKind::Epic =>
				return Err(Error::InvalidOption {
					option: "scope",
					message: "epics cannot be searched within a project.".to_string(),
				}),
			_ => {},
		}

		if self.page == 0 {
			return Err(Error::InvalidPage { message: "page starts at 1.".to_string() });
		}

		let per_page = self.per_page.unwrap_or(default_per_page);

		if per_page == 0 || per_page > max_per_page {
			return Err(Error::InvalidPage {
				message: format!("per_page must be between 1 and {max_per_page}."),
			});
		}

		let effective = self.options.validate(self.entity)?;
		let public_and_internal = self
			.options
			.public_and_internal_projects
			.unwrap_or(self.scope != SearchScope::Project);
		let from = u64::from(self.page - 1) * u64::from(per_page);

		Ok(ValidatedRequest {
			schema: self.entity.schema(),
			no_join_project: effective.no_join_project,
			public_and_internal,
			per_page,
			from,
			request: self,
		})
	}
}

/// A request whose options were checked against its entity schema.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
	request: SearchRequest,
	schema: &'static EntitySchema,
	no_join_project: bool,
	public_and_internal: bool,
	per_page: u32,
	from: u64,
}
impl ValidatedRequest {
	pub fn request(&self) -> &SearchRequest {
		&self.request
	}

	pub fn schema(&self) -> &'static EntitySchema {
		self.schema
	}

	pub fn entity(&self) -> EntityKind {
		self.request.entity
	}

	pub fn scope(&self) -> SearchScope {
		self.request.scope
	}

	pub fn requester(&self) -> &Requester {
		&self.request.requester
	}

	pub fn options(&self) -> &SearchOptions {
		&self.request.options
	}

	pub fn query_text(&self) -> &str {
		self.request.query_text.as_str()
	}

	pub fn no_join_project(&self) -> bool {
		self.no_join_project
	}

	pub fn public_and_internal(&self) -> bool {
		self.public_and_internal
	}

	/// Zero when only counts are requested.
	pub fn size(&self) -> u32 {
		if self.request.options.count_only || self.request.options.aggregation {
			0
		} else {
			self.per_page
		}
	}

	pub fn per_page(&self) -> u32 {
		self.per_page
	}

	pub fn from(&self) -> u64 {
		self.from
	}

	/// The same request narrowed to counting, used for per-scope tallies.
	pub fn into_count_only(mut self) -> Self {
		self.request.options.count_only = true;
		self.request.options.highlight = false;
		self.request.options.aggregation = false;
		self
	}
}

fn default_true() -> bool {
	true
}

fn default_page() -> u32 {
	1
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn joined_entities_reject_no_join_project() {
		let options = SearchOptions { no_join_project: true, ..Default::default() };
		let err = options.validate(EntityKind::Blob).expect_err("Expected rejection.");

		assert!(matches!(err, Error::InvalidOption { option: "no_join_project", .. }));
	}

	#[test]
	fn denormalized_entities_always_use_no_join_project() {
		let options = SearchOptions::default();
		let effective = options.validate(EntityKind::Issue).expect("Expected valid options.");

		assert!(effective.no_join_project);
	}

	#[test]
	fn any_and_none_are_exclusive() {
		let mut options = SearchOptions::default();

		options.filters.labels.any = true;
		options.filters.labels.none = true;

		assert!(options.validate(EntityKind::Issue).is_err());
	}

	#[test]
	fn merged_state_is_merge_request_only() {
		let mut options = SearchOptions::default();

		options.filters.state = Some("merged".to_string());

		assert!(options.validate(EntityKind::MergeRequest).is_ok());
		assert!(options.validate(EntityKind::Issue).is_err());
	}
}
