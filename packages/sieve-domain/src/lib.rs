pub mod access;
pub mod entity;
pub mod operators;
pub mod request;
pub mod requester;
pub mod sha;

mod error;

pub use access::{AccessLevel, Feature, FeatureAccess, Namespace, Visibility};
pub use entity::{Aggregation, EntityKind, EntitySchema, ParentKind, RoutingKind, SortFields};
pub use error::{Error, Result};
pub use request::{
	AssigneeFilter, EffectiveOptions, EntityFilters, LabelFilter, MilestoneFilter, SearchOptions,
	SearchRequest, SearchScope, SetFilter, Sort, ValidatedRequest,
};
pub use requester::{Requester, User};

/// Primary key of a project, group, namespace or user.
pub type Id = i64;
