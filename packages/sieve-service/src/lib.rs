//! Runs compiled searches: resolves authorization facts through collaborators, calls the
//! search engine and turns raw responses into typed, hydrated results.

pub mod blob;
pub mod count;
pub mod delete;
pub mod envelope;
pub mod hydrate;
pub mod resolve;
pub mod search;

mod error;

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

pub use blob::FoundBlob;
pub use count::{CountOutcome, format_count};
pub use envelope::{AggregationBucket, AggregationResult, Owner, SearchHit, SearchResults};
pub use error::{Error, Result};
use sieve_config::Config;
use sieve_domain::{AccessLevel, EntityKind, Feature, Id, Namespace, User};
use sieve_providers::{DeleteByQueryResponse, EngineClient, RawResponse};
use sieve_query::{CompiledQuery, DeleteQuery, ProjectIds, QuerySettings};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Membership and visibility lookups. Implementations must be side-effect free; the service
/// treats every error as "no access".
pub trait Authorizer
where
	Self: Send + Sync,
{
	/// Projects `user` may read among `candidates`, or among every project when `None`.
	fn authorized_project_ids<'a>(
		&'a self,
		user: &'a User,
		candidates: Option<&'a [Id]>,
	) -> BoxFuture<'a, color_eyre::Result<ProjectIds>>;

	fn authorized_namespace_ids<'a>(
		&'a self,
		user: &'a User,
		group_ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>>;

	fn feature_visible_project_ids<'a>(
		&'a self,
		ids: &'a [Id],
		user: &'a User,
		feature: Feature,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>>;

	fn namespaces<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>>;

	fn member_namespaces<'a>(
		&'a self,
		user: &'a User,
		min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>>;

	fn member_project_ids<'a>(
		&'a self,
		user: &'a User,
		min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>>;
}

pub trait SearchEngine
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		call: &'a SearchCall,
	) -> BoxFuture<'a, sieve_providers::Result<RawResponse>>;

	fn delete_by_query<'a>(
		&'a self,
		call: &'a DeleteCall,
	) -> BoxFuture<'a, sieve_providers::Result<DeleteByQueryResponse>>;
}

/// Batch loaders answering whether a result's owning container still exists.
pub trait ContainerLoader
where
	Self: Send + Sync,
{
	fn projects<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>>;

	fn groups<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerState {
	pub id: Id,
	pub pending_delete: bool,
	pub marked_for_deletion: bool,
}
impl ContainerState {
	pub fn live(id: Id) -> Self {
		Self { id, pending_delete: false, marked_for_deletion: false }
	}

	pub fn is_live(&self) -> bool {
		!self.pending_delete && !self.marked_for_deletion
	}
}

/// One `_search` call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchCall {
	pub entity: EntityKind,
	pub body: Value,
	pub routing: Option<String>,
	pub timeout: Duration,
	pub count_only: bool,
}
impl From<&CompiledQuery> for SearchCall {
	fn from(compiled: &CompiledQuery) -> Self {
		Self {
			entity: compiled.entity,
			body: compiled.body(),
			routing: compiled.routing.clone(),
			timeout: compiled.timeout,
			count_only: compiled.count_only,
		}
	}
}

/// One `_delete_by_query` call.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteCall {
	pub body: Value,
	pub routing: Option<String>,
	pub conflicts: String,
}
impl From<DeleteQuery> for DeleteCall {
	fn from(query: DeleteQuery) -> Self {
		Self { body: query.body, routing: query.routing, conflicts: query.conflicts.to_string() }
	}
}

#[derive(Clone)]
pub struct Providers {
	pub authorizer: Arc<dyn Authorizer>,
	pub engine: Arc<dyn SearchEngine>,
	pub containers: Arc<dyn ContainerLoader>,
}
impl Providers {
	pub fn new(
		authorizer: Arc<dyn Authorizer>,
		engine: Arc<dyn SearchEngine>,
		containers: Arc<dyn ContainerLoader>,
	) -> Self {
		Self { authorizer, engine, containers }
	}
}

pub struct SearchService {
	pub cfg: Config,
	pub settings: QuerySettings,
	pub providers: Providers,
}
impl SearchService {
	/// Talks to the engine configured in `cfg`.
	pub fn new(
		cfg: Config,
		authorizer: Arc<dyn Authorizer>,
		containers: Arc<dyn ContainerLoader>,
	) -> Result<Self> {
		let engine = EngineClient::new(&cfg.engine)?;

		Ok(Self::with_providers(cfg, Providers::new(authorizer, Arc::new(engine), containers)))
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let settings = QuerySettings::from_config(&cfg);

		Self { cfg, settings, providers }
	}
}

impl SearchEngine for EngineClient {
	fn search<'a>(
		&'a self,
		call: &'a SearchCall,
	) -> BoxFuture<'a, sieve_providers::Result<RawResponse>> {
		Box::pin(EngineClient::search(self, &call.body, call.routing.as_deref(), call.timeout))
	}

	fn delete_by_query<'a>(
		&'a self,
		call: &'a DeleteCall,
	) -> BoxFuture<'a, sieve_providers::Result<DeleteByQueryResponse>> {
		Box::pin(EngineClient::delete_by_query(
			self,
			&call.body,
			call.routing.as_deref(),
			&call.conflicts,
		))
	}
}
