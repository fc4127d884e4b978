//! Test doubles for the service collaborators and an evaluator for compiled query documents.

pub mod eval;

use std::{
	collections::{BTreeMap, BTreeSet},
	sync::{
		Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use color_eyre::eyre;
use sieve_domain::{AccessLevel, Feature, Id, Namespace, User};
use sieve_providers::{DeleteByQueryResponse, RawResponse};
use sieve_query::ProjectIds;
use sieve_service::{
	Authorizer, BoxFuture, ContainerLoader, ContainerState, DeleteCall, SearchCall, SearchEngine,
};

pub use eval::matches;

/// Answers from fixed facts. Namespaces are looked up by id from `namespaces`.
#[derive(Debug, Clone, Default)]
pub struct StubAuthorizer {
	pub projects: ProjectIds,
	pub namespaces: Vec<Namespace>,
	pub authorized_namespace_ids: Vec<Id>,
	/// Features absent here are visible in every authorized project.
	pub feature_projects: BTreeMap<Feature, Vec<Id>>,
	pub member_namespaces: BTreeMap<AccessLevel, Vec<Namespace>>,
	pub member_projects: BTreeMap<AccessLevel, Vec<Id>>,
}
impl StubAuthorizer {
	pub fn with_projects(ids: impl IntoIterator<Item = Id>) -> Self {
		Self { projects: ids.into_iter().collect(), ..Self::default() }
	}

	pub fn unrestricted() -> Self {
		Self { projects: ProjectIds::Any, ..Self::default() }
	}
}

impl Authorizer for StubAuthorizer {
	fn authorized_project_ids<'a>(
		&'a self,
		_user: &'a User,
		candidates: Option<&'a [Id]>,
	) -> BoxFuture<'a, color_eyre::Result<ProjectIds>> {
		let projects = match (&self.projects, candidates) {
			(ProjectIds::Ids(ids), Some(candidates)) =>
				candidates.iter().copied().filter(|id| ids.contains(id)).collect(),
			(projects, _) => projects.clone(),
		};

		Box::pin(async move { Ok(projects) })
	}

	fn authorized_namespace_ids<'a>(
		&'a self,
		_user: &'a User,
		group_ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		let ids = group_ids
			.iter()
			.copied()
			.filter(|id| self.authorized_namespace_ids.contains(id))
			.collect();

		Box::pin(async move { Ok(ids) })
	}

	fn feature_visible_project_ids<'a>(
		&'a self,
		ids: &'a [Id],
		_user: &'a User,
		feature: Feature,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		let visible = match self.feature_projects.get(&feature) {
			Some(visible) => ids.iter().copied().filter(|id| visible.contains(id)).collect(),
			None => ids.to_vec(),
		};

		Box::pin(async move { Ok(visible) })
	}

	fn namespaces<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>> {
		let found = self
			.namespaces
			.iter()
			.filter(|namespace| ids.contains(&namespace.id))
			.cloned()
			.collect();

		Box::pin(async move { Ok(found) })
	}

	fn member_namespaces<'a>(
		&'a self,
		_user: &'a User,
		min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>> {
		let found = self.member_namespaces.get(&min_access).cloned().unwrap_or_default();

		Box::pin(async move { Ok(found) })
	}

	fn member_project_ids<'a>(
		&'a self,
		_user: &'a User,
		min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		let found = self.member_projects.get(&min_access).cloned().unwrap_or_default();

		Box::pin(async move { Ok(found) })
	}
}

/// Fails every lookup, counting the calls it received.
#[derive(Debug, Default)]
pub struct ErroringAuthorizer {
	calls: AtomicUsize,
}
impl ErroringAuthorizer {
	pub fn calls(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn fail<'a, T>(&'a self, fact: &'static str) -> BoxFuture<'a, color_eyre::Result<T>>
	where
		T: Send + 'a,
	{
		self.calls.fetch_add(1, Ordering::SeqCst);

		Box::pin(async move { Err(eyre::eyre!("Authorization backend unavailable for {fact}.")) })
	}
}

impl Authorizer for ErroringAuthorizer {
	fn authorized_project_ids<'a>(
		&'a self,
		_user: &'a User,
		_candidates: Option<&'a [Id]>,
	) -> BoxFuture<'a, color_eyre::Result<ProjectIds>> {
		self.fail("authorized_project_ids")
	}

	fn authorized_namespace_ids<'a>(
		&'a self,
		_user: &'a User,
		_group_ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		self.fail("authorized_namespace_ids")
	}

	fn feature_visible_project_ids<'a>(
		&'a self,
		_ids: &'a [Id],
		_user: &'a User,
		_feature: Feature,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		self.fail("feature_visible_project_ids")
	}

	fn namespaces<'a>(
		&'a self,
		_ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>> {
		self.fail("namespaces")
	}

	fn member_namespaces<'a>(
		&'a self,
		_user: &'a User,
		_min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Namespace>>> {
		self.fail("member_namespaces")
	}

	fn member_project_ids<'a>(
		&'a self,
		_user: &'a User,
		_min_access: AccessLevel,
	) -> BoxFuture<'a, color_eyre::Result<Vec<Id>>> {
		self.fail("member_project_ids")
	}
}

/// How the recording engine answers searches.
#[derive(Debug, Clone)]
pub enum EngineReply {
	Respond(RawResponse),
	Timeout,
	Status(u16),
}

/// Records every call and answers with a fixed reply.
#[derive(Debug)]
pub struct RecordingEngine {
	reply: EngineReply,
	deleted: u64,
	searches: Mutex<Vec<SearchCall>>,
	deletes: Mutex<Vec<DeleteCall>>,
}
impl RecordingEngine {
	pub fn new(reply: EngineReply) -> Self {
		Self {
			reply,
			deleted: 0,
			searches: Mutex::new(Vec::new()),
			deletes: Mutex::new(Vec::new()),
		}
	}

	/// Answers every search with `hits` and a total of `total`.
	pub fn with_hits(total: u64, hits: Vec<serde_json::Value>) -> Self {
		let response = serde_json::json!({
			"took": 1,
			"timed_out": false,
			"hits": { "total": { "value": total, "relation": "eq" }, "hits": hits }
		});

		Self::new(EngineReply::Respond(serde_json::from_value(response).unwrap_or_default()))
	}

	pub fn with_deleted(mut self, deleted: u64) -> Self {
		self.deleted = deleted;

		self
	}

	pub fn searches(&self) -> Vec<SearchCall> {
		self.searches.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	pub fn deletes(&self) -> Vec<DeleteCall> {
		self.deletes.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}

impl SearchEngine for RecordingEngine {
	fn search<'a>(
		&'a self,
		call: &'a SearchCall,
	) -> BoxFuture<'a, sieve_providers::Result<RawResponse>> {
		self.searches.lock().unwrap_or_else(|err| err.into_inner()).push(call.clone());

		let reply = match &self.reply {
			EngineReply::Respond(response) => Ok(response.clone()),
			EngineReply::Timeout => Err(sieve_providers::Error::Timeout {
				timeout_ms: u64::try_from(call.timeout.as_millis()).unwrap_or(u64::MAX),
			}),
			EngineReply::Status(status) => Err(sieve_providers::Error::Status {
				status: *status,
				body: "engine unavailable".to_string(),
			}),
		};

		Box::pin(async move { reply })
	}

	fn delete_by_query<'a>(
		&'a self,
		call: &'a DeleteCall,
	) -> BoxFuture<'a, sieve_providers::Result<DeleteByQueryResponse>> {
		self.deletes.lock().unwrap_or_else(|err| err.into_inner()).push(call.clone());

		let response =
			DeleteByQueryResponse { deleted: self.deleted, ..DeleteByQueryResponse::default() };

		Box::pin(async move { Ok(response) })
	}
}

/// Containers keyed by id. Ids never inserted are reported as missing.
#[derive(Debug, Default)]
pub struct InMemoryContainers {
	pub projects: BTreeMap<Id, ContainerState>,
	pub groups: BTreeMap<Id, ContainerState>,
	batches: AtomicUsize,
}
impl InMemoryContainers {
	pub fn with_live_projects(ids: impl IntoIterator<Item = Id>) -> Self {
		Self {
			projects: ids.into_iter().map(|id| (id, ContainerState::live(id))).collect(),
			..Self::default()
		}
	}

	/// Number of batch loads served, across both kinds.
	pub fn batches(&self) -> usize {
		self.batches.load(Ordering::SeqCst)
	}

	fn load<'a>(
		&'a self,
		table: &'a BTreeMap<Id, ContainerState>,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>> {
		self.batches.fetch_add(1, Ordering::SeqCst);

		let unique = ids.iter().copied().collect::<BTreeSet<_>>();
		let found = unique.iter().filter_map(|id| table.get(id).copied()).collect();

		Box::pin(async move { Ok(found) })
	}
}

impl ContainerLoader for InMemoryContainers {
	fn projects<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>> {
		self.load(&self.projects, ids)
	}

	fn groups<'a>(
		&'a self,
		ids: &'a [Id],
	) -> BoxFuture<'a, color_eyre::Result<Vec<ContainerState>>> {
		self.load(&self.groups, ids)
	}
}
