use sieve_domain::{EntityKind, SearchRequest, ValidatedRequest};
use sieve_query::CompiledQuery;

use crate::{
	CountOutcome, Result, SearchCall, SearchResults, SearchService, blob::BlobWindow, hydrate,
	resolve,
};

impl SearchService {
	pub fn validate(&self, request: SearchRequest) -> Result<ValidatedRequest> {
		let results = &self.cfg.results;

		Ok(request.validate(results.default_per_page, results.max_per_page)?)
	}

	/// Resolves authorization for `request` and compiles it without calling the engine.
	pub async fn compile(&self, request: &ValidatedRequest) -> Result<CompiledQuery> {
		let auth = resolve::resolve(self.providers.authorizer.as_ref(), request).await;

		Ok(sieve_query::compile(request, &auth, &self.settings)?)
	}

	/// One page of hydrated results. Engine failures and timeouts are hard errors here.
	pub async fn search(&self, request: SearchRequest) -> Result<SearchResults> {
		let request = self.validate(request)?;

		if request.entity().is_git_content() && request.query_text().trim().is_empty() {
			return Ok(SearchResults::empty(&request));
		}

		let compiled = self.compile(&request).await?;
		let call = SearchCall::from(&compiled);
		let response = self.providers.engine.search(&call).await?;
		let window = BlobWindow {
			pre_tag: &self.settings.pre_tag,
			context_lines: self.context_lines(&request),
		};
		let results = SearchResults::from_response(&request, response, &window);

		hydrate::hydrate(self.providers.containers.as_ref(), results).await
	}

	/// Counts matches for `request`. Invalid requests still fail; engine trouble degrades to
	/// a zero count.
	pub async fn count(&self, request: SearchRequest) -> Result<CountOutcome> {
		let request = self.validate(request)?.into_count_only();

		if request.entity().is_git_content() && request.query_text().trim().is_empty() {
			return Ok(CountOutcome::Counted { count: 0, lower_bound: false });
		}

		let compiled = self.compile(&request).await?;
		let call = SearchCall::from(&compiled);

		match self.providers.engine.search(&call).await {
			Ok(response) => Ok(CountOutcome::Counted {
				count: response.total(),
				lower_bound: response.total_is_lower_bound(),
			}),
			Err(err) => {
				tracing::warn!(
					entity = %request.entity(),
					timeout = err.is_timeout(),
					error = %err,
					"Count query failed. Reporting zero."
				);

				Ok(CountOutcome::Degraded { count: 0, reason: err.to_string() })
			},
		}
	}

	/// Per-kind tallies for the same query and scope.
	pub async fn counts(
		&self,
		request: &SearchRequest,
		kinds: &[EntityKind],
	) -> Result<Vec<(EntityKind, CountOutcome)>> {
		let mut out = Vec::with_capacity(kinds.len());

		for kind in kinds {
			let request = SearchRequest { entity: *kind, ..request.clone() };

			out.push((*kind, self.count(request).await?));
		}

		Ok(out)
	}

	fn context_lines(&self, request: &ValidatedRequest) -> usize {
		let results = &self.cfg.results;
		let lines = request
			.options()
			.num_context_lines
			.unwrap_or(results.default_context_lines)
			.min(self.settings.max_context_lines);

		usize::try_from(lines).unwrap_or(usize::MAX)
	}
}
