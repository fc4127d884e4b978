//! HTTP client for the search cluster.

use std::time::Duration;

use reqwest::{Client, Response};
use serde_json::Value;

use crate::{DeleteByQueryResponse, Error, RawResponse, Result};

/// The engine enforces the query timeout itself; the HTTP call waits a little longer so the
/// engine's own timeout response wins the race.
const CLIENT_GRACE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone)]
pub struct EngineClient {
	client: Client,
	url: String,
	index: String,
}
impl EngineClient {
	pub fn new(cfg: &sieve_config::Engine) -> Result<Self> {
		let headers = crate::auth_headers(cfg.api_key.as_deref())?;
		let client = Client::builder().default_headers(headers).build()?;

		Ok(Self {
			client,
			url: cfg.url.trim_end_matches('/').to_string(),
			index: cfg.index.clone(),
		})
	}

	pub fn index(&self) -> &str {
		&self.index
	}

	pub async fn search(
		&self,
		body: &Value,
		routing: Option<&str>,
		timeout: Duration,
	) -> Result<RawResponse> {
		let timeout_ms = millis(timeout);
		let mut params = vec![("timeout", format!("{timeout_ms}ms"))];

		if let Some(routing) = routing {
			params.push(("routing", routing.to_string()));
		}

		let res = self
			.client
			.post(self.endpoint("_search"))
			.query(&params)
			.timeout(timeout + CLIENT_GRACE)
			.json(body)
			.send()
			.await
			.map_err(|err| timed_out(err, timeout_ms))?;
		let response: RawResponse = check_status(res).await?.json().await?;

		if response.timed_out {
			tracing::warn!(index = %self.index, timeout_ms, "Search timed out on the engine.");

			return Err(Error::Timeout { timeout_ms });
		}

		Ok(response)
	}

	/// Deletes every document matching `body`. Version conflicts with concurrent writes are
	/// counted, not fatal; any other per-document failure fails the call.
	pub async fn delete_by_query(
		&self,
		body: &Value,
		routing: Option<&str>,
		conflicts: &str,
	) -> Result<DeleteByQueryResponse> {
		let mut params = vec![("conflicts", conflicts.to_string())];

		if let Some(routing) = routing {
			params.push(("routing", routing.to_string()));
		}

		let res = self
			.client
			.post(self.endpoint("_delete_by_query"))
			.query(&params)
			.json(body)
			.send()
			.await?;
		let response: DeleteByQueryResponse = check_status(res).await?.json().await?;

		if !response.failures.is_empty() {
			return Err(Error::InvalidResponse {
				message: format!(
					"Delete by query reported {} failures.",
					response.failures.len()
				),
			});
		}

		tracing::info!(
			index = %self.index,
			deleted = response.deleted,
			version_conflicts = response.version_conflicts,
			"Deleted documents by query."
		);

		Ok(response)
	}

	fn endpoint(&self, action: &str) -> String {
		format!("{}/{}/{action}", self.url, self.index)
	}
}

async fn check_status(res: Response) -> Result<Response> {
	let status = res.status();

	if status.is_success() {
		return Ok(res);
	}

	let body = res.text().await.unwrap_or_default();

	Err(Error::Status { status: status.as_u16(), body })
}

fn timed_out(err: reqwest::Error, timeout_ms: u64) -> Error {
	if err.is_timeout() { Error::Timeout { timeout_ms } } else { Error::Reqwest(err) }
}

fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
