//! Index cleanup when a project or wiki is torn down.

use sieve_domain::{EntityKind, Id, Requester};
use sieve_query::{WikiContainer, delete};

use crate::{DeleteCall, Error, Result, SearchService};

impl SearchService {
	pub async fn delete_wiki(
		&self,
		requester: &Requester,
		container: WikiContainer,
		root_namespace_id: Option<Id>,
	) -> Result<u64> {
		require_admin(requester)?;

		let call = DeleteCall::from(delete::wiki_teardown(container, root_namespace_id));

		self.run_delete(&call).await
	}

	pub async fn delete_project(
		&self,
		requester: &Requester,
		project_id: Id,
		kinds: &[EntityKind],
	) -> Result<u64> {
		require_admin(requester)?;

		let call = DeleteCall::from(delete::project_teardown(project_id, kinds)?);

		self.run_delete(&call).await
	}

	async fn run_delete(&self, call: &DeleteCall) -> Result<u64> {
		let response = self.providers.engine.delete_by_query(call).await?;

		if response.version_conflicts > 0 {
			tracing::info!(
				version_conflicts = response.version_conflicts,
				"Skipped documents changed during deletion."
			);
		}

		Ok(response.deleted)
	}
}

fn require_admin(requester: &Requester) -> Result<()> {
	if requester.can_admin_all_resources() {
		return Ok(());
	}

	Err(Error::Authorization { message: "Index cleanup requires an administrator.".to_string() })
}
