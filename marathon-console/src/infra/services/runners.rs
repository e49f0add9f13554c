use crate::infra::api_client::{ApiClient, ByteStream};
use crate::infra::errors::{ConsoleError, ConsoleResult};
use crate::infra::services::api::{RunnerQuery, RunnerService};

use async_trait::async_trait;
use log::debug;
use marathon_core::console_prelude::{
    RunnerId, RunnerPage, RunnerRecord, UpdateRunnerRequest, route_utils, v1,
};
use std::sync::Arc;

/// [`RunnerService`] backed by the HTTP API
#[derive(Debug, Clone)]
pub struct RunnerApiAdapter {
    client: Arc<ApiClient>,
}

impl RunnerApiAdapter {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    fn require_session(&self) -> ConsoleResult<()> {
        if self.client.session().token().is_none() {
            return Err(ConsoleError::NotAuthenticated);
        }
        Ok(())
    }
}

/// Item route with the id escaped as a single path segment
fn item_path(id: &RunnerId) -> String {
    route_utils::replace_param(
        v1::runners::ITEM,
        "{id}",
        urlencoding::encode(id.as_str()),
    )
}

#[async_trait]
impl RunnerService for RunnerApiAdapter {
    async fn list_runners(
        &self,
        query: &RunnerQuery,
    ) -> ConsoleResult<RunnerPage> {
        self.require_session()?;
        let path = query.to_path();
        debug!("[Runners] GET {}", path);
        let envelope = self.client.get_envelope::<Vec<RunnerRecord>>(&path).await?;
        Ok(envelope.into_page()?)
    }

    async fn fetch_runner(&self, id: &RunnerId) -> ConsoleResult<RunnerRecord> {
        self.require_session()?;
        self.client.get(&item_path(id)).await
    }

    async fn update_runner(
        &self,
        id: &RunnerId,
        request: UpdateRunnerRequest,
    ) -> ConsoleResult<RunnerRecord> {
        self.require_session()?;
        debug!("[Runners] PUT {} status={}", item_path(id), request.status);
        self.client.put(&item_path(id), &request).await
    }

    async fn export_runners(&self) -> ConsoleResult<ByteStream> {
        self.require_session()?;
        self.client.get_stream(v1::runners::EXPORT).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::auth::state_types::SessionStore;
    use crate::infra::config::ConsoleConfig;
    use marathon_core::console_prelude::RunnerFilters;

    #[test]
    fn item_path_substitutes_runner_id() {
        assert_eq!(item_path(&RunnerId::new("r42")), "/api/v1/runners/r42");
    }

    #[test]
    fn item_path_keeps_hostile_id_in_one_segment() {
        assert_eq!(
            item_path(&RunnerId::new("a/../export?x=1")),
            "/api/v1/runners/a%2F..%2Fexport%3Fx%3D1"
        );
    }

    #[tokio::test]
    async fn calls_without_session_fail_before_the_network() {
        let client =
            ApiClient::new(&ConsoleConfig::default(), SessionStore::new())
                .unwrap();
        let adapter = RunnerApiAdapter::new(Arc::new(client));

        let err = adapter
            .list_runners(&RunnerQuery::new(1, 10, RunnerFilters::default()))
            .await
            .unwrap_err();
        assert_eq!(err, ConsoleError::NotAuthenticated);
    }
}
