//! Runner service trait
//!
//! The runners domain only talks to the server through [`RunnerService`], so
//! the reconciler and controller can be driven by an in-memory stub in tests.

use crate::infra::api_client::ByteStream;
use crate::infra::errors::ConsoleResult;

use async_trait::async_trait;
use marathon_core::console_prelude::{
    RunnerFilters, RunnerId, RunnerPage, RunnerRecord, UpdateRunnerRequest,
    route_utils, v1,
};
use std::fmt::Debug;

/// One list request: page window plus the filters in force when issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunnerQuery {
    pub page: u32,
    pub limit: u32,
    pub filters: RunnerFilters,
}

impl RunnerQuery {
    pub fn new(page: u32, limit: u32, filters: RunnerFilters) -> Self {
        Self {
            page,
            limit,
            filters,
        }
    }

    /// `GET /runners` path with the query string; blank filters are omitted.
    pub fn to_path(&self) -> String {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ];
        pairs.extend(self.filters.query_pairs());

        let borrowed: Vec<(&str, &str)> =
            pairs.iter().map(|(k, v)| (*k, v.as_str())).collect();
        route_utils::with_query(v1::runners::COLLECTION, &borrowed)
    }
}

#[async_trait]
pub trait RunnerService: Send + Sync + Debug {
    /// Fetch one filtered page of runners
    async fn list_runners(
        &self,
        query: &RunnerQuery,
    ) -> ConsoleResult<RunnerPage>;

    /// Fetch a single runner, used to refresh the detail view
    async fn fetch_runner(&self, id: &RunnerId) -> ConsoleResult<RunnerRecord>;

    /// Persist a status change; returns the authoritative record
    async fn update_runner(
        &self,
        id: &RunnerId,
        request: UpdateRunnerRequest,
    ) -> ConsoleResult<RunnerRecord>;

    /// Stream the CSV export
    async fn export_runners(&self) -> ConsoleResult<ByteStream>;
}
