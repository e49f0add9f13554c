use std::sync::Arc;

use crate::domains::auth::{SessionManager, SessionStore};
use crate::domains::runners::live_feed::{LiveLocationFeed, SseLocationFeed};
use crate::domains::runners::{
    RunnersController, RunnersDomainState, RunnersEvent, RunnersHandle,
};
use crate::infra::api_client::ApiClient;
use crate::infra::config::ConsoleConfig;
use crate::infra::errors::ConsoleResult;
use crate::infra::services::{
    AuthApiAdapter, AuthService, RunnerApiAdapter, RunnerService,
};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Wired services for one console process
#[derive(Debug, Clone)]
pub struct ConsoleApp {
    config: ConsoleConfig,
    session: SessionStore,
    auth: SessionManager,
    runners: Arc<dyn RunnerService>,
    feed: Arc<dyn LiveLocationFeed>,
    /// Present only when the feed is backed by the server's event stream
    sse: Option<SseLocationFeed>,
}

impl ConsoleApp {
    /// Build against the HTTP API described by `config`
    pub fn new(config: ConsoleConfig) -> ConsoleResult<Self> {
        let session = SessionStore::new();
        let client = Arc::new(ApiClient::new(&config, session.clone())?);
        let sse = SseLocationFeed::new(
            client.base_url(),
            session.clone(),
            config.feed_max_retries,
        );

        let auth: Arc<dyn AuthService> =
            Arc::new(AuthApiAdapter::new(client.clone()));
        let runners: Arc<dyn RunnerService> =
            Arc::new(RunnerApiAdapter::new(client));

        Ok(Self {
            auth: SessionManager::new(session.clone(), auth),
            session,
            runners,
            feed: Arc::new(sse.clone()),
            sse: Some(sse),
            config,
        })
    }

    /// Build from explicit services, e.g. the in-memory stubs
    pub fn from_parts(
        config: ConsoleConfig,
        session: SessionStore,
        auth: Arc<dyn AuthService>,
        runners: Arc<dyn RunnerService>,
        feed: Arc<dyn LiveLocationFeed>,
    ) -> Self {
        Self {
            auth: SessionManager::new(session.clone(), auth),
            session,
            runners,
            feed,
            sse: None,
            config,
        }
    }

    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn auth(&self) -> &SessionManager {
        &self.auth
    }

    pub fn runner_service(&self) -> Arc<dyn RunnerService> {
        self.runners.clone()
    }

    /// Start pumping the server event stream, if this app has one
    pub fn start_live_feed(&self) -> Option<JoinHandle<()>> {
        self.sse.as_ref().map(SseLocationFeed::spawn)
    }

    /// Spawn the runners controller on the current runtime
    pub fn start_runners(
        &self,
    ) -> (
        RunnersHandle,
        mpsc::UnboundedReceiver<RunnersEvent>,
        JoinHandle<()>,
    ) {
        let state = RunnersDomainState::new(
            self.runners.clone(),
            self.feed.clone(),
            &self.config,
        );
        let (controller, handle, events) =
            RunnersController::new(state, &self.session);
        (handle, events, controller.spawn())
    }
}
