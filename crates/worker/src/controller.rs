//! The worker controller: lifecycle, fetch interception and background events.

use std::sync::Arc;
use std::time::Duration;

use pulse_client::resolve;
use pulse_core::{AppConfig, CacheDb, Error, Network, Request, SyncDelegate};
use tokio::sync::RwLock;
use url::Url;

use crate::classify::Classifier;
use crate::events::Effect;
use crate::lifecycle::{evict_stale, precache};
use crate::message::Message;
use crate::push::{ACTION_OPEN, PushPayload, build_notification};
use crate::refresh::Refreshes;
use crate::state::{Transition, WorkerState};
use crate::strategy::{StrategyContext, execute};

pub struct Worker {
    config: AppConfig,
    origin: Url,
    classifier: Classifier,
    ctx: StrategyContext,
    sync: Arc<dyn SyncDelegate>,
    state: RwLock<WorkerState>,
    refreshes: Refreshes,
}

impl Worker {
    pub fn new(
        config: AppConfig, db: CacheDb, network: Arc<dyn Network>, sync: Arc<dyn SyncDelegate>,
    ) -> Result<Self, Error> {
        let origin = config
            .origin_url()
            .map_err(|e| Error::InvalidUrl(e.to_string()))
            .and_then(|url| resolve(&url, "/").map_err(|e| Error::InvalidUrl(e.to_string())))?;
        let offline_page = resolve(&origin, &config.offline_page).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        let store = config.store_name();

        let ctx = StrategyContext {
            db,
            network,
            store: store.clone(),
            offline_page,
            offline_message: config.offline_message.clone(),
            network_timeout: config.network_timeout(),
        };

        Ok(Self {
            classifier: Classifier::from_config(&config),
            state: RwLock::new(WorkerState::new(&config.version, &store)),
            refreshes: Refreshes::new(),
            origin,
            ctx,
            sync,
            config,
        })
    }

    pub async fn state(&self) -> WorkerState {
        self.state.read().await.clone()
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store_name(&self) -> &str {
        &self.ctx.store
    }

    pub fn db(&self) -> &CacheDb {
        &self.ctx.db
    }

    /// Resolve a page-supplied path or URL against the worker's origin.
    pub fn resolve(&self, input: &str) -> Result<Url, Error> {
        resolve(&self.origin, input).map_err(|e| Error::InvalidUrl(format!("{input}: {e}")))
    }

    fn resolve_all(&self, inputs: &[String]) -> Result<Vec<Url>, Error> {
        inputs.iter().map(|input| self.resolve(input)).collect()
    }

    /// Precache the manifest into the current store.
    ///
    /// On success the worker asks to skip waiting. On failure nothing is
    /// committed, the phase becomes `failed`, and install may be retried.
    pub async fn install(&self) -> Result<Vec<Effect>, Error> {
        self.state.write().await.transition(Transition::BeginInstall)?;
        tracing::info!(store = %self.ctx.store, urls = self.config.precache_urls.len(), "installing");

        let result = match self.resolve_all(&self.config.precache_urls) {
            Ok(urls) => precache(&self.ctx.db, &self.ctx.network, &self.ctx.store, &urls).await,
            Err(e) => Err(e),
        };

        let mut state = self.state.write().await;
        match result {
            Ok(count) => {
                state.transition(Transition::InstallSucceeded)?;
                state.skip_waiting = true;
                state.installed_at = Some(chrono::Utc::now().to_rfc3339());
                tracing::info!(store = %self.ctx.store, entries = count, "installed");
                Ok(vec![Effect::SkipWaiting])
            }
            Err(e) => {
                state.transition(Transition::InstallFailed)?;
                tracing::error!(store = %self.ctx.store, error = %e, "install failed");
                Err(e)
            }
        }
    }

    /// Delete every store but the current one, then claim clients.
    pub async fn activate(&self) -> Result<Vec<Effect>, Error> {
        self.state.write().await.transition(Transition::BeginActivate)?;

        let result = evict_stale(&self.ctx.db, &self.ctx.store).await;

        let mut state = self.state.write().await;
        match result {
            Ok(deleted) => {
                state.transition(Transition::ActivateSucceeded)?;
                state.clients_claimed = true;
                state.activated_at = Some(chrono::Utc::now().to_rfc3339());
                tracing::info!(store = %self.ctx.store, evicted = deleted.len(), "activated");
                Ok(vec![Effect::ClaimClients])
            }
            Err(e) => {
                state.transition(Transition::ActivateFailed)?;
                tracing::error!(store = %self.ctx.store, error = %e, "activation failed");
                Err(e)
            }
        }
    }

    /// Serve an intercepted fetch, or pass it through when the worker
    /// does not control the page or does not handle the request.
    pub async fn handle_fetch(&self, request: &Request) -> Effect {
        if !self.state.read().await.phase.intercepts_fetch() {
            return Effect::PassThrough;
        }

        let Some(strategy) = self.classifier.classify(request) else {
            return Effect::PassThrough;
        };

        tracing::debug!(url = %request.url, %strategy, "intercepted");
        let response = execute(strategy, &self.ctx, &self.refreshes, request).await;
        Effect::Respond { strategy, response }
    }

    pub async fn handle_message(&self, message: Message) -> Result<Vec<Effect>, Error> {
        match message {
            Message::SkipWaiting => {
                self.state.write().await.skip_waiting = true;
                Ok(vec![Effect::SkipWaiting])
            }
            Message::CacheUrls { urls } => {
                let urls = self.resolve_all(&urls)?;
                precache(&self.ctx.db, &self.ctx.network, &self.ctx.store, &urls).await?;
                Ok(vec![])
            }
            Message::ClearCache => {
                let existed = self.ctx.db.delete_store(&self.ctx.store).await?;
                tracing::info!(store = %self.ctx.store, existed, "cache cleared");
                Ok(vec![])
            }
            Message::GetVersion => Ok(vec![Effect::Reply(serde_json::json!({ "version": self.config.version }))]),
        }
    }

    pub fn handle_push(&self, payload: Option<&[u8]>) -> Vec<Effect> {
        let payload = PushPayload::parse(payload);
        vec![Effect::ShowNotification(build_notification(&payload, &self.config))]
    }

    pub async fn handle_sync(&self, tag: &str) -> Result<Vec<Effect>, Error> {
        if tag != self.config.sync_tag {
            tracing::info!(tag, expected = %self.config.sync_tag, "ignoring unknown sync tag");
            return Ok(vec![]);
        }

        self.sync.sync(tag).await.map_err(|e| {
            tracing::warn!(tag, error = %e, "background sync failed; platform will retry");
            match e {
                failed @ Error::SyncFailed(_) => failed,
                other => Error::SyncFailed(other.to_string()),
            }
        })?;
        Ok(vec![])
    }

    pub fn handle_notification_click(&self, action: Option<&str>) -> Vec<Effect> {
        let mut effects = vec![Effect::CloseNotification];
        if action == Some(ACTION_OPEN) {
            effects.push(Effect::OpenWindow(self.origin.clone()));
        }
        effects
    }

    /// Wait for background refreshes before exit. Returns how many were lost.
    pub async fn settle(&self, grace: Duration) -> usize {
        self.refreshes.settle_within(grace).await
    }
}
