//! Player view - wires the collaborators to the session controller
//!
//! Coordinates:
//! - Onboarding gate before anything mounts
//! - Route entry and episode lookups
//! - Metadata confirmation, navigation and scraping
//! - Playback faults reported by the video surface
//!
//! Lookups and scrapes run as spawned tasks. Each one carries the ticket
//! it was issued under and hands its result back to the controller, which
//! drops results for identities that are no longer current.

use crate::controller::{Delivery, ResolveTicket, ScrapeTicket, SessionController};
use crate::episode::EpisodeResolver;
use crate::error::Result;
use crate::navigation::{NavigationHistory, NavigationTarget, Navigator, RouteParams, FALLBACK_BACK_PATH};
use crate::onboarding::{GateDecision, OnboardingCheck, OnboardingGate};
use crate::scrape::ScrapeOrchestrator;
use crate::status::PlayerStatus;
use crate::types::{PlayerMeta, SessionConfig, SessionId};
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

/// External services the view talks to
#[derive(Clone)]
pub struct Collaborators {
    pub onboarding: Arc<dyn OnboardingCheck>,
    pub episodes: Arc<dyn EpisodeResolver>,
    pub scraper: Arc<dyn ScrapeOrchestrator>,
    pub navigator: Arc<dyn Navigator>,
    pub history: Arc<dyn NavigationHistory>,
}

/// Result of opening the player
pub enum Mount {
    /// Onboarding is required; the view never mounted
    Redirected(NavigationTarget),
    /// Session controller is live
    Mounted(PlayerView),
}

impl std::fmt::Debug for Mount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mount::Redirected(target) => f.debug_tuple("Redirected").field(target).finish(),
            Mount::Mounted(view) => f.debug_tuple("Mounted").field(&view.id).finish(),
        }
    }
}

/// Mounted player view
pub struct PlayerView {
    id: SessionId,
    config: SessionConfig,
    controller: Arc<RwLock<SessionController>>,
    status_rx: watch::Receiver<PlayerStatus>,
    episodes: Arc<dyn EpisodeResolver>,
    scraper: Arc<dyn ScrapeOrchestrator>,
    navigator: Arc<dyn Navigator>,
    history: Arc<dyn NavigationHistory>,
    /// Episode lookup started by the route the view mounted on
    mount_lookup: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerView {
    /// Open the player at `path`.
    ///
    /// Runs the onboarding gate first. On redirect the navigation is
    /// issued and nothing else happens; a failed check is returned as a
    /// fatal error.
    #[instrument(skip(config, collaborators))]
    pub async fn open(config: SessionConfig, collaborators: Collaborators, path: &str) -> Result<Mount> {
        config.validate()?;

        let pathname = path.split('?').next().unwrap_or(path);
        let gate = OnboardingGate::new(collaborators.onboarding.clone(), config.clone());
        if let GateDecision::Redirect(target) = gate.check(pathname).await? {
            collaborators.navigator.navigate(target.clone());
            return Ok(Mount::Redirected(target));
        }

        let route = RouteParams::from_path(path, &config)?;
        let controller = SessionController::new(config.clone());
        let mut view = Self {
            id: controller.id(),
            status_rx: controller.subscribe_status(),
            controller: Arc::new(RwLock::new(controller)),
            config,
            episodes: collaborators.episodes,
            scraper: collaborators.scraper,
            navigator: collaborators.navigator,
            history: collaborators.history,
            mount_lookup: Mutex::new(None),
        };

        info!(session_id = %view.id, path, "Player view mounted");
        let lookup = view.enter_route(route).await;
        *view.mount_lookup.get_mut() = lookup;
        Ok(Mount::Mounted(view))
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot of the current status
    pub async fn status(&self) -> PlayerStatus {
        self.controller.read().await.status().clone()
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self) -> watch::Receiver<PlayerStatus> {
        self.status_rx.clone()
    }

    /// Where the back button leads
    pub fn back_url(&self) -> String {
        self.history
            .last_non_player_path()
            .unwrap_or_else(|| FALLBACK_BACK_PATH.to_string())
    }

    /// Wait for the episode lookup issued at mount, if it is still running.
    /// Later calls return immediately.
    pub async fn wait_for_mount_lookup(&self) {
        let lookup = self.mount_lookup.lock().await.take();
        if let Some(handle) = lookup {
            if let Err(e) = handle.await {
                warn!(session_id = %self.id, error = %e, "Episode lookup task failed");
            }
        }
    }

    /// Follow a route change given as a path
    pub async fn navigate_to(&self, path: &str) -> Result<Option<JoinHandle<()>>> {
        let route = RouteParams::from_path(path, &self.config)?;
        Ok(self.enter_route(route).await)
    }

    /// Follow a route change. Returns the episode lookup task, if one
    /// was started.
    #[instrument(skip(self), fields(session_id = %self.id))]
    pub async fn enter_route(&self, route: RouteParams) -> Option<JoinHandle<()>> {
        let change = self.controller.write().await.enter_route(route);
        change.resolve.map(|ticket| self.spawn_resolve(ticket))
    }

    /// Metadata picked by the user: navigate to its canonical path and
    /// start scraping. Returns the scrape task.
    #[instrument(skip(self, meta), fields(session_id = %self.id, media = %meta.tmdb_id))]
    pub async fn confirm_metadata(&self, meta: PlayerMeta) -> Result<JoinHandle<()>> {
        let confirmation = self.controller.write().await.confirm_metadata(meta)?;
        info!(path = %confirmation.target, "Navigating for metadata");
        self.navigator.navigate(confirmation.target);
        Ok(self.spawn_scrape(confirmation.scrape))
    }

    /// Start scraping without navigating
    #[instrument(skip(self, meta), fields(session_id = %self.id, media = %meta.tmdb_id))]
    pub async fn begin_scrape(&self, meta: PlayerMeta) -> Result<JoinHandle<()>> {
        let ticket = self.controller.write().await.begin_scrape(meta)?;
        Ok(self.spawn_scrape(ticket))
    }

    /// Arm the one-shot "start from beginning" override
    pub async fn set_restart_from_beginning(&self, restart: bool) {
        self.controller.write().await.set_restart_from_beginning(restart);
    }

    /// The video surface hit an unrecoverable fault
    pub async fn report_playback_error(&self) -> Result<()> {
        self.controller.write().await.report_playback_error()
    }

    fn spawn_resolve(&self, ticket: ResolveTicket) -> JoinHandle<()> {
        let controller = self.controller.clone();
        let episodes = self.episodes.clone();
        tokio::spawn(async move {
            let result = episodes.resolve(&ticket.media_id).await;
            let media_id = ticket.media_id.clone();
            if controller.write().await.apply_episode(ticket, result) {
                debug!(media_id = %media_id, "Episode lookup applied");
            }
        })
    }

    fn spawn_scrape(&self, ticket: ScrapeTicket) -> JoinHandle<()> {
        let controller = self.controller.clone();
        let scraper = self.scraper.clone();
        tokio::spawn(async move {
            let outcome = scraper.scrape(&ticket.media).await;
            let generation = ticket.generation;
            match controller.write().await.apply_scrape(ticket, outcome) {
                Delivery::Applied(kind) => debug!(%generation, status = %kind, "Scrape applied"),
                Delivery::Stale | Delivery::Ignored => {}
            }
        })
    }
}
