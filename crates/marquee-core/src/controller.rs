//! Session state machine
//!
//! Owns the [`PlayerStatus`] and every input that feeds a transition: the
//! current identity, the start-time token, the episode cache and the
//! one-shot restart flag. It performs no I/O. Asynchronous work is issued
//! by the caller against a ticket, and its result is handed back through
//! [`SessionController::apply_scrape`] or
//! [`SessionController::apply_episode`], where tickets from an older
//! identity are dropped.

use crate::episode::{EpisodeCache, Lookup};
use crate::error::{Error, Result};
use crate::launcher::{LaunchOptions, PlaybackLauncher};
use crate::navigation::{media_path, NavigationTarget, RouteParams};
use crate::scrape::ScrapeOutcome;
use crate::status::{PlayerStatus, StatusKind};
use crate::types::*;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Tag for an episode lookup, keyed on the media id it was issued for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveTicket {
    pub media_id: String,
}

/// Tag for a scrape, keyed on the identity generation it was issued under
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeTicket {
    pub generation: Generation,
    pub media: ScrapeMedia,
}

/// Effect of entering a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteChange {
    /// The identity changed and the session went back to `Idle`
    pub reset: bool,
    /// Episode lookup the caller must issue
    pub resolve: Option<ResolveTicket>,
}

/// Effect of confirming metadata
#[derive(Debug, Clone, PartialEq)]
pub struct MetaConfirmation {
    /// Where the view should navigate
    pub target: NavigationTarget,
    /// Scrape the caller must run
    pub scrape: ScrapeTicket,
}

/// What happened to a delivered scrape result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The result moved the session to this status
    Applied(StatusKind),
    /// Issued for an identity that is no longer current
    Stale,
    /// Current identity, but the session already left `Scraping`
    Ignored,
}

/// Playback session state machine
#[derive(Debug)]
pub struct SessionController {
    id: SessionId,
    config: SessionConfig,
    identity: Option<MediaIdentity>,
    start_token: Option<String>,
    generation: Generation,
    status: PlayerStatus,
    status_tx: watch::Sender<PlayerStatus>,
    episodes: EpisodeCache,
    restart_from_beginning: bool,
}

impl SessionController {
    pub fn new(config: SessionConfig) -> Self {
        let (status_tx, _) = watch::channel(PlayerStatus::Idle);
        Self {
            id: SessionId::new(),
            config,
            identity: None,
            start_token: None,
            generation: Generation::default(),
            status: PlayerStatus::Idle,
            status_tx,
            episodes: EpisodeCache::new(),
            restart_from_beginning: false,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    /// Subscribe to status changes
    pub fn subscribe_status(&self) -> watch::Receiver<PlayerStatus> {
        self.status_tx.subscribe()
    }

    pub fn identity(&self) -> Option<&MediaIdentity> {
        self.identity.as_ref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn start_token(&self) -> Option<&str> {
        self.start_token.as_deref()
    }

    /// Episode lookup state for the current media id
    pub fn resolved_episode(&self) -> Lookup {
        match &self.identity {
            Some(identity) => self.episodes.lookup(&identity.media_id),
            None => Lookup::Unknown,
        }
    }

    pub fn restart_from_beginning(&self) -> bool {
        self.restart_from_beginning
    }

    /// Arm or disarm the one-shot "start from beginning" override
    pub fn set_restart_from_beginning(&mut self, restart: bool) {
        self.restart_from_beginning = restart;
    }

    /// Enter a route. A different identity resets the session before
    /// anything else is processed for it.
    pub fn enter_route(&mut self, route: RouteParams) -> RouteChange {
        self.start_token = route.start_token.clone();
        let identity = route.identity();

        if self.identity.as_ref() == Some(&identity) {
            return RouteChange {
                reset: false,
                resolve: None,
            };
        }

        let media_changed = self
            .identity
            .replace(identity.clone())
            .as_ref()
            .map(|p| p.media_id != identity.media_id)
            .unwrap_or(true);

        self.reset();
        info!(identity = %identity, generation = %self.generation, "Entered route");

        let resolve = if media_changed && self.episodes.begin(&identity.media_id) {
            Some(ResolveTicket {
                media_id: identity.media_id.clone(),
            })
        } else {
            None
        };

        RouteChange {
            reset: true,
            resolve,
        }
    }

    /// Deliver an episode lookup result. Returns false if it was dropped.
    ///
    /// A lookup still in flight when the view returns to its media id is
    /// reused rather than issued again.
    pub fn apply_episode(
        &mut self,
        ticket: ResolveTicket,
        result: anyhow::Result<Option<ResolvedEpisode>>,
    ) -> bool {
        let current = self.identity.as_ref().map(|i| i.media_id.as_str());
        if current != Some(ticket.media_id.as_str()) {
            debug!(media_id = %ticket.media_id, "Dropping stale episode lookup");
            // a later visit must issue a fresh lookup
            self.episodes.abandon(&ticket.media_id);
            return false;
        }
        self.episodes.complete(&ticket.media_id, result);
        true
    }

    /// Where confirming `meta` navigates to.
    ///
    /// Series use the resolved episode, or the configured defaults while
    /// the lookup is pending, failed or empty.
    pub fn navigation_target(&self, meta: &PlayerMeta) -> Result<NavigationTarget> {
        let identity = self.require_identity()?;
        let episode = if meta.media_type.is_series() {
            Some(self.fallback_episode())
        } else {
            None
        };
        Ok(NavigationTarget::push(media_path(
            &self.config,
            &identity.media_id,
            episode,
        )))
    }

    /// Confirm metadata: move to `Scraping` and report where to navigate
    pub fn confirm_metadata(&mut self, meta: PlayerMeta) -> Result<MetaConfirmation> {
        let target = self.navigation_target(&meta)?;
        let scrape = self.begin_scrape(meta)?;
        Ok(MetaConfirmation { target, scrape })
    }

    /// Move from `Idle` to `Scraping` for the given metadata
    pub fn begin_scrape(&mut self, meta: PlayerMeta) -> Result<ScrapeTicket> {
        self.require_identity()?;
        let media = self.scrape_media(meta);
        self.set_status(PlayerStatus::Scraping {
            media: media.clone(),
        })?;
        Ok(ScrapeTicket {
            generation: self.generation,
            media,
        })
    }

    /// Deliver the outcome of a scrape
    pub fn apply_scrape(&mut self, ticket: ScrapeTicket, outcome: ScrapeOutcome) -> Delivery {
        if ticket.generation != self.generation {
            debug!(
                ticket = %ticket.generation,
                current = %self.generation,
                outcome = outcome.kind(),
                "Dropping stale scrape result"
            );
            return Delivery::Stale;
        }
        if self.status.kind() != StatusKind::Scraping {
            debug!(status = %self.status, "Ignoring scrape result outside scraping");
            return Delivery::Ignored;
        }

        let next = match outcome {
            ScrapeOutcome::Success { output } => {
                let launched = PlaybackLauncher::launch(
                    &output,
                    output.stream.captions(),
                    LaunchOptions {
                        start_token: self.start_token.as_deref(),
                        restart_from_beginning: self.restart_from_beginning,
                    },
                );
                match launched {
                    Ok(payload) => {
                        // one-shot: consumed together with the transition
                        self.restart_from_beginning = false;
                        info!(
                            source_id = %payload.source_id,
                            start_offset = ?payload.start_offset,
                            "Launching playback"
                        );
                        PlayerStatus::Playing { payload }
                    }
                    Err(e) => {
                        warn!(error = %e, code = e.error_code(), "Scraped stream is not playable");
                        PlayerStatus::PlaybackError
                    }
                }
            }
            ScrapeOutcome::Exhausted { report } => {
                info!(attempts = report.attempts().count(), "No source found");
                PlayerStatus::ScrapeNotFound { report }
            }
        };

        let kind = next.kind();
        match self.set_status(next) {
            Ok(()) => Delivery::Applied(kind),
            Err(_) => Delivery::Ignored,
        }
    }

    /// The playback surface hit an unrecoverable fault
    pub fn report_playback_error(&mut self) -> Result<()> {
        self.set_status(PlayerStatus::PlaybackError)
    }

    /// Transition to a new status, enforcing the transition table
    fn set_status(&mut self, next: PlayerStatus) -> Result<()> {
        let from = self.status.kind();
        let to = next.kind();
        if !from.can_transition_to(to) {
            warn!(from = %from, to = %to, "Rejected status transition");
            return Err(Error::transition(from, to));
        }

        self.status = next;
        self.status_tx.send_replace(self.status.clone());
        info!(from = %from, to = %to, session_id = %self.id, "Status transition");
        Ok(())
    }

    /// Back to `Idle` under a fresh generation
    fn reset(&mut self) {
        self.generation = self.generation.next();
        if self.status.kind() != StatusKind::Idle {
            info!(from = %self.status, "Resetting session");
        }
        self.status = PlayerStatus::Idle;
        self.status_tx.send_replace(PlayerStatus::Idle);
    }

    fn require_identity(&self) -> Result<&MediaIdentity> {
        self.identity
            .as_ref()
            .ok_or_else(|| Error::InvalidRoute("no route entered".into()))
    }

    fn scrape_media(&self, meta: PlayerMeta) -> ScrapeMedia {
        let episode = match (&meta.season, &meta.episode) {
            _ if !meta.media_type.is_series() => None,
            (Some(season), Some(episode)) => Some(ScrapeEpisode {
                season: season.number,
                episode: episode.number,
                season_tmdb_id: Some(season.tmdb_id.clone()),
                episode_tmdb_id: Some(episode.tmdb_id.clone()),
            }),
            _ if self.config.scrape_episode_fallback => {
                let fallback = self.fallback_episode();
                Some(ScrapeEpisode {
                    season: fallback.season,
                    episode: fallback.episode,
                    season_tmdb_id: None,
                    episode_tmdb_id: None,
                })
            }
            _ => None,
        };

        ScrapeMedia {
            media_type: meta.media_type,
            title: meta.title,
            tmdb_id: meta.tmdb_id,
            imdb_id: meta.imdb_id,
            release_year: meta.release_year,
            episode,
        }
    }

    /// Resolved episode, else the configured defaults. Shared by the
    /// navigation target and the scrape request so both name one episode.
    fn fallback_episode(&self) -> ResolvedEpisode {
        self.resolved_episode()
            .episode()
            .unwrap_or_else(|| self.config.default_episode())
    }
}
