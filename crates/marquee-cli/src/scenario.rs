//! Scripted sessions
//!
//! A scenario fixes every collaborator answer up front so a whole session
//! can be replayed from one JSON file.

use async_trait::async_trait;
use marquee_core::{
    Collaborators, EpisodeResolver, FixedOnboarding, NavigationLog, PlayerMeta, ResolvedEpisode,
    ScrapeMedia, ScrapeOrchestrator, ScrapeOutcome, StaticHistory,
};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Scenario file contents
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Path the player is opened at
    pub path: String,
    #[serde(default)]
    pub needs_onboarding: bool,
    /// Last location outside the player
    #[serde(default)]
    pub history: Option<String>,
    /// Episode lookup answer
    #[serde(default)]
    pub episode: Option<ResolvedEpisode>,
    /// Make the episode lookup fail with this message
    #[serde(default)]
    pub episode_error: Option<String>,
    /// Metadata the user confirms
    pub meta: PlayerMeta,
    /// What the scraper finds
    pub outcome: ScrapeOutcome,
    #[serde(default)]
    pub restart_from_beginning: bool,
    /// Fault reported by the video surface once playing
    #[serde(default)]
    pub playback_error: bool,
    /// Follow the navigation issued on confirmation
    #[serde(default = "default_true")]
    pub follow_navigation: bool,
}

fn default_true() -> bool {
    true
}

impl Scenario {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&json)?;
        info!(path = %path.display(), start = %scenario.path, "Loaded scenario");
        Ok(scenario)
    }

    /// Collaborators answering from this scenario
    pub fn collaborators(&self, navigation: Arc<NavigationLog>) -> Collaborators {
        Collaborators {
            onboarding: Arc::new(FixedOnboarding(self.needs_onboarding)),
            episodes: Arc::new(ScriptedEpisodes {
                episode: self.episode,
                error: self.episode_error.clone(),
            }),
            scraper: Arc::new(ScriptedScraper {
                outcome: self.outcome.clone(),
            }),
            navigator: navigation,
            history: Arc::new(StaticHistory(self.history.clone())),
        }
    }
}

struct ScriptedEpisodes {
    episode: Option<ResolvedEpisode>,
    error: Option<String>,
}

#[async_trait]
impl EpisodeResolver for ScriptedEpisodes {
    async fn resolve(&self, _media_id: &str) -> anyhow::Result<Option<ResolvedEpisode>> {
        match &self.error {
            Some(message) => Err(anyhow::anyhow!(message.clone())),
            None => Ok(self.episode),
        }
    }
}

struct ScriptedScraper {
    outcome: ScrapeOutcome,
}

#[async_trait]
impl ScrapeOrchestrator for ScriptedScraper {
    async fn scrape(&self, media: &ScrapeMedia) -> ScrapeOutcome {
        info!(title = %media.title, outcome = self.outcome.kind(), "Scripted scrape");
        self.outcome.clone()
    }
}
