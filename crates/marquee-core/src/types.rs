//! Core types for Marquee

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a player view session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonic counter bumped on every identity reset.
///
/// Every asynchronous request is tagged with the generation it was issued
/// under; results carrying an older generation are dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Generation(pub u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What to play: the title id plus season/episode path segments
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaIdentity {
    pub media_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
}

impl MediaIdentity {
    pub fn new(media_id: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            season: None,
            episode: None,
        }
    }

    pub fn with_episode(media_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            media_id: media_id.into(),
            season: Some(season),
            episode: Some(episode),
        }
    }
}

impl std::fmt::Display for MediaIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.season, self.episode) {
            (Some(s), Some(e)) => write!(f, "{} S{:02}E{:02}", self.media_id, s, e),
            _ => write!(f, "{}", self.media_id),
        }
    }
}

/// Season/episode pair looked up for a media id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedEpisode {
    pub season: u32,
    pub episode: u32,
}

impl ResolvedEpisode {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

/// Media type as reported by the metadata step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Show,
}

impl MediaType {
    pub fn is_series(&self) -> bool {
        matches!(self, MediaType::Show)
    }
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaType::Movie => write!(f, "movie"),
            MediaType::Show => write!(f, "show"),
        }
    }
}

/// A season or episode entry selected in the metadata step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaPart {
    pub number: u32,
    pub tmdb_id: String,
    pub title: String,
}

/// Metadata produced by the metadata-entry step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMeta {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    pub tmdb_id: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    pub release_year: u32,
    #[serde(default)]
    pub poster: Option<String>,
    #[serde(default)]
    pub season: Option<MetaPart>,
    #[serde(default)]
    pub episode: Option<MetaPart>,
}

impl PlayerMeta {
    /// Metadata for a movie
    pub fn movie(tmdb_id: impl Into<String>, title: impl Into<String>, release_year: u32) -> Self {
        Self {
            media_type: MediaType::Movie,
            title: title.into(),
            tmdb_id: tmdb_id.into(),
            imdb_id: None,
            release_year,
            poster: None,
            season: None,
            episode: None,
        }
    }

    /// Metadata for a show with no episode chosen yet
    pub fn show(tmdb_id: impl Into<String>, title: impl Into<String>, release_year: u32) -> Self {
        Self {
            media_type: MediaType::Show,
            ..Self::movie(tmdb_id, title, release_year)
        }
    }

    /// Season/episode numbers carried by the metadata itself
    pub fn episode_numbers(&self) -> Option<ResolvedEpisode> {
        match (&self.season, &self.episode) {
            (Some(s), Some(e)) => Some(ResolvedEpisode::new(s.number, e.number)),
            _ => None,
        }
    }
}

/// Episode coordinates handed to the scraper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeEpisode {
    pub season: u32,
    pub episode: u32,
    #[serde(default)]
    pub season_tmdb_id: Option<String>,
    #[serde(default)]
    pub episode_tmdb_id: Option<String>,
}

/// Concrete media descriptor a scrape runs against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeMedia {
    #[serde(rename = "type")]
    pub media_type: MediaType,
    pub title: String,
    pub tmdb_id: String,
    #[serde(default)]
    pub imdb_id: Option<String>,
    pub release_year: u32,
    #[serde(default)]
    pub episode: Option<ScrapeEpisode>,
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Path prefix of player routes
    pub media_path_prefix: String,
    /// Where users are sent when onboarding is required
    pub onboarding_path: String,
    /// Query parameter carrying the return path on the onboarding redirect
    pub redirect_param: String,
    /// Query parameter carrying the start-time token
    pub start_time_param: String,
    /// Season used when none is resolved
    pub default_season: u32,
    /// Episode used when none is resolved
    pub default_episode: u32,
    /// Apply resolved-or-default episodes to series scrapes whose metadata
    /// carries no episode of its own
    pub scrape_episode_fallback: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            media_path_prefix: "/media".to_string(),
            onboarding_path: "/onboarding".to_string(),
            redirect_param: "redirect".to_string(),
            start_time_param: "t".to_string(),
            default_season: 1,
            default_episode: 1,
            scrape_episode_fallback: true,
        }
    }
}

impl SessionConfig {
    /// Load a configuration from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Check the configuration for values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        for (name, path) in [
            ("media_path_prefix", &self.media_path_prefix),
            ("onboarding_path", &self.onboarding_path),
        ] {
            if !path.starts_with('/') {
                return Err(Error::InvalidConfig(format!(
                    "{} must be an absolute path, got {:?}",
                    name, path
                )));
            }
        }
        if self.redirect_param.is_empty() || self.start_time_param.is_empty() {
            return Err(Error::InvalidConfig("query parameter names must not be empty".into()));
        }
        if self.default_season == 0 || self.default_episode == 0 {
            return Err(Error::InvalidConfig("default season/episode start at 1".into()));
        }
        Ok(())
    }

    /// Episode applied when nothing better is known
    pub fn default_episode(&self) -> ResolvedEpisode {
        ResolvedEpisode::new(self.default_season, self.default_episode)
    }
}
