//! Routes and navigation side effects
//!
//! The controller never touches the router directly. Navigations go out
//! through a [`Navigator`], and the "last non-player location" used for
//! the back link is read from an injected [`NavigationHistory`].

use crate::error::{Error, Result};
use crate::types::{MediaIdentity, ResolvedEpisode, SessionConfig};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use url::Url;

/// Where the back link points when there is no history
pub const FALLBACK_BACK_PATH: &str = "/";

/// A navigation request
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NavigationTarget {
    /// Path plus optional query string
    pub path: String,
    /// Replace the current history entry instead of pushing
    pub replace: bool,
}

impl NavigationTarget {
    pub fn push(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replace: false,
        }
    }

    pub fn replace(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replace: true,
        }
    }
}

impl std::fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.replace {
            write!(f, "{} (replace)", self.path)
        } else {
            write!(f, "{}", self.path)
        }
    }
}

/// Performs navigations on behalf of the session
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: NavigationTarget);
}

/// Read-only view of the host's navigation history
pub trait NavigationHistory: Send + Sync {
    /// Last location visited outside the player, if any
    fn last_non_player_path(&self) -> Option<String>;
}

/// History that always points at a fixed location
#[derive(Debug, Clone, Default)]
pub struct StaticHistory(pub Option<String>);

impl NavigationHistory for StaticHistory {
    fn last_non_player_path(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Navigator that records every request in order
#[derive(Debug, Default)]
pub struct NavigationLog {
    entries: Mutex<Vec<NavigationTarget>>,
}

impl NavigationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded navigations, oldest first
    pub fn entries(&self) -> Vec<NavigationTarget> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    pub fn last(&self) -> Option<NavigationTarget> {
        self.entries().pop()
    }
}

impl Navigator for NavigationLog {
    fn navigate(&self, target: NavigationTarget) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(target);
        }
    }
}

/// Parameters of a player route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteParams {
    pub media_id: String,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    /// Raw start-time token from the query string
    pub start_token: Option<String>,
}

impl RouteParams {
    pub fn new(media_id: impl Into<String>) -> Self {
        Self {
            media_id: media_id.into(),
            season: None,
            episode: None,
            start_token: None,
        }
    }

    pub fn with_episode(mut self, season: u32, episode: u32) -> Self {
        self.season = Some(season);
        self.episode = Some(episode);
        self
    }

    pub fn with_start_token(mut self, token: impl Into<String>) -> Self {
        self.start_token = Some(token.into());
        self
    }

    /// Parse `/media/{mediaId}[/{season}/{episode}][?t=...]`.
    ///
    /// Season and episode segments that are not integers are treated as
    /// absent.
    pub fn from_path(path: &str, config: &SessionConfig) -> Result<Self> {
        let base = Url::parse("http://localhost/").map_err(|e| Error::InvalidRoute(e.to_string()))?;
        let url = base
            .join(path)
            .map_err(|e| Error::InvalidRoute(format!("{}: {}", path, e)))?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();
        let prefix: Vec<&str> = config
            .media_path_prefix
            .split('/')
            .filter(|seg| !seg.is_empty())
            .collect();

        if !segments.starts_with(&prefix) {
            return Err(Error::InvalidRoute(format!(
                "{} is not under {}",
                path, config.media_path_prefix
            )));
        }

        let rest = &segments[prefix.len()..];
        let media_id = match rest.first() {
            Some(id) => id.to_string(),
            None => return Err(Error::InvalidRoute(format!("{} has no media id", path))),
        };
        if rest.len() > 3 {
            return Err(Error::InvalidRoute(format!("{} has too many segments", path)));
        }

        let start_token = url
            .query_pairs()
            .find(|(key, _)| key == config.start_time_param.as_str())
            .map(|(_, value)| value.into_owned());

        Ok(Self {
            media_id,
            season: rest.get(1).and_then(|s| s.parse().ok()),
            episode: rest.get(2).and_then(|s| s.parse().ok()),
            start_token,
        })
    }

    /// Identity this route plays
    pub fn identity(&self) -> MediaIdentity {
        MediaIdentity {
            media_id: self.media_id.clone(),
            season: self.season,
            episode: self.episode,
        }
    }

    /// Path of this route without the query string
    pub fn path(&self, config: &SessionConfig) -> String {
        let episode = match (self.season, self.episode) {
            (Some(season), Some(episode)) => Some(ResolvedEpisode::new(season, episode)),
            _ => None,
        };
        media_path(config, &self.media_id, episode)
    }
}

/// Player path for a media id, with season/episode for series
pub fn media_path(config: &SessionConfig, media_id: &str, episode: Option<ResolvedEpisode>) -> String {
    let prefix = config.media_path_prefix.trim_end_matches('/');
    match episode {
        Some(ep) => format!("{}/{}/{}/{}", prefix, media_id, ep.season, ep.episode),
        None => format!("{}/{}", prefix, media_id),
    }
}

/// Redirect to onboarding carrying the original path as a return parameter
pub fn onboarding_redirect(config: &SessionConfig, return_path: &str) -> NavigationTarget {
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair(&config.redirect_param, return_path)
        .finish();
    NavigationTarget::replace(format!("{}?{}", config.onboarding_path, query))
}
