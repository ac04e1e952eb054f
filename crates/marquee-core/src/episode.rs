//! Episode context resolution
//!
//! Looks up which season/episode a media id should open on. Lookups are
//! cached per media id for the lifetime of the view; a failed lookup is
//! cached as "no episode" and never surfaces as an error.

use crate::types::ResolvedEpisode;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Metadata service mapping a media id to a season/episode
#[async_trait]
pub trait EpisodeResolver: Send + Sync {
    /// `Ok(None)` for movies or titles without episode context
    async fn resolve(&self, media_id: &str) -> anyhow::Result<Option<ResolvedEpisode>>;
}

/// State of the lookup for one media id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Never requested
    Unknown,
    /// Request issued, no answer yet
    Pending,
    /// Answer received (failures are stored as `None`)
    Resolved(Option<ResolvedEpisode>),
}

impl Lookup {
    /// The resolved pair, if one arrived
    pub fn episode(&self) -> Option<ResolvedEpisode> {
        match self {
            Lookup::Resolved(episode) => *episode,
            _ => None,
        }
    }
}

/// Per-media-id cache of resolver answers
#[derive(Debug, Default)]
pub struct EpisodeCache {
    resolved: HashMap<String, Option<ResolvedEpisode>>,
    in_flight: HashSet<String>,
}

impl EpisodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, media_id: &str) -> Lookup {
        if let Some(episode) = self.resolved.get(media_id) {
            Lookup::Resolved(*episode)
        } else if self.in_flight.contains(media_id) {
            Lookup::Pending
        } else {
            Lookup::Unknown
        }
    }

    /// Mark a lookup as issued. Returns false when the id is already
    /// cached or in flight, in which case no request should go out.
    pub fn begin(&mut self, media_id: &str) -> bool {
        if self.resolved.contains_key(media_id) {
            debug!(media_id, "Episode lookup cached");
            return false;
        }
        self.in_flight.insert(media_id.to_string())
    }

    /// Store a resolver answer, degrading failures to "no episode"
    pub fn complete(&mut self, media_id: &str, result: anyhow::Result<Option<ResolvedEpisode>>) {
        self.in_flight.remove(media_id);
        let episode = match result {
            Ok(episode) => episode,
            Err(e) => {
                warn!(media_id, error = %e, "Episode lookup failed, using defaults");
                None
            }
        };
        self.resolved.insert(media_id.to_string(), episode);
    }

    /// Forget an in-flight request whose answer will be discarded
    pub fn abandon(&mut self, media_id: &str) {
        self.in_flight.remove(media_id);
    }
}
