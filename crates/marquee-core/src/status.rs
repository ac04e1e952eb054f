//! Player status
//!
//! [`PlayerStatus`] carries its payload inline, so `Playing` without a
//! launch payload or `ScrapeNotFound` without a report cannot be built.
//! [`StatusKind`] is the payload-free tag used for transition rules and
//! for picking the active sub-view.

use crate::launcher::LaunchPayload;
use crate::scrape::ExhaustionReport;
use crate::types::ScrapeMedia;
use serde::{Deserialize, Serialize};

/// Payload-free status tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// Waiting for metadata entry
    Idle,
    /// Sources are being scraped
    Scraping,
    /// Every source was tried and none worked
    ScrapeNotFound,
    /// The playback surface reported an unrecoverable fault
    PlaybackError,
    /// Launch payload handed to the playback surface
    Playing,
}

impl StatusKind {
    /// Check if transition to target status is valid.
    ///
    /// Resets to `Idle` bypass this table; they are always allowed.
    pub fn can_transition_to(&self, target: StatusKind) -> bool {
        use StatusKind::*;
        matches!(
            (self, target),
            (Idle, Scraping) |
            (Scraping, Playing) | (Scraping, ScrapeNotFound) |
            (Scraping, PlaybackError) | (ScrapeNotFound, PlaybackError) |
            (PlaybackError, PlaybackError) | (Playing, PlaybackError)
        )
    }
}

impl std::fmt::Display for StatusKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatusKind::Idle => write!(f, "idle"),
            StatusKind::Scraping => write!(f, "scraping"),
            StatusKind::ScrapeNotFound => write!(f, "scrape_not_found"),
            StatusKind::PlaybackError => write!(f, "playback_error"),
            StatusKind::Playing => write!(f, "playing"),
        }
    }
}

/// Current status of the player view
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlayerStatus {
    #[default]
    Idle,
    Scraping { media: ScrapeMedia },
    ScrapeNotFound { report: ExhaustionReport },
    PlaybackError,
    Playing { payload: LaunchPayload },
}

impl PlayerStatus {
    pub fn kind(&self) -> StatusKind {
        match self {
            PlayerStatus::Idle => StatusKind::Idle,
            PlayerStatus::Scraping { .. } => StatusKind::Scraping,
            PlayerStatus::ScrapeNotFound { .. } => StatusKind::ScrapeNotFound,
            PlayerStatus::PlaybackError => StatusKind::PlaybackError,
            PlayerStatus::Playing { .. } => StatusKind::Playing,
        }
    }

    /// Media being scraped
    pub fn scrape_media(&self) -> Option<&ScrapeMedia> {
        match self {
            PlayerStatus::Scraping { media } => Some(media),
            _ => None,
        }
    }

    /// Report shown by the not-found view
    pub fn report(&self) -> Option<&ExhaustionReport> {
        match self {
            PlayerStatus::ScrapeNotFound { report } => Some(report),
            _ => None,
        }
    }

    /// Payload handed to the playback surface
    pub fn payload(&self) -> Option<&LaunchPayload> {
        match self {
            PlayerStatus::Playing { payload } => Some(payload),
            _ => None,
        }
    }
}

impl std::fmt::Display for PlayerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.kind())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use StatusKind::*;
        assert!(Idle.can_transition_to(Scraping));
        assert!(Scraping.can_transition_to(Playing));
        assert!(Scraping.can_transition_to(ScrapeNotFound));
        assert!(ScrapeNotFound.can_transition_to(PlaybackError));
        assert!(PlaybackError.can_transition_to(PlaybackError));
        assert!(Playing.can_transition_to(PlaybackError));

        assert!(!Idle.can_transition_to(Playing));
        assert!(!Idle.can_transition_to(PlaybackError));
        assert!(!Scraping.can_transition_to(Scraping));
        assert!(!PlaybackError.can_transition_to(Playing));
        assert!(!ScrapeNotFound.can_transition_to(Scraping));
    }

    #[test]
    fn test_default_is_idle() {
        let status = PlayerStatus::default();
        assert_eq!(status.kind(), StatusKind::Idle);
        assert!(status.payload().is_none());
        assert!(status.report().is_none());
        assert_eq!(status.to_string(), "idle");
    }
}
