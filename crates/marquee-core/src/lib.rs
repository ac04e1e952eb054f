//! Marquee Core - Playback Session Controller
//!
//! This crate drives a single player view from route entry to playback:
//! - Onboarding gate in front of every session
//! - Episode context lookup, cached per media id
//! - Metadata confirmation and the navigation it implies
//! - Scrape orchestration against an external provider engine
//! - Launch payloads with start-time and restart handling
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                         Marquee Core                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌──────────────┐                                               │
//! │  │  Onboarding  │──── redirect ────▶ Navigator                  │
//! │  │     Gate     │                                               │
//! │  └──────┬───────┘                                               │
//! │         │ mount                                                 │
//! │  ┌──────┴───────┐  ┌──────────────┐  ┌──────────────┐          │
//! │  │   Episode    │  │   Session    │  │    Scrape    │          │
//! │  │   Resolver   │─▶│  Controller  │◀─│ Orchestrator │          │
//! │  └──────────────┘  └──────┬───────┘  └──────────────┘          │
//! │                           │                                     │
//! │                    ┌──────┴──────┐                              │
//! │                    │  Playback   │──── payload ────▶ Video      │
//! │                    │  Launcher   │                              │
//! │                    └─────────────┘                              │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod types;
pub mod timestamp;
pub mod navigation;
pub mod episode;
pub mod onboarding;
pub mod scrape;
pub mod convert;
pub mod launcher;
pub mod status;
pub mod controller;
pub mod view;

pub use error::{Error, Result};
pub use types::*;
pub use navigation::{NavigationHistory, NavigationLog, NavigationTarget, Navigator, RouteParams, StaticHistory};
pub use episode::{EpisodeCache, EpisodeResolver, Lookup};
pub use onboarding::{FixedOnboarding, GateDecision, OnboardingCheck, OnboardingGate};
pub use scrape::{ExhaustionReport, RunOutput, ScrapeOrchestrator, ScrapeOutcome, ScrapingItem, ScrapingSegment, Stream};
pub use convert::{CaptionTrack, Quality, SourceDescriptor};
pub use launcher::{LaunchOptions, LaunchPayload, PlaybackLauncher};
pub use status::{PlayerStatus, StatusKind};
pub use controller::{Delivery, SessionController};
pub use view::{Collaborators, Mount, PlayerView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup
pub fn init() {
    tracing::info!(version = VERSION, "Marquee Core initialized");
}
