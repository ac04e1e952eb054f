//! Scrape boundary
//!
//! The provider-scraping engine is a black box behind [`ScrapeOrchestrator`].
//! It is handed a [`ScrapeMedia`] and must finish with exactly one
//! [`ScrapeOutcome`]: a run output, or a report of every source it tried.

use crate::types::ScrapeMedia;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caption file format offered by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptionFormat {
    Srt,
    Vtt,
}

/// Caption as a provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderCaption {
    pub id: String,
    pub url: String,
    #[serde(rename = "type")]
    pub format: CaptionFormat,
    #[serde(default)]
    pub has_cors_restrictions: bool,
    pub language: String,
}

/// Single progressive file inside a file stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFile {
    #[serde(rename = "type")]
    pub container: String,
    pub url: String,
}

/// Playable stream found by a provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Stream {
    Hls {
        id: String,
        playlist: String,
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        captions: Vec<ProviderCaption>,
    },
    File {
        id: String,
        /// Keyed by quality name as the provider spells it
        qualities: BTreeMap<String, StreamFile>,
        #[serde(default)]
        flags: Vec<String>,
        #[serde(default)]
        captions: Vec<ProviderCaption>,
    },
}

impl Stream {
    pub fn id(&self) -> &str {
        match self {
            Stream::Hls { id, .. } | Stream::File { id, .. } => id,
        }
    }

    pub fn captions(&self) -> &[ProviderCaption] {
        match self {
            Stream::Hls { captions, .. } | Stream::File { captions, .. } => captions,
        }
    }
}

/// Successful result of a scrape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOutput {
    pub source_id: String,
    #[serde(default)]
    pub embed_id: Option<String>,
    pub stream: Stream,
}

/// Per-source progress state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    Waiting,
    Pending,
    Success,
    NotFound,
    Failure,
}

/// What happened to one source (or embed) during a scrape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapingSegment {
    pub name: String,
    pub id: String,
    #[serde(default)]
    pub embed_id: Option<String>,
    pub status: SegmentStatus,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub percentage: f64,
}

/// Order entry: a source and the embeds tried beneath it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapingItem {
    pub id: String,
    #[serde(default)]
    pub children: Vec<String>,
}

/// Record of every attempted source when none produced a stream
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExhaustionReport {
    pub sources: BTreeMap<String, ScrapingSegment>,
    pub source_order: Vec<ScrapingItem>,
}

impl ExhaustionReport {
    /// Segments in the order they were attempted, embeds after their source
    pub fn attempts(&self) -> impl Iterator<Item = &ScrapingSegment> + '_ {
        self.source_order
            .iter()
            .flat_map(|item| std::iter::once(&item.id).chain(item.children.iter()))
            .filter_map(move |key| self.sources.get(key))
    }

    /// Number of attempts that ended in a hard failure
    pub fn failure_count(&self) -> usize {
        self.attempts()
            .filter(|s| s.status == SegmentStatus::Failure)
            .count()
    }
}

/// Terminal result of one scrape attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ScrapeOutcome {
    Success { output: RunOutput },
    Exhausted { report: ExhaustionReport },
}

impl ScrapeOutcome {
    pub fn success(output: RunOutput) -> Self {
        ScrapeOutcome::Success { output }
    }

    pub fn exhausted(
        sources: BTreeMap<String, ScrapingSegment>,
        source_order: Vec<ScrapingItem>,
    ) -> Self {
        ScrapeOutcome::Exhausted {
            report: ExhaustionReport {
                sources,
                source_order,
            },
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeOutcome::Success { .. } => "success",
            ScrapeOutcome::Exhausted { .. } => "exhausted",
        }
    }
}

/// Provider-scraping engine
///
/// Implementations own their own timeouts and fold transport failures
/// into [`ScrapeOutcome::Exhausted`].
#[async_trait]
pub trait ScrapeOrchestrator: Send + Sync {
    async fn scrape(&self, media: &ScrapeMedia) -> ScrapeOutcome;
}
