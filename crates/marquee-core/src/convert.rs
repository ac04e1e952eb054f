//! Run-output conversion for the playback surface

use crate::error::{Error, Result};
use crate::scrape::{CaptionFormat, ProviderCaption, RunOutput, Stream};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// Quality tiers the playback surface understands
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Quality {
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "360")]
    P360,
    #[serde(rename = "480")]
    P480,
    #[serde(rename = "720")]
    P720,
    #[serde(rename = "1080")]
    P1080,
    #[serde(rename = "4k")]
    P4k,
}

impl FromStr for Quality {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "unknown" => Ok(Quality::Unknown),
            "360" => Ok(Quality::P360),
            "480" => Ok(Quality::P480),
            "720" => Ok(Quality::P720),
            "1080" => Ok(Quality::P1080),
            "4k" => Ok(Quality::P4k),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Quality::Unknown => write!(f, "unknown"),
            Quality::P360 => write!(f, "360p"),
            Quality::P480 => write!(f, "480p"),
            Quality::P720 => write!(f, "720p"),
            Quality::P1080 => write!(f, "1080p"),
            Quality::P4k => write!(f, "4K"),
        }
    }
}

/// One rung of a progressive-file quality ladder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileQuality {
    pub container: String,
    pub url: String,
}

/// Source handed to the video engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceDescriptor {
    Hls { url: String },
    File { qualities: BTreeMap<Quality, FileQuality> },
}

impl SourceDescriptor {
    /// Highest quality URL, or the playlist for HLS
    pub fn preferred_url(&self) -> Option<&str> {
        match self {
            SourceDescriptor::Hls { url } => Some(url),
            SourceDescriptor::File { qualities } => {
                qualities.values().next_back().map(|q| q.url.as_str())
            }
        }
    }
}

/// Caption track in the shape the playback surface expects
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionTrack {
    pub id: String,
    pub language: String,
    pub url: String,
    pub format: CaptionFormat,
    /// Must be fetched through a proxy because of CORS
    pub needs_proxy: bool,
}

/// Build the source descriptor for a run output.
///
/// File streams keep only recognised quality keys; a file stream left
/// with none is rejected.
pub fn source_from_run_output(output: &RunOutput) -> Result<SourceDescriptor> {
    match &output.stream {
        Stream::Hls { playlist, .. } => {
            if playlist.is_empty() {
                return Err(Error::UnsupportedStream(format!(
                    "hls stream {} has an empty playlist",
                    output.stream.id()
                )));
            }
            Ok(SourceDescriptor::Hls {
                url: playlist.clone(),
            })
        }
        Stream::File { id, qualities, .. } => {
            let qualities: BTreeMap<Quality, FileQuality> = qualities
                .iter()
                .filter_map(|(name, file)| {
                    let quality = name.parse::<Quality>().ok()?;
                    Some((
                        quality,
                        FileQuality {
                            container: file.container.clone(),
                            url: file.url.clone(),
                        },
                    ))
                })
                .collect();

            if qualities.is_empty() {
                return Err(Error::NoPlayableQuality {
                    stream_id: id.clone(),
                });
            }
            Ok(SourceDescriptor::File { qualities })
        }
    }
}

/// Normalize provider captions
pub fn captions_from_provider(captions: &[ProviderCaption]) -> Vec<CaptionTrack> {
    captions
        .iter()
        .map(|c| CaptionTrack {
            id: c.id.clone(),
            language: c.language.trim().to_ascii_lowercase(),
            url: c.url.clone(),
            format: c.format,
            needs_proxy: c.has_cors_restrictions,
        })
        .collect()
}
