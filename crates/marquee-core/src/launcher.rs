//! Playback launch arguments

use crate::convert::{captions_from_provider, source_from_run_output, CaptionTrack, SourceDescriptor};
use crate::error::Result;
use crate::scrape::{ProviderCaption, RunOutput};
use crate::timestamp;
use serde::{Deserialize, Serialize};

/// Everything the playback surface needs to start
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchPayload {
    pub source: SourceDescriptor,
    pub captions: Vec<CaptionTrack>,
    pub source_id: String,
    /// `None` lets the playback surface resume from its last known position
    pub start_offset: Option<f64>,
}

/// Inputs to a launch besides the run output
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LaunchOptions<'a> {
    /// Raw start-time token from the route
    pub start_token: Option<&'a str>,
    /// One-shot override that forces the offset to zero
    pub restart_from_beginning: bool,
}

/// Computes launch payloads from successful scrapes
pub struct PlaybackLauncher;

impl PlaybackLauncher {
    /// Build the payload for a run output.
    ///
    /// `captions` is the provider-native caption list, normally the
    /// stream's own. The caller clears the restart flag once this returns.
    pub fn launch(
        output: &RunOutput,
        captions: &[ProviderCaption],
        options: LaunchOptions<'_>,
    ) -> Result<LaunchPayload> {
        let source = source_from_run_output(output)?;

        let start_offset = if options.restart_from_beginning {
            Some(0.0)
        } else {
            options.start_token.and_then(timestamp::parse)
        };

        Ok(LaunchPayload {
            source,
            captions: captions_from_provider(captions),
            source_id: output.source_id.clone(),
            start_offset,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::{CaptionFormat, Stream};

    fn output() -> RunOutput {
        RunOutput {
            source_id: "flixhq".into(),
            embed_id: None,
            stream: Stream::Hls {
                id: "main".into(),
                playlist: "https://cdn.example.com/master.m3u8".into(),
                flags: vec![],
                captions: vec![ProviderCaption {
                    id: "en".into(),
                    url: "https://cdn.example.com/en.vtt".into(),
                    format: CaptionFormat::Vtt,
                    has_cors_restrictions: false,
                    language: "en".into(),
                }],
            },
        }
    }

    fn launch(token: Option<&str>, restart: bool) -> LaunchPayload {
        let out = output();
        PlaybackLauncher::launch(
            &out,
            out.stream.captions(),
            LaunchOptions {
                start_token: token,
                restart_from_beginning: restart,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_token_sets_offset() {
        assert_eq!(launch(Some("125"), false).start_offset, Some(125.0));
        assert_eq!(launch(Some("2:05"), false).start_offset, Some(125.0));
    }

    #[test]
    fn test_missing_or_bad_token_leaves_offset_unset() {
        assert_eq!(launch(None, false).start_offset, None);
        assert_eq!(launch(Some("later"), false).start_offset, None);
    }

    #[test]
    fn test_restart_overrides_token() {
        assert_eq!(launch(Some("125"), true).start_offset, Some(0.0));
        assert_eq!(launch(None, true).start_offset, Some(0.0));
    }

    #[test]
    fn test_payload_carries_source_and_captions() {
        let payload = launch(None, false);
        assert_eq!(payload.source_id, "flixhq");
        assert_eq!(payload.captions.len(), 1);
        assert_eq!(
            payload.source,
            SourceDescriptor::Hls {
                url: "https://cdn.example.com/master.m3u8".into()
            }
        );
    }
}
