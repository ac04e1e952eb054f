//! CLI command implementations

use crate::output::{navigation_table, report_table, styled_status, to_json, OutputFormat};
use crate::scenario::Scenario;
use marquee_core::{
    timestamp, Mount, NavigationLog, NavigationTarget, PlayerStatus, PlayerView, RouteParams,
    SessionConfig, StatusKind,
};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

/// Confirmations allowed before a scenario is considered stuck
const MAX_CONFIRMATIONS: usize = 3;

/// Load the session configuration, or the defaults when no file is given
pub fn load_config(path: Option<&Path>) -> anyhow::Result<SessionConfig> {
    match path {
        Some(path) => {
            let config = SessionConfig::from_file(path)?;
            info!(path = %path.display(), "Loaded session config");
            Ok(config)
        }
        None => Ok(SessionConfig::default()),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SessionReport {
    back_url: Option<String>,
    navigations: Vec<NavigationTarget>,
    status: PlayerStatus,
}

/// Run a scripted session end to end
pub async fn play(scenario_path: &Path, config: SessionConfig, format: &str) -> anyhow::Result<()> {
    let scenario = Scenario::load(scenario_path)?;
    let navigation = Arc::new(NavigationLog::new());
    let collaborators = scenario.collaborators(navigation.clone());

    let view = match PlayerView::open(config, collaborators, &scenario.path).await? {
        Mount::Mounted(view) => view,
        Mount::Redirected(target) => {
            info!(path = %target, "Onboarding required");
            let report = SessionReport {
                back_url: None,
                navigations: navigation.entries(),
                status: PlayerStatus::Idle,
            };
            print_session(&report, format);
            return Ok(());
        }
    };

    // confirmation reads the resolved episode
    view.wait_for_mount_lookup().await;

    view.set_restart_from_beginning(scenario.restart_from_beginning).await;

    for attempt in 1..=MAX_CONFIRMATIONS {
        let scrape = view.confirm_metadata(scenario.meta.clone()).await?;

        if scenario.follow_navigation {
            if let Some(target) = navigation.last() {
                if let Some(lookup) = view.navigate_to(&target.path).await? {
                    lookup.await?;
                }
            }
        }
        scrape.await?;

        if view.status().await.kind() != StatusKind::Idle {
            break;
        }
        if attempt == MAX_CONFIRMATIONS {
            warn!(attempts = attempt, "Session never settled");
        }
    }

    if scenario.playback_error && view.status().await.kind() == StatusKind::Playing {
        view.report_playback_error().await?;
    }

    let report = SessionReport {
        back_url: Some(view.back_url()),
        navigations: navigation.entries(),
        status: view.status().await,
    };
    print_session(&report, format);
    Ok(())
}

fn print_session(report: &SessionReport, format: &str) {
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(report)),
        OutputFormat::Table => {
            println!("{}", navigation_table(&report.navigations));
            if let Some(exhausted) = report.status.report() {
                println!("{}", report_table(exhausted));
            }
            println!("Status: {}", styled_status(report.status.kind()));
        }
        OutputFormat::Text => {
            println!("Session:");
            for target in &report.navigations {
                println!("  -> {}", target);
            }
            if let Some(back) = &report.back_url {
                println!("  Back: {}", back);
            }
            println!("  Status: {}", styled_status(report.status.kind()));

            match &report.status {
                PlayerStatus::Playing { payload } => {
                    println!("\nPlayback:");
                    println!("  Source: {}", payload.source_id);
                    if let Some(url) = payload.source.preferred_url() {
                        println!("  Stream: {}", url);
                    }
                    match payload.start_offset {
                        Some(offset) => println!("  Start:  {}", timestamp::format(offset)),
                        None => println!("  Start:  resume"),
                    }
                    for track in &payload.captions {
                        println!(
                            "  Caption: {} [{}]{}",
                            track.language,
                            track.id,
                            if track.needs_proxy { " (proxied)" } else { "" }
                        );
                    }
                }
                PlayerStatus::ScrapeNotFound { report: exhausted } => {
                    println!(
                        "\nNo stream found ({} attempts, {} failures):",
                        exhausted.attempts().count(),
                        exhausted.failure_count()
                    );
                    println!("{}", report_table(exhausted));
                }
                _ => {}
            }
        }
    }
}

#[derive(Serialize)]
struct TimestampReport<'a> {
    token: &'a str,
    seconds: Option<f64>,
    normalized: Option<String>,
}

/// Parse a start-time token
pub fn timestamp(token: &str, format: &str) -> anyhow::Result<()> {
    let seconds = timestamp::parse(token);
    let report = TimestampReport {
        token,
        seconds,
        normalized: seconds.map(timestamp::format),
    };

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&report)),
        OutputFormat::Text | OutputFormat::Table => match (report.seconds, &report.normalized) {
            (Some(seconds), Some(normalized)) => {
                println!("{} = {}s ({})", token, seconds, normalized)
            }
            _ => println!("{} is not a start time; playback would resume", token),
        },
    }
    Ok(())
}

/// Format an offset as a start-time token
pub fn format_time(seconds: f64, format: &str) -> anyhow::Result<()> {
    if !seconds.is_finite() || seconds < 0.0 {
        anyhow::bail!("offset must be a non-negative number of seconds, got {}", seconds);
    }
    let token = timestamp::format(seconds);
    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&serde_json::json!({ "seconds": seconds, "token": token }))),
        OutputFormat::Text | OutputFormat::Table => println!("{}", token),
    }
    Ok(())
}

/// Parse a player route
pub fn route(path: &str, config: &SessionConfig, format: &str) -> anyhow::Result<()> {
    let route = RouteParams::from_path(path, config)?;
    let offset = route.start_token.as_deref().and_then(timestamp::parse);

    match OutputFormat::from(format) {
        OutputFormat::Json => println!("{}", to_json(&route)),
        OutputFormat::Text | OutputFormat::Table => {
            println!("Route: {}", route.path(config));
            println!("  Identity: {}", route.identity());
            if let Some(token) = &route.start_token {
                match offset {
                    Some(seconds) => println!("  Start: {} ({}s)", token, seconds),
                    None => println!("  Start: {} (ignored)", token),
                }
            }
        }
    }
    Ok(())
}
