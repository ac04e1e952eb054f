//! Output formatting for CLI

use console::style;
use marquee_core::{ExhaustionReport, NavigationTarget, StatusKind};
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
pub enum OutputFormat {
    Text,
    Json,
    Table,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "table" => OutputFormat::Table,
            _ => OutputFormat::Text,
        }
    }
}

/// Render serializable data as pretty JSON
pub fn to_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string())
}

#[derive(Tabled)]
struct AttemptRow {
    #[tabled(rename = "Source")]
    name: String,
    #[tabled(rename = "Id")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

/// Attempts of an exhaustion report as a table
pub fn report_table(report: &ExhaustionReport) -> String {
    let rows: Vec<AttemptRow> = report
        .attempts()
        .map(|segment| AttemptRow {
            name: segment.name.clone(),
            id: segment.id.clone(),
            status: format!("{:?}", segment.status).to_lowercase(),
            reason: segment
                .reason
                .clone()
                .or_else(|| segment.error.clone())
                .unwrap_or_default(),
        })
        .collect();
    Table::new(rows).to_string()
}

/// Status name colored by how the session ended
pub fn styled_status(kind: StatusKind) -> String {
    let name = kind.to_string();
    match kind {
        StatusKind::Playing => style(name).green().bold().to_string(),
        StatusKind::Scraping => style(name).cyan().to_string(),
        StatusKind::ScrapeNotFound => style(name).yellow().bold().to_string(),
        StatusKind::PlaybackError => style(name).red().bold().to_string(),
        StatusKind::Idle => style(name).dim().to_string(),
    }
}

#[derive(Tabled)]
struct NavigationRow {
    #[tabled(rename = "#")]
    index: usize,
    #[tabled(rename = "Path")]
    path: String,
    #[tabled(rename = "Mode")]
    mode: &'static str,
}

/// Issued navigations as a table
pub fn navigation_table(entries: &[NavigationTarget]) -> String {
    let rows: Vec<NavigationRow> = entries
        .iter()
        .enumerate()
        .map(|(i, target)| NavigationRow {
            index: i + 1,
            path: target.path.clone(),
            mode: if target.replace { "replace" } else { "push" },
        })
        .collect();
    Table::new(rows).to_string()
}
