//! View model for the incident sidebar: what to show in list mode, detail
//! mode and while the first scan is running.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::controller::DashboardState;
use crate::data::{CitationSource, Incident, Severity};

pub const NO_SOURCES_PLACEHOLDER: &str = "No external sources linked yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
}

impl Stats {
    pub fn from_incidents(incidents: &[Incident]) -> Self {
        let count = |severity: Severity| {
            incidents
                .iter()
                .filter(|incident| incident.severity == severity)
                .count()
        };
        Self {
            total: incidents.len(),
            high: count(Severity::High),
            medium: count(Severity::Medium),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceFooter<'a> {
    Sources(&'a [CitationSource]),
    Placeholder(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SidebarView<'a> {
    /// First load with nothing to show yet.
    Scanning,
    List {
        stats: Stats,
        incidents: Vec<&'a Incident>,
    },
    Detail {
        incident: &'a Incident,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshButton {
    pub sensitive: bool,
    pub spinning: bool,
}

pub fn refresh_button(state: &DashboardState) -> RefreshButton {
    let loading = state.is_loading();
    RefreshButton {
        sensitive: !loading,
        spinning: loading,
    }
}

pub fn build_view(state: &DashboardState) -> SidebarView<'_> {
    if state.is_loading() && state.incidents.is_empty() {
        return SidebarView::Scanning;
    }

    if let Some(incident) = state.selected_incident() {
        return SidebarView::Detail { incident };
    }

    SidebarView::List {
        stats: Stats::from_incidents(&state.incidents),
        incidents: sort_by_severity(&state.incidents),
    }
}

/// Global feed sources; hidden while an incident is open.
pub fn build_footer(state: &DashboardState) -> Option<SourceFooter<'_>> {
    if state.selected_incident().is_some() {
        return None;
    }
    Some(if state.sources.is_empty() {
        SourceFooter::Placeholder(NO_SOURCES_PLACEHOLDER)
    } else {
        SourceFooter::Sources(&state.sources)
    })
}

/// Highest severity first; equal severities keep their fetched order.
pub fn sort_by_severity(incidents: &[Incident]) -> Vec<&Incident> {
    let mut sorted: Vec<&Incident> = incidents.iter().collect();
    sorted.sort_by(|a, b| b.severity.rank().cmp(&a.severity.rank()));
    sorted
}

/// `2025-03-07` becomes `07 Mar 25`; anything unparseable is shown as is.
pub fn format_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(parsed) => parsed.format("%d %b %y").to_string(),
        Err(_) => date.to_string(),
    }
}

pub fn format_coordinate(value: f64) -> String {
    format!("{value:.4}")
}

pub fn format_updated(updated: DateTime<Utc>, tz: Tz) -> String {
    format!("Updated: {}", updated.with_timezone(&tz).format("%H:%M:%S %Z"))
}

/// The system timezone, falling back to UTC.
pub fn local_timezone() -> Tz {
    iana_time_zone::get_timezone()
        .ok()
        .and_then(|name| {
            log::debug!("Detected timezone: {name}");
            name.parse().ok()
        })
        .unwrap_or_else(|| {
            log::warn!("Failed to detect timezone, using UTC");
            chrono_tz::UTC
        })
}
