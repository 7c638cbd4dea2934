use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use serde_json::Value;

use crate::data::{
    Category, CitationSource, Coordinates, FetchOutcome, Incident, IncidentSource, Severity,
};
use crate::error::FetchError;
use crate::gemini::DisruptionBackend;

/// Issues one backend request per call and turns the reply into normalized
/// incidents plus the deduplicated grounding sources.
pub struct DisruptionFetcher {
    backend: Arc<dyn DisruptionBackend>,
}

impl DisruptionFetcher {
    pub fn new(backend: Arc<dyn DisruptionBackend>) -> Self {
        Self { backend }
    }

    pub async fn fetch(&self) -> Result<FetchOutcome, FetchError> {
        let now = Utc::now();
        let prompt = build_prompt(now.year());

        let reply = self
            .backend
            .generate(&prompt)
            .await
            .inspect_err(|e| log::error!("Error fetching disruptions: {e}"))?;

        let incidents = parse_incidents(&reply.text, now).inspect_err(|e| {
            log::error!(
                "{e}; response preview: {}",
                reply.text.chars().take(500).collect::<String>()
            );
        })?;
        let sources = dedupe_sources(reply.grounding);

        log::info!(
            "Fetched {} disruptions with {} grounding sources",
            incidents.len(),
            sources.len()
        );

        Ok(FetchOutcome { incidents, sources })
    }
}

pub fn build_prompt(year: i32) -> String {
    format!(
        r#"Act as a maritime security analyst. Search for the latest, real-time ongoing maritime disruptions impacting ocean freight and global shipping lanes in {year}.

CRITICAL: Only include events that are active or occurred in {year}. Do not include outdated events from previous years.

Specifically prioritize searching for:
1. Severe weather events globally (Typhoons, Hurricanes, Cyclones, Heavy Fog, or Ice) that are currently closing ports, delaying vessels, or forcing rerouting in {year}.
2. Disruptions in the Benelux region (Rotterdam, Antwerp) such as congestion, strikes, or delays.
3. Disruptions at major Chinese Ports (Shanghai, Ningbo, Shenzhen, etc.) due to weather, regulation, or congestion.
4. Global hotspots: Red Sea/Suez Canal attacks, Panama Canal restrictions, major port strikes in US/Europe, piracy.

Return the data strictly as a JSON array of objects.
Each object must have:
- id: string (unique)
- title: string (short headline)
- description: string (concise summary of impact)
- severity: "High" | "Medium" | "Low"
- type: "Conflict" | "Weather" | "Strike" | "Accident" | "Regulatory" | "Other"
- locationName: string
- latitude: number
- longitude: number
- date: string (YYYY-MM-DD)
- sources: array of objects {{ "title": string, "url": string }} containing 3-5 distinct, reputable news sources (e.g., Reuters, Bloomberg, Maritime Executive, Splash247, gCaptain) verifying this specific incident.

Ensure coordinates are reasonably accurate for the location (e.g., specific port, canal, or strait).
Prioritize the most recent and high-impact events.
Do not include markdown code blocks in the output, just the raw JSON string if possible, or wrapped in json code block."#
    )
}

/// Removes markdown code-fence markers the model may wrap its JSON in.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();
    if let Some(rest) = body.strip_prefix("```") {
        // Drop the info string ("json", "JSON", ...) up to the first newline.
        body = match rest.find('\n') {
            Some(newline) if rest[..newline].chars().all(|c| c.is_ascii_alphanumeric()) => {
                &rest[newline + 1..]
            }
            _ => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        };
    }
    if let Some(rest) = body.trim_end().strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

pub fn parse_incidents(text: &str, now: DateTime<Utc>) -> Result<Vec<Incident>, FetchError> {
    let json = strip_code_fences(text);
    let items: Vec<Value> = if json.is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(json)?
    };

    let mut incidents: Vec<Incident> = items
        .iter()
        .enumerate()
        .map(|(index, item)| normalize_incident(item, index, now))
        .collect();
    ensure_unique_ids(&mut incidents);
    Ok(incidents)
}

pub fn normalize_incident(item: &Value, index: usize, now: DateTime<Utc>) -> Incident {
    let id = string_field(item, "id")
        .unwrap_or_else(|| format!("inc-{index}-{}", now.timestamp_millis()));

    let severity = string_field(item, "severity")
        .and_then(|s| Severity::parse(&s))
        .unwrap_or(Severity::Medium);

    let category = string_field(item, "type")
        .or_else(|| string_field(item, "category"))
        .map_or(Category::Other, |s| Category::parse(&s));

    let coordinates = Coordinates::new(
        number_field(item, "longitude").unwrap_or(0.0),
        number_field(item, "latitude").unwrap_or(0.0),
    );

    Incident {
        id,
        title: string_field(item, "title").unwrap_or_else(|| "Unknown Incident".to_string()),
        description: string_field(item, "description")
            .unwrap_or_else(|| "No details available.".to_string()),
        severity,
        category,
        location_name: string_field(item, "locationName")
            .unwrap_or_else(|| "Unknown Location".to_string()),
        coordinates,
        date: string_field(item, "date")
            .unwrap_or_else(|| now.date_naive().format("%Y-%m-%d").to_string()),
        sources: incident_sources(item),
    }
}

/// Deduplicates by URI. A repeated URI keeps the slot of its first
/// appearance but takes the title of its last.
pub fn dedupe_sources(sources: Vec<CitationSource>) -> Vec<CitationSource> {
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<CitationSource> = Vec::with_capacity(sources.len());

    for source in sources {
        match slots.get(&source.uri) {
            Some(&slot) => unique[slot] = source,
            None => {
                slots.insert(source.uri.clone(), unique.len());
                unique.push(source);
            }
        }
    }

    unique
}

fn ensure_unique_ids(incidents: &mut [Incident]) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for incident in incidents.iter_mut() {
        let mut count = seen.get(&incident.id).copied().unwrap_or(0);
        if count > 0 {
            let mut renamed = incident.id.clone();
            while seen.contains_key(&renamed) {
                count += 1;
                renamed = format!("{}-{}", incident.id, count);
            }
            log::warn!("Duplicate incident id {}, renaming to {renamed}", incident.id);
            seen.insert(incident.id.clone(), count);
            incident.id = renamed;
        }
        seen.insert(incident.id.clone(), 1);
    }
}

fn incident_sources(item: &Value) -> Vec<IncidentSource> {
    let Some(entries) = item.get("sources").and_then(Value::as_array) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let url = string_field(entry, "url").or_else(|| string_field(entry, "uri"))?;
            let title = string_field(entry, "title").unwrap_or_else(|| url.clone());
            Some(IncidentSource { title, url })
        })
        .collect()
}

fn string_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number_field(item: &Value, key: &str) -> Option<f64> {
    let value = match item.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap()
    }

    const PAYLOAD: &str = r#"[
        {"id": "suez-1", "title": "Houthi attacks", "description": "Rerouting via Cape",
         "severity": "High", "type": "Conflict", "locationName": "Red Sea",
         "latitude": 15.5, "longitude": 41.8, "date": "2025-03-10",
         "sources": [{"title": "Reuters", "url": "https://reuters.com/a"}]},
        {"id": "rtm-2", "title": "Rotterdam congestion", "severity": "Low",
         "type": "Other", "locationName": "Rotterdam", "latitude": "51.95", "longitude": "4.14"}
    ]"#;

    #[test]
    fn strips_json_fence() {
        let fenced = format!("```json\n{PAYLOAD}\n```");
        assert_eq!(strip_code_fences(&fenced), PAYLOAD.trim());
    }

    #[test]
    fn strips_bare_fence_and_whitespace() {
        assert_eq!(strip_code_fences("  ```\n[]\n```  "), "[]");
        assert_eq!(strip_code_fences("```json[1]```"), "[1]");
        assert_eq!(strip_code_fences("[]"), "[]");
    }

    #[test]
    fn fenced_and_plain_payloads_parse_identically() {
        let plain = parse_incidents(PAYLOAD, now()).unwrap();
        let fenced = parse_incidents(&format!("```json\n{PAYLOAD}\n```"), now()).unwrap();
        assert_eq!(plain, fenced);
        assert_eq!(plain.len(), 2);
    }

    #[test]
    fn parses_full_record() {
        let incidents = parse_incidents(PAYLOAD, now()).unwrap();
        let suez = &incidents[0];
        assert_eq!(suez.id, "suez-1");
        assert_eq!(suez.severity, Severity::High);
        assert_eq!(suez.category, Category::Conflict);
        assert_eq!(suez.coordinates, Coordinates::new(41.8, 15.5));
        assert_eq!(suez.sources.len(), 1);
        assert_eq!(suez.sources[0].url, "https://reuters.com/a");
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let incidents = parse_incidents(PAYLOAD, now()).unwrap();
        assert_eq!(incidents[1].coordinates, Coordinates::new(4.14, 51.95));
        assert_eq!(incidents[1].description, "No details available.");
    }

    #[test]
    fn missing_severity_defaults_to_medium() {
        let incident = normalize_incident(&serde_json::json!({"id": "x"}), 0, now());
        assert_eq!(incident.severity, Severity::Medium);

        let incident = normalize_incident(&serde_json::json!({"severity": "Extreme"}), 0, now());
        assert_eq!(incident.severity, Severity::Medium);
    }

    #[test]
    fn empty_item_gets_every_default() {
        let incident = normalize_incident(&serde_json::json!({}), 3, now());
        assert_eq!(incident.id, format!("inc-3-{}", now().timestamp_millis()));
        assert_eq!(incident.title, "Unknown Incident");
        assert_eq!(incident.category, Category::Other);
        assert_eq!(incident.location_name, "Unknown Location");
        assert_eq!(incident.coordinates, Coordinates::ORIGIN);
        assert_eq!(incident.date, "2025-03-14");
        assert!(incident.sources.is_empty());
    }

    #[test]
    fn non_object_items_are_coerced_not_rejected() {
        let incidents = parse_incidents(r#"[42, "text", null]"#, now()).unwrap();
        assert_eq!(incidents.len(), 3);
        assert!(incidents.iter().all(|i| i.severity == Severity::Medium));
    }

    #[test]
    fn malformed_payload_is_parse_error() {
        assert!(matches!(
            parse_incidents("Sorry, I could not find anything.", now()),
            Err(FetchError::Parse(_))
        ));
        assert!(matches!(
            parse_incidents(r#"{"items": []}"#, now()),
            Err(FetchError::Parse(_))
        ));
    }

    #[test]
    fn empty_text_is_empty_list() {
        assert!(parse_incidents("   ", now()).unwrap().is_empty());
    }

    #[test]
    fn duplicate_ids_are_disambiguated() {
        let incidents =
            parse_incidents(r#"[{"id": "a"}, {"id": "a"}, {"id": "b"}]"#, now()).unwrap();
        let ids: Vec<&str> = incidents.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a-2", "b"]);

        let incidents = parse_incidents(
            r#"[{"id": "a"}, {"id": "a-2"}, {"id": "a"}, {"id": "a"}]"#,
            now(),
        )
        .unwrap();
        let ids: Vec<&str> = incidents.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "a-2", "a-3", "a-4"]);
    }

    #[test]
    fn sources_without_url_are_dropped() {
        let item = serde_json::json!({
            "sources": [{"title": "No link"}, {"url": "https://x.test"}]
        });
        let incident = normalize_incident(&item, 0, now());
        assert_eq!(
            incident.sources,
            vec![IncidentSource {
                title: "https://x.test".to_string(),
                url: "https://x.test".to_string(),
            }]
        );
    }

    fn source(title: &str, uri: &str) -> CitationSource {
        CitationSource {
            title: title.to_string(),
            uri: uri.to_string(),
        }
    }

    #[test]
    fn dedupe_keeps_one_entry_per_uri() {
        let deduped = dedupe_sources(vec![
            source("A", "https://a"),
            source("B", "https://b"),
            source("A again", "https://a"),
            source("C", "https://c"),
            source("B again", "https://b"),
        ]);
        let uris: Vec<&str> = deduped.iter().map(|s| s.uri.as_str()).collect();
        assert_eq!(uris, vec!["https://a", "https://b", "https://c"]);
    }

    #[test]
    fn dedupe_last_title_wins_in_first_slot() {
        let deduped = dedupe_sources(vec![
            source("first", "https://a"),
            source("other", "https://b"),
            source("last", "https://a"),
        ]);
        assert_eq!(deduped[0], source("last", "https://a"));
        assert_eq!(deduped[1], source("other", "https://b"));
    }

    #[test]
    fn prompt_names_year_and_fields() {
        let prompt = build_prompt(2025);
        assert!(prompt.contains("in 2025"));
        for field in ["locationName", "latitude", "longitude", "severity", "sources"] {
            assert!(prompt.contains(field), "prompt is missing {field}");
        }
    }
}
