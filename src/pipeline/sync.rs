//! Refresh the curated dataset from the upstream spreadsheet JSON.
//!
//! Trackers are matched by exact `Name`. An upstream entry replaces local
//! fields only when its `Updated` date sorts after the local one.

use crate::error::{HarvestError, Result};
use crate::infra::github::GithubClient;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{info, instrument, warn};

const NAME_KEY: &str = "Name";
const UPDATED_KEY: &str = "Updated";
const NEVER_UPDATED: &str = "0000-00-00";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub updated: usize,
    pub added: usize,
    pub total: usize,
}

fn trackers_of(doc: &Value, which: &str) -> Result<Vec<Map<String, Value>>> {
    let list = doc["trackers"]
        .as_array()
        .ok_or_else(|| HarvestError::Parse(format!("{} dataset has no trackers list", which)))?;
    Ok(list
        .iter()
        .filter_map(|v| v.as_object().cloned())
        .collect())
}

fn name_of(tracker: &Map<String, Value>) -> Option<&str> {
    tracker.get(NAME_KEY).and_then(Value::as_str)
}

fn updated_of(tracker: &Map<String, Value>) -> &str {
    tracker
        .get(UPDATED_KEY)
        .and_then(Value::as_str)
        .unwrap_or(NEVER_UPDATED)
}

fn is_excluded(key: &str, excluded_fields: &[String]) -> bool {
    excluded_fields.iter().any(|f| f == key)
}

/// Merge `upstream` into `local`, returning the new document and counts.
pub fn merge_upstream(
    local: &Value,
    upstream: &Value,
    excluded_fields: &[String],
) -> Result<(Value, SyncSummary)> {
    let mut merged: Vec<Map<String, Value>> = Vec::new();
    let mut by_name: HashMap<String, usize> = HashMap::new();
    for tracker in trackers_of(local, "local")? {
        let name = name_of(&tracker)
            .ok_or_else(|| HarvestError::Parse("local tracker without a Name".into()))?
            .to_string();
        match by_name.get(&name) {
            Some(&index) => merged[index] = tracker,
            None => {
                by_name.insert(name, merged.len());
                merged.push(tracker);
            }
        }
    }

    let mut summary = SyncSummary::default();
    for incoming in trackers_of(upstream, "upstream")? {
        let Some(name) = name_of(&incoming).map(str::to_string) else {
            warn!("skipping upstream tracker without a Name");
            continue;
        };

        match by_name.get(&name) {
            Some(&index) => {
                let current = &mut merged[index];
                if updated_of(&incoming) > updated_of(current) {
                    for (key, value) in &incoming {
                        if !is_excluded(key, excluded_fields) {
                            current.insert(key.clone(), value.clone());
                        }
                    }
                    summary.updated += 1;
                }
            }
            None => {
                let entry: Map<String, Value> = incoming
                    .into_iter()
                    .filter(|(key, _)| !is_excluded(key, excluded_fields))
                    .collect();
                by_name.insert(name, merged.len());
                merged.push(entry);
                summary.added += 1;
            }
        }
    }

    merged.sort_by(|a, b| name_of(a).unwrap_or_default().cmp(name_of(b).unwrap_or_default()));
    summary.total = merged.len();

    let trackers = merged.into_iter().map(Value::Object).collect();
    let mut doc = Map::new();
    doc.insert("trackers".to_string(), Value::Array(trackers));
    Ok((Value::Object(doc), summary))
}

/// Fetch the upstream dataset and rewrite `local_path` in place.
#[instrument(skip(github, excluded_fields))]
pub async fn sync_upstream(
    github: &GithubClient,
    upstream_url: &str,
    local_path: &Path,
    excluded_fields: &[String],
) -> Result<SyncSummary> {
    let local: Value = serde_json::from_str(&fs::read_to_string(local_path)?)?;
    let body = github.fetch_url(upstream_url).await?;
    let upstream: Value = serde_json::from_str(&body)
        .map_err(|e| HarvestError::invalid_response(upstream_url, format!("body is not JSON: {}", e)))?;

    let (merged, summary) = merge_upstream(&local, &upstream, excluded_fields)?;
    let mut json = serde_json::to_string_pretty(&merged)?;
    json.push('\n');
    fs::write(local_path, json)?;

    info!(
        updated = summary.updated,
        added = summary.added,
        total = summary.total,
        "Sync complete"
    );
    Ok(summary)
}
