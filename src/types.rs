use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Trim and lower-case a tracker name for equality checks.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Kind of a node in a git tree listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodules (`commit`) and anything GitHub adds later
    #[serde(other)]
    Other,
}

/// One entry of a recursive repository tree listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

impl TreeEntry {
    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }

    /// True for blobs under `prefix` whose path ends with one of `extensions`.
    pub fn matches(&self, prefix: &str, extensions: &[&str]) -> bool {
        self.is_blob()
            && self.path.starts_with(prefix)
            && extensions.iter().any(|ext| self.path.ends_with(ext))
    }
}

/// Which extractor produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Definition,
    SourceCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerRecord {
    pub name: String,
    pub description: String,
    /// Canonical categories, unique, in first-seen order
    pub categories: Vec<String>,
    pub source: RecordSource,
}

impl TrackerRecord {
    pub fn normalized_name(&self) -> String {
        normalize_name(&self.name)
    }

    pub fn category_label(&self) -> String {
        self.categories.join(", ")
    }
}

/// Serialized shape of one emitted tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerEntry {
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&TrackerRecord> for TrackerEntry {
    fn from(record: &TrackerRecord) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            kind: record.category_label(),
        }
    }
}

/// Final sorted, filtered output of a harvest run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDataset {
    pub trackers: Vec<TrackerRecord>,
}

#[derive(Serialize)]
struct OutputFile {
    trackers: Vec<TrackerEntry>,
}

impl OutputDataset {
    pub fn len(&self) -> usize {
        self.trackers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trackers.is_empty()
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<String> {
        let file = OutputFile {
            trackers: self.trackers.iter().map(TrackerEntry::from).collect(),
        };
        let mut json = serde_json::to_string_pretty(&file)?;
        json.push('\n');
        Ok(json)
    }

    /// Overwrites `path` unconditionally.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[derive(Deserialize)]
struct KnownDatasetFile {
    trackers: Vec<KnownTracker>,
}

#[derive(Deserialize)]
struct KnownTracker {
    #[serde(rename = "Name")]
    name: String,
}

/// Normalized names already present in the curated dataset
#[derive(Debug, Clone, Default)]
pub struct KnownTrackerSet {
    names: HashSet<String>,
}

impl KnownTrackerSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| normalize_name(n.as_ref())).collect(),
        }
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let file: KnownDatasetFile = serde_json::from_str(content)?;
        Ok(Self::from_names(file.trackers.iter().map(|t| t.name.as_str())))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.names.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Normalized names that are always excluded from output
#[derive(Debug, Clone)]
pub struct IgnoreList {
    names: HashSet<String>,
}

impl IgnoreList {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            names: names.into_iter().map(|n| normalize_name(n.as_ref())).collect(),
        }
    }

    /// Built-in list plus `extra`.
    pub fn with_extra(extra: &[String]) -> Self {
        Self::new(
            crate::constants::DEFAULT_IGNORE
                .iter()
                .copied()
                .chain(extra.iter().map(String::as_str)),
        )
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.names.contains(normalized)
    }
}

impl Default for IgnoreList {
    fn default() -> Self {
        Self::with_extra(&[])
    }
}
