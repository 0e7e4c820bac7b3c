//! Best-effort recovery of tracker metadata from C# indexer sources.
//!
//! Each pattern below is an independent matcher. A matcher that finds
//! nothing is skipped; none of them can fail the file as a whole.

use crate::extract::taxonomy::{push_unique, CategoryTaxonomy};
use crate::types::{RecordSource, TrackerRecord};
use once_cell::sync::Lazy;
use regex::Regex;

static PRIVATE_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)Type\s+=\s+"private""#).unwrap());

/// Avistaz-family indexers inherit privacy from their base class
static PRIVATE_MARKER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)AvistazTracker").unwrap());

/// From `: base(` up to the last quote before the next brace
static CONSTRUCTOR_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#":\s+base\([^{}]*""#).unwrap());

static CATEGORY_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)TorznabCatType\.([^,]+),").unwrap());

const CATEGORY_CALL: &str = "AddCategoryMapping";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
}

struct LineMatcher {
    field: Field,
    pattern: Regex,
}

impl LineMatcher {
    fn new(field: Field, pattern: &str) -> Self {
        Self {
            field,
            pattern: Regex::new(pattern).unwrap(),
        }
    }

    fn capture(&self, line: &str) -> Option<String> {
        self.pattern
            .captures(line)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Matchers applied to the lines of the constructor block
static CONSTRUCTOR_MATCHERS: Lazy<Vec<LineMatcher>> = Lazy::new(|| {
    vec![
        LineMatcher::new(Field::Name, r#"(?i).*name:\s+"([\w\s.\-()]+)""#),
        LineMatcher::new(Field::Name, r#"(?i).*base\("([\w\s.\-()]+)""#),
        LineMatcher::new(Field::Description, r#"(?i).*(?:desc|description):\s+"([^"]+)""#),
    ]
});

/// Fallback for indexers that declare metadata as expression-bodied properties
static PROPERTY_MATCHERS: Lazy<Vec<LineMatcher>> = Lazy::new(|| {
    vec![
        LineMatcher::new(Field::Name, r#"(?i)override\s+string\s+Name\s*=>\s*"([^"]+)""#),
        LineMatcher::new(
            Field::Description,
            r#"(?i)override\s+string\s+Description\s*=>\s*"([^"]+)""#,
        ),
    ]
});

#[derive(Debug, Default)]
struct Fields {
    name: Option<String>,
    description: Option<String>,
}

impl Fields {
    /// First match wins.
    fn offer(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Description => &mut self.description,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn is_complete(&self) -> bool {
        self.name.is_some() && self.description.is_some()
    }
}

fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.split(['\r', '\n']).filter(|l| !l.is_empty())
}

fn scan(text: &str, matchers: &[LineMatcher], fields: &mut Fields) {
    for line in lines(text) {
        for matcher in matchers {
            if let Some(value) = matcher.capture(line) {
                fields.offer(matcher.field, value);
            }
        }
    }
}

pub fn is_private_source(raw: &str) -> bool {
    PRIVATE_TYPE.is_match(raw) || PRIVATE_MARKER.is_match(raw)
}

/// Canonical categories from every `AddCategoryMapping` line, unique, first-seen order.
pub fn extract_categories(raw: &str, taxonomy: &CategoryTaxonomy) -> Vec<String> {
    let mut categories = Vec::new();
    for line in lines(raw).filter(|l| l.contains(CATEGORY_CALL)) {
        if let Some(code) = CATEGORY_CODE.captures(line).and_then(|c| c.get(1)) {
            push_unique(&mut categories, taxonomy.canonicalize(code.as_str()));
        }
    }
    categories
}

/// Recover a record from an indexer source file, or `None` when the file is
/// not a private tracker or no name can be found.
pub fn extract_from_source(raw: &str, taxonomy: &CategoryTaxonomy) -> Option<TrackerRecord> {
    if !is_private_source(raw) {
        return None;
    }

    let mut fields = Fields::default();
    if let Some(block) = CONSTRUCTOR_BLOCK.find(raw) {
        scan(block.as_str(), &CONSTRUCTOR_MATCHERS, &mut fields);
    }
    if !fields.is_complete() {
        scan(raw, &PROPERTY_MATCHERS, &mut fields);
    }

    let name = fields.name.unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return None;
    }

    Some(TrackerRecord {
        name,
        description: fields.description.unwrap_or_default(),
        categories: extract_categories(raw, taxonomy),
        source: RecordSource::SourceCode,
    })
}
