use crate::error::Result;
use crate::extract::taxonomy::{push_unique, CategoryTaxonomy};
use crate::types::{RecordSource, TrackerRecord};
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::HashMap;
use std::fmt;

const PRIVATE_TYPE: &str = "private";

/// Top-level keys of a definition file. A repeated key keeps its last value
/// instead of failing the whole file.
#[derive(Debug, Default)]
struct TopLevel(HashMap<String, Value>);

impl<'de> Deserialize<'de> for TopLevel {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct TopLevelVisitor;

        impl<'de> Visitor<'de> for TopLevelVisitor {
            type Value = TopLevel;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a YAML mapping")
            }

            fn visit_unit<E>(self) -> std::result::Result<TopLevel, E>
            where
                E: de::Error,
            {
                Ok(TopLevel::default())
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<TopLevel, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut fields = HashMap::new();
                while let Some((key, value)) = map.next_entry::<Value, Value>()? {
                    if let Some(key) = scalar(Some(&key)) {
                        fields.insert(key, value);
                    }
                }
                Ok(TopLevel(fields))
            }
        }

        deserializer.deserialize_map(TopLevelVisitor)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Caps {
    categorymappings: Vec<CategoryMapping>,
}

/// Scalars are kept as raw YAML values so that a numeric `cat` does not
/// fail the whole file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CategoryMapping {
    cat: Option<Value>,
}

fn scalar(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Parse a YAML definition file into a record.
///
/// Returns `Ok(None)` for public/semi-private trackers and for definitions
/// without a name. Malformed YAML is an error; callers treat it as "no record".
pub fn extract_from_definition(raw: &str, taxonomy: &CategoryTaxonomy) -> Result<Option<TrackerRecord>> {
    let TopLevel(mut doc) = serde_yaml::from_str(raw)?;

    if scalar(doc.get("type")).as_deref() != Some(PRIVATE_TYPE) {
        return Ok(None);
    }

    let name = scalar(doc.get("name")).unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Ok(None);
    }

    let mut categories = Vec::new();
    let caps = match doc.remove("caps") {
        None | Some(Value::Null) => Caps::default(),
        Some(value) => serde_yaml::from_value(value)?,
    };
    let mappings = caps.categorymappings;
    for mapping in &mappings {
        let Some(cat) = scalar(mapping.cat.as_ref()) else {
            continue;
        };
        let top_level = cat.split('/').next().unwrap_or_default();
        push_unique(&mut categories, taxonomy.canonicalize(top_level));
    }

    Ok(Some(TrackerRecord {
        name,
        description: scalar(doc.get("description")).unwrap_or_default(),
        categories,
        source: RecordSource::Definition,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HarvestError;

    fn extract(raw: &str) -> Option<TrackerRecord> {
        extract_from_definition(raw, &CategoryTaxonomy::default()).unwrap()
    }

    #[test]
    fn test_private_definition_with_categories() {
        let raw = r#"
---
id: example
name: Example
description: "Example is a Private Torrent Tracker for TV and MOVIES"
language: en-US
type: private
encoding: UTF-8
links:
  - https://example.org/
caps:
  categorymappings:
    - {id: 1, cat: TV/HD, desc: "TV HD"}
    - {id: 2, cat: Movies/SD, desc: "Movies SD"}
    - {id: 3, cat: TV/SD, desc: "TV SD"}
    - {id: 4, cat: Other, desc: "Misc"}
  modes:
    search: [q]
"#;
        let record = extract(raw).unwrap();
        assert_eq!(record.name, "Example");
        assert_eq!(
            record.description,
            "Example is a Private Torrent Tracker for TV and MOVIES"
        );
        assert_eq!(record.categories, vec!["TV", "Movies", "General"]);
        assert_eq!(record.category_label(), "TV, Movies, General");
        assert_eq!(record.source, RecordSource::Definition);
    }

    #[test]
    fn test_public_definition_yields_nothing() {
        let raw = "name: Public One\ntype: public\n";
        assert!(extract(raw).is_none());
        let raw = "name: Semi\ntype: semi-private\n";
        assert!(extract(raw).is_none());
        let raw = "name: Untyped\n";
        assert!(extract(raw).is_none());
    }

    #[test]
    fn test_blank_name_yields_nothing() {
        assert!(extract("name: '   '\ntype: private\n").is_none());
        assert!(extract("type: private\n").is_none());
    }

    #[test]
    fn test_missing_description_and_caps_default_to_empty() {
        let record = extract("name: Bare\ntype: private\n").unwrap();
        assert_eq!(record.description, "");
        assert!(record.categories.is_empty());
    }

    #[test]
    fn test_numeric_name_is_accepted() {
        let record = extract("name: 2040\ntype: private\n").unwrap();
        assert_eq!(record.name, "2040");
    }

    #[test]
    fn test_mappings_without_cat_are_skipped() {
        let raw = "name: X\ntype: private\ncaps:\n  categorymappings:\n    - {id: 1}\n    - {id: 2, cat: Audio/MP3}\n";
        assert_eq!(extract(raw).unwrap().categories, vec!["Audio"]);
    }

    #[test]
    fn test_malformed_yaml_is_an_error() {
        let err = extract_from_definition("name: [unclosed\ntype: private", &CategoryTaxonomy::default())
            .unwrap_err();
        assert!(matches!(err, HarvestError::Yaml(_)));
    }

    #[test]
    fn test_repeated_top_level_key_keeps_last_value() {
        let record = extract("name: Dup\ndescription: a\ndescription: b\ntype: private\n").unwrap();
        assert_eq!(record.name, "Dup");
        assert_eq!(record.description, "b");
    }

    #[test]
    fn test_empty_caps_yields_no_categories() {
        let record = extract("name: Z\ntype: private\ncaps:\n").unwrap();
        assert!(record.categories.is_empty());
    }

    #[test]
    fn test_categories_are_unique_and_canonical() {
        let taxonomy = CategoryTaxonomy::new([("tv", "Television"), ("movies", "Film")]);
        let raw = "name: Y\ntype: private\ncaps:\n  categorymappings:\n    - {cat: TV/HD}\n    - {cat: tv/SD}\n    - {cat: Movies}\n";
        let record = extract_from_definition(raw, &taxonomy).unwrap().unwrap();
        assert_eq!(record.categories, vec!["Television", "Film"]);
    }
}
