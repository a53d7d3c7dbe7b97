//! FHIR search result model
//!
//! Only the handful of Bundle and Patient fields the client reads are typed.
//! The resource body of every entry is kept as raw JSON and read through a
//! generic named-property accessor.

use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Searchset Bundle envelope as returned by `GET [base]/Patient?...`
#[derive(Debug, Clone, Deserialize)]
struct Bundle {
    #[serde(rename = "resourceType")]
    resource_type: String,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    entry: Vec<BundleEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct BundleEntry {
    #[serde(default)]
    resource: Option<Value>,
}

/// Ordered set of matched entries from one search call
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResult {
    entries: Vec<Entry>,
    total: Option<u64>,
}

impl SearchResult {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries, total: None }
    }

    /// Build a result from a Bundle JSON document
    pub fn from_bundle(body: Value) -> Result<Self> {
        let bundle: Bundle = serde_json::from_value(body)?;
        if bundle.resource_type != "Bundle" {
            return Err(AppError::parse(format!(
                "Expected a Bundle, got resourceType '{}'",
                bundle.resource_type
            )));
        }

        let entries = bundle
            .entry
            .into_iter()
            .filter_map(|entry| entry.resource)
            .map(Entry::from_resource)
            .collect();

        Ok(Self {
            entries,
            total: bundle.total,
        })
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Server-reported match count, which may exceed the entries on this page
    pub fn total(&self) -> Option<u64> {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn with_entries(&self, entries: Vec<Entry>) -> Self {
        Self {
            entries,
            total: self.total,
        }
    }
}

/// One recorded name of a patient
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    pub family: Option<String>,
    pub given: Vec<String>,
}

/// A (family, given, birth date) tuple ready for rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTuple<'a> {
    pub family: &'a str,
    pub given: &'a str,
    pub birth_date: &'a [String],
}

/// One matched resource of a search result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Entry {
    resource: Value,
    names: Vec<HumanName>,
    birth_date: Vec<String>,
}

impl Entry {
    pub fn from_resource(resource: Value) -> Self {
        let names = named_values(&resource, "name")
            .into_iter()
            .map(read_human_name)
            .collect();
        let birth_date = named_values(&resource, "birthDate")
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        Self {
            resource,
            names,
            birth_date,
        }
    }

    /// Values of a top-level property, flattened so repeating and single
    /// elements read the same way. Missing or null properties are empty.
    pub fn named_property(&self, name: &str) -> Vec<&Value> {
        named_values(&self.resource, name)
    }

    pub fn names(&self) -> &[HumanName] {
        &self.names
    }

    pub fn birth_date(&self) -> &[String] {
        &self.birth_date
    }

    /// First given name of the first recorded name
    pub fn first_given_name(&self) -> Option<&str> {
        self.names
            .first()
            .and_then(|name| name.given.first())
            .map(String::as_str)
    }

    /// Name tuples with both a non-empty family and given value.
    ///
    /// Names missing either part are dropped without a trace.
    pub fn name_tuples(&self) -> Vec<NameTuple<'_>> {
        self.names
            .iter()
            .filter_map(|name| {
                let family = name.family.as_deref().filter(|f| !f.is_empty())?;
                let given = name.given.first().map(String::as_str).filter(|g| !g.is_empty())?;
                Some(NameTuple {
                    family,
                    given,
                    birth_date: &self.birth_date,
                })
            })
            .collect()
    }
}

fn named_values<'a>(resource: &'a Value, name: &str) -> Vec<&'a Value> {
    match resource.get(name) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().filter(|v| !v.is_null()).collect(),
        Some(value) => vec![value],
    }
}

// R4 `family` is a string; DSTU2 servers still answer with an array
fn read_human_name(value: &Value) -> HumanName {
    let family = named_values(value, "family")
        .into_iter()
        .find_map(Value::as_str)
        .map(str::to_string);
    let given = named_values(value, "given")
        .into_iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect();

    HumanName { family, given }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn smith_bundle() -> Value {
        json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 2,
            "entry": [
                {
                    "fullUrl": "http://hapi.fhir.org/baseR4/Patient/1",
                    "resource": {
                        "resourceType": "Patient",
                        "id": "1",
                        "name": [
                            { "family": "Smith", "given": ["John", "Q"] },
                            { "use": "nickname", "given": ["Johnny"] }
                        ],
                        "birthDate": "1980-01-01"
                    }
                },
                {
                    "fullUrl": "http://hapi.fhir.org/baseR4/Patient/2",
                    "resource": {
                        "resourceType": "Patient",
                        "id": "2",
                        "name": [{ "family": "Smith" }]
                    }
                }
            ]
        })
    }

    #[test]
    fn test_from_bundle() {
        let result = SearchResult::from_bundle(smith_bundle()).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.total(), Some(2));

        let first = &result.entries()[0];
        assert_eq!(first.named_property("id"), vec![&json!("1")]);
        assert_eq!(first.names().len(), 2);
        assert_eq!(first.birth_date(), &["1980-01-01".to_string()]);
        assert_eq!(first.first_given_name(), Some("John"));
    }

    #[test]
    fn test_empty_bundle_has_no_entries() {
        let result = SearchResult::from_bundle(json!({
            "resourceType": "Bundle",
            "type": "searchset",
            "total": 0
        }))
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_non_bundle_is_rejected() {
        let error = SearchResult::from_bundle(json!({
            "resourceType": "OperationOutcome",
            "issue": []
        }))
        .unwrap_err();
        assert_eq!(error.category(), "PARSE");
    }

    #[test]
    fn test_name_tuples_skip_incomplete_names() {
        let result = SearchResult::from_bundle(smith_bundle()).unwrap();

        let tuples = result.entries()[0].name_tuples();
        assert_eq!(tuples.len(), 1);
        assert_eq!(tuples[0].family, "Smith");
        assert_eq!(tuples[0].given, "John");

        assert!(result.entries()[1].name_tuples().is_empty());
    }

    #[test]
    fn test_named_property_flattens_values() {
        let entry = Entry::from_resource(json!({
            "resourceType": "Patient",
            "name": [{ "family": "Doe" }, null],
            "gender": "female",
            "address": null
        }));

        assert_eq!(entry.named_property("name").len(), 1);
        assert_eq!(entry.named_property("gender"), vec![&json!("female")]);
        assert!(entry.named_property("address").is_empty());
        assert!(entry.named_property("birthDate").is_empty());
    }

    #[test]
    fn test_dstu2_family_array() {
        let entry = Entry::from_resource(json!({
            "resourceType": "Patient",
            "name": [{ "family": ["Jones"], "given": ["Ann"] }]
        }));
        assert_eq!(entry.names()[0].family.as_deref(), Some("Jones"));
        assert_eq!(entry.name_tuples().len(), 1);
    }
}
