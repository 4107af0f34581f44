// src/types/records.rs
//! Backend records. The backend owns their shape, so they stay opaque JSON
//! with a handful of read accessors.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchFilter {
    pub title: String,
    pub location: String,
}

impl SearchFilter {
    pub fn new(title: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            location: location.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.trim().is_empty() && self.location.trim().is_empty()
    }
}

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

/// Backend id, `_id` first (Mongo style), then `id`.
fn record_id(value: &Value) -> Option<String> {
    let id = value.get("_id").or_else(|| value.get("id"))?;
    match id {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Job(pub Value);

impl Job {
    pub fn id(&self) -> Option<String> {
        record_id(&self.0)
    }

    pub fn title(&self) -> Option<&str> {
        str_field(&self.0, "title")
    }

    pub fn location(&self) -> Option<&str> {
        str_field(&self.0, "location")
    }

    /// Case-insensitive substring match on title and location.
    /// Blank criteria match everything.
    pub fn matches(&self, filter: &SearchFilter) -> bool {
        fn contains(field: Option<&str>, needle: &str) -> bool {
            let needle = needle.trim().to_lowercase();
            needle.is_empty()
                || field
                    .map(|f| f.to_lowercase().contains(&needle))
                    .unwrap_or(false)
        }

        contains(self.title(), &filter.title) && contains(self.location(), &filter.location)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompanyProfile(pub Value);

impl CompanyProfile {
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub Value);

impl UserProfile {
    pub fn name(&self) -> Option<&str> {
        str_field(&self.0, "name")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Application(pub Value);

impl Application {
    pub fn status(&self) -> Option<&str> {
        str_field(&self.0, "status")
    }
}
