// src/models.rs
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

pub type EntryId = i64;

/// A single journal record. `date` is fixed at creation; everything else is
/// replaced wholesale on each submit.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub text: String,
    pub date: String,
    #[serde(default)]
    pub emotions: Vec<String>,
    #[serde(default)]
    pub images: Vec<String>,
}

impl Entry {
    pub fn new(id: EntryId, created: DateTime<Utc>, text: String, emotions: Vec<String>, images: Vec<String>) -> Self {
        Self {
            id,
            text,
            date: created.to_rfc3339_opts(SecondsFormat::Millis, true),
            emotions,
            images,
        }
    }

    /// First non-empty line, used as the list title.
    pub fn preview(&self) -> &str {
        self.text
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .unwrap_or("")
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.date)
            .ok()
            .map(|d| d.with_timezone(&Utc))
    }
}

/// Newest first, by construction.
pub type Collection = Vec<Entry>;

/// Editor draft, not yet persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub images: Vec<String>,
}

impl Draft {
    pub fn from_entry(entry: &Entry) -> Self {
        Draft {
            text: entry.text.clone(),
            images: entry.images.clone(),
        }
    }

    pub fn is_submittable(&self) -> bool {
        !self.text.trim().is_empty()
    }
}
