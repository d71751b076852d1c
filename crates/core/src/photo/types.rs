use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Closed set of photo categories. Wire strings are stable and stored in the
/// `photos.category` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoCategory {
    Exterior,
    Interior,
    Food,
    Menu,
    Drink,
    People,
    Other,
}

impl PhotoCategory {
    pub const ALL: [PhotoCategory; 7] = [
        PhotoCategory::Exterior,
        PhotoCategory::Interior,
        PhotoCategory::Food,
        PhotoCategory::Menu,
        PhotoCategory::Drink,
        PhotoCategory::People,
        PhotoCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoCategory::Exterior => "exterior",
            PhotoCategory::Interior => "interior",
            PhotoCategory::Food => "food",
            PhotoCategory::Menu => "menu",
            PhotoCategory::Drink => "drink",
            PhotoCategory::People => "people",
            PhotoCategory::Other => "other",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "exterior" => Some(PhotoCategory::Exterior),
            "interior" => Some(PhotoCategory::Interior),
            "food" => Some(PhotoCategory::Food),
            "menu" => Some(PhotoCategory::Menu),
            "drink" => Some(PhotoCategory::Drink),
            "people" => Some(PhotoCategory::People),
            "other" => Some(PhotoCategory::Other),
            _ => None,
        }
    }
}

impl std::fmt::Display for PhotoCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a photo came from. Providers beyond the built-in two carry their
/// own tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhotoSource {
    Upload,
    Google,
    Provider(String),
}

impl PhotoSource {
    pub fn as_str(&self) -> &str {
        match self {
            PhotoSource::Upload => "upload",
            PhotoSource::Google => "google",
            PhotoSource::Provider(tag) => tag,
        }
    }

    pub fn parse(tag: &str) -> Self {
        match tag {
            "upload" => PhotoSource::Upload,
            "google" => PhotoSource::Google,
            other => PhotoSource::Provider(other.to_string()),
        }
    }
}

impl std::fmt::Display for PhotoSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stored photo row. Moderation flips flags; rows are never physically
/// removed here.
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: i64,
    pub site_id: i64,
    pub source: PhotoSource,
    pub url: Option<String>,
    pub external_ref: Option<String>,
    pub category: PhotoCategory,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub sort_order: i32,
    pub is_hero: bool,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// The outcome of classifying one photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub category: PhotoCategory,
    pub confidence: f64,
    pub tags: Vec<String>,
}
