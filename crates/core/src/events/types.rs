use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::content::SectionType;
use crate::photo::PhotoCategory;

/// Events emitted after successful mutations, consumed by live-preview
/// listeners.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SiteEvent {
    Welcome,
    SectionSaved(SectionSavedEvent),
    SectionAdded(SectionAddedEvent),
    SectionsReordered(SectionsReorderedEvent),
    PhotosChanged(PhotosChangedEvent),
    Reconnect,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionSavedEvent {
    pub site_id: i64,
    pub section_id: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionAddedEvent {
    pub site_id: i64,
    pub section_id: i64,
    pub section_type: SectionType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionsReorderedEvent {
    pub site_id: i64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosChangedEvent {
    pub site_id: i64,
    pub photo_id: Option<i64>,
    pub category: Option<PhotoCategory>,
    pub timestamp: DateTime<Utc>,
}
