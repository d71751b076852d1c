//! Photo ingestion and moderation.
//!
//! Classification runs exactly once per photo, at upload completion or
//! provider import, and the result is persisted on the row. Moderation
//! actions afterwards only flip stored fields.

use thiserror::Error;

use super::classify::{ClassifierInput, PhotoClassifier};
use super::types::{Classification, PhotoCategory, PhotoSource};

/// A photo about to be ingested.
#[derive(Debug, Clone, Default)]
pub struct IngestRequest {
    pub site_id: i64,
    pub url: Option<String>,
    pub filename: Option<String>,
    pub alt_text: Option<String>,
    pub external_ref: Option<String>,
    /// Position within an imported set; doubles as the classifier's bucket
    /// hint for signal-free photos.
    pub position: Option<usize>,
}

/// The row to insert for a newly ingested photo. The store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPhoto {
    pub site_id: i64,
    pub source: PhotoSource,
    pub url: Option<String>,
    pub external_ref: Option<String>,
    pub category: PhotoCategory,
    pub confidence: f64,
    pub tags: Vec<String>,
    pub sort_order: i32,
}

fn classifier_input(request: &IngestRequest) -> ClassifierInput {
    ClassifierInput {
        url: request.url.clone(),
        filename: request.filename.clone(),
        alt_text: request.alt_text.clone(),
        external_ref: request.external_ref.clone(),
        position_hint: request.position,
    }
}

fn new_photo(request: IngestRequest, source: &PhotoSource, result: Classification, sort_order: i32) -> NewPhoto {
    NewPhoto {
        site_id: request.site_id,
        source: source.clone(),
        url: request.url,
        external_ref: request.external_ref,
        category: result.category,
        confidence: result.confidence,
        tags: result.tags,
        sort_order,
    }
}

/// Ingest one photo: classify it and build the row to insert.
/// `live_photo_count` is the site's current non-deleted photo count; the new
/// photo lands after them.
pub async fn ingest_photo(
    classifier: &PhotoClassifier,
    source: PhotoSource,
    request: IngestRequest,
    live_photo_count: usize,
) -> NewPhoto {
    let result = classifier.classify(&classifier_input(&request)).await;
    tracing::debug!(
        site_id = request.site_id,
        category = %result.category,
        confidence = result.confidence,
        "classified ingested photo"
    );
    new_photo(request, &source, result, live_photo_count as i32 + 1)
}

/// Ingest an imported photo set, classifying `chunk_size` photos at a time.
/// Positions fall back to the index within the set, so signal-free imports
/// still fan out across fallback buckets.
pub async fn ingest_batch(
    classifier: &PhotoClassifier,
    source: PhotoSource,
    requests: Vec<IngestRequest>,
    live_photo_count: usize,
    chunk_size: usize,
) -> Vec<NewPhoto> {
    let inputs: Vec<ClassifierInput> = requests
        .iter()
        .enumerate()
        .map(|(index, request)| {
            let mut input = classifier_input(request);
            input.position_hint = input.position_hint.or(Some(index));
            input
        })
        .collect();

    let results = classifier.classify_batch(inputs, chunk_size).await;

    requests
        .into_iter()
        .zip(results)
        .enumerate()
        .map(|(index, (request, result))| {
            new_photo(
                request,
                &source,
                result,
                live_photo_count as i32 + index as i32 + 1,
            )
        })
        .collect()
}

/// A live photo as the reorder planner sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoSlot {
    pub id: i64,
    pub sort_order: i32,
}

/// One sort-order update for a photo row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhotoOrderWrite {
    pub photo_id: i64,
    pub sort_order: i32,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PhotoReorderError {
    #[error("photo reorder payload is empty")]
    EmptyPayload,
    #[error("photo reorder payload contains id {0} more than once")]
    DuplicateId(i64),
    #[error("photo reorder payload references photo id {0} which is not a live photo of the site")]
    UnknownId(i64),
}

/// Plan a reorder of (a subset of) a site's live photos: each requested id
/// gets sort_order = index + 1. Unlike sections, photo sort orders are not
/// required to be contiguous across the whole site, so a partial payload is
/// valid; unknown or duplicate ids reject with zero writes.
pub fn plan_photo_reorder(
    live_photos: &[PhotoSlot],
    requested: &[i64],
) -> Result<Vec<PhotoOrderWrite>, PhotoReorderError> {
    if requested.is_empty() {
        return Err(PhotoReorderError::EmptyPayload);
    }

    let mut seen = std::collections::HashSet::with_capacity(requested.len());
    for &id in requested {
        if !seen.insert(id) {
            return Err(PhotoReorderError::DuplicateId(id));
        }
        if !live_photos.iter().any(|photo| photo.id == id) {
            return Err(PhotoReorderError::UnknownId(id));
        }
    }

    Ok(requested
        .iter()
        .enumerate()
        .map(|(index, &id)| PhotoOrderWrite {
            photo_id: id,
            sort_order: index as i32 + 1,
        })
        .collect())
}

/// A moderation action against one photo row.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationAction {
    SetCategory(PhotoCategory),
    SetHero(bool),
    SoftDelete,
    Restore,
}

/// Field changes a moderation action translates to. The store applies these
/// to the row; `deleted_at` follows `is_deleted`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoUpdate {
    pub category: Option<PhotoCategory>,
    pub is_hero: Option<bool>,
    pub is_deleted: Option<bool>,
}

impl PhotoUpdate {
    pub fn from_actions(actions: &[ModerationAction]) -> Self {
        let mut update = PhotoUpdate::default();
        for action in actions {
            match action {
                ModerationAction::SetCategory(category) => update.category = Some(*category),
                ModerationAction::SetHero(hero) => update.is_hero = Some(*hero),
                ModerationAction::SoftDelete => update.is_deleted = Some(true),
                ModerationAction::Restore => update.is_deleted = Some(false),
            }
        }
        update
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.is_hero.is_none() && self.is_deleted.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ingest_classifies_and_appends() {
        let classifier = PhotoClassifier::new();
        let request = IngestRequest {
            site_id: 5,
            url: Some("https://cdn.example/front-exterior-01.jpg".to_string()),
            ..Default::default()
        };

        let photo = ingest_photo(&classifier, PhotoSource::Upload, request, 3).await;

        assert_eq!(photo.site_id, 5);
        assert_eq!(photo.source, PhotoSource::Upload);
        assert_eq!(photo.category, PhotoCategory::Exterior);
        assert_eq!(photo.sort_order, 4);
        assert!(photo.confidence >= 0.65);
    }

    #[tokio::test]
    async fn batch_ingest_spreads_signal_free_imports() {
        let classifier = PhotoClassifier::new();
        let requests: Vec<IngestRequest> = (0..6)
            .map(|index| IngestRequest {
                site_id: 5,
                external_ref: Some(format!("AUjq-opaque-{index}")),
                ..Default::default()
            })
            .collect();

        let photos = ingest_batch(&classifier, PhotoSource::Google, requests, 0, 4).await;

        assert_eq!(photos.len(), 6);
        let sort_orders: Vec<i32> = photos.iter().map(|photo| photo.sort_order).collect();
        assert_eq!(sort_orders, vec![1, 2, 3, 4, 5, 6]);

        // Index-driven bucket assignment cycles through all three buckets.
        let categories: std::collections::HashSet<PhotoCategory> =
            photos.iter().map(|photo| photo.category).collect();
        assert_eq!(categories.len(), 3);
    }

    #[test]
    fn photo_reorder_assigns_positions() {
        let live = vec![
            PhotoSlot { id: 1, sort_order: 1 },
            PhotoSlot { id: 2, sort_order: 2 },
            PhotoSlot { id: 3, sort_order: 3 },
        ];
        let writes = plan_photo_reorder(&live, &[3, 1]).unwrap();
        assert_eq!(
            writes,
            vec![
                PhotoOrderWrite { photo_id: 3, sort_order: 1 },
                PhotoOrderWrite { photo_id: 1, sort_order: 2 },
            ]
        );
    }

    #[test]
    fn photo_reorder_rejects_bad_payloads() {
        let live = vec![PhotoSlot { id: 1, sort_order: 1 }];
        assert_eq!(
            plan_photo_reorder(&live, &[]),
            Err(PhotoReorderError::EmptyPayload)
        );
        assert_eq!(
            plan_photo_reorder(&live, &[1, 1]),
            Err(PhotoReorderError::DuplicateId(1))
        );
        assert_eq!(
            plan_photo_reorder(&live, &[9]),
            Err(PhotoReorderError::UnknownId(9))
        );
    }

    #[test]
    fn moderation_actions_collapse_into_one_update() {
        let update = PhotoUpdate::from_actions(&[
            ModerationAction::SetCategory(PhotoCategory::Food),
            ModerationAction::SetHero(true),
            ModerationAction::SoftDelete,
            ModerationAction::Restore,
        ]);
        assert_eq!(update.category, Some(PhotoCategory::Food));
        assert_eq!(update.is_hero, Some(true));
        // Last action wins.
        assert_eq!(update.is_deleted, Some(false));
        assert!(!update.is_empty());
        assert!(PhotoUpdate::from_actions(&[]).is_empty());
    }
}
