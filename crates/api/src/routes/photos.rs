//! Photo endpoints: uploads, moderation, and per-category reorder.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use sitesmith_core::access::{can_access_site, ViewerContext};
use sitesmith_core::events::types::PhotosChangedEvent;
use sitesmith_core::events::SiteEvent;
use sitesmith_core::photo::ingest::{
    ingest_photo, plan_photo_reorder, IngestRequest, ModerationAction, PhotoUpdate,
};
use sitesmith_core::photo::storage::build_upload_key;
use sitesmith_core::photo::{PhotoCategory, PhotoSource};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store;
use crate::viewer::resolve_viewer;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sites/photos/reorder", post(reorder_photos))
        .route("/v1/sites/photos/upload-url", post(upload_url))
        .route("/v1/sites/photos/upload-complete", post(upload_complete))
        .route(
            "/v1/sites/photos/{photo_id}",
            patch(moderate_photo).delete(delete_photo),
        )
}

async fn require_site_access(state: &AppState, site_id: i64, viewer: &ViewerContext) -> ApiResult<()> {
    let site = store::site_ownership(state.pool(), site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("site not found".to_string()))?;
    if !can_access_site(&site, viewer) {
        return Err(ApiError::Forbidden("no access to this site".to_string()));
    }
    Ok(())
}

fn publish_photos_changed(
    state: &AppState,
    site_id: i64,
    photo_id: Option<i64>,
    category: Option<PhotoCategory>,
) {
    let _ = state
        .event_bus()
        .publish(SiteEvent::PhotosChanged(PhotosChangedEvent {
            site_id,
            photo_id,
            category,
            timestamp: Utc::now(),
        }));
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderPhotosPayload {
    site_id: i64,
    photo_ids: Vec<i64>,
}

async fn reorder_photos(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<ReorderPhotosPayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    require_site_access(&state, payload.site_id, &viewer).await?;

    let live = store::live_photo_slots(state.pool(), payload.site_id).await?;
    let writes = plan_photo_reorder(&live, &payload.photo_ids)?;
    store::apply_photo_order(state.pool(), payload.site_id, &writes).await?;

    publish_photos_changed(&state, payload.site_id, None, None);
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModeratePhotoPayload {
    category: Option<String>,
    is_hero: Option<bool>,
    restore: Option<bool>,
}

async fn moderate_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<ModeratePhotoPayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    let site_id = store::photo_site_id(state.pool(), photo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("photo not found".to_string()))?;
    require_site_access(&state, site_id, &viewer).await?;

    let mut actions = Vec::new();
    if let Some(tag) = payload.category.as_deref() {
        let category = PhotoCategory::parse(tag)
            .ok_or_else(|| ApiError::BadRequest(format!("unknown photo category: {tag}")))?;
        actions.push(ModerationAction::SetCategory(category));
    }
    if let Some(hero) = payload.is_hero {
        actions.push(ModerationAction::SetHero(hero));
    }
    if let Some(restore) = payload.restore {
        actions.push(if restore {
            ModerationAction::Restore
        } else {
            ModerationAction::SoftDelete
        });
    }

    let update = PhotoUpdate::from_actions(&actions);
    if update.is_empty() {
        return Err(ApiError::BadRequest("no moderation fields given".to_string()));
    }
    store::apply_photo_update(state.pool(), photo_id, &update).await?;

    publish_photos_changed(&state, site_id, Some(photo_id), update.category);
    Ok(Json(json!({ "ok": true })))
}

async fn delete_photo(
    State(state): State<AppState>,
    Path(photo_id): Path<i64>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    let site_id = store::photo_site_id(state.pool(), photo_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("photo not found".to_string()))?;
    require_site_access(&state, site_id, &viewer).await?;

    let update = PhotoUpdate::from_actions(&[ModerationAction::SoftDelete]);
    store::apply_photo_update(state.pool(), photo_id, &update).await?;

    publish_photos_changed(&state, site_id, Some(photo_id), None);
    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadUrlPayload {
    site_id: i64,
    file_name: String,
    content_type: String,
}

/// Remote mode only: hand the client a presigned PUT url. In local mode
/// clients post the bytes to `upload-complete`'s local flow instead.
async fn upload_url(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<UploadUrlPayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    require_site_access(&state, payload.site_id, &viewer).await?;

    let key = build_upload_key(payload.site_id, &payload.file_name);
    let signed = state
        .storage()
        .signed_upload(&key, &payload.content_type)
        .await?;

    Ok(Json(json!({
        "key": key,
        "uploadUrl": signed.upload_url,
        "publicUrl": signed.public_url,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadCompletePayload {
    site_id: i64,
    url: String,
    file_name: Option<String>,
    alt_text: Option<String>,
}

/// Record an uploaded photo: classify it once, then persist the row.
async fn upload_complete(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<UploadCompletePayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    require_site_access(&state, payload.site_id, &viewer).await?;

    if payload.url.trim().is_empty() {
        return Err(ApiError::BadRequest("url is required".to_string()));
    }

    let live_count = store::count_live_photos(state.pool(), payload.site_id).await?;
    let request = IngestRequest {
        site_id: payload.site_id,
        url: Some(payload.url),
        filename: payload.file_name,
        alt_text: payload.alt_text,
        external_ref: None,
        position: None,
    };
    let photo = ingest_photo(
        state.classifier(),
        PhotoSource::Upload,
        request,
        live_count as usize,
    )
    .await;

    let photo_id = store::insert_photo(state.pool(), &photo).await?;
    publish_photos_changed(&state, payload.site_id, Some(photo_id), Some(photo.category));

    Ok(Json(json!({
        "photoId": photo_id,
        "category": photo.category,
        "confidence": photo.confidence,
        "tags": photo.tags,
    })))
}
