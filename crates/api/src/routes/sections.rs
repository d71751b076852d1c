//! Section editing endpoints: content save, append, reorder.
//!
//! Every mutation resolves the viewer, checks site access, and funnels
//! content through normalization before anything is persisted.

use axum::{
    extract::{Path, State},
    http::HeaderMap,
    routing::{get, patch, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use sitesmith_core::access::{can_access_site, SiteOwnership, ViewerContext};
use sitesmith_core::content;
use sitesmith_core::content::SectionType;
use sitesmith_core::events::types::{
    SectionAddedEvent, SectionSavedEvent, SectionsReorderedEvent,
};
use sitesmith_core::events::SiteEvent;
use sitesmith_core::ordering::{OrderingEngine, ReorderError};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{self, SqlxSectionBatch};
use crate::viewer::resolve_viewer;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/sites/sections", patch(update_section).post(add_section))
        .route("/v1/sites/sections/reorder", post(reorder_sections))
        .route("/v1/sites/{site_id}/sections", get(preview_sections))
}

/// Load the site's ownership descriptor and require access. Authorization
/// failures surface as a plain rejection; whether callers show them as "not
/// found" is their choice.
async fn require_site_access(
    state: &AppState,
    site_id: i64,
    viewer: &ViewerContext,
) -> ApiResult<SiteOwnership> {
    let site = store::site_ownership(state.pool(), site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("site not found".to_string()))?;

    if !can_access_site(&site, viewer) {
        return Err(ApiError::Forbidden("no access to this site".to_string()));
    }
    Ok(site)
}

/// The editor preview: every stored blob leaves here already normalized, so
/// rendering never sees a raw or partial section.
async fn preview_sections(
    State(state): State<AppState>,
    Path(site_id): Path<i64>,
    headers: HeaderMap,
    jar: CookieJar,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    require_site_access(&state, site_id, &viewer).await?;

    let sections: Vec<Value> = store::sections_for_site(state.pool(), site_id)
        .await?
        .into_iter()
        .map(|section| {
            json!({
                "id": section.id,
                "type": section.section_type,
                "order": section.order,
                "content": content::normalize_tag(&section.section_type, &section.content_json)
                    .to_value(),
            })
        })
        .collect();

    Ok(Json(json!({ "sections": sections })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateSectionPayload {
    site_id: i64,
    section_id: i64,
    content_json: String,
}

async fn update_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<UpdateSectionPayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);

    let section = store::section_by_id(state.pool(), payload.section_id, payload.site_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("section not found".to_string()))?;
    require_site_access(&state, section.site_id, &viewer).await?;

    // Whatever the client sent, only the normalized shape is stored.
    let normalized = content::normalize_tag(&section.section_type, &payload.content_json);
    store::update_section_content(state.pool(), section.id, &normalized.to_json_string()).await?;

    let _ = state
        .event_bus()
        .publish(SiteEvent::SectionSaved(SectionSavedEvent {
            site_id: section.site_id,
            section_id: section.id,
            timestamp: Utc::now(),
        }));

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReorderPayload {
    site_id: i64,
    section_ids: Vec<i64>,
}

async fn reorder_sections(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<ReorderPayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    require_site_access(&state, payload.site_id, &viewer).await?;

    let slots = store::section_slots(state.pool(), payload.site_id).await?;
    let engine = OrderingEngine::new(SqlxSectionBatch::new(
        state.pool().clone(),
        payload.site_id,
    ));

    engine
        .reorder(&slots, &payload.section_ids)
        .await
        .map_err(|err| match err {
            ReorderError::InvalidPayload(inner) => ApiError::from(inner),
            ReorderError::Write(write) => ApiError::Internal(write.to_string()),
        })?;

    let _ = state
        .event_bus()
        .publish(SiteEvent::SectionsReordered(SectionsReorderedEvent {
            site_id: payload.site_id,
            timestamp: Utc::now(),
        }));

    Ok(Json(json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddSectionPayload {
    site_id: i64,
    #[serde(rename = "type")]
    section_type: String,
}

async fn add_section(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<AddSectionPayload>,
) -> ApiResult<Json<Value>> {
    let viewer = resolve_viewer(&headers, &jar);
    require_site_access(&state, payload.site_id, &viewer).await?;

    let section_type = SectionType::parse(&payload.section_type).ok_or_else(|| {
        ApiError::BadRequest(format!("unknown section type: {}", payload.section_type))
    })?;

    let section_id = store::insert_section_and_heal(
        state.pool(),
        payload.site_id,
        section_type.as_str(),
        &content::default_serialized(section_type),
    )
    .await?;

    let _ = state
        .event_bus()
        .publish(SiteEvent::SectionAdded(SectionAddedEvent {
            site_id: payload.site_id,
            section_id,
            section_type,
            timestamp: Utc::now(),
        }));

    Ok(Json(json!({ "ok": true, "sectionId": section_id })))
}
