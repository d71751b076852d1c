//! Site creation from an already-resolved business listing.
//!
//! Place search and place details are external collaborators; the client
//! posts the resolved listing here. Imported photos are classified during
//! the import and the initial sections are stored pre-normalized.

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use sitesmith_core::listing::{initial_sections, listing_slug, BusinessListing};
use sitesmith_core::photo::ingest::{ingest_batch, IngestRequest};
use sitesmith_core::photo::PhotoSource;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::store::{self, NewSite};
use crate::viewer::{resolve_viewer, ANON_SESSION_COOKIE};

/// Provider imports cap out at this many photos per site.
const MAX_IMPORTED_PHOTOS: usize = 10;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/sites/from-listing", post(create_from_listing))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateFromListingPayload {
    place_id: String,
    name: String,
    address: Option<String>,
    phone: Option<String>,
    website: Option<String>,
    hours_json: Option<Value>,
    city: Option<String>,
    #[serde(default)]
    photo_refs: Vec<String>,
}

async fn unique_slug(state: &AppState, base: &str) -> ApiResult<String> {
    if !store::slug_exists(state.pool(), base).await? {
        return Ok(base.to_string());
    }
    for counter in 2..50 {
        let candidate = format!("{base}-{counter}");
        if !store::slug_exists(state.pool(), &candidate).await? {
            return Ok(candidate);
        }
    }
    Ok(format!("{base}-{}", Uuid::new_v4().simple()))
}

async fn create_from_listing(
    State(state): State<AppState>,
    headers: HeaderMap,
    jar: CookieJar,
    Json(payload): Json<CreateFromListingPayload>,
) -> ApiResult<(CookieJar, Json<Value>)> {
    if payload.place_id.trim().is_empty() || payload.name.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "placeId and name are required".to_string(),
        ));
    }

    let viewer = resolve_viewer(&headers, &jar);

    // A logged-in creator owns the draft outright. Anonymous creators get a
    // draft session id (reusing the cookie if one is already set) so they
    // can keep editing before signing up.
    let (anon_session_id, jar) = match viewer.user_id {
        Some(_) => (None, jar),
        None => match viewer.anon_session_id.clone() {
            Some(existing) => (Some(existing), jar),
            None => {
                let fresh = Uuid::new_v4().to_string();
                let cookie = Cookie::build((ANON_SESSION_COOKIE, fresh.clone()))
                    .path("/")
                    .http_only(true)
                    .build();
                (Some(fresh), jar.add(cookie))
            }
        },
    };

    let listing = BusinessListing {
        place_id: payload.place_id,
        name: payload.name,
        address: payload.address,
        phone: payload.phone,
        website: payload.website,
        hours_json: payload.hours_json,
        city: payload.city,
    };

    let requests: Vec<IngestRequest> = payload
        .photo_refs
        .iter()
        .take(MAX_IMPORTED_PHOTOS)
        .map(|reference| IngestRequest {
            external_ref: Some(reference.clone()),
            ..Default::default()
        })
        .collect();
    let photos = ingest_batch(
        state.classifier(),
        PhotoSource::Google,
        requests,
        0,
        state.config().classifier_chunk_size,
    )
    .await;

    let slug = unique_slug(&state, &listing_slug(&listing)).await?;
    let site = NewSite {
        slug: slug.clone(),
        title: listing.name.clone(),
        place_id: Some(listing.place_id.clone()),
        owner_id: viewer.user_id,
        anon_session_id,
    };

    let site_id = store::create_site(state.pool(), &site, &photos, move |photo_ids| {
        initial_sections(&listing, photo_ids)
    })
    .await?;

    tracing::info!(site_id, slug = %slug, photos = photos.len(), "created draft site from listing");
    Ok((jar, Json(json!({ "siteId": site_id, "slug": slug }))))
}
