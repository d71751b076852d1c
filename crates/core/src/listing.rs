//! Automated draft creation from an external business listing.
//!
//! When a site is created from a place-search result, the listing is turned
//! into the initial section set here. Every blob goes through normalization
//! before it is handed to the store, so stored content is always in its
//! canonical shape.

use serde_json::{json, Value};

use crate::content::hours::format_hours_from_json;
use crate::content::{normalize, SectionType};

/// A resolved place-search result, as provided by the place-details
/// collaborator.
#[derive(Debug, Clone, Default)]
pub struct BusinessListing {
    pub place_id: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours_json: Option<Value>,
    pub city: Option<String>,
}

/// A section row to create, with its content already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSection {
    pub section_type: SectionType,
    pub order: i32,
    pub content_json: String,
}

/// The hero call-to-action: phone wins, then website, then a placeholder.
fn hero_cta(listing: &BusinessListing) -> Value {
    if let Some(phone) = listing.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        return json!({ "label": "Call us", "href": format!("tel:{phone}") });
    }
    if let Some(website) = listing.website.as_deref().filter(|w| !w.trim().is_empty()) {
        return json!({ "label": "Visit website", "href": website });
    }
    json!({ "label": "Learn more", "href": "#" })
}

fn normalized_json(section_type: SectionType, raw: Value) -> String {
    normalize(section_type, &raw.to_string()).to_json_string()
}

/// Build the initial sections for a new draft site, at orders 1..N.
/// A PHOTOS section is included only when the import produced assets.
pub fn initial_sections(listing: &BusinessListing, asset_ids: &[i64]) -> Vec<NewSection> {
    let about_body = match listing.city.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(city) => format!(
            "Welcome to {} in {city}. We're glad you're here.",
            listing.name
        ),
        None => format!("Welcome to {}. We're glad you're here.", listing.name),
    };

    let hours = listing.hours_json.as_ref().and_then(format_hours_from_json);

    let mut payloads = vec![
        (
            SectionType::Hero,
            json!({
                "headline": &listing.name,
                "subheadline": &listing.city,
                "ctas": [hero_cta(listing)],
            }),
        ),
        (
            SectionType::About,
            json!({ "body": about_body }),
        ),
    ];

    if !asset_ids.is_empty() {
        payloads.push((SectionType::Photos, json!({ "assetIds": asset_ids })));
    }

    payloads.push((
        SectionType::Contact,
        json!({
            "address": &listing.address,
            "phone": &listing.phone,
            "website": &listing.website,
            "hours": hours,
        }),
    ));

    payloads
        .into_iter()
        .enumerate()
        .map(|(index, (section_type, raw))| NewSection {
            section_type,
            order: index as i32 + 1,
            content_json: normalized_json(section_type, raw),
        })
        .collect()
}

/// Lowercase, drop everything outside `[a-z0-9 -]`, collapse runs of
/// whitespace and hyphens into single hyphens.
pub fn slugify(value: &str) -> String {
    let lowered: String = value
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(lowered.len());
    for part in lowered.split(|c: char| c.is_whitespace() || c == '-') {
        if part.is_empty() {
            continue;
        }
        if !slug.is_empty() {
            slug.push('-');
        }
        slug.push_str(part);
    }

    if slug.is_empty() {
        "site".to_string()
    } else {
        slug
    }
}

/// The starting slug for a listing-created site: the slugified name plus a
/// short stable suffix from the place id, keeping first attempts unique
/// without a round-trip.
pub fn listing_slug(listing: &BusinessListing) -> String {
    let base = slugify(&listing.name);
    let suffix: String = listing
        .place_id
        .to_lowercase()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .collect();
    let suffix = if suffix.is_empty() {
        "draft".to_string()
    } else {
        suffix.chars().rev().take(6).collect::<Vec<_>>().into_iter().rev().collect()
    };
    format!("{base}-{suffix}")
}
