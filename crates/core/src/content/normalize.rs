//! Section content normalization.
//!
//! Every stored content blob passes through here before it reaches rendering
//! or persistence. Normalization never fails: unparsable or mistyped input
//! degrades to per-field defaults, so a corrupted blob can make a section
//! look uncustomized but never unrenderable.

use serde_json::{Map, Value};

use super::hours::normalize_hours_text;
use super::types::{
    AboutContent, ContactContent, Cta, GalleryContent, GalleryItem, HeroContent, MenuContent,
    MenuItem, PhotosContent, ReviewItem, ReviewsContent, SectionContent, SectionType,
};

/// Parse raw JSON text into an object map. Anything that is not a JSON
/// object (including parse failures) becomes an empty map, which then
/// defaults every field.
fn parse_object(raw: &str) -> Map<String, Value> {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// A string field with a fixed default. Only genuine, non-blank strings are
/// accepted; numbers and booleans are not coerced.
fn string_or(map: &Map<String, Value>, key: &str, fallback: &str) -> String {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => s.clone(),
        _ => fallback.to_string(),
    }
}

/// A string-or-absent field. Blank and mistyped values are absent.
fn optional_string(map: &Map<String, Value>, key: &str) -> Option<String> {
    match map.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// A required sub-field of a list entry: present, a string, non-blank.
/// Entries missing one of these are dropped by the list filters.
fn required_entry_string(entry: &Map<String, Value>, key: &str) -> Option<String> {
    match entry.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn entry_objects(value: Option<&Value>) -> Vec<&Map<String, Value>> {
    match value {
        Some(Value::Array(entries)) => entries.iter().filter_map(Value::as_object).collect(),
        _ => Vec::new(),
    }
}

fn parse_ctas(value: Option<&Value>) -> Vec<Cta> {
    let ctas: Vec<Cta> = entry_objects(value)
        .into_iter()
        .filter_map(|entry| {
            Some(Cta {
                label: required_entry_string(entry, "label")?,
                href: string_or(entry, "href", "#"),
            })
        })
        .collect();

    if ctas.is_empty() {
        HeroContent::default().ctas
    } else {
        ctas
    }
}

fn parse_hero(map: &Map<String, Value>) -> HeroContent {
    let defaults = HeroContent::default();
    HeroContent {
        headline: string_or(map, "headline", &defaults.headline),
        subheadline: string_or(map, "subheadline", &defaults.subheadline),
        ctas: parse_ctas(map.get("ctas")),
    }
}

fn parse_about(map: &Map<String, Value>) -> AboutContent {
    let defaults = AboutContent::default();

    // `body` wins over the legacy `text` alias; the output mirrors the
    // resolved body back into `text` for old renderers.
    let body = match optional_string(map, "body") {
        Some(body) => body,
        None => string_or(map, "text", &defaults.body),
    };

    let bullets: Vec<String> = match map.get("bullets") {
        Some(Value::Array(entries)) => entries
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    AboutContent {
        title: string_or(map, "title", &defaults.title),
        text: body.clone(),
        body,
        bullets: if bullets.is_empty() {
            defaults.bullets
        } else {
            bullets
        },
    }
}

fn parse_contact(map: &Map<String, Value>) -> ContactContent {
    let defaults = ContactContent::default();
    ContactContent {
        address: optional_string(map, "address"),
        phone: optional_string(map, "phone"),
        website: optional_string(map, "website"),
        hours: normalize_hours_text(optional_string(map, "hours")),
        title: string_or(map, "title", &defaults.title),
        body: string_or(map, "body", &defaults.body),
        cta_label: string_or(map, "ctaLabel", &defaults.cta_label),
    }
}

fn parse_photos(map: &Map<String, Value>) -> PhotosContent {
    let asset_ids = match map.get("assetIds") {
        Some(Value::Array(entries)) => entries.iter().filter_map(Value::as_i64).collect(),
        _ => Vec::new(),
    };
    PhotosContent { asset_ids }
}

fn parse_menu(map: &Map<String, Value>) -> MenuContent {
    let defaults = MenuContent::default();
    let items: Vec<MenuItem> = entry_objects(map.get("items"))
        .into_iter()
        .filter_map(|entry| {
            Some(MenuItem {
                name: required_entry_string(entry, "name")?,
                description: string_or(entry, "description", ""),
                price: string_or(entry, "price", ""),
            })
        })
        .collect();

    MenuContent {
        title: string_or(map, "title", &defaults.title),
        items: if items.is_empty() { defaults.items } else { items },
    }
}

fn parse_gallery(map: &Map<String, Value>) -> GalleryContent {
    let defaults = GalleryContent::default();
    let items: Vec<GalleryItem> = entry_objects(map.get("items"))
        .into_iter()
        .filter_map(|entry| {
            Some(GalleryItem {
                url: required_entry_string(entry, "url")?,
                caption: string_or(entry, "caption", ""),
            })
        })
        .collect();

    GalleryContent {
        title: string_or(map, "title", &defaults.title),
        items: if items.is_empty() { defaults.items } else { items },
    }
}

/// Round-then-clamp into the 1..=5 star range. Non-numeric ratings fall back
/// to the default of 5.
fn parse_rating(value: Option<&Value>) -> u8 {
    match value.and_then(Value::as_f64) {
        Some(rating) => rating.round().clamp(1.0, 5.0) as u8,
        None => 5,
    }
}

fn parse_reviews(map: &Map<String, Value>) -> ReviewsContent {
    let defaults = ReviewsContent::default();
    let items: Vec<ReviewItem> = entry_objects(map.get("items"))
        .into_iter()
        .filter_map(|entry| {
            Some(ReviewItem {
                quote: required_entry_string(entry, "quote")?,
                author: string_or(entry, "author", "A customer"),
                rating: parse_rating(entry.get("rating")),
            })
        })
        .collect();

    ReviewsContent {
        title: string_or(map, "title", &defaults.title),
        items: if items.is_empty() { defaults.items } else { items },
    }
}

/// Normalize a raw content blob into the fully-defaulted typed shape for
/// `section_type`. Never fails.
pub fn normalize(section_type: SectionType, raw: &str) -> SectionContent {
    let map = parse_object(raw);
    match section_type {
        SectionType::Hero => SectionContent::Hero(parse_hero(&map)),
        SectionType::About => SectionContent::About(parse_about(&map)),
        SectionType::Contact => SectionContent::Contact(parse_contact(&map)),
        SectionType::Photos => SectionContent::Photos(parse_photos(&map)),
        SectionType::Menu => SectionContent::Menu(parse_menu(&map)),
        SectionType::Gallery => SectionContent::Gallery(parse_gallery(&map)),
        SectionType::Reviews => SectionContent::Reviews(parse_reviews(&map)),
    }
}

/// Normalize against a stored type tag. Tags outside the closed set yield
/// [`SectionContent::Unknown`].
pub fn normalize_tag(tag: &str, raw: &str) -> SectionContent {
    match SectionType::parse(tag) {
        Some(section_type) => normalize(section_type, raw),
        None => SectionContent::Unknown,
    }
}

/// The canonical serialized default content for a new section of this type.
pub fn default_serialized(section_type: SectionType) -> String {
    SectionContent::default_for(section_type).to_json_string()
}
