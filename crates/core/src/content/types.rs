use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Closed set of section types a site page is composed of.
/// The wire strings are stable and stored in the `sections.type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionType {
    Hero,
    About,
    Contact,
    Photos,
    Menu,
    Gallery,
    Reviews,
}

impl SectionType {
    /// All section types in canonical page order.
    pub const ALL: [SectionType; 7] = [
        SectionType::Hero,
        SectionType::About,
        SectionType::Contact,
        SectionType::Photos,
        SectionType::Menu,
        SectionType::Gallery,
        SectionType::Reviews,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Hero => "HERO",
            SectionType::About => "ABOUT",
            SectionType::Contact => "CONTACT",
            SectionType::Photos => "PHOTOS",
            SectionType::Menu => "MENU",
            SectionType::Gallery => "GALLERY",
            SectionType::Reviews => "REVIEWS",
        }
    }

    /// Parse a stored type tag. Unknown tags return `None`; callers render
    /// those sections as a placeholder rather than failing.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "HERO" => Some(SectionType::Hero),
            "ABOUT" => Some(SectionType::About),
            "CONTACT" => Some(SectionType::Contact),
            "PHOTOS" => Some(SectionType::Photos),
            "MENU" => Some(SectionType::Menu),
            "GALLERY" => Some(SectionType::Gallery),
            "REVIEWS" => Some(SectionType::Reviews),
            _ => None,
        }
    }
}

impl std::fmt::Display for SectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A call-to-action button on the hero section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cta {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeroContent {
    pub headline: String,
    pub subheadline: String,
    pub ctas: Vec<Cta>,
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            headline: "Welcome to our business".to_string(),
            subheadline: "We help our customers with great service.".to_string(),
            ctas: vec![Cta {
                label: "Learn more".to_string(),
                href: "#".to_string(),
            }],
        }
    }
}

/// `text` is a legacy alias that always mirrors `body`; older stored blobs
/// carry only `text`, and older renderers still read it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AboutContent {
    pub title: String,
    pub body: String,
    pub bullets: Vec<String>,
    pub text: String,
}

impl Default for AboutContent {
    fn default() -> Self {
        let body = "Tell visitors what makes your business special.".to_string();
        Self {
            title: "About us".to_string(),
            text: body.clone(),
            body,
            bullets: vec![
                "Friendly, experienced team".to_string(),
                "Quality you can count on".to_string(),
                "Locally owned and operated".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactContent {
    pub address: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
    pub hours: Option<String>,
    pub title: String,
    pub body: String,
    pub cta_label: String,
}

impl Default for ContactContent {
    fn default() -> Self {
        Self {
            address: None,
            phone: None,
            website: None,
            hours: None,
            title: "Get in touch".to_string(),
            body: "We'd love to hear from you.".to_string(),
            cta_label: "Contact us".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotosContent {
    /// References into the site's asset collection; order is display order.
    pub asset_ids: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub description: String,
    pub price: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuContent {
    pub title: String,
    pub items: Vec<MenuItem>,
}

impl Default for MenuContent {
    fn default() -> Self {
        Self {
            title: "Our menu".to_string(),
            items: vec![MenuItem {
                name: "House special".to_string(),
                description: "A favorite with our regulars.".to_string(),
                price: "".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryItem {
    pub url: String,
    pub caption: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryContent {
    pub title: String,
    pub items: Vec<GalleryItem>,
}

impl Default for GalleryContent {
    fn default() -> Self {
        Self {
            title: "Gallery".to_string(),
            items: vec![GalleryItem {
                url: "#".to_string(),
                caption: "Our space".to_string(),
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub author: String,
    pub quote: String,
    pub rating: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewsContent {
    pub title: String,
    pub items: Vec<ReviewItem>,
}

impl Default for ReviewsContent {
    fn default() -> Self {
        Self {
            title: "What people say".to_string(),
            items: vec![ReviewItem {
                author: "A customer".to_string(),
                quote: "Great service and friendly staff.".to_string(),
                rating: 5,
            }],
        }
    }
}

/// Fully normalized section content, tagged by the owning section's type.
///
/// Values of this type are produced only by [`normalize`](crate::content::normalize)
/// and are guaranteed to have every field populated; rendering code never
/// null-checks.
#[derive(Debug, Clone, PartialEq)]
pub enum SectionContent {
    Hero(HeroContent),
    About(AboutContent),
    Contact(ContactContent),
    Photos(PhotosContent),
    Menu(MenuContent),
    Gallery(GalleryContent),
    Reviews(ReviewsContent),
    /// A section whose stored type tag is not in the closed set. Rendered as
    /// a "coming soon" placeholder, serialized as an empty object.
    Unknown,
}

impl SectionContent {
    pub fn default_for(section_type: SectionType) -> Self {
        match section_type {
            SectionType::Hero => SectionContent::Hero(HeroContent::default()),
            SectionType::About => SectionContent::About(AboutContent::default()),
            SectionType::Contact => SectionContent::Contact(ContactContent::default()),
            SectionType::Photos => SectionContent::Photos(PhotosContent::default()),
            SectionType::Menu => SectionContent::Menu(MenuContent::default()),
            SectionType::Gallery => SectionContent::Gallery(GalleryContent::default()),
            SectionType::Reviews => SectionContent::Reviews(ReviewsContent::default()),
        }
    }

    /// The content as a JSON value, shaped exactly as it is stored.
    pub fn to_value(&self) -> Value {
        match self {
            SectionContent::Hero(c) => serde_json::to_value(c),
            SectionContent::About(c) => serde_json::to_value(c),
            SectionContent::Contact(c) => serde_json::to_value(c),
            SectionContent::Photos(c) => serde_json::to_value(c),
            SectionContent::Menu(c) => serde_json::to_value(c),
            SectionContent::Gallery(c) => serde_json::to_value(c),
            SectionContent::Reviews(c) => serde_json::to_value(c),
            SectionContent::Unknown => Ok(Value::Object(serde_json::Map::new())),
        }
        .unwrap_or_else(|_| Value::Object(serde_json::Map::new()))
    }

    /// Serialize to the JSON text persisted in `sections.content_json`.
    pub fn to_json_string(&self) -> String {
        self.to_value().to_string()
    }
}
