//! Content schemas: the closed set of section types, their typed shapes,
//! and the normalization that turns arbitrary stored JSON into them.

pub mod hours;
pub mod normalize;
pub mod types;

pub use normalize::{default_serialized, normalize, normalize_tag};
pub use types::{SectionContent, SectionType};
