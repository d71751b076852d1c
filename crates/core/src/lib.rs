//! Core of the sitesmith site builder: content schemas and normalization,
//! section ordering, photo classification and ingestion, access control,
//! and editor-side draft reconciliation.
//!
//! Everything here is pure or reaches the outside world only through
//! injected traits; the `sitesmith-api` crate supplies the axum surface and
//! the sqlx-backed implementations.

pub mod access;
pub mod content;
pub mod editor;
pub mod events;
pub mod listing;
pub mod ordering;
pub mod photo;
