//! sqlx-backed persistence glue.
//!
//! The core crate only sees traits and plain row structs; everything that
//! touches PostgreSQL lives here. Multi-row order updates always run inside
//! a single transaction.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use sitesmith_core::access::SiteOwnership;
use sitesmith_core::listing::NewSection;
use sitesmith_core::ordering::{
    append_order, plan_normalize, BatchWriteError, OrderWrite, SectionBatchWriter, SectionSlot,
};
use sitesmith_core::photo::ingest::{NewPhoto, PhotoOrderWrite, PhotoSlot, PhotoUpdate};

/// A section row as the routes need it.
#[derive(Debug, Clone)]
pub struct SectionRecord {
    pub id: i64,
    pub site_id: i64,
    pub section_type: String,
    pub order: i32,
    pub content_json: String,
}

fn section_from_row(row: &sqlx::postgres::PgRow) -> Result<SectionRecord, sqlx::Error> {
    Ok(SectionRecord {
        id: row.try_get("id")?,
        site_id: row.try_get("site_id")?,
        section_type: row.try_get("type")?,
        order: row.try_get("order")?,
        content_json: row.try_get("content_json")?,
    })
}

/// All sections of a site in display order.
pub async fn sections_for_site(
    pool: &PgPool,
    site_id: i64,
) -> Result<Vec<SectionRecord>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, site_id, type, "order", content_json
           FROM sections WHERE site_id = $1 ORDER BY "order", id"#,
    )
    .bind(site_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(section_from_row).collect()
}

pub async fn site_ownership(
    pool: &PgPool,
    site_id: i64,
) -> Result<Option<SiteOwnership>, sqlx::Error> {
    let row = sqlx::query("SELECT owner_id, anon_session_id FROM sites WHERE id = $1")
        .bind(site_id)
        .fetch_optional(pool)
        .await?;

    row.map(|row| {
        Ok(SiteOwnership {
            owner_id: row.try_get("owner_id")?,
            anon_session_id: row.try_get("anon_session_id")?,
        })
    })
    .transpose()
}

pub async fn section_by_id(
    pool: &PgPool,
    section_id: i64,
    site_id: i64,
) -> Result<Option<SectionRecord>, sqlx::Error> {
    let row = sqlx::query(
        r#"SELECT id, site_id, type, "order", content_json
           FROM sections WHERE id = $1 AND site_id = $2"#,
    )
    .bind(section_id)
    .bind(site_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(section_from_row).transpose()
}

pub async fn section_slots(pool: &PgPool, site_id: i64) -> Result<Vec<SectionSlot>, sqlx::Error> {
    let rows = sqlx::query(
        r#"SELECT id, "order" FROM sections WHERE site_id = $1 ORDER BY "order", id"#,
    )
    .bind(site_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(SectionSlot {
                id: row.try_get("id")?,
                order: row.try_get("order")?,
            })
        })
        .collect()
}

pub async fn update_section_content(
    pool: &PgPool,
    section_id: i64,
    content_json: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE sections SET content_json = $1 WHERE id = $2")
        .bind(content_json)
        .bind(section_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert a new section at the end of the site's page and heal any order
/// drift, all in one transaction. Returns the new section's id.
pub async fn insert_section_and_heal(
    pool: &PgPool,
    site_id: i64,
    section_type: &str,
    content_json: &str,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let rows = sqlx::query(
        r#"SELECT id, "order" FROM sections WHERE site_id = $1 ORDER BY "order", id FOR UPDATE"#,
    )
    .bind(site_id)
    .fetch_all(&mut *tx)
    .await?;
    let mut slots: Vec<SectionSlot> = rows
        .into_iter()
        .map(|row| {
            Ok::<_, sqlx::Error>(SectionSlot {
                id: row.try_get("id")?,
                order: row.try_get("order")?,
            })
        })
        .collect::<Result<_, _>>()?;

    let order = append_order(&slots);
    let inserted = sqlx::query(
        r#"INSERT INTO sections (site_id, type, "order", content_json)
           VALUES ($1, $2, $3, $4) RETURNING id"#,
    )
    .bind(site_id)
    .bind(section_type)
    .bind(order)
    .bind(content_json)
    .fetch_one(&mut *tx)
    .await?;
    let section_id: i64 = inserted.try_get("id")?;

    slots.push(SectionSlot {
        id: section_id,
        order,
    });
    for write in plan_normalize(&slots) {
        sqlx::query(r#"UPDATE sections SET "order" = $1 WHERE id = $2 AND site_id = $3"#)
            .bind(write.order)
            .bind(write.section_id)
            .bind(site_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    Ok(section_id)
}

/// The ordering engine's atomic batch capability, backed by one PostgreSQL
/// transaction per batch.
pub struct SqlxSectionBatch {
    pool: PgPool,
    site_id: i64,
}

impl SqlxSectionBatch {
    pub fn new(pool: PgPool, site_id: i64) -> Self {
        Self { pool, site_id }
    }
}

#[async_trait]
impl SectionBatchWriter for SqlxSectionBatch {
    async fn apply_all(&self, writes: &[OrderWrite]) -> Result<(), BatchWriteError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| BatchWriteError(err.to_string()))?;

        for write in writes {
            sqlx::query(r#"UPDATE sections SET "order" = $1 WHERE id = $2 AND site_id = $3"#)
                .bind(write.order)
                .bind(write.section_id)
                .bind(self.site_id)
                .execute(&mut *tx)
                .await
                .map_err(|err| BatchWriteError(err.to_string()))?;
        }

        tx.commit()
            .await
            .map_err(|err| BatchWriteError(err.to_string()))
    }
}

pub async fn live_photo_slots(pool: &PgPool, site_id: i64) -> Result<Vec<PhotoSlot>, sqlx::Error> {
    let rows = sqlx::query(
        "SELECT id, sort_order FROM photos
         WHERE site_id = $1 AND is_deleted = FALSE AND deleted_at IS NULL
         ORDER BY sort_order, id",
    )
    .bind(site_id)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(|row| {
            Ok(PhotoSlot {
                id: row.try_get("id")?,
                sort_order: row.try_get("sort_order")?,
            })
        })
        .collect()
}

pub async fn count_live_photos(pool: &PgPool, site_id: i64) -> Result<i64, sqlx::Error> {
    let row = sqlx::query(
        "SELECT COUNT(*) AS count FROM photos
         WHERE site_id = $1 AND is_deleted = FALSE AND deleted_at IS NULL",
    )
    .bind(site_id)
    .fetch_one(pool)
    .await?;
    row.try_get("count")
}

pub async fn apply_photo_order(
    pool: &PgPool,
    site_id: i64,
    writes: &[PhotoOrderWrite],
) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    for write in writes {
        sqlx::query("UPDATE photos SET sort_order = $1 WHERE id = $2 AND site_id = $3")
            .bind(write.sort_order)
            .bind(write.photo_id)
            .bind(site_id)
            .execute(&mut *tx)
            .await?;
    }
    tx.commit().await
}

pub async fn insert_photo(pool: &PgPool, photo: &NewPhoto) -> Result<i64, sqlx::Error> {
    let tags_json = serde_json::to_string(&photo.tags).unwrap_or_else(|_| "[]".to_string());
    let row = sqlx::query(
        "INSERT INTO photos
            (site_id, source, url, external_ref, category, confidence, tags_json, sort_order)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
         RETURNING id",
    )
    .bind(photo.site_id)
    .bind(photo.source.as_str())
    .bind(&photo.url)
    .bind(&photo.external_ref)
    .bind(photo.category.as_str())
    .bind(photo.confidence)
    .bind(tags_json)
    .bind(photo.sort_order)
    .fetch_one(pool)
    .await?;
    row.try_get("id")
}

/// The owning site of a photo, if the photo exists.
pub async fn photo_site_id(pool: &PgPool, photo_id: i64) -> Result<Option<i64>, sqlx::Error> {
    let row = sqlx::query("SELECT site_id FROM photos WHERE id = $1")
        .bind(photo_id)
        .fetch_optional(pool)
        .await?;
    row.map(|row| row.try_get("site_id")).transpose()
}

/// A site row to create from a listing import.
#[derive(Debug, Clone)]
pub struct NewSite {
    pub slug: String,
    pub title: String,
    pub place_id: Option<String>,
    pub owner_id: Option<i64>,
    pub anon_session_id: Option<String>,
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    let row = sqlx::query("SELECT 1 AS one FROM sites WHERE slug = $1")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// Create a draft site with its imported photos and initial sections in one
/// transaction. Photos receive the new site's id; `sections_for` builds the
/// section set once the photo ids are known.
pub async fn create_site(
    pool: &PgPool,
    site: &NewSite,
    photos: &[NewPhoto],
    sections_for: impl FnOnce(&[i64]) -> Vec<NewSection> + Send,
) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let created = sqlx::query(
        "INSERT INTO sites (slug, title, status, place_id, owner_id, anon_session_id)
         VALUES ($1, $2, 'DRAFT', $3, $4, $5)
         RETURNING id",
    )
    .bind(&site.slug)
    .bind(&site.title)
    .bind(&site.place_id)
    .bind(site.owner_id)
    .bind(&site.anon_session_id)
    .fetch_one(&mut *tx)
    .await?;
    let site_id: i64 = created.try_get("id")?;

    let mut photo_ids = Vec::with_capacity(photos.len());
    for photo in photos {
        let tags_json = serde_json::to_string(&photo.tags).unwrap_or_else(|_| "[]".to_string());
        let row = sqlx::query(
            "INSERT INTO photos
                (site_id, source, url, external_ref, category, confidence, tags_json, sort_order)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING id",
        )
        .bind(site_id)
        .bind(photo.source.as_str())
        .bind(&photo.url)
        .bind(&photo.external_ref)
        .bind(photo.category.as_str())
        .bind(photo.confidence)
        .bind(tags_json)
        .bind(photo.sort_order)
        .fetch_one(&mut *tx)
        .await?;
        photo_ids.push(row.try_get::<i64, _>("id")?);
    }

    for section in sections_for(&photo_ids) {
        sqlx::query(
            r#"INSERT INTO sections (site_id, type, "order", content_json)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(site_id)
        .bind(section.section_type.as_str())
        .bind(section.order)
        .bind(&section.content_json)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(site_id)
}

/// Apply a moderation update. `deleted_at` tracks the soft-delete flag.
pub async fn apply_photo_update(
    pool: &PgPool,
    photo_id: i64,
    update: &PhotoUpdate,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE photos SET
            category = COALESCE($2, category),
            is_hero = COALESCE($3, is_hero),
            is_deleted = COALESCE($4, is_deleted),
            deleted_at = CASE
                WHEN $4 IS NULL THEN deleted_at
                WHEN $4 THEN NOW()
                ELSE NULL
            END
         WHERE id = $1",
    )
    .bind(photo_id)
    .bind(update.category.map(|category| category.as_str()))
    .bind(update.is_hero)
    .bind(update.is_deleted)
    .execute(pool)
    .await?;
    Ok(())
}
