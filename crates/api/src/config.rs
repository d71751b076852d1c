use std::env;

use sitesmith_core::photo::storage::{select_upload_mode, UploadMode};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Server host to bind to.
    pub host: String,
    /// Server port to bind to.
    pub port: u16,
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum database connections in the pool.
    pub db_max_connections: u32,
    /// Minimum database connections in the pool.
    pub db_min_connections: u32,
    /// Event bus channel capacity.
    pub event_bus_capacity: usize,
    /// Log level (e.g., "info", "debug", "trace").
    pub log_level: String,
    /// Photos classified concurrently per batch during imports.
    pub classifier_chunk_size: usize,
    /// Upload storage mode, decided once at startup.
    pub upload_mode: UploadMode,
    /// Local mode: filesystem root for uploads.
    pub uploads_root: String,
    /// Local mode: public path prefix uploads are served from.
    pub uploads_public_prefix: String,
    /// Remote mode: blob gateway settings.
    pub blob: Option<BlobGatewayConfig>,
}

#[derive(Debug, Clone)]
pub struct BlobGatewayConfig {
    pub endpoint: String,
    pub bucket: String,
    pub secret: String,
    pub public_base: String,
    pub upload_ttl_secs: i64,
}

impl AppConfig {
    /// Load configuration from environment variables with sensible defaults.
    pub fn from_env() -> Result<Self, env::VarError> {
        let blob = match (
            env::var("BLOB_ENDPOINT"),
            env::var("BLOB_BUCKET"),
            env::var("BLOB_SECRET"),
            env::var("BLOB_PUBLIC_BASE"),
        ) {
            (Ok(endpoint), Ok(bucket), Ok(secret), Ok(public_base)) => Some(BlobGatewayConfig {
                endpoint,
                bucket,
                secret,
                public_base,
                upload_ttl_secs: env::var("BLOB_UPLOAD_TTL_SECS")
                    .unwrap_or_else(|_| "300".to_string())
                    .parse()
                    .expect("BLOB_UPLOAD_TTL_SECS must be a valid i64"),
            }),
            _ => None,
        };

        let explicit_mode = env::var("PHOTO_UPLOAD_MODE").ok();
        let upload_mode = select_upload_mode(explicit_mode.as_deref(), blob.is_some());

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3030".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            database_url: env::var("DATABASE_URL")?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".to_string())
                .parse()
                .expect("DB_MAX_CONNECTIONS must be a valid u32"),
            db_min_connections: env::var("DB_MIN_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("DB_MIN_CONNECTIONS must be a valid u32"),
            event_bus_capacity: env::var("EVENT_BUS_CAPACITY")
                .unwrap_or_else(|_| "1024".to_string())
                .parse()
                .expect("EVENT_BUS_CAPACITY must be a valid usize"),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            classifier_chunk_size: env::var("CLASSIFIER_CHUNK_SIZE")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .expect("CLASSIFIER_CHUNK_SIZE must be a valid usize"),
            upload_mode,
            uploads_root: env::var("UPLOADS_ROOT").unwrap_or_else(|_| "public/uploads".to_string()),
            uploads_public_prefix: env::var("UPLOADS_PUBLIC_PREFIX")
                .unwrap_or_else(|_| "/uploads".to_string()),
            blob,
        })
    }

    /// Build the socket address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
