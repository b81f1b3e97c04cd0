mod schema;
pub mod models;
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "postgres")]
pub mod postgres_schema;

use anyhow::Result;

pub use models::{
    canonical_name, normalize_root, Media, MediaType, NewMedia, NewPost, Post, ResultRow, VideoMeta,
};

use crate::config::{DatabaseConfig, DatabaseType};
use crate::query::{CompiledQuery, Dialect};

/// Macro to dispatch a method call to the active backend variant.
macro_rules! dispatch {
    // No arguments beyond self
    ($self:expr, $method:ident()) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method(),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method(),
        }
    };
    // With arguments
    ($self:expr, $method:ident($($arg:expr),+ $(,)?)) => {
        match &$self.inner {
            DatabaseInner::Sqlite(db) => db.$method($($arg),+),
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(db) => db.$method($($arg),+),
        }
    };
}

enum DatabaseInner {
    Sqlite(sqlite::SqliteDb),
    #[cfg(feature = "postgres")]
    Postgres(postgres::PgDb),
}

/// The storage context. Opened once at startup and passed explicitly to the
/// listing and tagging engines; the connection closes when it is dropped.
pub struct Database {
    inner: DatabaseInner,
}

impl Database {
    /// Open a database connection based on the provided configuration.
    pub fn open(config: &DatabaseConfig) -> Result<Self> {
        #[cfg(feature = "postgres")]
        {
            if config.backend == DatabaseType::Postgresql {
                let url = config
                    .postgresql_url
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("PostgreSQL URL not configured"))?;
                let pg = postgres::PgDb::open(url)?;
                return Ok(Self { inner: DatabaseInner::Postgres(pg) });
            }
        }

        #[cfg(not(feature = "postgres"))]
        {
            if config.backend == DatabaseType::Postgresql {
                anyhow::bail!("PostgreSQL backend requested but rvm was built without the `postgres` feature");
            }
        }

        let db = sqlite::SqliteDb::open(&config.sqlite_path)?;
        Ok(Self { inner: DatabaseInner::Sqlite(db) })
    }

    /// A private, empty SQLite database with the schema in place.
    pub fn open_in_memory() -> Result<Self> {
        let db = Self {
            inner: DatabaseInner::Sqlite(sqlite::SqliteDb::open_in_memory()?),
        };
        db.initialize()?;
        Ok(db)
    }

    pub fn initialize(&self) -> Result<()> {
        dispatch!(self, initialize())
    }

    /// SQL dialect queries for this backend must be compiled for.
    pub fn dialect(&self) -> Dialect {
        match &self.inner {
            DatabaseInner::Sqlite(_) => Dialect::Sqlite,
            #[cfg(feature = "postgres")]
            DatabaseInner::Postgres(_) => Dialect::Postgres,
        }
    }

    // ========================================================================
    // Compiled queries
    // ========================================================================

    pub fn query_rows(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>> {
        dispatch!(self, query_rows(query))
    }

    pub fn count_rows(&self, query: &CompiledQuery) -> Result<i64> {
        dispatch!(self, count_rows(query))
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    pub fn insert_subreddit(&self, name: &str) -> Result<()> {
        dispatch!(self, insert_subreddit(name))
    }

    pub fn insert_media(&self, media: &NewMedia<'_>) -> Result<i64> {
        dispatch!(self, insert_media(media))
    }

    pub fn insert_video_meta(
        &self,
        media_id: i64,
        frame_rate: Option<&str>,
        duration: Option<&str>,
    ) -> Result<()> {
        dispatch!(self, insert_video_meta(media_id, frame_rate, duration))
    }

    pub fn get_video_meta(&self, media_id: i64) -> Result<Option<VideoMeta>> {
        dispatch!(self, get_video_meta(media_id))
    }

    pub fn insert_post(&self, post: &NewPost<'_>) -> Result<i64> {
        dispatch!(self, insert_post(post))
    }

    pub fn link_post_media(&self, post_id: i64, media_id: i64) -> Result<()> {
        dispatch!(self, link_post_media(post_id, media_id))
    }

    // ========================================================================
    // Tag store
    // ========================================================================

    pub fn subreddit_exists(&self, name: &str) -> Result<bool> {
        dispatch!(self, subreddit_exists(name))
    }

    pub fn create_tag_if_absent(&self, name: &str) -> Result<bool> {
        dispatch!(self, create_tag_if_absent(name))
    }

    pub fn add_association(&self, subreddit: &str, tag: &str) -> Result<bool> {
        dispatch!(self, add_association(subreddit, tag))
    }

    pub fn remove_association(&self, subreddit: &str, tag: &str) -> Result<bool> {
        dispatch!(self, remove_association(subreddit, tag))
    }

    pub fn association_count(&self, subreddit: &str, tag: &str) -> Result<i64> {
        dispatch!(self, association_count(subreddit, tag))
    }

    pub fn tag_names(&self) -> Result<Vec<String>> {
        dispatch!(self, tag_names())
    }

    pub fn subreddits_with_tag(&self, tag: &str) -> Result<Vec<String>> {
        dispatch!(self, subreddits_with_tag(tag))
    }

    pub fn untagged_subreddits(&self) -> Result<Vec<String>> {
        dispatch!(self, untagged_subreddits())
    }

    pub fn tags_of_subreddit(&self, subreddit: &str) -> Result<Vec<String>> {
        dispatch!(self, tags_of_subreddit(subreddit))
    }
}
