//! SQLite backend implementation.

use anyhow::{Context, Result};
use rusqlite::functions::FunctionFlags;
use rusqlite::{params_from_iter, Connection};
use std::path::Path;

use super::models::{canonical_name, Media, MediaType, NewMedia, NewPost, Post, ResultRow, VideoMeta};
use super::schema::SCHEMA;
use crate::query::{CompiledQuery, Model};

pub struct SqliteDb {
    pub(crate) conn: Connection,
}

impl SqliteDb {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database at {}", path.display()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        register_unicode_lower(&conn)?;
        Ok(Self { conn })
    }

    pub fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Compiled queries
    // ========================================================================

    pub fn query_rows(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>> {
        let mut stmt = self.conn.prepare(&query.sql)?;
        let rows = stmt
            .query_map(params_from_iter(query.params.iter()), |row| {
                decode_row(row, &query.models)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn count_rows(&self, query: &CompiledQuery) -> Result<i64> {
        let count = self.conn.query_row(
            &query.count_sql(),
            params_from_iter(query.params.iter()),
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    pub fn insert_subreddit(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO subreddit (name) VALUES (?)",
            [canonical_name(name)],
        )?;
        Ok(())
    }

    pub fn insert_media(&self, media: &NewMedia<'_>) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT INTO media (file_name, format, height, width, aspect_ratio, size, media_type)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                media.file_name,
                media.format.to_lowercase(),
                media.height,
                media.width,
                media.aspect_ratio(),
                media.size,
                media.media_type.as_str(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn insert_video_meta(
        &self,
        media_id: i64,
        frame_rate: Option<&str>,
        duration: Option<&str>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO video (media_id, frame_rate, duration) VALUES (?, ?, ?)",
            rusqlite::params![media_id, frame_rate, duration],
        )?;
        Ok(())
    }

    pub fn get_video_meta(&self, media_id: i64) -> Result<Option<VideoMeta>> {
        let result = self.conn.query_row(
            "SELECT media_id, frame_rate, duration FROM video WHERE media_id = ?",
            [media_id],
            |row| {
                Ok(VideoMeta {
                    media_id: row.get(0)?,
                    frame_rate: row.get(1)?,
                    duration: row.get(2)?,
                })
            },
        );
        match result {
            Ok(meta) => Ok(Some(meta)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn insert_post(&self, post: &NewPost<'_>) -> Result<i64> {
        let subreddit = canonical_name(post.subreddit);
        self.insert_subreddit(&subreddit)?;
        self.conn.execute(
            r#"
            INSERT INTO reddit_meta (author, created, reddit_id, permalink, score, subreddit, title, url)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
            rusqlite::params![
                post.author,
                post.created,
                post.reddit_id,
                post.permalink,
                post.score,
                subreddit,
                post.title,
                post.url,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn link_post_media(&self, post_id: i64, media_id: i64) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO post_link (media_id, reddit_meta_id) VALUES (?, ?)",
            rusqlite::params![media_id, post_id],
        )?;
        Ok(())
    }

    // ========================================================================
    // Tag store
    // ========================================================================

    pub fn subreddit_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM subreddit WHERE name = ?",
            [name],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Returns true when the tag was created by this call.
    pub fn create_tag_if_absent(&self, name: &str) -> Result<bool> {
        let created = self.conn.execute(
            "INSERT OR IGNORE INTO tag (name) VALUES (?)",
            [canonical_name(name)],
        )?;
        Ok(created > 0)
    }

    /// Associate `tag` with `subreddit` in one transaction, creating the tag
    /// first if needed. Returns false when the pair was already associated.
    pub fn add_association(&self, subreddit: &str, tag: &str) -> Result<bool> {
        let tag = canonical_name(tag);
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("INSERT OR IGNORE INTO tag (name) VALUES (?)", [&tag])?;
        let inserted = tx.execute(
            "INSERT OR IGNORE INTO subreddit_tag (tag_name, subreddit_name) VALUES (?, ?)",
            rusqlite::params![tag, subreddit],
        )?;
        tx.commit()?;
        Ok(inserted > 0)
    }

    /// Returns false when there was nothing to remove.
    pub fn remove_association(&self, subreddit: &str, tag: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM subreddit_tag WHERE tag_name = ? AND subreddit_name = ?",
            rusqlite::params![canonical_name(tag), subreddit],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn association_count(&self, subreddit: &str, tag: &str) -> Result<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM subreddit_tag WHERE tag_name = ? AND subreddit_name = ?",
            rusqlite::params![tag, subreddit],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn tag_names(&self) -> Result<Vec<String>> {
        self.names("SELECT name FROM tag ORDER BY name", None)
    }

    pub fn subreddits_with_tag(&self, tag: &str) -> Result<Vec<String>> {
        self.names(
            "SELECT subreddit_name FROM subreddit_tag WHERE tag_name = ? ORDER BY subreddit_name",
            Some(tag),
        )
    }

    pub fn untagged_subreddits(&self) -> Result<Vec<String>> {
        self.names(
            r#"
            SELECT name FROM subreddit
            EXCEPT
            SELECT subreddit_name FROM subreddit_tag
            ORDER BY name
            "#,
            None,
        )
    }

    pub fn tags_of_subreddit(&self, subreddit: &str) -> Result<Vec<String>> {
        self.names(
            "SELECT tag_name FROM subreddit_tag WHERE subreddit_name = ? ORDER BY tag_name",
            Some(subreddit),
        )
    }

    fn names(&self, sql: &str, arg: Option<&str>) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(sql)?;
        let names = stmt
            .query_map(params_from_iter(arg), |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(names)
    }
}

/// Replace the built-in ASCII-only `LOWER` with full Unicode lowercasing, so
/// `LOWER(column) LIKE pattern` agrees with patterns lowercased in Rust.
fn register_unicode_lower(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "lower",
        1,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let text: Option<String> = ctx.get(0)?;
            Ok(text.map(|text| text.to_lowercase()))
        },
    )
}

/// Decode one row laid out as the concatenated columns of `models`.
fn decode_row(row: &rusqlite::Row<'_>, models: &[Model]) -> rusqlite::Result<ResultRow> {
    let mut result = ResultRow::default();
    let mut offset = 0;
    for model in models {
        match model {
            Model::Media => result.media = Some(media_at(row, offset)?),
            Model::Post => result.post = Some(post_at(row, offset)?),
            Model::Subreddit => result.subreddit = row.get(offset)?,
            Model::Tag => result.tag = row.get(offset)?,
        }
        offset += model.columns().len();
    }
    Ok(result)
}

fn media_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Media> {
    let media_type: String = row.get(offset + 7)?;
    Ok(Media {
        id: row.get(offset)?,
        file_name: row.get(offset + 1)?,
        format: row.get(offset + 2)?,
        width: row.get(offset + 3)?,
        height: row.get(offset + 4)?,
        aspect_ratio: row.get(offset + 5)?,
        size: row.get(offset + 6)?,
        media_type: MediaType::parse(&media_type).unwrap_or_default(),
    })
}

fn post_at(row: &rusqlite::Row<'_>, offset: usize) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(offset)?,
        author: row.get(offset + 1)?,
        created: row.get(offset + 2)?,
        reddit_id: row.get(offset + 3)?,
        permalink: row.get(offset + 4)?,
        score: row.get(offset + 5)?,
        title: row.get(offset + 6)?,
        url: row.get(offset + 7)?,
        subreddit: row.get(offset + 8)?,
    })
}
