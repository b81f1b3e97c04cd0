//! PostgreSQL backend implementation.

use anyhow::{Context, Result};
use postgres::types::ToSql;
use postgres::{Client, NoTls};
use std::cell::RefCell;

use super::models::{canonical_name, Media, MediaType, NewMedia, NewPost, Post, ResultRow, VideoMeta};
use super::postgres_schema::POSTGRES_SCHEMA;
use crate::query::{CompiledQuery, Model, SqlValue};

/// A single connection held for the life of the process.
pub struct PgDb {
    client: RefCell<Client>,
}

/// Box query parameters for the postgres driver.
fn boxed_params(values: &[SqlValue]) -> Vec<Box<dyn ToSql + Sync>> {
    values
        .iter()
        .map(|value| match value {
            SqlValue::Integer(v) => Box::new(*v) as Box<dyn ToSql + Sync>,
            SqlValue::Real(v) => Box::new(*v) as Box<dyn ToSql + Sync>,
            SqlValue::Text(v) => Box::new(v.clone()) as Box<dyn ToSql + Sync>,
        })
        .collect()
}

fn decode_row(row: &postgres::Row, models: &[Model]) -> Result<ResultRow> {
    let mut result = ResultRow::default();
    let mut offset = 0;
    for model in models {
        match model {
            Model::Media => result.media = Some(media_at(row, offset)?),
            Model::Post => result.post = Some(post_at(row, offset)?),
            Model::Subreddit => result.subreddit = row.try_get(offset)?,
            Model::Tag => result.tag = row.try_get(offset)?,
        }
        offset += model.columns().len();
    }
    Ok(result)
}

fn media_at(row: &postgres::Row, offset: usize) -> Result<Media> {
    let media_type: String = row.try_get(offset + 7)?;
    Ok(Media {
        id: row.try_get(offset)?,
        file_name: row.try_get(offset + 1)?,
        format: row.try_get(offset + 2)?,
        width: row.try_get(offset + 3)?,
        height: row.try_get(offset + 4)?,
        aspect_ratio: row.try_get(offset + 5)?,
        size: row.try_get(offset + 6)?,
        media_type: MediaType::parse(&media_type).unwrap_or_default(),
    })
}

fn post_at(row: &postgres::Row, offset: usize) -> Result<Post> {
    Ok(Post {
        id: row.try_get(offset)?,
        author: row.try_get(offset + 1)?,
        created: row.try_get(offset + 2)?,
        reddit_id: row.try_get(offset + 3)?,
        permalink: row.try_get(offset + 4)?,
        score: row.try_get(offset + 5)?,
        title: row.try_get(offset + 6)?,
        url: row.try_get(offset + 7)?,
        subreddit: row.try_get(offset + 8)?,
    })
}

impl PgDb {
    pub fn open(url: &str) -> Result<Self> {
        let client = Client::connect(url, NoTls).context("Failed to connect to PostgreSQL")?;
        Ok(Self {
            client: RefCell::new(client),
        })
    }

    pub fn initialize(&self) -> Result<()> {
        self.client.borrow_mut().batch_execute(POSTGRES_SCHEMA)?;
        Ok(())
    }

    // ========================================================================
    // Compiled queries
    // ========================================================================

    pub fn query_rows(&self, query: &CompiledQuery) -> Result<Vec<ResultRow>> {
        let params = boxed_params(&query.params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        let rows = self.client.borrow_mut().query(query.sql.as_str(), &refs)?;
        rows.iter().map(|row| decode_row(row, &query.models)).collect()
    }

    pub fn count_rows(&self, query: &CompiledQuery) -> Result<i64> {
        let params = boxed_params(&query.params);
        let refs: Vec<&(dyn ToSql + Sync)> = params.iter().map(|p| p.as_ref()).collect();
        let row = self
            .client
            .borrow_mut()
            .query_one(query.count_sql().as_str(), &refs)?;
        Ok(row.get(0))
    }

    // ========================================================================
    // Ingestion
    // ========================================================================

    pub fn insert_subreddit(&self, name: &str) -> Result<()> {
        self.client.borrow_mut().execute(
            "INSERT INTO subreddit (name) VALUES ($1) ON CONFLICT DO NOTHING",
            &[&canonical_name(name)],
        )?;
        Ok(())
    }

    pub fn insert_media(&self, media: &NewMedia<'_>) -> Result<i64> {
        let row = self.client.borrow_mut().query_one(
            r#"
            INSERT INTO media (file_name, format, height, width, aspect_ratio, size, media_type)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
            &[
                &media.file_name,
                &media.format.to_lowercase(),
                &media.height,
                &media.width,
                &media.aspect_ratio(),
                &media.size,
                &media.media_type.as_str(),
            ],
        )?;
        Ok(row.get(0))
    }

    pub fn insert_video_meta(
        &self,
        media_id: i64,
        frame_rate: Option<&str>,
        duration: Option<&str>,
    ) -> Result<()> {
        self.client.borrow_mut().execute(
            "INSERT INTO video (media_id, frame_rate, duration) VALUES ($1, $2, $3)",
            &[&media_id, &frame_rate, &duration],
        )?;
        Ok(())
    }

    pub fn get_video_meta(&self, media_id: i64) -> Result<Option<VideoMeta>> {
        let row = self.client.borrow_mut().query_opt(
            "SELECT media_id, frame_rate, duration FROM video WHERE media_id = $1",
            &[&media_id],
        )?;
        Ok(row.map(|row| VideoMeta {
            media_id: row.get(0),
            frame_rate: row.get(1),
            duration: row.get(2),
        }))
    }

    pub fn insert_post(&self, post: &NewPost<'_>) -> Result<i64> {
        let subreddit = canonical_name(post.subreddit);
        self.insert_subreddit(&subreddit)?;
        let row = self.client.borrow_mut().query_one(
            r#"
            INSERT INTO reddit_meta (author, created, reddit_id, permalink, score, subreddit, title, url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
            &[
                &post.author,
                &post.created,
                &post.reddit_id,
                &post.permalink,
                &post.score,
                &subreddit,
                &post.title,
                &post.url,
            ],
        )?;
        Ok(row.get(0))
    }

    pub fn link_post_media(&self, post_id: i64, media_id: i64) -> Result<()> {
        self.client.borrow_mut().execute(
            "INSERT INTO post_link (media_id, reddit_meta_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[&media_id, &post_id],
        )?;
        Ok(())
    }

    // ========================================================================
    // Tag store
    // ========================================================================

    pub fn subreddit_exists(&self, name: &str) -> Result<bool> {
        let row = self.client.borrow_mut().query_opt(
            "SELECT 1 FROM subreddit WHERE name = $1",
            &[&name],
        )?;
        Ok(row.is_some())
    }

    pub fn create_tag_if_absent(&self, name: &str) -> Result<bool> {
        let created = self.client.borrow_mut().execute(
            "INSERT INTO tag (name) VALUES ($1) ON CONFLICT DO NOTHING",
            &[&canonical_name(name)],
        )?;
        Ok(created > 0)
    }

    pub fn add_association(&self, subreddit: &str, tag: &str) -> Result<bool> {
        let tag = canonical_name(tag);
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction()?;
        tx.execute(
            "INSERT INTO tag (name) VALUES ($1) ON CONFLICT DO NOTHING",
            &[&tag],
        )?;
        let inserted = tx.execute(
            "INSERT INTO subreddit_tag (tag_name, subreddit_name) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            &[&tag, &subreddit],
        )?;
        tx.commit()?;
        Ok(inserted > 0)
    }

    pub fn remove_association(&self, subreddit: &str, tag: &str) -> Result<bool> {
        let mut client = self.client.borrow_mut();
        let mut tx = client.transaction()?;
        let removed = tx.execute(
            "DELETE FROM subreddit_tag WHERE tag_name = $1 AND subreddit_name = $2",
            &[&canonical_name(tag), &subreddit],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    pub fn association_count(&self, subreddit: &str, tag: &str) -> Result<i64> {
        let row = self.client.borrow_mut().query_one(
            "SELECT COUNT(*) FROM subreddit_tag WHERE tag_name = $1 AND subreddit_name = $2",
            &[&tag, &subreddit],
        )?;
        Ok(row.get(0))
    }

    pub fn tag_names(&self) -> Result<Vec<String>> {
        self.names("SELECT name FROM tag ORDER BY name", &[])
    }

    pub fn subreddits_with_tag(&self, tag: &str) -> Result<Vec<String>> {
        self.names(
            "SELECT subreddit_name FROM subreddit_tag WHERE tag_name = $1 ORDER BY subreddit_name",
            &[&tag],
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
            &[],
        )
    }

    pub fn tags_of_subreddit(&self, subreddit: &str) -> Result<Vec<String>> {
        self.names(
            "SELECT tag_name FROM subreddit_tag WHERE subreddit_name = $1 ORDER BY tag_name",
            &[&subreddit],
        )
    }

    fn names(&self, sql: &str, params: &[&(dyn ToSql + Sync)]) -> Result<Vec<String>> {
        let rows = self.client.borrow_mut().query(sql, params)?;
        Ok(rows.iter().map(|row| row.get(0)).collect())
    }
}
