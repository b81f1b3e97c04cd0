//! Row types for the archive schema.

use serde::Serialize;
use std::fmt;

/// Canonical form of a subreddit or tag name.
pub fn canonical_name(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    Image,
    Video,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Image => "image",
            MediaType::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(MediaType::Image),
            "video" => Some(MediaType::Video),
            _ => None,
        }
    }
}

/// One stored file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Media {
    pub id: i64,
    pub file_name: String,
    pub format: String,
    pub width: i64,
    pub height: i64,
    pub aspect_ratio: f64,
    pub size: i64,
    pub media_type: MediaType,
}

impl Media {
    /// Path relative to the archive root:
    /// `format/ab/cd/ef/abcdef....format`, sharded on the first six
    /// characters of the file name.
    pub fn relative_path(&self) -> String {
        let mut parts = vec![self.format.clone()];
        let prefix: Vec<char> = self.file_name.chars().take(6).collect();
        for shard in prefix.chunks(2) {
            parts.push(shard.iter().collect());
        }
        parts.push(format!("{}.{}", self.file_name, self.format));
        parts.join("/")
    }

    /// Full path under `root`. `root` is expected in the form produced by
    /// `normalize_root`: empty, or ending in exactly one `/`.
    pub fn file_path(&self, root: &str) -> String {
        format!("{}{}", root, self.relative_path())
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Media {}: {} {}x{} ({})",
            self.id,
            self.format,
            self.width,
            self.height,
            self.media_type.as_str()
        )
    }
}

/// Normalize a user supplied archive root: trimmed, with any trailing
/// slashes collapsed into one. An empty root stays empty so paths come out
/// relative.
pub fn normalize_root(root: &str) -> String {
    let trimmed = root.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}/", trimmed.trim_end_matches('/'))
}

/// Extra metadata for video media.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoMeta {
    pub media_id: i64,
    pub frame_rate: Option<String>,
    pub duration: Option<String>,
}

/// Metadata of the post a file was harvested from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: i64,
    pub author: Option<String>,
    /// Epoch seconds.
    pub created: i64,
    pub reddit_id: Option<String>,
    pub permalink: Option<String>,
    pub score: i64,
    pub title: String,
    pub url: Option<String>,
    pub subreddit: String,
}

/// A result row. Which fields are populated depends on the models the query
/// selected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultRow {
    pub media: Option<Media>,
    pub post: Option<Post>,
    pub subreddit: Option<String>,
    pub tag: Option<String>,
}

/// Input for inserting a media row. The aspect ratio is derived.
#[derive(Debug, Clone)]
pub struct NewMedia<'a> {
    pub file_name: &'a str,
    pub format: &'a str,
    pub width: i64,
    pub height: i64,
    pub size: i64,
    pub media_type: MediaType,
}

impl NewMedia<'_> {
    pub fn aspect_ratio(&self) -> f64 {
        if self.height == 0 {
            0.0
        } else {
            self.width as f64 / self.height as f64
        }
    }
}

/// Input for inserting a post row. The subreddit is created if missing.
#[derive(Debug, Clone, Default)]
pub struct NewPost<'a> {
    pub author: Option<&'a str>,
    pub created: i64,
    pub reddit_id: Option<&'a str>,
    pub permalink: Option<&'a str>,
    pub score: i64,
    pub title: &'a str,
    pub url: Option<&'a str>,
    pub subreddit: &'a str,
}
