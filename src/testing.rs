//! Test fixtures shared by the unit tests.
//!
//! Only available when compiled with `cfg(test)`.

use chrono::{DateTime, TimeZone, Utc};

use crate::db::{Database, MediaType, NewMedia, NewPost};
use crate::query::translate::SECONDS_PER_DAY;

/// Reference time the fixture's post ages are relative to.
pub const NOW: i64 = 1_700_000_000;

pub fn now() -> DateTime<Utc> {
    Utc.timestamp_opt(NOW, 0).single().unwrap_or_default()
}

struct Fixture {
    file_name: &'static str,
    format: &'static str,
    media_type: MediaType,
    width: i64,
    height: i64,
    /// (subreddit, title, score, age in days)
    posts: &'static [(&'static str, &'static str, i64, i64)],
}

const FIXTURES: &[Fixture] = &[
    Fixture {
        file_name: "abcdef123",
        format: "jpg",
        media_type: MediaType::Image,
        width: 1920,
        height: 1080,
        posts: &[("earthporn", "Sunset over the lake", 500, 1)],
    },
    Fixture {
        file_name: "bbbbbb222",
        format: "png",
        media_type: MediaType::Image,
        width: 800,
        height: 1200,
        posts: &[("pics", "Cat portrait", 50, 10)],
    },
    Fixture {
        file_name: "cccccc333",
        format: "jpg",
        media_type: MediaType::Image,
        width: 600,
        height: 3000,
        posts: &[("comics", "Long comic", 5, 2)],
    },
    Fixture {
        file_name: "dddddd444",
        format: "mp4",
        media_type: MediaType::Video,
        width: 4000,
        height: 3000,
        posts: &[("earthporn", "Mountain timelapse", 1500, 30)],
    },
    Fixture {
        file_name: "eeeeee555",
        format: "gif",
        media_type: MediaType::Image,
        width: 1000,
        height: 1000,
        posts: &[
            ("pics", "Dancing cat", 20, 3),
            ("comics", "Cat comic", 2, 40),
        ],
    },
];

/// Seed `db` with five media items (ids 1..=5 in fixture order).
///
/// Subreddits: `earthporn` tagged `photo` and `nature`, `pics` tagged
/// `photo`, `comics` untagged. Media 5 was posted to both `pics` and
/// `comics`.
pub fn seed(db: &Database) {
    for (index, fixture) in FIXTURES.iter().enumerate() {
        let media_id = db
            .insert_media(&NewMedia {
                file_name: fixture.file_name,
                format: fixture.format,
                width: fixture.width,
                height: fixture.height,
                size: fixture.width * fixture.height / 10,
                media_type: fixture.media_type,
            })
            .unwrap();
        assert_eq!(media_id, index as i64 + 1);

        if fixture.media_type == MediaType::Video {
            db.insert_video_meta(media_id, Some("30"), Some("60")).unwrap();
        }

        for (post_index, &(subreddit, title, score, age_days)) in fixture.posts.iter().enumerate() {
            let reddit_id = format!("t3_{}_{}", media_id, post_index);
            let post_id = db
                .insert_post(&NewPost {
                    author: Some("tester"),
                    created: NOW - age_days * SECONDS_PER_DAY,
                    reddit_id: Some(reddit_id.as_str()),
                    score,
                    title,
                    subreddit,
                    ..Default::default()
                })
                .unwrap();
            db.link_post_media(post_id, media_id).unwrap();
        }
    }

    db.add_association("earthporn", "photo").unwrap();
    db.add_association("earthporn", "nature").unwrap();
    db.add_association("pics", "photo").unwrap();
}

/// A fresh in-memory database holding the standard fixture.
pub fn seeded_db() -> Database {
    let db = Database::open_in_memory().unwrap();
    seed(&db);
    db
}

/// Add one jpg media item with a single post created at `created`.
/// Returns the media id.
pub fn add_media(db: &Database, file_name: &str, subreddit: &str, title: &str, created: i64) -> i64 {
    let media_id = db
        .insert_media(&NewMedia {
            file_name,
            format: "jpg",
            width: 1000,
            height: 800,
            size: 80_000,
            media_type: MediaType::Image,
        })
        .unwrap();
    let post_id = db
        .insert_post(&NewPost {
            created,
            score: 1,
            title,
            subreddit,
            ..Default::default()
        })
        .unwrap();
    db.link_post_media(post_id, media_id).unwrap();
    media_id
}
