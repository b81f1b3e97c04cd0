//! Integration tests for rvm
//!
//! These tests open a real on-disk database, ingest a small archive through
//! the public API and run the listing and tagging workflows end to end.

use chrono::{TimeZone, Utc};
use rvm::cli::{split_pair, Cli, Commands};
use rvm::config::{DatabaseConfig, DatabaseType, FormatsConfig};
use rvm::db::{Database, MediaType, NewMedia, NewPost};
use rvm::manager::Manager;
use rvm::query::{Filter, FilterSpec};
use rvm::tags::{StatusKind, TagManager};
use clap::Parser;

const NOW: i64 = 1_700_000_000;
const DAY: i64 = 86_400;

/// Helper function to create a database file inside a temporary directory
fn setup_test_db(dir: &tempfile::TempDir) -> Database {
    let config = DatabaseConfig {
        backend: DatabaseType::Sqlite,
        sqlite_path: dir.path().join("archive").join("rvm.db"),
        postgresql_url: None,
    };
    let db = Database::open(&config).unwrap();
    db.initialize().unwrap();
    db
}

/// Helper function to ingest one media item with a single post
fn add_media(db: &Database, name: &str, format: &str, size: (i64, i64), sub: &str, age_days: i64) {
    let media_id = db
        .insert_media(&NewMedia {
            file_name: name,
            format,
            width: size.0,
            height: size.1,
            size: 1024,
            media_type: if format == "mp4" { MediaType::Video } else { MediaType::Image },
        })
        .unwrap();
    let post_id = db
        .insert_post(&NewPost {
            created: NOW - age_days * DAY,
            score: 10,
            title: name,
            subreddit: sub,
            ..Default::default()
        })
        .unwrap();
    db.link_post_media(post_id, media_id).unwrap();
}

fn seed(db: &Database) {
    add_media(db, "aaaaaa01", "jpg", (1920, 1080), "wallpapers", 2);
    add_media(db, "bbbbbb02", "png", (600, 900), "aww", 1);
    add_media(db, "cccccc03", "mp4", (1280, 720), "aww", 3);
    add_media(db, "dddddd04", "jpg", (500, 2000), "comics", 20);
}

#[test]
fn test_listing_defaults_to_images_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_test_db(&dir);
    seed(&db);

    let cli = Cli::try_parse_from(["rvm", "list", "--root", "/media/"]).unwrap();
    let Commands::List(args) = cli.command else {
        panic!("expected list command");
    };
    let formats = FormatsConfig {
        images: vec!["jpg".into(), "png".into()],
        videos: vec!["mp4".into()],
    };
    let spec = args.to_filter_spec(&formats).unwrap();

    let manager = Manager::new(&db).with_root(args.root.as_deref().unwrap_or_default());
    let now = Utc.timestamp_opt(NOW, 0).unwrap();
    let files = manager.list_files_at(&spec, now).unwrap();

    assert_eq!(
        files,
        vec![
            "/media/jpg/aa/aa/aa/aaaaaa01.jpg",
            "/media/png/bb/bb/bb/bbbbbb02.png",
            "/media/jpg/dd/dd/dd/dddddd04.jpg",
        ]
    );
}

#[test]
fn test_tag_then_filter_by_tag() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_test_db(&dir);
    seed(&db);

    let tags = TagManager::new(&db);
    let (subs, names) = split_pair(&["Aww wallpapers".to_string(), "Cute".to_string()]);
    let status = tags.tag_subs(subs.as_slice(), names.as_slice()).unwrap();
    assert!(status.iter().all(|s| s.kind == StatusKind::Success));

    let now = Utc.timestamp_opt(NOW, 0).unwrap();
    let manager = Manager::new(&db);

    let cute = FilterSpec::new()
        .with(Filter::tags_include(["cute"]))
        .with(Filter::Age(7));
    let files = manager.list_files_at(&cute, now).unwrap();
    // Newest post first, not lowest id first.
    assert_eq!(
        files,
        vec![
            "png/bb/bb/bb/bbbbbb02.png",
            "jpg/aa/aa/aa/aaaaaa01.jpg",
            "mp4/cc/cc/cc/cccccc03.mp4",
        ]
    );

    let not_cute = FilterSpec::new().with(Filter::tags_exclude(["cute"]));
    assert_eq!(
        manager.list_files_at(&not_cute, now).unwrap(),
        vec!["jpg/dd/dd/dd/dddddd04.jpg"]
    );
}

#[test]
fn test_title_search_folds_non_ascii_case() {
    let dir = tempfile::tempdir().unwrap();
    let db = setup_test_db(&dir);
    add_media(&db, "ÉCOLE Photo", "jpg", (800, 600), "france", 1);

    let now = Utc.timestamp_opt(NOW, 0).unwrap();
    let manager = Manager::new(&db);
    for query in ["ÉCOLE", "école"] {
        let spec = FilterSpec::new().with(Filter::Title(query.to_string()));
        assert_eq!(manager.list_files_at(&spec, now).unwrap().len(), 1, "{query}");
    }
}

#[test]
fn test_tags_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let db = setup_test_db(&dir);
        seed(&db);
        TagManager::new(&db).tag_subs(&["comics"], &["funny"]).unwrap();
    }

    let db = setup_test_db(&dir);
    let tags = TagManager::new(&db);
    assert_eq!(tags.tagged_subs("funny").unwrap(), vec!["comics"]);
    assert_eq!(tags.untagged_subs().unwrap(), vec!["aww", "wallpapers"]);

    let again = tags.tag_subs(&["comics"], &["funny"]).unwrap();
    assert_eq!(again[0].kind, StatusKind::Warning);
}

#[test]
fn test_postgres_without_feature_or_url_fails_cleanly() {
    let config = DatabaseConfig {
        backend: DatabaseType::Postgresql,
        sqlite_path: std::path::PathBuf::from("unused.db"),
        postgresql_url: None,
    };
    assert!(Database::open(&config).is_err());
}
