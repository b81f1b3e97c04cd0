pub const POSTGRES_SCHEMA: &str = r#"
-- PostgreSQL schema for rvm

CREATE TABLE IF NOT EXISTS subreddit (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS tag (
    name TEXT PRIMARY KEY
);

CREATE TABLE IF NOT EXISTS subreddit_tag (
    tag_name TEXT NOT NULL REFERENCES tag(name),
    subreddit_name TEXT NOT NULL REFERENCES subreddit(name),
    PRIMARY KEY (tag_name, subreddit_name)
);

CREATE INDEX IF NOT EXISTS idx_subreddit_tag_subreddit ON subreddit_tag(subreddit_name);

CREATE TABLE IF NOT EXISTS media (
    id BIGSERIAL PRIMARY KEY,
    file_name TEXT NOT NULL UNIQUE,
    format TEXT NOT NULL,
    height BIGINT NOT NULL,
    width BIGINT NOT NULL,
    aspect_ratio DOUBLE PRECISION NOT NULL,
    size BIGINT NOT NULL,
    media_type TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_media_format ON media(format);

CREATE TABLE IF NOT EXISTS video (
    id BIGSERIAL PRIMARY KEY,
    media_id BIGINT NOT NULL UNIQUE REFERENCES media(id),
    frame_rate TEXT,
    duration TEXT
);

CREATE TABLE IF NOT EXISTS reddit_meta (
    id BIGSERIAL PRIMARY KEY,
    author TEXT,
    created BIGINT NOT NULL,
    reddit_id TEXT UNIQUE,
    permalink TEXT,
    score BIGINT NOT NULL DEFAULT 0,
    subreddit TEXT NOT NULL REFERENCES subreddit(name),
    title TEXT NOT NULL DEFAULT '',
    url TEXT
);

CREATE INDEX IF NOT EXISTS idx_reddit_meta_subreddit ON reddit_meta(subreddit);
CREATE INDEX IF NOT EXISTS idx_reddit_meta_created ON reddit_meta(created);

CREATE TABLE IF NOT EXISTS post_link (
    media_id BIGINT NOT NULL REFERENCES media(id),
    reddit_meta_id BIGINT NOT NULL REFERENCES reddit_meta(id),
    PRIMARY KEY (media_id, reddit_meta_id)
);

CREATE INDEX IF NOT EXISTS idx_post_link_post ON post_link(reddit_meta_id);
"#;
