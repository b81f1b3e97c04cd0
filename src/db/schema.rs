pub const SCHEMA: &str = r#"
-- Subreddits: source categories, keyed by lowercase name
CREATE TABLE IF NOT EXISTS subreddit (
    name TEXT PRIMARY KEY
);

-- Tags: user labels, keyed by lowercase name
CREATE TABLE IF NOT EXISTS tag (
    name TEXT PRIMARY KEY
);

-- Subreddit to tag associations
CREATE TABLE IF NOT EXISTS subreddit_tag (
    tag_name TEXT NOT NULL,
    subreddit_name TEXT NOT NULL,
    PRIMARY KEY (tag_name, subreddit_name),
    FOREIGN KEY (tag_name) REFERENCES tag(name),
    FOREIGN KEY (subreddit_name) REFERENCES subreddit(name)
);

CREATE INDEX IF NOT EXISTS idx_subreddit_tag_subreddit ON subreddit_tag(subreddit_name);

-- Media: one stored file
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    file_name TEXT NOT NULL UNIQUE,
    format TEXT NOT NULL,
    height INTEGER NOT NULL,
    width INTEGER NOT NULL,
    aspect_ratio REAL NOT NULL,  -- width / height
    size INTEGER NOT NULL,       -- bytes
    media_type TEXT NOT NULL     -- 'image' or 'video'
);

CREATE INDEX IF NOT EXISTS idx_media_format ON media(format);

-- Video metadata, at most one row per media
CREATE TABLE IF NOT EXISTS video (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    media_id INTEGER NOT NULL UNIQUE,
    frame_rate TEXT,
    duration TEXT,
    FOREIGN KEY (media_id) REFERENCES media(id)
);

-- Posts the media was harvested from
CREATE TABLE IF NOT EXISTS reddit_meta (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    author TEXT,
    created INTEGER NOT NULL,    -- epoch seconds
    reddit_id TEXT UNIQUE,
    permalink TEXT,
    score INTEGER NOT NULL DEFAULT 0,
    subreddit TEXT NOT NULL,
    title TEXT NOT NULL DEFAULT '',
    url TEXT,
    FOREIGN KEY (subreddit) REFERENCES subreddit(name)
);

CREATE INDEX IF NOT EXISTS idx_reddit_meta_subreddit ON reddit_meta(subreddit);
CREATE INDEX IF NOT EXISTS idx_reddit_meta_created ON reddit_meta(created);

-- Post to media links
CREATE TABLE IF NOT EXISTS post_link (
    media_id INTEGER NOT NULL,
    reddit_meta_id INTEGER NOT NULL,
    PRIMARY KEY (media_id, reddit_meta_id),
    FOREIGN KEY (media_id) REFERENCES media(id),
    FOREIGN KEY (reddit_meta_id) REFERENCES reddit_meta(id)
);

CREATE INDEX IF NOT EXISTS idx_post_link_post ON post_link(reddit_meta_id);
"#;
