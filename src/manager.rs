//! Media listing: compiles a `FilterSpec` against the open database and
//! turns matching media rows into archive paths.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::{normalize_root, Database, Media};
use crate::query::{CompiledQuery, FilterSpec};

/// What `--debug` shows about one listing.
#[derive(Debug, Clone, Serialize)]
pub struct QueryReport {
    pub filters: FilterSpec,
    pub sql: String,
    pub total: i64,
    pub sample: Vec<SampleEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SampleEntry {
    pub path: String,
    pub media: Media,
}

pub struct Manager<'a> {
    db: &'a Database,
    root_path: String,
}

impl<'a> Manager<'a> {
    /// A manager that lists paths relative to the archive root.
    pub fn new(db: &'a Database) -> Self {
        Self {
            db,
            root_path: String::new(),
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: &str) -> Self {
        self.set_root_path(root);
        self
    }

    pub fn set_root_path(&mut self, root: &str) {
        self.root_path = normalize_root(root);
    }

    pub fn root_path(&self) -> &str {
        &self.root_path
    }

    pub fn compile(&self, spec: &FilterSpec, now: DateTime<Utc>) -> CompiledQuery {
        spec.compile(now, self.db.dialect())
    }

    /// Matching media, in query order.
    pub fn list_media_at(&self, spec: &FilterSpec, now: DateTime<Utc>) -> Result<Vec<Media>> {
        let query = self.compile(spec, now);
        tracing::debug!(sql = %query.sql, params = query.params.len(), "Running media query");

        let rows = self.db.query_rows(&query)?;
        Ok(rows.into_iter().filter_map(|row| row.media).collect())
    }

    /// Paths of every file matching `spec`, ages measured from now.
    pub fn list_files(&self, spec: &FilterSpec) -> Result<Vec<String>> {
        self.list_files_at(spec, Utc::now())
    }

    pub fn list_files_at(&self, spec: &FilterSpec, now: DateTime<Utc>) -> Result<Vec<String>> {
        let media = self.list_media_at(spec, now)?;
        Ok(media
            .iter()
            .map(|m| m.file_path(&self.root_path))
            .collect())
    }

    /// Compiled SQL, total match count and the first `limit` matches.
    pub fn debug_query(&self, spec: &FilterSpec, limit: usize) -> Result<QueryReport> {
        let now = Utc::now();
        let query = self.compile(spec, now);
        let total = self.db.count_rows(&query)?;
        let sample = self
            .list_media_at(spec, now)?
            .into_iter()
            .take(limit)
            .map(|media| SampleEntry {
                path: media.file_path(&self.root_path),
                media,
            })
            .collect();

        Ok(QueryReport {
            filters: spec.clone(),
            sql: query.sql,
            total,
            sample,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{AspectRatio, Filter, Formats, Resolution};
    use crate::testing::{add_media, now, seeded_db, NOW};

    fn ids(db: &Database, spec: &FilterSpec) -> Vec<i64> {
        Manager::new(db)
            .list_media_at(spec, now())
            .unwrap()
            .iter()
            .map(|m| m.id)
            .collect()
    }

    fn ids_for(db: &Database, filter: Filter) -> Vec<i64> {
        ids(db, &FilterSpec::new().with(filter))
    }

    #[test]
    fn test_base_query_lists_each_media_once() {
        let db = seeded_db();
        assert_eq!(ids(&db, &FilterSpec::new()), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_title_is_case_insensitive_substring() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::Title("CAT".into())), vec![2, 5]);
        assert!(ids_for(&db, Filter::Title("100%".into())).is_empty());
    }

    #[test]
    fn test_aspect_ratio_filters() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::AspectRatio(AspectRatio::Landscape)), vec![1, 4]);
        assert_eq!(ids_for(&db, Filter::AspectRatio(AspectRatio::Portrait)), vec![2, 3]);
        assert_eq!(
            ids_for(&db, Filter::AspectRatio(AspectRatio::NoComicStrips)),
            vec![1, 2, 4, 5]
        );
    }

    #[test]
    fn test_resolution_filters() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::Resolution(Resolution::HighRes)), vec![1, 4]);
        assert_eq!(ids_for(&db, Filter::Resolution(Resolution::AbsurdRes)), vec![4]);
    }

    #[test]
    fn test_age_limits_window_and_orders_newest_first() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::Age(7)), vec![1, 3, 5]);
        assert!(ids_for(&db, Filter::Age(0)).is_empty());
    }

    #[test]
    fn test_age_orders_by_post_time_not_id() {
        let db = seeded_db();
        // Highest id, newest post.
        let newest = add_media(&db, "ffffff666", "comics", "Fresh", NOW - 3_600);
        assert_eq!(newest, 6);
        assert_eq!(ids_for(&db, Filter::Age(7)), vec![6, 1, 3, 5]);
    }

    #[test]
    fn test_title_matches_non_ascii_case_insensitively() {
        let db = seeded_db();
        add_media(&db, "ffffff666", "pics", "ÉCOLE Photo", NOW - 3_600);

        for query in ["ÉCOLE", "école", "École", "photo"] {
            assert_eq!(ids_for(&db, Filter::Title(query.into())), vec![6], "{query}");
        }
        assert!(ids_for(&db, Filter::Title("ecole".into())).is_empty());
    }

    #[test]
    fn test_score_is_strictly_greater() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::Score(100)), vec![1, 4]);
        assert_eq!(ids_for(&db, Filter::Score(500)), vec![4]);
    }

    #[test]
    fn test_formats() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::Formats(Formats::only(["JPG"]))), vec![1, 3]);
        assert_eq!(ids_for(&db, Filter::Formats(Formats::All)), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_tag_include() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::tags_include(["nature"])), vec![1, 4]);
        assert_eq!(ids_for(&db, Filter::tags_include(["Photo"])), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_tag_exclude_keeps_media_with_another_post() {
        let db = seeded_db();
        // Media 5 survives through its post in the untagged comics subreddit.
        assert_eq!(ids_for(&db, Filter::tags_exclude(["photo"])), vec![3, 5]);
    }

    #[test]
    fn test_subreddit_include_and_exclude() {
        let db = seeded_db();
        assert_eq!(ids_for(&db, Filter::subreddits_include(["pics"])), vec![2, 5]);
        assert_eq!(ids_for(&db, Filter::subreddits_exclude(["pics"])), vec![1, 3, 4, 5]);
    }

    #[test]
    fn test_include_and_exclude_same_set_is_empty() {
        let db = seeded_db();
        let spec = FilterSpec::new()
            .with(Filter::subreddits_include(["pics", "comics"]))
            .with(Filter::subreddits_exclude(["pics", "comics"]));
        assert!(ids(&db, &spec).is_empty());
    }

    #[test]
    fn test_empty_sets_do_not_filter() {
        let db = seeded_db();
        let empty: [&str; 0] = [];
        let spec = FilterSpec::new()
            .with(Filter::tags_include(empty))
            .with(Filter::subreddits_exclude(empty));
        assert_eq!(ids(&db, &spec), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_filter_order_does_not_change_results() {
        let db = seeded_db();
        let filters = vec![
            Filter::tags_include(["photo"]),
            Filter::AspectRatio(AspectRatio::NoComicStrips),
            Filter::subreddits_exclude(["pics"]),
            Filter::Score(10),
        ];
        let forward: FilterSpec = filters.iter().cloned().collect();
        let backward: FilterSpec = filters.iter().rev().cloned().collect();

        assert_eq!(ids(&db, &forward), vec![1, 4]);
        assert_eq!(ids(&db, &forward), ids(&db, &backward));
    }

    #[test]
    fn test_paths_are_sharded_under_root() {
        let db = seeded_db();
        let manager = Manager::new(&db).with_root("/archive//");
        let spec = FilterSpec::new().with(Filter::subreddits_include(["earthporn"]));

        let files = manager.list_files_at(&spec, now()).unwrap();
        assert_eq!(
            files,
            vec![
                "/archive/jpg/ab/cd/ef/abcdef123.jpg",
                "/archive/mp4/dd/dd/dd/dddddd444.mp4",
            ]
        );
    }

    #[test]
    fn test_paths_without_root_are_relative() {
        let db = seeded_db();
        let spec = FilterSpec::new().with(Filter::Resolution(Resolution::AbsurdRes));
        let files = Manager::new(&db).list_files_at(&spec, now()).unwrap();
        assert_eq!(files, vec!["mp4/dd/dd/dd/dddddd444.mp4"]);
    }

    #[test]
    fn test_debug_query_reports_total_and_sample() {
        let db = seeded_db();
        let manager = Manager::new(&db).with_root("/r");
        let report = manager.debug_query(&FilterSpec::new(), 2).unwrap();

        assert_eq!(report.total, 5);
        assert_eq!(report.sample.len(), 2);
        assert_eq!(report.sample[0].path, "/r/jpg/ab/cd/ef/abcdef123.jpg");
        assert!(report.sql.contains("GROUP BY m.id"));
    }
}
