//! Filter translation: turns `Filter` values into `QueryBuilder` changes.
//!
//! The base query selects media, joins the whole post → subreddit → tag chain
//! up front and groups by media id, so the fan-out from multiple posts or tags
//! collapses back to one row per file. Include filters therefore only add
//! predicates. Exclude filters add a correlated NOT EXISTS against an aliased
//! subreddit, which keeps subreddits with zero or several tags correct.

use std::collections::BTreeSet;

use super::builder::{Model, Predicate, QueryBuilder, Relation, SqlValue};
use super::filters::{Filter, Formats};

pub const SECONDS_PER_DAY: i64 = 86_400;

/// The per-request starting point every listing is built on.
pub fn base_query() -> QueryBuilder {
    let mut builder = QueryBuilder::new();
    builder.add_model(Model::Media);
    ensure_join(&mut builder, Relation::Tag);
    builder.group_by("m.id");
    builder
}

/// Add `relation` and everything it depends on, skipping any step already
/// present so that no join is ever rendered twice.
pub fn ensure_join(builder: &mut QueryBuilder, relation: Relation) {
    if builder.joins().contains(&relation) {
        return;
    }
    if let Some(parent) = relation.requires() {
        ensure_join(builder, parent);
    }
    builder.add_join(relation);
}

/// Apply one filter. `now` is the reference time (epoch seconds) for age
/// filters.
pub fn apply(builder: &mut QueryBuilder, filter: &Filter, now: i64) {
    match filter {
        Filter::Title(text) => {
            let pattern = format!("%{}%", escape_like(&text.to_lowercase()));
            builder.add_filter(Predicate::new(
                r"LOWER(p.title) LIKE ? ESCAPE '\'",
                vec![SqlValue::Text(pattern)],
            ));
        }
        Filter::AspectRatio(kind) => {
            let (comparison, threshold) = kind.bound();
            builder.add_filter(Predicate::new(
                format!("m.aspect_ratio {} ?", comparison.operator()),
                vec![SqlValue::Real(threshold)],
            ));
        }
        Filter::Resolution(kind) => {
            builder.add_filter(Predicate::new(
                "m.width * m.height > ?",
                vec![SqlValue::Integer(kind.min_pixels())],
            ));
        }
        Filter::Age(days) => {
            let cutoff = now.saturating_sub(i64::from(*days) * SECONDS_PER_DAY);
            builder.add_filter(Predicate::new(
                "p.created >= ?",
                vec![SqlValue::Integer(cutoff)],
            ));
            // Aggregate so the key stays valid under GROUP BY m.id.
            builder.order_by("MAX(p.created)", true);
        }
        Filter::Score(score) => {
            builder.add_filter(Predicate::new(
                "p.score > ?",
                vec![SqlValue::Integer(*score)],
            ));
        }
        Filter::Formats(Formats::All) => {}
        Filter::Formats(Formats::Only(formats)) => {
            if !formats.is_empty() {
                builder.add_filter(Predicate::in_list("LOWER(m.format)", formats.iter().cloned()));
            }
        }
        Filter::TagsInclude(tags) => {
            if !tags.is_empty() {
                ensure_join(builder, Relation::Tag);
                builder.add_filter(Predicate::in_list("LOWER(t.name)", tags.iter().cloned()));
            }
        }
        Filter::TagsExclude(tags) => {
            if !tags.is_empty() {
                ensure_join(builder, Relation::Subreddit);
                builder.add_filter(exclude_tags(tags));
            }
        }
        Filter::SubredditsInclude(subreddits) => {
            if !subreddits.is_empty() {
                ensure_join(builder, Relation::Subreddit);
                builder.add_filter(Predicate::in_list("LOWER(s.name)", subreddits.iter().cloned()));
            }
        }
        Filter::SubredditsExclude(subreddits) => {
            if !subreddits.is_empty() {
                ensure_join(builder, Relation::Subreddit);
                builder.add_filter(exclude_subreddits(subreddits));
            }
        }
    }
}

fn exclude_tags(tags: &BTreeSet<String>) -> Predicate {
    let body = Predicate::new(
        "FROM subreddit xs JOIN subreddit_tag xst ON xst.subreddit_name = xs.name WHERE xs.name = s.name",
        Vec::new(),
    )
    .and(Predicate::in_list("LOWER(xst.tag_name)", tags.iter().cloned()));
    Predicate::not_exists(body)
}

fn exclude_subreddits(subreddits: &BTreeSet<String>) -> Predicate {
    let body = Predicate::new("FROM subreddit xs WHERE xs.name = s.name", Vec::new())
        .and(Predicate::in_list("LOWER(xs.name)", subreddits.iter().cloned()));
    Predicate::not_exists(body)
}

/// Escape LIKE wildcards so user text matches literally.
fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
