//! Neutral SQL accumulator.
//!
//! `QueryBuilder` collects selected models, joins, predicates, grouping and
//! ordering keys, and renders them into a single `CompiledQuery` for a given
//! SQL dialect. It performs no semantic validation: keeping joins unique and
//! predicates well formed is the job of the filter translator.

use std::fmt;

/// SQL flavour a query is rendered for.
///
/// The only difference that matters here is placeholder syntax: SQLite takes
/// positional `?`, PostgreSQL takes numbered `$n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    #[default]
    Sqlite,
    Postgres,
}

/// A bound parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Real(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::ToSqlOutput;

        Ok(match self {
            SqlValue::Integer(v) => ToSqlOutput::from(*v),
            SqlValue::Real(v) => ToSqlOutput::from(*v),
            SqlValue::Text(v) => ToSqlOutput::from(v.as_str()),
        })
    }
}

/// An entity that can be selected. Each model has a fixed table, alias and
/// column list, so result rows always have a shape known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    Media,
    Post,
    Subreddit,
    Tag,
}

impl Model {
    pub fn table(self) -> &'static str {
        match self {
            Model::Media => "media",
            Model::Post => "reddit_meta",
            Model::Subreddit => "subreddit",
            Model::Tag => "tag",
        }
    }

    pub fn alias(self) -> &'static str {
        match self {
            Model::Media => "m",
            Model::Post => "p",
            Model::Subreddit => "s",
            Model::Tag => "t",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Model::Media => &[
                "id",
                "file_name",
                "format",
                "width",
                "height",
                "aspect_ratio",
                "size",
                "media_type",
            ],
            Model::Post => &[
                "id",
                "author",
                "created",
                "reddit_id",
                "permalink",
                "score",
                "title",
                "url",
                "subreddit",
            ],
            Model::Subreddit | Model::Tag => &["name"],
        }
    }

    fn select_list(self) -> String {
        let alias = self.alias();
        self.columns()
            .iter()
            .map(|column| format!("{alias}.{column}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One join step. Relations form a chain rooted at `media`:
/// media → post_link → reddit_meta → subreddit → subreddit_tag → tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    PostLink,
    Post,
    Subreddit,
    SubredditTag,
    Tag,
}

impl Relation {
    /// The relation that must already be joined before this one.
    pub fn requires(self) -> Option<Relation> {
        match self {
            Relation::PostLink => None,
            Relation::Post => Some(Relation::PostLink),
            Relation::Subreddit => Some(Relation::Post),
            Relation::SubredditTag => Some(Relation::Subreddit),
            Relation::Tag => Some(Relation::SubredditTag),
        }
    }

    pub fn sql(self) -> &'static str {
        match self {
            Relation::PostLink => "JOIN post_link pl ON pl.media_id = m.id",
            Relation::Post => "JOIN reddit_meta p ON p.id = pl.reddit_meta_id",
            Relation::Subreddit => "JOIN subreddit s ON s.name = p.subreddit",
            // Untagged subreddits must survive the tag joins.
            Relation::SubredditTag => "LEFT JOIN subreddit_tag st ON st.subreddit_name = s.name",
            Relation::Tag => "LEFT JOIN tag t ON t.name = st.tag_name",
        }
    }
}

/// A boolean SQL fragment with `?` markers and the values bound to them,
/// in marker order.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    sql: String,
    params: Vec<SqlValue>,
}

impl Predicate {
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// `expr IN (?, ?, ...)` over the given values.
    pub fn in_list<I, V>(expr: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<SqlValue>,
    {
        let params: Vec<SqlValue> = values.into_iter().map(Into::into).collect();
        let markers = vec!["?"; params.len()].join(", ");
        Self::new(format!("{expr} IN ({markers})"), params)
    }

    /// Conjunction of this predicate with another.
    pub fn and(mut self, other: Predicate) -> Self {
        self.sql = format!("{} AND {}", self.sql, other.sql);
        self.params.extend(other.params);
        self
    }

    /// Wraps a subquery body (`FROM ... WHERE ...`) in `NOT EXISTS (SELECT 1 ...)`.
    pub fn not_exists(body: Predicate) -> Self {
        Self {
            sql: format!("NOT EXISTS (SELECT 1 {})", body.sql),
            params: body.params,
        }
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn params(&self) -> &[SqlValue] {
        &self.params
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderKey {
    pub expr: String,
    pub descending: bool,
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let direction = if self.descending { "DESC" } else { "ASC" };
        write!(f, "{} {}", self.expr, direction)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryBuilder {
    models: Vec<Model>,
    joins: Vec<Relation>,
    filters: Vec<Predicate>,
    distinct: Option<String>,
    group_by: Vec<String>,
    order_by: Vec<OrderKey>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, model: Model) {
        self.models.push(model);
    }

    pub fn add_join(&mut self, relation: Relation) {
        self.joins.push(relation);
    }

    pub fn add_filter(&mut self, predicate: Predicate) {
        self.filters.push(predicate);
    }

    pub fn set_distinct(&mut self, key: impl Into<String>) {
        self.distinct = Some(key.into());
    }

    pub fn group_by(&mut self, key: impl Into<String>) {
        self.group_by.push(key.into());
    }

    pub fn order_by(&mut self, key: impl Into<String>, descending: bool) {
        self.order_by.push(OrderKey {
            expr: key.into(),
            descending,
        });
    }

    pub fn models(&self) -> &[Model] {
        &self.models
    }

    pub fn joins(&self) -> &[Relation] {
        &self.joins
    }

    pub fn filters(&self) -> &[Predicate] {
        &self.filters
    }

    pub fn order_keys(&self) -> &[OrderKey] {
        &self.order_by
    }

    /// Render the accumulated state. Does not mutate the builder, so calling
    /// it repeatedly yields equal queries.
    ///
    /// The FROM table is taken from the first selected model; with no models
    /// the query reads `media`.
    pub fn build(&self, dialect: Dialect) -> CompiledQuery {
        let root = self.models.first().copied().unwrap_or(Model::Media);

        let mut sql = String::from("SELECT ");
        if let Some(key) = &self.distinct {
            match dialect {
                Dialect::Postgres => sql.push_str(&format!("DISTINCT ON ({key}) ")),
                // SQLite has no DISTINCT ON; whole-row distinct is the closest.
                Dialect::Sqlite => sql.push_str("DISTINCT "),
            }
        }

        if self.models.is_empty() {
            sql.push('*');
        } else {
            let select: Vec<String> = self.models.iter().map(|m| m.select_list()).collect();
            sql.push_str(&select.join(", "));
        }

        sql.push_str(&format!(" FROM {} {}", root.table(), root.alias()));

        for join in &self.joins {
            sql.push(' ');
            sql.push_str(join.sql());
        }

        let mut params = Vec::new();
        if !self.filters.is_empty() {
            let clauses: Vec<String> = self
                .filters
                .iter()
                .map(|predicate| format!("({})", predicate.sql))
                .collect();
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
            for predicate in &self.filters {
                params.extend(predicate.params.iter().cloned());
            }
        }

        if !self.group_by.is_empty() {
            sql.push_str(" GROUP BY ");
            sql.push_str(&self.group_by.join(", "));
        }

        if !self.order_by.is_empty() {
            let keys: Vec<String> = self.order_by.iter().map(ToString::to_string).collect();
            sql.push_str(" ORDER BY ");
            sql.push_str(&keys.join(", "));
        }

        let sql = match dialect {
            Dialect::Sqlite => sql,
            Dialect::Postgres => number_placeholders(&sql),
        };

        CompiledQuery {
            sql,
            params,
            models: self.models.clone(),
        }
    }
}

/// Rewrite positional `?` markers as `$1`, `$2`, ... leaving quoted literals
/// untouched.
fn number_placeholders(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 8);
    let mut in_literal = false;
    let mut index = 0;

    for ch in sql.chars() {
        match ch {
            '\'' => {
                in_literal = !in_literal;
                out.push(ch);
            }
            '?' if !in_literal => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }

    out
}

/// An executable query: SQL text, parameters in placeholder order, and the
/// models whose columns make up each result row.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlValue>,
    pub models: Vec<Model>,
}

impl CompiledQuery {
    /// The same query wrapped to return only its row count.
    pub fn count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM ({}) AS counted", self.sql)
    }
}
