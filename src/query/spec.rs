use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::builder::{CompiledQuery, Dialect, QueryBuilder};
use super::filters::Filter;
use super::translate;

/// The full set of filters for one listing.
///
/// A plain value: filters are collected in any order and compiled in one
/// step, so two specs can be compared or serialized without touching the
/// database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    filters: Vec<Filter>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn push(&mut self, filter: Filter) {
        self.filters.push(filter);
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Builder state for this spec, before rendering.
    pub fn to_builder(&self, now: DateTime<Utc>) -> QueryBuilder {
        let now = now.timestamp();
        let mut builder = translate::base_query();
        for filter in &self.filters {
            translate::apply(&mut builder, filter, now);
        }
        // Deterministic order whatever filters asked for.
        builder.order_by("m.id", false);
        builder
    }

    pub fn compile(&self, now: DateTime<Utc>, dialect: Dialect) -> CompiledQuery {
        self.to_builder(now).build(dialect)
    }
}

impl FromIterator<Filter> for FilterSpec {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self {
            filters: iter.into_iter().collect(),
        }
    }
}

impl Extend<Filter> for FilterSpec {
    fn extend<I: IntoIterator<Item = Filter>>(&mut self, iter: I) {
        self.filters.extend(iter);
    }
}
