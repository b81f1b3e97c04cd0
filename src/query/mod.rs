//! Dynamic query composition for media listings.

pub mod builder;
pub mod filters;
pub mod spec;
pub mod translate;

pub use builder::{CompiledQuery, Dialect, Model, Predicate, QueryBuilder, Relation, SqlValue};
pub use filters::{parse_names, AspectRatio, Filter, FilterError, Formats, Resolution, ALL_FORMATS};
pub use spec::FilterSpec;
