//! rvm - query and tag a local archive of media harvested from Reddit
//!
//! The archive is a relational store of media files, the posts they came
//! from, the subreddits those posts belong to and user tags on subreddits.
//! [`manager::Manager`] lists archive paths for a [`query::FilterSpec`];
//! [`tags::TagManager`] maintains the subreddit tags.

pub mod cli;
pub mod config;
pub mod db;
pub mod logging;
pub mod manager;
pub mod output;
pub mod query;
pub mod tags;

#[cfg(test)]
pub mod testing;
