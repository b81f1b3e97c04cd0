//! Subreddit tagging.
//!
//! Every write is committed per subreddit/tag pair and reported as a
//! `TagStatus` line. A missing subreddit or a no-op is a status, never an
//! error; only storage failures propagate.

use anyhow::Result;
use std::fmt;

use crate::db::{canonical_name, Database};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
    Error,
}

impl StatusKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusKind::Success => "Success",
            StatusKind::Warning => "Warning",
            StatusKind::Error => "Error",
        }
    }
}

/// Outcome of one tag or untag request, printed as `Kind: message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagStatus {
    pub kind: StatusKind,
    pub message: String,
}

impl TagStatus {
    fn new(kind: StatusKind, message: String) -> Self {
        Self { kind, message }
    }

    fn missing_subreddit(name: &str) -> Self {
        Self::new(
            StatusKind::Error,
            format!("Subreddit \"{}\" does not exist", name),
        )
    }

    fn empty_tag(subreddit: &str) -> Self {
        Self::new(
            StatusKind::Error,
            format!("Empty tag name for {}", subreddit),
        )
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

impl fmt::Display for TagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind.as_str(), self.message)
    }
}

pub struct TagManager<'a> {
    db: &'a Database,
}

impl<'a> TagManager<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Tag every existing subreddit in `subreddits` with every tag in `tags`.
    ///
    /// A subreddit that does not exist yields one Error line and is skipped.
    pub fn tag_subs<S, T>(&self, subreddits: &[S], tags: &[T]) -> Result<Vec<TagStatus>>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut result = Vec::new();
        for sub in subreddits {
            let sub = canonical_name(sub.as_ref());
            if !self.db.subreddit_exists(&sub)? {
                tracing::warn!(subreddit = %sub, "Cannot tag missing subreddit");
                result.push(TagStatus::missing_subreddit(&sub));
                continue;
            }
            for tag in tags {
                result.push(self.tag_sub(&sub, tag.as_ref())?);
            }
        }
        Ok(result)
    }

    /// Tag one subreddit that is known to exist. Creates the tag if needed.
    pub fn tag_sub(&self, subreddit: &str, tag: &str) -> Result<TagStatus> {
        let sub = canonical_name(subreddit);
        let tag = canonical_name(tag);
        if tag.is_empty() {
            return Ok(TagStatus::empty_tag(&sub));
        }

        if self.db.add_association(&sub, &tag)? {
            tracing::info!(subreddit = %sub, tag = %tag, "Tagged subreddit");
            Ok(TagStatus::new(
                StatusKind::Success,
                format!("{} tagged with {}", sub, tag),
            ))
        } else {
            Ok(TagStatus::new(
                StatusKind::Warning,
                format!("{} was already tagged with {}", sub, tag),
            ))
        }
    }

    /// Remove every tag in `tags` from every existing subreddit in
    /// `subreddits`. Tags themselves are kept.
    pub fn untag_subs<S, T>(&self, subreddits: &[S], tags: &[T]) -> Result<Vec<TagStatus>>
    where
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut result = Vec::new();
        for sub in subreddits {
            let sub = canonical_name(sub.as_ref());
            if !self.db.subreddit_exists(&sub)? {
                tracing::warn!(subreddit = %sub, "Cannot untag missing subreddit");
                result.push(TagStatus::missing_subreddit(&sub));
                continue;
            }
            for tag in tags {
                result.push(self.untag_sub(&sub, tag.as_ref())?);
            }
        }
        Ok(result)
    }

    pub fn untag_sub(&self, subreddit: &str, tag: &str) -> Result<TagStatus> {
        let sub = canonical_name(subreddit);
        let tag = canonical_name(tag);
        if tag.is_empty() {
            return Ok(TagStatus::empty_tag(&sub));
        }

        if self.db.remove_association(&sub, &tag)? {
            tracing::info!(subreddit = %sub, tag = %tag, "Untagged subreddit");
            Ok(TagStatus::new(
                StatusKind::Success,
                format!("{} was removed from {}", tag, sub),
            ))
        } else {
            Ok(TagStatus::new(
                StatusKind::Warning,
                format!("Tag {} was not found in {}", tag, sub),
            ))
        }
    }

    pub fn list_tags(&self) -> Result<Vec<String>> {
        self.db.tag_names()
    }

    pub fn tagged_subs(&self, tag: &str) -> Result<Vec<String>> {
        self.db.subreddits_with_tag(&canonical_name(tag))
    }

    pub fn untagged_subs(&self) -> Result<Vec<String>> {
        self.db.untagged_subreddits()
    }

    pub fn list_sub_tags(&self, subreddit: &str) -> Result<Vec<String>> {
        self.db.tags_of_subreddit(&canonical_name(subreddit))
    }
}
