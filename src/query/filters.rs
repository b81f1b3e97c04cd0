//! Filter vocabulary: the closed set of filter kinds a listing can be
//! narrowed by, and the comparator tags some of them carry.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Sentinel accepted by `--formats` meaning "do not filter on format".
pub const ALL_FORMATS: &str = "all";

/// Errors produced while turning user input into filters
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("Unknown aspect ratio '{0}' (expected landscape, portrait or no-strips)")]
    UnknownAspectRatio(String),

    #[error("Unknown resolution '{0}' (expected high-res or absurd-res)")]
    UnknownResolution(String),

    #[error("No formats given")]
    EmptyFormats,
}

/// Numeric comparison applied against a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Greater,
    Less,
}

impl Comparison {
    pub fn operator(self) -> &'static str {
        match self {
            Comparison::Greater => ">",
            Comparison::Less => "<",
        }
    }

    #[cfg(test)]
    fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparison::Greater => value > threshold,
            Comparison::Less => value < threshold,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AspectRatio {
    Landscape,
    Portrait,
    /// Drops extremely tall, narrow media such as comic strips.
    NoComicStrips,
}

const ASPECT_RATIO_BOUNDS: [(AspectRatio, Comparison, f64); 3] = [
    (AspectRatio::Landscape, Comparison::Greater, 1.2),
    (AspectRatio::Portrait, Comparison::Less, 0.8),
    (AspectRatio::NoComicStrips, Comparison::Greater, 0.4),
];

impl AspectRatio {
    pub const ALL: [AspectRatio; 3] = [
        AspectRatio::Landscape,
        AspectRatio::Portrait,
        AspectRatio::NoComicStrips,
    ];

    /// Comparison and threshold applied to `width / height`.
    pub fn bound(self) -> (Comparison, f64) {
        ASPECT_RATIO_BOUNDS
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, comparison, threshold)| (*comparison, *threshold))
            .unwrap_or((Comparison::Greater, 0.0))
    }

    #[cfg(test)]
    fn matches(self, ratio: f64) -> bool {
        let (comparison, threshold) = self.bound();
        comparison.holds(ratio, threshold)
    }

    pub fn name(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "landscape",
            AspectRatio::Portrait => "portrait",
            AspectRatio::NoComicStrips => "no-strips",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AspectRatio {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "landscape" => Ok(AspectRatio::Landscape),
            "portrait" => Ok(AspectRatio::Portrait),
            "no-strips" | "no_strips" | "no-comic-strips" => Ok(AspectRatio::NoComicStrips),
            _ => Err(FilterError::UnknownAspectRatio(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// More pixels than 1600x1200.
    HighRes,
    /// More pixels than 3200x2400.
    AbsurdRes,
}

const RESOLUTION_FLOORS: [(Resolution, i64, i64); 2] = [
    (Resolution::HighRes, 1600, 1200),
    (Resolution::AbsurdRes, 3200, 2400),
];

impl Resolution {
    pub const ALL: [Resolution; 2] = [Resolution::HighRes, Resolution::AbsurdRes];

    /// Pixel count that `width * height` must strictly exceed.
    pub fn min_pixels(self) -> i64 {
        RESOLUTION_FLOORS
            .iter()
            .find(|(kind, _, _)| *kind == self)
            .map(|(_, width, height)| width * height)
            .unwrap_or(0)
    }

    #[cfg(test)]
    fn matches(self, width: i64, height: i64) -> bool {
        width.saturating_mul(height) > self.min_pixels()
    }

    pub fn name(self) -> &'static str {
        match self {
            Resolution::HighRes => "high-res",
            Resolution::AbsurdRes => "absurd-res",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Resolution {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "high-res" | "high_res" | "high" => Ok(Resolution::HighRes),
            "absurd-res" | "absurd_res" | "absurd" => Ok(Resolution::AbsurdRes),
            _ => Err(FilterError::UnknownResolution(s.to_string())),
        }
    }
}

/// Which file formats a listing accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Formats {
    All,
    Only(BTreeSet<String>),
}

impl Formats {
    pub fn only<I, S>(formats: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Formats::Only(names(formats))
    }

    /// Parse a space separated format list. A leading `all` selects every
    /// format regardless of what follows.
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let set = parse_names(input);
        if set.is_empty() {
            return Err(FilterError::EmptyFormats);
        }
        let first = input.split_whitespace().next().map(str::to_lowercase);
        if first.as_deref() == Some(ALL_FORMATS) {
            return Ok(Formats::All);
        }
        Ok(Formats::Only(set))
    }
}

/// One filter request. Every variant maps to exactly one change of the
/// compiled query: a predicate, a NOT EXISTS exclusion, or nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "condition", rename_all = "snake_case")]
pub enum Filter {
    /// Case-insensitive substring of the post title.
    Title(String),
    AspectRatio(AspectRatio),
    Resolution(Resolution),
    /// Posts created within the last N days, newest first.
    Age(u32),
    /// Posts scored strictly above N.
    Score(i64),
    Formats(Formats),
    TagsInclude(BTreeSet<String>),
    TagsExclude(BTreeSet<String>),
    SubredditsInclude(BTreeSet<String>),
    SubredditsExclude(BTreeSet<String>),
}

impl Filter {
    pub fn tags_include<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::TagsInclude(names(tags))
    }

    pub fn tags_exclude<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::TagsExclude(names(tags))
    }

    pub fn subreddits_include<I, S>(subreddits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::SubredditsInclude(names(subreddits))
    }

    pub fn subreddits_exclude<I, S>(subreddits: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::SubredditsExclude(names(subreddits))
    }
}

/// Canonicalize a collection of names: trimmed, lowercased, empties dropped.
pub fn names<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| item.as_ref().trim().to_lowercase())
        .filter(|item| !item.is_empty())
        .collect()
}

/// Canonical names from a space separated argument such as `"foo bar"`.
pub fn parse_names(input: &str) -> BTreeSet<String> {
    names(input.split_whitespace())
}
