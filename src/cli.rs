//! Command-line interface definitions and parsing
//!
//! - **list**: print the archive paths of media matching a set of filters
//! - **tags**: manage and inspect the tags applied to subreddits
//!
//! Space separated list arguments (`--tags "art photo"`) are trimmed and
//! lowercased before they reach the query layer.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::config::FormatsConfig;
use crate::query::{
    parse_names, AspectRatio, Filter, FilterError, FilterSpec, Formats, Resolution,
};

/// Main CLI structure for parsing command-line arguments
#[derive(Parser, Debug)]
#[command(name = "rvm")]
#[command(about = "Query and tag a local archive of harvested media", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to config file (overrides $RVM_CONFIG)
    #[arg(short = 'c', long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List media files matching the given filters
    #[command(visible_alias = "ls")]
    List(ListArgs),

    /// Manage subreddit tags
    Tags(TagsArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Root path to media directories (overrides config)
    #[arg(long = "root", value_name = "PATH")]
    pub root: Option<String>,

    /// Include media from posts containing word or phrase in the title
    #[arg(long = "title", value_name = "TEXT")]
    pub title: Option<String>,

    /// Only include wide media
    #[arg(long = "landscape")]
    pub landscape: bool,

    /// Only include tall media
    #[arg(long = "portrait")]
    pub portrait: bool,

    /// Only include media with high (1600x1200+) resolution
    #[arg(long = "high-res")]
    pub high_res: bool,

    /// Only include media with very high (3200x2400+) resolution
    #[arg(long = "absurd-res")]
    pub absurd_res: bool,

    /// Exclude very tall and slim media, typically comic strips
    #[arg(long = "no-strips")]
    pub no_strips: bool,

    /// Include media from posts no older than N days
    #[arg(long = "age", value_name = "N")]
    pub age: Option<u32>,

    /// Include media from posts with a score greater than N
    #[arg(long = "score", value_name = "N", allow_negative_numbers = true)]
    pub score: Option<i64>,

    /// Include media from subreddits with any of these tags ("art photo")
    #[arg(long = "tags", value_name = "TAGS")]
    pub tags: Option<String>,

    /// Exclude media from subreddits with any of these tags
    #[arg(long = "exclude-tags", value_name = "TAGS")]
    pub exclude_tags: Option<String>,

    /// Include media from these subreddits
    #[arg(long = "subreddits", value_name = "SUBS")]
    pub subreddits: Option<String>,

    /// Exclude media from these subreddits
    #[arg(long = "exclude-subreddits", value_name = "SUBS")]
    pub exclude_subreddits: Option<String>,

    /// Include videos as well as images
    #[arg(long = "videos")]
    pub videos: bool,

    /// Include files of the listed formats; "all" includes every file type
    #[arg(long = "formats", value_name = "FORMATS", conflicts_with = "videos")]
    pub formats: Option<String>,

    /// Show the filters, result count, a sample and the raw SQL instead of paths
    #[arg(long = "debug")]
    pub debug: bool,
}

impl ListArgs {
    /// Collect the requested filters. Without `--formats` the listing is
    /// limited to image formats, or images and videos with `--videos`.
    pub fn to_filter_spec(&self, formats: &FormatsConfig) -> Result<FilterSpec, FilterError> {
        let mut spec = FilterSpec::new();

        if let Some(title) = &self.title {
            spec.push(Filter::Title(title.clone()));
        }
        if self.landscape {
            spec.push(Filter::AspectRatio(AspectRatio::Landscape));
        }
        if self.portrait {
            spec.push(Filter::AspectRatio(AspectRatio::Portrait));
        }
        if self.no_strips {
            spec.push(Filter::AspectRatio(AspectRatio::NoComicStrips));
        }
        if self.high_res {
            spec.push(Filter::Resolution(Resolution::HighRes));
        }
        if self.absurd_res {
            spec.push(Filter::Resolution(Resolution::AbsurdRes));
        }
        if let Some(age) = self.age {
            spec.push(Filter::Age(age));
        }
        if let Some(score) = self.score {
            spec.push(Filter::Score(score));
        }
        if let Some(tags) = &self.tags {
            spec.push(Filter::TagsInclude(parse_names(tags)));
        }
        if let Some(tags) = &self.exclude_tags {
            spec.push(Filter::TagsExclude(parse_names(tags)));
        }
        if let Some(subs) = &self.subreddits {
            spec.push(Filter::SubredditsInclude(parse_names(subs)));
        }
        if let Some(subs) = &self.exclude_subreddits {
            spec.push(Filter::SubredditsExclude(parse_names(subs)));
        }

        let formats = match &self.formats {
            Some(list) => Formats::parse(list)?,
            None if self.videos => Formats::only(formats.images.iter().chain(&formats.videos)),
            None => Formats::only(&formats.images),
        };
        spec.push(Filter::Formats(formats));

        Ok(spec)
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TagsArgs {
    /// List all existing tags
    #[arg(long = "list")]
    pub list: bool,

    /// Add tags to subreddits: --tag-subs "pics aww" "cute animals"
    #[arg(long = "tag-subs", num_args = 2, value_names = ["SUBS", "TAGS"])]
    pub tag_subs: Option<Vec<String>>,

    /// Remove tags from subreddits
    #[arg(long = "untag-subs", num_args = 2, value_names = ["SUBS", "TAGS"])]
    pub untag_subs: Option<Vec<String>>,

    /// Show subreddits tagged by TAG
    #[arg(long = "tagged-subs", value_name = "TAG")]
    pub tagged_subs: Option<String>,

    /// Show subreddits without any tag
    #[arg(long = "untagged-subs")]
    pub untagged_subs: bool,

    /// Show the tags of a subreddit
    #[arg(long = "sub-tags", value_name = "SUB")]
    pub sub_tags: Option<String>,
}

/// Split a `SUBS TAGS` pair into its two canonical name lists.
pub fn split_pair(pair: &[String]) -> (Vec<String>, Vec<String>) {
    let mut parts = pair.iter().map(|arg| parse_names(arg));
    let subs: BTreeSet<String> = parts.next().unwrap_or_default();
    let tags: BTreeSet<String> = parts.next().unwrap_or_default();
    (subs.into_iter().collect(), tags.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    fn list_args(args: &[&str]) -> ListArgs {
        let mut full = vec!["rvm", "list"];
        full.extend_from_slice(args);
        match parse(&full).command {
            Commands::List(list) => list,
            Commands::Tags(_) => panic!("expected list"),
        }
    }

    fn formats() -> FormatsConfig {
        FormatsConfig {
            images: vec!["jpg".into(), "png".into()],
            videos: vec!["mp4".into()],
        }
    }

    fn format_filter(spec: &FilterSpec) -> &Formats {
        spec.filters()
            .iter()
            .find_map(|f| match f {
                Filter::Formats(formats) => Some(formats),
                _ => None,
            })
            .unwrap()
    }

    #[test]
    fn test_default_formats_are_images() {
        let spec = list_args(&[]).to_filter_spec(&formats()).unwrap();
        assert_eq!(spec.filters().len(), 1);
        assert_eq!(format_filter(&spec), &Formats::only(["jpg", "png"]));
    }

    #[test]
    fn test_videos_adds_video_formats() {
        let spec = list_args(&["--videos"]).to_filter_spec(&formats()).unwrap();
        assert_eq!(format_filter(&spec), &Formats::only(["jpg", "png", "mp4"]));
    }

    #[test]
    fn test_formats_all_disables_format_filter() {
        let spec = list_args(&["--formats", "all"]).to_filter_spec(&formats()).unwrap();
        assert_eq!(format_filter(&spec), &Formats::All);

        let spec = list_args(&["--formats", " GIF webm "]).to_filter_spec(&formats()).unwrap();
        assert_eq!(format_filter(&spec), &Formats::only(["gif", "webm"]));
    }

    #[test]
    fn test_empty_formats_is_rejected() {
        let err = list_args(&["--formats", "  "]).to_filter_spec(&formats()).unwrap_err();
        assert_eq!(err, FilterError::EmptyFormats);
    }

    #[test]
    fn test_list_flags_become_filters() {
        let args = list_args(&[
            "--title", "Cat", "--landscape", "--absurd-res", "--age", "7", "--score", "-5",
            "--tags", "Art  Photo", "--exclude-subreddits", "pics",
        ]);
        let spec = args.to_filter_spec(&formats()).unwrap();
        let filters = spec.filters();

        assert!(filters.contains(&Filter::Title("Cat".into())));
        assert!(filters.contains(&Filter::AspectRatio(AspectRatio::Landscape)));
        assert!(filters.contains(&Filter::Resolution(Resolution::AbsurdRes)));
        assert!(filters.contains(&Filter::Age(7)));
        assert!(filters.contains(&Filter::Score(-5)));
        assert!(filters.contains(&Filter::tags_include(["art", "photo"])));
        assert!(filters.contains(&Filter::subreddits_exclude(["pics"])));
    }

    #[test]
    fn test_formats_conflicts_with_videos() {
        assert!(Cli::try_parse_from(["rvm", "list", "--videos", "--formats", "jpg"]).is_err());
    }

    #[test]
    fn test_tag_subs_takes_two_values() {
        let cli = parse(&["rvm", "tags", "--tag-subs", "Pics aww", "cute Animals"]);
        let Commands::Tags(tags) = cli.command else {
            panic!("expected tags");
        };
        let (subs, names) = split_pair(tags.tag_subs.as_deref().unwrap());
        assert_eq!(subs, vec!["aww", "pics"]);
        assert_eq!(names, vec!["animals", "cute"]);

        assert!(Cli::try_parse_from(["rvm", "tags", "--tag-subs", "pics"]).is_err());
    }

    #[test]
    fn test_global_config_flag() {
        let cli = parse(&["rvm", "tags", "--list", "--config", "/tmp/rvm.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rvm.toml")));
    }
}
