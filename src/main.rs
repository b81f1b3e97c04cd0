use anyhow::Result;

use rvm::cli::{split_pair, Cli, Commands, ListArgs, TagsArgs};
use rvm::config::Config;
use rvm::db::Database;
use rvm::manager::Manager;
use rvm::output;
use rvm::tags::TagManager;

/// Number of matches shown by `list --debug`.
const DEBUG_SAMPLE: usize = 5;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let debug = matches!(&cli.command, Commands::List(args) if args.debug);
    match rvm::logging::init(None, debug) {
        Ok(backend) => tracing::debug!(%backend, "Logging initialized"),
        Err(e) => eprintln!("Warning: logging disabled: {}", e),
    }

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let db = Database::open(&config.database)?;
    db.initialize()?;

    match &cli.command {
        Commands::List(args) => run_list(&db, &config, args),
        Commands::Tags(args) => run_tags(&db, args),
    }
}

fn run_list(db: &Database, config: &Config, args: &ListArgs) -> Result<()> {
    let spec = args.to_filter_spec(&config.formats)?;

    let mut manager = Manager::new(db);
    if let Some(root) = args.root.as_deref().or(config.root_path.as_deref()) {
        manager.set_root_path(root);
    }

    if args.debug {
        let report = manager.debug_query(&spec, DEBUG_SAMPLE)?;
        println!("{}", output::debug_report(&report));
        return Ok(());
    }

    let files = manager.list_files(&spec)?;
    if files.is_empty() {
        eprintln!("No results found.");
    }
    for file in files {
        println!("{}", file);
    }
    Ok(())
}

fn run_tags(db: &Database, args: &TagsArgs) -> Result<()> {
    let tags = TagManager::new(db);

    if args.list {
        let names = tags.list_tags()?;
        println!("{}", output::tabulate(names.as_slice(), "Tags"));
    }

    if let Some(pair) = &args.tag_subs {
        let (subs, names) = split_pair(pair);
        for status in tags.tag_subs(subs.as_slice(), names.as_slice())? {
            println!("{}", status);
        }
    }

    if let Some(pair) = &args.untag_subs {
        let (subs, names) = split_pair(pair);
        for status in tags.untag_subs(subs.as_slice(), names.as_slice())? {
            println!("{}", status);
        }
    }

    if args.untagged_subs {
        let subs = tags.untagged_subs()?;
        if subs.is_empty() {
            eprintln!("No untagged subs");
        }
        for sub in subs {
            println!("{}", sub);
        }
    }

    if let Some(tag) = &args.tagged_subs {
        let tag = tag.trim().to_lowercase();
        let subs = tags.tagged_subs(&tag)?;
        if subs.is_empty() {
            eprintln!("No subreddit found with tag {}", tag);
        } else {
            let heading = format!("Subreddits tagged with \"{}\"", tag);
            println!("{}", output::tabulate(subs.as_slice(), &heading));
        }
    }

    if let Some(sub) = &args.sub_tags {
        let names = tags.list_sub_tags(sub)?;
        if names.is_empty() {
            eprintln!("No tags found for \"{}\"", sub);
        }
        for name in names {
            println!("{}", name);
        }
    }

    Ok(())
}
