use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lineage::areas::repository::Repository;
use lineage::artifacts::core::{PagerWriter, pager_enabled};
use lineage::commands::plumbing::cat_file::CatFileMode;
use lineage::commands::plumbing::ls_tree::LsTreeOptions;
use lineage::commands::porcelain::log::LogOptions;
use lineage::config::Config;
use std::io::Write;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "lineage",
    version = "0.1.0",
    author = "Sami Barbut-Dica",
    about = "Browse the history of a git repository",
    long_about = "Walks the commit graph of a git repository to list, count and search history, \
    find the commits that changed a path and the last change of every entry of a directory.",
    help_template = r"
{name} {version} - {about}

USAGE:
    {usage}

OPTIONS:
    {all-args}
"
)]
struct Cli {
    #[arg(short = 'C', long = "repo", global = true, default_value = ".", help = "Path to the repository")]
    repo: PathBuf,
    #[arg(long, global = true, help = "Maximum number of concurrent history walks")]
    max_concurrency: Option<usize>,
    #[arg(long, global = true, help = "Commits per page")]
    page_size: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(
        name = "log",
        about = "Show commit logs",
        long_about = "Shows the commits reachable from a revision, newest first. \
        Commits can be restricted to those that changed given paths or whose message contains a keyword."
    )]
    Log {
        #[arg(index = 1, default_value = "HEAD", help = "The revision to start from")]
        revision: String,
        #[arg(short, long = "path", help = "Only commits that changed this path")]
        paths: Vec<String>,
        #[arg(long, help = "Only commits whose message contains this keyword")]
        grep: Option<String>,
        #[arg(long, default_value_t = 0, help = "Skip this many matching commits")]
        skip: usize,
        #[arg(short = 'n', long, help = "Show at most this many commits")]
        max_count: Option<usize>,
        #[arg(long, conflicts_with_all = ["skip", "max_count"], help = "Show this page of history, counting from 1")]
        page: Option<usize>,
        #[arg(long, help = "Show each commit on a single line")]
        oneline: bool,
        #[arg(long, help = "Show the refs pointing at each commit")]
        decorate: bool,
    },
    #[command(
        name = "count",
        about = "Count commits",
        long_about = "Counts the commits reachable from a revision. \
        With paths, counts per path the commits that changed it, in a single walk."
    )]
    Count {
        #[arg(index = 1, default_value = "HEAD", help = "The revision to start from")]
        revision: String,
        #[arg(short, long = "path", help = "Count the commits that changed this path")]
        paths: Vec<String>,
    },
    #[command(
        name = "last-commits",
        about = "Show the last commit of every entry of a directory",
        long_about = "Finds, for every file and directory inside a directory, the most recent commit that changed it."
    )]
    LastCommits {
        #[arg(index = 1, default_value = "HEAD", help = "The revision to inspect")]
        revision: String,
        #[arg(index = 2, default_value = "", help = "The directory, relative to the repository root")]
        path: String,
    },
    #[command(
        name = "cat-file",
        about = "Print the content, type or size of an object",
        long_about = "Prints an object named by an object id, a revision or <revision>:<path>."
    )]
    CatFile {
        #[arg(short = 'p', group = "mode", help = "Pretty-print the content")]
        pretty: bool,
        #[arg(short = 't', group = "mode", help = "Print the object type")]
        object_type: bool,
        #[arg(short = 's', group = "mode", help = "Print the object size")]
        size: bool,
        #[arg(index = 1)]
        object: String,
    },
    #[command(name = "ls-tree", about = "List the contents of a tree object")]
    LsTree {
        #[arg(short = 'r', help = "Recurse into subtrees")]
        recursive: bool,
        #[arg(short = 'l', long, help = "Show the size of blobs")]
        long: bool,
        #[arg(index = 1, default_value = "HEAD")]
        tree_ish: String,
    },
    #[command(name = "branch", about = "List branches or set the default branch")]
    Branch {
        #[arg(long, help = "Point HEAD at this branch")]
        set_default: Option<String>,
    },
    #[command(name = "tag", about = "List or create tags")]
    Tag {
        #[arg(index = 1, help = "Name of the tag to create")]
        name: Option<String>,
        #[arg(index = 2, default_value = "HEAD", help = "The revision to tag")]
        revision: String,
        #[arg(short, long, help = "Create an annotated tag with this message")]
        message: Option<String>,
        #[arg(short = 'v', long, help = "Show the tagged commit")]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_from_env();
    if let Some(max_concurrency) = cli.max_concurrency {
        config = config.with_max_concurrency(max_concurrency);
    }
    if let Some(page_size) = cli.page_size {
        config = config.with_page_size(page_size);
    }
    let repository = Repository::open_with_config(&cli.repo, config)
        .with_context(|| format!("not a git repository: {}", cli.repo.display()))?;

    if pager_enabled() {
        let pager = minus::Pager::new();
        let mut writer = PagerWriter::new(pager.clone());
        run(&repository, cli.command, &mut writer).await?;
        minus::page_all(pager)?;
    } else {
        let mut stdout = std::io::stdout().lock();
        run(&repository, cli.command, &mut stdout).await?;
        stdout.flush()?;
    }

    Ok(())
}

async fn run(repository: &Repository, command: Commands, writer: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Log {
            revision,
            paths,
            grep,
            skip,
            max_count,
            page,
            oneline,
            decorate,
        } => {
            let (skip, max_count) = match page {
                Some(page) => {
                    let page_size = repository.config().page_size();
                    (page.saturating_sub(1) * page_size, Some(page_size))
                }
                None => (skip, max_count),
            };
            let opts = LogOptions {
                revision,
                paths,
                grep,
                skip,
                max_count,
                oneline,
                decorate,
            };

            repository.log(&opts, writer)?
        }
        Commands::Count { revision, paths } => repository.count(&revision, &paths, writer)?,
        Commands::LastCommits { revision, path } => repository.last_commits(&revision, &path, writer).await?,
        Commands::CatFile {
            object_type,
            size,
            object,
            ..
        } => {
            let mode = if object_type {
                CatFileMode::Type
            } else if size {
                CatFileMode::Size
            } else {
                CatFileMode::Pretty
            };

            repository.cat_file(&object, mode, writer)?
        }
        Commands::LsTree {
            recursive,
            long,
            tree_ish,
        } => repository.ls_tree(&tree_ish, LsTreeOptions { recursive, long }, writer)?,
        Commands::Branch { set_default } => match set_default {
            Some(name) => repository.set_head_branch(&name, writer)?,
            None => repository.list_branches(writer)?,
        },
        Commands::Tag {
            name,
            revision,
            message,
            verbose,
        } => match (name, message) {
            (Some(name), Some(message)) => repository.create_annotated_tag(&name, &revision, &message)?,
            (Some(name), None) => repository.create_tag(&name, &revision)?,
            (None, _) => repository.list_tags(verbose, writer)?,
        },
    }

    Ok(())
}
