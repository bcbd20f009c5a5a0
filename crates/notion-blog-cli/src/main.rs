use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use notion_blog_config::Config;
use notion_blog_engine::rewrite::format_toc;
use notion_blog_engine::{
    ContentSource, DirectorySource, Pipeline, PipelineOptions, PostQuery, SortOrder, parse_blocks,
    render_post, tag_list,
};

#[derive(Parser)]
#[command(name = "notion-blog")]
#[command(version, about = "Render Notion-authored blog posts as sanitized HTML", long_about = None)]
#[command(after_help = "EXAMPLES:
    notion-blog render hello-world          Print a post as HTML
    notion-blog render hello-world --toc    Print its table of contents
    notion-blog list --tag Rust             List posts tagged Rust
    notion-blog transform blocks.json       Render a raw block dump")]
struct Cli {
    /// Directory of post records, overriding `posts_path` from the config file
    #[arg(long, global = true, value_name = "DIR")]
    posts: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render one post by slug
    Render {
        slug: String,
        /// Print the table of contents instead of the HTML
        #[arg(long)]
        toc: bool,
    },
    /// List published posts
    List {
        #[arg(long)]
        tag: Option<String>,
        #[arg(long, default_value_t = SortOrder::Latest)]
        sort: SortOrder,
        #[arg(long)]
        page_size: Option<usize>,
        #[arg(long)]
        cursor: Option<String>,
    },
    /// List tags with post counts
    Tags,
    /// Render a JSON array of blocks from a file, or stdin when omitted
    Transform { file: Option<PathBuf> },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load().with_context(|| {
        format!(
            "Failed to load config file {}",
            Config::config_path().display()
        )
    })?;
    let (listing, render) = config
        .as_ref()
        .map(|c| (c.listing.clone(), c.render.clone()))
        .unwrap_or_default();

    let pipeline = Pipeline::new(PipelineOptions {
        anchor_flatten_limit: render.anchor_flatten_limit,
        autolink: render.autolink,
        heading_ids: render.heading_ids,
        highlight: render.highlight,
        highlight_theme: render.highlight_theme,
    });

    match cli.command {
        Command::Render { slug, toc } => {
            let source = open_source(cli.posts, config.as_ref())?;
            let rendered = render_post(&source, &slug, &pipeline)?;
            log::info!("Rendered {:?}", rendered.post.title);
            if !rendered.document.flatten.converged {
                log::warn!("Output of {slug} still contains nested links");
            }
            if toc {
                print!("{}", format_toc(&rendered.document.toc));
            } else {
                println!("{}", rendered.document.html());
            }
        }
        Command::List {
            tag,
            sort,
            page_size,
            cursor,
        } => {
            let source = open_source(cli.posts, config.as_ref())?;
            let mut query = PostQuery::default()
                .with_sort(sort)
                .with_page_size(page_size.unwrap_or(listing.page_size));
            // The synthetic "every post" tag is no filter at all.
            if let Some(tag) = tag.filter(|t| *t != listing.all_tag_label && t != "all") {
                query = query.with_tag(tag);
            }
            if let Some(cursor) = cursor {
                query = query.with_cursor(cursor);
            }

            let page = source.query_published(&query)?;
            for post in &page.items {
                println!(
                    "{}  {}  {}  [{}]",
                    post.date,
                    post.slug,
                    post.title,
                    post.tags.join(", ")
                );
            }
            if let Some(next) = page.next_cursor {
                println!("next cursor: {next}");
            }
        }
        Command::Tags => {
            let source = open_source(cli.posts, config.as_ref())?;
            for tag in tag_list(&source, &listing.all_tag_label)? {
                println!("{} ({})  #{}", tag.name, tag.count, tag.id);
            }
        }
        Command::Transform { file } => {
            let json = read_input(file.as_deref())?;
            let blocks = parse_blocks(&json).context("Failed to parse blocks")?;
            println!("{}", pipeline.render_blocks(&blocks).html());
        }
    }

    Ok(())
}

/// Posts directory from the command line, else from the config file.
fn open_source(posts: Option<PathBuf>, config: Option<&Config>) -> Result<DirectorySource> {
    let Some(posts_path) = posts.or_else(|| config.map(|c| c.posts_path.clone())) else {
        bail!(
            "No posts path provided and no config file found. Pass --posts <DIR> or create {}",
            Config::config_path().display()
        );
    };
    DirectorySource::open(&posts_path)
        .with_context(|| format!("Posts path '{}' is invalid", posts_path.display()))
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => {
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
        }
        None => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read stdin")?;
            Ok(input)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_list_flags_parse() {
        let cli = Cli::parse_from([
            "notion-blog", "list", "--tag", "Rust", "--sort", "oldest", "--page-size", "5",
            "--posts", "/srv/posts",
        ]);

        assert_eq!(cli.posts, Some(PathBuf::from("/srv/posts")));
        let Command::List { tag, sort, page_size, cursor } = cli.command else {
            panic!("expected list");
        };
        assert_eq!(tag.as_deref(), Some("Rust"));
        assert_eq!(sort, SortOrder::Oldest);
        assert_eq!(page_size, Some(5));
        assert_eq!(cursor, None);
    }

    #[test]
    fn test_missing_posts_path_is_reported() {
        let err = open_source(None, None).unwrap_err();
        assert!(err.to_string().starts_with("No posts path provided"));
    }

    #[test]
    fn test_render_missing_post_fails() {
        // Given an empty posts directory
        let posts_dir = tempfile::tempdir().unwrap();
        let source = open_source(Some(posts_dir.path().to_path_buf()), None).unwrap();

        // When rendering a slug that is not there
        let err = render_post(&source, "ghost", &Pipeline::default()).unwrap_err();

        // Then the error names the slug
        assert_eq!(err.to_string(), "Post not found: ghost");
    }
}
