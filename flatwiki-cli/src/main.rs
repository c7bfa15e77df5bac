//! # flatwiki CLI
//!
//! Command-line interface for a flatwiki page directory.

mod commands;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flatwiki")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, global = true, default_value = "flatwiki.yml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new wiki
    Init {
        /// Target directory (defaults to current directory)
        path: Option<PathBuf>,
    },

    /// Render a stored page
    Show {
        /// Page slug
        slug: String,

        /// Output format
        #[arg(long, value_enum, default_value_t = PageFormat::Html)]
        format: PageFormat,
    },

    /// Store a page's source text
    Save {
        /// Page slug
        slug: String,

        /// Read the source from a file instead of stdin
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Start a page from a title
    New {
        /// Page title, normalized into a slug
        title: String,

        /// Store the draft instead of only printing it
        #[arg(long)]
        save: bool,
    },

    /// List pages
    Pages {
        /// Only pages carrying any of these tags
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// List tags in use
    Tags {
        /// Show how many pages carry each tag
        #[arg(long)]
        counts: bool,
    },

    /// List attachments
    Files,

    /// Store a file as an attachment
    Attach {
        /// File to copy into the attachment directory
        path: PathBuf,

        /// Stored name (defaults to the file name)
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the slug for a title
    Slug {
        /// Title to normalize
        title: String,
    },

    /// Print a configuration value (e.g. site.title)
    Config {
        /// Dotted key
        key: String,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum PageFormat {
    Html,
    Json,
    Raw,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so command output can be piped
    let subscriber = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init { path } => commands::init_wiki(path.as_deref()),
        Commands::Show { slug, format } => commands::show_page(&cli.config, &slug, format),
        Commands::Save { slug, from } => commands::save_page(&cli.config, &slug, from.as_deref()),
        Commands::New { title, save } => commands::new_page(&cli.config, &title, save),
        Commands::Pages { tags } => commands::list_pages(&cli.config, tags),
        Commands::Tags { counts } => commands::list_tags(&cli.config, counts),
        Commands::Files => commands::list_files(&cli.config),
        Commands::Attach { path, name } => {
            commands::attach_file(&cli.config, &path, name.as_deref())
        }
        Commands::Slug { title } => {
            println!("{}", flatwiki_core::normalize(&title));
            Ok(())
        }
        Commands::Config { key } => commands::show_config(&cli.config, &key),
    }
}
