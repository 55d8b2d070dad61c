use clap::{Parser, Subcommand};
use school_reviews::{OutputFormat, ReviewsConfig};
use tracing::{error, Level};

mod commands;

use commands::config::ConfigArgs;
use commands::reviews::AddArgs;
use commands::serve::ServeArgs;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
#[clap(propagate_version = true)]
struct Cli {
    /// configuration file path, by default $HOME/.school-reviews/school-reviews.toml is used
    #[clap(short, long)]
    config: Option<String>,

    /// Print debug information
    #[clap(long)]
    debug: bool,

    /// Output format: table, markdown, json, json-pretty, json-line, psv
    #[clap(short, long, global = true, default_value = "table")]
    format: OutputFormat,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web server (HTML pages, JSON feed, health check)
    Serve(ServeArgs),

    /// Create the database schema and seed sample reviews on first run
    Init,

    /// List all reviews, newest first
    List,

    /// Add a review
    Add(AddArgs),

    /// Print the number of stored reviews
    Count,

    /// Show configuration and database status
    Config(ConfigArgs),
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.debug { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let config = match ReviewsConfig::new(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve(args) => commands::serve::run(&config, args),
        Commands::Init => commands::reviews::run_init(&config, cli.format),
        Commands::List => commands::reviews::run_list(&config, cli.format),
        Commands::Add(args) => commands::reviews::run_add(&config, args, cli.format),
        Commands::Count => commands::reviews::run_count(&config, cli.format),
        Commands::Config(args) => commands::config::run(&config, args, cli.format),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
