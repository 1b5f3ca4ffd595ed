mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::project::ProjectSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "devdash",
    about = "Project dashboard: manage projects, chat with the assistant, verify builds",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from devdash.yaml or .git/)
    #[arg(long, global = true, env = "DEVDASH_ROOT")]
    root: Option<PathBuf>,

    /// Server base URL (default: http://localhost:<server.port>)
    #[arg(long, global = true, env = "DEVDASH_SERVER")]
    server: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API server
    Serve {
        /// Port to listen on (default: server.port from devdash.yaml)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Create, inspect and delete projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Open an interactive dashboard session for a project
    Chat {
        /// Project id
        id: String,
    },

    /// Apply the Postgres schema
    Migrate {
        /// Connection string (default: DATABASE_URL or store.database_url)
        #[arg(long)]
        database_url: Option<String>,
    },

    /// Validate configuration and report missing settings
    Check,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let server = cli.server.as_deref();

    let result = match cli.command {
        Commands::Serve { port } => cmd::serve::run(&root, port),
        Commands::Project { subcommand } => cmd::project::run(&root, server, subcommand, cli.json),
        Commands::Chat { id } => cmd::chat::run(&root, server, &id),
        Commands::Migrate { database_url } => cmd::migrate::run(&root, database_url),
        Commands::Check => cmd::check::run(&root, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
