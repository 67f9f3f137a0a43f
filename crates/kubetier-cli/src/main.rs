mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "kubetier",
    about = "Install cluster components in tiers and verify their pods actually come up",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root holding kubetier.yaml and values/ (default: auto-detect)
    #[arg(long, global = true, env = "KUBETIER_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log every kubectl and helm invocation
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Install and verify tiers in order
    Install {
        /// Only this tier (1-4)
        #[arg(long)]
        tier: Option<u8>,

        /// Stop at the first component that fails to install or verify
        #[arg(long)]
        fail_fast: bool,

        /// Write a JSON run report to this path
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Show pod health per namespace
    Summary {
        #[arg(long)]
        tier: Option<u8>,
    },

    /// Uninstall releases and delete namespaces, last tier first
    Cleanup {
        #[arg(long)]
        tier: Option<u8>,
    },

    /// Check deployed namespaces for failing pods
    Validate {
        #[arg(long)]
        tier: Option<u8>,
    },

    /// List tiers, their components, and namespaces
    Tiers,

    /// Show or validate kubetier.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Keep stdout for the JSON document.
    kubetier_core::status::route_to_stderr(cli.json);

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Install {
            tier,
            fail_fast,
            report,
        } => cmd::install::run(&root, tier, fail_fast, report.as_deref(), cli.json),
        Commands::Summary { tier } => cmd::summary::run(&root, tier, cli.json),
        Commands::Cleanup { tier } => cmd::cleanup::run(&root, tier),
        Commands::Validate { tier } => cmd::validate::run(&root, tier, cli.json),
        Commands::Tiers => cmd::tiers::run(cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
