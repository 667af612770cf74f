#![forbid(unsafe_code)]

//! `cup` — a live-synchronized coffee shop catalog for the terminal.
//!
//! Hosts the cuppa engine over a JSON-file store: a private list per
//! user, one shared list for everyone, a sorted/filtered table, and a
//! text map of everything with coordinates.

mod cmd;
mod config;
mod identity;
mod map_text;
mod output;
mod store_file;

use std::env;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use cmd::{HostOpts, ScopeChoice};
use output::OutputMode;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "cup: rate coffee shops, privately or together",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Act as this identity (overrides CUPPA_USER and the config).
    #[arg(long, global = true)]
    user: Option<String>,

    /// Catalog data file (overrides the config).
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Config file location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Work in the shared list.
    #[arg(long, global = true, conflicts_with = "private")]
    shared: bool,

    /// Work in your private list.
    #[arg(long, global = true)]
    private: bool,

    /// Output format.
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    /// Emit JSON output (alias for --format json).
    #[arg(long, global = true, hide = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn host_opts(&self) -> HostOpts {
        let scope = if self.shared {
            ScopeChoice::Shared
        } else if self.private {
            ScopeChoice::Private
        } else {
            ScopeChoice::Default
        };
        HostOpts {
            user_flag: self.user.clone(),
            data_flag: self.data.clone(),
            config_flag: self.config.clone(),
            scope,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Setup",
        about = "Initialize the catalog and config",
        after_help = "EXAMPLES:\n    # Set up a catalog acting as alice, curating the shared list\n    cup init --user alice --curator alice"
    )]
    Init(cmd::init::InitArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Add a coffee shop",
        after_help = "EXAMPLES:\n    # Add to your private list\n    cup add \"Huckleberry Roasters\" --rating 4.5 --price 2 --category sunnyside\n\n    # Add to the shared list, with a map position\n    cup add \"Crema\" --shared --lat 39.7613 --lng -104.9831"
    )]
    Add(cmd::add::AddArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "List shops as a sorted/filtered table",
        after_help = "EXAMPLES:\n    # Best first\n    cup list --sort rating\n\n    # Search the shared list\n    cup list --shared --query larimer"
    )]
    List(cmd::list::ListArgs),

    #[command(next_help_heading = "Catalog", about = "Show one shop in full")]
    Show(cmd::show::ShowArgs),

    #[command(
        next_help_heading = "Quick edits",
        about = "Re-rate a shop in place",
        after_help = "EXAMPLES:\n    cup rate srv-3 4.5"
    )]
    Rate(cmd::rate::RateArgs),

    #[command(next_help_heading = "Quick edits", about = "Set a shop's price level in place")]
    Price(cmd::price::PriceArgs),

    #[command(next_help_heading = "Catalog", about = "Edit a shop's fields")]
    Edit(cmd::edit::EditArgs),

    #[command(next_help_heading = "Catalog", about = "Remove a shop")]
    Rm(cmd::rm::RmArgs),

    #[command(
        next_help_heading = "Catalog",
        about = "Show mapped shops and the viewport",
        after_help = "EXAMPLES:\n    cup map --shared --category rino"
    )]
    Map(cmd::map::MapArgs),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("CUPPA_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if env::var("DEBUG").is_ok() {
            "cuppa_core=debug,cuppa_cli=debug,info"
        } else {
            "warn"
        })
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let output = output::resolve_output_mode(cli.format, cli.json);
    let opts = cli.host_opts();

    match cli.command {
        Commands::Init(ref args) => cmd::init::run_init(args, &opts, output),
        Commands::Add(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::add::run_add(args, &mut host, output)
        }
        Commands::List(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::list::run_list(args, &mut host, output)
        }
        Commands::Show(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::show::run_show(args, &mut host, output)
        }
        Commands::Rate(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::rate::run_rate(args, &mut host, output)
        }
        Commands::Price(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::price::run_price(args, &mut host, output)
        }
        Commands::Edit(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::edit::run_edit(args, &mut host, output)
        }
        Commands::Rm(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::rm::run_rm(args, &mut host, output)
        }
        Commands::Map(ref args) => {
            let mut host = cmd::open_view(&opts, output)?;
            cmd::map::run_map(args, &mut host, output)
        }
    }
}
