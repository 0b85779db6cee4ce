mod canvas;
mod config;
mod ctl;
mod ipc;
mod layout;
mod presenter;
mod renderer;
mod time_utils;
mod timer;
mod view;
mod wayland;
mod zones;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::view::ViewSelection;

#[derive(Parser, Debug)]
#[command(name = "worldclock", version, about = "Wayland layer-shell world clock")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Start in compact mode
    #[arg(long)]
    compact: bool,

    /// Override IPC socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    /// Generate shell completions and exit
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Control a running worldclock instance
    Ctl(ctl::CtlArgs),
    /// Print the current cards as text and exit
    Print {
        /// Zone id or "all"
        #[arg(long, default_value = zones::ALL_VIEW)]
        view: String,
    },
}

fn main() -> Result<()> {
    let mut cli = Cli::parse();

    match cli.command.take() {
        Some(CliCommand::Ctl(args)) => ctl::run(args),
        Some(CliCommand::Print { view }) => run_print(cli, &view),
        None => run_daemon(cli),
    }
}

fn run_print(args: Cli, view: &str) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let config = config::load_config(&config_path)?;
    let registry = config.registry()?;
    let selection = registry.parse_selection(view)?;

    let shown: Vec<&zones::ZoneDescriptor> = match &selection {
        ViewSelection::All => registry.all_zones().iter().collect(),
        ViewSelection::Zone(id) => vec![registry.lookup(id)?],
    };

    let now = chrono::Utc::now();
    let viewer_date = chrono::Local::now().date_naive();
    for (i, zone) in shown.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let snapshot = time_utils::compute_snapshot(&zone.tz, now, viewer_date);
        for line in renderer::card::text_lines(zone, &snapshot) {
            println!("{}", line);
        }
    }

    Ok(())
}

fn run_daemon(args: Cli) -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Some(shell) = args.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "worldclock", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = args.config.unwrap_or_else(config::default_config_path);
    let mut config = config::load_config(&config_path)?;

    if args.compact {
        config.window.compact = true;
    }

    // Reject a bad zone table before touching Wayland
    let registry = config.registry()?;

    log::info!(
        "Starting worldclock with {} zones, compact={}",
        registry.all_zones().len(),
        config.window.compact
    );
    log::info!(
        "Content sizing: font_size={}, refresh={:?}",
        config.clock.font_size,
        config.clock.refresh_period()
    );

    wayland::run(config, registry, config_path, args.socket)?;

    Ok(())
}
