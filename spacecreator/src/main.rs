mod app;
mod core;
mod ipc;
mod macos;
mod platform;

use std::time::Duration;

use anyhow::{anyhow, Result};
use argh::FromArgs;
use ipc::IpcClient;
use tracing_subscriber::EnvFilter;

use crate::core::{Config, Timings};
use spacecreator_ipc::{Command, Response};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// SpaceCreator - add a Mission Control space from a hotkey or the menu bar
#[derive(FromArgs)]
struct Cli {
    #[argh(subcommand)]
    command: Option<SubCommand>,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum SubCommand {
    Start(StartCmd),
    Version(VersionCmd),
    CreateSpace(CreateSpaceCmd),
    CheckPermissions(CheckPermissionsCmd),
    Status(StatusCmd),
    Quit(QuitCmd),
}

/// Start the menu bar agent
#[derive(FromArgs)]
#[argh(subcommand, name = "start")]
struct StartCmd {
    /// global hotkey (default: ctrl-alt-shift-d)
    #[argh(option)]
    hotkey: Option<String>,
    /// run without the status bar item
    #[argh(switch)]
    no_menu_bar: bool,
    /// wait after opening the overview, in milliseconds
    #[argh(option)]
    overview_delay_ms: Option<u64>,
    /// wait after hovering the add control, in milliseconds
    #[argh(option)]
    reveal_delay_ms: Option<u64>,
    /// wait before dismissing the overview, in milliseconds
    #[argh(option)]
    settle_delay_ms: Option<u64>,
}

/// Show version information
#[derive(FromArgs)]
#[argh(subcommand, name = "version")]
struct VersionCmd {}

/// Create a new space on the display of the focused window
#[derive(FromArgs)]
#[argh(subcommand, name = "create-space")]
struct CreateSpaceCmd {}

/// Check Accessibility permission and show the result
#[derive(FromArgs)]
#[argh(subcommand, name = "check-permissions")]
struct CheckPermissionsCmd {}

/// Show what the running agent is doing
#[derive(FromArgs)]
#[argh(subcommand, name = "status")]
struct StatusCmd {}

/// Quit the running agent
#[derive(FromArgs)]
#[argh(subcommand, name = "quit")]
struct QuitCmd {}

fn main() -> Result<()> {
    let cli: Cli = argh::from_env();

    match cli.command {
        None => {
            // No subcommand - show help (simulate --help)
            let args: Vec<&str> = vec!["spacecreator", "--help"];
            if let Err(e) = Cli::from_args(&args[..1], &args[1..]) {
                println!("{}", e.output);
            }
            Ok(())
        }
        Some(SubCommand::Start(cmd)) => {
            tracing_subscriber::fmt()
                .with_env_filter(EnvFilter::from_default_env())
                .init();

            let config = build_config(cmd)?;
            tracing::info!("spacecreator {} starting", VERSION);
            app::App::new(config).run()
        }
        Some(SubCommand::Version(_)) => {
            println!("spacecreator {}", VERSION);
            Ok(())
        }
        Some(SubCommand::CreateSpace(_)) => run_cli(Command::CreateSpace),
        Some(SubCommand::CheckPermissions(_)) => run_cli(Command::CheckPermissions),
        Some(SubCommand::Status(_)) => run_cli(Command::Status),
        Some(SubCommand::Quit(_)) => run_cli(Command::Quit),
    }
}

fn build_config(cmd: StartCmd) -> Result<Config> {
    let mut config = Config::default();
    if let Some(hotkey) = cmd.hotkey {
        config.hotkey = macos::parse_hotkey(&hotkey).map_err(|e| anyhow!(e))?;
    }
    config.menu_bar = !cmd.no_menu_bar;
    config.timings = apply_delays(
        config.timings,
        cmd.overview_delay_ms,
        cmd.reveal_delay_ms,
        cmd.settle_delay_ms,
    );
    Ok(config)
}

fn apply_delays(
    mut timings: Timings,
    overview_ms: Option<u64>,
    reveal_ms: Option<u64>,
    settle_ms: Option<u64>,
) -> Timings {
    if let Some(ms) = overview_ms {
        timings.overview_open = Duration::from_millis(ms);
    }
    if let Some(ms) = reveal_ms {
        timings.control_reveal = Duration::from_millis(ms);
    }
    if let Some(ms) = settle_ms {
        timings.settle = Duration::from_millis(ms);
    }
    timings
}

fn run_cli(cmd: Command) -> Result<()> {
    let mut client = IpcClient::connect()?;
    let response = client.send(&cmd)?;

    match response {
        Response::Ok => {}
        Response::Error { message } => {
            eprintln!("Error: {}", message);
            std::process::exit(1);
        }
        Response::Outcome { outcome } => {
            println!("{}", outcome);
            if !outcome.is_success() {
                std::process::exit(1);
            }
        }
        Response::Permission { trusted } => {
            println!("Accessibility permission: {}", if trusted { "granted" } else { "denied" });
            if !trusted {
                std::process::exit(1);
            }
        }
        Response::Status { phase } => println!("{}", phase),
    }

    Ok(())
}
