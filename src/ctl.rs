use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

use crate::ipc::{self, IpcCommand, IpcResponse};

#[derive(Parser, Debug)]
#[command(name = "ctl", about = "Control a running worldclock instance")]
pub struct CtlArgs {
    /// Override socket path
    #[arg(long)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show one zone, or every zone with "all"
    View {
        /// Zone id (e.g. brisbane) or "all"
        view: String,
    },
    /// Control compact mode
    Compact {
        /// on, off, or toggle
        mode: String,
    },
    /// Print current state as JSON
    State,
    /// Shut down worldclock
    Quit,
    /// Generate shell completions for the ctl subcommand
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn send_command(socket: &PathBuf, cmd: &IpcCommand) -> Result<IpcResponse> {
    let mut stream = UnixStream::connect(socket)
        .with_context(|| format!("Failed to connect to worldclock at {}", socket.display()))?;

    let msg = serde_json::to_string(cmd)? + "\n";
    stream.write_all(msg.as_bytes())?;
    stream.flush()?;

    let mut reader = BufReader::new(&stream);
    let mut response = String::new();
    reader.read_line(&mut response)?;

    let resp: IpcResponse = serde_json::from_str(&response)
        .context("Failed to parse response from worldclock")?;
    Ok(resp)
}

fn build_command(command: &Commands) -> Result<IpcCommand> {
    let cmd = match command {
        Commands::View { view } => IpcCommand::SetView { view: view.clone() },
        Commands::Compact { mode } => match mode.as_str() {
            "on" => IpcCommand::SetCompact { compact: true },
            "off" => IpcCommand::SetCompact { compact: false },
            "toggle" => IpcCommand::ToggleCompact,
            other => anyhow::bail!("Unknown compact mode: {}. Use on, off, or toggle", other),
        },
        Commands::State => IpcCommand::GetState,
        Commands::Quit => IpcCommand::Quit,
        Commands::Completions { .. } => unreachable!("handled before connecting"),
    };
    Ok(cmd)
}

pub fn run(args: CtlArgs) -> Result<()> {
    // Handle completions before connecting to socket
    if let Commands::Completions { shell } = &args.command {
        let mut cmd = crate::Cli::command();
        clap_complete::generate(*shell, &mut cmd, "worldclock", &mut std::io::stdout());
        return Ok(());
    }

    let sock = ipc::socket_path(args.socket.as_ref());
    let cmd = build_command(&args.command)?;
    let resp = send_command(&sock, &cmd)?;

    if resp.ok {
        if matches!(&args.command, Commands::State) {
            println!("{}", serde_json::to_string_pretty(&resp)?);
        }
    } else {
        let err = resp.error.as_deref().unwrap_or("Unknown error");
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compact_modes_map_to_commands() {
        let on = build_command(&Commands::Compact { mode: "on".into() }).unwrap();
        assert_eq!(on, IpcCommand::SetCompact { compact: true });
        let toggle = build_command(&Commands::Compact { mode: "toggle".into() }).unwrap();
        assert_eq!(toggle, IpcCommand::ToggleCompact);
        assert!(build_command(&Commands::Compact { mode: "sideways".into() }).is_err());
    }

    #[test]
    fn view_is_forwarded_verbatim() {
        let cmd = build_command(&Commands::View { view: "reno".into() }).unwrap();
        assert_eq!(serde_json::to_string(&cmd).unwrap(), r#"{"cmd":"set-view","view":"reno"}"#);
    }
}
