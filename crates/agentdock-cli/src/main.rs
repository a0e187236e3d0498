//! AgentDock command line front end
//!
//! Terminal access to the AgentDock bridge, plus `serve` which exposes the
//! bridge as newline-delimited JSON on stdin/stdout for graphical front ends.

use agentdock_core::{Bridge, DockConfig};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod serve;

#[derive(Debug, Parser)]
#[command(name = "agentdock", version, about = "Configure and launch automation agents")]
struct Cli {
    /// Root of the automation project (profiles live in <ROOT>/profiles)
    #[arg(long, global = true, env = "AGENTDOCK_ROOT")]
    root: Option<PathBuf>,

    /// Settings file; takes precedence over --root
    #[arg(long, global = true, env = "AGENTDOCK_CONFIG")]
    config: Option<PathBuf>,

    /// Secrets file location
    #[arg(long, global = true, env = "AGENTDOCK_SECRETS")]
    secrets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List agent profiles
    List,
    /// Create a profile from the template (overwrites an existing one)
    Create { name: String },
    /// Print a profile as JSON
    Show { name: String },
    /// Change a profile's model
    SetModel { name: String, model: String },
    /// Enable or disable one of a profile's modes
    ToggleMode {
        name: String,
        mode: String,
        #[arg(long)]
        off: bool,
    },
    /// List the models a profile may use
    Models,
    /// Show stored API keys (masked unless --reveal)
    Keys {
        #[arg(long)]
        reveal: bool,
    },
    /// Store an API key
    SetKey { name: String, value: String },
    /// Launch the automation process with the given profiles
    Launch {
        #[arg(required = true)]
        profiles: Vec<String>,
    },
    /// Serve the bridge protocol on stdin/stdout
    Serve,
}

impl Cli {
    fn dock_config(&self) -> anyhow::Result<DockConfig> {
        let mut config = match (&self.config, &self.root) {
            (Some(path), _) => DockConfig::load(path)?,
            (None, Some(root)) => DockConfig::from_root(root),
            (None, None) => DockConfig::from_root(std::env::current_dir()?),
        };
        if let Some(secrets) = &self.secrets {
            config = config.with_secrets_path(secrets);
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr; stdout carries program output and bridge frames.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    debug!("Parsed arguments: {:?}", cli);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = cli.dock_config()?;
    info!("AgentDock v{}", env!("CARGO_PKG_VERSION"));
    let bridge = Bridge::new(config);
    let mut out = std::io::stdout();

    match cli.command {
        Command::List => commands::list(&bridge, &mut out).await?,
        Command::Create { name } => commands::create(&bridge, &name, &mut out).await?,
        Command::Show { name } => commands::show(&bridge, &name, &mut out).await?,
        Command::SetModel { name, model } => {
            commands::set_model(&bridge, &name, &model, &mut out).await?
        }
        Command::ToggleMode { name, mode, off } => {
            commands::toggle_mode(&bridge, &name, &mode, !off, &mut out).await?
        }
        Command::Models => commands::models(&bridge, &mut out)?,
        Command::Keys { reveal } => commands::keys(&bridge, reveal, &mut out).await?,
        Command::SetKey { name, value } => {
            commands::set_key(&bridge, &name, &value, &mut out).await?
        }
        Command::Launch { profiles } => return commands::launch(&bridge, &profiles).await,
        Command::Serve => serve::serve(bridge).await?,
    }

    Ok(ExitCode::SUCCESS)
}
