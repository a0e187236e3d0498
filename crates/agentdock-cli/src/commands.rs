//! Terminal subcommands over the bridge

use agentdock_core::error::{ConfigError, SecretError};
use agentdock_core::{
    find_model, is_known_secret, Bridge, Error, OutputEvent, OutputStream, SecretSet,
};
use anyhow::{bail, Context};
use std::io::Write;
use std::process::ExitCode;

pub async fn list(bridge: &Bridge, out: &mut impl Write) -> anyhow::Result<()> {
    let availability = bridge.agent_availability().await?;
    if availability.is_empty() {
        writeln!(out, "No agent profiles in {}", bridge.config().profiles_dir.display())?;
        return Ok(());
    }
    for (name, available) in availability {
        if available {
            writeln!(out, "{}", name)?;
        } else {
            writeln!(out, "{} (missing API key)", name)?;
        }
    }
    Ok(())
}

pub async fn create(bridge: &Bridge, name: &str, out: &mut impl Write) -> anyhow::Result<()> {
    bridge
        .create_agent(name)
        .await
        .with_context(|| format!("creating profile {}", name))?;
    writeln!(out, "Created {}", name)?;
    Ok(())
}

pub async fn show(bridge: &Bridge, name: &str, out: &mut impl Write) -> anyhow::Result<()> {
    let profile = bridge.load_agent_config(name).await?;
    writeln!(out, "{}", serde_json::to_string_pretty(&profile)?)?;
    Ok(())
}

pub async fn set_model(
    bridge: &Bridge,
    name: &str,
    model: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if find_model(model).is_none() {
        return Err(Error::Config(ConfigError::UnknownModel(model.to_string())).into());
    }

    let mut profile = bridge.load_agent_config(name).await?;
    profile.model = model.to_string();
    bridge.save_agent_config(name, &profile).await?;
    writeln!(out, "{} now uses {}", name, model)?;
    Ok(())
}

pub async fn toggle_mode(
    bridge: &Bridge,
    name: &str,
    mode: &str,
    enabled: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let mut profile = bridge.load_agent_config(name).await?;
    profile.set_mode(mode, enabled)?;
    bridge.save_agent_config(name, &profile).await?;
    writeln!(
        out,
        "{}: {} {} (enabled: {})",
        name,
        mode,
        if enabled { "enabled" } else { "disabled" },
        profile.enabled_modes().join(", ")
    )?;
    Ok(())
}

pub fn models(bridge: &Bridge, out: &mut impl Write) -> anyhow::Result<()> {
    for model in bridge.models() {
        match model.key {
            Some(key) => writeln!(out, "{:<44} {} [{}]", model.value, model.label, key)?,
            None => writeln!(out, "{:<44} {}", model.value, model.label)?,
        }
    }
    Ok(())
}

pub async fn keys(bridge: &Bridge, reveal: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let mut keys = SecretSet::with_known_keys();
    keys.merge(&bridge.get_api_keys().await);
    let shown = if reveal { keys } else { keys.masked() };

    for (name, value) in shown.iter() {
        if value.is_empty() {
            writeln!(out, "{:<20} (not set)", name)?;
        } else {
            writeln!(out, "{:<20} {}", name, value)?;
        }
    }
    Ok(())
}

pub async fn set_key(
    bridge: &Bridge,
    name: &str,
    value: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    if !is_known_secret(name) {
        return Err(Error::Secret(SecretError::UnknownSecret(name.to_string())).into());
    }

    let mut keys = bridge.get_api_keys().await;
    keys.insert(name, value);
    if !bridge.save_api_keys(&keys).await {
        bail!("failed to save API keys to {}", bridge.config().secrets_path.display());
    }
    writeln!(out, "Saved {}", name)?;
    Ok(())
}

/// Launch and stream output to the terminal until the child exits.
///
/// Ctrl-C asks the child to terminate. The exit status mirrors the child's.
pub async fn launch(bridge: &Bridge, profiles: &[String]) -> anyhow::Result<ExitCode> {
    let command = bridge.launch_command(profiles).await?;

    let mut sub = bridge.subscribe_output();
    let handle = bridge.start_launch(&command).await?;
    let id = handle.id();
    let canceller = handle.canceller();
    let mut completion = tokio::spawn(handle.wait());

    eprintln!("$ {}", command);

    let result = loop {
        tokio::select! {
            Some(event) = sub.recv() => {
                if event.launch_id == id {
                    print_event(&event)?;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                eprintln!("Stopping...");
                canceller.cancel();
            }
            joined = &mut completion => {
                while let Some(event) = sub.try_recv() {
                    if event.launch_id == id {
                        print_event(&event)?;
                    }
                }
                break joined.context("launch task failed")?;
            }
        }
    };

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("{}", e);
            let code = e.exit_code().and_then(|c| u8::try_from(c).ok()).unwrap_or(1);
            Ok(ExitCode::from(code.max(1)))
        }
    }
}

fn print_event(event: &OutputEvent) -> std::io::Result<()> {
    match event.stream {
        OutputStream::Stdout => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(event.data.as_bytes())?;
            stdout.flush()
        }
        OutputStream::Stderr => {
            let mut stderr = std::io::stderr().lock();
            stderr.write_all(event.data.as_bytes())?;
            stderr.flush()
        }
    }
}
