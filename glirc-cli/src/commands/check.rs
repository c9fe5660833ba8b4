//! `glirc-ext check`: smoke-test enabled extensions

use anyhow::{Result, bail};
use clap::Args;
use glirc_extension_api::{Command, Message, ProcessResult};
use glirc_host::{ClientModel, ExtensionHost, ExtensionRegistry, ExtensionState, HostConfig, loader};

/// Arguments for `check`
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Network name the synthetic client is connected to
    #[arg(long, default_value = "example")]
    pub network: String,

    /// Channel the synthetic message is sent to
    #[arg(long, default_value = "#glirc")]
    pub channel: String,
}

/// Outcome for one extension
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    Passed { verdict: ProcessResult },
    Failed(String),
}

pub fn run(config: &HostConfig, args: CheckArgs) -> Result<()> {
    std::hint::black_box(glirc_host::ffi::exported_callbacks());

    let registry = ExtensionRegistry::load(&config.registry_path)?;
    let candidates: Vec<_> = loader::discover(&config.extension_dirs)?
        .into_iter()
        .filter(|ext| registry.is_enabled(&ext.name))
        .collect();

    if candidates.is_empty() {
        println!("No enabled extensions to check");
        return Ok(());
    }

    let mut host = ExtensionHost::new(config.clone(), synthetic_client(&args));
    let mut outcomes = Vec::new();
    for ext in &candidates {
        let name = match host.load_library(&ext.library) {
            Ok(name) => name,
            Err(e) => {
                outcomes.push((ext.name.clone(), Outcome::Failed(e.to_string())));
                continue;
            }
        };
        outcomes.push((name.clone(), exercise(&mut host, &name, &args)));
    }
    host.shutdown();

    for (name, outcome) in &outcomes {
        let state = host
            .get_extension_info(name)
            .map(|info| info.state)
            .unwrap_or(ExtensionState::Unloaded);
        match outcome {
            Outcome::Passed { verdict } => println!("✓ {name}    {verdict:?}, {state}"),
            Outcome::Failed(reason) => println!("✗ {name}    {reason}"),
        }
    }

    let failed = outcomes
        .iter()
        .filter(|(_, outcome)| matches!(outcome, Outcome::Failed(_)))
        .count();
    if failed > 0 {
        bail!("{failed} of {} extensions failed", outcomes.len());
    }
    Ok(())
}

fn synthetic_client(args: &CheckArgs) -> ClientModel {
    let mut client = ClientModel::new();
    client
        .connect(&args.network, "glirc")
        .join(&args.network, &args.channel, ["glirc", "checker"]);
    client
}

/// Offer one message and one command to a freshly started extension.
fn exercise<C: glirc_host::ClientState>(
    host: &mut ExtensionHost<C>,
    name: &str,
    args: &CheckArgs,
) -> Outcome {
    let message = Message::new(&args.network, "PRIVMSG")
        .with_prefix("checker", "check", "localhost")
        .with_param(&args.channel)
        .with_param("glirc-ext check")
        .with_tag("time", "1970-01-01T00:00:00.000Z");
    let verdict = host.dispatch_message(&message);
    host.dispatch_command(&Command::new(&["check"]));

    match host.get_extension_info(name).map(|info| info.state) {
        Some(ExtensionState::Started) => Outcome::Passed { verdict },
        Some(state) => Outcome::Failed(state.to_string()),
        None => Outcome::Failed("not installed".to_string()),
    }
}
