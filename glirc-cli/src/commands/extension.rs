//! Extension management commands

use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use glirc_extension_api::API_MAJOR_VERSION;
use glirc_host::{ClientModel, ExtensionHost, ExtensionRegistry, HostConfig, loader};

/// Arguments for `list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Also show enabled extensions whose library is missing
    #[arg(long)]
    pub all: bool,
}

pub fn list(config: &HostConfig, args: ListArgs) -> Result<()> {
    let registry = ExtensionRegistry::load(&config.registry_path)?;
    let found = loader::discover(&config.extension_dirs)?;

    if found.is_empty() && registry.enabled.is_empty() {
        println!("No extensions installed");
        println!();
        for dir in &config.extension_dirs {
            println!("Extension directory: {}", dir.display());
        }
        println!();
        println!("To install an extension:");
        println!("  1. Create a directory: mkdir -p <extension dir>/my-extension");
        println!("  2. Copy the library: cp libmy_extension.so <extension dir>/my-extension/");
        println!("  3. Enable it: glirc-ext enable my-extension");
        return Ok(());
    }

    for ext in &found {
        let status = if registry.is_enabled(&ext.name) { "✓" } else { "○" };
        println!("{} {}    {}", status, ext.name, ext.library.display());
    }

    if args.all {
        for name in registry.enabled_extensions() {
            if !found.iter().any(|ext| ext.name == name) {
                println!("✗ {}    (enabled, library not found)", name);
            }
        }
    }

    Ok(())
}

pub fn enable(config: &HostConfig, name: &str) -> Result<()> {
    let mut host = ExtensionHost::new(config.clone(), ClientModel::new());
    host.enable_extension(name)?;
    println!("Enabled extension: {}", name);
    println!("Run 'glirc-ext check' to verify it loads correctly.");
    Ok(())
}

pub fn disable(config: &HostConfig, name: &str) -> Result<()> {
    let mut host = ExtensionHost::new(config.clone(), ClientModel::new());
    host.disable_extension(name)?;
    println!("Disabled extension: {}", name);
    Ok(())
}

pub fn info(path: &Path) -> Result<()> {
    let info = loader::inspect(path)
        .with_context(|| format!("Failed to read extension {}", path.display()))?;

    println!("Name:        {}", info.name);
    println!("Version:     {}", info.version());
    println!("Library:     {}", path.display());
    let slots = info.slots.names();
    println!(
        "Entry points: {}",
        if slots.is_empty() {
            "none".to_string()
        } else {
            slots.join(", ")
        }
    );
    if info.major_version != API_MAJOR_VERSION {
        println!();
        println!(
            "Warning: built for API major {}, this host speaks {}",
            info.major_version, API_MAJOR_VERSION
        );
    }

    Ok(())
}
