mod cli;
mod paths;
mod run;

use std::path::PathBuf;

use anyhow::{Context, Result};
use cli::Command;
use glassconfig::{RenderConfig, PRESETS};
use serde::Serialize;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();

    match cli.command {
        Some(Command::Presets { json }) => print_presets(json),
        Some(Command::Stylesheet { config, preset }) => print_stylesheet(config, preset),
        None => run::run(cli.run),
    }
}

#[derive(Serialize)]
struct PresetEntry<'a> {
    name: &'a str,
    slug: String,
    config: &'a RenderConfig,
}

fn print_presets(json: bool) -> Result<()> {
    if json {
        let entries: Vec<PresetEntry<'_>> = PRESETS
            .iter()
            .map(|preset| PresetEntry {
                name: preset.name,
                slug: preset.slug(),
                config: &preset.config,
            })
            .collect();
        let rendered =
            serde_json::to_string_pretty(&entries).context("failed to serialise presets")?;
        println!("{rendered}");
        return Ok(());
    }

    for (index, preset) in PRESETS.iter().enumerate() {
        let config = &preset.config;
        println!(
            "  [{}] {:<16} n={:<5} blur={:<4} {}x{} r={}",
            index + 1,
            preset.name,
            config.refractive_index,
            config.blur_radius,
            config.size.width,
            config.size.height,
            config.border_radius
        );
    }
    Ok(())
}

fn print_stylesheet(config: Option<PathBuf>, preset: Option<String>) -> Result<()> {
    let loaded = run::load_config_file(config.as_deref())?;
    let resolved = run::resolve_config(loaded.as_ref().map(|(_, file)| file), preset.as_deref())?;
    print!("{}", glassconfig::stylesheet(&resolved));
    Ok(())
}
