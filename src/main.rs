//! LPK CLI - Command-line tool for unpacking Live2D LPK model packages.
//!
//! This is the main entry point for the `lpk` command-line application.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::level_filters::LevelFilter;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use lpk::prelude::*;

/// LPK - Live2D model package unpacker
#[derive(Parser)]
#[command(name = "lpk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract every character of a package into Live2D model folders
    Extract {
        /// Path to the LPK file
        #[arg(short, long, env = "LPK_INPUT")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "LPK_OUTPUT", default_value = "./output")]
        output: PathBuf,

        /// Workshop config.json holding the package secrets
        #[arg(short, long, env = "LPK_CONFIG")]
        config: Option<PathBuf>,
    },

    /// Show the package manifest without extracting
    Info {
        /// Path to the LPK file
        #[arg(short, long, env = "LPK_INPUT")]
        input: PathBuf,

        /// Workshop config.json holding the package secrets
        #[arg(short, long, env = "LPK_CONFIG")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Extract { input, output, config } => {
            cmd_extract(&input, &output, config.as_deref())?;
        }
        Commands::Info { input, config } => {
            cmd_info(&input, config.as_deref())?;
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn check_inputs(input: &Path, config: Option<&Path>) -> Result<()> {
    if !input.is_file() {
        bail!("Input file does not exist: {}", input.display());
    }

    let is_lpk = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("lpk"));
    if !is_lpk {
        warn!(input = %input.display(), "input does not have an .lpk extension");
    }

    if let Some(config) = config {
        if !config.is_file() {
            bail!("Config file does not exist: {}", config.display());
        }
    }

    Ok(())
}

fn cmd_extract(input: &Path, output: &Path, config: Option<&Path>) -> Result<()> {
    check_inputs(input, config)?;

    println!("Opening LPK package: {}", input.display());

    let start = Instant::now();
    let mut extractor = Extractor::open(input, config)
        .context("Failed to open LPK package")?
        .with_secret_provider(LinePrompt::new(io::stdin().lock(), io::stderr()));

    let manifest = extractor.manifest();
    println!(
        "Scheme {}, {} characters",
        manifest.scheme,
        manifest.characters.len()
    );

    match extractor.verify_key().context("Failed to verify package key")? {
        Recovery::Candidate(file_id) | Recovery::Operator(file_id) => {
            println!("Using recovered file id {file_id}");
        }
        Recovery::Accepted | Recovery::NothingToVerify => {}
    }

    let count = extractor.manifest().characters.len();
    let pb = ProgressBar::new(count as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let mut report = ExtractReport::default();
    for index in 0..count {
        let character = extractor
            .extract_character(index, output)
            .with_context(|| format!("Failed to extract character {}", index + 1))?;

        pb.set_message(character.name.clone());
        report.characters.push(character);
        pb.inc(1);
    }

    pb.finish_with_message("Done");

    println!(
        "Extracted {} characters to {} in {:?}: {} documents, {} assets, {} failed costumes",
        report.characters.len(),
        output.display(),
        start.elapsed(),
        report.documents(),
        extractor.assets(),
        report.failed_costumes()
    );

    for character in report.characters.iter().filter(|c| !c.failed_costumes.is_empty()) {
        let indices: Vec<String> = character.failed_costumes.iter().map(|i| i.to_string()).collect();
        println!("  {}: costumes {} failed", character.name, indices.join(", "));
    }

    Ok(())
}

fn cmd_info(input: &Path, config: Option<&Path>) -> Result<()> {
    check_inputs(input, config)?;

    let mut archive = LpkArchive::open(input).context("Failed to open LPK package")?;
    let manifest = archive.manifest().context("Failed to read package manifest")?;

    println!("Package:   {}", input.display());
    println!("Entries:   {}", archive.entry_count());
    println!("Scheme:    {:?} ({})", manifest.scheme, manifest.scheme);
    println!("Id:        {}", manifest.archive_id);
    println!("Encrypted: {}", manifest.encrypted);

    if let Some(config) = config {
        let secrets = WorkshopSecrets::load(config).context("Failed to read config file")?;
        if let Some(title) = &secrets.title {
            println!("Title:     {title}");
        }
    }

    println!();
    for (index, character) in manifest.characters.iter().enumerate() {
        let name = character.display_name.as_deref().unwrap_or_default();
        println!("Character {}: {}", index + 1, name);

        for (slot, costume) in character.costumes.iter().enumerate() {
            println!("  {:>3} {}", slot, costume.root_reference().unwrap_or("(empty)"));
        }
    }

    println!("\nTotal: {} characters", manifest.characters.len());

    Ok(())
}
