// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Pipe CLI
//!
//! Offline tooling for blueprint authors and operators: inspect clipboards,
//! hash and sign blueprints, verify requisitions against the persisted
//! composer limits, and manage those limits.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use pipe_app_core::config::ConfigService;
use pipe_config_fs::FsConfigStore;
use pipe_core::{make_address, Blueprint, Clipboard, Composer, PublisherKey, Requisition};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Pipe blueprint tooling")]
struct Args {
    /// Config directory (defaults to the platform config dir)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Decode a hex clipboard and list its pastes
    DecodeClipboard {
        /// Clipboard bytes as hex (0x prefix optional)
        hex: String,
    },
    /// Print the canonical hash of a blueprint JSON file
    HashBlueprint {
        /// Blueprint JSON file
        path: PathBuf,
    },
    /// Sign a blueprint JSON file and print the requisition JSON
    SignBlueprint {
        /// Blueprint JSON file
        path: PathBuf,
        /// 32-byte publisher seed as hex
        #[arg(long)]
        seed: String,
    },
    /// Verify a requisition JSON file and check it fits the composer limits
    Verify {
        /// Requisition JSON file
        path: PathBuf,
    },
    /// Show or update persisted composer limits
    Config {
        /// New maximum calls per batch
        #[arg(long)]
        max_calls: Option<usize>,
        /// New maximum pastes per call
        #[arg(long)]
        max_pastes: Option<usize>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .init();

    let mut out = std::io::stdout().lock();
    match args.cmd {
        Command::DecodeClipboard { hex } => decode_clipboard(&mut out, &hex),
        Command::HashBlueprint { path } => {
            let blueprint: Blueprint = read_json(&path)?;
            writeln!(out, "0x{}", blueprint.hash())?;
            Ok(())
        }
        Command::SignBlueprint { path, seed } => {
            let blueprint: Blueprint = read_json(&path)?;
            let key = PublisherKey::from_seed(&parse_seed(&seed)?);
            let requisition = Requisition::sign(blueprint, &key);
            info!(publisher = %requisition.publisher, hash = %requisition.blueprint_hash, "signed");
            serde_json::to_writer_pretty(&mut out, &requisition)?;
            writeln!(out)?;
            Ok(())
        }
        Command::Verify { path } => verify(&mut out, args.config_dir, &path),
        Command::Config {
            max_calls,
            max_pastes,
        } => config(&mut out, args.config_dir, max_calls, max_pastes),
    }
}

fn decode_clipboard(out: &mut impl Write, text: &str) -> Result<()> {
    let bytes = hex::decode(text.trim().trim_start_matches("0x")).context("clipboard is not hex")?;
    let clipboard = Clipboard::decode(&bytes).map_err(|err| anyhow!("clipboard rejected: {err}"))?;
    writeln!(out, "type: {:?}", clipboard.kind())?;
    if let Some(value) = clipboard.attached_value() {
        writeln!(out, "value: {value}")?;
    }
    for (i, paste) in clipboard.pastes().iter().enumerate() {
        writeln!(
            out,
            "paste {i}: {} bytes from {}@{} to calldata@{}",
            paste.length(),
            paste.source(),
            paste.source_offset(),
            paste.dest_offset()
        )?;
    }
    Ok(())
}

fn config_service(dir: Option<PathBuf>) -> Result<ConfigService<FsConfigStore>> {
    let store = match dir {
        Some(dir) => FsConfigStore::at(&dir)?,
        None => FsConfigStore::new()?,
    };
    debug!(base = %store.base().display(), "config store");
    Ok(ConfigService::new(store))
}

fn verify(out: &mut impl Write, dir: Option<PathBuf>, path: &Path) -> Result<()> {
    let requisition: Requisition = read_json(path)?;
    requisition
        .verify()
        .map_err(|err| anyhow!("requisition invalid: {err}"))?;
    let config = config_service(dir)?.composer_config()?;
    let composer = Composer::with_config(make_address("pipe:composer"), config);
    composer
        .preflight(&requisition.blueprint.calls)
        .map_err(|err| anyhow!("requisition exceeds composer limits: {err}"))?;
    writeln!(out, "ok {} by {}", requisition.blueprint_hash, requisition.publisher)?;
    Ok(())
}

fn config(
    out: &mut impl Write,
    dir: Option<PathBuf>,
    max_calls: Option<usize>,
    max_pastes: Option<usize>,
) -> Result<()> {
    let service = config_service(dir)?;
    let mut config = service.composer_config()?;
    if max_calls.is_some() || max_pastes.is_some() {
        config.max_calls = max_calls.unwrap_or(config.max_calls);
        config.max_pastes_per_call = max_pastes.unwrap_or(config.max_pastes_per_call);
        if config.max_calls == 0 || config.max_pastes_per_call == 0 {
            bail!("limits must be non-zero");
        }
        service.save_composer_config(&config)?;
        info!(?config, "composer config saved");
    }
    writeln!(out, "max_calls: {}", config.max_calls)?;
    writeln!(out, "max_pastes_per_call: {}", config.max_pastes_per_call)?;
    Ok(())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("parse {}", path.display()))
}

fn parse_seed(text: &str) -> Result<[u8; 32]> {
    let mut seed = [0u8; 32];
    hex::decode_to_slice(text.trim_start_matches("0x"), &mut seed)
        .context("seed must be 32 bytes of hex")?;
    Ok(seed)
}
