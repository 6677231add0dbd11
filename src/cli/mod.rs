//! Command-line interface for chansync.
//!
//! Provides commands for running a sync pass, previewing filter verdicts,
//! inspecting stored state and showing the resolved configuration.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};

use crate::adapters::EnvCredentials;
use crate::config::{self, ResolvedConfig, SettingsOverrides};
use crate::core::{ChannelSync, Integration};
use crate::domain::{Change, ChangeSet};
use crate::library::{Library, StateStore};

/// chansync - Mirror a YouTube channel into a local content library
#[derive(Parser, Debug)]
#[command(name = "chansync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (searches for .chansync/config.yaml if not provided)
    #[arg(short, long, global = true, env = "CHANSYNC_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compute the changes for one pass (dry run unless --apply)
    Sync {
        /// Write content to the library and update stored state
        #[arg(long)]
        apply: bool,

        /// Channel ID (overrides config)
        #[arg(long)]
        channel: Option<String>,

        /// Content mode: metadata, thumbnail, transcript, video
        #[arg(short, long)]
        mode: Option<String>,

        /// Never delete previously materialized items
        #[arg(long)]
        no_delete: bool,

        /// Print the change set as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the channel and show which items pass the filter
    Check {
        /// Channel ID (overrides config)
        #[arg(long)]
        channel: Option<String>,
    },

    /// Show tracked identifiers from stored state
    State {
        /// Maximum number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::load_config(self.config.as_deref())?;

        match self.command {
            Commands::Sync {
                apply,
                channel,
                mode,
                no_delete,
                json,
            } => {
                let overrides = SettingsOverrides {
                    channel_id: channel,
                    mode,
                    no_delete,
                };
                run_sync(&cfg, &overrides, apply, json).await
            }
            Commands::Check { channel } => {
                let overrides = SettingsOverrides {
                    channel_id: channel,
                    ..Default::default()
                };
                check_catalog(&cfg, &overrides).await
            }
            Commands::State { limit } => show_state(&cfg, limit),
            Commands::Config => show_config(&cfg),
        }
    }
}

fn build_sync(cfg: &ResolvedConfig, overrides: &SettingsOverrides) -> Result<ChannelSync> {
    let settings = cfg
        .sync_settings(overrides)
        .context("Invalid configuration")?;
    let sync = ChannelSync::initialize(settings, &EnvCredentials)
        .context("Failed to initialize YouTube integration")?;
    Ok(sync)
}

/// Run one pass and optionally apply it
async fn run_sync(
    cfg: &ResolvedConfig,
    overrides: &SettingsOverrides,
    apply: bool,
    json: bool,
) -> Result<()> {
    let sync = build_sync(cfg, overrides)?;
    let store = StateStore::new(cfg.state_path());
    // Held until the pass returns so a concurrent pass cannot interleave
    let guard = store.lock()?;
    let mut state = guard.load()?;

    // The state file is shared, reconcile only this channel and mode
    let prior = sync.scoped_prior(&state);
    let changes = sync.try_compute_updates(&prior, Utc::now()).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&changes)?);
    } else {
        print_changes(&changes);
    }

    if !apply {
        if !changes.is_empty() {
            eprintln!("\n[Dry run: use --apply to write {} change(s)]", changes.len());
        }
        return Ok(());
    }

    // Content first, so a crash never records an id whose file is missing
    let library = Library::new(&cfg.library);
    let summary = library.apply(&changes).await?;

    state.apply(&changes, Utc::now());
    guard.save(&state)?;

    eprintln!(
        "\n[Applied: {} written, {} removed, {} tracked]",
        summary.written,
        summary.removed,
        state.len()
    );

    Ok(())
}

fn print_changes(changes: &ChangeSet) {
    if changes.is_empty() {
        println!("Up to date: no changes");
        return;
    }

    println!("{:<8} {:<60}", "ACTION", "TRACKED ID");
    println!("{}", "-".repeat(70));

    for (id, change) in changes.iter() {
        let action = match change {
            Change::Add { .. } => "add",
            Change::Delete => "delete",
        };
        println!("{:<8} {:<60}", action, id);
    }

    println!(
        "\nTotal: {} to add, {} to delete",
        changes.added_count(),
        changes.deleted_count()
    );
}

/// Preview filter verdicts for every listed item
async fn check_catalog(cfg: &ResolvedConfig, overrides: &SettingsOverrides) -> Result<()> {
    let sync = build_sync(cfg, overrides)?;
    let verdicts = sync.evaluate_catalog(Utc::now()).await?;

    if verdicts.is_empty() {
        println!("Channel {} has no items", sync.settings().channel_id);
        return Ok(());
    }

    println!("{:<14} {:<12} {:>8}  {:<40}", "ID", "PUBLISHED", "SECS", "VERDICT");
    println!("{}", "-".repeat(80));

    let mut passed = 0;
    for (item, verdict) in &verdicts {
        let verdict = match verdict {
            Ok(()) => {
                passed += 1;
                "pass".to_string()
            }
            Err(reason) => format!("skip: {}", reason),
        };
        println!(
            "{:<14} {:<12} {:>8}  {:<40}",
            item.id,
            item.published_at.format("%Y-%m-%d"),
            item.duration_seconds(),
            verdict
        );
    }

    println!("\nTotal: {} of {} items pass", passed, verdicts.len());

    Ok(())
}

/// List tracked identifiers, most recently recorded first
fn show_state(cfg: &ResolvedConfig, limit: usize) -> Result<()> {
    let store = StateStore::new(cfg.state_path());
    let state = store.load()?;

    if state.is_empty() {
        println!("No tracked items. Use 'chansync sync --apply' to materialize a channel.");
        return Ok(());
    }

    let mut entries: Vec<_> = state.iter().collect();
    entries.sort_by(|a, b| b.1.recorded_at.cmp(&a.1.recorded_at));

    println!("{:<20} {:<60}", "RECORDED", "TRACKED ID");
    println!("{}", "-".repeat(80));

    for (id, marker) in entries.iter().take(limit) {
        println!(
            "{:<20} {:<60}",
            marker.recorded_at.format("%Y-%m-%d %H:%M:%S"),
            id
        );
    }

    println!("\nTotal: {} tracked", state.len());

    Ok(())
}

fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    let file = &cfg.file;

    println!("chansync configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home (state):      {}", cfg.home.display());
    println!("  State file:        {}", cfg.state_path().display());
    println!("  Library (content): {}", cfg.library.display());
    println!();
    println!("Sync:");
    println!("  Channel:   {}", file.channel_id.as_deref().unwrap_or("(unset)"));
    println!("  Mode:      {}", file.mode.as_deref().unwrap_or("metadata (default)"));
    println!("  No delete: {}", file.no_delete);
    println!("  Header:    {}", file.include_header);
    println!();
    println!("Filter:");
    let filter = &file.filter;
    println!("  Title pattern: {}", filter.title_pattern.as_deref().unwrap_or("-"));
    println!(
        "  Min duration:  {}",
        filter.duration_greater_than.map(|s| format!("{}s", s)).unwrap_or_else(|| "-".into())
    );
    println!(
        "  Max duration:  {}",
        filter.duration_less_than.map(|s| format!("{}s", s)).unwrap_or_else(|| "-".into())
    );
    println!("  Start date:    {}", filter.start_date.as_deref().unwrap_or("-"));
    println!("  Expire after:  {}", filter.expire_after.as_deref().unwrap_or("-"));

    if let Err(e) = cfg.sync_settings(&SettingsOverrides::default()) {
        println!();
        println!("Warning: {}", e);
    }

    Ok(())
}
