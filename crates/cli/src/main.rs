//! MergeSense command-line tool.
//!
//! Provides subcommands for generating and validating configuration,
//! scanning files for conflict markers, resolving conflicts through the AI
//! workflow, and normalizing saved workflow payloads.

mod commands;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use tracing_subscriber::EnvFilter;

use mergesense_core::config::{AppConfig, ConfigOverrides, CONFIG_TEMPLATE};

use commands::resolve::{AcceptArg, ResolveOptions};
use commands::style;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// MergeSense command-line tool.
#[derive(Parser, Debug)]
#[command(
    name = "mergesense",
    version,
    about = "Resolve Git merge conflicts with an AI workflow"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(
        short,
        long,
        global = true,
        default_value = "~/.config/mergesense/config.toml"
    )]
    config: String,

    /// Webhook URL (overrides the config file).
    #[arg(long, global = true)]
    webhook_url: Option<String>,

    /// Bearer API key for the webhook (overrides the config file).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Request timeout in milliseconds (overrides the config file).
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a default configuration file.
    Init {
        /// Output path for the generated config file (defaults to --config).
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate the configuration.
    Validate,

    /// List the conflict blocks in a file.
    Scan {
        /// File containing conflict markers.
        file: PathBuf,
    },

    /// Resolve one conflict block with the AI workflow.
    Resolve {
        /// File containing conflict markers.
        file: PathBuf,

        /// Which conflict to resolve (1-based, as listed by `scan`).
        #[arg(short, long, default_value = "1")]
        index: usize,

        /// Apply a side without prompting.
        #[arg(long, value_enum)]
        accept: Option<AcceptArg>,

        /// Apply the AI merge when it is high confidence.
        #[arg(long)]
        auto_apply: bool,

        /// Print the resolved file instead of writing it.
        #[arg(long)]
        no_save: bool,

        /// Print the normalized result as JSON and apply nothing.
        #[arg(long, conflicts_with_all = ["accept", "auto_apply"])]
        json: bool,
    },

    /// Normalize a saved workflow payload.
    Normalize {
        /// Payload file, or `-` for stdin.
        #[arg(default_value = "-")]
        source: String,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Minimal logging for CLI
    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = PathBuf::from(expand_tilde(&cli.config));
    let overrides = ConfigOverrides {
        webhook_url: cli.webhook_url.clone(),
        api_key: cli.api_key.clone(),
        timeout_ms: cli.timeout_ms,
    };

    match cli.command {
        Commands::Init { output } => {
            let output = output
                .map(|o| PathBuf::from(expand_tilde(&o)))
                .unwrap_or(config_path);
            cmd_init(&output, overrides.webhook_url.as_deref())
        }
        Commands::Validate => cmd_validate(&config_path, &overrides),
        Commands::Scan { file } => commands::scan::run_scan(&file),
        Commands::Resolve {
            file,
            index,
            accept,
            auto_apply,
            no_save,
            json,
        } => {
            let config = load_config(&config_path, &overrides)?;
            let opts = ResolveOptions {
                index,
                accept,
                auto_apply,
                no_save,
                json,
            };
            commands::resolve::run_resolve(&file, &config, &opts).await
        }
        Commands::Normalize { source } => {
            let config = load_config(&config_path, &overrides)?;
            commands::normalize::run_normalize(&source, &config.normalizer())
        }
    }
}

// ---------------------------------------------------------------------------
// Config helpers
// ---------------------------------------------------------------------------

/// Load the config file if present, then apply the environment and flags.
fn load_config(path: &Path, overrides: &ConfigOverrides) -> Result<AppConfig> {
    let mut config =
        AppConfig::load_or_default(path).context("failed to load configuration file")?;
    config.apply_overrides(overrides);
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    Ok(config)
}

/// Expand `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}

/// Escape a string for safe inclusion inside a TOML double-quoted value.
fn escape_toml_string(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '"' => escaped.push_str("\\\""),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\t' => escaped.push_str("\\t"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// The starter config, with the webhook URL replaced when one was given.
fn render_template(webhook_url: Option<&str>) -> String {
    match webhook_url {
        Some(url) => CONFIG_TEMPLATE.replace(
            "url = \"http://localhost:5678/webhook/git/conflict/resolve\"",
            &format!("url = \"{}\"", escape_toml_string(url)),
        ),
        None => CONFIG_TEMPLATE.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_init(output: &Path, webhook_url: Option<&str>) -> Result<()> {
    if output.exists() {
        let overwrite = console::Term::stdout().is_term()
            && Confirm::new()
                .with_prompt(format!("{} already exists. Overwrite?", output.display()))
                .default(false)
                .interact()
                .context("failed to read confirmation")?;

        if !overwrite {
            anyhow::bail!(
                "file already exists: {}. Use a different path or remove the existing file.",
                output.display()
            );
        }
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, render_template(webhook_url)).context("failed to write config file")?;

    println!(
        "{}",
        style::success(&format!("Default configuration written to {}", output.display()))
    );
    println!();
    println!("{}", style::header("Next steps:"));
    println!("  1. Set webhook.url, or export N8N_WEBHOOK_URL");
    println!("  2. Optionally export MERGESENSE_API_KEY for bearer authentication");
    println!(
        "  3. Validate with: mergesense validate --config {}",
        output.display()
    );

    Ok(())
}

fn cmd_validate(config_path: &Path, overrides: &ConfigOverrides) -> Result<()> {
    println!("Validating configuration: {}", config_path.display());
    println!();

    let mut config =
        AppConfig::load_from_file(config_path).context("failed to parse configuration")?;

    // Check structure
    println!("  [OK] TOML structure is valid");

    // Resolve env vars (non-fatal warnings)
    config.apply_overrides(overrides);
    config
        .resolve_env_vars()
        .context("failed to resolve environment variables")?;
    println!("  [OK] Environment variable references processed");

    // Validate values
    match config.validate() {
        Ok(()) => {
            println!("  [OK] All required fields are valid");
        }
        Err(e) => {
            println!("  [FAIL] Validation error: {}", e);
            anyhow::bail!("configuration validation failed");
        }
    }

    // Summary
    println!();
    println!("Configuration summary:");
    println!("  Webhook URL    : {}", config.webhook.url);
    println!(
        "  API key        : {}",
        if config.webhook.api_key.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!("  Timeout        : {}ms", config.webhook.timeout_ms);
    println!(
        "  High confidence: {}",
        config.resolver.high_confidence_threshold
    );
    println!("  Auto-apply     : {}", config.resolver.auto_apply);
    println!("  Web listen     : {}", config.web.listen);
    println!("  Log level      : {}", config.logging.level);
    println!();
    println!("Configuration is valid.");

    Ok(())
}
