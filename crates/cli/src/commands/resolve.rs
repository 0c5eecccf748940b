//! Resolving one conflict block in a file.
//!
//! Sends the block to the AI workflow, shows the normalized result, and then
//! applies head, incoming, or the AI merge depending on flags or the user's
//! choice.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use mergesense_core::confidence::{auto_apply_recommended, status_message};
use mergesense_core::config::AppConfig;
use mergesense_core::conflict::{ConflictExtractor, ConflictRegion, ConflictResolver, Resolution};
use mergesense_core::response::{ConflictResult, ResolutionStatus};
use mergesense_core::webhook::{WebhookClient, DEFAULT_FILE_NAME};

use super::style;

/// Side selected with `--accept`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AcceptArg {
    Head,
    Incoming,
    Ai,
}

impl From<AcceptArg> for Resolution {
    fn from(arg: AcceptArg) -> Self {
        match arg {
            AcceptArg::Head => Resolution::AcceptHead,
            AcceptArg::Incoming => Resolution::AcceptIncoming,
            AcceptArg::Ai => Resolution::AcceptMerged,
        }
    }
}

/// Flags of the `resolve` subcommand.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    /// 1-based block index.
    pub index: usize,
    pub accept: Option<AcceptArg>,
    pub auto_apply: bool,
    pub no_save: bool,
    pub json: bool,
}

/// What to do once the AI result is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Apply(Resolution),
    Prompt,
    Leave,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_resolve(path: &Path, config: &AppConfig, opts: &ResolveOptions) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if !ConflictExtractor::has_conflict_markers(&text) {
        println!("{}", style::success("No conflict markers found"));
        return Ok(());
    }

    let regions = ConflictExtractor::extract_conflicts(&text);
    if regions.is_empty() {
        anyhow::bail!(
            "could not parse conflict markers in {} (blocks are incomplete or out of order)",
            path.display()
        );
    }
    let region = select_region(&regions, opts.index)?;

    // Taking one side needs no AI round trip.
    if let Some(accept @ (AcceptArg::Head | AcceptArg::Incoming)) = opts.accept {
        return apply(path, &text, region, accept.into(), None, opts.no_save);
    }

    config.validate().context("configuration is incomplete")?;
    let client = WebhookClient::new(&config.webhook).context("failed to create webhook client")?;
    let normalizer = config.normalizer();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")?
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.set_message(format!("Resolving conflict {} with AI...", opts.index));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let outcome = client
        .resolve(&file_name, &region.full_conflict, &normalizer)
        .await;
    spinner.finish_and_clear();
    let result = outcome.context("AI resolution failed")?;

    if opts.json {
        let json = serde_json::to_string_pretty(&result).context("failed to serialize result")?;
        println!("{}", json);
        return Ok(());
    }

    print_result(&result);

    let threshold = config.resolver.high_confidence_threshold;
    let auto_apply = opts.auto_apply || config.resolver.auto_apply;
    let interactive = console::Term::stdout().is_term();

    let resolution = match decide(opts.accept, auto_apply, &result, threshold, interactive) {
        Decision::Apply(resolution) => Some(resolution),
        Decision::Prompt => prompt(region, &result)?,
        Decision::Leave => None,
    };

    match resolution {
        Some(resolution) => apply(path, &text, region, resolution, Some(&result), opts.no_save),
        None => {
            println!("{}", style::dim("File left unchanged."));
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn select_region(regions: &[ConflictRegion], index: usize) -> Result<&ConflictRegion> {
    if index == 0 || index > regions.len() {
        anyhow::bail!(
            "conflict index {} is out of range (file has {} conflict(s))",
            index,
            regions.len()
        );
    }
    Ok(&regions[index - 1])
}

fn decide(
    accept: Option<AcceptArg>,
    auto_apply: bool,
    result: &ConflictResult,
    threshold: f64,
    interactive: bool,
) -> Decision {
    if let Some(accept) = accept {
        return Decision::Apply(accept.into());
    }
    if auto_apply {
        if auto_apply_recommended(result, threshold) {
            return Decision::Apply(Resolution::AcceptMerged);
        }
        println!(
            "{}",
            style::warn("Confidence is below the auto-apply threshold; not applying automatically")
        );
    }
    if interactive {
        Decision::Prompt
    } else {
        Decision::Leave
    }
}

fn print_result(result: &ConflictResult) {
    println!();
    println!(
        "{} {}",
        style::status_line(result, &status_message(result)),
        style::confidence_badge(result.confidence)
    );
    println!();
    println!("{}", style::header("Explanation"));
    println!("  {}", result.explanation);

    if result.has_merged_code() {
        println!();
        println!("{}", style::header("Merged code"));
        println!("{}", style::dim(&"-".repeat(40)));
        println!("{}", result.merged_code);
        println!("{}", style::dim(&"-".repeat(40)));
    }
    println!();
}

fn prompt(region: &ConflictRegion, result: &ConflictResult) -> Result<Option<Resolution>> {
    let mut items = vec![
        format!("Accept HEAD ({})", region.head_branch),
        format!("Accept Incoming ({})", region.incoming_branch),
    ];
    let mut choices = vec![Some(Resolution::AcceptHead), Some(Resolution::AcceptIncoming)];

    let ai_offered =
        ConflictResolver::resolved_content(Resolution::AcceptMerged, region, Some(result)).is_some();
    if ai_offered {
        items.push("Accept AI merge".to_string());
        choices.push(Some(Resolution::AcceptMerged));
    }
    items.push("Leave file unchanged".to_string());
    choices.push(None);

    let default = if ai_offered && result.status == ResolutionStatus::Success {
        2
    } else {
        items.len() - 1
    };
    let selection = Select::new()
        .with_prompt("How do you want to resolve this conflict?")
        .items(&items)
        .default(default)
        .interact()
        .context("failed to read selection")?;

    debug!(selection, "resolution selected");
    Ok(choices[selection])
}

fn apply(
    path: &Path,
    text: &str,
    region: &ConflictRegion,
    resolution: Resolution,
    result: Option<&ConflictResult>,
    no_save: bool,
) -> Result<()> {
    let updated = ConflictResolver::apply(text, region, resolution, result)
        .context("failed to apply resolution")?;

    if no_save {
        print!("{}", updated);
        return Ok(());
    }

    std::fs::write(path, &updated)
        .with_context(|| format!("failed to write {}", path.display()))?;
    println!(
        "{}",
        style::success(&format!(
            "Applied {} to lines {}-{} of {}",
            resolution,
            region.start_line + 1,
            region.end_line + 1,
            path.display()
        ))
    );
    Ok(())
}
