//! Listing the conflict blocks in a file.

use std::path::Path;

use anyhow::{Context, Result};
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use mergesense_core::conflict::{ConflictExtractor, ConflictRegion};

use super::style;

/// Print a table of the conflict blocks in `path`.
pub fn run_scan(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    if !ConflictExtractor::has_conflict_markers(&text) {
        println!("{}", style::success("No conflict markers found"));
        return Ok(());
    }

    let regions = ConflictExtractor::extract_conflicts(&text);
    if regions.is_empty() {
        println!(
            "{}",
            style::warn("Could not parse conflict markers (blocks are incomplete or out of order)")
        );
        return Ok(());
    }

    println!();
    println!(
        "{}",
        style::header(&format!(
            "{} conflict(s) in {}",
            regions.len(),
            path.display()
        ))
    );
    println!();
    println!("{}", conflict_table(&regions));
    println!();
    println!(
        "{}",
        style::dim(&format!(
            "Resolve one with: mergesense resolve {} --index <#>",
            path.display()
        ))
    );

    Ok(())
}

/// Build the table shown by `scan`. Line numbers are 1-based.
pub fn conflict_table(regions: &[ConflictRegion]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Lines", "Head", "Incoming", "Head lines", "Incoming lines"]);

    for (i, region) in regions.iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(format!("{}-{}", region.start_line + 1, region.end_line + 1)),
            Cell::new(&region.head_branch),
            Cell::new(&region.incoming_branch),
            Cell::new(content_lines(&region.head_content)),
            Cell::new(content_lines(&region.incoming_content)),
        ]);
    }

    table
}

/// Number of lines in one side of a conflict; an empty side has none.
pub fn content_lines(content: &str) -> usize {
    if content.is_empty() {
        0
    } else {
        content.split('\n').count()
    }
}
