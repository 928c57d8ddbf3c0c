use anyhow::Result;
use outreach_core::{target, Target};
use std::path::Path;

const PREVIEW_ROWS: usize = 5;

/// Parse and normalize the target CSV without touching a browser.
pub fn inspect_targets(
    file: &Path,
    url_column: &str,
    name_column: Option<&str>,
) -> outreach_core::Result<Vec<Target>> {
    target::load_targets(file, url_column, name_column)
}

pub fn execute(file: &Path, url_column: &str, name_column: Option<&str>) -> Result<()> {
    tracing::info!("Validating target file: {}", file.display());
    let targets = inspect_targets(file, url_column, name_column)?;

    println!(
        "✅ {} usable targets in {}",
        targets.len(),
        file.display()
    );
    for target in targets.iter().take(PREVIEW_ROWS) {
        println!("  {} ({})", target.profile_url, target.display_name());
    }
    if targets.len() > PREVIEW_ROWS {
        println!("  ... and {} more", targets.len() - PREVIEW_ROWS);
    }

    Ok(())
}
