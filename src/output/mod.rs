use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::batch::BatchOutcome;
use crate::catalog::TranscriptCatalog;
use crate::transcript::TranscriptContent;

pub mod formatters;

pub use formatters::TranscriptFormatter;

/// Save a transcript to file
pub fn save_to_file(
    content: &TranscriptContent,
    path: &Path,
    formatter: TranscriptFormatter,
) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs_err::create_dir_all(parent)?;
    }

    fs_err::write(path, formatter.format(content))?;
    tracing::info!("Transcript saved to: {}", path.display());
    Ok(())
}

/// Print a transcript to the console
pub fn print_to_console(content: &TranscriptContent, formatter: TranscriptFormatter) {
    println!("{}", formatter.format(content));
}

/// Print a catalog summary followed by one line per track
pub fn print_catalog(catalog: &TranscriptCatalog) {
    println!("{}", catalog);
    println!();
    for transcript in catalog.transcripts() {
        println!("  {}", transcript);
    }
}

/// Write every successful transcript of a batch as `<dir>/<video_id>.<ext>`.
///
/// Returns the written paths in batch order.
pub fn save_batch(
    outcome: &BatchOutcome<TranscriptContent>,
    dir: &Path,
    formatter: TranscriptFormatter,
) -> Result<Vec<PathBuf>> {
    fs_err::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory {}", dir.display()))?;

    let mut written = Vec::new();
    for (video_id, content) in outcome.successes() {
        let path = dir.join(format!("{}.{}", video_id, formatter.extension()));
        fs_err::write(&path, formatter.format(content))?;
        written.push(path);
    }

    tracing::info!("Saved {} transcripts to {}", written.len(), dir.display());
    Ok(written)
}
