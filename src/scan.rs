//! Receipt folder scanning.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};

/// Image extensions the extraction service accepts.
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "heic"];

/// Collect receipt images from a directory in sorted (file name) order.
/// Phone camera rolls name files chronologically, and the date
/// resolver depends on that ordering.
pub(crate) fn scan_receipts(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        bail!("receipts directory {} does not exist", dir.display());
    }

    let mut images = Vec::new();
    let mut skipped = 0usize;
    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("reading receipts directory {}", dir.display()))?
    {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        if is_supported(&path) {
            images.push(path);
        } else {
            debug!(file = %path.display(), "skipping unsupported file");
            skipped += 1;
        }
    }
    images.sort();

    info!(
        dir = %dir.display(),
        found = images.len(),
        skipped,
        "scanned receipts directory"
    );
    Ok(images)
}

fn is_supported(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_ascii_lowercase();
            SUPPORTED_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}
