use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context as _, Result};
use chrono::Utc;

use crate::models::Community;

fn stem(input: &Path) -> String {
    input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "community".to_string())
}

/// `<stem>_disentangled_<timestamp>.json` next to `input`, with a counter
/// appended when that name is already taken.
pub fn get_output_path(input: &Path) -> PathBuf {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let directory = input.parent().unwrap_or_else(|| Path::new(""));
    let stem = stem(input);

    let mut counter = 0;
    let mut path = directory.join(format!("{stem}_disentangled_{timestamp}.json"));

    while path.exists() {
        counter += 1;
        path = directory.join(format!("{stem}_disentangled_{timestamp}_({counter}).json"));
    }

    path
}

/// `<stem>_validation.json` next to `input`.
pub fn get_report_path(input: &Path) -> PathBuf {
    input
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{}_validation.json", stem(input)))
}

pub fn load_community(path: &Path) -> Result<Community> {
    let raw = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let community = serde_json::from_str(&raw).with_context(|| format!("Invalid community JSON in {}", path.display()))?;
    Ok(community)
}

pub fn save_community(community: &Community, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(community)?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
