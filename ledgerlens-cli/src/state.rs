use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub fn ledgerlens_home() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".ledgerlens"))
}

pub fn ensure_home() -> Result<PathBuf> {
    let dir = ledgerlens_home()?;
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// Daily chat logs live under `<home>/chat/`
pub fn chat_dir(home: &Path) -> Result<PathBuf> {
    let dir = home.join("chat");
    fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
    Ok(dir)
}

/// `<dir>/<stem>_annotated.csv` next to the input
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "statement".to_string());
    input.with_file_name(format!("{stem}_annotated.csv"))
}
