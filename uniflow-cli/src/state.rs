use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uniflow_core::TaskBook;

/// `$UNIFLOW_HOME`, or `~/.uniflow`.
pub fn uniflow_home(override_dir: Option<&Path>) -> Result<PathBuf> {
    if let Some(dir) = override_dir {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = std::env::var_os("UNIFLOW_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").context("HOME is not set")?;
    Ok(PathBuf::from(home).join(".uniflow"))
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))
}

pub fn data_path(home: &Path) -> PathBuf {
    home.join("data.json")
}

/// Read the task book. A missing file is an empty book.
pub fn load_book(path: &Path) -> Result<TaskBook> {
    if !path.exists() {
        return Ok(TaskBook::new());
    }
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let book: TaskBook =
        serde_json::from_str(&s).with_context(|| format!("parse {}", path.display()))?;
    for task in book.tasks() {
        task.validate()
            .with_context(|| format!("invalid task {} in {}", task.id, path.display()))?;
    }
    Ok(book)
}

/// Write via a sibling temp file so a crash never leaves half a book behind.
pub fn save_book(path: &Path, book: &TaskBook) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(book)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("replace {}", path.display()))?;
    Ok(())
}
