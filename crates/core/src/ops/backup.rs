//! Snapshot every collection to `<data_dir>/backups/<timestamp>/` and keep
//! only the newest few.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::store::{ContentStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackupInfo {
    pub name: String,
    pub dir: PathBuf,
    pub files: usize,
    pub pruned: usize,
}

pub fn backups_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("backups")
}

pub async fn create(store: &ContentStore, keep: usize) -> Result<BackupInfo, StoreError> {
    let root = backups_dir(store.data_dir());
    // Millisecond stamp sorts lexically in time order.
    let mut name = Utc::now().format("%Y%m%d-%H%M%S%3f").to_string();
    let mut suffix = 1;
    while tokio::fs::try_exists(root.join(&name)).await? {
        suffix += 1;
        name = format!("{}-{suffix}", Utc::now().format("%Y%m%d-%H%M%S%3f"));
    }
    let dir = root.join(&name);
    let files = store.export_all(&dir).await?;
    let pruned = prune(&root, keep).await?;
    tracing::info!(backup = %name, files, pruned, "backup created");
    Ok(BackupInfo { name, dir, files, pruned })
}

/// Backup names, newest first.
pub async fn list(data_dir: &Path) -> Result<Vec<String>, StoreError> {
    let mut names = names(&backups_dir(data_dir)).await?;
    names.reverse();
    Ok(names)
}

async fn names(root: &Path) -> Result<Vec<String>, StoreError> {
    let mut entries = match tokio::fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_owned());
            }
        }
    }
    names.sort();
    Ok(names)
}

async fn prune(root: &Path, keep: usize) -> Result<usize, StoreError> {
    let names = names(root).await?;
    let excess = names.len().saturating_sub(keep.max(1));
    for name in &names[..excess] {
        tokio::fs::remove_dir_all(root.join(name)).await?;
    }
    Ok(excess)
}
