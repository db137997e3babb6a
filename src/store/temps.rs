use crate::store::paths;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Creates a uniquely named directory inside `workdir`. Keeping it next to
/// the final location lets callers `rename` out of it without crossing
/// filesystems.
pub async fn create_dir(workdir: &Path) -> Result<PathBuf> {
    let temp_dir = paths::get_temp(workdir);
    fs::create_dir(&temp_dir).await?;
    Ok(temp_dir)
}
