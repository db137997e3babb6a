use crate::store::{archives, hashes, paths, temps};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs::{copy, read_dir, remove_dir, remove_dir_all, remove_file, rename};
use tracing::{info, warn};
use walkdir::WalkDir;

/// Every nightly artifact name contains this, whatever its platform.
pub const ARTIFACT_PREFIX: &str = "roc_nightly";

#[derive(thiserror::Error, Debug)]
pub enum SelectError {
    #[error("failed to read artifact directory {}: {source}", dir.display())]
    Directory {
        dir: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("no artifact in {} matches '{pattern}'", dir.display())]
    NoMatch { dir: PathBuf, pattern: String },

    #[error("artifact pattern '{pattern}' is ambiguous, {} matches: {}", matches.len(), matches.join(", "))]
    Ambiguous {
        pattern: String,
        matches: Vec<String>,
    },
}

/// The unpacked compiler under its canonical name.
#[derive(Clone, Debug)]
pub struct StagedToolchain {
    pub path: PathBuf,
    pub digest: String,
}

fn is_candidate(name: &str, pattern: &str) -> bool {
    name.contains(ARTIFACT_PREFIX)
        && name.ends_with(&format!(".{}", paths::ARCHIVE_EXTENSION))
        && name.contains(pattern)
}

/// Finds the single archive in `dir` whose name matches `pattern`.
pub fn select(dir: &Path, pattern: &str) -> Result<PathBuf, SelectError> {
    let mut matches = vec![];

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| SelectError::Directory {
            dir: dir.to_path_buf(),
            source,
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry.file_name().to_str() else {
            continue;
        };

        if is_candidate(name, pattern) {
            matches.push(entry.into_path());
        }
    }

    match matches.len() {
        0 => Err(SelectError::NoMatch {
            dir: dir.to_path_buf(),
            pattern: pattern.to_string(),
        }),
        1 => Ok(matches.remove(0)),
        _ => Err(SelectError::Ambiguous {
            pattern: pattern.to_string(),
            matches: matches
                .iter()
                .filter_map(|path| path.file_name())
                .map(|name| name.to_string_lossy().to_string())
                .collect(),
        }),
    }
}

async fn move_file(source: &Path, target: &Path) -> Result<()> {
    if rename(source, target).await.is_ok() {
        return Ok(());
    }

    // rename fails across filesystems
    copy(source, target)
        .await
        .with_context(|| format!("failed to copy {}", source.display()))?;

    remove_file(source)
        .await
        .with_context(|| format!("failed to remove {}", source.display()))
}

async fn single_directory(dir: &Path) -> Result<Option<PathBuf>> {
    let mut entries = read_dir(dir).await?;
    let mut found = vec![];

    while let Some(entry) = entries.next_entry().await? {
        found.push(entry);
    }

    if let [entry] = found.as_slice() {
        if entry.file_type().await?.is_dir() {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}

/// Moves the matching artifact out of `artifacts`, unpacks it in `workdir`
/// and leaves the result at `<workdir>/roc_nightly`.
///
/// An archive with a single top-level directory has that directory renamed;
/// a flat archive is renamed as a whole. A toolchain left by an earlier run
/// is replaced.
pub async fn stage(artifacts: &Path, pattern: &str, workdir: &Path) -> Result<StagedToolchain> {
    let artifact = select(artifacts, pattern)?;

    let digest = hashes::get_file(&artifact)?;

    info!("artifact selected: {} ({})", artifact.display(), digest);

    archives::check_tar_gz(&artifact)?;

    let archive_path = paths::get_archive(workdir);

    move_file(&artifact, &archive_path).await?;

    let unpack_path = temps::create_dir(workdir).await?;

    archives::unpack_tar_gz(&unpack_path, &archive_path).await?;

    remove_file(&archive_path)
        .await
        .with_context(|| format!("failed to remove {}", archive_path.display()))?;

    let toolchain_path = paths::get_toolchain(workdir);

    if toolchain_path.exists() {
        warn!("replacing existing toolchain: {}", toolchain_path.display());

        remove_dir_all(&toolchain_path)
            .await
            .with_context(|| format!("failed to remove {}", toolchain_path.display()))?;
    }

    match single_directory(&unpack_path).await? {
        Some(unpacked) => {
            rename(&unpacked, &toolchain_path).await?;
            remove_dir(&unpack_path).await?;
        }
        None => rename(&unpack_path, &toolchain_path).await?,
    }

    let path = toolchain_path
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", toolchain_path.display()))?;

    info!("toolchain staged: {}", path.display());

    Ok(StagedToolchain { path, digest })
}
