use anyhow::{bail, Context, Result};
use std::path::Path;
use tokio::fs::{read_to_string, write};
use tracing::{debug, info};

pub const RELEASE_OUTPUT: &str = "target/release";

/// The substitution pointing build descriptors at the musl output directory
/// of `target`.
pub fn musl_release_output(target: &str) -> (String, String) {
    (
        RELEASE_OUTPUT.to_string(),
        format!("target/{}/release", target),
    )
}

fn check_substitution(from: &str, to: &str) -> Result<()> {
    if from.is_empty() {
        bail!("substitution fragment is empty");
    }

    if to.contains(from) {
        bail!("replacement '{}' reintroduces '{}'", to, from);
    }

    Ok(())
}

/// Replaces every `from` in the file with `to`. Returns whether the file
/// changed; a file without `from` is left alone.
pub async fn patch_file(path: &Path, from: &str, to: &str) -> Result<bool> {
    check_substitution(from, to)?;

    let content = read_to_string(path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;

    let patched = content.replace(from, to);

    if patched == content {
        debug!("nothing to patch in {}", path.display());
        return Ok(false);
    }

    // overlapping matches could leave a fresh occurrence behind
    if patched.contains(from) {
        bail!(
            "patching {} is not idempotent: '{}' still present",
            path.display(),
            from
        );
    }

    write(path, patched)
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    info!("patched {}: {} -> {}", path.display(), from, to);

    Ok(true)
}

/// Applies [`patch_file`] to each file, returning how many changed.
pub async fn patch_files<P: AsRef<Path>>(files: &[P], from: &str, to: &str) -> Result<usize> {
    check_substitution(from, to)?;

    let mut changed = 0;

    for file in files {
        if patch_file(file.as_ref(), from, to).await? {
            changed += 1;
        }
    }

    Ok(changed)
}
