use crate::{environment::SearchPath, process};
use anyhow::{Context, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::info;

pub const COMPILER: &str = "roc";

pub const BOOTSTRAP_SCRIPT: &str = "jump-start.sh";

pub const BUILD_FILE: &str = "build.roc";

/// Runs `roc version` through the search path, failing if the staged
/// compiler cannot be executed on this machine.
pub async fn verify_compiler(search_path: &SearchPath, workdir: &Path) -> Result<()> {
    let mut version = Command::new(COMPILER);
    version.arg("version").current_dir(workdir);
    search_path.apply(&mut version)?;

    process::run("roc version", &mut version)
        .await
        .context("staged compiler is not runnable")?;

    Ok(())
}

/// Bootstraps the checkout and builds it against the prebuilt platform.
pub async fn run(checkout: &Path, search_path: &SearchPath) -> Result<()> {
    info!("bootstrapping: {}", checkout.display());

    let mut bootstrap = Command::new(checkout.join(BOOTSTRAP_SCRIPT));
    bootstrap.current_dir(checkout);
    search_path.apply(&mut bootstrap)?;

    process::run(BOOTSTRAP_SCRIPT, &mut bootstrap).await?;

    info!("building: {}", checkout.join(BUILD_FILE).display());

    let mut build = Command::new(COMPILER);
    build
        .args([BUILD_FILE, "--prebuilt-platform"])
        .current_dir(checkout);
    search_path.apply(&mut build)?;

    process::run("roc build", &mut build).await?;

    Ok(())
}
