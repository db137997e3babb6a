use crate::{environment::SearchPath, process};
use anyhow::{Context, Result};
use std::{
    env::consts::{ARCH, OS},
    path::Path,
    time::Duration,
};
use tokio::process::Command;
use tracing::info;

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PlatformError {
    #[error("unsupported architecture: {0}")]
    UnsupportedArch(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Platform {
    pub os: String,
    pub arch: String,
}

impl Platform {
    pub fn new(os: &str, arch: &str) -> Self {
        Self {
            os: os.to_string(),
            arch: arch.to_string(),
        }
    }

    pub fn detect() -> Self {
        Self::new(OS, ARCH)
    }

    pub fn is_linux(&self) -> bool {
        self.os == "linux"
    }

    pub fn musl_target(&self) -> Result<&'static str, PlatformError> {
        match self.arch.as_str() {
            "x86_64" => Ok("x86_64-unknown-linux-musl"),
            "aarch64" => Ok("aarch64-unknown-linux-musl"),
            arch => Err(PlatformError::UnsupportedArch(arch.to_string())),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Prerequisites {
    pub package: String,
    pub install_timeout: Duration,
}

async fn ensure_package(
    package: &str,
    install_timeout: Duration,
    search_path: &SearchPath,
) -> Result<()> {
    let mut status = Command::new("dpkg");
    status.args(["-s", package]);
    search_path.apply(&mut status)?;

    if process::succeeds("dpkg", &mut status).await? {
        info!("package already installed: {}", package);
        return Ok(());
    }

    info!("installing package: {}", package);

    let mut install = Command::new("sudo");
    install.args(["apt-get", "install", "-y", package]);
    search_path.apply(&mut install)?;

    process::run_with_timeout("apt-get", &mut install, install_timeout)
        .await
        .with_context(|| format!("failed to install {}", package))?;

    Ok(())
}

async fn add_rust_target(target: &str, checkout: &Path, search_path: &SearchPath) -> Result<()> {
    info!("adding rust target: {}", target);

    // rustup picks the toolchain pinned by the checkout's toolchain file
    let mut rustup = Command::new("rustup");
    rustup.args(["target", "add", target]).current_dir(checkout);
    search_path.apply(&mut rustup)?;

    process::run("rustup", &mut rustup)
        .await
        .with_context(|| format!("failed to add rust target {}", target))?;

    Ok(())
}

/// Installs the system package and registers the musl cross-target. Does
/// nothing outside Linux.
pub async fn install_prerequisites(
    platform: &Platform,
    prerequisites: &Prerequisites,
    target: &str,
    checkout: &Path,
    search_path: &SearchPath,
) -> Result<()> {
    if !platform.is_linux() {
        info!("skipping prerequisites on {}", platform.os);
        return Ok(());
    }

    ensure_package(
        &prerequisites.package,
        prerequisites.install_timeout,
        search_path,
    )
    .await?;

    add_rust_target(target, checkout, search_path).await
}
