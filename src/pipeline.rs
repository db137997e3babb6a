use crate::{
    artifact::{self, StagedToolchain},
    build,
    config::Config,
    environment::SearchPath,
    patch, source,
    system::{self, Platform},
};
use anyhow::Result;
use tracing::info;

/// Result of a completed run, mostly useful to callers that keep going.
#[derive(Clone, Debug)]
pub struct Staged {
    pub checkout: source::Checkout,
    pub toolchain: StagedToolchain,
    pub search_path: SearchPath,
    pub patched: usize,
}

pub struct Pipeline {
    config: Config,
    platform: Platform,
}

impl Pipeline {
    pub fn new(config: Config) -> Self {
        Self::with_platform(config, Platform::detect())
    }

    pub fn with_platform(config: Config, platform: Platform) -> Self {
        Self { config, platform }
    }

    /// Runs every step in order and stops at the first failure. Nothing is
    /// rolled back: a failed run may leave a checkout or toolchain behind.
    pub async fn run(&self) -> Result<Staged> {
        let config = &self.config;

        info!(
            "platform: {}-{}, release tag: {}",
            self.platform.arch, self.platform.os, config.release_tag
        );

        let target = self.platform.musl_target()?;

        let checkout =
            source::checkout(&config.repository, &config.release_tag, &config.checkout)?;

        let search_path = SearchPath::from_env();

        if config.skip_prerequisites {
            info!("skipping prerequisites");
        } else {
            system::install_prerequisites(
                &self.platform,
                &config.prerequisites,
                target,
                &checkout.path,
                &search_path,
            )
            .await?;
        }

        let toolchain =
            artifact::stage(&config.artifacts, &config.pattern, &config.workdir).await?;

        let search_path = search_path.prepend(&toolchain.path);

        build::verify_compiler(&search_path, &config.workdir).await?;

        let (from, to) = patch::musl_release_output(target);

        let patched = patch::patch_files(&config.patch_files, &from, &to).await?;

        info!("patched files: {}/{}", patched, config.patch_files.len());

        if config.skip_build {
            info!("skipping build");
        } else {
            build::run(&checkout.path, &search_path).await?;
        }

        Ok(Staged {
            checkout,
            toolchain,
            search_path,
            patched,
        })
    }
}
