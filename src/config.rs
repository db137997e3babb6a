use crate::system::Prerequisites;
use anyhow::{bail, Context, Result};
use clap::Args;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};

pub const DEFAULT_REPOSITORY: &str = "https://github.com/roc-lang/basic-cli.git";

#[derive(Args, Clone, Debug)]
pub struct StageArgs {
    /// Substring selecting the nightly artifact, e.g. `linux-x86_64`
    pub pattern: String,

    /// Tag of the companion repository to build
    #[arg(env = "RELEASE_TAG", long)]
    pub release_tag: String,

    #[arg(default_value = DEFAULT_REPOSITORY, long)]
    pub repository: String,

    #[arg(default_value = ".", long)]
    pub workdir: PathBuf,

    /// Directory holding the nightly artifacts [default: <workdir>/artifact]
    #[arg(long)]
    pub artifacts: Option<PathBuf>,

    /// Where the companion repository is cloned [default: <workdir>/basic-cli]
    #[arg(long)]
    pub checkout: Option<PathBuf>,

    #[arg(default_value = "musl-tools", long)]
    pub package: String,

    /// Seconds to wait for the package install
    #[arg(default_value_t = 300, long)]
    pub install_timeout: u64,

    /// Checkout-relative files rewritten to the musl output directory
    #[arg(default_values = ["build.roc", "jump-start.sh"], long = "patch-file")]
    pub patch_files: Vec<PathBuf>,

    #[arg(default_value_t = false, long)]
    pub skip_prerequisites: bool,

    #[arg(default_value_t = false, long)]
    pub skip_build: bool,
}

/// Resolved pipeline settings. All paths are absolute.
#[derive(Clone, Debug)]
pub struct Config {
    pub pattern: String,
    pub release_tag: String,
    pub repository: String,
    pub workdir: PathBuf,
    pub artifacts: PathBuf,
    pub checkout: PathBuf,
    pub prerequisites: Prerequisites,
    pub patch_files: Vec<PathBuf>,
    pub skip_prerequisites: bool,
    pub skip_build: bool,
}

fn resolve(workdir: &Path, path: Option<PathBuf>, default: &str) -> PathBuf {
    match path {
        Some(path) if path.is_absolute() => path,
        Some(path) => workdir.join(path),
        None => workdir.join(default),
    }
}

impl StageArgs {
    pub fn into_config(self) -> Result<Config> {
        if self.pattern.trim().is_empty() {
            bail!("artifact pattern is empty");
        }

        if self.release_tag.trim().is_empty() {
            bail!("release tag is empty");
        }

        if self.patch_files.is_empty() {
            bail!("no files to patch");
        }

        let workdir = self
            .workdir
            .canonicalize()
            .with_context(|| format!("workdir not found: {}", self.workdir.display()))?;

        let artifacts = resolve(&workdir, self.artifacts, "artifact");
        let checkout = resolve(&workdir, self.checkout, "basic-cli");

        let patch_files = self
            .patch_files
            .iter()
            .map(|file| checkout.join(file))
            .collect();

        Ok(Config {
            pattern: self.pattern,
            release_tag: self.release_tag,
            repository: self.repository,
            workdir,
            artifacts,
            checkout,
            prerequisites: Prerequisites {
                package: self.package,
                install_timeout: Duration::from_secs(self.install_timeout),
            },
            patch_files,
            skip_prerequisites: self.skip_prerequisites,
            skip_build: self.skip_build,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct TestCli {
        #[command(flatten)]
        stage: StageArgs,
    }

    fn parse(args: &[&str]) -> StageArgs {
        TestCli::try_parse_from(std::iter::once("roc-stage").chain(args.iter().copied()))
            .unwrap()
            .stage
    }

    #[test]
    fn defaults_resolve_against_workdir() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().to_str().unwrap();

        let config = parse(&[
            "linux-x86_64",
            "--release-tag",
            "release-1.2.3",
            "--workdir",
            workdir,
        ])
        .into_config()
        .unwrap();

        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.pattern, "linux-x86_64");
        assert_eq!(config.release_tag, "release-1.2.3");
        assert_eq!(config.repository, DEFAULT_REPOSITORY);
        assert_eq!(config.artifacts, root.join("artifact"));
        assert_eq!(config.checkout, root.join("basic-cli"));
        assert_eq!(
            config.patch_files,
            vec![
                root.join("basic-cli/build.roc"),
                root.join("basic-cli/jump-start.sh")
            ]
        );
        assert_eq!(config.prerequisites.package, "musl-tools");
        assert_eq!(
            config.prerequisites.install_timeout,
            Duration::from_secs(300)
        );
        assert!(!config.skip_prerequisites);
        assert!(!config.skip_build);
    }

    #[test]
    fn explicit_paths_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let workdir = dir.path().to_str().unwrap();

        let config = parse(&[
            "macos-apple-silicon",
            "--release-tag",
            "release-1.2.3",
            "--workdir",
            workdir,
            "--artifacts",
            "/srv/artifacts",
            "--checkout",
            "deps/basic-cli",
            "--patch-file",
            "ci/build.roc",
            "--skip-build",
        ])
        .into_config()
        .unwrap();

        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.artifacts, PathBuf::from("/srv/artifacts"));
        assert_eq!(config.checkout, root.join("deps/basic-cli"));
        assert_eq!(
            config.patch_files,
            vec![root.join("deps/basic-cli/ci/build.roc")]
        );
        assert!(config.skip_build);
    }

    #[test]
    fn empty_pattern_is_rejected() {
        let err = parse(&["", "--release-tag", "release-1.2.3"])
            .into_config()
            .unwrap_err();

        assert_eq!(err.to_string(), "artifact pattern is empty");
    }

    #[test]
    fn missing_workdir_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let err = parse(&[
            "linux-x86_64",
            "--release-tag",
            "release-1.2.3",
            "--workdir",
            missing.to_str().unwrap(),
        ])
        .into_config()
        .unwrap_err();

        assert!(err.to_string().starts_with("workdir not found"));
    }
}
