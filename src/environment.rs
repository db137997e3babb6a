use anyhow::{Context, Result};
use std::{
    env,
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
};
use tokio::process::Command;

/// Executable search path handed to every child process.
///
/// The pipeline never mutates its own `PATH`; each step applies this value
/// to the commands it spawns instead.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchPath {
    entries: Vec<PathBuf>,
}

impl SearchPath {
    pub fn from_env() -> Self {
        Self::parse(&env::var_os("PATH").unwrap_or_default())
    }

    pub fn parse(value: &OsStr) -> Self {
        let entries = env::split_paths(value)
            .filter(|entry| !entry.as_os_str().is_empty())
            .collect();

        Self { entries }
    }

    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Returns a copy with `dir` in front. An existing occurrence of `dir`
    /// further down is dropped so lookups cannot fall back to it.
    pub fn prepend(&self, dir: &Path) -> Self {
        let mut entries = vec![dir.to_path_buf()];

        entries.extend(
            self.entries
                .iter()
                .filter(|entry| entry.as_path() != dir)
                .cloned(),
        );

        Self { entries }
    }

    pub fn to_os_string(&self) -> Result<OsString> {
        env::join_paths(&self.entries).context("search path entry contains a separator")
    }

    pub fn apply(&self, command: &mut Command) -> Result<()> {
        command.env("PATH", self.to_os_string()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_skips_empty_entries() {
        let path = SearchPath::parse(OsStr::new("/usr/bin::/bin"));

        assert_eq!(
            path.entries(),
            &[PathBuf::from("/usr/bin"), PathBuf::from("/bin")]
        );
    }

    #[test]
    fn parse_empty() {
        assert!(SearchPath::parse(OsStr::new("")).entries().is_empty());
    }

    #[test]
    fn prepend_puts_dir_first() {
        let path = SearchPath::parse(OsStr::new("/usr/bin:/bin"));
        let staged = path.prepend(Path::new("/ci/roc_nightly"));

        assert_eq!(
            staged.to_os_string().unwrap(),
            OsString::from("/ci/roc_nightly:/usr/bin:/bin")
        );
    }

    #[test]
    fn prepend_removes_duplicate() {
        let path = SearchPath::parse(OsStr::new("/usr/bin:/ci/roc_nightly:/bin"));
        let staged = path.prepend(Path::new("/ci/roc_nightly"));

        assert_eq!(
            staged.to_os_string().unwrap(),
            OsString::from("/ci/roc_nightly:/usr/bin:/bin")
        );
    }

    #[test]
    fn prepend_leaves_original_untouched() {
        let path = SearchPath::parse(OsStr::new("/usr/bin"));
        let _ = path.prepend(Path::new("/ci/roc_nightly"));

        assert_eq!(path.entries(), &[PathBuf::from("/usr/bin")]);
    }

    #[test]
    fn separator_in_entry_is_rejected() {
        let path = SearchPath::default().prepend(Path::new("/ci/bad:dir"));

        assert!(path.to_os_string().is_err());
    }
}
