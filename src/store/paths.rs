use std::path::{Path, PathBuf};
use uuid::Uuid;

pub const TOOLCHAIN_NAME: &str = "roc_nightly";

pub const ARCHIVE_EXTENSION: &str = "tar.gz";

pub fn get_toolchain(workdir: &Path) -> PathBuf {
    workdir.join(TOOLCHAIN_NAME)
}

pub fn get_archive(workdir: &Path) -> PathBuf {
    get_toolchain(workdir).with_extension(ARCHIVE_EXTENSION)
}

pub fn get_temp(workdir: &Path) -> PathBuf {
    workdir.join(format!(".{}", Uuid::now_v7()))
}
