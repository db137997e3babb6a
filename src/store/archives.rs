use anyhow::{bail, Context, Result};
use async_compression::tokio::bufread::GzipDecoder;
use std::path::Path;
use tokio::fs::File;
use tokio::io::BufReader;
use tokio_tar::ArchiveBuilder;

const GZIP_MIME_TYPE: &str = "application/gzip";

pub fn check_tar_gz(source_tar: &Path) -> Result<()> {
    let kind = infer::get_from_path(source_tar)
        .with_context(|| format!("failed to read archive: {}", source_tar.display()))?;

    match kind {
        Some(kind) if kind.mime_type() == GZIP_MIME_TYPE => Ok(()),
        Some(kind) => bail!(
            "archive is not gzip compressed: {} ({})",
            source_tar.display(),
            kind.mime_type()
        ),
        None => bail!("archive type unknown: {}", source_tar.display()),
    }
}

pub async fn unpack_tar_gz(target_dir: &Path, source_tar: &Path) -> Result<()> {
    let tar_gz = File::open(source_tar).await?;
    let buf_reader = BufReader::new(tar_gz);
    let gz_decoder = GzipDecoder::new(buf_reader);
    let archive_builder = ArchiveBuilder::new(gz_decoder)
        .set_preserve_permissions(true)
        .set_ignore_zeros(true);
    let mut archive = archive_builder.build();

    archive
        .unpack(target_dir)
        .await
        .with_context(|| format!("failed to unpack archive: {}", source_tar.display()))
}
