use anyhow::{anyhow, Result};
use sha256::try_digest;
use std::path::Path;

pub fn get_file<P: AsRef<Path>>(path: P) -> Result<String> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(anyhow!("path is not a file: {}", path.display()));
    }

    Ok(try_digest(path)?)
}
