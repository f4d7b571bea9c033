use crate::domain::{INCAR_FILE_NAME, IncarError, IncarResult};
use std::fs;
use std::path::{Path, PathBuf};

pub fn normalize_text_artifact(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.is_empty() && !normalized.ends_with('\n') {
        normalized.push('\n');
    }
    normalized
}

/// Writes `content` to `<dir>/INCAR` and returns the written path.
pub fn write_incar_artifact(dir: &Path, content: &str) -> IncarResult<PathBuf> {
    fs::create_dir_all(dir).map_err(|source| {
        IncarError::io_system(
            "IO.INCAR_DIR",
            format!("failed to create output directory '{}': {}", dir.display(), source),
        )
    })?;

    let path = dir.join(INCAR_FILE_NAME);
    fs::write(&path, normalize_text_artifact(content)).map_err(|source| {
        IncarError::io_system(
            "IO.INCAR_WRITE",
            format!("failed to write '{}': {}", path.display(), source),
        )
    })?;
    Ok(path)
}
