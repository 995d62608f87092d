//! Persistence of the raw dataset payload.

use std::path::{Path, PathBuf};

use report_core::error::{ReportError, Result};

use crate::source::SourcePayload;

/// File name of the raw payload snapshot inside the output directory.
pub const SNAPSHOT_FILE: &str = "jdata.json";

/// Write `payload` as pretty-printed JSON to `<dir>/jdata.json`.
///
/// The directory is created if needed and the file is replaced atomically.
pub fn save_snapshot(payload: &SourcePayload, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SNAPSHOT_FILE);
    let json = serde_json::to_string_pretty(payload)?;
    write_atomic(&path, json.as_bytes())?;
    tracing::info!("Saved raw snapshot to {}", path.display());
    Ok(path)
}

/// Write `contents` to `path` via a temporary sibling and a rename.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let file_error = |source: std::io::Error| ReportError::FileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(file_error)?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    std::fs::write(&tmp, contents).map_err(file_error)?;
    std::fs::rename(&tmp, path).map_err(file_error)?;
    Ok(())
}
