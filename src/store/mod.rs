//! Flat-file persistence for the CNPJ roster and the download ledger.
//!
//! Every public operation here logs its own failures and degrades to a safe
//! default: loads return an empty collection, saves return `false`.

mod cnpj_list;
mod ledger;

pub use cnpj_list::{load_cnpj_list, parse_cnpj_list, render_cnpj_list, save_cnpj_list};
pub use ledger::{load_ledger, parse_ledger, render_ledger, save_ledger};

use crate::errors::{AppError, AppResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::warn;

/// Sibling path used while a file is being written (`<name>.part`).
pub(crate) fn part_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(OsString::from)
        .unwrap_or_else(|| OsString::from("file"));
    name.push(".part");
    path.with_file_name(name)
}

/// Writes `contents` to a `.part` sibling and renames it over `path`.
pub(crate) async fn write_atomically(path: &Path, contents: &[u8]) -> AppResult<()> {
    let tmp_path = part_path(path);

    fs::write(&tmp_path, contents).await.map_err(|e| {
        AppError::IoError(format!(
            "Failed to write temp file {}: {}",
            tmp_path.display(),
            e
        ))
    })?;

    if let Err(e) = fs::rename(&tmp_path, path).await {
        // Remove stale tmp file (best-effort)
        if let Err(cleanup) = fs::remove_file(&tmp_path).await {
            warn!(
                file_path = %tmp_path.display(),
                error = %cleanup,
                "Failed to remove stale temp file"
            );
        }
        return Err(AppError::IoError(format!(
            "Failed to rename temp file {} to {}: {}",
            tmp_path.display(),
            path.display(),
            e
        )));
    }

    Ok(())
}
