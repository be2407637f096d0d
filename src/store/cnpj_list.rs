use super::write_atomically;
use crate::errors::{AppError, AppResult};
use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

/// Parses roster text: one CNPJ per line, trimmed, blank lines ignored.
pub fn parse_cnpj_list(contents: &str) -> BTreeSet<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Renders the roster sorted, one CNPJ per line, each line newline-terminated.
pub fn render_cnpj_list(cnpjs: &BTreeSet<String>) -> String {
    cnpjs.iter().map(|cnpj| format!("{cnpj}\n")).collect()
}

/// Loads the CNPJ roster.
///
/// A missing file yields an empty set. Read failures are logged and also yield an
/// empty set.
pub async fn load_cnpj_list(path: &Path) -> BTreeSet<String> {
    match read_cnpj_list(path).await {
        Ok(Some(cnpjs)) => cnpjs,
        Ok(None) => {
            info!(path = %path.display(), "CNPJ list not found");
            BTreeSet::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read CNPJ list");
            BTreeSet::new()
        }
    }
}

async fn read_cnpj_list(path: &Path) -> AppResult<Option<BTreeSet<String>>> {
    match fs::read_to_string(path).await {
        Ok(contents) => Ok(Some(parse_cnpj_list(&contents))),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::IoError(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

/// Overwrites the roster file. Returns `false` (after logging) if the write failed.
pub async fn save_cnpj_list(path: &Path, cnpjs: &BTreeSet<String>) -> bool {
    match write_atomically(path, render_cnpj_list(cnpjs).as_bytes()).await {
        Ok(()) => {
            info!(path = %path.display(), companies = cnpjs.len(), "CNPJ list saved");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to save CNPJ list");
            false
        }
    }
}
