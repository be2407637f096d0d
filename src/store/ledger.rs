use super::write_atomically;
use crate::errors::{AppError, AppResult};
use crate::models::{Ledger, LedgerEntry};
use crate::sanitizer::value_to_text;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use serde_json::Value;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{info, warn};

const LEDGER_INDENT: &[u8] = b"    ";

/// On-disk ledger layouts.
///
/// The current layout is an object keyed by file id. Early versions stored a plain
/// array of file ids; those are migrated on read and rewritten as an object on the
/// next save. Non-string ids are keyed by their JSON text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LedgerDocument {
    Current(Ledger),
    Legacy(Vec<Value>),
}

impl LedgerDocument {
    fn migrate(self) -> Ledger {
        match self {
            LedgerDocument::Current(ledger) => ledger,
            LedgerDocument::Legacy(file_ids) => {
                info!(entries = file_ids.len(), "Migrating legacy ledger format");
                file_ids
                    .into_iter()
                    .map(|id| (value_to_text(&id), LedgerEntry::default()))
                    .collect()
            }
        }
    }
}

/// Parses ledger JSON in either the current or the legacy array layout.
pub fn parse_ledger(contents: &str) -> AppResult<Ledger> {
    let document: LedgerDocument = serde_json::from_str(contents)
        .map_err(|e| AppError::ParseError(format!("Unrecognized ledger format: {e}")))?;
    Ok(document.migrate())
}

/// Pretty-prints the ledger with four-space indentation. Non-ASCII text is written as-is.
pub fn render_ledger(ledger: &Ledger) -> AppResult<Vec<u8>> {
    let mut buf = Vec::new();
    let mut serializer =
        Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(LEDGER_INDENT));
    ledger.serialize(&mut serializer)?;
    Ok(buf)
}

/// Loads the download ledger.
///
/// A missing file yields an empty ledger. Unreadable or malformed content is logged
/// and also yields an empty ledger.
pub async fn load_ledger(path: &Path) -> Ledger {
    match read_ledger(path).await {
        Ok(Some(ledger)) => ledger,
        Ok(None) => Ledger::new(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read ledger, starting empty");
            Ledger::new()
        }
    }
}

async fn read_ledger(path: &Path) -> AppResult<Option<Ledger>> {
    let contents = match fs::read_to_string(path).await {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(AppError::IoError(format!(
                "Failed to read {}: {e}",
                path.display()
            )))
        }
    };
    parse_ledger(&contents).map(Some)
}

/// Overwrites the ledger file. Returns `false` (after logging) if the write failed.
pub async fn save_ledger(path: &Path, ledger: &Ledger) -> bool {
    let result = match render_ledger(ledger) {
        Ok(bytes) => write_atomically(path, &bytes).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to save ledger");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_entry() -> LedgerEntry {
        LedgerEntry {
            cnpj: Some("11222333000181".into()),
            company: Some("Acme Ltd".into()),
            owner: Some("Outros".into()),
            category: Some("Certidão Federal".into()),
            path: Some("CNDs/Acme Ltd/Outros/Certidão Federal/a.pdf".into()),
            downloaded_at: Some("2024-05-10 08:00:00".into()),
            ..LedgerEntry::default()
        }
    }

    #[test]
    fn legacy_array_is_migrated_to_empty_records() {
        let ledger = parse_ledger(r#"["a", "b"]"#).unwrap();
        let value = serde_json::to_value(&ledger).unwrap();
        assert_eq!(value, json!({"a": {}, "b": {}}));
    }

    #[test]
    fn current_object_is_loaded_as_is() {
        let ledger = parse_ledger(r#"{"xyz123": {"cnpj": "11222333000181"}}"#).unwrap();
        assert_eq!(
            ledger.get("xyz123").and_then(|e| e.cnpj.as_deref()),
            Some("11222333000181")
        );
    }

    #[test]
    fn legacy_array_with_numeric_ids_is_migrated() {
        let ledger = parse_ledger("[101, 202, \"abc\"]").unwrap();
        assert_eq!(ledger.len(), 3);
        assert!(ledger.contains("101"));
        assert!(ledger.contains("202"));
        assert!(ledger.contains("abc"));
    }

    #[test]
    fn object_with_odd_values_keeps_every_entry() {
        let contents = r#"{"keep-me": {"cnpj": 11222333000181}, "other": {}, "flag": true}"#;
        let ledger = parse_ledger(contents).unwrap();

        assert_eq!(ledger.len(), 3);
        assert!(ledger.contains("keep-me"));
        assert!(ledger.contains("flag"));

        let rendered: Value = serde_json::from_slice(&render_ledger(&ledger).unwrap()).unwrap();
        let original: Value = serde_json::from_str(contents).unwrap();
        assert_eq!(rendered, original);
    }

    #[tokio::test]
    async fn saving_after_odd_entries_keeps_them_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baixados.json");
        std::fs::write(&path, r#"{"keep-me": {"cnpj": 11222333000181}}"#).unwrap();

        let mut ledger = load_ledger(&path).await;
        assert_eq!(ledger.len(), 1);
        ledger.record("new-id", sample_entry());
        assert!(save_ledger(&path, &ledger).await);

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk["keep-me"], json!({"cnpj": 11222333000181u64}));
        assert_eq!(on_disk["new-id"]["cnpj"], "11222333000181");
    }

    #[test]
    fn malformed_content_is_an_error() {
        assert!(parse_ledger("{broken").is_err());
        assert!(parse_ledger("42").is_err());
        assert!(parse_ledger("").is_err());
    }

    #[test]
    fn render_uses_four_space_indent_and_keeps_non_ascii() {
        let mut ledger = Ledger::new();
        ledger.record("a", sample_entry());
        let text = String::from_utf8(render_ledger(&ledger).unwrap()).unwrap();

        assert!(text.starts_with("{\n    \"a\": {\n        \"cnpj\""));
        assert!(text.contains("Certidão Federal"));
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baixados.json");
        let mut ledger = Ledger::new();
        ledger.record("a", sample_entry());
        ledger.record("b", LedgerEntry::default());

        assert!(save_ledger(&path, &ledger).await);
        assert_eq!(load_ledger(&path).await, ledger);
    }

    #[tokio::test]
    async fn legacy_file_is_rewritten_as_object_on_save() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baixados.json");
        std::fs::write(&path, r#"["old-id"]"#).unwrap();

        let ledger = load_ledger(&path).await;
        assert!(ledger.contains("old-id"));
        assert!(save_ledger(&path, &ledger).await);

        let on_disk: Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk, json!({"old-id": {}}));
    }

    #[tokio::test]
    async fn missing_or_malformed_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("baixados.json");
        assert!(load_ledger(&path).await.is_empty());

        std::fs::write(&path, "not json").unwrap();
        assert!(load_ledger(&path).await.is_empty());
    }

    #[tokio::test]
    async fn save_into_missing_directory_reports_failure() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing/baixados.json");
        assert!(!save_ledger(&path, &Ledger::new()).await);
    }
}
