//! Common test utilities for integration tests

use cnd_sync::config::ResolvedConfig;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

#[allow(dead_code)]
pub const CONTACTS_PATH: &str = "/api/v1/tok/buscarcontatos";
#[allow(dead_code)]
pub const CERTIFICATES_PATH: &str = "/api/v1/tok/pegarcertidoesmesanocnpj";
#[allow(dead_code)]
pub const FILE_PATH: &str = "/api/v1/tok/pegararquivo";

#[allow(dead_code)]
pub const ACME_CNPJ: &str = "11222333000181";

/// Certificate listing with a single Acme certificate
#[allow(dead_code)]
pub const ACME_CERTIFICATES: &str = r#"{
  "certificates": [
    {
      "Filename": "xyz123",
      "CategoryDescription": "Federal",
      "ClientContactName": "Acme Ltd",
      "Dateemission": "2024-05-02",
      "Dateexpiration": "2024-10-29"
    }
  ]
}"#;

/// Configuration pointing at a mock server, with every file under `root`,
/// a single scan year (2024), no contact sync and no pacing delays.
#[allow(dead_code)]
pub fn test_config(server_url: &str, root: &Path) -> ResolvedConfig {
    ResolvedConfig {
        api_base_url: server_url.to_string(),
        api_token: "tok".to_string(),
        destination_dir: root.join("CNDs"),
        cnpj_list_path: root.join("cnpjs.txt"),
        ledger_path: root.join("baixados.json"),
        years: vec![2024],
        sync_contacts: false,
        request_delay_ms: 0,
        download_delay_ms: 0,
        between_cnpj_delay_ms: 0,
        ..ResolvedConfig::default()
    }
}

/// Writes a CNPJ list file, one entry per line
#[allow(dead_code)]
pub fn write_cnpj_list(path: &Path, cnpjs: &[&str]) {
    let mut contents = cnpjs.join("\n");
    contents.push('\n');
    fs::write(path, contents).unwrap();
}

/// Every regular file below `dir`, recursively. A missing directory yields an empty set.
#[allow(dead_code)]
pub fn files_under(dir: &Path) -> BTreeSet<PathBuf> {
    let mut files = BTreeSet::new();
    let Ok(entries) = fs::read_dir(dir) else {
        return files;
    };
    for entry in entries {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.insert(path);
        }
    }
    files
}
