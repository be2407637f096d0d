//! Main scan loop: every CNPJ × year × month, downloading certificates that are not
//! yet in the ledger.
//!
//! Downloads land in `<destination>/<company>/<owner>/<category>/` and the ledger is
//! saved after every successful download, so an interrupted run loses at most the
//! file in flight. A second run against unchanged remote data downloads nothing.

use crate::client::ApiClient;
use crate::config::ResolvedConfig;
use crate::constants::LEDGER_TIMESTAMP_FORMAT;
use crate::models::{CertificateDescriptor, Ledger, LedgerEntry};
use crate::pacing::Pacer;
use crate::sanitizer::sanitize;
use crate::store::{load_cnpj_list, load_ledger, save_ledger, write_atomically};
use crate::utils::megabytes;
use std::fmt;
use std::path::PathBuf;
use tokio::fs;
use tracing::{debug, info, warn};

/// Counters reported at the end of a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub cnpjs_scanned: usize,
    pub new_downloads: usize,
    pub already_recorded: usize,
    pub failed: usize,
    pub missing_file_id: usize,
    pub bytes_downloaded: u64,
    pub ledger_size: usize,
}

impl ScanSummary {
    fn record(&mut self, outcome: CertificateOutcome) {
        match outcome {
            CertificateOutcome::Downloaded { bytes } => {
                self.new_downloads += 1;
                self.bytes_downloaded += bytes;
            }
            CertificateOutcome::AlreadyRecorded => self.already_recorded += 1,
            CertificateOutcome::MissingFileId => self.missing_file_id += 1,
            CertificateOutcome::Failed => self.failed += 1,
        }
    }
}

impl fmt::Display for ScanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Summary ---")?;
        writeln!(f, "CNPJs scanned: {}", self.cnpjs_scanned)?;
        writeln!(
            f,
            "New files downloaded: {} ({} MB)",
            self.new_downloads,
            megabytes(self.bytes_downloaded)
        )?;
        writeln!(f, "Already downloaded: {}", self.already_recorded)?;
        writeln!(f, "Failed downloads: {}", self.failed)?;
        writeln!(f, "Certificates without file id: {}", self.missing_file_id)?;
        write!(f, "Total in ledger: {}", self.ledger_size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CertificateOutcome {
    Downloaded { bytes: u64 },
    AlreadyRecorded,
    MissingFileId,
    Failed,
}

/// Local file name: `<category>_<year>_<MM>_<fileId>.pdf`, sanitized.
pub fn certificate_file_name(category: &str, year: i32, month: u32, file_id: &str) -> String {
    sanitize(&format!("{category}_{year}_{month:02}_{file_id}.pdf"))
}

pub struct Scanner<'a> {
    client: &'a ApiClient,
    pacer: Pacer,
    years: Vec<i32>,
    destination_dir: PathBuf,
    cnpj_list_path: PathBuf,
    ledger_path: PathBuf,
}

impl<'a> Scanner<'a> {
    pub fn new(client: &'a ApiClient, config: &ResolvedConfig) -> Self {
        Self {
            client,
            pacer: Pacer::from_config(config),
            years: config.scan_years(),
            destination_dir: config.destination_dir.clone(),
            cnpj_list_path: config.cnpj_list_path.clone(),
            ledger_path: config.ledger_path.clone(),
        }
    }

    pub fn with_pacer(mut self, pacer: Pacer) -> Self {
        self.pacer = pacer;
        self
    }

    /// Runs the full scan and returns its counters.
    ///
    /// An empty or missing CNPJ list is not an error: nothing is scanned and the
    /// summary reports zero work.
    pub async fn run(&self) -> ScanSummary {
        let mut summary = ScanSummary::default();

        let cnpjs = load_cnpj_list(&self.cnpj_list_path).await;
        if cnpjs.is_empty() {
            warn!(
                path = %self.cnpj_list_path.display(),
                "No CNPJs available, nothing to scan"
            );
            return summary;
        }

        let mut ledger = load_ledger(&self.ledger_path).await;
        info!(
            cnpjs = cnpjs.len(),
            years = ?self.years,
            ledger_entries = ledger.len(),
            "Starting scan"
        );

        for (idx, cnpj) in cnpjs.iter().enumerate() {
            info!(cnpj = %cnpj, position = idx + 1, total = cnpjs.len(), "Scanning CNPJ");

            let found = self.scan_cnpj(cnpj, &mut ledger, &mut summary).await;
            if found == 0 {
                info!(cnpj = %cnpj, "No certificates found");
            }
            summary.cnpjs_scanned += 1;

            self.pacer.after_cnpj().await;
        }

        summary.ledger_size = ledger.len();
        info!(
            new = summary.new_downloads,
            existing = summary.already_recorded,
            failed = summary.failed,
            ledger_entries = summary.ledger_size,
            "Scan completed"
        );
        summary
    }

    /// Visits every month of every configured year for one CNPJ. Returns the number
    /// of certificate descriptors seen.
    async fn scan_cnpj(
        &self,
        cnpj: &str,
        ledger: &mut Ledger,
        summary: &mut ScanSummary,
    ) -> usize {
        let mut found = 0;

        for &year in &self.years {
            for month in 1..=12u32 {
                let certificates = self.client.fetch_certificates(cnpj, month, year).await;
                self.pacer.after_request().await;

                found += certificates.len();
                for certificate in &certificates {
                    let outcome = self
                        .process_certificate(cnpj, year, month, certificate, ledger)
                        .await;
                    summary.record(outcome);
                }
            }
        }

        found
    }

    async fn process_certificate(
        &self,
        cnpj: &str,
        year: i32,
        month: u32,
        certificate: &CertificateDescriptor,
        ledger: &mut Ledger,
    ) -> CertificateOutcome {
        let Some(file_id) = certificate.file_id() else {
            warn!(
                cnpj,
                period = %format!("{month:02}/{year}"),
                "Certificate without file identifier, skipping"
            );
            return CertificateOutcome::MissingFileId;
        };

        if ledger.contains(&file_id) {
            debug!(file_id = %file_id, "Already downloaded");
            return CertificateOutcome::AlreadyRecorded;
        }

        let labels = certificate.labels(cnpj);
        let file_name = certificate_file_name(&labels.category, year, month, &file_id);

        let folder = self
            .destination_dir
            .join(&labels.company)
            .join(&labels.owner)
            .join(&labels.category);
        if let Err(e) = fs::create_dir_all(&folder).await {
            warn!(
                folder = %folder.display(),
                file_id = %file_id,
                error = %e,
                "Failed to create destination folder"
            );
            return CertificateOutcome::Failed;
        }
        let file_path = folder.join(&file_name);

        info!(
            company = %labels.company,
            category = %labels.category,
            file_id = %file_id,
            "Downloading certificate"
        );
        let emission = certificate.emission_date();
        let expiration = certificate.expiration_date();
        debug!(
            emission = emission.as_deref().unwrap_or("-"),
            expiration = expiration.as_deref().unwrap_or("-"),
            "Certificate validity"
        );

        let downloaded = self.client.fetch_file(&file_id).await;
        self.pacer.after_download().await;

        let Some(bytes) = downloaded else {
            warn!(file_id = %file_id, "Download failed, will retry on the next run");
            return CertificateOutcome::Failed;
        };

        if let Err(e) = write_atomically(&file_path, &bytes).await {
            warn!(
                file_path = %file_path.display(),
                error = %e,
                "Failed to write certificate"
            );
            return CertificateOutcome::Failed;
        }

        let entry = LedgerEntry {
            cnpj: Some(cnpj.to_string()),
            company: Some(labels.company),
            owner: Some(labels.owner),
            category: Some(labels.category),
            path: Some(file_path.display().to_string()),
            downloaded_at: Some(
                chrono::Local::now()
                    .format(LEDGER_TIMESTAMP_FORMAT)
                    .to_string(),
            ),
            ..LedgerEntry::default()
        };
        ledger.record(file_id, entry);
        save_ledger(&self.ledger_path, ledger).await;

        info!(file_path = %file_path.display(), "Certificate saved");
        CertificateOutcome::Downloaded {
            bytes: bytes.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_pads_month_and_sanitizes() {
        assert_eq!(
            certificate_file_name("Federal", 2024, 5, "xyz123"),
            "Federal_2024_05_xyz123.pdf"
        );
        assert_eq!(
            certificate_file_name("CND", 2025, 11, "a/b:c"),
            "CND_2025_11_a_b_c.pdf"
        );
    }

    #[test]
    fn summary_counts_outcomes() {
        let mut summary = ScanSummary::default();
        summary.record(CertificateOutcome::Downloaded { bytes: 10 });
        summary.record(CertificateOutcome::Downloaded { bytes: 5 });
        summary.record(CertificateOutcome::AlreadyRecorded);
        summary.record(CertificateOutcome::MissingFileId);
        summary.record(CertificateOutcome::Failed);

        assert_eq!(summary.new_downloads, 2);
        assert_eq!(summary.bytes_downloaded, 15);
        assert_eq!(summary.already_recorded, 1);
        assert_eq!(summary.missing_file_id, 1);
        assert_eq!(summary.failed, 1);
    }

    #[test]
    fn summary_display_lists_totals() {
        let summary = ScanSummary {
            new_downloads: 3,
            already_recorded: 7,
            ledger_size: 10,
            ..ScanSummary::default()
        };
        let text = summary.to_string();
        assert!(text.contains("New files downloaded: 3"));
        assert!(text.contains("Already downloaded: 7"));
        assert!(text.contains("Total in ledger: 10"));
    }
}
