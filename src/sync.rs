//! Reconciles the local CNPJ roster with the platform's contact list.

use crate::client::ApiClient;
use crate::models::{Contact, ContactStatus};
use crate::store::{load_cnpj_list, save_cnpj_list};
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{info, warn};

/// Company CNPJs split by contact status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    pub active: BTreeSet<String>,
    pub inactive: BTreeSet<String>,
}

/// Outcome of merging the roster into the local list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    /// `(current ∪ active) − inactive`
    pub updated: BTreeSet<String>,
    /// `active − current`
    pub added: BTreeSet<String>,
    /// `current ∩ inactive`
    pub removed: BTreeSet<String>,
}

/// Keeps company contacts (`Tipo == "Empresa/Cliente"`) and splits their trimmed
/// tax IDs into active and inactive sets. Other statuses are ignored.
pub fn partition_contacts(contacts: &[Contact]) -> Roster {
    let mut roster = Roster::default();
    for contact in contacts.iter().filter(|c| c.is_company()) {
        let Some(tax_id) = contact.normalized_tax_id() else {
            continue;
        };
        match contact.status() {
            ContactStatus::Active => {
                roster.active.insert(tax_id.to_string());
            }
            ContactStatus::Inactive => {
                roster.inactive.insert(tax_id.to_string());
            }
            ContactStatus::Other => {}
        }
    }
    roster
}

pub fn reconcile(current: &BTreeSet<String>, roster: &Roster) -> Reconciliation {
    let updated = current
        .union(&roster.active)
        .filter(|cnpj| !roster.inactive.contains(*cnpj))
        .cloned()
        .collect();

    Reconciliation {
        updated,
        added: roster.active.difference(current).cloned().collect(),
        removed: current.intersection(&roster.inactive).cloned().collect(),
    }
}

/// Refreshes the CNPJ list file from the contact roster.
///
/// Leaves the file untouched and returns `None` when the API yields no contacts.
pub async fn sync_cnpj_list(client: &ApiClient, cnpj_list_path: &Path) -> Option<Reconciliation> {
    info!("Updating CNPJ list from contacts");

    let contacts = client.fetch_contacts().await;
    if contacts.is_empty() {
        warn!("Contact sync skipped, keeping the current CNPJ list");
        return None;
    }

    let current = load_cnpj_list(cnpj_list_path).await;
    let reconciliation = reconcile(&current, &partition_contacts(&contacts));

    if !reconciliation.added.is_empty() {
        info!(added = reconciliation.added.len(), "New active CNPJs added");
    }
    if !reconciliation.removed.is_empty() {
        info!(
            removed = reconciliation.removed.len(),
            "Inactive CNPJs removed"
        );
    }

    save_cnpj_list(cnpj_list_path, &reconciliation.updated).await;
    Some(reconciliation)
}
