use super::{log_failure, ApiClient};
use crate::constants::CONTACTS_ENDPOINT;
use crate::errors::AppResult;
use crate::models::Contact;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

#[derive(Debug, Deserialize)]
struct ContactsResponse {
    #[serde(default)]
    contatos: Option<Vec<Value>>,
}

/// Records are decoded one by one; a record that is not an object is skipped alone.
fn parse_contacts(records: Vec<Value>) -> Vec<Contact> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(idx, record)| match serde_json::from_value(record) {
            Ok(contact) => Some(contact),
            Err(e) => {
                debug!(index = idx, error = %e, "Skipping unreadable contact record");
                None
            }
        })
        .collect()
}

impl ApiClient {
    /// Lists the platform's contacts.
    ///
    /// Returns an empty list on any failure or when the API returns no contacts;
    /// each case is logged.
    pub async fn fetch_contacts(&self) -> Vec<Contact> {
        match self.try_fetch_contacts().await {
            Ok(contacts) if contacts.is_empty() => {
                warn!("No contacts returned by the API");
                contacts
            }
            Ok(contacts) => {
                info!(contacts = contacts.len(), "Contacts fetched");
                contacts
            }
            Err(e) => {
                log_failure("fetch_contacts", &e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_contacts(&self) -> AppResult<Vec<Contact>> {
        let context = "listing contacts";
        let request = self
            .http
            .post(self.endpoint(CONTACTS_ENDPOINT)?)
            .timeout(self.metadata_timeout);

        let response = self.send(request, context).await?;
        let body = Self::read_json(response, context).await?;
        let parsed: ContactsResponse = serde_json::from_value(body)?;
        Ok(parse_contacts(parsed.contatos.unwrap_or_default()))
    }
}
