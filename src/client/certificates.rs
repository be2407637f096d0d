use super::{log_failure, ApiClient};
use crate::constants::{CERTIFICATES_ENDPOINT, FIRST_PAGE};
use crate::errors::AppResult;
use crate::models::CertificateDescriptor;
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Request body of the certificate listing endpoint.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateQuery<'a> {
    cnpj: [&'a str; 1],
    month: String,
    year: String,
    page_number: u32,
}

impl<'a> CertificateQuery<'a> {
    fn new(cnpj: &'a str, month: u32, year: i32) -> Self {
        Self {
            cnpj: [cnpj],
            month: format!("{month:02}"),
            year: format!("{year:04}"),
            page_number: FIRST_PAGE,
        }
    }
}

impl ApiClient {
    /// Lists certificates issued for `cnpj` in `month`/`year` (first page only).
    ///
    /// Returns an empty list on any failure; failures are logged.
    pub async fn fetch_certificates(
        &self,
        cnpj: &str,
        month: u32,
        year: i32,
    ) -> Vec<CertificateDescriptor> {
        match self.try_fetch_certificates(cnpj, month, year).await {
            Ok(certificates) => {
                if !certificates.is_empty() {
                    info!(
                        cnpj,
                        period = %format!("{month:02}/{year}"),
                        found = certificates.len(),
                        "Certificates found"
                    );
                }
                certificates
            }
            Err(e) => {
                log_failure("fetch_certificates", &e);
                Vec::new()
            }
        }
    }

    async fn try_fetch_certificates(
        &self,
        cnpj: &str,
        month: u32,
        year: i32,
    ) -> AppResult<Vec<CertificateDescriptor>> {
        let context = format!("listing certificates for {cnpj} ({month:02}/{year})");
        let request = self
            .http
            .post(self.endpoint(CERTIFICATES_ENDPOINT)?)
            .timeout(self.metadata_timeout)
            .json(&CertificateQuery::new(cnpj, month, year));

        let response = self.send(request, &context).await?;
        let body = Self::read_json(response, &context).await?;
        parse_certificates(body)
    }
}

/// Extracts the `certificates` array. Bodies that are not JSON objects, or that have
/// no (or a null) `certificates` key, yield an empty list.
fn parse_certificates(body: Value) -> AppResult<Vec<CertificateDescriptor>> {
    let Value::Object(mut fields) = body else {
        return Ok(Vec::new());
    };
    match fields.remove("certificates") {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(list) => Ok(serde_json::from_value(list)?),
    }
}
