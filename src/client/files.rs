use super::{log_failure, ApiClient};
use crate::constants::{FILE_ENDPOINT, FILE_ID_QUERY_PARAM};
use crate::errors::{AppError, AppResult};

impl ApiClient {
    /// Downloads a certificate file, fully buffered in memory.
    ///
    /// Returns `None` (after logging) unless the API answers 200 with a non-empty body.
    pub async fn fetch_file(&self, file_id: &str) -> Option<Vec<u8>> {
        match self.try_fetch_file(file_id).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                log_failure("fetch_file", &e);
                None
            }
        }
    }

    async fn try_fetch_file(&self, file_id: &str) -> AppResult<Vec<u8>> {
        let context = format!("downloading file {file_id}");
        let mut url = self.endpoint(FILE_ENDPOINT)?;
        url.query_pairs_mut()
            .append_pair(FILE_ID_QUERY_PARAM, file_id);

        let request = self.http.post(url).timeout(self.download_timeout);
        let response = self.send(request, &context).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::NetworkError(format!("{context}: {}", e.without_url())))?;

        if bytes.is_empty() {
            return Err(AppError::EmptyResponse(context));
        }
        Ok(bytes.to_vec())
    }
}
