use std::collections::HashMap;

use crate::error::ConnectorError;

/// Where a `FileEntity`'s bytes come from. A connector never downloads
/// content itself — it hands this to the framework, which materializes
/// it before the file reaches the chunker.
#[derive(Debug, Clone)]
pub enum FileSource {
    PresignedUrl { url: String, headers: HashMap<String, String> },
    Bytes(Vec<u8>),
}

/// Downloads (or simply unwraps) a connector-supplied `FileSource`,
/// producing the raw bytes a chunker transformer consumes. Owns the
/// single `reqwest::Client` used for every download so connections are
/// pooled across files.
#[derive(Clone)]
pub struct FileMaterializer {
    client: reqwest::Client,
}

impl Default for FileMaterializer {
    fn default() -> Self {
        Self::new()
    }
}

impl FileMaterializer {
    pub fn new() -> Self {
        Self { client: reqwest::Client::new() }
    }

    pub async fn materialize(&self, source: FileSource) -> Result<Vec<u8>, ConnectorError> {
        match source {
            FileSource::Bytes(bytes) => Ok(bytes),
            FileSource::PresignedUrl { url, headers } => {
                let mut request = self.client.get(&url);
                for (name, value) in &headers {
                    request = request.header(name, value);
                }
                let response = request.send().await.map_err(|e| {
                    ConnectorError::Transient(format!("file download failed: {e}"))
                })?;

                if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                    let retry_after = response
                        .headers()
                        .get(reqwest::header::RETRY_AFTER)
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse().ok())
                        .map(std::time::Duration::from_secs);
                    return Err(crate::rate_limit::rate_limited(retry_after));
                }
                if response.status() == reqwest::StatusCode::NOT_FOUND {
                    return Err(ConnectorError::NotFound(url));
                }
                if !response.status().is_success() {
                    return Err(ConnectorError::Transient(format!(
                        "file download returned {}",
                        response.status()
                    )));
                }

                response
                    .bytes()
                    .await
                    .map(|b| b.to_vec())
                    .map_err(|e| ConnectorError::Transient(format!("file body read failed: {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn bytes_source_passes_through_without_a_network_call() {
        let materializer = FileMaterializer::new();
        let bytes = materializer.materialize(FileSource::Bytes(vec![1, 2, 3])).await.unwrap();
        assert_eq!(bytes, vec![1, 2, 3]);
    }
}
