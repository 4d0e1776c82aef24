//! # Cliente de Storage de Objetos
//!
//! Grava o binário do PDF no bucket configurado e devolve a URL pública.
//! O caminho do objeto segue a convenção de [`super::storage_object_path`].

use crate::config::AppConfig;
use crate::error::AppError;

/// Cliente do storage de objetos do backend.
pub struct StorageClient {
    http: reqwest::Client,
    base_url: String,
    bucket: String,
    service_key: String,
}

impl StorageClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            base_url: config.backend_url.clone(),
            bucket: config.storage_bucket.clone(),
            service_key: config.service_key.clone(),
        }
    }

    /// Sobe o binário para `path` e retorna a URL pública do objeto.
    ///
    /// # Erros
    ///
    /// [`AppError::RemoteCall`] em falha de rede ou status não-2xx.
    pub async fn upload(&self, path: &str, bytes: Vec<u8>) -> Result<String, AppError> {
        let endpoint = format!(
            "{}/storage/v1/object/{}/{}",
            self.base_url, self.bucket, path
        );
        tracing::debug!(%endpoint, size_bytes = bytes.len(), "Enviando objeto ao storage");

        let response = self
            .http
            .post(&endpoint)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header(reqwest::header::CONTENT_TYPE, "application/pdf")
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::remote("storage", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote(
                "storage",
                format!("status {status}: {body}"),
            ));
        }

        Ok(self.public_url(path))
    }

    /// URL pública de um objeto já gravado.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}
