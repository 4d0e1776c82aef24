//! # Cliente da Coleção de Documentos
//!
//! CRUD REST sobre a coleção `documentos` do backend (formato PostgREST):
//! filtros via query string (`id=eq.<uuid>`), representação do registro
//! devolvida com o header `Prefer: return=representation`.
//!
//! Sem lock otimista: edições concorrentes resolvem por last-write-wins,
//! como no sistema original.

use uuid::Uuid;

use crate::article::{ArticlePayload, ArticleRecord, DOC_TYPE_ARTICLE};
use crate::config::AppConfig;
use crate::error::AppError;

/// Cliente REST da coleção de documentos.
pub struct RecordsClient {
    http: reqwest::Client,
    collection_url: String,
    service_key: String,
}

impl RecordsClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            collection_url: format!("{}/rest/v1/documentos", config.backend_url),
            service_key: config.service_key.clone(),
        }
    }

    /// Cria um registro e devolve a representação persistida.
    pub async fn create(&self, payload: &ArticlePayload) -> Result<ArticleRecord, AppError> {
        let response = self
            .http
            .post(&self.collection_url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::remote("registros", e))?;

        let records = self.representation(response).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::remote("registros", "create sem representação na resposta"))
    }

    /// Atualiza um registro existente (escrita inteira, last write wins).
    ///
    /// # Erros
    ///
    /// [`AppError::NotFound`] quando o id não existe mais (registro
    /// apagado por outro usuário entre a abertura do formulário e o submit).
    pub async fn update(
        &self,
        id: Uuid,
        payload: &ArticlePayload,
    ) -> Result<ArticleRecord, AppError> {
        let response = self
            .http
            .patch(format!("{}?id=eq.{}", self.collection_url, id))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .header("Prefer", "return=representation")
            .json(payload)
            .send()
            .await
            .map_err(|e| AppError::remote("registros", e))?;

        let records = self.representation(response).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("artigo {id}")))
    }

    /// Busca um registro por id.
    pub async fn get(&self, id: Uuid) -> Result<ArticleRecord, AppError> {
        let response = self
            .http
            .get(format!("{}?id=eq.{}&limit=1", self.collection_url, id))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| AppError::remote("registros", e))?;

        let records = self.representation(response).await?;
        records
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("artigo {id}")))
    }

    /// Lista os artigos científicos, mais recentes primeiro.
    pub async fn list(&self) -> Result<Vec<ArticleRecord>, AppError> {
        let response = self
            .http
            .get(format!(
                "{}?doc_type=eq.{}&order=updated_at.desc",
                self.collection_url, DOC_TYPE_ARTICLE
            ))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| AppError::remote("registros", e))?;

        self.representation(response).await
    }

    /// Apaga um registro. Apagar um id inexistente é um no-op no backend.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let response = self
            .http
            .delete(format!("{}?id=eq.{}", self.collection_url, id))
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .send()
            .await
            .map_err(|e| AppError::remote("registros", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote(
                "registros",
                format!("status {status}: {body}"),
            ));
        }
        Ok(())
    }

    /// Valida o status e desserializa a lista de registros da resposta.
    async fn representation(
        &self,
        response: reqwest::Response,
    ) -> Result<Vec<ArticleRecord>, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote(
                "registros",
                format!("status {status}: {body}"),
            ));
        }
        response
            .json::<Vec<ArticleRecord>>()
            .await
            .map_err(|e| AppError::remote("registros", e))
    }
}
