//! # Cliente da Extração por IA
//!
//! Invoca a edge function que lê o PDF já gravado no storage e devolve os
//! campos estruturados do artigo. A função recebe a **referência** ao
//! arquivo (URL pública) em vez dos bytes — o upload já aconteceu, não há
//! por que reenviar o binário.
//!
//! Falha aqui nunca bloqueia o usuário: quem chama degrada para o título
//! derivado do nome do arquivo (ver [`crate::upload`]).

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::error::AppError;

/// Corpo da requisição à edge function de extração.
#[derive(Debug, Serialize)]
struct ExtractionRequest<'a> {
    file_url: &'a str,
    filename: &'a str,
}

/// Resposta da extração — todos os campos opcionais.
///
/// Campo ausente significa "a IA não encontrou", não erro; quem aplica o
/// payload preserva o valor anterior do campo.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionPayload {
    pub title: Option<String>,
    pub conclusion: Option<String>,
    pub keywords: Option<Vec<String>>,
    pub authors: Option<Vec<String>>,
}

/// Cliente da edge function de extração.
pub struct ExtractionClient {
    http: reqwest::Client,
    function_url: String,
    service_key: String,
}

impl ExtractionClient {
    pub fn new(http: reqwest::Client, config: &AppConfig) -> Self {
        Self {
            http,
            function_url: format!(
                "{}/functions/v1/{}",
                config.backend_url, config.extraction_function
            ),
            service_key: config.service_key.clone(),
        }
    }

    /// Submete o arquivo gravado à extração e devolve o payload estruturado.
    ///
    /// # Erros
    ///
    /// [`AppError::RemoteCall`] em falha de rede, status não-2xx, ou
    /// resposta que não desserializa.
    pub async fn extract(
        &self,
        file_url: &str,
        filename: &str,
    ) -> Result<ExtractionPayload, AppError> {
        tracing::debug!(%filename, "Invocando extração por IA");

        let response = self
            .http
            .post(&self.function_url)
            .bearer_auth(&self.service_key)
            .header("apikey", &self.service_key)
            .json(&ExtractionRequest { file_url, filename })
            .send()
            .await
            .map_err(|e| AppError::remote("extração", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::remote(
                "extração",
                format!("status {status}: {body}"),
            ));
        }

        response
            .json::<ExtractionPayload>()
            .await
            .map_err(|e| AppError::remote("extração", e))
    }
}
