//! # Módulo Remoto — Clientes HTTPS do Backend Hospedado
//!
//! Tudo que o sistema persiste ou processa mora em um backend hospedado
//! (formato Supabase): storage de objetos para os PDFs, uma edge function
//! de extração por IA, e uma coleção REST de registros. Este módulo reúne
//! os três clientes reqwest, todos autenticados pela mesma service key.
//!
//! | Submódulo | Serviço | Operações |
//! |-----------|---------|-----------|
//! | [`storage`] | Storage de objetos | `upload` → URL pública |
//! | [`extraction`] | Edge function de IA | `extract` → título/conclusão/keywords/autores |
//! | [`records`] | Coleção de documentos | `create`/`update`/`delete`/`get`/`list` |

pub mod extraction;
pub mod records;
pub mod storage;

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;

use crate::config::AppConfig;

/// Coleção onde os PDFs de artigos científicos são gravados no storage.
pub const ARTICLES_COLLECTION: &str = "artigos-cientificos";

/// Clientes remotos compartilhados por toda a aplicação.
///
/// Um único `reqwest::Client` por processo (pool de conexões reutilizado);
/// os três clientes carregam referências de configuração próprias.
pub struct RemoteClients {
    pub storage: storage::StorageClient,
    pub extraction: extraction::ExtractionClient,
    pub records: records::RecordsClient,
}

impl RemoteClients {
    /// Monta os três clientes a partir da configuração.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self {
            storage: storage::StorageClient::new(http.clone(), config),
            extraction: extraction::ExtractionClient::new(http.clone(), config),
            records: records::RecordsClient::new(http, config),
        })
    }
}

/// Monta o caminho de um objeto no storage: `<coleção>/<timestamp>_<nome-sanitizado>`.
///
/// O timestamp (epoch millis) garante unicidade entre uploads do mesmo
/// arquivo; a sanitização evita caracteres que storages de objeto
/// rejeitam em chaves.
pub fn storage_object_path(collection: &str, filename: &str, now: DateTime<Utc>) -> String {
    format!(
        "{}/{}_{}",
        collection,
        now.timestamp_millis(),
        sanitize_filename(filename)
    )
}

/// Sanitiza um nome de arquivo para uso como chave de storage.
///
/// Passo 1: normalização NFC — nomes vindos de navegadores podem chegar
/// em forma decomposta ("ã" como "a" + combining tilde).
/// Passo 2: qualquer caractere fora de `[A-Za-z0-9._-]` vira `_`.
pub fn sanitize_filename(filename: &str) -> String {
    let normalized: String = filename.nfc().collect();
    normalized
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sanitize_replaces_spaces_and_accents() {
        assert_eq!(
            sanitize_filename("estudo laser fracionado (2024).pdf"),
            "estudo_laser_fracionado__2024_.pdf"
        );
        assert_eq!(sanitize_filename("relatório.pdf"), "relat_rio.pdf");
    }

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_filename("artigo_v2-final.pdf"), "artigo_v2-final.pdf");
    }

    #[test]
    fn object_path_follows_convention() {
        let now = Utc.with_ymd_and_hms(2024, 5, 10, 12, 0, 0).unwrap();
        let path = storage_object_path(ARTICLES_COLLECTION, "meu artigo.pdf", now);
        assert_eq!(
            path,
            format!("artigos-cientificos/{}_meu_artigo.pdf", now.timestamp_millis())
        );
    }
}
