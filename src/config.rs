//! # Configuração — Variáveis de Ambiente
//!
//! Toda a configuração vem de variáveis de ambiente (com suporte a `.env`
//! via `dotenvy`, carregado em `main`). O backend remoto segue a forma de
//! um projeto Supabase: uma URL base serve storage, funções e a API REST
//! de registros, autenticados por uma service key única.

use std::env;

use anyhow::{anyhow, Result};

/// Configuração completa da aplicação.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Endereço de bind do servidor HTTP (default `0.0.0.0:3000`).
    pub server_addr: String,
    /// URL base do projeto remoto (ex: `https://xyz.supabase.co`).
    pub backend_url: String,
    /// Service key usada como bearer token em todas as chamadas remotas.
    pub service_key: String,
    /// Bucket de storage onde os PDFs são gravados (default `documentos`).
    pub storage_bucket: String,
    /// Nome da edge function de extração (default `extrair-artigo`).
    pub extraction_function: String,
}

impl AppConfig {
    /// Carrega a configuração do ambiente. `BACKEND_URL` e `SERVICE_KEY`
    /// são obrigatórias; o restante tem defaults sensatos.
    pub fn from_env() -> Result<Self> {
        let backend_url = env::var("BACKEND_URL")
            .map_err(|_| anyhow!("Falta BACKEND_URL no ambiente"))?;
        let service_key = env::var("SERVICE_KEY")
            .map_err(|_| anyhow!("Falta SERVICE_KEY no ambiente"))?;

        let server_addr =
            env::var("SERVER_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let storage_bucket =
            env::var("STORAGE_BUCKET").unwrap_or_else(|_| "documentos".to_string());
        let extraction_function = env::var("EXTRACTION_FUNCTION")
            .unwrap_or_else(|_| "extrair-artigo".to_string());

        Ok(Self {
            server_addr,
            backend_url: backend_url.trim_end_matches('/').to_string(),
            service_key,
            storage_bucket,
            extraction_function,
        })
    }
}
