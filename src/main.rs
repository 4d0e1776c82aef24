#![allow(dead_code, unused_imports)]
#![allow(rustdoc::broken_intra_doc_links, rustdoc::invalid_html_tags)]
//! # Conteúdo Clínico — Acervo de Artigos Científicos
//!
//! **Ponto de entrada principal** da aplicação.
//!
//! Serviço HTTP que recebe PDFs de artigos científicos, grava o binário
//! no storage remoto, extrai título/conclusão/keywords/autores via a
//! edge function de IA e persiste os registros na coleção de documentos.
//! Inclui ainda o seccionador de diagnósticos de marketing (texto livre
//! de IA → seis seções tipadas).
//!
//! ## Fluxo de Inicialização
//!
//! ```text
//! main()
//!   ├── Carrega .env (dotenvy) e configura tracing/logging
//!   ├── Lê AppConfig do ambiente (BACKEND_URL, SERVICE_KEY, ...)
//!   ├── Monta os clientes remotos (storage, extração, registros)
//!   ├── Cria broadcast channel para SSE
//!   ├── Monta AppState e Router
//!   └── Inicia servidor TCP (porta 3000 por padrão)
//! ```
//!
//! ## Exemplo de Uso
//!
//! ```bash
//! # Executar com logs padrão (info)
//! BACKEND_URL=https://xyz.supabase.co SERVICE_KEY=... cargo run
//!
//! # Executar com logs detalhados
//! RUST_LOG=debug cargo run
//!
//! # O servidor estará disponível em http://localhost:3000
//! ```

// Declaração dos módulos da aplicação.
// Cada módulo corresponde a uma camada da arquitetura:

/// Módulo `article` — formulário de artigo: validação, submit, cancel.
mod article;

/// Módulo `config` — configuração lida do ambiente.
mod config;

/// Módulo `diagnostic` — seccionador de diagnósticos (texto → seções tipadas).
mod diagnostic;

/// Módulo `error` — erro unificado da aplicação e mapeamento HTTP.
mod error;

/// Módulo `extracted` — store dos campos extraídos do PDF.
mod extracted;

/// Módulo `remote` — clientes HTTP do backend (storage, extração, registros).
mod remote;

/// Módulo `upload` — máquina de estados do pipeline de upload.
mod upload;

/// Módulo `web` — servidor web axum, handlers HTTP e SSE.
mod web;

use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::diagnostic::SectionExtractor;
use crate::remote::RemoteClients;
use crate::web::events::UploadEvent;
use crate::web::state::AppState;

/// Função principal assíncrona.
///
/// # Erros
///
/// Retorna erro se:
/// - BACKEND_URL ou SERVICE_KEY estiverem ausentes do ambiente
/// - Não conseguir fazer bind no endereço configurado
/// - O servidor axum falhar durante execução
#[tokio::main]
async fn main() -> Result<()> {
    // Variáveis de um .env local entram antes da leitura da config.
    // Ambiente já exportado tem precedência.
    let _ = dotenvy::dotenv();

    // Configura o sistema de logging/tracing.
    // Aceita a variável de ambiente RUST_LOG para configurar o nível.
    // Exemplo: RUST_LOG=debug cargo run
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("📄 Conteúdo Clínico — Starting...");

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = %config.backend_url,
        bucket = %config.storage_bucket,
        "Configuração carregada"
    );

    // Clientes do backend remoto — um reqwest::Client compartilhado.
    let remotes = Arc::new(RemoteClients::new(&config)?);

    // Canal broadcast para eventos SSE (Server-Sent Events).
    // Usado para streaming em tempo real do progresso de upload.
    // Capacidade de 256 eventos — mensagens antigas são descartadas se o consumidor for lento.
    let (events_tx, _) = broadcast::channel::<UploadEvent>(256);
    let events_tx = Arc::new(events_tx);

    // Estado compartilhado da aplicação — passado para todos os handlers via axum State.
    let state = AppState {
        remotes,
        forms: Arc::new(RwLock::new(Default::default())),
        events_tx,
        extractor: Arc::new(SectionExtractor::new()),
    };

    // Cria o router com todas as rotas da aplicação.
    let app = web::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.server_addr).await?;
    tracing::info!("🚀 Server running at http://{}", config.server_addr);

    // Inicia o servidor axum — bloqueia até que o processo seja encerrado.
    axum::serve(listener, app).await?;

    Ok(())
}
