//! # Estado da Aplicação Web
//!
//! Estado compartilhado entre todos os handlers Axum.
//!
//! Cada formulário aberto vive no mapa `forms` sob um `RwLock`; o lock é
//! mantido apenas durante mutações síncronas, nunca através de um
//! `.await` — as chamadas remotas acontecem com o lock solto e o
//! resultado volta pela guarda de geração do formulário.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::article::ArticleForm;
use crate::diagnostic::SectionExtractor;
use crate::remote::RemoteClients;
use crate::web::events::UploadEvent;

/// Estado compartilhado da aplicação Axum.
#[derive(Clone)]
pub struct AppState {
    /// Clientes do backend remoto (storage, extração, registros).
    pub remotes: Arc<RemoteClients>,
    /// Formulários abertos, um dono exclusivo por sessão.
    pub forms: Arc<RwLock<HashMap<Uuid, ArticleForm>>>,
    /// Canal broadcast para eventos SSE do pipeline de upload.
    pub events_tx: Arc<broadcast::Sender<UploadEvent>>,
    /// Seccionador de diagnóstico (regexes compiladas uma vez).
    pub extractor: Arc<SectionExtractor>,
}
