//! # Eventos SSE do Pipeline de Upload
//!
//! Define o enum [`UploadEvent`] — os marcos de progresso emitidos
//! durante o upload e a extração de um PDF, enviados em tempo real ao
//! frontend via Server-Sent Events (SSE).
//!
//! ## Ciclo de Vida dos Eventos
//!
//! ```text
//! FileReceived → Sending → StorageDone → Analyzing → ExtractionDone
//!                   │                        │
//!                   └──▶ Failed              └──▶ Degraded
//! Cleared pode ocorrer a qualquer momento (usuário descartou o arquivo)
//! ```
//!
//! ## Serialização
//!
//! `#[serde(tag = "type")]` produz JSON com discriminador:
//!
//! ```json
//! { "type": "Analyzing", "form_id": "..." }
//! ```

use serde::Serialize;
use uuid::Uuid;

/// Evento emitido durante o pipeline de upload de um formulário.
///
/// Todos os eventos carregam o `form_id` para que o frontend filtre os
/// eventos do formulário que está exibindo.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum UploadEvent {
    /// Arquivo validado e aceito pelo formulário.
    FileReceived {
        form_id: Uuid,
        filename: String,
        size_bytes: usize,
    },

    /// Gravação no storage iniciada ("Enviando arquivo...").
    Sending { form_id: Uuid },

    /// Objeto gravado; URL pública disponível.
    StorageDone { form_id: Uuid, file_url: String },

    /// Extração por IA iniciada ("Analisando conteúdo...").
    Analyzing { form_id: Uuid },

    /// Extração concluída com campos estruturados.
    ExtractionDone {
        form_id: Uuid,
        title: Option<String>,
        keywords: Vec<String>,
        authors: Vec<String>,
    },

    /// Extração indisponível — dados derivados do nome do arquivo.
    /// Não-fatal: o upload contou como sucesso.
    Degraded {
        form_id: Uuid,
        title: Option<String>,
        message: String,
    },

    /// O próprio storage falhou; o upload não aconteceu.
    Failed { form_id: Uuid, message: String },

    /// Usuário descartou o arquivo; estado voltou a Idle.
    Cleared { form_id: Uuid },
}
