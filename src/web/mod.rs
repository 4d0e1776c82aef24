//! # Módulo Web — A API do Acervo de Artigos
//!
//! Este módulo organiza toda a camada web da aplicação, construída
//! com **Axum** + **JSON** + **SSE**.
//!
//! ## Arquitetura Web
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Frontend SPA (fetch + EventSource)                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Axum Router (este módulo)                                    │
//! │  ├── GET    /status                     → JSON: health       │
//! │  ├── GET    /events                     → SSE stream (upload)│
//! │  ├── POST   /formularios                → abre sessão        │
//! │  ├── POST   /formularios/{id}/arquivo   → PDF multipart      │
//! │  ├── DELETE /formularios/{id}/arquivo   → descarta arquivo   │
//! │  ├── POST   /formularios/{id}/submeter  → valida + persiste  │
//! │  ├── POST   /formularios/{id}/cancelar  → encerra sessão     │
//! │  ├── GET    /artigos                    → lista registros    │
//! │  ├── GET    /artigos/{id}               → busca registro     │
//! │  ├── DELETE /artigos/{id}               → apaga registro     │
//! │  └── POST   /diagnostico/secoes         → seções tipadas     │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Backend remoto (storage + edge function + REST)              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submódulos
//!
//! | Módulo | Responsabilidade |
//! |--------|------------------|
//! | [`state`] | Estado compartilhado (`AppState`) |
//! | [`events`] | Enum de eventos SSE do pipeline de upload |
//! | [`handlers`] | Handlers Axum para cada rota |

pub mod events;
pub mod handlers;
pub mod state;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use state::AppState;

/// Teto do corpo multipart: 10 MB de PDF + folga para os headers do form.
const UPLOAD_BODY_LIMIT: usize = 12 * 1024 * 1024;

/// Cria o router Axum com todas as rotas da aplicação.
///
/// O estado `AppState` é compartilhado entre todos os handlers via
/// extrator `State<AppState>` do Axum. CORS permissivo: a SPA roda em
/// outra origem durante o desenvolvimento.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // ── API JSON ──────────────────────────────────────────
        .route("/status", get(handlers::status))
        .route("/events", get(handlers::sse_events))
        // ── Sessões de formulário ─────────────────────────────
        .route("/formularios", post(handlers::create_form))
        .route(
            "/formularios/{id}/arquivo",
            post(handlers::upload_file)
                .delete(handlers::clear_file)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/formularios/{id}/submeter", post(handlers::submit_form))
        .route("/formularios/{id}/cancelar", post(handlers::cancel_form))
        // ── CRUD de artigos ───────────────────────────────────
        .route("/artigos", get(handlers::list_articles))
        .route("/artigos/{id}", get(handlers::get_article))
        .route("/artigos/{id}", delete(handlers::delete_article))
        // ── Diagnóstico ───────────────────────────────────────
        .route("/diagnostico/secoes", post(handlers::diagnostic_sections))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
