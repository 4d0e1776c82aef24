//! # Erros da Aplicação — Taxonomia e Mapeamento HTTP
//!
//! Três categorias de falha, todas recuperáveis pelo usuário:
//!
//! | Variante | Origem | HTTP | Recuperação |
//! |----------|--------|------|-------------|
//! | `Validation` | Arquivo/campo inválido | 422 | Corrigir e reenviar |
//! | `RemoteCall` | Storage/extração/persistência | 502 | Tentar novamente |
//! | `NotFound` | Registro ou sessão inexistente | 404 | Abandonar o fluxo |
//!
//! Nenhum erro é fatal ao processo. Falha de extração em particular nem
//! chega aqui — degrada para dados derivados do nome do arquivo (ver
//! [`crate::upload`]).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

/// Mensagem de validação associada a um campo específico do formulário.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldError {
    /// Nome do campo (ex: "titulo", "link_externo").
    pub field: String,
    /// Mensagem legível em PT-BR.
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Erro da aplicação — cobre validação local e falhas de chamadas remotas.
#[derive(Debug, Error)]
pub enum AppError {
    /// Entrada inválida (tipo/tamanho de arquivo, campo obrigatório, URL malformada).
    /// Bloqueia a ação; o usuário deve corrigir.
    #[error("validação falhou: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// Falha em uma operação remota (storage, extração, persistência).
    /// Transitória — a operação é sempre re-tentável.
    #[error("falha na chamada remota ({service}): {message}")]
    RemoteCall { service: &'static str, message: String },

    /// Recurso inexistente (registro apagado, sessão de formulário expirada).
    #[error("não encontrado: {0}")]
    NotFound(String),
}

impl AppError {
    /// Atalho para erro de validação de um único campo.
    pub fn invalid(field: &str, message: &str) -> Self {
        AppError::Validation(vec![FieldError::new(field, message)])
    }

    /// Atalho para falha remota com o nome do serviço.
    pub fn remote(service: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::RemoteCall {
            service,
            message: err.to_string(),
        }
    }
}

fn format_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| format!("{}: {}", f.field, f.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Corpo JSON padrão para respostas de erro.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<FieldError>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, fields) = match &self {
            AppError::Validation(fields) => (StatusCode::UNPROCESSABLE_ENTITY, fields.clone()),
            AppError::RemoteCall { .. } => (StatusCode::BAD_GATEWAY, Vec::new()),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, Vec::new()),
        };
        let body = ErrorBody {
            error: self.to_string(),
            fields,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_lists_fields() {
        let err = AppError::Validation(vec![
            FieldError::new("titulo", "mínimo de 3 caracteres"),
            FieldError::new("link_externo", "URL malformada"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("titulo"), "missing field name in {msg}");
        assert!(msg.contains("link_externo"), "missing field name in {msg}");
    }

    #[test]
    fn remote_message_names_service() {
        let err = AppError::remote("storage", "timeout");
        assert!(err.to_string().contains("storage"));
        assert!(err.to_string().contains("timeout"));
    }
}
