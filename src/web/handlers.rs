//! # Handlers HTTP — Os Endpoints da Aplicação
//!
//! Cada função pública neste módulo é um handler Axum, mapeado a uma
//! rota em [`super::create_router()`]. Todos retornam JSON; o frontend
//! (SPA) consome a API e acompanha o progresso de upload via SSE.
//!
//! ## Padrão de Resposta
//!
//! | Handler | Método | Retorno | Uso |
//! |---------|--------|---------|-----|
//! | `status` | GET | JSON | Health check |
//! | `sse_events` | GET | SSE stream | Progresso de upload |
//! | `create_form` | POST | JSON | Abre sessão de formulário |
//! | `upload_file` | POST | JSON | Pipeline storage + extração |
//! | `clear_file` | DELETE | JSON | Descarta arquivo + extraídos |
//! | `submit_form` | POST | JSON | Valida e persiste o artigo |
//! | `cancel_form` | POST | JSON | Encerra sem persistir |
//! | `list_articles` / `get_article` / `delete_article` | GET/DELETE | JSON | CRUD de registros |
//! | `diagnostic_sections` | POST | JSON | Seccionamento do diagnóstico |
//!
//! ## Disciplina de Lock
//!
//! O mapa de formulários usa `parking_lot::RwLock`; nenhum lock é mantido
//! através de `.await`. O pipeline de upload solta o lock durante as
//! chamadas remotas e reaplica o resultado sob a guarda de geração — um
//! resultado que chegar depois de um `clear()` é descartado.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Multipart, Path, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::Json;
use chrono::Utc;
use futures_util::stream::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use super::events::UploadEvent;
use super::state::AppState;
use crate::article::{ArticleDraft, ArticleForm, ArticleRecord, SubmitAction};
use crate::diagnostic::{format_section_content, FormattedLine, SectionKey};
use crate::error::AppError;
use crate::extracted::ExtractedData;
use crate::remote::{storage_object_path, ARTICLES_COLLECTION};
use crate::upload::{UploadFile, UploadPhase};

/// Resposta do endpoint `/status`.
#[derive(Serialize)]
pub struct StatusResponse {
    pub ready: bool,
    /// Sessões de formulário abertas no momento.
    pub open_forms: usize,
}

/// Visão serializável de uma sessão de formulário.
#[derive(Serialize)]
pub struct FormView {
    pub form_id: Uuid,
    pub record_id: Option<Uuid>,
    pub title: String,
    pub description: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub source_language: Option<String>,
    pub external_link: Option<String>,
    pub file_url: Option<String>,
    pub upload_phase: UploadPhase,
    pub extracted: ExtractedData,
}

impl FormView {
    fn of(form_id: Uuid, form: &ArticleForm) -> Self {
        let draft = form.draft();
        Self {
            form_id,
            record_id: form.record_id(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            equipment_id: draft.equipment_id,
            source_language: draft.source_language.clone(),
            external_link: draft.external_link.clone(),
            file_url: form.file_url().map(str::to_string),
            upload_phase: form.upload_phase(),
            extracted: form.extracted(),
        }
    }
}

/// Resultado do pipeline de upload devolvido ao frontend.
#[derive(Serialize)]
pub struct UploadResponse {
    pub phase: UploadPhase,
    pub file_url: Option<String>,
    pub extracted: ExtractedData,
    /// Aviso não-fatal quando a extração degradou para o fallback.
    pub warning: Option<String>,
    /// Erro do storage quando o upload falhou (submissão manual ainda possível).
    pub error: Option<String>,
    /// `true` quando o resultado chegou atrasado e foi descartado.
    pub discarded: bool,
}

/// GET `/status` — health check simples.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        ready: true,
        open_forms: state.forms.read().len(),
    })
}

/// GET `/events` — Stream SSE dos eventos de upload.
///
/// Keep-alive a cada 15s; mensagens atrasadas (buffer cheio) são
/// silenciosamente descartadas.
pub async fn sse_events(
    State(state): State<AppState>,
) -> Sse<impl futures_util::Stream<Item = Result<SseEvent, Infallible>>> {
    let rx = state.events_tx.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|result| async move {
        match result {
            Ok(event) => {
                let data = serde_json::to_string(&event).ok()?;
                Some(Ok(SseEvent::default().data(data)))
            }
            Err(_) => None, // mensagens atrasadas são descartadas
        }
    });
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

// ─── Sessões de formulário ───────────────────────────────────────

/// Corpo de `POST /formularios`.
#[derive(Default, Deserialize)]
pub struct CreateFormRequest {
    /// Id de um artigo existente ⇒ modo edição; ausente ⇒ modo criação.
    #[serde(default)]
    pub article_id: Option<Uuid>,
}

/// POST `/formularios` — abre uma sessão de formulário.
///
/// Modo edição busca o registro no backend e popula os campos; o
/// pipeline de upload não roda. Modo criação começa com tudo resetado.
pub async fn create_form(
    State(state): State<AppState>,
    Json(req): Json<CreateFormRequest>,
) -> Result<Json<FormView>, AppError> {
    let form = match req.article_id {
        Some(id) => {
            let record = state.remotes.records.get(id).await?;
            tracing::info!(article_id = %id, "Formulário aberto em modo edição");
            ArticleForm::for_record(&record)
        }
        None => {
            tracing::info!("Formulário aberto em modo criação");
            ArticleForm::new()
        }
    };

    let form_id = Uuid::new_v4();
    let view = FormView::of(form_id, &form);
    state.forms.write().insert(form_id, form);
    Ok(Json(view))
}

/// POST `/formularios/{id}/arquivo` — seleciona e processa um PDF.
///
/// ## Fluxo
///
/// ```text
/// 1. Lê o campo "arquivo" do multipart
/// 2. select_file + begin_upload (lock curto; validação sai aqui)
/// 3. Storage: grava o binário → URL pública
/// 4. Extração: invoca a edge function com a URL
/// 5. apply_pipeline sob a guarda de geração (lock curto)
/// ```
///
/// Falha de extração degrada para o fallback do nome do arquivo e ainda
/// responde sucesso (com `warning`); falha de storage responde a fase
/// `failed` com o fallback aplicado — o usuário nunca fica bloqueado.
pub async fn upload_file(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let Some((file, bytes)) = read_pdf_field(&mut multipart).await? else {
        return Err(AppError::invalid(
            "arquivo",
            "nenhum arquivo PDF encontrado no upload",
        ));
    };
    let filename = file.name.clone();
    tracing::info!(form_id = %form_id, filename = %filename, size_bytes = bytes.len(), "Upload recebido");

    // ─── 2. Seleção + início (lock curto) ────────────────────────
    let generation = {
        let mut forms = state.forms.write();
        let form = forms
            .get_mut(&form_id)
            .ok_or_else(|| AppError::NotFound(format!("formulário {form_id}")))?;
        form.select_file(file)?;
        form.begin_upload()?
    };
    let _ = state.events_tx.send(UploadEvent::FileReceived {
        form_id,
        filename: filename.clone(),
        size_bytes: bytes.len(),
    });
    let _ = state.events_tx.send(UploadEvent::Sending { form_id });

    // ─── 3. Storage (sem lock) ───────────────────────────────────
    let path = storage_object_path(ARTICLES_COLLECTION, &filename, Utc::now());
    let storage_result = state.remotes.storage.upload(&path, bytes).await;

    // ─── 4. Extração (somente com o objeto gravado) ─────────────
    let extraction_result = match &storage_result {
        Ok(url) => {
            let _ = state.events_tx.send(UploadEvent::StorageDone {
                form_id,
                file_url: url.clone(),
            });
            if let Some(form) = state.forms.write().get_mut(&form_id) {
                form.note_analyzing(generation);
            }
            let _ = state.events_tx.send(UploadEvent::Analyzing { form_id });
            Some(state.remotes.extraction.extract(url, &filename).await)
        }
        Err(err) => {
            tracing::error!(form_id = %form_id, error = %err, "Falha ao gravar no storage");
            None
        }
    };

    // ─── 5. Aplicação sob a guarda de geração (lock curto) ──────
    let (outcome, extracted, current_phase) = {
        let mut forms = state.forms.write();
        let form = forms
            .get_mut(&form_id)
            .ok_or_else(|| AppError::NotFound(format!("formulário {form_id}")))?;
        let outcome = form.apply_pipeline(generation, storage_result, extraction_result);
        (outcome, form.extracted(), form.upload_phase())
    };

    let Some(outcome) = outcome else {
        // Arquivo trocado/limpo durante o voo — resultado descartado
        tracing::debug!(form_id = %form_id, "Pipeline concluiu para geração obsoleta");
        return Ok(Json(UploadResponse {
            phase: current_phase,
            file_url: None,
            extracted,
            warning: None,
            error: None,
            discarded: true,
        }));
    };

    match (&outcome.error, &outcome.warning) {
        (Some(error), _) => {
            let _ = state.events_tx.send(UploadEvent::Failed {
                form_id,
                message: error.clone(),
            });
        }
        (None, Some(warning)) => {
            let _ = state.events_tx.send(UploadEvent::Degraded {
                form_id,
                title: outcome.payload.title.clone(),
                message: warning.clone(),
            });
        }
        (None, None) => {
            let _ = state.events_tx.send(UploadEvent::ExtractionDone {
                form_id,
                title: outcome.payload.title.clone(),
                keywords: extracted.keywords.clone(),
                authors: extracted.researchers.clone(),
            });
        }
    }

    Ok(Json(UploadResponse {
        phase: outcome.phase,
        file_url: outcome.file_url,
        extracted,
        warning: outcome.warning,
        error: outcome.error,
        discarded: false,
    }))
}

/// DELETE `/formularios/{id}/arquivo` — descarta arquivo e extraídos.
///
/// Avança a geração: qualquer pipeline em voo será ignorado ao terminar.
pub async fn clear_file(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<Json<FormView>, AppError> {
    let view = {
        let mut forms = state.forms.write();
        let form = forms
            .get_mut(&form_id)
            .ok_or_else(|| AppError::NotFound(format!("formulário {form_id}")))?;
        form.clear_file();
        FormView::of(form_id, form)
    };
    let _ = state.events_tx.send(UploadEvent::Cleared { form_id });
    Ok(Json(view))
}

/// POST `/formularios/{id}/submeter` — valida e persiste o artigo.
///
/// Sucesso encerra a sessão e devolve o registro persistido. Falha de
/// validação (422) ou de persistência (502) mantém a sessão intacta —
/// o submit é sempre re-tentável.
pub async fn submit_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
    Json(draft): Json<ArticleDraft>,
) -> Result<Json<ArticleRecord>, AppError> {
    let action = {
        let mut forms = state.forms.write();
        let form = forms
            .get_mut(&form_id)
            .ok_or_else(|| AppError::NotFound(format!("formulário {form_id}")))?;
        form.submit(draft)?
    };

    let record = match action {
        SubmitAction::Create(payload) => state.remotes.records.create(&payload).await?,
        SubmitAction::Update(id, payload) => state.remotes.records.update(id, &payload).await?,
    };

    // Persistiu: sessão encerrada, estado transiente descartado
    state.forms.write().remove(&form_id);
    tracing::info!(record_id = %record.id, "Artigo persistido");
    Ok(Json(record))
}

/// POST `/formularios/{id}/cancelar` — encerra a sessão sem persistir.
pub async fn cancel_form(
    State(state): State<AppState>,
    Path(form_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let mut forms = state.forms.write();
    let mut form = forms
        .remove(&form_id)
        .ok_or_else(|| AppError::NotFound(format!("formulário {form_id}")))?;
    form.cancel();
    tracing::info!(form_id = %form_id, "Formulário cancelado");
    Ok(Json(serde_json::json!({ "cancelled": true })))
}

// ─── CRUD de artigos ─────────────────────────────────────────────

/// GET `/artigos` — lista os artigos, mais recentes primeiro.
pub async fn list_articles(
    State(state): State<AppState>,
) -> Result<Json<Vec<ArticleRecord>>, AppError> {
    Ok(Json(state.remotes.records.list().await?))
}

/// GET `/artigos/{id}` — busca um artigo por id.
pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleRecord>, AppError> {
    Ok(Json(state.remotes.records.get(id).await?))
}

/// DELETE `/artigos/{id}` — apaga um artigo.
pub async fn delete_article(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.remotes.records.delete(id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

// ─── Seccionamento de diagnóstico ────────────────────────────────

/// Corpo de `POST /diagnostico/secoes`.
#[derive(Deserialize)]
pub struct DiagnosticRequest {
    pub texto: String,
}

/// Uma seção do diagnóstico com suas linhas tipadas.
#[derive(Serialize)]
pub struct SectionView {
    pub key: SectionKey,
    pub raw_text: String,
    pub lines: Vec<FormattedLine>,
}

/// Resposta de `POST /diagnostico/secoes`, na ordem canônica das seções.
#[derive(Serialize)]
pub struct DiagnosticResponse {
    pub sections: Vec<SectionView>,
}

/// POST `/diagnostico/secoes` — divide o texto do diagnóstico em seções
/// tipadas. Nunca falha: texto sem marcadores vira seis seções vazias.
pub async fn diagnostic_sections(
    State(state): State<AppState>,
    Json(req): Json<DiagnosticRequest>,
) -> Json<DiagnosticResponse> {
    let mut sections = state.extractor.extract_sections(&req.texto);
    let sections = SectionKey::ALL
        .iter()
        .map(|key| {
            let raw_text = sections.remove(key).unwrap_or_default();
            SectionView {
                key: *key,
                lines: format_section_content(&raw_text),
                raw_text,
            }
        })
        .collect();
    Json(DiagnosticResponse { sections })
}

// ─── Utilidades ──────────────────────────────────────────────────

/// Lê o campo `arquivo` (ou `pdf`) do multipart e devolve metadados + bytes.
///
/// Corpo multipart malformado é erro de leitura, não "campo ausente" —
/// a mensagem original do decoder chega ao usuário.
async fn read_pdf_field(
    multipart: &mut Multipart,
) -> Result<Option<(UploadFile, Vec<u8>)>, AppError> {
    loop {
        let field = multipart
            .next_field()
            .await
            .map_err(|e| AppError::invalid("arquivo", &format!("multipart inválido: {e}")))?;
        let Some(field) = field else {
            return Ok(None);
        };
        let name = field.name().unwrap_or("").to_string();
        if name != "arquivo" && name != "pdf" {
            continue;
        }
        let filename = field.file_name().unwrap_or("documento.pdf").to_string();
        let mime = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::invalid("arquivo", &format!("falha ao ler upload: {e}")))?;
        let file = UploadFile {
            name: filename,
            size: bytes.len(),
            mime,
        };
        return Ok(Some((file, bytes.to_vec())));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::FromRequest;
    use axum::http::Request;

    async fn multipart_from(body: &'static str) -> Multipart {
        let request = Request::builder()
            .header(
                "content-type",
                "multipart/form-data; boundary=fronteira",
            )
            .body(Body::from(body))
            .unwrap();
        Multipart::from_request(request, &()).await.unwrap()
    }

    #[tokio::test]
    async fn well_formed_multipart_yields_file_and_bytes() {
        let mut multipart = multipart_from(
            "--fronteira\r\n\
             Content-Disposition: form-data; name=\"arquivo\"; filename=\"estudo.pdf\"\r\n\
             Content-Type: application/pdf\r\n\r\n\
             %PDF-1.4 conteudo\r\n\
             --fronteira--\r\n",
        )
        .await;

        let (file, bytes) = read_pdf_field(&mut multipart)
            .await
            .unwrap()
            .expect("field must be found");
        assert_eq!(file.name, "estudo.pdf");
        assert_eq!(file.mime, "application/pdf");
        assert_eq!(bytes, b"%PDF-1.4 conteudo");
    }

    #[tokio::test]
    async fn corrupted_multipart_surfaces_read_error() {
        // Corpo que não contém a fronteira declarada: erro de decodificação,
        // não "nenhum arquivo encontrado".
        let mut multipart = multipart_from("corpo sem fronteira alguma").await;

        let err = read_pdf_field(&mut multipart).await.unwrap_err();
        let AppError::Validation(fields) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert!(
            fields[0].message.contains("multipart"),
            "decoder message missing in {:?}",
            fields[0].message
        );
    }

    #[tokio::test]
    async fn missing_pdf_field_yields_none() {
        let mut multipart = multipart_from(
            "--fronteira\r\n\
             Content-Disposition: form-data; name=\"outro\"\r\n\r\n\
             valor\r\n\
             --fronteira--\r\n",
        )
        .await;

        assert!(read_pdf_field(&mut multipart).await.unwrap().is_none());
    }
}
