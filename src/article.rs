//! # Formulário de Artigo — Validação, Composição e Persistência
//!
//! O [`ArticleForm`] é o controlador de um formulário aberto: compõe a
//! máquina de upload ([`crate::upload::UploadHandler`]) com o estado
//! extraído ([`crate::extracted::ExtractedDataStore`]) e o rascunho de
//! campos validados, e produz o payload de persistência no submit.
//!
//! ## Ciclos de Vida
//!
//! ```text
//! Criação:  new()            → tudo resetado, pipeline nunca rodou
//! Edição:   for_record(rec)  → campos + URL do arquivo vêm do registro;
//!                              pipeline NÃO roda
//! Submit:   validate → merge rascunho + extraídos → create/update remoto
//! Cancel:   reset de todo estado transiente, nada persistido
//! ```
//!
//! Erros de validação bloqueiam o submit com mensagens por campo; erros
//! de persistência são re-tentáveis e deixam o rascunho intacto (quem
//! falha é a chamada remota, o estado local não é tocado).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{AppError, FieldError};
use crate::extracted::{ExtractedData, ExtractedDataStore};
use crate::remote::extraction::ExtractionPayload;
use crate::upload::{Generation, UploadFile, UploadHandler, UploadOutcome, UploadPhase};

/// Idioma de origem usado quando o rascunho não informa um.
pub const DEFAULT_LANGUAGE: &str = "pt";

/// Discriminador de tipo na coleção de documentos.
pub const DOC_TYPE_ARTICLE: &str = "artigo_cientifico";

/// Tamanho mínimo do título.
const MIN_TITLE_CHARS: usize = 3;

/// Registro persistido de um artigo científico. Possuído pelo backend
/// remoto; a UI só o lê e o reescreve por inteiro (last write wins).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArticleRecord {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub doc_type: String,
    pub source_language: String,
    pub file_url: Option<String>,
    pub processing_status: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub external_link: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Payload enviado ao backend em create/update — o registro sem os
/// campos que o servidor controla (id, updated_at).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ArticlePayload {
    pub title: String,
    pub description: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub doc_type: String,
    pub source_language: String,
    pub file_url: Option<String>,
    pub processing_status: String,
    pub keywords: Vec<String>,
    pub authors: Vec<String>,
    pub external_link: Option<String>,
}

/// Rascunho de campos preenchidos pelo usuário.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ArticleDraft {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    pub equipment_id: Option<Uuid>,
    pub source_language: Option<String>,
    pub external_link: Option<String>,
}

impl ArticleDraft {
    /// Valida o rascunho, acumulando mensagens por campo.
    ///
    /// - título: obrigatório, mínimo de 3 caracteres (após trim)
    /// - link externo: opcional, mas precisa ser URL bem formada se presente
    pub fn validate(&self) -> Result<(), AppError> {
        let mut fields = Vec::new();

        if self.title.trim().chars().count() < MIN_TITLE_CHARS {
            fields.push(FieldError::new(
                "titulo",
                "título deve ter ao menos 3 caracteres",
            ));
        }

        if let Some(link) = self.external_link.as_deref() {
            if !link.trim().is_empty() && Url::parse(link.trim()).is_err() {
                fields.push(FieldError::new("link_externo", "URL malformada"));
            }
        }

        if fields.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(fields))
        }
    }
}

/// Ação de persistência decidida pelo submit: criar ou atualizar.
#[derive(Clone, Debug, PartialEq)]
pub enum SubmitAction {
    Create(ArticlePayload),
    Update(Uuid, ArticlePayload),
}

/// Controlador de um formulário de artigo aberto.
///
/// Dono exclusivo do upload handler e do store de dados extraídos —
/// exatamente um formulário aberto por vez escreve nesses estados.
#[derive(Debug, Default)]
pub struct ArticleForm {
    record_id: Option<Uuid>,
    draft: ArticleDraft,
    /// URL de arquivo herdada de um registro em edição (sem pipeline).
    existing_file_url: Option<String>,
    /// Status de processamento herdado do registro em edição; vale
    /// enquanto nenhum pipeline novo rodar nesta sessão.
    stored_status: Option<String>,
    upload: UploadHandler,
    extracted: ExtractedDataStore,
}

impl ArticleForm {
    /// Modo criação: tudo resetado, nenhum pipeline rodou.
    pub fn new() -> Self {
        Self::default()
    }

    /// Modo edição: campos e URL do arquivo vêm do registro existente.
    /// O pipeline de upload **não** roda.
    pub fn for_record(record: &ArticleRecord) -> Self {
        let mut extracted = ExtractedDataStore::new();
        extracted.set_from_initial(Some(record));
        Self {
            record_id: Some(record.id),
            draft: ArticleDraft {
                title: record.title.clone(),
                description: record.description.clone(),
                equipment_id: record.equipment_id,
                source_language: Some(record.source_language.clone()),
                external_link: record.external_link.clone(),
            },
            existing_file_url: record.file_url.clone(),
            stored_status: Some(record.processing_status.clone()),
            upload: UploadHandler::new(),
            extracted,
        }
    }

    pub fn record_id(&self) -> Option<Uuid> {
        self.record_id
    }

    pub fn draft(&self) -> &ArticleDraft {
        &self.draft
    }

    pub fn extracted(&self) -> ExtractedData {
        self.extracted.snapshot()
    }

    pub fn upload_phase(&self) -> UploadPhase {
        self.upload.phase()
    }

    pub fn upload_warning(&self) -> Option<&str> {
        self.upload.warning()
    }

    /// URL efetiva do arquivo: a do upload corrente, senão a herdada.
    pub fn file_url(&self) -> Option<&str> {
        self.upload.file_url().or(self.existing_file_url.as_deref())
    }

    /// Seleciona um arquivo. Aceitação reseta os dados extraídos junto
    /// (arquivo e extração sempre resetam juntos); rejeição não toca nada.
    pub fn select_file(&mut self, file: UploadFile) -> Result<Generation, AppError> {
        let generation = self.upload.select_file(file)?;
        self.extracted.reset();
        self.existing_file_url = None;
        self.stored_status = None;
        Ok(generation)
    }

    /// Inicia o pipeline de upload (delegado à máquina de estados).
    pub fn begin_upload(&mut self) -> Result<Generation, AppError> {
        self.upload.begin_upload()
    }

    /// Marco de progresso entre storage e extração.
    pub fn note_analyzing(&mut self, generation: Generation) {
        self.upload.note_analyzing(generation);
    }

    /// Aplica o resultado do pipeline; resultados atrasados retornam
    /// `None` e não tocam no estado. Sucesso (real ou degradado) aplica o
    /// payload ao store de dados extraídos.
    pub fn apply_pipeline(
        &mut self,
        generation: Generation,
        storage_result: Result<String, AppError>,
        extraction_result: Option<Result<ExtractionPayload, AppError>>,
    ) -> Option<UploadOutcome> {
        let outcome = self
            .upload
            .apply_pipeline(generation, storage_result, extraction_result)?;
        self.extracted.set_from_extraction(&outcome.payload);
        Some(outcome)
    }

    /// Descarta arquivo e dados extraídos, voltando a `Idle`.
    pub fn clear_file(&mut self) {
        self.upload.clear();
        self.extracted.reset();
        self.existing_file_url = None;
        self.stored_status = None;
    }

    /// Valida o rascunho e monta a ação de persistência, mesclando os
    /// campos do formulário com keywords/pesquisadores extraídos.
    ///
    /// Falha de validação não toca no estado; o rascunho recebido é
    /// guardado para o formulário permanecer re-tentável.
    pub fn submit(&mut self, draft: ArticleDraft) -> Result<SubmitAction, AppError> {
        draft.validate()?;
        self.draft = draft;
        let payload = self.build_payload();
        Ok(match self.record_id {
            Some(id) => SubmitAction::Update(id, payload),
            None => SubmitAction::Create(payload),
        })
    }

    /// Reseta todo o estado transiente sem persistir nada.
    pub fn cancel(&mut self) {
        self.record_id = None;
        self.draft = ArticleDraft::default();
        self.existing_file_url = None;
        self.stored_status = None;
        self.upload.clear();
        self.extracted.reset();
    }

    fn build_payload(&self) -> ArticlePayload {
        let extracted = self.extracted.snapshot();
        let description = self
            .draft
            .description
            .clone()
            .filter(|d| !d.trim().is_empty())
            .or_else(|| {
                (!extracted.description.is_empty()).then(|| extracted.description.clone())
            });

        ArticlePayload {
            title: self.draft.title.trim().to_string(),
            description,
            equipment_id: self.draft.equipment_id,
            doc_type: DOC_TYPE_ARTICLE.to_string(),
            source_language: self
                .draft
                .source_language
                .clone()
                .filter(|l| !l.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            file_url: self.file_url().map(str::to_string),
            processing_status: self.processing_status(),
            keywords: extracted.keywords,
            authors: extracted.researchers,
            external_link: self
                .draft
                .external_link
                .clone()
                .filter(|l| !l.trim().is_empty()),
        }
    }

    /// Status de processamento do payload.
    ///
    /// Um pipeline rodou nesta sessão ⇒ derivado dele: extração plena
    /// vira `processado`, degradada ou falha vira `pendente`. Nenhum
    /// pipeline rodou (edição só de metadados) ⇒ o status gravado no
    /// registro é preservado.
    fn processing_status(&self) -> String {
        match self.upload.phase() {
            UploadPhase::Succeeded if self.upload.warning().is_none() => "processado".to_string(),
            UploadPhase::Succeeded | UploadPhase::Failed => "pendente".to_string(),
            _ => self
                .stored_status
                .clone()
                .unwrap_or_else(|| "pendente".to_string()),
        }
    }
}
