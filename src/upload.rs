//! # Pipeline de Upload — Ciclo de Vida de Um Arquivo
//!
//! O [`UploadHandler`] rege o ciclo de vida de exatamente um PDF:
//!
//! ```text
//! Idle ──select_file──▶ FileSelected ──begin_upload──▶ Uploading
//!   ▲                                                     │
//!   │                              ┌──────────────────────┤
//!   └───────── clear() ◀───────────┤                      │
//!                                  ▼                      ▼
//!                               Failed                Succeeded
//!                          (storage falhou)   (extração ok OU degradada)
//! ```
//!
//! ## Ordenação e Degradação
//!
//! O pipeline sempre grava no storage **antes** de invocar a extração.
//! Falha de extração não é fatal: o título é sintetizado do nome do
//! arquivo (extensão removida, `_` → espaço) e o upload conta como
//! `Succeeded` com um aviso — o arquivo é utilizável, só a extração
//! inteligente faltou. Falha do próprio storage leva a `Failed`, mas o
//! fallback de título ainda é aplicado para o usuário seguir manualmente.
//!
//! ## Guarda de Geração (respostas atrasadas)
//!
//! Cada seleção/limpeza incrementa um contador de geração. Resultados de
//! pipeline chegam carimbados com a geração em que começaram; se o estado
//! já avançou (arquivo trocado ou limpo), o resultado atrasado é
//! descartado sem tocar em nada — nunca há mistura de dados de dois
//! arquivos.

use serde::Serialize;

use crate::error::AppError;
use crate::remote::extraction::ExtractionPayload;

/// Teto de tamanho aceito para o binário (10 MB).
pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;

/// Único mime type aceito.
pub const ACCEPTED_MIME: &str = "application/pdf";

/// Carimbo de geração de um pipeline em andamento.
pub type Generation = u64;

/// Fase atual do ciclo de vida do upload.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Idle,
    FileSelected,
    Uploading,
    Succeeded,
    Failed,
}

/// Metadados do binário selecionado pelo usuário.
///
/// Possuído exclusivamente pelo handler durante uma tentativa de upload;
/// substituído por inteiro em re-seleção.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct UploadFile {
    pub name: String,
    pub size: usize,
    pub mime: String,
}

/// Resultado consolidado de um pipeline, já filtrado pela guarda de geração.
#[derive(Clone, Debug, PartialEq)]
pub struct UploadOutcome {
    pub phase: UploadPhase,
    /// URL pública do objeto quando o storage gravou com sucesso.
    pub file_url: Option<String>,
    /// Campos a aplicar no `ExtractedDataStore` (extração real ou fallback).
    pub payload: ExtractionPayload,
    /// Aviso não-fatal quando a extração degradou para o fallback.
    pub warning: Option<String>,
    /// Erro do storage quando o upload em si falhou.
    pub error: Option<String>,
}

/// Máquina de estados do upload de um arquivo.
#[derive(Debug)]
pub struct UploadHandler {
    phase: UploadPhase,
    file: Option<UploadFile>,
    file_url: Option<String>,
    progress: Option<String>,
    warning: Option<String>,
    generation: Generation,
}

impl Default for UploadHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadHandler {
    pub fn new() -> Self {
        Self {
            phase: UploadPhase::Idle,
            file: None,
            file_url: None,
            progress: None,
            warning: None,
            generation: 0,
        }
    }

    pub fn phase(&self) -> UploadPhase {
        self.phase
    }

    pub fn file(&self) -> Option<&UploadFile> {
        self.file.as_ref()
    }

    pub fn file_url(&self) -> Option<&str> {
        self.file_url.as_deref()
    }

    pub fn progress_message(&self) -> Option<&str> {
        self.progress.as_deref()
    }

    pub fn warning(&self) -> Option<&str> {
        self.warning.as_deref()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Seleciona um arquivo, validando tipo e tamanho.
    ///
    /// Rejeição **não muta nada** — o handler permanece na fase anterior
    /// com o arquivo anterior (se houver) intacto. Aceitação descarta o
    /// estado do arquivo anterior, avança a geração e fica `FileSelected`.
    ///
    /// Quem chama deve resetar o `ExtractedDataStore` junto (invariante:
    /// arquivo e dados extraídos sempre resetam juntos).
    pub fn select_file(&mut self, file: UploadFile) -> Result<Generation, AppError> {
        if file.mime != ACCEPTED_MIME {
            return Err(AppError::invalid(
                "arquivo",
                "apenas arquivos PDF são aceitos",
            ));
        }
        if file.size > MAX_FILE_BYTES {
            return Err(AppError::invalid(
                "arquivo",
                "arquivo excede o limite de 10 MB",
            ));
        }

        self.generation += 1;
        self.phase = UploadPhase::FileSelected;
        self.file = Some(file);
        self.file_url = None;
        self.progress = None;
        self.warning = None;
        Ok(self.generation)
    }

    /// Inicia o pipeline: exige arquivo selecionado, entra em `Uploading`
    /// e devolve o carimbo de geração que o pipeline deve carregar.
    pub fn begin_upload(&mut self) -> Result<Generation, AppError> {
        if self.file.is_none() {
            return Err(AppError::invalid("arquivo", "nenhum arquivo selecionado"));
        }
        self.phase = UploadPhase::Uploading;
        self.progress = Some("Enviando arquivo...".to_string());
        Ok(self.generation)
    }

    /// Marco de progresso entre storage e extração.
    pub fn note_analyzing(&mut self, generation: Generation) {
        if generation == self.generation {
            self.progress = Some("Analisando conteúdo...".to_string());
        }
    }

    /// Aplica o resultado do pipeline, se a geração ainda for a corrente.
    ///
    /// `storage_result` é o resultado da gravação no storage;
    /// `extraction_result` só existe quando o storage gravou (a extração
    /// nunca roda sem URL). Retorna `None` quando o resultado chegou
    /// atrasado e foi descartado.
    pub fn apply_pipeline(
        &mut self,
        generation: Generation,
        storage_result: Result<String, AppError>,
        extraction_result: Option<Result<ExtractionPayload, AppError>>,
    ) -> Option<UploadOutcome> {
        if generation != self.generation {
            tracing::debug!(
                stale = generation,
                current = self.generation,
                "Resultado de pipeline atrasado descartado"
            );
            return None;
        }

        let filename = self
            .file
            .as_ref()
            .map(|f| f.name.clone())
            .unwrap_or_default();
        self.progress = None;

        let outcome = match storage_result {
            Err(err) => {
                // Storage falhou: Failed, mas o fallback ainda popula o
                // título para o usuário não ficar bloqueado.
                self.phase = UploadPhase::Failed;
                self.file_url = None;
                UploadOutcome {
                    phase: UploadPhase::Failed,
                    file_url: None,
                    payload: fallback_payload(&filename),
                    warning: None,
                    error: Some(err.to_string()),
                }
            }
            Ok(url) => {
                self.file_url = Some(url.clone());
                self.phase = UploadPhase::Succeeded;
                match extraction_result {
                    Some(Ok(payload)) => UploadOutcome {
                        phase: UploadPhase::Succeeded,
                        file_url: Some(url),
                        payload,
                        warning: None,
                        error: None,
                    },
                    other => {
                        if let Some(Err(err)) = &other {
                            tracing::warn!(
                                error = %err,
                                "Extração falhou; aplicando fallback do nome do arquivo"
                            );
                        }
                        let message = "Extração automática indisponível; \
                                       dados derivados do nome do arquivo"
                            .to_string();
                        self.warning = Some(message.clone());
                        UploadOutcome {
                            phase: UploadPhase::Succeeded,
                            file_url: Some(url),
                            payload: fallback_payload(&filename),
                            warning: Some(message),
                            error: None,
                        }
                    }
                }
            }
        };

        Some(outcome)
    }

    /// Retorna a `Idle`, descartando arquivo, URL e progresso. Avança a
    /// geração para que qualquer pipeline em voo seja ignorado ao chegar.
    pub fn clear(&mut self) {
        self.generation += 1;
        self.phase = UploadPhase::Idle;
        self.file = None;
        self.file_url = None;
        self.progress = None;
        self.warning = None;
    }
}

/// Sintetiza o payload de fallback a partir do nome do arquivo:
/// extensão removida, underscores viram espaços.
pub fn fallback_payload(filename: &str) -> ExtractionPayload {
    ExtractionPayload {
        title: Some(fallback_title(filename)),
        ..ExtractionPayload::default()
    }
}

/// "estudo_laser_2024.pdf" → "estudo laser 2024".
pub fn fallback_title(filename: &str) -> String {
    let stem = filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(filename);
    stem.replace('_', " ")
}
