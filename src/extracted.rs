//! # Dados Extraídos — Estado Reconciliado do Formulário
//!
//! O [`ExtractedDataStore`] guarda os quatro campos que a extração remota
//! produz (título, descrição, palavras-chave, pesquisadores) e reconcilia
//! três fontes possíveis:
//!
//! | Fonte | Método | Comportamento |
//! |-------|--------|---------------|
//! | Registro existente (modo edição) | [`set_from_initial`](ExtractedDataStore::set_from_initial) | popula só os campos presentes no registro |
//! | Resposta da extração | [`set_from_extraction`](ExtractedDataStore::set_from_extraction) | sobrescreve só os campos presentes no payload |
//! | Reset explícito | [`reset`](ExtractedDataStore::reset) | esvazia os quatro campos |
//!
//! ## Invariante
//!
//! Toda transição para um "documento novo" passa por um `reset()` completo
//! antes de qualquer dado novo ser aplicado — nunca há dado residual de um
//! arquivo anterior ou de um registro editado antes.

use serde::{Deserialize, Serialize};

use crate::article::ArticleRecord;
use crate::remote::extraction::ExtractionPayload;

/// Os quatro campos produzidos pela extração de um artigo científico.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedData {
    pub title: String,
    pub description: String,
    pub keywords: Vec<String>,
    pub researchers: Vec<String>,
}

impl ExtractedData {
    /// `true` quando nenhum campo carrega dado.
    pub fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.description.is_empty()
            && self.keywords.is_empty()
            && self.researchers.is_empty()
    }
}

/// Dono exclusivo dos dados extraídos de um formulário aberto.
///
/// Exatamente uma instância existe por formulário — nunca há escritores
/// concorrentes. Mutação só pelos três métodos públicos.
#[derive(Debug, Default)]
pub struct ExtractedDataStore {
    data: ExtractedData,
}

impl ExtractedDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot imutável do estado atual.
    pub fn snapshot(&self) -> ExtractedData {
        self.data.clone()
    }

    /// Popula a partir de um registro existente (modo edição), ou reseta
    /// tudo quando `None` (modo criação).
    ///
    /// Só os campos presentes no registro são aplicados — um registro sem
    /// descrição não apaga nem inventa descrição.
    pub fn set_from_initial(&mut self, record: Option<&ArticleRecord>) {
        // Reset completo antes de aplicar qualquer dado novo
        self.reset();
        let Some(record) = record else {
            return;
        };
        self.data.title = record.title.clone();
        if let Some(description) = &record.description {
            self.data.description = description.clone();
        }
        self.data.keywords = record.keywords.clone();
        self.data.researchers = record.authors.clone();
    }

    /// Aplica o payload da extração remota, sobrescrevendo apenas os
    /// campos presentes e preservando os demais.
    pub fn set_from_extraction(&mut self, payload: &ExtractionPayload) {
        if let Some(title) = &payload.title {
            self.data.title = title.clone();
        }
        if let Some(conclusion) = &payload.conclusion {
            self.data.description = conclusion.clone();
        }
        if let Some(keywords) = &payload.keywords {
            self.data.keywords = keywords.clone();
        }
        if let Some(authors) = &payload.authors {
            self.data.researchers = authors.clone();
        }
    }

    /// Esvazia os quatro campos incondicionalmente.
    pub fn reset(&mut self) {
        self.data = ExtractedData::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_record() -> ArticleRecord {
        ArticleRecord {
            id: Uuid::new_v4(),
            title: "Laser fracionado em cicatrizes".into(),
            description: Some("Estudo comparativo".into()),
            equipment_id: None,
            doc_type: "artigo_cientifico".into(),
            source_language: "pt".into(),
            file_url: None,
            processing_status: "concluido".into(),
            keywords: vec!["laser".into(), "cicatriz".into()],
            authors: vec!["Silva, M.".into()],
            external_link: None,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn reset_empties_all_four_fields() {
        let mut store = ExtractedDataStore::new();
        store.set_from_initial(Some(&sample_record()));
        assert!(!store.snapshot().is_empty());

        store.reset();
        assert_eq!(store.snapshot(), ExtractedData::default());
    }

    #[test]
    fn initial_none_resets_everything() {
        let mut store = ExtractedDataStore::new();
        store.set_from_initial(Some(&sample_record()));
        store.set_from_initial(None);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn initial_record_populates_present_fields() {
        let mut store = ExtractedDataStore::new();
        store.set_from_initial(Some(&sample_record()));
        let data = store.snapshot();
        assert_eq!(data.title, "Laser fracionado em cicatrizes");
        assert_eq!(data.description, "Estudo comparativo");
        assert_eq!(data.keywords, vec!["laser", "cicatriz"]);
        assert_eq!(data.researchers, vec!["Silva, M."]);
    }

    #[test]
    fn initial_record_without_description_leaves_it_empty() {
        let mut record = sample_record();
        record.description = None;
        let mut store = ExtractedDataStore::new();
        store.set_from_initial(Some(&record));
        assert_eq!(store.snapshot().description, "");
    }

    #[test]
    fn extraction_overwrites_only_present_fields() {
        let mut store = ExtractedDataStore::new();
        store.set_from_initial(Some(&sample_record()));

        let payload = ExtractionPayload {
            title: Some("Título novo".into()),
            conclusion: None,
            keywords: None,
            authors: Some(vec!["Costa, A.".into()]),
        };
        store.set_from_extraction(&payload);

        let data = store.snapshot();
        assert_eq!(data.title, "Título novo");
        // Campos ausentes no payload ficam intactos
        assert_eq!(data.description, "Estudo comparativo");
        assert_eq!(data.keywords, vec!["laser", "cicatriz"]);
        assert_eq!(data.researchers, vec!["Costa, A."]);
    }

    #[test]
    fn new_document_never_shows_stale_data() {
        let mut store = ExtractedDataStore::new();
        store.set_from_extraction(&ExtractionPayload {
            title: Some("Antigo".into()),
            conclusion: Some("Conclusão antiga".into()),
            keywords: Some(vec!["a".into()]),
            authors: Some(vec!["X".into()]),
        });

        // Novo documento: reset antes de aplicar qualquer coisa
        store.reset();
        store.set_from_extraction(&ExtractionPayload {
            title: Some("Novo".into()),
            conclusion: None,
            keywords: None,
            authors: None,
        });

        let data = store.snapshot();
        assert_eq!(data.title, "Novo");
        assert_eq!(data.description, "");
        assert!(data.keywords.is_empty());
        assert!(data.researchers.is_empty());
    }
}
