//! # Seccionador de Diagnóstico — Texto Bruto da IA em Seções Tipadas
//!
//! O relatório de diagnóstico chega como **uma única string** gerada por um
//! serviço de IA, em formato markdown-ish, sem garantia de estrutura. Este
//! módulo a divide em seis seções nomeadas e tokeniza cada seção em linhas
//! tipadas para renderização.
//!
//! ## As Seis Seções
//!
//! | Chave | Cabeçalho reconhecido |
//! |-------|----------------------|
//! | `estrategico` | "Diagnóstico Estratégico" |
//! | `conteudo` | "Plano/Estratégia de Conteúdo" |
//! | `planoAcao` | "Plano de Ação" |
//! | `marca` | "Posicionamento da Marca" |
//! | `enigma` | "Enigma" |
//! | `insights` | "Insights" |
//!
//! ## Extração Independente de Ordem
//!
//! A extração **não assume ordem fixa** das seções no texto: localiza a
//! primeira ocorrência do cabeçalho de cada seção, ordena os cabeçalhos
//! encontrados por offset, e fatia o texto de cada um até o início do
//! próximo. Cabeçalho ausente ⇒ seção vazia, nunca erro.
//!
//! ## Tokenização de Linhas
//!
//! | Prefixo/condição | Tipo | Transformação |
//! |------------------|------|---------------|
//! | linha vazia | `break` | breaks consecutivos colapsam em um |
//! | `##` | `header` | marcador removido |
//! | `•`, `-`, `*` | `bullet` | glifo removido |
//! | contém "Semana" | `week` | — |
//! | resto | `paragraph` | — |
//!
//! Falha nunca é possível: o pior caso é seis strings vazias ou todas as
//! linhas classificadas como parágrafo.

use std::collections::HashMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Chave de uma seção do diagnóstico.
///
/// Serializa com as chaves camelCase que o frontend espera
/// (`estrategico`, `conteudo`, `planoAcao`, `marca`, `enigma`, `insights`).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKey {
    Estrategico,
    Conteudo,
    PlanoAcao,
    Marca,
    Enigma,
    Insights,
}

impl SectionKey {
    /// Todas as chaves, na ordem canônica de exibição.
    pub const ALL: [SectionKey; 6] = [
        SectionKey::Estrategico,
        SectionKey::Conteudo,
        SectionKey::PlanoAcao,
        SectionKey::Marca,
        SectionKey::Enigma,
        SectionKey::Insights,
    ];
}

/// Tipo de uma linha formatada de seção.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Break,
    Header,
    Bullet,
    Week,
    Paragraph,
}

/// Linha tipada de uma seção, pronta para renderização.
///
/// Derivada do texto da seção a cada chamada — efêmera, nunca persistida.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FormattedLine {
    #[serde(rename = "type")]
    pub kind: LineKind,
    pub content: String,
}

impl FormattedLine {
    fn new(kind: LineKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }
}

/// Seccionador com os padrões de cabeçalho compilados uma única vez.
///
/// Cada seção tem um regex próprio, case-insensitive e tolerante a
/// acentuação ausente (saída de IA nem sempre acentua corretamente).
pub struct SectionExtractor {
    patterns: Vec<(SectionKey, Regex)>,
}

impl Default for SectionExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionExtractor {
    /// Compila os seis padrões de cabeçalho.
    pub fn new() -> Self {
        let table: [(SectionKey, &str); 6] = [
            (
                SectionKey::Estrategico,
                r"(?i)diagn[óo]stico\s+estrat[ée]gico",
            ),
            (
                SectionKey::Conteudo,
                r"(?i)(?:plano|estrat[ée]gia)\s+de\s+conte[úu]do",
            ),
            (SectionKey::PlanoAcao, r"(?i)plano\s+de\s+a[çc][ãa]o"),
            (SectionKey::Marca, r"(?i)posicionamento\s+d[ae]\s+marca"),
            // Cabeçalhos de uma palavra só contam no início de linha —
            // "insights" em prosa corrida não abre seção.
            (SectionKey::Enigma, r"(?im)^\s*(?:#+\s*)?enigma\b"),
            (SectionKey::Insights, r"(?im)^\s*(?:#+\s*)?insights?\b"),
        ];
        let patterns = table
            .into_iter()
            .map(|(key, pat)| (key, Regex::new(pat).expect("invalid section pattern")))
            .collect();
        Self { patterns }
    }

    /// Divide o texto do diagnóstico nas seis seções.
    ///
    /// Retorna sempre um mapa com as seis chaves. Seções cujo cabeçalho
    /// não aparece no texto ficam com string vazia.
    ///
    /// ## Algoritmo
    ///
    /// ```text
    /// 1. Para cada chave, localiza a primeira ocorrência do cabeçalho
    /// 2. Expande cada ocorrência para a linha inteira que a contém
    /// 3. Ordena os cabeçalhos encontrados por offset no texto
    /// 4. Conteúdo de cada seção = do fim da linha do cabeçalho até o
    ///    início da linha do próximo cabeçalho (ou fim do texto)
    /// ```
    pub fn extract_sections(&self, text: &str) -> HashMap<SectionKey, String> {
        let mut sections: HashMap<SectionKey, String> = SectionKey::ALL
            .iter()
            .map(|k| (*k, String::new()))
            .collect();

        // ─── 1. Localiza cada cabeçalho e sua linha ──────────────
        let mut found: Vec<(usize, usize, SectionKey)> = Vec::new();
        for (key, re) in &self.patterns {
            if let Some(m) = re.find(text) {
                let line_start = text[..m.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
                let content_start = text[m.end()..]
                    .find('\n')
                    .map(|i| m.end() + i + 1)
                    .unwrap_or(text.len());
                found.push((line_start, content_start, *key));
            }
        }

        // ─── 2. Ordena por posição e fatia ───────────────────────
        found.sort_by_key(|(line_start, _, _)| *line_start);
        for (i, (_, content_start, key)) in found.iter().enumerate() {
            let end = found
                .get(i + 1)
                .map(|(next_line_start, _, _)| *next_line_start)
                .unwrap_or(text.len());
            let raw = if *content_start < end {
                &text[*content_start..end]
            } else {
                ""
            };
            sections.insert(*key, raw.trim().to_string());
        }

        sections
    }
}

/// Tokeniza o conteúdo de uma seção em linhas tipadas.
///
/// Linhas vazias viram `break` (consecutivos colapsam em um só); linhas
/// cujo conteúdo fica em branco após remover o marcador são descartadas.
pub fn format_section_content(content: &str) -> Vec<FormattedLine> {
    let mut lines = Vec::new();

    for raw in content.split('\n') {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            // Colapsa breaks consecutivos
            if lines.last().map(|l: &FormattedLine| l.kind) != Some(LineKind::Break) {
                lines.push(FormattedLine::new(LineKind::Break, ""));
            }
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix("##") {
            let heading = rest.trim_start_matches('#').trim();
            if !heading.is_empty() {
                lines.push(FormattedLine::new(LineKind::Header, heading));
            }
            continue;
        }

        if let Some(rest) = strip_bullet(trimmed) {
            if !rest.is_empty() {
                lines.push(FormattedLine::new(LineKind::Bullet, rest));
            }
            continue;
        }

        if trimmed.contains("Semana") {
            lines.push(FormattedLine::new(LineKind::Week, trimmed));
            continue;
        }

        lines.push(FormattedLine::new(LineKind::Paragraph, trimmed));
    }

    lines
}

/// Remove o glifo de bullet (`•`, `-`, `*`) do início da linha, se houver.
fn strip_bullet(line: &str) -> Option<&str> {
    for glyph in ['•', '-', '*'] {
        if let Some(rest) = line.strip_prefix(glyph) {
            return Some(rest.trim());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> SectionExtractor {
        SectionExtractor::new()
    }

    // ─── extract_sections ──────────────────────────────────────

    #[test]
    fn no_headers_yields_six_empty_sections() {
        let sections = extractor().extract_sections("texto qualquer sem marcadores");
        assert_eq!(sections.len(), 6);
        for key in SectionKey::ALL {
            assert_eq!(sections[&key], "", "expected empty section for {key:?}");
        }
    }

    #[test]
    fn empty_input_yields_six_empty_sections() {
        let sections = extractor().extract_sections("");
        assert_eq!(sections.len(), 6);
        assert!(sections.values().all(|s| s.is_empty()));
    }

    #[test]
    fn sections_in_order_are_sliced_between_headers() {
        let text = "## Diagnóstico Estratégico\n\
                    Sua clínica precisa de posicionamento.\n\
                    ## Plano de Conteúdo\n\
                    Poste três vezes por semana.\n\
                    ## Plano de Ação\n\
                    Semana 1: gravar vídeos.";
        let sections = extractor().extract_sections(text);
        assert_eq!(
            sections[&SectionKey::Estrategico],
            "Sua clínica precisa de posicionamento."
        );
        assert_eq!(
            sections[&SectionKey::Conteudo],
            "Poste três vezes por semana."
        );
        assert_eq!(sections[&SectionKey::PlanoAcao], "Semana 1: gravar vídeos.");
        assert_eq!(sections[&SectionKey::Marca], "");
    }

    #[test]
    fn section_excludes_next_header_line() {
        let text = "Diagnóstico Estratégico\nconteúdo A\nPlano de Ação\nconteúdo B";
        let sections = extractor().extract_sections(text);
        assert_eq!(sections[&SectionKey::Estrategico], "conteúdo A");
        assert!(!sections[&SectionKey::Estrategico].contains("Plano de Ação"));
        assert_eq!(sections[&SectionKey::PlanoAcao], "conteúdo B");
    }

    #[test]
    fn out_of_order_sections_still_extract_fully() {
        // A ordem no texto difere da ordem canônica — extração por offset
        // deve funcionar do mesmo jeito.
        let text = "## Plano de Ação\nagir primeiro\n\
                    ## Enigma\nmistério da marca\n\
                    ## Diagnóstico Estratégico\ndiagnosticar por último";
        let sections = extractor().extract_sections(text);
        assert_eq!(sections[&SectionKey::PlanoAcao], "agir primeiro");
        assert_eq!(sections[&SectionKey::Enigma], "mistério da marca");
        assert_eq!(
            sections[&SectionKey::Estrategico],
            "diagnosticar por último"
        );
    }

    #[test]
    fn unaccented_headers_are_recognized() {
        let text = "Diagnostico Estrategico\nsem acento\nPlano de Acao\ntambém sem";
        let sections = extractor().extract_sections(text);
        assert_eq!(sections[&SectionKey::Estrategico], "sem acento");
        assert_eq!(sections[&SectionKey::PlanoAcao], "também sem");
    }

    #[test]
    fn prose_mention_does_not_open_single_word_section() {
        // "insights"/"enigma" citados no corpo de outra seção não podem
        // sequestrar o fatiamento por primeira ocorrência.
        let text = "## Diagnóstico Estratégico\n\
                    O relatório traz insights valiosos e um enigma central.\n\
                    ## Insights\n\
                    conteúdo real de insights";
        let sections = extractor().extract_sections(text);
        assert_eq!(
            sections[&SectionKey::Estrategico],
            "O relatório traz insights valiosos e um enigma central."
        );
        assert_eq!(sections[&SectionKey::Insights], "conteúdo real de insights");
        assert_eq!(sections[&SectionKey::Enigma], "");
    }

    #[test]
    fn single_word_header_without_marker_still_opens_section() {
        let text = "Enigma\na pergunta que fica\nInsights\nobservações";
        let sections = extractor().extract_sections(text);
        assert_eq!(sections[&SectionKey::Enigma], "a pergunta que fica");
        assert_eq!(sections[&SectionKey::Insights], "observações");
    }

    #[test]
    fn last_section_runs_to_end_of_text() {
        let text = "## Insights\nprimeira linha\nsegunda linha";
        let sections = extractor().extract_sections(text);
        assert_eq!(sections[&SectionKey::Insights], "primeira linha\nsegunda linha");
    }

    #[test]
    fn header_at_end_without_body_is_empty() {
        let text = "corpo solto\n## Marca? não: Posicionamento da Marca";
        let sections = extractor().extract_sections(text);
        assert_eq!(sections[&SectionKey::Marca], "");
    }

    // ─── format_section_content ────────────────────────────────

    #[test]
    fn empty_content_yields_no_lines() {
        assert!(format_section_content("").is_empty());
    }

    #[test]
    fn only_newlines_collapse_to_single_break() {
        let lines = format_section_content("\n\n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].kind, LineKind::Break);
    }

    #[test]
    fn header_marker_is_stripped() {
        let lines = format_section_content("## Pilares de Conteúdo");
        assert_eq!(
            lines,
            vec![FormattedLine::new(LineKind::Header, "Pilares de Conteúdo")]
        );
    }

    #[test]
    fn bullet_glyphs_are_stripped() {
        let lines = format_section_content("• primeiro\n- segundo\n* terceiro");
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.kind == LineKind::Bullet));
        assert_eq!(lines[0].content, "primeiro");
        assert_eq!(lines[1].content, "segundo");
        assert_eq!(lines[2].content, "terceiro");
    }

    #[test]
    fn week_lines_are_detected() {
        let lines = format_section_content("Semana 2: publicar depoimentos");
        assert_eq!(lines[0].kind, LineKind::Week);
    }

    #[test]
    fn bullet_wins_over_week() {
        // Prefixo tem prioridade sobre a substring "Semana"
        let lines = format_section_content("- Semana 1: gravar");
        assert_eq!(lines[0].kind, LineKind::Bullet);
        assert_eq!(lines[0].content, "Semana 1: gravar");
    }

    #[test]
    fn blank_after_marker_is_dropped() {
        let lines = format_section_content("##\n•\nreal");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0], FormattedLine::new(LineKind::Paragraph, "real"));
    }

    #[test]
    fn mixed_content_keeps_order() {
        let text = "## Título\n\ntexto corrido\n• item\nSemana 3: revisar";
        let kinds: Vec<LineKind> = format_section_content(text)
            .into_iter()
            .map(|l| l.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Header,
                LineKind::Break,
                LineKind::Paragraph,
                LineKind::Bullet,
                LineKind::Week,
            ]
        );
    }

    #[test]
    fn section_key_serializes_camel_case() {
        assert_eq!(
            serde_json::to_string(&SectionKey::PlanoAcao).unwrap(),
            "\"planoAcao\""
        );
        assert_eq!(
            serde_json::to_string(&SectionKey::Estrategico).unwrap(),
            "\"estrategico\""
        );
    }
}
