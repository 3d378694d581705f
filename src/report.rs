use crate::{
    normalize::{FrameCitation, NormalizedResult},
    util::format_score,
};
use serde::{Deserialize, Serialize};

pub const REPORT_TITLE: &str = "Relatório de Avaliação do Estado de Conservação";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegalSeverity {
    Favorable,
    Conditional,
    Unfavorable,
}

impl LegalSeverity {
    pub fn classify(status: &str) -> Self {
        match status {
            "aprovado" => LegalSeverity::Favorable,
            "condicionado" => LegalSeverity::Conditional,
            _ => LegalSeverity::Unfavorable,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LegalSeverity::Favorable => "favorável",
            LegalSeverity::Conditional => "condicional",
            LegalSeverity::Unfavorable => "desfavorável",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub label: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportBlock {
    Header {
        job_id: String,
        generated_at: String,
        analyzed_files: Vec<String>,
        /// Only set when no legal block will carry the score.
        overall_score: Option<f64>,
    },
    LegalStatus {
        status: String,
        severity: LegalSeverity,
        overall_score: Option<f64>,
        reason: Option<String>,
    },
    Conservation {
        status: String,
    },
    CategoryScores {
        scores: Vec<CategoryScore>,
    },
    Damages {
        items: Vec<String>,
    },
    Recommendations {
        items: Vec<String>,
    },
    BestFrames {
        frames: Vec<FrameCitation>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Heading,
    Body,
}

/// One logical (unwrapped) line of the rendered report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub style: LineStyle,
    pub text: String,
}

impl ReportLine {
    fn title(text: impl Into<String>) -> Self {
        Self {
            style: LineStyle::Title,
            text: text.into(),
        }
    }
    fn heading(text: impl Into<String>) -> Self {
        Self {
            style: LineStyle::Heading,
            text: text.into(),
        }
    }
    fn body(text: impl Into<String>) -> Self {
        Self {
            style: LineStyle::Body,
            text: text.into(),
        }
    }
    fn blank() -> Self {
        Self::body("")
    }
}

/// Builds the ordered block sequence shared by the screen and the export.
pub fn assemble(
    result: &NormalizedResult,
    job_id: &str,
    analyzed_files: &[String],
    generated_at: &str,
) -> Vec<ReportBlock> {
    let mut blocks = vec![ReportBlock::Header {
        job_id: job_id.to_string(),
        generated_at: generated_at.to_string(),
        analyzed_files: analyzed_files.to_vec(),
        overall_score: if result.legal_status.is_none() {
            result.overall_score
        } else {
            None
        },
    }];

    if let Some(status) = &result.legal_status {
        blocks.push(ReportBlock::LegalStatus {
            status: status.clone(),
            severity: LegalSeverity::classify(status),
            overall_score: result.overall_score,
            reason: result.legal_status_reason.clone(),
        });
    }

    if let Some(status) = &result.conservation_status {
        blocks.push(ReportBlock::Conservation {
            status: status.clone(),
        });
    }

    let scores: Vec<CategoryScore> = [
        ("Carroceria", result.bodywork_score),
        ("Pintura", result.paint_score),
        ("Vidros/Faróis", result.glass_lights_score),
        ("Pneus/Rodas", result.tires_wheels_score),
        ("Interior", result.interior_score),
    ]
    .into_iter()
    .filter_map(|(label, score)| {
        score.map(|score| CategoryScore {
            label: label.to_string(),
            score,
        })
    })
    .collect();
    if !scores.is_empty() {
        blocks.push(ReportBlock::CategoryScores { scores });
    }

    if !result.damages_detected.is_empty() {
        blocks.push(ReportBlock::Damages {
            items: result.damages_detected.clone(),
        });
    }

    if !result.recommendations.is_empty() {
        blocks.push(ReportBlock::Recommendations {
            items: result.recommendations.clone(),
        });
    }

    if !result.best_frames.is_empty() {
        blocks.push(ReportBlock::BestFrames {
            frames: result.best_frames.clone(),
        });
    }

    blocks
}

impl ReportBlock {
    /// Logical lines for this block, trailing spacer included.
    pub fn lines(&self) -> Vec<ReportLine> {
        let mut out = Vec::new();
        match self {
            ReportBlock::Header {
                job_id,
                generated_at,
                analyzed_files,
                overall_score,
            } => {
                out.push(ReportLine::title(REPORT_TITLE));
                let id = if job_id.is_empty() { "N/A" } else { job_id };
                out.push(ReportLine::body(format!("ID: {id}")));
                out.push(ReportLine::body(format!("Data: {generated_at}")));
                if !analyzed_files.is_empty() {
                    out.push(ReportLine::body(format!(
                        "Frames Analisados: {}",
                        analyzed_files.join(", ")
                    )));
                }
                if let Some(score) = overall_score {
                    out.push(ReportLine::heading(format!(
                        "Pontuação Geral: {}/100",
                        format_score(*score)
                    )));
                }
            }
            ReportBlock::LegalStatus {
                status,
                severity,
                overall_score,
                reason,
            } => {
                out.push(ReportLine::heading(format!(
                    "Status Legal: {}",
                    status.to_uppercase()
                )));
                out.push(ReportLine::body(format!("Parecer: {}", severity.label())));
                if let Some(score) = overall_score {
                    out.push(ReportLine::body(format!(
                        "Pontuação Geral: {}/100",
                        format_score(*score)
                    )));
                }
                if let Some(reason) = reason {
                    out.push(ReportLine::body(format!("Motivo: {reason}")));
                }
            }
            ReportBlock::Conservation { status } => {
                out.push(ReportLine::heading("Estado de Conservação"));
                out.push(ReportLine::body(status.clone()));
            }
            ReportBlock::CategoryScores { scores } => {
                out.push(ReportLine::heading("Avaliação por Categoria"));
                for s in scores {
                    out.push(ReportLine::body(format!(
                        "{}: {}/100",
                        s.label,
                        format_score(s.score)
                    )));
                }
            }
            ReportBlock::Damages { items } => {
                out.push(ReportLine::heading("Danos Detectados"));
                out.extend(items.iter().map(|d| ReportLine::body(format!("• {d}"))));
            }
            ReportBlock::Recommendations { items } => {
                out.push(ReportLine::heading("Recomendações"));
                out.extend(items.iter().map(|r| ReportLine::body(format!("• {r}"))));
            }
            ReportBlock::BestFrames { frames } => {
                out.push(ReportLine::heading("Frames Utilizados na Análise"));
                for (i, f) in frames.iter().enumerate() {
                    let n = i + 1;
                    let name = f.filename.clone().unwrap_or_else(|| format!("Frame {n}"));
                    let reason = f.reason.as_deref().unwrap_or("");
                    out.push(ReportLine::body(
                        format!("{n}. {name}: {reason}").trim_end().to_string(),
                    ));
                }
            }
        }
        out.push(ReportLine::blank());
        out
    }
}

pub fn report_lines(blocks: &[ReportBlock]) -> Vec<ReportLine> {
    blocks.iter().flat_map(ReportBlock::lines).collect()
}

/// Plain-text rendering for terminal output.
pub fn render_text(blocks: &[ReportBlock]) -> String {
    let mut out = String::new();
    for line in report_lines(blocks) {
        match line.style {
            LineStyle::Title => {
                out.push_str(&line.text);
                out.push('\n');
                out.push_str(&"=".repeat(line.text.chars().count()));
            }
            LineStyle::Heading => {
                out.push_str("## ");
                out.push_str(&line.text);
            }
            LineStyle::Body => out.push_str(&line.text),
        }
        out.push('\n');
    }
    out
}
