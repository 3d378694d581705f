use crate::{
    config::Export,
    pdf,
    report::{report_lines, LineStyle, ReportBlock, ReportLine},
    util::file_safe_id,
};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;

/// Page geometry in millimetres; font sizes in points.
#[derive(Debug, Clone, PartialEq)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin_left: f32,
    pub margin_right: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    pub line_height: f32,
    pub title_size: f32,
    pub heading_size: f32,
    pub body_size: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        Self::from_config(&Export::default())
    }
}

impl PageGeometry {
    pub fn from_config(cfg: &Export) -> Self {
        Self {
            width: cfg.page_width_mm,
            height: cfg.page_height_mm,
            margin_left: cfg.margin_left_mm,
            margin_right: cfg.margin_right_mm,
            margin_top: cfg.margin_top_mm,
            margin_bottom: cfg.margin_bottom_mm,
            line_height: cfg.line_height_mm.max(0.1),
            title_size: cfg.title_font_size,
            heading_size: cfg.heading_font_size,
            body_size: cfg.body_font_size,
        }
    }

    pub fn text_width(&self) -> f32 {
        (self.width - self.margin_left - self.margin_right).max(1.0)
    }

    fn bottom_limit(&self) -> f32 {
        self.height - self.margin_bottom
    }

    /// Lines that fit on one page, stepping the cursor the same way `layout` does.
    pub fn lines_per_page(&self) -> usize {
        let mut y = self.margin_top;
        let mut n = 0;
        while y <= self.bottom_limit() {
            n += 1;
            y += self.line_height;
        }
        n.max(1)
    }

    fn style(&self, style: LineStyle) -> (f32, bool) {
        match style {
            LineStyle::Title => (self.title_size, true),
            LineStyle::Heading => (self.heading_size, true),
            LineStyle::Body => (self.body_size, false),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    pub bold: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub lines: Vec<PlacedLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
}

impl Document {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Greedy top-to-bottom layout. Wrapping happens before the overflow check so
/// a wrapped segment never straddles two pages.
pub fn layout(lines: &[ReportLine], geometry: &PageGeometry) -> Document {
    let mut pages = vec![Page::default()];
    let mut y = geometry.margin_top;
    let limit = geometry.bottom_limit();

    for line in lines {
        let (size, bold) = geometry.style(line.style);
        let text: String = line.text.nfc().collect();
        for segment in wrap(&text, size, bold, geometry.text_width()) {
            let page_started = pages.last().is_some_and(|p| !p.lines.is_empty());
            if y > limit && page_started {
                pages.push(Page::default());
                y = geometry.margin_top;
            }
            if let Some(page) = pages.last_mut() {
                page.lines.push(PlacedLine {
                    text: segment,
                    x: geometry.margin_left,
                    y,
                    font_size: size,
                    bold,
                });
            }
            y += geometry.line_height;
        }
    }

    Document {
        geometry: geometry.clone(),
        pages,
    }
}

pub fn layout_blocks(blocks: &[ReportBlock], geometry: &PageGeometry) -> Document {
    layout(&report_lines(blocks), geometry)
}

/// Splits text into segments no wider than `max_width` mm. Empty input yields one empty segment.
pub fn wrap(text: &str, font_size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if text_width_mm(&candidate, font_size, bold) <= max_width {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                out.push(std::mem::take(&mut current));
            }
            if text_width_mm(word, font_size, bold) <= max_width {
                current = word.to_string();
            } else {
                let mut pieces = split_long_word(word, font_size, bold, max_width);
                current = pieces.pop().unwrap_or_default();
                out.extend(pieces);
            }
        }
        out.push(current);
    }
    out
}

fn split_long_word(word: &str, font_size: f32, bold: bool, max_width: f32) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && text_width_mm(&current, font_size, bold) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    pieces.push(current);
    pieces
}

const PT_TO_MM: f32 = 25.4 / 72.0;
const BOLD_WIDTH_FACTOR: f32 = 1.1;

pub fn text_width_mm(text: &str, font_size: f32, bold: bool) -> f32 {
    let units: u32 = text.chars().map(glyph_width).sum();
    let factor = if bold { BOLD_WIDTH_FACTOR } else { 1.0 };
    units as f32 / 1000.0 * font_size * PT_TO_MM * factor
}

// Helvetica advance widths for ASCII 32..=126, in 1/1000 em.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // '0'..'9'
    278, 278, 584, 584, 584, 556, 1015, // ':'..'@'
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611, // 'A'..'Z'
    278, 278, 278, 469, 556, 333, // '['..'`'
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, // 'a'..'z'
    334, 260, 334, 584, // '{'..'~'
];

fn glyph_width(ch: char) -> u32 {
    let cp = ch as u32;
    match cp {
        32..=126 => HELVETICA_WIDTHS[(cp - 32) as usize] as u32,
        0x2022 => 350,
        _ => 556,
    }
}

pub fn export_file_name(job_id: &str) -> String {
    if job_id.is_empty() {
        "avaliacao-veiculo.pdf".to_string()
    } else {
        format!("avaliacao-{}.pdf", file_safe_id(job_id))
    }
}

pub fn status_file_name(job_id: &str) -> String {
    format!("status-{}.json", file_safe_id(job_id))
}

/// Lays out and writes the report PDF. Returns `None` without raising when the
/// output file cannot be written.
pub fn export_pdf(
    blocks: &[ReportBlock],
    geometry: &PageGeometry,
    out_dir: &Path,
    job_id: &str,
) -> Option<PathBuf> {
    let doc = layout_blocks(blocks, geometry);
    let path = out_dir.join(export_file_name(job_id));

    match write_pdf(&doc, &path) {
        Ok(()) => {
            info!("report exported pages={} path={}", doc.page_count(), path.display());
            Some(path)
        }
        Err(err) => {
            debug!("report export skipped ({}): {err}", path.display());
            None
        }
    }
}

fn write_pdf(doc: &Document, path: &Path) -> anyhow::Result<()> {
    let mut pdf = pdf::build(doc)?;
    let mut file = std::fs::File::create(path)?;
    pdf.save_to(&mut file)?;
    file.flush()?;
    Ok(())
}
