//! Builds a PDF from laid-out text pages (standard Helvetica fonts, WinAnsi
//! encoding).

use crate::document::Document;
use lopdf::{
    content::{Content, Operation},
    dictionary, Document as PdfDocument, Object, Stream, StringFormat,
};

const MM_TO_PT: f32 = 72.0 / 25.4;

pub fn build(doc: &Document) -> Result<PdfDocument, lopdf::Error> {
    let width_pt = doc.geometry.width * MM_TO_PT;
    let height_pt = doc.geometry.height * MM_TO_PT;

    let mut pdf = PdfDocument::with_version("1.4");
    let pages_id = pdf.new_object_id();
    let regular = pdf.add_object(font_dict("Helvetica"));
    let bold = pdf.add_object(font_dict("Helvetica-Bold"));
    let resources_id = pdf.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(doc.pages.len());
    for page in &doc.pages {
        let mut operations = Vec::with_capacity(page.lines.len() * 5);
        for line in &page.lines {
            let font = if line.bold { "F2" } else { "F1" };
            let x = line.x * MM_TO_PT;
            let y = height_pt - line.y * MM_TO_PT;
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), line.font_size.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::String(to_win_ansi(&line.text), StringFormat::Literal)],
            ));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = pdf.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = pdf.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Resources" => resources_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    pdf.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), width_pt.into(), height_pt.into()],
        }),
    );
    let catalog_id = pdf.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    pdf.trailer.set("Root", catalog_id);
    Ok(pdf)
}

fn font_dict(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

/// WinAnsi bytes for a Tj operand; unmappable characters become `?`.
pub fn to_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi).collect()
}

fn win_ansi(ch: char) -> u8 {
    match ch {
        '\t' => b' ',
        ' '..='~' => ch as u8,
        '\u{a0}'..='\u{ff}' => ch as u32 as u8,
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portuguese_text_maps_to_single_win_ansi_bytes() {
        assert_eq!(to_win_ansi("ó"), vec![0xf3]);
        assert_eq!(to_win_ansi("• (a)"), vec![0x95, b' ', b'(', b'a', b')']);
        assert_eq!(to_win_ansi("→"), b"?".to_vec());
    }
}
