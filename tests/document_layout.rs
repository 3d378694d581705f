use lopdf::{content::Content, Object};
use snapauto::{
    document::{export_file_name, export_pdf, layout, status_file_name, wrap, PageGeometry},
    pdf::to_win_ansi,
    report::{LineStyle, ReportBlock, ReportLine},
};

fn body(text: &str) -> ReportLine {
    ReportLine {
        style: LineStyle::Body,
        text: text.to_string(),
    }
}

fn placed_texts(doc: &snapauto::document::Document) -> Vec<String> {
    doc.pages
        .iter()
        .flat_map(|p| p.lines.iter().map(|l| l.text.clone()))
        .collect()
}

#[test]
fn a4_page_holds_43_lines() {
    assert_eq!(PageGeometry::default().lines_per_page(), 43);
}

#[test]
fn many_lines_span_ceil_pages() {
    let geo = PageGeometry::default();
    let lines: Vec<ReportLine> = (0..100).map(|i| body(&format!("linha {i}"))).collect();

    let doc = layout(&lines, &geo);

    assert_eq!(doc.page_count(), 3);
    assert_eq!(doc.pages[0].lines.len(), 43);
    assert_eq!(doc.pages[2].lines.len(), 100 - 86);
    let expected: Vec<String> = (0..100).map(|i| format!("linha {i}")).collect();
    assert_eq!(placed_texts(&doc), expected);
}

#[test]
fn long_paragraph_wraps_then_paginates_without_altering_text() {
    let geo = PageGeometry::default();
    let words: Vec<String> = (0..1500).map(|i| format!("palavra{i}")).collect();
    let paragraph = words.join(" ");

    let wrapped = wrap(&paragraph, geo.body_size, false, geo.text_width());
    assert!(wrapped.len() > geo.lines_per_page());

    let doc = layout(&[body(&paragraph)], &geo);
    let per_page = geo.lines_per_page();
    assert_eq!(doc.page_count(), wrapped.len().div_ceil(per_page));

    let placed = placed_texts(&doc);
    assert_eq!(placed, wrapped);
    assert_eq!(placed.join(" "), paragraph);
}

#[test]
fn lines_stay_inside_margins() {
    let geo = PageGeometry::default();
    let lines: Vec<ReportLine> = (0..200).map(|i| body(&format!("item {i}"))).collect();
    let doc = layout(&lines, &geo);

    for page in &doc.pages {
        assert_eq!(page.lines[0].y, geo.margin_top);
        for l in &page.lines {
            assert_eq!(l.x, geo.margin_left);
            assert!(l.y <= geo.height - geo.margin_bottom);
        }
    }
}

#[test]
fn wrapped_segments_fit_the_text_width() {
    let geo = PageGeometry::default();
    let text = "O veículo apresenta pequenos riscos na porta dianteira esquerda e desgaste \
                moderado nos pneus traseiros, recomendando-se revisão completa antes da vistoria.";
    for seg in wrap(text, geo.heading_size, true, geo.text_width()) {
        assert!(snapauto::document::text_width_mm(&seg, geo.heading_size, true) <= geo.text_width());
    }
}

#[test]
fn oversized_word_is_split() {
    let long = "x".repeat(400);
    let segs = wrap(&long, 12.0, false, 50.0);
    assert!(segs.len() > 1);
    assert_eq!(segs.concat(), long);
}

#[test]
fn blank_line_takes_a_slot() {
    let geo = PageGeometry::default();
    let doc = layout(&[body("a"), body(""), body("b")], &geo);
    let ys: Vec<f32> = doc.pages[0].lines.iter().map(|l| l.y).collect();
    assert_eq!(ys, vec![20.0, 26.0, 32.0]);
}

#[test]
fn layout_is_deterministic() {
    let geo = PageGeometry::default();
    let lines: Vec<ReportLine> = (0..120)
        .map(|i| body(&format!("recomendação número {i} com texto razoavelmente comprido para quebrar")))
        .collect();
    assert_eq!(layout(&lines, &geo), layout(&lines, &geo));
}

#[test]
fn export_names_fall_back_to_vehicle() {
    assert_eq!(export_file_name("job-1"), "avaliacao-job-1.pdf");
    assert_eq!(export_file_name(""), "avaliacao-veiculo.pdf");
    assert_eq!(export_file_name("a/b:c"), "avaliacao-a_b_c.pdf");
}

#[test]
fn status_file_name_strips_path_separators() {
    assert_eq!(status_file_name("job-1"), "status-job-1.json");
    assert_eq!(status_file_name("../../etc/x"), "status-.._.._etc_x.json");
    assert_eq!(status_file_name("c:\\tmp\\y"), "status-c__tmp_y.json");
}

#[test]
fn top_margin_past_bottom_limit_never_leaves_an_empty_page() {
    let geo = PageGeometry {
        margin_top: 290.0,
        margin_bottom: 20.0,
        ..PageGeometry::default()
    };
    let doc = layout(&[body("a"), body("b"), body("c")], &geo);

    assert_eq!(doc.page_count(), 3);
    for page in &doc.pages {
        assert_eq!(page.lines.len(), 1);
    }
    assert_eq!(placed_texts(&doc), vec!["a", "b", "c"]);
}

fn sample_blocks() -> Vec<ReportBlock> {
    vec![
        ReportBlock::Header {
            job_id: "job-1".into(),
            generated_at: "2026-10-16T12:00:00Z".into(),
            analyzed_files: vec![],
            overall_score: Some(82.0),
        },
        ReportBlock::Damages {
            items: (0..60).map(|i| format!("dano ({i})")).collect(),
        },
    ]
}

#[test]
fn export_writes_a_pdf() {
    let dir = std::env::temp_dir().join(format!("snapauto-export-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();

    let path = export_pdf(&sample_blocks(), &PageGeometry::default(), &dir, "job-1").unwrap();
    assert_eq!(path.file_name().unwrap(), "avaliacao-job-1.pdf");

    let pdf = lopdf::Document::load(&path).unwrap();
    assert_eq!(pdf.version, "1.4");
    let pages = pdf.get_pages();
    assert_eq!(pages.len(), 2);

    let first = *pages.get(&1).unwrap();
    let base_fonts: Vec<Vec<u8>> = pdf
        .objects
        .values()
        .filter_map(|o| o.as_dict().ok())
        .filter_map(|d| d.get(b"BaseFont").ok())
        .filter_map(|n| n.as_name().ok())
        .map(<[u8]>::to_vec)
        .collect();
    assert!(base_fonts.contains(&b"Helvetica".to_vec()));
    assert!(base_fonts.contains(&b"Helvetica-Bold".to_vec()));

    let content = Content::decode(&pdf.get_page_content(first).unwrap()).unwrap();
    let shown: Vec<Vec<u8>> = content
        .operations
        .iter()
        .filter(|op| op.operator == "Tj")
        .filter_map(|op| match op.operands.first() {
            Some(Object::String(bytes, _)) => Some(bytes.clone()),
            _ => None,
        })
        .collect();
    assert!(shown.contains(&to_win_ansi("• dano (0)")));

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn export_to_unwritable_location_is_silent() {
    let missing = std::env::temp_dir()
        .join(format!("snapauto-missing-{}", std::process::id()))
        .join("nested");
    assert!(export_pdf(&sample_blocks(), &PageGeometry::default(), &missing, "job-1").is_none());
}
