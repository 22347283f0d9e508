//! In-memory PPTX packages for tests.

use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const NAMESPACES: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;

const SLIDE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/slide";

pub const CHART_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart";

/// Wrap shape markup in a slide part.
pub fn slide_xml(shapes: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld {}><p:cSld><p:spTree><p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr/>{}</p:spTree></p:cSld></p:sld>"#,
        NAMESPACES, shapes
    )
}

/// A text box with one paragraph per line, each line a single run.
pub fn text_shape(id: u32, name: &str, lines: &[&str]) -> String {
    let paragraphs: String = lines
        .iter()
        .map(|line| format!(r#"<a:p><a:r><a:rPr lang="en-US"/><a:t>{}</a:t></a:r></a:p>"#, line))
        .collect();
    format!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="{}" name="{}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>{}</p:txBody></p:sp>"#,
        id, name, paragraphs
    )
}

/// A `.rels` part with the given `(id, type, target)` relationships.
pub fn rels_xml(relationships: &[(&str, &str, &str)]) -> String {
    let entries: String = relationships
        .iter()
        .map(|(id, rel_type, target)| {
            format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                id, rel_type, target
            )
        })
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
        entries
    )
}

/// Builds a minimal presentation archive.
///
/// Slide `n` is stored as `ppt/slides/slide{n}.xml` and referenced as `rId{n}`.
#[derive(Debug, Default)]
pub struct PackageBuilder {
    slides: Vec<String>,
    order: Option<Vec<usize>>,
    parts: Vec<(String, String)>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slide(mut self, xml: impl Into<String>) -> Self {
        self.slides.push(xml.into());
        self
    }

    /// Presentation order as 1-based slide part numbers.
    pub fn slide_order(mut self, order: &[usize]) -> Self {
        self.order = Some(order.to_vec());
        self
    }

    /// Add any other part, such as slide relationships or a chart.
    pub fn part(mut self, name: impl Into<String>, xml: impl Into<String>) -> Self {
        self.parts.push((name.into(), xml.into()));
        self
    }

    pub fn build(self) -> Vec<u8> {
        let order = self
            .order
            .clone()
            .unwrap_or_else(|| (1..=self.slides.len()).collect());

        let slide_ids: String = order
            .iter()
            .enumerate()
            .map(|(i, n)| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, n))
            .collect();
        let presentation = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:presentation {}><p:sldIdLst>{}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#,
            NAMESPACES, slide_ids
        );

        let targets: Vec<(String, String)> = (1..=self.slides.len())
            .map(|n| (format!("rId{}", n), format!("slides/slide{}.xml", n)))
            .collect();
        let relationships: Vec<(&str, &str, &str)> = targets
            .iter()
            .map(|(id, target)| (id.as_str(), SLIDE_REL_TYPE, target.as_str()))
            .collect();

        let content_types = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/></Types>"#;

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let mut add = |name: &str, data: &str| {
            let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
            writer.start_file(name, options).unwrap();
            writer.write_all(data.as_bytes()).unwrap();
        };

        add("[Content_Types].xml", content_types);
        add("ppt/presentation.xml", &presentation);
        add("ppt/_rels/presentation.xml.rels", &rels_xml(&relationships));
        for (i, slide) in self.slides.iter().enumerate() {
            add(&format!("ppt/slides/slide{}.xml", i + 1), slide);
        }
        for (name, xml) in &self.parts {
            add(name, xml);
        }

        writer.finish().unwrap().into_inner()
    }
}
