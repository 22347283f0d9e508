//! A PPTX presentation opened for redaction.

use crate::binding::write_text_body;
use crate::package::PptxPackage;
use crate::parser::{FrameLocator, PartCache, PptxParser};
use redact_core::{
    DetectionMap, Error, Redactor, ReplacementSummary, Result, Slide, SlideData, SlideDeck,
    TextFrame,
};
use std::collections::BTreeSet;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};

/// An opened presentation: the package, its parsed text-bearing parts, and
/// the slide model bound to them.
///
/// Edits made through [`SlideDeck::slides_mut`] are written back into the
/// XML parts when the document is saved. Parts that were not touched are
/// written out byte for byte.
#[derive(Debug)]
pub struct PptxDocument {
    package: PptxPackage,
    parts: PartCache,
    slides: Vec<Slide>,
    /// Per slide, per shape, one locator per text frame.
    locators: Vec<Vec<Vec<Option<FrameLocator>>>>,
    output: Option<PathBuf>,
}

impl PptxDocument {
    /// Open a PPTX file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        log::info!("Loading presentation: {}", path.display());
        Self::from_package(PptxPackage::open(path)?)
    }

    /// Open a PPTX archive from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        Self::from_package(PptxPackage::from_reader(reader)?)
    }

    fn from_package(package: PptxPackage) -> Result<Self> {
        let parser = PptxParser::new();
        let mut parts = PartCache::new();
        let mut slides = Vec::new();
        let mut locators = Vec::new();

        for (idx, slide_path) in package.slide_paths()?.iter().enumerate() {
            let parsed = parser.parse_slide(&package, slide_path, idx + 1, &mut parts)?;
            slides.push(parsed.slide);
            locators.push(parsed.locators);
        }

        log::info!("Loaded presentation with {} slides", slides.len());
        Ok(Self {
            package,
            parts,
            slides,
            locators,
            output: None,
        })
    }

    /// Slides in presentation order.
    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    /// Extracted text and element counts for every slide.
    pub fn slide_data(&self) -> Vec<SlideData> {
        self.slides.iter().map(Slide::summary).collect()
    }

    pub fn package(&self) -> &PptxPackage {
        &self.package
    }

    /// Path used by [`SlideDeck::save`].
    pub fn set_output_path(&mut self, path: impl Into<PathBuf>) {
        self.output = Some(path.into());
    }

    /// Write every text frame back into its part and re-serialize changed parts.
    ///
    /// A frame that cannot be written back is logged and left as it was.
    fn sync(&mut self) -> Result<()> {
        let mut dirty = BTreeSet::new();

        for (slide, slide_locators) in self.slides.iter().zip(&self.locators) {
            for (shape, shape_locators) in slide.shapes.iter().zip(slide_locators) {
                for (frame, locator) in shape.text_frames().into_iter().zip(shape_locators) {
                    let Some(locator) = locator else {
                        continue;
                    };

                    match write_frame(&mut self.parts, frame, locator) {
                        Ok(true) => {
                            dirty.insert(locator.part.clone());
                        }
                        Ok(false) => {}
                        Err(e) => log::warn!(
                            "Could not write back text of shape '{}' on slide {}: {}",
                            shape.name,
                            slide.number,
                            e
                        ),
                    }
                }
            }
        }

        for part in dirty {
            let doc = self.parts.get(&part).ok_or_else(|| Error::WriteBackError {
                part: part.clone(),
                reason: "part was not loaded".to_string(),
            })?;
            self.package.replace_part(&part, doc.to_bytes()?)?;
            log::debug!("Updated part {}", part);
        }

        Ok(())
    }

    /// Write the presentation, including all slide edits, to `writer`.
    pub fn write_to<W: Write + Seek>(&mut self, writer: W) -> Result<W> {
        self.sync()?;
        self.package.write_to(writer)
    }

    /// Write the presentation, including all slide edits, to `path`.
    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        self.sync()?;
        self.package.save(path)?;
        log::info!("Saved presentation: {}", path.display());
        Ok(())
    }
}

fn write_frame(parts: &mut PartCache, frame: &TextFrame, locator: &FrameLocator) -> Result<bool> {
    let body = parts
        .get_mut(&locator.part)
        .and_then(|doc| doc.root_mut())
        .and_then(|root| root.find_path_mut(&locator.path))
        .ok_or_else(|| Error::WriteBackError {
            part: locator.part.clone(),
            reason: format!("no element at {:?}", locator.path),
        })?;

    write_text_body(body, frame)
}

impl SlideDeck for PptxDocument {
    fn slides_mut(&mut self) -> &mut [Slide] {
        &mut self.slides
    }

    fn save(&mut self) -> Result<()> {
        let path = self.output.clone().ok_or_else(|| Error::WriteBackError {
            part: "presentation".to_string(),
            reason: "no output path set".to_string(),
        })?;
        self.save_as(&path)
    }
}

/// Load `input`, apply `detections`, and save the result to `output`.
///
/// Load and save failures are reported through the summary.
pub fn apply_to_file(input: &Path, output: &Path, detections: &DetectionMap) -> ReplacementSummary {
    let mut document = match PptxDocument::open(input) {
        Ok(document) => document,
        Err(e) => {
            log::error!("Error loading presentation {}: {}", input.display(), e);
            return ReplacementSummary::failure(e);
        }
    };

    document.set_output_path(output);
    Redactor::new().apply_to_deck(&mut document, detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::read_text_body;
    use crate::fixture::{rels_xml, slide_xml, text_shape, PackageBuilder, CHART_REL_TYPE};
    use crate::xml::XmlDocument;
    use redact_core::{Detection, ShapeKind};
    use std::io::Cursor;

    const STYLED: &str = r#"<p:sp><p:nvSpPr><p:cNvPr id="4" name="Styled 3"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr/><p:txBody><a:bodyPr/><a:p><a:pPr algn="r"/><a:r><a:rPr lang="en-US" sz="2400" b="1"><a:solidFill><a:srgbClr val="1F497D"/></a:solidFill></a:rPr><a:t>Prepared by </a:t></a:r><a:r><a:rPr lang="en-US" sz="2400"/><a:t>John</a:t></a:r><a:r><a:rPr lang="en-US" sz="2400"/><a:t> Doe</a:t></a:r></a:p></p:txBody></p:sp>"#;

    const TABLE: &str = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="5" name="Table 4"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/table"><a:tbl><a:tr h="10"><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>Budget</a:t></a:r></a:p></a:txBody></a:tc><a:tc><a:txBody><a:bodyPr/><a:p><a:r><a:t>Project Falcon</a:t></a:r></a:p></a:txBody></a:tc></a:tr></a:tbl></a:graphicData></a:graphic></p:graphicFrame>"#;

    const CHART_FRAME: &str = r#"<p:graphicFrame><p:nvGraphicFramePr><p:cNvPr id="6" name="Chart 5"/><p:cNvGraphicFramePr/><p:nvPr/></p:nvGraphicFramePr><p:xfrm/><a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/chart"><c:chart xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" r:id="rId7"/></a:graphicData></a:graphic></p:graphicFrame>"#;

    const CHART_PART: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<c:chartSpace xmlns:c="http://schemas.openxmlformats.org/drawingml/2006/chart" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><c:chart><c:title><c:tx><c:rich><a:bodyPr/><a:p><a:r><a:t>Acme Corp revenue</a:t></a:r></a:p></c:rich></c:tx></c:title></c:chart></c:chartSpace>"#;

    fn sample_deck() -> Vec<u8> {
        let slide1 = format!(
            "{}{}{}",
            text_shape(2, "Body 1", &["Call Jane Roe at 555-1234"]),
            STYLED,
            TABLE
        );
        let slide2 = format!(
            "{}{}",
            text_shape(2, "Body 1", &["Nothing sensitive"]),
            CHART_FRAME
        );

        PackageBuilder::new()
            .slide(slide_xml(&slide1))
            .slide(slide_xml(&slide2))
            .part(
                "ppt/slides/_rels/slide2.xml.rels",
                rels_xml(&[("rId7", CHART_REL_TYPE, "../charts/chart3.xml")]),
            )
            .part("ppt/charts/chart3.xml", CHART_PART)
            .build()
    }

    fn sample_detections() -> DetectionMap {
        let mut detections = DetectionMap::new();
        detections.insert(
            1,
            vec![
                Detection::new("Jane Roe", "PERSON").with_category("PII"),
                Detection::new("555-1234", "PHONE").with_category("PII"),
                Detection::new("John Doe", "NAME").with_category("PII"),
                Detection::new("Project Falcon", "PROJECT").with_category("CONFIDENTIAL"),
            ],
        );
        detections.insert(2, vec![Detection::new("Acme Corp", "CLIENT")]);
        detections
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("redact-pptx-{}-{}", std::process::id(), name))
    }

    fn part_xml(document: &PptxDocument, part: &str) -> XmlDocument {
        XmlDocument::parse_bytes(document.package().part(part).unwrap()).unwrap()
    }

    #[test]
    fn test_open_extracts_slide_data() {
        let document = PptxDocument::from_reader(Cursor::new(sample_deck())).unwrap();
        let data = document.slide_data();

        assert_eq!(document.slide_count(), 2);
        assert_eq!(data[0].slide_number, 1);
        assert_eq!(
            data[0].text_content,
            vec!["Call Jane Roe at 555-1234", "Prepared by John Doe", "Budget", "Project Falcon"]
        );
        assert_eq!(data[0].tables_count, 1);
        assert_eq!(data[1].charts_count, 1);
    }

    #[test]
    fn test_redact_and_write() {
        let mut document = PptxDocument::from_reader(Cursor::new(sample_deck())).unwrap();
        let detections = sample_detections();
        let redactor = Redactor::new();

        let counts: Vec<usize> = document
            .slides_mut()
            .iter_mut()
            .map(|slide| {
                let slide_detections = &detections[&slide.number];
                redactor.apply_to_slide(slide, slide_detections)
            })
            .collect();
        // One run holds both the name and the phone number; John Doe spans runs.
        assert_eq!(counts, vec![3, 1]);

        let bytes = document.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let reopened = PptxDocument::from_reader(Cursor::new(bytes)).unwrap();

        let data = reopened.slide_data();
        assert_eq!(
            data[0].text_content,
            vec!["Call PERSON at PHONE", "Prepared by NAME", "Budget", "PROJECT"]
        );
        let ShapeKind::Chart(chart) = &reopened.slides()[1].shapes[1].kind else {
            panic!("expected a chart");
        };
        assert_eq!(chart.labels[0].text(), "CLIENT revenue");

        // The collapsed frame keeps the first run's style and paragraph properties.
        let slide = part_xml(&reopened, "ppt/slides/slide1.xml");
        let tree = slide.root().unwrap().descendant(&["cSld", "spTree"]).unwrap();
        let styled = tree.children_named("sp").nth(1).unwrap();
        let body = styled.child("txBody").unwrap();
        let frame = read_text_body(body);
        assert_eq!(frame.paragraphs.len(), 1);
        assert_eq!(frame.paragraphs[0].runs.len(), 1);
        let font = &frame.paragraphs[0].runs[0].font;
        assert_eq!(font.size.map(|s| s.centipoints()), Some(2400));
        assert_eq!(font.bold, Some(true));
        assert_eq!(body.child("p").unwrap().child("pPr").unwrap().attr("algn"), Some("r"));
    }

    #[test]
    fn test_untouched_parts_are_byte_identical() {
        let original = PptxPackage::from_reader(Cursor::new(sample_deck())).unwrap();
        let mut document = PptxDocument::from_reader(Cursor::new(sample_deck())).unwrap();

        let mut detections = DetectionMap::new();
        detections.insert(1, vec![Detection::new("Jane Roe", "PERSON")]);
        let redactor = Redactor::new();
        for slide in document.slides_mut() {
            if let Some(slide_detections) = detections.get(&slide.number) {
                redactor.apply_to_slide(slide, slide_detections);
            }
        }

        let bytes = document.write_to(Cursor::new(Vec::new())).unwrap().into_inner();
        let written = PptxPackage::from_reader(Cursor::new(bytes)).unwrap();

        for part in ["ppt/slides/slide2.xml", "ppt/charts/chart3.xml", "ppt/presentation.xml"] {
            assert_eq!(written.part(part), original.part(part), "{} changed", part);
        }
        assert_ne!(
            written.part("ppt/slides/slide1.xml"),
            original.part("ppt/slides/slide1.xml")
        );
    }

    #[test]
    fn test_slides_follow_presentation_order() {
        let bytes = PackageBuilder::new()
            .slide(slide_xml(&text_shape(2, "A", &["first part"])))
            .slide(slide_xml(&text_shape(2, "B", &["second part"])))
            .slide_order(&[2, 1])
            .build();
        let document = PptxDocument::from_reader(Cursor::new(bytes)).unwrap();

        assert_eq!(document.slides()[0].number, 1);
        assert_eq!(document.slides()[0].text_content(), vec!["second part"]);
        assert_eq!(document.slides()[1].text_content(), vec!["first part"]);
    }

    #[test]
    fn test_apply_to_deck_saves_to_output_path() {
        let output = temp_path("deck_sanitized.pptx");
        let mut document = PptxDocument::from_reader(Cursor::new(sample_deck())).unwrap();
        document.set_output_path(&output);

        let summary = Redactor::new().apply_to_deck(&mut document, &sample_detections());
        assert!(summary.success);
        assert_eq!(summary.total_replacements, 4);
        assert_eq!(summary.replacements_by_slide[&2], 1);

        let reopened = PptxDocument::open(&output).unwrap();
        assert_eq!(reopened.slide_data()[0].text_content[0], "Call PERSON at PHONE");
        std::fs::remove_file(&output).unwrap();
    }

    #[test]
    fn test_save_without_output_path_fails() {
        let mut document = PptxDocument::from_reader(Cursor::new(sample_deck())).unwrap();
        let summary = Redactor::new().apply_to_deck(&mut document, &sample_detections());

        assert!(!summary.success);
        assert_eq!(summary.total_replacements, 0);
        assert!(summary.error.unwrap().contains("no output path"));
    }

    #[test]
    fn test_apply_to_file_missing_input() {
        let summary = apply_to_file(
            &temp_path("does-not-exist.pptx"),
            &temp_path("never-written.pptx"),
            &sample_detections(),
        );

        assert!(!summary.success);
        assert!(summary.error.is_some());
        assert!(summary.replacements_by_slide.is_empty());
    }

    #[test]
    fn test_apply_to_file_round_trip() {
        let input = temp_path("input.pptx");
        let output = temp_path("input_sanitized.pptx");
        std::fs::write(&input, sample_deck()).unwrap();

        let summary = apply_to_file(&input, &output, &sample_detections());
        assert!(summary.success);
        assert_eq!(summary.replacements_by_slide[&1], 3);

        let reopened = PptxDocument::open(&output).unwrap();
        assert_eq!(reopened.slide_data()[0].text_content[3], "PROJECT");

        std::fs::remove_file(&input).unwrap();
        std::fs::remove_file(&output).unwrap();
    }
}
