//! Slide part walker.
//!
//! Builds the [`Slide`] model from a slide's shape tree and records, for
//! every text frame, which part and element path it was read from so edits
//! can be written back.

use crate::binding::read_text_body;
use crate::package::{resolve_target, PptxPackage, Relationship};
use crate::xml::{local_name, XmlDocument, XmlElement};
use redact_core::{Chart, Error, Result, Shape, ShapeKind, Slide, Table, TextFrame};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

/// Parsed XML parts by part name.
pub type PartCache = BTreeMap<String, XmlDocument>;

const TITLE_PLACEHOLDERS: &[&str] = &["title", "ctrTitle"];

const CHART_REL_SUFFIX: &str = "/relationships/chart";

/// Where a text frame lives: a part and the child-index path from its root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameLocator {
    pub part: String,
    pub path: Vec<usize>,
}

/// A slide model plus the locators of its text frames.
///
/// `locators[i]` lines up with `slide.shapes[i].text_frames()`. A frame
/// without a locator (an empty table cell) has no XML to write back into.
#[derive(Debug, Clone)]
pub struct ParsedSlide {
    pub slide: Slide,
    pub locators: Vec<Vec<Option<FrameLocator>>>,
}

/// Parse `name` from the package into the cache, unless already there.
pub fn load_part<'a>(
    package: &PptxPackage,
    parts: &'a mut PartCache,
    name: &str,
) -> Result<&'a XmlDocument> {
    match parts.entry(name.to_string()) {
        Entry::Occupied(entry) => Ok(entry.into_mut()),
        Entry::Vacant(entry) => {
            let bytes = package
                .part(name)
                .ok_or_else(|| Error::PptxParseError(format!("Part '{}' not found", name)))?;
            Ok(entry.insert(XmlDocument::parse_bytes(bytes)?))
        }
    }
}

/// Child-index path to the element reached by following `names`.
fn locate<'a>(element: &'a XmlElement, names: &[&str]) -> Option<(Vec<usize>, &'a XmlElement)> {
    let mut path = Vec::with_capacity(names.len());
    let mut current = element;

    for name in names {
        let (index, child) = current.children.iter().enumerate().find_map(|(i, node)| {
            node.as_element()
                .filter(|e| e.local_name() == *name)
                .map(|e| (i, e))
        })?;
        path.push(index);
        current = child;
    }

    Some((path, current))
}

/// Every descendant with the given local name, outermost first.
fn find_all<'a>(
    element: &'a XmlElement,
    local: &str,
    path: &mut Vec<usize>,
    found: &mut Vec<(Vec<usize>, &'a XmlElement)>,
) {
    for (i, node) in element.children.iter().enumerate() {
        if let Some(child) = node.as_element() {
            path.push(i);
            if child.local_name() == local {
                found.push((path.clone(), child));
            } else {
                find_all(child, local, path, found);
            }
            path.pop();
        }
    }
}

fn joined(base: &[usize], rest: impl IntoIterator<Item = usize>) -> Vec<usize> {
    base.iter().copied().chain(rest).collect()
}

/// `(id, name)` from the shape's non-visual properties.
fn shape_identity(element: &XmlElement, non_visual: &str) -> (u32, String) {
    match element.descendant(&[non_visual, "cNvPr"]) {
        Some(c_nv_pr) => (
            c_nv_pr.attr("id").and_then(|id| id.parse().ok()).unwrap_or(0),
            c_nv_pr.attr("name").unwrap_or_default().to_string(),
        ),
        None => (0, String::new()),
    }
}

/// Parser for PPTX slide parts.
#[derive(Debug, Default)]
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse the slide stored in `part_name` as slide `number`.
    ///
    /// The slide part and any chart parts it references are added to `parts`.
    pub fn parse_slide(
        &self,
        package: &PptxPackage,
        part_name: &str,
        number: usize,
        parts: &mut PartCache,
    ) -> Result<ParsedSlide> {
        let bytes = package
            .part(part_name)
            .ok_or_else(|| Error::PptxParseError(format!("Slide part '{}' not found", part_name)))?;
        let doc = XmlDocument::parse_bytes(bytes)?;
        let root = doc.root().ok_or_else(|| {
            Error::PptxParseError(format!("Slide part '{}' has no root element", part_name))
        })?;

        let mut walker = SlideWalker {
            package,
            slide_part: part_name,
            parts: &mut *parts,
            relationships: None,
            parsed: ParsedSlide {
                slide: Slide::new(number),
                locators: Vec::new(),
            },
        };

        match locate(root, &["cSld", "spTree"]) {
            Some((path, tree)) => walker.walk(tree, &path)?,
            None => log::warn!("Slide '{}' has no shape tree", part_name),
        }

        let parsed = walker.parsed;
        parts.insert(part_name.to_string(), doc);

        log::debug!(
            "Parsed slide {} ({}): {} shapes",
            number,
            part_name,
            parsed.slide.shapes.len()
        );
        Ok(parsed)
    }
}

struct SlideWalker<'a> {
    package: &'a PptxPackage,
    slide_part: &'a str,
    parts: &'a mut PartCache,
    relationships: Option<Vec<Relationship>>,
    parsed: ParsedSlide,
}

impl SlideWalker<'_> {
    fn push(&mut self, shape: Shape, locators: Vec<Option<FrameLocator>>) {
        self.parsed.slide.add_shape(shape);
        self.parsed.locators.push(locators);
    }

    fn slide_locator(&self, path: Vec<usize>) -> Option<FrameLocator> {
        Some(FrameLocator {
            part: self.slide_part.to_string(),
            path,
        })
    }

    /// Visit a shape tree or group, flattening nested groups in document order.
    fn walk(&mut self, tree: &XmlElement, path: &[usize]) -> Result<()> {
        for (i, node) in tree.children.iter().enumerate() {
            let Some(element) = node.as_element() else {
                continue;
            };
            let element_path = joined(path, [i]);

            match element.local_name() {
                "sp" => self.text_shape(element, element_path),
                "grpSp" => self.walk(element, &element_path)?,
                "graphicFrame" => self.graphic_frame(element, &element_path),
                "pic" => {
                    let (id, name) = shape_identity(element, "nvPicPr");
                    self.push(Shape::new(id, name, ShapeKind::Picture), Vec::new());
                }
                "cxnSp" => {
                    let (id, name) = shape_identity(element, "nvCxnSpPr");
                    self.push(Shape::new(id, name, ShapeKind::Other), Vec::new());
                }
                "AlternateContent" => {
                    if let Some((choice_path, choice)) = locate(element, &["Choice"]) {
                        self.walk(choice, &joined(&element_path, choice_path))?;
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn text_shape(&mut self, element: &XmlElement, path: Vec<usize>) {
        let (id, name) = shape_identity(element, "nvSpPr");
        let is_title = element
            .descendant(&["nvSpPr", "nvPr", "ph"])
            .and_then(|ph| ph.attr("type"))
            .map_or(false, |kind| TITLE_PLACEHOLDERS.contains(&kind));

        let (kind, locators) = match locate(element, &["txBody"]) {
            Some((body_path, body)) => (
                ShapeKind::TextBox(read_text_body(body)),
                vec![self.slide_locator(joined(&path, body_path))],
            ),
            None => (ShapeKind::Other, Vec::new()),
        };

        let mut shape = Shape::new(id, name, kind);
        shape.is_title = is_title;
        self.push(shape, locators);
    }

    fn graphic_frame(&mut self, element: &XmlElement, path: &[usize]) {
        let (id, name) = shape_identity(element, "nvGraphicFramePr");

        let Some((data_path, data)) = locate(element, &["graphic", "graphicData"]) else {
            self.push(Shape::new(id, name, ShapeKind::Other), Vec::new());
            return;
        };
        let data_path = joined(path, data_path);

        if let Some((tbl_path, tbl)) = locate(data, &["tbl"]) {
            let (table, locators) = self.table(tbl, &joined(&data_path, tbl_path));
            self.push(Shape::new(id, name, ShapeKind::Table(table)), locators);
        } else if let Some(chart_ref) = data.child("chart") {
            let (chart, locators) = match self.chart(chart_ref) {
                Ok(found) => found,
                Err(e) => {
                    log::warn!(
                        "Skipping chart text of '{}' on slide {}: {}",
                        name,
                        self.parsed.slide.number,
                        e
                    );
                    (Chart::default(), Vec::new())
                }
            };
            self.push(Shape::new(id, name, ShapeKind::Chart(chart)), locators);
        } else {
            self.push(Shape::new(id, name, ShapeKind::Other), Vec::new());
        }
    }

    fn table(&self, tbl: &XmlElement, path: &[usize]) -> (Table, Vec<Option<FrameLocator>>) {
        let mut table = Table::default();
        let mut locators = Vec::new();

        for (row_index, row) in tbl.children.iter().enumerate() {
            let Some(row) = row.as_element().filter(|e| e.local_name() == "tr") else {
                continue;
            };

            let mut cells = Vec::new();
            for (cell_index, cell) in row.children.iter().enumerate() {
                let Some(cell) = cell.as_element().filter(|e| e.local_name() == "tc") else {
                    continue;
                };

                match locate(cell, &["txBody"]) {
                    Some((body_path, body)) => {
                        cells.push(read_text_body(body));
                        let cell_path = [row_index, cell_index].into_iter().chain(body_path);
                        locators.push(self.slide_locator(joined(path, cell_path)));
                    }
                    None => {
                        cells.push(TextFrame::default());
                        locators.push(None);
                    }
                }
            }
            table.rows.push(cells);
        }

        (table, locators)
    }

    /// Rich-text labels of the chart part referenced by `chart_ref`.
    fn chart(&mut self, chart_ref: &XmlElement) -> Result<(Chart, Vec<Option<FrameLocator>>)> {
        let rel_id = chart_ref
            .attributes
            .iter()
            .find(|(key, _)| key.contains(':') && local_name(key) == "id")
            .map(|(_, value)| value.clone())
            .ok_or_else(|| Error::PptxParseError("chart reference has no r:id".to_string()))?;

        if self.relationships.is_none() {
            self.relationships = Some(self.package.relationships(self.slide_part)?);
        }
        let rel = self
            .relationships
            .iter()
            .flatten()
            .find(|r| r.id == rel_id && r.rel_type.ends_with(CHART_REL_SUFFIX) && !r.external)
            .ok_or_else(|| {
                Error::PptxParseError(format!("No chart relationship '{}'", rel_id))
            })?;
        let chart_part = resolve_target(self.slide_part, &rel.target);

        let doc = load_part(self.package, self.parts, &chart_part)?;
        let root = doc.root().ok_or_else(|| {
            Error::PptxParseError(format!("Chart part '{}' has no root element", chart_part))
        })?;

        let mut found = Vec::new();
        find_all(root, "rich", &mut Vec::new(), &mut found);

        let mut chart = Chart::default();
        let mut locators = Vec::with_capacity(found.len());
        for (path, rich) in found {
            chart.labels.push(read_text_body(rich));
            locators.push(Some(FrameLocator {
                part: chart_part.clone(),
                path,
            }));
        }

        Ok((chart, locators))
    }
}
