//! In-memory slide model: shapes, text frames, paragraphs, and styled runs.
//!
//! A backend (such as the PPTX package reader) builds these from a file and
//! writes them back after replacement.

use crate::types::SlideData;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Smallest font size a run may carry, in hundredths of a point.
const MIN_FONT_SIZE: u32 = 100;

/// Largest font size a run may carry, in hundredths of a point.
const MAX_FONT_SIZE: u32 = 400_000;

/// A font size in hundredths of a point (the OOXML `sz` unit).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FontSize(u32);

impl FontSize {
    /// A size from hundredths of a point.
    pub fn from_centipoints(value: u32) -> Self {
        Self(value)
    }

    /// A size from whole points.
    pub fn from_points(points: u32) -> Self {
        Self(points * 100)
    }

    pub fn centipoints(&self) -> u32 {
        self.0
    }

    pub fn points(&self) -> f32 {
        self.0 as f32 / 100.0
    }
}

/// An explicit sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RgbColor(pub u8, pub u8, pub u8);

impl FromStr for RgbColor {
    type Err = Error;

    /// Parse a six-digit hex value such as `FF0000`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::StyleError(format!("Invalid RGB color '{}'", s));

        if s.len() != 6 || !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&s[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02X}{:02X}{:02X}", self.0, self.1, self.2)
    }
}

/// How a run's color is specified.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorFormat {
    /// No color on the run; it inherits from the placeholder or theme.
    #[default]
    Unset,
    /// Explicit sRGB color.
    Rgb(RgbColor),
    /// Theme color slot such as `accent1` or `tx1`.
    Theme(String),
}

impl ColorFormat {
    /// The explicit RGB value.
    ///
    /// Fails when the color is unset or comes from the theme.
    pub fn rgb(&self) -> Result<RgbColor> {
        match self {
            Self::Rgb(color) => Ok(*color),
            Self::Unset => Err(Error::StyleError("color is not set".to_string())),
            Self::Theme(slot) => Err(Error::StyleError(format!(
                "theme color '{}' has no RGB value",
                slot
            ))),
        }
    }
}

/// Character formatting of a run. `None` means inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Font {
    pub size: Option<FontSize>,
    pub name: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub color: ColorFormat,
}

impl Font {
    /// Set the font size, rejecting sizes outside the range OOXML accepts.
    pub fn set_size(&mut self, size: FontSize) -> Result<()> {
        if !(MIN_FONT_SIZE..=MAX_FONT_SIZE).contains(&size.centipoints()) {
            return Err(Error::StyleError(format!(
                "font size {} is out of range",
                size.centipoints()
            )));
        }
        self.size = Some(size);
        Ok(())
    }

    /// Set the typeface name.
    pub fn set_name(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::StyleError("font name is empty".to_string()));
        }
        self.name = Some(name.to_string());
        Ok(())
    }

    pub fn set_bold(&mut self, bold: bool) {
        self.bold = Some(bold);
    }

    pub fn set_italic(&mut self, italic: bool) {
        self.italic = Some(italic);
    }

    pub fn set_rgb(&mut self, color: RgbColor) {
        self.color = ColorFormat::Rgb(color);
    }
}

/// The smallest styled unit of text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub font: Font,
}

impl TextRun {
    /// A run with inherited formatting.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            font: Font::default(),
        }
    }

    /// A run with explicit formatting.
    pub fn with_font(text: impl Into<String>, font: Font) -> Self {
        Self {
            text: text.into(),
            font,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    pub runs: Vec<TextRun>,
}

impl Paragraph {
    pub fn new(runs: Vec<TextRun>) -> Self {
        Self { runs }
    }

    /// Concatenated text of all runs.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }
}

/// The paragraph/run structure holding the text of one shape, table cell,
/// or chart label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    pub fn new(paragraphs: Vec<Paragraph>) -> Self {
        Self { paragraphs }
    }

    /// A frame with one unstyled run per line.
    pub fn from_text(text: &str) -> Self {
        Self {
            paragraphs: text
                .split('\n')
                .map(|line| Paragraph::new(vec![TextRun::new(line)]))
                .collect(),
        }
    }

    /// Full text, paragraphs joined with `\n`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The first run of the first paragraph.
    pub fn first_run(&self) -> Option<&TextRun> {
        self.paragraphs.first().and_then(|p| p.runs.first())
    }

    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut TextRun> {
        self.paragraphs.iter_mut().flat_map(|p| p.runs.iter_mut())
    }

    /// Remove all text, leaving a single empty paragraph.
    pub fn clear(&mut self) {
        self.paragraphs.clear();
        self.paragraphs.push(Paragraph::default());
    }

    /// Clear the frame and put `text` on one unstyled run in the first paragraph.
    pub fn set_single_run(&mut self, text: impl Into<String>) -> &mut TextRun {
        self.clear();
        let paragraph = &mut self.paragraphs[0];
        paragraph.runs.push(TextRun::new(text));
        &mut paragraph.runs[0]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    /// Cells in row order; each cell is its own text frame.
    pub rows: Vec<Vec<TextFrame>>,
}

impl Table {
    pub fn cells(&self) -> impl Iterator<Item = &TextFrame> {
        self.rows.iter().flat_map(|row| row.iter())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Rich-text labels (title, axis titles) that could be located.
    pub labels: Vec<TextFrame>,
}

/// What a shape holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShapeKind {
    TextBox(TextFrame),
    Table(Table),
    Chart(Chart),
    Picture,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    /// Shape id within the slide.
    pub id: u32,
    pub name: String,
    /// Whether the shape is the slide's title placeholder.
    pub is_title: bool,
    pub kind: ShapeKind,
}

impl Shape {
    pub fn new(id: u32, name: impl Into<String>, kind: ShapeKind) -> Self {
        Self {
            id,
            name: name.into(),
            is_title: false,
            kind,
        }
    }

    /// Every text frame the shape holds, in document order.
    pub fn text_frames(&self) -> Vec<&TextFrame> {
        match &self.kind {
            ShapeKind::TextBox(frame) => vec![frame],
            ShapeKind::Table(table) => table.cells().collect(),
            ShapeKind::Chart(chart) => chart.labels.iter().collect(),
            ShapeKind::Picture | ShapeKind::Other => Vec::new(),
        }
    }

    /// Mutable access to every text frame, in the same order as [`Shape::text_frames`].
    pub fn text_frames_mut(&mut self) -> Vec<&mut TextFrame> {
        match &mut self.kind {
            ShapeKind::TextBox(frame) => vec![frame],
            ShapeKind::Table(table) => table.rows.iter_mut().flatten().collect(),
            ShapeKind::Chart(chart) => chart.labels.iter_mut().collect(),
            ShapeKind::Picture | ShapeKind::Other => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,
    pub shapes: Vec<Shape>,
}

impl Slide {
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    /// Non-empty trimmed text of every text box and table cell.
    pub fn text_content(&self) -> Vec<String> {
        self.shapes
            .iter()
            .filter(|s| matches!(s.kind, ShapeKind::TextBox(_) | ShapeKind::Table(_)))
            .flat_map(|s| s.text_frames())
            .map(|frame| frame.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Extracted text and element counts for this slide.
    pub fn summary(&self) -> SlideData {
        let mut data = SlideData::new(self.number);
        data.text_content = self.text_content();

        if let Some(title) = self.shapes.iter().find(|s| s.is_title) {
            if let ShapeKind::TextBox(frame) = &title.kind {
                data.title = frame.text().trim().to_string();
            }
        }

        for shape in &self.shapes {
            match shape.kind {
                ShapeKind::Picture => data.images_count += 1,
                ShapeKind::Chart(_) => data.charts_count += 1,
                ShapeKind::Table(_) => data.tables_count += 1,
                ShapeKind::TextBox(_) | ShapeKind::Other => {}
            }
        }

        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_slide() -> Slide {
        let mut slide = Slide::new(2);

        let mut title = Shape::new(
            1,
            "Title 1",
            ShapeKind::TextBox(TextFrame::from_text("  Quarterly Review ")),
        );
        title.is_title = true;
        slide.add_shape(title);

        slide.add_shape(Shape::new(
            2,
            "Table 2",
            ShapeKind::Table(Table {
                rows: vec![
                    vec![TextFrame::from_text("Name"), TextFrame::from_text("")],
                    vec![TextFrame::from_text("Jane Roe"), TextFrame::from_text("42")],
                ],
            }),
        ));
        slide.add_shape(Shape::new(3, "Picture 3", ShapeKind::Picture));
        slide.add_shape(Shape::new(
            4,
            "Chart 4",
            ShapeKind::Chart(Chart {
                labels: vec![TextFrame::from_text("Revenue")],
            }),
        ));
        slide
    }

    #[test]
    fn test_rgb_color_parse_and_display() {
        let color: RgbColor = "1f4E79".parse().unwrap();
        assert_eq!(color, RgbColor(0x1F, 0x4E, 0x79));
        assert_eq!(color.to_string(), "1F4E79");

        assert!("12345".parse::<RgbColor>().is_err());
        assert!("GG0000".parse::<RgbColor>().is_err());
    }

    #[test]
    fn test_color_format_rgb() {
        assert!(ColorFormat::Rgb(RgbColor(1, 2, 3)).rgb().is_ok());
        assert!(ColorFormat::Unset.rgb().is_err());
        assert!(ColorFormat::Theme("accent1".to_string()).rgb().is_err());
    }

    #[test]
    fn test_font_setters_validate() {
        let mut font = Font::default();

        assert!(font.set_size(FontSize::from_points(18)).is_ok());
        assert_eq!(font.size, Some(FontSize::from_centipoints(1800)));
        assert!(font.set_size(FontSize::from_centipoints(5)).is_err());

        assert!(font.set_name("Calibri").is_ok());
        assert!(font.set_name("  ").is_err());
        assert_eq!(font.name.as_deref(), Some("Calibri"));
    }

    #[test]
    fn test_frame_text_joins_paragraphs() {
        let frame = TextFrame::new(vec![
            Paragraph::new(vec![TextRun::new("Call "), TextRun::new("555-1234")]),
            Paragraph::new(vec![TextRun::new("today")]),
        ]);

        assert_eq!(frame.text(), "Call 555-1234\ntoday");
        assert_eq!(frame.first_run().unwrap().text, "Call ");
    }

    #[test]
    fn test_set_single_run_collapses_frame() {
        let mut frame = TextFrame::from_text("one\ntwo\nthree");
        let run = frame.set_single_run("replaced");
        run.font.set_bold(true);

        assert_eq!(frame.paragraphs.len(), 1);
        assert_eq!(frame.paragraphs[0].runs.len(), 1);
        assert_eq!(frame.text(), "replaced");
        assert_eq!(frame.paragraphs[0].runs[0].font.bold, Some(true));
    }

    #[test]
    fn test_clear_leaves_one_empty_paragraph() {
        let mut frame = TextFrame::from_text("a\nb");
        frame.clear();

        assert_eq!(frame.paragraphs, vec![Paragraph::default()]);
        assert!(frame.first_run().is_none());
    }

    #[test]
    fn test_text_frames_order() {
        let slide = sample_slide();
        let texts: Vec<String> = slide.shapes[1]
            .text_frames()
            .iter()
            .map(|f| f.text())
            .collect();

        assert_eq!(texts, vec!["Name", "", "Jane Roe", "42"]);
        assert!(slide.shapes[2].text_frames().is_empty());
    }

    #[test]
    fn test_slide_summary() {
        let summary = sample_slide().summary();

        assert_eq!(summary.slide_number, 2);
        assert_eq!(summary.title, "Quarterly Review");
        assert_eq!(
            summary.text_content,
            vec!["Quarterly Review", "Name", "Jane Roe", "42"]
        );
        assert_eq!(summary.images_count, 1);
        assert_eq!(summary.charts_count, 1);
        assert_eq!(summary.tables_count, 1);
    }
}
