//! Conversion between DrawingML text bodies and [`TextFrame`]s.
//!
//! A text body is any element whose `a:p` children hold the text: a shape's
//! `p:txBody`, a table cell's `a:txBody`, or a chart label's `c:rich`.

use crate::xml::{XmlElement, XmlNode};
use redact_core::{
    ColorFormat, Error, Font, FontSize, Paragraph, Result, RgbColor, TextFrame, TextRun,
};

/// Text of an `a:br` run in the frame model.
pub const LINE_BREAK: char = '\u{000B}';

/// Local names of elements that may hold a text body.
const TEXT_BODY_ELEMENTS: &[&str] = &["txBody", "rich"];

/// Schema order of `a:rPr` children, used when inserting new ones.
const RPR_CHILD_ORDER: &[&str] = &[
    "ln", "noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill", "effectLst",
    "effectDag", "highlight", "uLnTx", "uLn", "uFillTx", "uFill", "latin", "ea", "cs", "sym",
    "hlinkClick", "hlinkMouseOver", "rtl", "extLst",
];

const FILL_ELEMENTS: &[&str] = &["noFill", "solidFill", "gradFill", "blipFill", "pattFill", "grpFill"];

fn is_run_element(element: &XmlElement) -> bool {
    matches!(element.local_name(), "r" | "br" | "fld")
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "true" | "on" => Some(true),
        "0" | "false" | "off" => Some(false),
        _ => None,
    }
}

fn format_bool(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Read a text body into a frame. Line breaks become runs holding [`LINE_BREAK`].
pub fn read_text_body(body: &XmlElement) -> TextFrame {
    TextFrame::new(body.children_named("p").map(read_paragraph).collect())
}

fn read_paragraph(paragraph: &XmlElement) -> Paragraph {
    Paragraph::new(
        paragraph
            .elements()
            .filter(|e| is_run_element(e))
            .map(read_run)
            .collect(),
    )
}

fn read_run(run: &XmlElement) -> TextRun {
    let font = run.child("rPr").map(read_font).unwrap_or_default();
    let text = if run.local_name() == "br" {
        LINE_BREAK.to_string()
    } else {
        run.child("t").map(XmlElement::text).unwrap_or_default()
    };
    TextRun::with_font(text, font)
}

/// Read the modelled style fields of an `a:rPr` element.
pub fn read_font(rpr: &XmlElement) -> Font {
    Font {
        size: rpr
            .attr("sz")
            .and_then(|v| v.parse().ok())
            .map(FontSize::from_centipoints),
        name: rpr
            .child("latin")
            .and_then(|latin| latin.attr("typeface"))
            .map(str::to_string),
        bold: rpr.attr("b").and_then(parse_bool),
        italic: rpr.attr("i").and_then(parse_bool),
        color: read_color(rpr),
    }
}

fn read_color(rpr: &XmlElement) -> ColorFormat {
    let Some(fill) = rpr.child("solidFill") else {
        return ColorFormat::Unset;
    };

    if let Some(rgb) = fill.child("srgbClr").and_then(|c| c.attr("val")) {
        match rgb.parse::<RgbColor>() {
            Ok(color) => return ColorFormat::Rgb(color),
            Err(e) => log::debug!("Ignoring run color: {}", e),
        }
    }

    match fill.child("schemeClr").and_then(|c| c.attr("val")) {
        Some(slot) => ColorFormat::Theme(slot.to_string()),
        None => ColorFormat::Unset,
    }
}

/// Insert `child` into `rpr` at its schema position.
fn insert_rpr_child(rpr: &mut XmlElement, child: XmlElement) {
    let rank = |local: &str| RPR_CHILD_ORDER.iter().position(|n| *n == local);
    let new_rank = rank(child.local_name());

    let position = rpr
        .children
        .iter()
        .position(|node| match (node.as_element(), new_rank) {
            (Some(existing), Some(new_rank)) => {
                rank(existing.local_name()).map_or(false, |r| r > new_rank)
            }
            _ => false,
        })
        .unwrap_or(rpr.children.len());

    rpr.children.insert(position, XmlNode::Element(child));
}

/// Write the style fields of `font` that differ from what `rpr` holds.
///
/// Attributes and children the model does not cover are left untouched.
fn apply_font(rpr: &mut XmlElement, font: &Font) {
    let current = read_font(rpr);

    if current.size != font.size {
        match font.size {
            Some(size) => rpr.set_attr("sz", size.centipoints().to_string()),
            None => rpr.remove_attr("sz"),
        }
    }

    if current.bold != font.bold {
        match font.bold {
            Some(bold) => rpr.set_attr("b", format_bool(bold)),
            None => rpr.remove_attr("b"),
        }
    }

    if current.italic != font.italic {
        match font.italic {
            Some(italic) => rpr.set_attr("i", format_bool(italic)),
            None => rpr.remove_attr("i"),
        }
    }

    if current.name != font.name {
        match &font.name {
            Some(name) => match rpr.child_mut("latin") {
                Some(latin) => latin.set_attr("typeface", name.as_str()),
                None => {
                    let mut latin = XmlElement::new(rpr.sibling_name("latin"));
                    latin.set_attr("typeface", name.as_str());
                    insert_rpr_child(rpr, latin);
                }
            },
            None => rpr.remove_children("latin"),
        }
    }

    if current.color != font.color {
        for fill in FILL_ELEMENTS {
            rpr.remove_children(fill);
        }

        let color = match &font.color {
            ColorFormat::Unset => None,
            ColorFormat::Rgb(rgb) => Some(("srgbClr", rgb.to_string())),
            ColorFormat::Theme(slot) => Some(("schemeClr", slot.clone())),
        };

        if let Some((kind, value)) = color {
            let mut value_element = XmlElement::new(rpr.sibling_name(kind));
            value_element.set_attr("val", value);
            let mut fill = XmlElement::new(rpr.sibling_name("solidFill"));
            fill.children.push(XmlNode::Element(value_element));
            insert_rpr_child(rpr, fill);
        }
    }
}

/// Give the run an `rPr` as its first child if it has none.
fn ensure_run_properties(run: &mut XmlElement) {
    if run.child("rPr").is_none() {
        let rpr = XmlElement::new(run.sibling_name("rPr"));
        run.children.insert(0, XmlNode::Element(rpr));
    }
}

/// Build an `a:rPr` carrying `font`, or `None` when the font is fully inherited.
///
/// An existing run of `original` with the same style lends its `a:rPr`, so
/// markup the model does not read (color modifiers, underline, language)
/// survives the rebuild.
fn build_run_properties(original: &XmlElement, font: &Font) -> Option<XmlElement> {
    if *font == Font::default() {
        return None;
    }

    let matching = original
        .elements()
        .filter(|e| is_run_element(e))
        .filter_map(|run| run.child("rPr"))
        .find(|rpr| read_font(rpr) == *font);
    if let Some(rpr) = matching {
        return Some(rpr.clone());
    }

    let mut rpr = XmlElement::new(original.sibling_name("rPr"));
    apply_font(&mut rpr, font);
    Some(rpr)
}

/// Write `frame` back into `body`. Returns whether the XML changed.
///
/// When the frame still has the body's paragraph and run layout, each run is
/// updated in place and unmodelled markup survives. Otherwise the paragraphs
/// are rebuilt from the frame, keeping each paragraph's `a:pPr`.
pub fn write_text_body(body: &mut XmlElement, frame: &TextFrame) -> Result<bool> {
    if !TEXT_BODY_ELEMENTS.contains(&body.local_name()) {
        return Err(Error::WriteBackError {
            part: body.name.clone(),
            reason: "element is not a text body".to_string(),
        });
    }

    if same_layout(body, frame) {
        Ok(update_in_place(body, frame))
    } else {
        rebuild_paragraphs(body, frame);
        Ok(true)
    }
}

fn same_layout(body: &XmlElement, frame: &TextFrame) -> bool {
    let paragraphs: Vec<&XmlElement> = body.children_named("p").collect();
    paragraphs.len() == frame.paragraphs.len()
        && paragraphs.iter().zip(&frame.paragraphs).all(|(p, paragraph)| {
            p.elements().filter(|e| is_run_element(e)).count() == paragraph.runs.len()
        })
}

fn update_in_place(body: &mut XmlElement, frame: &TextFrame) -> bool {
    let mut changed = false;

    let paragraphs = body.elements_mut().filter(|e| e.local_name() == "p");
    for (p, paragraph) in paragraphs.zip(&frame.paragraphs) {
        let runs = p.elements_mut().filter(|e| is_run_element(e));
        for (element, run) in runs.zip(&paragraph.runs) {
            changed |= update_run(element, run);
        }
    }

    changed
}

fn update_run(element: &mut XmlElement, run: &TextRun) -> bool {
    let mut changed = false;

    if element.local_name() != "br" {
        let current = element.child("t").map(XmlElement::text).unwrap_or_default();
        if current != run.text {
            match element.child_mut("t") {
                Some(t) => t.set_text(&run.text),
                None => {
                    let mut t = XmlElement::new(element.sibling_name("t"));
                    t.set_text(&run.text);
                    element.children.push(XmlNode::Element(t));
                }
            }
            changed = true;
        }
    }

    let current_font = element.child("rPr").map(read_font).unwrap_or_default();
    if current_font != run.font {
        ensure_run_properties(element);
        if let Some(rpr) = element.child_mut("rPr") {
            apply_font(rpr, &run.font);
            changed = true;
        }
    }

    changed
}

fn rebuild_paragraphs(body: &mut XmlElement, frame: &TextFrame) {
    let originals: Vec<XmlElement> = body.children_named("p").cloned().collect();
    let template = originals
        .first()
        .cloned()
        .unwrap_or_else(|| XmlElement::new(body.sibling_name("p")));

    let rebuilt: Vec<XmlNode> = frame
        .paragraphs
        .iter()
        .enumerate()
        .map(|(i, paragraph)| {
            let original = originals.get(i).unwrap_or(&template);
            XmlNode::Element(build_paragraph(original, paragraph))
        })
        .collect();

    let insert_at = body
        .children
        .iter()
        .position(|n| n.as_element().map_or(false, |e| e.local_name() == "p"))
        .unwrap_or(body.children.len());

    body.remove_children("p");
    let insert_at = insert_at.min(body.children.len());
    body.children.splice(insert_at..insert_at, rebuilt);
}

/// Build an `a:p` for `paragraph`, reusing `original`'s paragraph and
/// end-of-paragraph properties. Newlines inside run text become `a:br`.
fn build_paragraph(original: &XmlElement, paragraph: &Paragraph) -> XmlElement {
    let mut p = XmlElement::new(original.name.clone());
    p.attributes = original.attributes.clone();

    if let Some(ppr) = original.child("pPr") {
        p.children.push(XmlNode::Element(ppr.clone()));
    }

    for run in &paragraph.runs {
        let rpr = build_run_properties(original, &run.font);
        let segments: Vec<&str> = run.text.split(|c| c == '\n' || c == LINE_BREAK).collect();

        for (i, segment) in segments.iter().enumerate() {
            if i > 0 {
                let mut br = XmlElement::new(original.sibling_name("br"));
                if let Some(rpr) = &rpr {
                    br.children.push(XmlNode::Element(rpr.clone()));
                }
                p.children.push(XmlNode::Element(br));
            }

            if segment.is_empty() {
                continue;
            }

            let mut r = XmlElement::new(original.sibling_name("r"));
            if let Some(rpr) = &rpr {
                r.children.push(XmlNode::Element(rpr.clone()));
            }
            let mut t = XmlElement::new(original.sibling_name("t"));
            t.set_text(segment);
            r.children.push(XmlNode::Element(t));
            p.children.push(XmlNode::Element(r));
        }
    }

    if let Some(end) = original.child("endParaRPr") {
        p.children.push(XmlNode::Element(end.clone()));
    }

    p
}
