//! PPTX package access: zip entries, relationships, and slide order.

use quick_xml::events::Event;
use quick_xml::Reader;
use redact_core::{Error, Result};
use std::io::{Read, Seek, Write};
use std::path::Path;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Relationship type suffix for slides referenced from the presentation part.
const SLIDE_REL_SUFFIX: &str = "/relationships/slide";

/// Main presentation part and its relationships.
const PRESENTATION_PART: &str = "ppt/presentation.xml";

/// One entry of the zip archive, kept in archive order.
#[derive(Debug, Clone)]
struct PartEntry {
    name: String,
    data: Vec<u8>,
    compression: CompressionMethod,
    is_dir: bool,
}

/// A relationship from a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    pub external: bool,
}

/// An opened PPTX package held in memory.
#[derive(Debug, Clone)]
pub struct PptxPackage {
    entries: Vec<PartEntry>,
}

impl PptxPackage {
    /// Read every entry of a PPTX archive.
    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::ZipError(format!("Failed to read entry {}: {}", i, e)))?;

            let mut data = Vec::new();
            file.read_to_end(&mut data)
                .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", file.name(), e)))?;

            entries.push(PartEntry {
                name: file.name().to_string(),
                data,
                compression: file.compression(),
                is_dir: file.is_dir(),
            });
        }

        log::debug!("Read {} package entries", entries.len());
        Ok(Self { entries })
    }

    /// Open a PPTX file from disk.
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Raw bytes of a part.
    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.data.as_slice())
    }

    /// A part decoded as UTF-8 text.
    pub fn part_str(&self, name: &str) -> Result<&str> {
        let data = self
            .part(name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;

        std::str::from_utf8(data)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", name, e)))
    }

    /// Replace the contents of an existing part.
    pub fn replace_part(&mut self, name: &str, data: Vec<u8>) -> Result<()> {
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.name == name)
            .ok_or_else(|| Error::ZipError(format!("File not found in archive '{}'", name)))?;

        entry.data = data;
        Ok(())
    }

    /// Write the package as a zip archive, entries in their original order.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let zip_error = |e: zip::result::ZipError| Error::ZipError(e.to_string());
        let mut zip = ZipWriter::new(writer);

        for entry in &self.entries {
            // Only stored and deflated entries are written back as-is.
            let method = match entry.compression {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let options = FileOptions::default().compression_method(method);

            if entry.is_dir {
                zip.add_directory(entry.name.as_str(), options)
                    .map_err(zip_error)?;
                continue;
            }

            zip.start_file(entry.name.as_str(), options)
                .map_err(zip_error)?;
            zip.write_all(&entry.data)?;
        }

        zip.finish().map_err(zip_error)
    }

    /// Write the package to a file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let mut writer = self.write_to(std::io::BufWriter::new(file))?;
        writer.flush()?;
        Ok(())
    }

    /// Relationships of `part_name`, or an empty list if it has no `.rels` part.
    pub fn relationships(&self, part_name: &str) -> Result<Vec<Relationship>> {
        let rels_path = rels_path_for(part_name);
        if self.part(&rels_path).is_none() {
            return Ok(Vec::new());
        }
        parse_relationships(self.part_str(&rels_path)?)
    }

    /// Slide part names in presentation order.
    ///
    /// Follows `p:sldIdLst` in the presentation part; if that list is missing,
    /// slides are ordered by the number in their part name.
    pub fn slide_paths(&self) -> Result<Vec<String>> {
        let rels = self.relationships(PRESENTATION_PART)?;
        let slide_rels: Vec<&Relationship> = rels
            .iter()
            .filter(|r| r.rel_type.ends_with(SLIDE_REL_SUFFIX) && !r.external)
            .collect();

        let listed = parse_slide_id_list(self.part_str(PRESENTATION_PART)?)?;
        if !listed.is_empty() {
            let mut paths = Vec::with_capacity(listed.len());
            for rel_id in &listed {
                match slide_rels.iter().find(|r| &r.id == rel_id) {
                    Some(rel) => paths.push(resolve_target(PRESENTATION_PART, &rel.target)),
                    None => log::warn!("Slide relationship '{}' not found", rel_id),
                }
            }
            return Ok(paths);
        }

        let mut slides: Vec<(String, Option<usize>)> = slide_rels
            .iter()
            .map(|r| {
                let path = resolve_target(PRESENTATION_PART, &r.target);
                let number = extract_slide_number(&path);
                (path, number)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

/// Path of the relationships part belonging to `part_name`.
pub fn rels_path_for(part_name: &str) -> String {
    match part_name.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part_name),
    }
}

/// Resolve a relationship target relative to the part that owns it.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = source_part.split('/').collect();
    segments.pop();

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}

/// Parse the `Relationship` entries of a `.rels` part.
pub fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if e.name().as_ref() == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }

                relationships.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if crate::xml::local_name(&String::from_utf8_lossy(e.name().as_ref())) == "sldId" =>
            {
                let rel_id = e.attributes().flatten().find_map(|attr| {
                    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
                    (crate::xml::local_name(&key) == "id" && key.contains(':'))
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
                if let Some(rel_id) = rel_id {
                    ids.push(rel_id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
