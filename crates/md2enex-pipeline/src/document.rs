//! ENEX export document
//!
//! Holds the ordered export records of one run and serializes them as a
//! single `.enex` file: XML declaration, en-export doctype, then an indented
//! `<en-export>` root with one `<note>` per record.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesCData, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::assembler::{format_enex_date, ExportRecord};
use crate::config::{RunContext, APP_NAME, APP_VERSION, ENEX_DOCTYPE};
use crate::error::{PipelineError, Result};

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    export_date: DateTime<Utc>,
    application: &'static str,
    version: &'static str,
    records: Vec<ExportRecord>,
}

impl ExportDocument {
    pub fn new(context: &RunContext) -> Self {
        Self {
            export_date: context.started_at,
            application: APP_NAME,
            version: APP_VERSION,
            records: Vec::new(),
        }
    }

    /// Append in the order given; records are never re-sorted
    pub fn push(&mut self, record: ExportRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[ExportRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the whole document in memory
    pub fn to_xml(&self) -> Result<String> {
        let mut buf = Vec::new();
        writeln!(buf, "{XML_DECLARATION}").map_err(serialize_error)?;
        writeln!(buf, "{ENEX_DOCTYPE}").map_err(serialize_error)?;

        let mut writer = Writer::new_with_indent(buf, b' ', 2);

        let export_date = format_enex_date(self.export_date);
        let root = BytesStart::new("en-export").with_attributes([
            ("export-date", export_date.as_str()),
            ("application", self.application),
            ("version", self.version),
        ]);
        emit(&mut writer, Event::Start(root))?;

        for record in &self.records {
            write_record(&mut writer, record)?;
        }

        emit(&mut writer, Event::End(BytesEnd::new("en-export")))?;

        let mut buf = writer.into_inner();
        buf.push(b'\n');
        String::from_utf8(buf).map_err(serialize_error)
    }

    /// Serialize and write to `path` in a single write, replacing any
    /// existing file. Nothing is written if serialization fails.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let xml = self.to_xml()?;
        fs::write(path, xml).map_err(|e| PipelineError::io(path, e))?;
        info!("Wrote {} note(s) to {}", self.len(), path.display());
        Ok(())
    }
}

fn serialize_error(e: impl std::fmt::Display) -> PipelineError {
    PipelineError::Serialize(e.to_string())
}

fn emit<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<()> {
    writer.write_event(event).map_err(serialize_error)
}

fn write_record<W: Write>(writer: &mut Writer<W>, record: &ExportRecord) -> Result<()> {
    emit(writer, Event::Start(BytesStart::new("note")))?;

    write_text_element(writer, "title", &record.title)?;

    emit(writer, Event::Start(BytesStart::new("content")))?;
    check_xml_chars("content", &record.content)?;
    for section in cdata_sections(&record.content) {
        emit(writer, Event::CData(BytesCData::new(section)))?;
    }
    emit(writer, Event::End(BytesEnd::new("content")))?;

    write_text_element(writer, "created", &record.created)?;
    write_text_element(writer, "updated", &record.updated)?;
    write_text_element(writer, "tag", &record.tag)?;

    emit(writer, Event::Start(BytesStart::new("note-attributes")))?;
    emit(writer, Event::End(BytesEnd::new("note-attributes")))?;

    emit(writer, Event::End(BytesEnd::new("note")))
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    check_xml_chars(name, text)?;
    emit(writer, Event::Start(BytesStart::new(name)))?;
    emit(writer, Event::Text(BytesText::new(text)))?;
    emit(writer, Event::End(BytesEnd::new(name)))
}

/// The XML 1.0 `Char` production; anything else cannot appear even escaped
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n' | '\r'
            | '\u{20}'..='\u{D7FF}'
            | '\u{E000}'..='\u{FFFD}'
            | '\u{10000}'..='\u{10FFFF}'
    )
}

pub(crate) fn find_forbidden_char(text: &str) -> Option<char> {
    text.chars().find(|c| !is_xml_char(*c))
}

/// Backstop for records that did not come through `NoteAssembler`
fn check_xml_chars(element: &str, text: &str) -> Result<()> {
    match find_forbidden_char(text) {
        Some(c) => Err(PipelineError::Serialize(format!(
            "<{}> contains character U+{:04X}, which is not allowed in XML",
            element, c as u32
        ))),
        None => Ok(()),
    }
}

/// Split text so no section contains the `]]>` terminator
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find("]]>") {
        sections.push(&rest[..idx + 2]);
        rest = &rest[idx + 2..];
    }
    sections.push(rest);
    sections
}
