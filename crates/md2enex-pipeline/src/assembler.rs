//! Note assembly: one source file -> one export record

use chrono::{DateTime, Utc};
use md2enex_content::{ContentTransformer, EmbeddedImages};
use std::path::Path;
use tracing::debug;

use crate::config::RunContext;
use crate::document::find_forbidden_char;
use crate::error::AssemblyError;
use crate::source::SourceNote;

const UNTITLED: &str = "Untitled";

/// One converted note, ready to be appended to the export document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRecord {
    pub title: String,
    /// Full ENML document, written as CDATA
    pub content: String,
    /// `YYYYMMDDThhmmssZ`
    pub created: String,
    /// `YYYYMMDDThhmmssZ`
    pub updated: String,
    pub tag: String,
}

/// A record together with the images embedded while building it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledNote {
    pub record: ExportRecord,
    pub embedded_images: EmbeddedImages,
}

/// ENEX timestamp format, UTC with second precision
pub fn format_enex_date(date: DateTime<Utc>) -> String {
    date.format("%Y%m%dT%H%M%SZ").to_string()
}

pub struct NoteAssembler<'a> {
    transformer: &'a ContentTransformer,
    context: &'a RunContext,
}

impl<'a> NoteAssembler<'a> {
    pub fn new(transformer: &'a ContentTransformer, context: &'a RunContext) -> Self {
        Self {
            transformer,
            context,
        }
    }

    /// Read and convert the note at `path`
    pub fn assemble_file(&self, path: &Path) -> Result<AssembledNote, AssemblyError> {
        let note = SourceNote::load(path)?;
        self.assemble(&note)
    }

    /// Either a complete record or an error; nothing partial is produced
    pub fn assemble(&self, note: &SourceNote) -> Result<AssembledNote, AssemblyError> {
        let content = self.transformer.transform(&note.body, note.dir())?;

        let title = match note.title.trim() {
            "" => UNTITLED.to_string(),
            t => t.to_string(),
        };

        ensure_xml_text("title", &title)?;
        ensure_xml_text("content", &content.enml)?;

        debug!(
            "Assembled '{}' ({} image(s) embedded)",
            title,
            content.embedded_images.len()
        );

        Ok(AssembledNote {
            record: ExportRecord {
                title,
                content: content.enml,
                created: format_enex_date(note.created),
                updated: format_enex_date(note.modified),
                tag: self.context.tag.clone(),
            },
            embedded_images: content.embedded_images,
        })
    }
}

fn ensure_xml_text(field: &'static str, text: &str) -> Result<(), AssemblyError> {
    match find_forbidden_char(text) {
        Some(c) => Err(AssemblyError::InvalidCharacter {
            field,
            code: c as u32,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    fn note(title: &str, body: &str) -> SourceNote {
        SourceNote {
            path: PathBuf::from(format!("/tmp/{}.md", title)),
            title: title.to_string(),
            body: body.to_string(),
            created: Utc.with_ymd_and_hms(2023, 1, 2, 3, 4, 5).unwrap(),
            modified: Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap(),
        }
    }

    #[test]
    fn test_format_enex_date() {
        let date = Utc.with_ymd_and_hms(2024, 7, 1, 8, 9, 10).unwrap();
        assert_eq!(format_enex_date(date), "20240701T080910Z");
    }

    #[test]
    fn test_assemble_record_fields() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let assembled = assembler
            .assemble(&note("Alpha", "# Alpha\n\nHello"))
            .unwrap();
        let record = assembled.record;

        assert_eq!(record.title, "Alpha");
        assert_eq!(record.created, "20230102T030405Z");
        assert_eq!(record.updated, "20241231T235959Z");
        assert_eq!(record.tag, context.tag);
        assert!(record.content.contains("<en-note><p>Hello</p></en-note>"));
        assert!(assembled.embedded_images.is_empty());
    }

    #[test]
    fn test_blank_title_falls_back() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let assembled = assembler.assemble(&note("  ", "text")).unwrap();

        assert_eq!(assembled.record.title, "Untitled");
    }

    #[test]
    fn test_malformed_content_is_assembly_error() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let err = assembler
            .assemble(&note("Bad", "<div>\n\nnever closed\n"))
            .unwrap_err();

        assert!(matches!(err, AssemblyError::Content(_)));
    }

    #[test]
    fn test_terminal_escape_in_body_is_assembly_error() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let err = assembler
            .assemble(&note("Log", "bad \u{1b}[0m escape"))
            .unwrap_err();

        assert!(matches!(
            err,
            AssemblyError::InvalidCharacter {
                field: "content",
                code: 0x1B
            }
        ));
    }

    #[test]
    fn test_noncharacter_in_body_is_assembly_error() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let err = assembler.assemble(&note("Odd", "x \u{FFFF} y")).unwrap_err();

        assert!(matches!(
            err,
            AssemblyError::InvalidCharacter {
                field: "content",
                code: 0xFFFF
            }
        ));
    }

    #[test]
    fn test_control_character_in_title_is_assembly_error() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let err = assembler.assemble(&note("bell\u{7}", "text")).unwrap_err();

        assert!(matches!(
            err,
            AssemblyError::InvalidCharacter { field: "title", .. }
        ));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let transformer = ContentTransformer::default();
        let context = RunContext::new();
        let assembler = NoteAssembler::new(&transformer, &context);

        let err = assembler
            .assemble_file(Path::new("/definitely/not/here.md"))
            .unwrap_err();

        assert!(matches!(err, AssemblyError::Read(_)));
    }
}
