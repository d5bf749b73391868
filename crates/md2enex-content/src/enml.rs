//! ENML document wrapping

/// Root element of a note body.
pub const EN_NOTE_ROOT: &str = "en-note";

pub const ENML_DOCTYPE: &str =
    r#"<!DOCTYPE en-note SYSTEM "http://xml.evernote.com/pub/enml2.dtd">"#;

const ENML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>"#;

/// Turn a sanitized `<en-note>` element into a standalone ENML document:
/// XML declaration, en-note doctype, then the element itself.
pub fn wrap_enml(en_note: &str) -> String {
    format!("{ENML_DECLARATION}\n{ENML_DOCTYPE}\n{en_note}")
}
