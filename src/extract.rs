//! Text extraction for control documents (PDF, DOCX, TXT).
//!
//! Extraction is ingestion glue: it turns a file on disk into trimmed plain
//! text for the matching core, or an error the ingestion loop can skip past.
//! Format is decided by file extension, matching how documents are uploaded.

use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Maximum decompressed bytes read from the DOCX body entry.
const MAX_DOCX_XML_BYTES: u64 = 50 * 1024 * 1024;

/// Extraction failure for one source document. Never panics; the ingestion
/// loop logs the error and continues with the next file.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file format: {0}")]
    UnsupportedFormat(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
}

/// Extract trimmed plain text from a PDF, DOCX, or TXT file.
pub fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let text = match extension.as_str() {
        "pdf" => extract_pdf(path)?,
        "docx" => extract_docx(path)?,
        "txt" => std::fs::read_to_string(path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?,
        other => return Err(ExtractError::UnsupportedFormat(other.to_string())),
    };

    Ok(text.trim().to_string())
}

/// True if the file's extension names a format this module can extract.
pub fn is_supported(path: &Path) -> bool {
    matches!(
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref(),
        Some("pdf") | Some("docx") | Some("txt")
    )
}

fn extract_pdf(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;
    pdf_extract::extract_text_from_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path).map_err(|source| ExtractError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes.as_slice()))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;

    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".to_string()))?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_DOCX_XML_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_DOCX_XML_BYTES {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".to_string(),
        ));
    }

    extract_text_runs(&doc_xml)
}

/// Collect the `w:t` text runs from a DOCX body, space-separating paragraphs.
fn extract_text_runs(xml: &[u8]) -> Result<String, ExtractError> {
    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_text_run = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(quick_xml::events::Event::Start(e)) => {
                in_text_run = e.local_name().as_ref() == b"t";
            }
            Ok(quick_xml::events::Event::Text(te)) if in_text_run => {
                let text = te.unescape().unwrap_or_default();
                if !out.is_empty() && !text.is_empty() {
                    out.push(' ');
                }
                out.push_str(text.as_ref());
            }
            Ok(quick_xml::events::Event::End(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text_run = false;
                }
            }
            Ok(quick_xml::events::Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn txt_file_is_read_and_trimmed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("policy.txt");
        fs::write(&path, "  We review access rights quarterly.\n\n").unwrap();

        let text = extract_text(&path).unwrap();
        assert_eq!(text, "We review access rights quarterly.");
    }

    #[test]
    fn unsupported_extension_returns_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.md");
        fs::write(&path, "irrelevant").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedFormat(_)));
    }

    #[test]
    fn invalid_pdf_returns_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.pdf");
        fs::write(&path, "not a pdf").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.docx");
        fs::write(&path, "not a zip").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(matches!(err, ExtractError::Docx(_)));
    }

    #[test]
    fn missing_file_returns_io_error() {
        let err = extract_text(Path::new("/nonexistent/policy.txt")).unwrap_err();
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn text_runs_are_space_separated() {
        let xml = br#"<w:document xmlns:w="x"><w:body>
            <w:p><w:r><w:t>Access is</w:t></w:r></w:p>
            <w:p><w:r><w:t>restricted.</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let text = extract_text_runs(xml).unwrap();
        assert_eq!(text, "Access is restricted.");
    }

    #[test]
    fn supported_extensions_detected() {
        assert!(is_supported(Path::new("a.PDF")));
        assert!(is_supported(Path::new("a.docx")));
        assert!(is_supported(Path::new("a.txt")));
        assert!(!is_supported(Path::new("a.xlsx")));
        assert!(!is_supported(Path::new("a")));
    }
}
