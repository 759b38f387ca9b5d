//! Per-format decoders. Each reader turns one file into one normalized
//! `Document`; failures are returned to the caller, which decides whether
//! to skip the file or abort.

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::io::Read;
use std::path::Path;
use tracing::warn;

use knowbase_core::types::{DocMeta, DocType, Document};

use crate::category::categorize;

fn base_meta(path: &Path, doc_type: DocType) -> DocMeta {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    DocMeta::new(path.to_string_lossy(), doc_type, categorize(&file_name))
}

/// PDF: concatenate per-page extracted text in page order. A page that
/// fails to extract degrades to empty text rather than failing the file.
pub fn read_pdf(path: &Path) -> Result<Document> {
    let pdf = lopdf::Document::load(path)
        .with_context(|| format!("loading PDF {}", path.display()))?;
    let pages = pdf.get_pages();
    let mut content = String::new();
    for page_num in pages.keys() {
        match pdf.extract_text(&[*page_num]) {
            Ok(text) => {
                content.push_str(&text);
                content.push('\n');
            }
            Err(e) => {
                warn!(page = page_num, file = %path.display(), error = %e, "page extraction failed, skipping page");
            }
        }
    }
    let mut meta = base_meta(path, DocType::Pdf);
    meta.extra.insert("pages".to_string(), pages.len().to_string());
    Ok(Document::new(content, meta))
}

/// DOCX: concatenate paragraph text in document order. The text lives in
/// `w:t` runs grouped under `w:p` paragraphs inside `word/document.xml`.
pub fn read_docx(path: &Path) -> Result<Document> {
    let file = fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut archive = zip::ZipArchive::new(std::io::BufReader::new(file))
        .with_context(|| format!("reading {} as a docx archive", path.display()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .context("docx archive has no word/document.xml")?
        .read_to_string(&mut xml)?;

    let paragraphs = docx_paragraphs(&xml)?;
    let mut content = String::new();
    for p in &paragraphs {
        content.push_str(p);
        content.push('\n');
    }
    let mut meta = base_meta(path, DocType::Docx);
    meta.extra.insert("paragraphs".to_string(), paragraphs.len().to_string());
    Ok(Document::new(content, meta))
}

fn docx_paragraphs(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current.clear(),
                b"w:t" => in_text_run = true,
                _ => {}
            },
            Event::Text(t) if in_text_run => current.push_str(&t.unescape()?),
            Event::End(e) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                b"w:p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(paragraphs)
}

/// Markdown: render to events and keep only the text, so structural
/// markers never leak into embeddings.
pub fn read_markdown(path: &Path) -> Result<Document> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let content = markdown_to_text(&raw);
    let mut meta = base_meta(path, DocType::Markdown);
    meta.extra.insert("original_format".to_string(), "markdown".to_string());
    Ok(Document::new(content, meta))
}

pub fn markdown_to_text(markdown: &str) -> String {
    use pulldown_cmark::{Event as MdEvent, Parser, TagEnd};
    let mut out = String::new();
    for event in Parser::new(markdown) {
        match event {
            MdEvent::Text(t) | MdEvent::Code(t) => out.push_str(&t),
            MdEvent::SoftBreak | MdEvent::HardBreak => out.push('\n'),
            MdEvent::End(TagEnd::Heading(_)) => out.push_str("\n\n"),
            MdEvent::End(TagEnd::Paragraph) => out.push_str("\n\n"),
            MdEvent::End(TagEnd::Item | TagEnd::CodeBlock) => out.push('\n'),
            _ => {}
        }
    }
    out
}

/// Plain or structured-config text, read verbatim. Invalid UTF-8 is
/// replaced rather than rejected, matching the rest of the pipeline's
/// tolerance for messy inputs.
pub fn read_text(path: &Path) -> Result<Document> {
    let content = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(_) => String::from_utf8_lossy(&fs::read(path)?).to_string(),
    };
    Ok(Document::new(content, base_meta(path, DocType::Text)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_markup_never_survives() {
        let md = "# Heading\n\nSome **bold** text and `inline code`.\n\n- item one\n- item two\n";
        let text = markdown_to_text(md);
        assert!(text.contains("Heading"));
        assert!(text.contains("bold"));
        assert!(text.contains("inline code"));
        assert!(text.contains("item one"));
        assert!(!text.contains('#'));
        assert!(!text.contains('*'));
        assert!(!text.contains('`'));
        assert!(!text.contains('-'));
    }

    #[test]
    fn docx_paragraph_extraction_follows_document_order() {
        let xml = r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;
        let paragraphs = docx_paragraphs(xml).expect("parse");
        assert_eq!(paragraphs, vec!["First paragraph.".to_string(), "Second paragraph.".to_string()]);
    }
}
