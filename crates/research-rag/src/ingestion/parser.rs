//! Multi-format file parser producing page-level text

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::types::FileType;

/// Parsed file with page-level text
#[derive(Debug, Clone)]
pub struct ParsedDocument {
    /// File type
    pub file_type: FileType,
    /// Content hash of the raw bytes
    pub content_hash: String,
    /// Page-level content (one entry for non-paginated formats)
    pub pages: Vec<PageContent>,
}

impl ParsedDocument {
    fn single_page(file_type: FileType, data: &[u8], content: String) -> Self {
        Self {
            file_type,
            content_hash: hash_content(data),
            pages: vec![PageContent {
                page_number: 1,
                content,
            }],
        }
    }
}

/// Content from a single page
#[derive(Debug, Clone)]
pub struct PageContent {
    /// Page number (1-indexed)
    pub page_number: u32,
    /// Text content of the page
    pub content: String,
}

/// Multi-format file parser
pub struct FileParser;

impl FileParser {
    /// Parse a file based on its extension
    pub fn parse(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let file_type = FileType::from_filename(filename);

        match file_type {
            FileType::Pdf => Self::parse_pdf(filename, data),
            FileType::Docx => Self::parse_docx(filename, data),
            FileType::Txt => Ok(Self::parse_text(data)),
            FileType::Markdown => Ok(Self::parse_markdown(data)),
            FileType::Html => Self::parse_html(filename, data),
            FileType::Csv => Self::parse_csv(filename, data),
            FileType::Unknown => Err(Error::UnsupportedFileType(filename.to_string())),
        }
    }

    /// Parse a PDF page by page, falling back to whole-document extraction
    fn parse_pdf(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        match Self::extract_pdf_pages(data) {
            Ok(pages) if !pages.is_empty() => {
                return Ok(ParsedDocument {
                    file_type: FileType::Pdf,
                    content_hash: hash_content(data),
                    pages,
                });
            }
            Ok(_) => tracing::debug!("'{}' has no pages according to lopdf", filename),
            Err(e) => tracing::debug!("Per-page extraction failed for '{}': {}", filename, e),
        }

        let content = pdf_extract::extract_text_from_mem(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        tracing::warn!(
            "'{}' could not be split into pages, loading it as a single page",
            filename
        );

        Ok(ParsedDocument::single_page(FileType::Pdf, data, content))
    }

    fn extract_pdf_pages(data: &[u8]) -> std::result::Result<Vec<PageContent>, lopdf::Error> {
        let doc = lopdf::Document::load_mem(data)?;
        let mut pages = Vec::new();

        for page_number in doc.get_pages().keys() {
            let content = doc.extract_text(&[*page_number])?;
            pages.push(PageContent {
                page_number: *page_number,
                content,
            });
        }

        Ok(pages)
    }

    /// Parse DOCX document
    fn parse_docx(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let doc = docx_rs::read_docx(data)
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;

        let mut content = String::new();

        for child in doc.document.children {
            if let docx_rs::DocumentChild::Paragraph(p) = child {
                for child in p.children {
                    if let docx_rs::ParagraphChild::Run(run) = child {
                        for child in run.children {
                            if let docx_rs::RunChild::Text(t) = child {
                                content.push_str(&t.text);
                            }
                        }
                    }
                }
                content.push('\n');
            }
        }

        Ok(ParsedDocument::single_page(FileType::Docx, data, content))
    }

    /// Parse plain text
    fn parse_text(data: &[u8]) -> ParsedDocument {
        let content = String::from_utf8_lossy(data).to_string();
        ParsedDocument::single_page(FileType::Txt, data, content)
    }

    /// Parse markdown, keeping text and dropping markup
    fn parse_markdown(data: &[u8]) -> ParsedDocument {
        use pulldown_cmark::{Event, Parser, TagEnd};

        let source = String::from_utf8_lossy(data);
        let mut content = String::new();

        for event in Parser::new(&source) {
            match event {
                Event::Text(text) | Event::Code(text) => content.push_str(&text),
                Event::SoftBreak | Event::HardBreak => content.push('\n'),
                Event::End(TagEnd::Paragraph)
                | Event::End(TagEnd::Heading(_))
                | Event::End(TagEnd::Item)
                | Event::End(TagEnd::CodeBlock) => content.push('\n'),
                _ => {}
            }
        }

        ParsedDocument::single_page(FileType::Markdown, data, content)
    }

    /// Parse HTML document
    fn parse_html(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let html = String::from_utf8_lossy(data);
        let document = scraper::Html::parse_document(&html);

        let body_selector = scraper::Selector::parse("body")
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;
        let mut content = String::new();

        if let Some(body) = document.select(&body_selector).next() {
            for text in body.text() {
                let trimmed = text.trim();
                if !trimmed.is_empty() {
                    if !content.is_empty() {
                        content.push(' ');
                    }
                    content.push_str(trimmed);
                }
            }
        }

        Ok(ParsedDocument::single_page(FileType::Html, data, content))
    }

    /// Parse CSV file
    fn parse_csv(filename: &str, data: &[u8]) -> Result<ParsedDocument> {
        let mut reader = csv::Reader::from_reader(data);
        let mut content = String::new();

        let headers = reader
            .headers()
            .map_err(|e| Error::file_parse(filename, e.to_string()))?;
        content.push_str(&headers.iter().collect::<Vec<_>>().join(" | "));
        content.push('\n');

        for record in reader.records().flatten() {
            content.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
            content.push('\n');
        }

        Ok(ParsedDocument::single_page(FileType::Csv, data, content))
    }
}

/// Hash content for change tracking
fn hash_content(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}
