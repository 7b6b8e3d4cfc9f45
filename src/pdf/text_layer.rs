//! Text layer extraction
//!
//! Walks every page with MuPDF and rebuilds the page text from the
//! structured text blocks, one output line per text line.

use std::path::Path;

use mupdf::{Document, TextPage, TextPageOptions};

use crate::document::{DocumentError, DocumentResult, ExtractedTextSpan};

/// Extract the text layer of every page, in page order
///
/// Pages without a text layer produce an empty span. The file itself
/// must open as a PDF.
pub fn extract_text_layer(path: &Path) -> DocumentResult<Vec<ExtractedTextSpan>> {
    let path_str = path.to_str().ok_or_else(|| {
        DocumentError::Parse(format!("Path is not valid UTF-8: {}", path.display()))
    })?;

    let doc = Document::open(path_str)?;
    let page_count = doc.page_count()? as usize;

    let mut spans = Vec::with_capacity(page_count);
    for page_index in 0..page_count {
        let page = doc.load_page(page_index as i32)?;
        let bounds = page.bounds()?;
        let page_height = bounds.y1 - bounds.y0;

        let content = match page.to_text_page(TextPageOptions::empty()) {
            Ok(text_page) => layout_text(&text_page),
            Err(e) => {
                tracing::warn!(page = page_index, "No text layer extracted: {}", e);
                String::new()
            }
        };

        spans.push(ExtractedTextSpan::new(page_index, content, page_height));
    }

    tracing::debug!(
        pages = spans.len(),
        chars = spans.iter().map(|s| s.content.chars().count()).sum::<usize>(),
        "Text layer extracted"
    );

    Ok(spans)
}

fn layout_text(text_page: &TextPage) -> String {
    let mut lines = Vec::new();

    for block in text_page.blocks() {
        for line in block.lines() {
            let text: String = line.chars().filter_map(|ch| ch.char()).collect();
            let text = text.trim_end();
            if !text.is_empty() {
                lines.push(text.to_string());
            }
        }
    }

    lines.join("\n")
}
