//! Reading-order merge
//!
//! Page texts are emitted in page order. Each image's OCR text is spliced
//! into its page at a character offset proportional to the image's
//! vertical position:
//!
//! ```text
//! offset = round(y_position / page_height * chars(page_text))
//! ```
//!
//! Images on the same page are spliced top to bottom into the same buffer,
//! so each offset is computed against text that already contains the
//! earlier splices.

use crate::document::{ExtractedTextSpan, ImageOcrResult};

/// Merge page texts and image OCR results into one string
pub fn merge_reading_order(spans: &[ExtractedTextSpan], mut images: Vec<ImageOcrResult>) -> String {
    images.sort_by(|a, b| {
        a.page_index
            .cmp(&b.page_index)
            .then(a.y_position.total_cmp(&b.y_position))
    });

    let page_text = |index: usize| spans.get(index).map(|s| s.content.as_str()).unwrap_or("");

    let mut merged = String::new();
    let mut cursor = 0;
    let mut buffer = page_text(0).to_string();

    for image in &images {
        while cursor < image.page_index {
            merged.push_str(&buffer);
            cursor += 1;
            buffer = page_text(cursor).to_string();
        }

        let page_height = spans.get(cursor).map(|s| s.page_height).unwrap_or(0.0);
        let offset = splice_offset(image.y_position, page_height, buffer.chars().count());
        splice(&mut buffer, offset, &image.ocr_text);
    }

    merged.push_str(&buffer);
    for span in spans.iter().skip(cursor + 1) {
        merged.push_str(&span.content);
    }

    merged
}

/// Character offset for an image at `y_position` on a page of `page_height`
fn splice_offset(y_position: f32, page_height: f32, text_chars: usize) -> usize {
    if text_chars == 0 || !page_height.is_finite() || page_height <= 0.0 {
        return 0;
    }

    let offset = (y_position as f64 / page_height as f64 * text_chars as f64).round();
    if offset.is_nan() || offset <= 0.0 {
        0
    } else {
        (offset as usize).min(text_chars)
    }
}

/// Insert `" {text} "` at character offset `offset`
fn splice(buffer: &mut String, offset: usize, text: &str) {
    let byte_index = buffer
        .char_indices()
        .nth(offset)
        .map(|(index, _)| index)
        .unwrap_or(buffer.len());

    buffer.insert_str(byte_index, &format!(" {} ", text));
}
