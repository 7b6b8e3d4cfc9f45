//! Record types for the extraction passes

/// Native text of one page
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTextSpan {
    /// Page index (0-based)
    pub page_index: usize,
    /// Page text layer, empty when the page has none
    pub content: String,
    /// Page height in PDF units
    pub page_height: f32,
}

impl ExtractedTextSpan {
    pub fn new(page_index: usize, content: impl Into<String>, page_height: f32) -> Self {
        Self {
            page_index,
            content: content.into(),
            page_height,
        }
    }
}

/// OCR output for one image occurrence
#[derive(Debug, Clone, PartialEq)]
pub struct ImageOcrResult {
    /// Page index (0-based)
    pub page_index: usize,
    /// Top edge of the image, measured down from the top of the page
    pub y_position: f32,
    /// Recognized text, trimmed; empty if nothing was recognized
    pub ocr_text: String,
}

/// How an image stream's bytes are encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageEncoding {
    /// DCTDecode stream, the bytes are a JPEG file
    Jpeg,
    /// Decompressed samples
    Raw,
    /// A filter the decoder does not handle (JPX, JBIG2, CCITT)
    Unsupported(String),
}

/// Colour space of raw image samples
#[derive(Debug, Clone, PartialEq)]
pub enum ColorSpace {
    Gray,
    Rgb,
    Cmyk,
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
    Other(String),
}

impl ColorSpace {
    /// Components per sample
    pub fn components(&self) -> Option<usize> {
        match self {
            Self::Gray | Self::Indexed { .. } => Some(1),
            Self::Rgb => Some(3),
            Self::Cmyk => Some(4),
            Self::Other(_) => None,
        }
    }
}

/// Embedded raster image on a page
#[derive(Debug, Clone)]
pub struct PageImage {
    /// Page index (0-based)
    pub page_index: usize,
    /// Top edge of the first placement, 0 when no placement resolved
    pub y_position: f32,
    pub encoding: ImageEncoding,
    /// Stream bytes, decompressed unless `encoding` is `Jpeg`
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub color_space: ColorSpace,
    pub bits_per_component: u8,
}
