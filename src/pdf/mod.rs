//! PDF passes
//!
//! Two independent read-only passes over the same file:
//!
//! - `text_layer`: native page text via MuPDF structured text
//! - `images`: embedded Image XObjects and their placement via lopdf
//!
//! `decode` turns an image stream into pixels for OCR.

pub mod decode;
pub mod images;
pub mod text_layer;

pub use decode::{decode_image, decode_to_png};
pub use images::extract_page_images;
pub use text_layer::extract_text_layer;
