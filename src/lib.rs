//! pdfsum-server library
//!
//! Extracts the readable content of a PDF (text layer plus OCR of embedded
//! images, merged in reading order) and summarizes it with a remote model.
//! The server binary is in main.rs.
//!
//! # Modules
//!
//! - `pdf`: text layer (MuPDF), embedded images and their placement (lopdf)
//! - `ocr`: OCR engine trait and the Tesseract CLI engine
//! - `extraction`: bounded extraction pipeline and reading-order merge
//! - `llm`: Gemini client, prompts and classification labels
//! - `upload`: upload validation and temp-file staging
//! - `routes`: HTTP surface

pub mod config;
pub mod document;
pub mod error;
pub mod extraction;
pub mod llm;
pub mod ocr;
pub mod pdf;
pub mod routes;
pub mod state;
pub mod upload;

#[cfg(test)]
mod test_support;
