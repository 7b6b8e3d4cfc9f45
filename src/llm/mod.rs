//! Remote language model
//!
//! - `client`: HTTP client for the Gemini `generateContent` API
//! - `categories`: fixed classification labels per language
//! - `summarizer`: prompts for summarization and classification

pub mod categories;
mod client;
mod summarizer;

pub use categories::Language;
pub use client::{GeminiClient, GeminiConfig, LanguageModel, LlmError};
pub use summarizer::{classification_prompt, summarization_prompt, SummaryOutcome, Summarizer};

#[cfg(test)]
pub(crate) use client::MockModel;
