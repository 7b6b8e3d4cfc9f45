//! Summarization and classification prompts

use std::sync::Arc;

use super::categories::Language;
use super::client::{LanguageModel, LlmError};

/// Prompt asking for a summary in the document's own language
pub fn summarization_prompt(text: &str) -> String {
    format!(
        "please do summarization for this text {} on same language of document (if text in Armenian do it on Armenian), without comments from you",
        text
    )
}

/// Prompt asking to classify `summary` into one of `classes`
pub fn classification_prompt(summary: &str, classes: &[&str]) -> String {
    let rendered = classes
        .iter()
        .map(|class| format!("'{}'", class))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "please do classification for this text {} using only this classes [{}], without comments from you",
        summary, rendered
    )
}

/// Result of a summarize request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryOutcome {
    pub summary: String,
    /// Empty when classification was not requested
    pub classification: String,
}

/// Drives the model through summarization and optional classification
#[derive(Clone)]
pub struct Summarizer {
    model: Arc<dyn LanguageModel>,
}

impl Summarizer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Summarize `text`, then classify the summary when `classify` is set
    pub async fn run(&self, text: &str, classify: Option<Language>) -> Result<SummaryOutcome, LlmError> {
        let summary = self.model.generate(&summarization_prompt(text)).await?;
        tracing::debug!(chars = summary.chars().count(), "Summary generated");

        let classification = match classify {
            Some(language) => {
                let prompt = classification_prompt(&summary, language.categories());
                let label = self.model.generate(&prompt).await?;
                tracing::debug!(language = language.code(), label = %label.trim(), "Summary classified");
                label
            }
            None => String::new(),
        };

        Ok(SummaryOutcome {
            summary,
            classification,
        })
    }
}
