//! Test doubles shared by the scenario tests.

use async_trait::async_trait;
use grounded_core::AppResult;
use grounded_llm::{LlmClient, LlmRequest, LlmResponse, LlmUsage, ResponseContent};
use grounded_prompt::builtin::CONTEXT_MARKER;
use std::collections::HashSet;
use std::sync::Mutex;
use unicode_segmentation::UnicodeSegmentation;

const QUESTION_WORDS: &[&str] = &[
    "what", "does", "the", "is", "of", "how", "why", "who", "which", "are", "was", "and", "for",
    "can", "did",
];

/// Extractive backend that only ever answers from the prompt's context.
///
/// It returns the first context sentence sharing a content word with the
/// question (prefix match, so "improve" finds "improves"), and the refusal
/// string otherwise.
pub struct ExtractiveClient {
    refusal: String,
    requests: Mutex<Vec<LlmRequest>>,
}

impl ExtractiveClient {
    pub fn new(refusal: impl Into<String>) -> Self {
        Self {
            refusal: refusal.into(),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn content_words(text: &str) -> HashSet<String> {
        text.unicode_words()
            .map(str::to_lowercase)
            .filter(|w| w.chars().count() > 2 && !QUESTION_WORDS.contains(&w.as_str()))
            .collect()
    }

    fn extract(&self, question: &str, context: &str) -> String {
        let wanted = Self::content_words(question);

        for sentence in context.unicode_sentences() {
            let found = Self::content_words(sentence);
            let hit = wanted
                .iter()
                .any(|w| found.iter().any(|f| f.starts_with(w.as_str()) || w.starts_with(f.as_str())));
            if hit {
                return sentence.trim().to_string();
            }
        }

        self.refusal.clone()
    }
}

#[async_trait]
impl LlmClient for ExtractiveClient {
    fn provider_name(&self) -> &str {
        "extractive"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        self.requests.lock().unwrap().push(request.clone());

        let system = request.system.clone().unwrap_or_default();
        let marker = format!("{}\n", CONTEXT_MARKER);
        let context = system
            .rfind(&marker)
            .map(|at| &system[at + marker.len()..])
            .unwrap_or("");

        Ok(LlmResponse {
            content: ResponseContent::from(self.extract(&request.prompt, context)),
            model: request.model.clone(),
            usage: LlmUsage::new(0, 0),
        })
    }
}
