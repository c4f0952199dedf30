//! Character trigram embeddings.

use crate::embeddings::provider::EmbeddingProvider;
use grounded_core::AppResult;
use std::collections::{BTreeMap, HashSet};
use std::sync::OnceLock;
use unicode_segmentation::UnicodeSegmentation;

const MODEL_NAME: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "what", "does", "how", "why",
];

fn stop_words() -> &'static HashSet<&'static str> {
    static WORDS: OnceLock<HashSet<&'static str>> = OnceLock::new();
    WORDS.get_or_init(|| STOP_WORDS.iter().copied().collect())
}

/// Deterministic, offline embedding provider.
///
/// Each content word contributes to a handful of hashed dimensions: one per
/// character trigram plus one for the whole word. Vectors are unit length,
/// so texts sharing vocabulary score high under cosine similarity. Not
/// semantic, but stable across runs and machines.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// `dimensions` below 1 is raised to 1.
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions: dimensions.max(1),
        }
    }

    fn bucket(&self, bytes: &[u8], multiplier: u64) -> usize {
        let hash = bytes
            .iter()
            .fold(0u64, |acc, &b| acc.wrapping_mul(multiplier).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn generate(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        // Ordered map keeps float accumulation order fixed
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower.unicode_words() {
            if word.chars().count() > 2 && !stop_words().contains(word) {
                *word_freq.entry(word).or_insert(0) += 1;
            }
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let dim = self.bucket(trigram.as_bytes(), 37);
                embedding[dim] += (*freq as f32).sqrt();
            }

            let dim = self.bucket(word.as_bytes(), 31);
            embedding[dim] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut embedding {
                *v /= norm;
            }
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.generate(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_unit_length() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("retrieval augmented generation").await.unwrap();

        assert_eq!(embedding.len(), 384);
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_deterministic() {
        let provider = TrigramProvider::new(128);
        let texts = vec!["Chunk overlap improves continuity.".to_string(); 2];
        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings[0], embeddings[1]);

        let again = TrigramProvider::new(128)
            .embed("Chunk overlap improves continuity.")
            .await
            .unwrap();
        assert_eq!(again, embeddings[0]);
    }

    #[tokio::test]
    async fn test_stop_words_only_is_zero_vector() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("what is the").await.unwrap();
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_shared_vocabulary_scores_higher() {
        let provider = TrigramProvider::new(384);
        let query = provider.embed("What does chunk overlap improve?").await.unwrap();
        let related = provider
            .embed("Chunk overlap improves context continuity across boundaries.")
            .await
            .unwrap();
        let unrelated = provider
            .embed("The Eiffel Tower stands in Paris, France.")
            .await
            .unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let provider = TrigramProvider::new(384);
        assert!(provider.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_dimensions_is_raised_to_one() {
        let provider = TrigramProvider::new(0);
        assert_eq!(provider.dimensions(), 1);

        let embedding = provider.embed("retrieval augmented generation").await.unwrap();
        assert_eq!(embedding.len(), 1);
    }
}
