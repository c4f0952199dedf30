//! Full pipeline scenarios with the trigram embedder and an extractive
//! backend that answers only from the prompt's context block.

use super::support::ExtractiveClient;
use crate::config::KnowledgeConfig;
use crate::document::Document;
use crate::embeddings::providers::TrigramProvider;
use crate::progress::ProgressReporter;
use crate::system::{RagSystem, SystemComponents};
use crate::trace::MemorySink;
use grounded_core::AppError;
use grounded_llm::LlmClient;
use grounded_prompt::builtin::grounded_answer;
use grounded_prompt::DEFAULT_REFUSAL;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn components(client: Arc<dyn LlmClient>, sink: Arc<MemorySink>) -> SystemComponents {
    let config = KnowledgeConfig::default();
    SystemComponents {
        embedder: Arc::new(TrigramProvider::new(config.embedding.dimensions)),
        config,
        prompt: grounded_answer(),
        client,
        model: "extractive-v1".to_string(),
        sink,
    }
}

async fn system_over(texts: &[&str]) -> (RagSystem, Arc<ExtractiveClient>, Arc<MemorySink>) {
    let client = Arc::new(ExtractiveClient::new(DEFAULT_REFUSAL));
    let sink = Arc::new(MemorySink::new());
    let documents = texts
        .iter()
        .enumerate()
        .map(|(i, text)| Document::new(format!("doc{}.md", i), *text))
        .collect();

    let system = RagSystem::from_documents(components(client.clone(), sink.clone()), documents)
        .await
        .unwrap();
    (system, client, sink)
}

#[tokio::test]
async fn test_out_of_corpus_question_is_refused() {
    let (system, client, _) = system_over(&["RAG combines retrieval and generation."]).await;

    let answer = system.answer("What is the capital of France?").await.unwrap();

    assert_eq!(answer.answer, DEFAULT_REFUSAL);
    assert!(answer.is_refusal(system.refusal()));

    // The prompt was still issued with the retrieved context
    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0]
        .system
        .as_deref()
        .unwrap()
        .ends_with("Context:\nRAG combines retrieval and generation."));
}

#[tokio::test]
async fn test_in_corpus_question_is_answered_from_context() {
    let (system, _, sink) =
        system_over(&["Chunk overlap improves context continuity across boundaries."]).await;

    let answer = system.answer("What does chunk overlap improve?").await.unwrap();

    assert!(answer.answer.contains("context continuity"), "{}", answer.answer);
    assert_eq!(answer.source_documents.len(), 1);
    assert_eq!(answer.query, "What does chunk overlap improve?");

    let refs = answer.source_refs();
    assert_eq!(refs.len(), 1);
    assert_eq!(refs[0].source, "doc0.md");

    let traces = sink.traces();
    assert_eq!(traces.len(), 1);
    assert_eq!(traces[0].model, "extractive-v1");
    assert!(traces[0].raw_response.contains("context continuity"));
}

#[tokio::test]
async fn test_context_is_rank_ordered_and_bounded_by_top_k() {
    let (system, client, _) = system_over(&[
        "The Eiffel Tower is in Paris.",
        "Chunk overlap improves context continuity.",
        "Docling converts PDFs into Markdown.",
        "Embeddings map text to vectors.",
        "Vector search ranks chunks by similarity.",
        "Refusal strings mark unanswerable questions.",
    ])
    .await;

    let answer = system.answer("How does chunk overlap help?").await.unwrap();
    assert_eq!(answer.source_documents.len(), 4);
    assert_eq!(answer.source_documents[0].source_id, "doc1.md");

    let system_prompt = client.requests()[0].system.clone().unwrap();
    let context = system_prompt.rsplit("Context:\n").next().unwrap();
    let expected: Vec<&str> = answer
        .source_documents
        .iter()
        .map(|c| c.text.as_str())
        .collect();
    assert_eq!(context, expected.join("\n\n"));
}

#[tokio::test]
async fn test_blank_question_reaches_backend_with_empty_context() {
    let (system, client, _) = system_over(&["RAG combines retrieval and generation."]).await;

    let answer = system.answer("   ").await.unwrap();
    assert!(answer.source_documents.is_empty());
    assert_eq!(answer.answer, DEFAULT_REFUSAL);
    assert!(client.requests()[0].system.as_deref().unwrap().ends_with("Context:\n"));
}

#[tokio::test]
async fn test_initialize_from_data_directory() {
    let temp = TempDir::new().unwrap();
    let data = temp.path().join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(
        data.join("Enterprise RAG System .md"),
        "# Enterprise RAG\n\n\nRAG   combines retrieval and generation.\r\n",
    )
    .unwrap();
    fs::write(
        data.join("The Science of Chunking,md"),
        "Chunk overlap improves context continuity across boundaries.",
    )
    .unwrap();
    fs::write(data.join("notes.pdf"), "%PDF-1.7").unwrap();

    let client = Arc::new(ExtractiveClient::new(DEFAULT_REFUSAL));
    let sink = Arc::new(MemorySink::new());
    let system = RagSystem::from_data_dir(
        components(client, sink),
        &data,
        &ProgressReporter::silent(),
    )
    .await
    .unwrap();

    let report = system.ingest_report();
    assert_eq!(report.loaded_files.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.chunk_count, 2);

    let answer = system.answer("What does chunk overlap improve?").await.unwrap();
    assert!(answer.answer.contains("context continuity"));
    assert!(answer.source_documents[0]
        .source_id
        .ends_with("The Science of Chunking,md"));

    let refused = system.answer("Who painted the Mona Lisa?").await.unwrap();
    assert_eq!(refused.answer, DEFAULT_REFUSAL);
}

#[tokio::test]
async fn test_initialize_with_no_usable_documents_is_fatal() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("empty.md"), "\n\n").unwrap();

    let client = Arc::new(ExtractiveClient::new(DEFAULT_REFUSAL));
    let result = RagSystem::from_data_dir(
        components(client, Arc::new(MemorySink::new())),
        temp.path(),
        &ProgressReporter::silent(),
    )
    .await;

    assert!(matches!(result, Err(AppError::FatalConfig(_))));
}
