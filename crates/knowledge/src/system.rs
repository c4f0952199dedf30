//! System lifecycle.
//!
//! `RagSystem::initialize` does all one-time work (config checks, backend
//! probes, ingestion, embedding, index build) and returns a ready value or
//! a fatal error. Callers hold the result explicitly; `SystemHandle` models
//! the in-between state for front ends that accept queries while starting.

use crate::chunk::{Chunk, ChunkPipeline};
use crate::config::KnowledgeConfig;
use crate::document::Document;
use crate::embeddings::{create_provider, EmbeddingEngine, EmbeddingProvider};
use crate::ingest::{self, Corpus, IngestReport};
use crate::parser::FileLoader;
use crate::progress::ProgressReporter;
use crate::rag::{Answer, AnswerComposer, ComposerSettings};
use crate::retriever::{RetrievalReport, Retriever};
use crate::trace::{JsonlSink, TraceSink, TracingSink};
use crate::vector_index::FlatIndex;
use futures::stream::{self, StreamExt};
use grounded_core::config::AppConfig;
use grounded_core::{AppError, AppResult};
use grounded_llm::{create_client, LlmClient, RetryPolicy};
use grounded_prompt::{resolve_prompt, PromptDefinition};
use std::future::Future;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Everything a system needs besides the corpus.
pub struct SystemComponents {
    pub config: KnowledgeConfig,
    pub prompt: PromptDefinition,
    pub client: Arc<dyn LlmClient>,
    /// Generation model identifier
    pub model: String,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub sink: Arc<dyn TraceSink>,
}

impl SystemComponents {
    /// Resolve components from application and pipeline config.
    ///
    /// Fails with `FatalConfig` on bad settings, unknown providers, missing
    /// credentials or an unreachable embedding backend, and with a `Prompt`
    /// error when a prompt override is invalid.
    pub async fn from_config(app: &AppConfig, config: KnowledgeConfig) -> AppResult<Self> {
        app.validate()?;
        config.validate()?;

        let prompt = resolve_prompt(&app.workspace, &config.prompt_id)?;

        let api_key = app.resolve_api_key(&app.provider);
        let client = create_client(
            &app.provider,
            app.endpoint.as_deref(),
            api_key.as_deref(),
            RetryPolicy::default(),
        )?;

        let embedder = create_provider(&config.embedding).await?;

        let sink: Arc<dyn TraceSink> = match &config.trace_file {
            Some(path) if path.is_absolute() => Arc::new(JsonlSink::new(path)),
            Some(path) => Arc::new(JsonlSink::new(app.workspace.join(path))),
            None => Arc::new(TracingSink),
        };

        Ok(Self {
            config,
            prompt,
            client,
            model: app.model.clone(),
            embedder,
            sink,
        })
    }
}

/// A ready-to-query system.
pub struct RagSystem {
    retriever: Retriever,
    composer: AnswerComposer,
    config: KnowledgeConfig,
    report: IngestReport,
}

impl RagSystem {
    /// Load the corpus under the configured data directory and build the index.
    pub async fn initialize(
        app: &AppConfig,
        config: KnowledgeConfig,
        progress: &ProgressReporter,
    ) -> AppResult<Self> {
        let components = SystemComponents::from_config(app, config).await?;
        Self::from_data_dir(components, &app.data_path(), progress).await
    }

    /// Ingest every supported file under `data_dir`.
    pub async fn from_data_dir(
        components: SystemComponents,
        data_dir: &Path,
        progress: &ProgressReporter,
    ) -> AppResult<Self> {
        tracing::info!("Initializing from {}", data_dir.display());

        let pipeline = ChunkPipeline::new(components.config.chunk.clone())?;
        let corpus = ingest::load_corpus(data_dir, &FileLoader, &pipeline, progress)?;
        Self::from_corpus(components, corpus, progress).await
    }

    /// Build a system over in-memory documents. Text is cleaned first.
    pub async fn from_documents(
        components: SystemComponents,
        documents: Vec<Document>,
    ) -> AppResult<Self> {
        let pipeline = ChunkPipeline::new(components.config.chunk.clone())?;
        let documents: Vec<Document> = documents
            .into_iter()
            .map(|mut doc| {
                doc.text = crate::parser::clean_text(&doc.text);
                doc
            })
            .collect();

        let progress = ProgressReporter::silent();
        let corpus =
            ingest::chunk_documents(documents, Vec::new(), &pipeline, &progress, Instant::now())?;
        Self::from_corpus(components, corpus, &progress).await
    }

    async fn from_corpus(
        components: SystemComponents,
        corpus: Corpus,
        progress: &ProgressReporter,
    ) -> AppResult<Self> {
        let SystemComponents {
            config,
            prompt,
            client,
            model,
            embedder,
            sink,
        } = components;

        let engine = EmbeddingEngine::new(embedder, config.embedding.batch_size);
        let index = Arc::new(FlatIndex::new(config.metric));
        ingest::build_index(&corpus.chunks, &engine, index.as_ref(), progress).await?;

        let retriever = Retriever::new(engine, index, config.top_k);
        let composer = AnswerComposer::new(
            client,
            prompt,
            ComposerSettings {
                model,
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                refusal: config.refusal_message.clone(),
            },
            sink,
        );

        tracing::info!(
            chunks = corpus.report.chunk_count,
            files = corpus.report.loaded_files.len(),
            "System ready"
        );

        Ok(Self {
            retriever,
            composer,
            config,
            report: corpus.report,
        })
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    pub fn ingest_report(&self) -> &IngestReport {
        &self.report
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Exact refusal text this system emits.
    pub fn refusal(&self) -> &str {
        self.composer.refusal()
    }

    /// Answer one question from the top-k retrieved chunks, under the
    /// configured query deadline if there is one.
    pub async fn answer(&self, query: &str) -> AppResult<Answer> {
        self.answer_with_k(query, None).await
    }

    pub async fn answer_with_k(&self, query: &str, k: Option<usize>) -> AppResult<Answer> {
        match self.config.query_timeout() {
            Some(timeout) => with_deadline(timeout, self.answer_unbounded(query, k)).await,
            None => self.answer_unbounded(query, k).await,
        }
    }

    /// Answer with an explicit deadline in place of the configured one. The
    /// index is read-only here, so abandoning a query part way leaves
    /// nothing behind.
    pub async fn answer_with_timeout(&self, query: &str, timeout: Duration) -> AppResult<Answer> {
        with_deadline(timeout, self.answer_unbounded(query, None)).await
    }

    async fn answer_unbounded(&self, query: &str, k: Option<usize>) -> AppResult<Answer> {
        let chunks: Vec<Chunk> = self.retriever.retrieve(query, k).await?;
        self.composer.compose(query, chunks).await
    }

    /// Answer many queries with at most `limit` in flight.
    ///
    /// Results come back in input order, one per query.
    pub async fn answer_many(&self, queries: &[String], limit: usize) -> Vec<AppResult<Answer>> {
        stream::iter(queries.iter())
            .map(|query| self.answer(query))
            .buffered(limit.max(1))
            .collect()
            .await
    }

    pub async fn retrieve_with_logs(
        &self,
        query: &str,
        k: Option<usize>,
    ) -> AppResult<RetrievalReport> {
        self.retriever.retrieve_with_logs(query, k).await
    }
}

async fn with_deadline(
    timeout: Duration,
    work: impl Future<Output = AppResult<Answer>>,
) -> AppResult<Answer> {
    tokio::time::timeout(timeout, work).await.unwrap_or_else(|_| {
        Err(AppError::BackendTransient(format!(
            "Query timed out after {:.1}s",
            timeout.as_secs_f64()
        )))
    })
}

#[derive(Clone)]
enum SystemState {
    Initializing,
    Ready(Arc<RagSystem>),
    Failed(String),
}

/// Shared readiness gate around a system that may still be starting.
#[derive(Clone)]
pub struct SystemHandle {
    state: Arc<RwLock<SystemState>>,
}

impl Default for SystemHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemHandle {
    /// A handle in the initializing state.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SystemState::Initializing)),
        }
    }

    /// Record the outcome of initialization. Later calls replace earlier ones.
    pub fn complete(&self, result: AppResult<RagSystem>) {
        let next = match result {
            Ok(system) => SystemState::Ready(Arc::new(system)),
            Err(e) => {
                tracing::error!("Initialization failed: {}", e);
                SystemState::Failed(e.to_string())
            }
        };

        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        *state = next;
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.current(), SystemState::Ready(_))
    }

    fn current(&self) -> SystemState {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// The ready system, `NotReady` while starting, `FatalConfig` after a
    /// failed start.
    pub fn get(&self) -> AppResult<Arc<RagSystem>> {
        match self.current() {
            SystemState::Ready(system) => Ok(system),
            SystemState::Initializing => Err(AppError::NotReady(
                "System is still initializing".to_string(),
            )),
            SystemState::Failed(reason) => Err(AppError::FatalConfig(format!(
                "System failed to start: {}",
                reason
            ))),
        }
    }

    pub async fn answer(&self, query: &str) -> AppResult<Answer> {
        self.get()?.answer(query).await
    }
}
