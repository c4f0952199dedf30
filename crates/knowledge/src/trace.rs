//! Prompt traces.
//!
//! Every answered query produces one `PromptTrace` with the exact system
//! and user messages sent and the raw backend response. Sinks must neither
//! fail nor block the answer path: they log their own errors and return.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::thread::JoinHandle;
use tokio::sync::mpsc;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptTrace {
    pub trace_id: Uuid,
    pub query: String,
    pub system: String,
    pub user: String,
    pub raw_response: String,
    pub model: String,
    pub recorded_at: DateTime<Utc>,
}

impl PromptTrace {
    pub fn new(
        query: impl Into<String>,
        system: impl Into<String>,
        user: impl Into<String>,
        raw_response: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            query: query.into(),
            system: system.into(),
            user: user.into(),
            raw_response: raw_response.into(),
            model: model.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Destination for prompt traces.
pub trait TraceSink: Send + Sync {
    fn record(&self, trace: &PromptTrace);
}

/// Emits each trace as a `tracing` debug event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl TraceSink for TracingSink {
    fn record(&self, trace: &PromptTrace) {
        tracing::debug!(
            target: "grounded::trace",
            trace_id = %trace.trace_id,
            model = %trace.model,
            query = %trace.query,
            system = %trace.system,
            user = %trace.user,
            raw_response = %trace.raw_response,
            "Prompt trace"
        );
    }
}

/// Pending traces a `JsonlSink` holds before it starts dropping.
pub const JSONL_QUEUE_CAPACITY: usize = 1024;

/// Appends traces to a JSON Lines file from a background writer thread.
///
/// `record` only enqueues. A full queue drops the trace with a warning.
/// Dropping the sink drains the queue and joins the writer.
#[derive(Debug)]
pub struct JsonlSink {
    path: PathBuf,
    queue: Option<mpsc::Sender<PromptTrace>>,
    writer: Option<JoinHandle<()>>,
    dropped: AtomicU64,
}

impl JsonlSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, JSONL_QUEUE_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        let path = path.into();
        let (tx, rx) = mpsc::channel(capacity.max(1));

        let target = path.clone();
        let spawned = std::thread::Builder::new()
            .name("grounded-trace-writer".to_string())
            .spawn(move || write_loop(target, rx));

        let (queue, writer) = match spawned {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                tracing::warn!(path = %path.display(), "Trace writer not started: {}", e);
                (None, None)
            }
        };

        Self {
            path,
            queue,
            writer,
            dropped: AtomicU64::new(0),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Traces discarded because the queue was full or the writer was gone.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

fn write_loop(path: PathBuf, mut rx: mpsc::Receiver<PromptTrace>) {
    let mut file = None;
    while let Some(trace) = rx.blocking_recv() {
        if let Err(e) = append_line(&path, &mut file, &trace) {
            tracing::warn!(
                path = %path.display(),
                trace_id = %trace.trace_id,
                "Failed to write prompt trace: {}",
                e
            );
            file = None;
        }
    }
}

fn append_line(path: &Path, file: &mut Option<File>, trace: &PromptTrace) -> std::io::Result<()> {
    if file.is_none() {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        *file = Some(OpenOptions::new().create(true).append(true).open(path)?);
    }

    let line = serde_json::to_string(trace)?;
    match file.as_mut() {
        Some(out) => writeln!(out, "{}", line),
        None => Ok(()),
    }
}

impl TraceSink for JsonlSink {
    fn record(&self, trace: &PromptTrace) {
        let Some(queue) = &self.queue else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return;
        };

        if let Err(e) = queue.try_send(trace.clone()) {
            let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
            if total == 1 {
                tracing::warn!(trace_id = %trace.trace_id, "Prompt trace dropped: {}", e);
            } else {
                tracing::debug!(dropped = total, "Prompt trace dropped: {}", e);
            }
        }
    }
}

impl Drop for JsonlSink {
    fn drop(&mut self) {
        // Closing the queue ends the writer once it has drained
        self.queue.take();
        if let Some(writer) = self.writer.take() {
            let _ = writer.join();
        }
    }
}

/// Keeps traces in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    traces: Mutex<Vec<PromptTrace>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn traces(&self) -> Vec<PromptTrace> {
        self.traces
            .lock()
            .map(|t| t.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }
}

impl TraceSink for MemorySink {
    fn record(&self, trace: &PromptTrace) {
        let mut traces = self.traces.lock().unwrap_or_else(|e| e.into_inner());
        traces.push(trace.clone());
    }
}
