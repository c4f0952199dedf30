//! Progress reporting for ingestion.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

/// Ingestion phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressPhase {
    Discover,
    Load,
    Chunk,
    Embed,
    Index,
}

impl ProgressPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Discover => "discover",
            Self::Load => "load",
            Self::Chunk => "chunk",
            Self::Embed => "embed",
            Self::Index => "index",
        }
    }
}

impl fmt::Display for ProgressPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One progress update.
#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub phase: ProgressPhase,

    /// Units done so far in this phase (files, chunks, vectors)
    pub current: usize,

    /// Units expected in this phase
    pub total: usize,

    pub message: String,

    /// Seconds since the reporter was created
    pub elapsed_secs: f64,
}

impl ProgressEvent {
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.current as f64 / self.total as f64) * 100.0
    }

    /// Format as a single user-facing line.
    pub fn format_simple(&self) -> String {
        format!(
            "[{}] {}/{} ({:.0}%) - {}",
            self.phase,
            self.current,
            self.total,
            self.percentage(),
            self.message
        )
    }
}

pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Emits progress events to an optional callback and to `tracing`.
#[derive(Clone)]
pub struct ProgressReporter {
    callback: Option<ProgressCallback>,
    started: Instant,
}

impl ProgressReporter {
    pub fn new(callback: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        Self {
            callback: Some(Arc::new(callback)),
            started: Instant::now(),
        }
    }

    /// A reporter that only logs.
    pub fn silent() -> Self {
        Self {
            callback: None,
            started: Instant::now(),
        }
    }

    pub fn report(
        &self,
        phase: ProgressPhase,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) {
        let event = ProgressEvent {
            phase,
            current,
            total,
            message: message.into(),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
        };

        tracing::debug!(
            phase = %event.phase,
            current = event.current,
            total = event.total,
            elapsed_secs = event.elapsed_secs,
            "{}",
            event.message
        );

        if let Some(callback) = &self.callback {
            callback(event);
        }
    }
}

impl fmt::Debug for ProgressReporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressReporter")
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_format_simple() {
        let event = ProgressEvent {
            phase: ProgressPhase::Load,
            current: 5,
            total: 10,
            message: "reading notes.md".to_string(),
            elapsed_secs: 0.0,
        };
        assert_eq!(event.format_simple(), "[load] 5/10 (50%) - reading notes.md");
    }

    #[test]
    fn test_reporter_invokes_callback() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);
        let reporter = ProgressReporter::new(move |event| sink.lock().unwrap().push(event));

        reporter.report(ProgressPhase::Discover, 3, 10, "scanning data");

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].phase, ProgressPhase::Discover);
        assert_eq!(captured[0].current, 3);
    }

    #[test]
    fn test_silent_reporter() {
        ProgressReporter::silent().report(ProgressPhase::Index, 0, 0, "nothing");
    }
}
