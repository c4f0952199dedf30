//! Evaluation harness.
//!
//! Runs a JSON list of `{question, ground_truth, type}` cases through the
//! system. Refusal cases are graded automatically; everything else is left
//! for manual review.

use crate::system::RagSystem;
use grounded_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Phrases that mark an answer as a refusal.
const REFUSAL_MARKERS: [&str; 2] = ["I don't know", "not present"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalCase {
    pub question: String,
    pub ground_truth: String,
    /// "refusal" or any other label, e.g. "factual"
    #[serde(rename = "type")]
    pub kind: String,
}

impl EvalCase {
    pub fn is_refusal(&self) -> bool {
        self.kind.eq_ignore_ascii_case("refusal")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Pass,
    Fail,
    ReviewRequired,
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Grade::Pass => "PASS",
            Grade::Fail => "FAIL",
            Grade::ReviewRequired => "REVIEW REQUIRED",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalOutcome {
    pub case: EvalCase,
    pub answer: String,
    pub grade: Grade,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvalSummary {
    pub outcomes: Vec<EvalOutcome>,
    pub refusal_passed: usize,
    pub refusal_total: usize,
}

/// Grade one answer. Only refusal cases get a verdict.
pub fn grade_case(case: &EvalCase, answer: &str) -> Grade {
    if !case.is_refusal() {
        return Grade::ReviewRequired;
    }

    if REFUSAL_MARKERS.iter().any(|marker| answer.contains(marker)) {
        Grade::Pass
    } else {
        Grade::Fail
    }
}

pub fn load_cases(path: &Path) -> AppResult<Vec<EvalCase>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::FatalConfig(format!("Failed to read eval set {}: {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        AppError::FatalConfig(format!("Failed to parse eval set {}: {}", path.display(), e))
    })
}

impl EvalSummary {
    pub fn from_answers(cases: Vec<EvalCase>, answers: Vec<String>) -> Self {
        let outcomes: Vec<EvalOutcome> = cases
            .into_iter()
            .zip(answers)
            .map(|(case, answer)| {
                let grade = grade_case(&case, &answer);
                EvalOutcome {
                    case,
                    answer,
                    grade,
                }
            })
            .collect();

        let refusal_total = outcomes.iter().filter(|o| o.case.is_refusal()).count();
        let refusal_passed = outcomes
            .iter()
            .filter(|o| o.case.is_refusal() && o.grade == Grade::Pass)
            .count();

        Self {
            outcomes,
            refusal_passed,
            refusal_total,
        }
    }

    /// Refusal accuracy in percent, if there were refusal cases.
    pub fn refusal_accuracy(&self) -> Option<f64> {
        if self.refusal_total == 0 {
            return None;
        }
        Some(self.refusal_passed as f64 / self.refusal_total as f64 * 100.0)
    }

    pub fn render(&self) -> String {
        let total = self.outcomes.len();
        let mut lines = Vec::new();

        for (i, outcome) in self.outcomes.iter().enumerate() {
            lines.push(format!("[{}/{}] Type: {}", i + 1, total, outcome.case.kind));
            lines.push(format!("Q: {}", outcome.case.question));
            lines.push(format!("A: {}", outcome.answer));
            lines.push(format!("Expected: {}", outcome.case.ground_truth));
            lines.push(format!("Result: {}", outcome.grade));
            lines.push("-".repeat(50));
        }

        lines.push("\n=== SUMMARY ===".to_string());
        match self.refusal_accuracy() {
            Some(pct) => lines.push(format!(
                "Refusal Accuracy: {}/{} ({:.1}%)",
                self.refusal_passed, self.refusal_total, pct
            )),
            None => lines.push("No refusal cases found.".to_string()),
        }
        lines.push("Specific answers require manual or LLM-based verification.".to_string());

        lines.join("\n")
    }
}

/// Answer every case. A failed query is recorded as an `ERROR:` answer.
pub async fn run_eval(system: &RagSystem, cases: Vec<EvalCase>) -> EvalSummary {
    tracing::info!("Running evaluation on {} cases", cases.len());

    let questions: Vec<String> = cases.iter().map(|c| c.question.clone()).collect();
    let results = system
        .answer_many(&questions, system.config().max_concurrency)
        .await;

    let answers = results
        .into_iter()
        .map(|result| match result {
            Ok(answer) => answer.answer,
            Err(e) => {
                tracing::warn!("Evaluation query failed: {}", e);
                format!("ERROR: {}", e)
            }
        })
        .collect();

    let summary = EvalSummary::from_answers(cases, answers);
    tracing::info!(
        refusal_passed = summary.refusal_passed,
        refusal_total = summary.refusal_total,
        "Evaluation finished"
    );
    summary
}
