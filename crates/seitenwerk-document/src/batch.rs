// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch processing — applies one document operation to many files, each
// independently. A failure on one file never aborts the rest; every file's
// outcome is reported individually with a counted summary.

use seitenwerk_core::error::Result;
use tracing::{info, warn};

/// Result of one file in a batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub name: String,
    /// Output bytes on success.
    pub output: Option<Vec<u8>>,
    /// Human-readable failure description on error.
    pub error: Option<String>,
}

impl BatchOutcome {
    pub fn succeeded(&self) -> bool {
        self.output.is_some()
    }
}

/// Outcomes for a whole batch, in input order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<BatchOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Counted summary, naming failed files: "3 succeeded, 1 failed: scan.pdf".
    pub fn summary_line(&self) -> String {
        let failed_names: Vec<&str> = self
            .outcomes
            .iter()
            .filter(|o| !o.succeeded())
            .map(|o| o.name.as_str())
            .collect();
        if failed_names.is_empty() {
            format!("{} succeeded", self.succeeded())
        } else {
            format!(
                "{} succeeded, {} failed: {}",
                self.succeeded(),
                self.failed(),
                failed_names.join(", ")
            )
        }
    }
}

/// Apply `op` to every named input independently.
pub fn run_batch<F>(inputs: &[(&str, &[u8])], mut op: F) -> BatchReport
where
    F: FnMut(&[u8]) -> Result<Vec<u8>>,
{
    let mut report = BatchReport::default();

    for (name, bytes) in inputs {
        match op(bytes) {
            Ok(output) => report.outcomes.push(BatchOutcome {
                name: (*name).to_owned(),
                output: Some(output),
                error: None,
            }),
            Err(err) => {
                warn!(file = name, %err, "Batch item failed");
                report.outcomes.push(BatchOutcome {
                    name: (*name).to_owned(),
                    output: None,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    info!(
        total = report.outcomes.len(),
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Batch complete"
    );
    report
}
