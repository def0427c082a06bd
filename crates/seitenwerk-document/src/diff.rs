// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document diff engine — extracts per-page text lines from two documents and
// computes a token-level diff (longest common subsequence) per page. Pages
// present in only one document are reported as layout differences rather than
// text diffs.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use seitenwerk_core::error::Result;

use crate::pdf::text::extract_lines;
use crate::DocumentModel;

/// What happened to a span of tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpanOp {
    Added,
    Removed,
    Unchanged,
}

/// A run of consecutive tokens sharing one diff operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSpan {
    pub op: SpanOp,
    pub text: String,
}

/// Whether a page difference is textual or structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageDiffKind {
    Text,
    Layout,
}

/// Differences found on a single page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDiff {
    /// Zero-based page index.
    pub page: usize,
    pub kind: PageDiffKind,
    /// Token spans for text diffs; empty for layout differences.
    pub spans: Vec<DiffSpan>,
}

/// Aggregate token counts across all pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffSummary {
    pub added: usize,
    pub removed: usize,
    pub unchanged: usize,
    pub pages_changed: usize,
}

/// Full comparison result for two documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiffReport {
    pub identical: bool,
    pub page_count_a: usize,
    pub page_count_b: usize,
    /// Only pages with differences appear here.
    pub pages: Vec<PageDiff>,
    pub summary: DiffSummary,
}

/// Compare two PDF documents.
#[instrument(skip_all, fields(a_len = a.len(), b_len = b.len()))]
pub fn diff(a: &[u8], b: &[u8]) -> Result<DiffReport> {
    let model_a = DocumentModel::from_bytes(a)?;
    let model_b = DocumentModel::from_bytes(b)?;
    let page_count_a = model_a.page_count();
    let page_count_b = model_b.page_count();

    // Byte-identical documents need no text walk.
    if hash(a) == hash(b) {
        debug!("Documents are byte-identical");
        return Ok(DiffReport {
            identical: true,
            page_count_a,
            page_count_b,
            pages: Vec::new(),
            summary: DiffSummary::default(),
        });
    }

    let mut pages = Vec::new();
    let mut summary = DiffSummary::default();

    let shared = page_count_a.min(page_count_b);
    for page in 0..shared {
        let tokens_a = page_tokens(a, page)?;
        let tokens_b = page_tokens(b, page)?;
        let spans = token_diff(&tokens_a, &tokens_b);

        let changed = spans.iter().any(|span| span.op != SpanOp::Unchanged);
        for span in &spans {
            let count = span.text.split_whitespace().count();
            match span.op {
                SpanOp::Added => summary.added += count,
                SpanOp::Removed => summary.removed += count,
                SpanOp::Unchanged => summary.unchanged += count,
            }
        }
        if changed {
            pages.push(PageDiff {
                page,
                kind: PageDiffKind::Text,
                spans,
            });
        }
    }

    // Pages only one document has are structural, not textual, differences.
    for page in shared..page_count_a.max(page_count_b) {
        pages.push(PageDiff {
            page,
            kind: PageDiffKind::Layout,
            spans: Vec::new(),
        });
    }

    summary.pages_changed = pages.len();
    let identical = pages.is_empty() && page_count_a == page_count_b;

    info!(
        pages_changed = summary.pages_changed,
        added = summary.added,
        removed = summary.removed,
        identical,
        "Diff complete"
    );

    Ok(DiffReport {
        identical,
        page_count_a,
        page_count_b,
        pages,
        summary,
    })
}

fn hash(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// All tokens on a page, lines top to bottom, words left to right within the
/// extraction order.
fn page_tokens(source: &[u8], page: usize) -> Result<Vec<String>> {
    let lines = extract_lines(source, page)?;
    Ok(lines
        .into_iter()
        .flat_map(|line| {
            line.text
                .split_whitespace()
                .map(str::to_owned)
                .collect::<Vec<_>>()
        })
        .collect())
}

/// Classic LCS diff over token sequences, merged into per-operation spans.
fn token_diff(a: &[String], b: &[String]) -> Vec<DiffSpan> {
    // DP table of LCS lengths for suffixes.
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }

    let mut ops: Vec<(SpanOp, &str)> = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            ops.push((SpanOp::Unchanged, &a[i]));
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            ops.push((SpanOp::Removed, &a[i]));
            i += 1;
        } else {
            ops.push((SpanOp::Added, &b[j]));
            j += 1;
        }
    }
    while i < a.len() {
        ops.push((SpanOp::Removed, &a[i]));
        i += 1;
    }
    while j < b.len() {
        ops.push((SpanOp::Added, &b[j]));
        j += 1;
    }

    // Merge consecutive tokens with the same operation.
    let mut spans: Vec<DiffSpan> = Vec::new();
    for (op, token) in ops {
        match spans.last_mut() {
            Some(span) if span.op == op => {
                span.text.push(' ');
                span.text.push_str(token);
            }
            _ => spans.push(DiffSpan {
                op,
                text: token.to_owned(),
            }),
        }
    }
    spans
}
