// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Background jobs.
//
// Parsing and committing are CPU-bound, so they run on the blocking pool.
// Every job captures the session epoch at spawn; if the session was reset
// while the job ran, the result resolves to `Stale` and is dropped instead
// of clobbering the new document state. Abandoning a navigation therefore
// never shows the previous document's result.

use seitenwerk_core::{Result, SeitenwerkError};
use seitenwerk_document::DocumentModel;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::export::commit_snapshot;
use crate::session::EditorSession;

/// What a resolved background job produced.
#[derive(Debug)]
pub enum JobOutcome<T> {
    Finished(T),
    Failed(SeitenwerkError),
    /// The session moved on (reset or new document) while the job ran.
    Stale,
}

/// An in-flight background job, pinned to the epoch it was spawned under.
#[derive(Debug)]
pub struct Job<T> {
    epoch: u64,
    handle: JoinHandle<Result<T>>,
}

impl<T> Job<T> {
    /// Await completion and check the result against the session's current
    /// epoch. The epoch is read after the job finishes, so a reset that races
    /// the job still wins.
    pub async fn resolve(self, session: &EditorSession) -> JobOutcome<T> {
        let value = match self.handle.await {
            Ok(value) => value,
            Err(err) => {
                return JobOutcome::Failed(SeitenwerkError::Document(format!(
                    "background job failed: {err}"
                )));
            }
        };
        if self.epoch != session.epoch() {
            warn!(
                job_epoch = self.epoch,
                session_epoch = session.epoch(),
                "Discarding stale job result"
            );
            return JobOutcome::Stale;
        }
        match value {
            Ok(value) => JobOutcome::Finished(value),
            Err(err) => JobOutcome::Failed(err),
        }
    }
}

/// Parse a document on the blocking pool, pinned to `epoch`.
pub fn load_document(epoch: u64, bytes: Vec<u8>) -> Job<DocumentModel> {
    debug!(epoch, bytes = bytes.len(), "Spawning document load");
    Job {
        epoch,
        handle: tokio::task::spawn_blocking(move || DocumentModel::from_bytes(&bytes)),
    }
}

/// Commit a session's pending edits on the blocking pool. The job works on a
/// snapshot; edits made after spawn are not included.
pub fn export_session(session: &EditorSession) -> Job<Vec<u8>> {
    let source = session.source().to_vec();
    let store = session.store().clone();
    let highlight_opacity = session.config().highlight_opacity;
    debug!(
        epoch = session.epoch(),
        annotations = store.len(),
        "Spawning session export"
    );
    Job {
        epoch: session.epoch(),
        handle: tokio::task::spawn_blocking(move || {
            commit_snapshot(&source, &store, highlight_opacity)
        }),
    }
}
