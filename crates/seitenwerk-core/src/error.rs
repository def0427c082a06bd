// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Seitenwerk.

use thiserror::Error;

/// Top-level error type for all Seitenwerk operations.
#[derive(Debug, Error)]
pub enum SeitenwerkError {
    // -- Parse errors --
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    #[error("document is encrypted; a password is required")]
    EncryptedDocument,

    // -- Export errors --
    #[error("export failed on annotation {annotation}: {detail}")]
    Export { annotation: String, detail: String },

    // -- Document structure errors --
    #[error("document operation failed: {0}")]
    Document(String),

    #[error("page {page} out of range (document has {page_count} pages)")]
    PageOutOfRange { page: usize, page_count: usize },

    // -- Image errors --
    #[error("image processing failed: {0}")]
    Image(String),

    // -- Remote collaborator errors --
    #[error("remote service failed: {0}")]
    RemoteService(String),

    #[error("remote service not configured")]
    ServiceUnavailable,

    // -- Infrastructure --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SeitenwerkError>;
