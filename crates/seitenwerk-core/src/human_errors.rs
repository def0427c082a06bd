// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every technical error is mapped to plain English with a clear suggestion.
// A failed operation must never surface as a bare "error occurred".

use crate::error::SeitenwerkError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip, timeout — we can retry automatically.
    Transient,
    /// User must do something (supply a password, pick a different file).
    ActionRequired,
    /// Cannot be fixed by retrying or user action — corrupt file, bad format.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the system should auto-retry.
    pub retriable: bool,
    /// Severity level (drives icon/colour in UI).
    pub severity: Severity,
}

/// Convert a `SeitenwerkError` into something a non-technical user can act on.
pub fn humanize_error(err: &SeitenwerkError) -> HumanError {
    match err {
        SeitenwerkError::Parse(_) => HumanError {
            message: "This file couldn't be loaded.".into(),
            suggestion: "The file may be damaged or not a real PDF. Try opening it in another \
                         viewer to check, or pick a different file."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SeitenwerkError::EncryptedDocument => HumanError {
            message: "This PDF is password-protected.".into(),
            suggestion: "Unlock the file with its password first, then try again.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SeitenwerkError::Export { annotation, detail } => HumanError {
            message: "One of your edits couldn't be saved into the PDF.".into(),
            suggestion: format!(
                "Remove or change the affected edit and export again. \
                 (Edit {annotation}: {detail})"
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SeitenwerkError::Document(detail) => HumanError {
            message: "That page operation isn't possible.".into(),
            suggestion: format!("Check the selected pages and try again. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SeitenwerkError::PageOutOfRange { page, page_count } => HumanError {
            message: "That page doesn't exist in this document.".into(),
            suggestion: format!(
                "Page {} was requested but the document only has {} pages.",
                page + 1,
                page_count
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SeitenwerkError::Image(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a \
                         JPEG or PNG first."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SeitenwerkError::RemoteService(detail) => {
            if detail.contains("timeout") || detail.contains("connect") {
                HumanError {
                    message: "We couldn't reach the conversion service.".into(),
                    suggestion: "Check your internet connection and try again in a moment.".into(),
                    retriable: true,
                    severity: Severity::Transient,
                }
            } else {
                HumanError {
                    message: "The conversion service reported a problem.".into(),
                    suggestion: format!("Try again; if it keeps failing, the file may not be \
                                         convertible. ({detail})"),
                    retriable: true,
                    severity: Severity::Transient,
                }
            }
        }

        SeitenwerkError::ServiceUnavailable => HumanError {
            message: "This feature needs an online service that isn't set up.".into(),
            suggestion: "Conversion, protection, and unlocking need a configured service \
                         endpoint. Everything else works offline."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SeitenwerkError::Io(_) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: "Check that the file still exists and that there's disk space left, \
                         then try again."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SeitenwerkError::Serialization(_) => HumanError {
            message: "An internal data error occurred.".into(),
            suggestion: "This is a bug in the app rather than a problem with your file. \
                         Please report it."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}
