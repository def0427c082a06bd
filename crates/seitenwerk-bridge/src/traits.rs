// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service traits for the operations that cannot run on the local object
// model: Office format conversion and password-based encryption/decryption.
// Callers program against these traits; wiring a real backend in is a
// deployment concern, not a library one.

use seitenwerk_core::Result;

/// Office formats a conversion backend can produce from a PDF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertTarget {
    Docx,
    Xlsx,
    Pptx,
}

impl ConvertTarget {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Xlsx => "xlsx",
            Self::Pptx => "pptx",
        }
    }
}

/// PDF -> Office document conversion.
pub trait ConvertService {
    fn convert(
        &self,
        source: &[u8],
        target: ConvertTarget,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Password-protect a PDF. Encryption parameters live with the backend.
pub trait ProtectService {
    fn encrypt(
        &self,
        source: &[u8],
        password: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// Remove password protection given the correct password.
pub trait UnlockService {
    fn unlock(
        &self,
        source: &[u8],
        password: &str,
    ) -> impl Future<Output = Result<Vec<u8>>> + Send;
}

/// A full remote backend: all three services plus a name for logs and error
/// messages.
pub trait RemoteBridge: ConvertService + ProtectService + UnlockService {
    fn endpoint_name(&self) -> &str;
}
