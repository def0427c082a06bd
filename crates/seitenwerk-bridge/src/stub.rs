// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The no-backend bridge. Every call reports the service as unavailable so
// callers surface the right message instead of hanging or panicking when no
// remote endpoint is configured.

use seitenwerk_core::{Result, SeitenwerkError};
use tracing::warn;

use crate::traits::{ConvertService, ConvertTarget, ProtectService, RemoteBridge, UnlockService};

/// Bridge used when no remote endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubBridge;

impl StubBridge {
    pub fn new() -> Self {
        Self
    }

    fn unavailable(&self, operation: &str) -> SeitenwerkError {
        warn!(operation, "No remote backend configured");
        SeitenwerkError::ServiceUnavailable
    }
}

impl ConvertService for StubBridge {
    async fn convert(&self, _source: &[u8], target: ConvertTarget) -> Result<Vec<u8>> {
        Err(self.unavailable(target.extension()))
    }
}

impl ProtectService for StubBridge {
    async fn encrypt(&self, _source: &[u8], _password: &str) -> Result<Vec<u8>> {
        Err(self.unavailable("encrypt"))
    }
}

impl UnlockService for StubBridge {
    async fn unlock(&self, _source: &[u8], _password: &str) -> Result<Vec<u8>> {
        Err(self.unavailable("unlock"))
    }
}

impl RemoteBridge for StubBridge {
    fn endpoint_name(&self) -> &str {
        "unconfigured"
    }
}
