// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seitenwerk — remote-service seams.
//
// Conversion to Office formats, password protection, and unlock all require
// capabilities the in-process object model does not have. They are expressed
// as traits here; `StubBridge` is the default wiring, which declines every
// call with `ServiceUnavailable` rather than pretending.

pub mod stub;
pub mod traits;

pub use stub::StubBridge;
pub use traits::{ConvertService, ConvertTarget, ProtectService, RemoteBridge, UnlockService};

/// The bridge to use when no endpoint has been configured.
pub fn remote_bridge() -> StubBridge {
    StubBridge::new()
}
