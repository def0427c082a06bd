// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF object-graph operations: the read-only document model, structural
// manipulation, compression, and text extraction.

pub mod compress;
pub mod reader;
pub mod structure;
pub mod text;
