// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Seitenwerk — interactive editing session.
//
// This crate owns everything that happens between loading a document and
// exporting it again: the pending-annotation store, pointer interaction
// (select, drag, draw, erase), coordinate transforms between screen pixels
// and page points, preview compositing, and the commit engine that re-parses
// the original bytes and stamps every pending edit into real PDF content.
// All state lives in an explicit `EditorSession` value; there are no globals.

pub mod compositor;
pub mod export;
pub mod interaction;
pub mod jobs;
pub mod session;
pub mod store;
pub mod transform;

pub use compositor::{ComposedPage, OverlayElement, OverlayKind, compose_page};
pub use export::commit;
pub use interaction::{InteractionEngine, PointerEvent, PointerInput};
pub use jobs::{Job, JobOutcome, export_session, load_document};
pub use session::EditorSession;
pub use store::AnnotationStore;
pub use transform::{Viewport, to_pdf_user_space};
