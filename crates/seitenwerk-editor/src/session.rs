// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// The editing session.
//
// One `EditorSession` value owns everything mutable about an open document:
// the parsed model, the pending-annotation store, tool and zoom state, and
// the session epoch used to discard stale background jobs. No state lives
// outside this struct.

use seitenwerk_core::{
    AnnotationId, PageDescriptor, Result, SeitenwerkError, SessionConfig, Tool,
};
use seitenwerk_document::DocumentModel;
use tracing::{info, instrument};

use crate::store::AnnotationStore;
use crate::transform::Viewport;

const MIN_ZOOM: f32 = 0.25;
const MAX_ZOOM: f32 = 4.0;

/// All state for one open document.
#[derive(Debug)]
pub struct EditorSession {
    model: DocumentModel,
    /// The bytes the session was opened from. Commit re-parses these, so the
    /// export baseline is always the unmodified original.
    source: Vec<u8>,
    store: AnnotationStore,
    config: SessionConfig,
    zoom: f32,
    active_tool: Tool,
    /// The annotation currently open for inline text editing, if any.
    editing: Option<AnnotationId>,
    /// Bumped on every reset; background jobs capture it at spawn and results
    /// carrying an older epoch are discarded.
    epoch: u64,
}

impl EditorSession {
    /// Open a session over raw PDF bytes with default configuration.
    #[instrument(skip(bytes), fields(len = bytes.len()))]
    pub fn open(bytes: Vec<u8>) -> Result<Self> {
        Self::open_with_config(bytes, SessionConfig::default())
    }

    pub fn open_with_config(bytes: Vec<u8>, config: SessionConfig) -> Result<Self> {
        let model = DocumentModel::from_bytes(&bytes)?;
        info!(pages = model.page_count(), "Opened editing session");
        Ok(Self {
            model,
            source: bytes,
            store: AnnotationStore::new(),
            config,
            zoom: 1.0,
            active_tool: Tool::Select,
            editing: None,
            epoch: 0,
        })
    }

    pub fn model(&self) -> &DocumentModel {
        &self.model
    }

    /// The original bytes the session was opened from.
    pub fn source(&self) -> &[u8] {
        &self.source
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn page(&self, index: usize) -> Result<PageDescriptor> {
        self.model.page(index)
    }

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Change zoom. Annotation coordinates are stored at reference zoom and
    /// are left untouched; only the viewport scale changes.
    pub fn set_zoom(&mut self, zoom: f32) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// The viewport for the current zoom.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.zoom, self.config.render_scale_factor)
    }

    pub fn active_tool(&self) -> Tool {
        self.active_tool
    }

    pub fn set_tool(&mut self, tool: Tool) {
        if tool != self.active_tool {
            // Switching tools always closes any open inline edit.
            self.editing = None;
        }
        self.active_tool = tool;
    }

    pub fn editing(&self) -> Option<AnnotationId> {
        self.editing
    }

    /// Open an annotation for inline text editing. At most one annotation can
    /// be in editing state; opening a second closes the first.
    pub fn begin_text_edit(&mut self, id: AnnotationId) -> Result<()> {
        if self.store.get(id).is_none() {
            return Err(SeitenwerkError::Document(format!(
                "cannot edit unknown annotation {id}"
            )));
        }
        self.editing = Some(id);
        Ok(())
    }

    pub fn end_text_edit(&mut self) {
        self.editing = None;
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Discard every pending edit and bump the epoch so in-flight background
    /// jobs from the previous document state are ignored when they land.
    #[instrument(skip(self))]
    pub fn reset(&mut self) {
        self.store.clear();
        self.editing = None;
        self.epoch += 1;
        info!(epoch = self.epoch, "Session reset");
    }

    /// Swap in a different document: parses the new bytes, drops the old
    /// model, every pending edit, and any in-flight job results.
    #[instrument(skip(self, bytes), fields(len = bytes.len()))]
    pub fn replace_document(&mut self, bytes: Vec<u8>) -> Result<()> {
        let model = DocumentModel::from_bytes(&bytes)?;
        self.model = model;
        self.source = bytes;
        self.reset();
        Ok(())
    }

    /// Check that every pending annotation still targets a valid page. Run
    /// before commit; pages cannot currently be deleted mid-session, so this
    /// only fires on internal bugs, but commit refuses to guess.
    pub fn validate_for_commit(&self) -> Result<()> {
        let page_count = self.model.page_count();
        for annotation in self.store.iter() {
            let page = annotation.page_index();
            if page >= page_count {
                return Err(SeitenwerkError::PageOutOfRange { page, page_count });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::blank_pdf;
    use seitenwerk_core::{Color, FontFamily, FontWeight, TextAnnotation};

    fn session() -> EditorSession {
        EditorSession::open(blank_pdf(2)).expect("open session")
    }

    fn text_on(page_index: usize) -> TextAnnotation {
        TextAnnotation {
            id: AnnotationId::new(),
            page_index,
            x: 40.0,
            y: 40.0,
            text: "note".into(),
            font_size: 16.0,
            color: Color::BLACK,
            weight: FontWeight::Normal,
            family: FontFamily::Helvetica,
        }
    }

    #[test]
    fn zoom_is_clamped_and_leaves_annotations_alone() {
        let mut session = session();
        let id = session.store_mut().add_text(text_on(0));
        session.set_zoom(10.0);
        assert!((session.zoom() - MAX_ZOOM).abs() < 1e-6);
        session.set_zoom(0.01);
        assert!((session.zoom() - MIN_ZOOM).abs() < 1e-6);

        match session.store().get(id).expect("annotation kept") {
            seitenwerk_core::Annotation::Text(t) => {
                assert!((t.x - 40.0).abs() < 1e-4);
                assert!((t.y - 40.0).abs() < 1e-4);
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn switching_tools_closes_inline_edit() {
        let mut session = session();
        let id = session.store_mut().add_text(text_on(0));
        session.begin_text_edit(id).expect("begin edit");
        assert_eq!(session.editing(), Some(id));
        session.set_tool(Tool::Draw);
        assert_eq!(session.editing(), None);
    }

    #[test]
    fn begin_edit_of_unknown_annotation_fails() {
        let mut session = session();
        assert!(session.begin_text_edit(AnnotationId::new()).is_err());
    }

    #[test]
    fn reset_clears_edits_and_bumps_epoch() {
        let mut session = session();
        session.store_mut().add_text(text_on(1));
        let before = session.epoch();
        session.reset();
        assert!(session.store().is_empty());
        assert_eq!(session.epoch(), before + 1);
    }

    #[test]
    fn replace_document_drops_edits_and_old_pages() {
        let mut session = session();
        session.store_mut().add_text(text_on(0));
        let before = session.epoch();
        session
            .replace_document(blank_pdf(5))
            .expect("replace document");
        assert_eq!(session.model().page_count(), 5);
        assert!(session.store().is_empty());
        assert!(session.epoch() > before);
    }

    #[test]
    fn validate_rejects_out_of_range_pages() {
        let mut session = session();
        session.store_mut().add_text(text_on(7));
        assert!(matches!(
            session.validate_for_commit(),
            Err(SeitenwerkError::PageOutOfRange { page: 7, .. })
        ));
    }
}
