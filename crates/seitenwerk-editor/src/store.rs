// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pending-annotation store.
//
// Insertion order is the z-order: later annotations draw on top and win hit
// tests. A Vec keeps that ordering for free; stores stay small (an editing
// session, not a database), so linear scans are fine.

use seitenwerk_core::{
    Annotation, AnnotationId, DrawAnnotation, ImageAnnotation, SignaturePlacement, TextAnnotation,
};
use tracing::debug;

/// All pending edits for one session, across all pages.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_text(&mut self, annotation: TextAnnotation) -> AnnotationId {
        let id = annotation.id;
        self.annotations.push(Annotation::Text(annotation));
        debug!(%id, "Added text annotation");
        id
    }

    pub fn add_draw(&mut self, annotation: DrawAnnotation) -> AnnotationId {
        let id = annotation.id;
        self.annotations.push(Annotation::Draw(annotation));
        debug!(%id, "Added draw annotation");
        id
    }

    pub fn add_image(&mut self, annotation: ImageAnnotation) -> AnnotationId {
        let id = annotation.id;
        self.annotations.push(Annotation::Image(annotation));
        debug!(%id, "Added image annotation");
        id
    }

    pub fn add_signature(&mut self, placement: SignaturePlacement) -> AnnotationId {
        let id = placement.id;
        self.annotations.push(Annotation::Signature(placement));
        debug!(%id, "Added signature placement");
        id
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    pub fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id() == id)
    }

    /// Replace an annotation in place, keeping its z-order slot. Returns false
    /// if no annotation with the replacement's id exists.
    pub fn update(&mut self, replacement: Annotation) -> bool {
        let id = replacement.id();
        match self.annotations.iter_mut().find(|a| a.id() == id) {
            Some(slot) => {
                *slot = replacement;
                true
            }
            None => false,
        }
    }

    /// Remove by id. Returns the removed annotation, if any.
    pub fn remove(&mut self, id: AnnotationId) -> Option<Annotation> {
        let pos = self.annotations.iter().position(|a| a.id() == id)?;
        Some(self.annotations.remove(pos))
    }

    /// Annotations on one page, in insertion (z) order.
    pub fn list_for_page(&self, page_index: usize) -> Vec<&Annotation> {
        self.annotations
            .iter()
            .filter(|a| a.page_index() == page_index)
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn clear(&mut self) {
        self.annotations.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seitenwerk_core::{Color, DrawKind, FontFamily, FontWeight};

    fn text_at(page_index: usize, x: f32) -> TextAnnotation {
        TextAnnotation {
            id: AnnotationId::new(),
            page_index,
            x,
            y: 50.0,
            text: "hello".into(),
            font_size: 16.0,
            color: Color::BLACK,
            weight: FontWeight::Normal,
            family: FontFamily::Helvetica,
        }
    }

    fn stroke_on(page_index: usize) -> DrawAnnotation {
        DrawAnnotation {
            id: AnnotationId::new(),
            page_index,
            points: vec![(0.0, 0.0), (10.0, 10.0)],
            color: Color::BLACK,
            stroke_width: 2.0,
            kind: DrawKind::Pen,
        }
    }

    #[test]
    fn list_for_page_preserves_insertion_order() {
        let mut store = AnnotationStore::new();
        let first = store.add_text(text_at(0, 10.0));
        store.add_draw(stroke_on(1));
        let third = store.add_text(text_at(0, 30.0));

        let page0 = store.list_for_page(0);
        assert_eq!(page0.len(), 2);
        assert_eq!(page0[0].id(), first);
        assert_eq!(page0[1].id(), third);
    }

    #[test]
    fn update_keeps_z_order_slot() {
        let mut store = AnnotationStore::new();
        let bottom = store.add_text(text_at(0, 10.0));
        store.add_text(text_at(0, 20.0));

        let mut edited = text_at(0, 99.0);
        edited.id = bottom;
        assert!(store.update(Annotation::Text(edited)));

        let page0 = store.list_for_page(0);
        assert_eq!(page0[0].id(), bottom);
        match page0[0] {
            Annotation::Text(t) => assert!((t.x - 99.0).abs() < 1e-4),
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn update_of_unknown_id_is_rejected() {
        let mut store = AnnotationStore::new();
        assert!(!store.update(Annotation::Text(text_at(0, 1.0))));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_returns_the_annotation() {
        let mut store = AnnotationStore::new();
        let id = store.add_draw(stroke_on(2));
        let removed = store.remove(id).expect("annotation exists");
        assert_eq!(removed.id(), id);
        assert!(store.remove(id).is_none());
    }
}
