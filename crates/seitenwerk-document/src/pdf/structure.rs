// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page-structure engine — merge, split, extract, reorder, rotate, organize,
// watermark, and page-number operations on parsed PDF object graphs.
//
// Every operation fresh-parses its input and serialises a new document; the
// caller's byte buffer is never touched. Page cloning copies the page
// dictionary and everything it transitively references (resources, fonts,
// content streams), skipping the /Parent back-reference which is re-pointed
// at the target page tree.

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, dictionary};
use seitenwerk_core::error::{Result, SeitenwerkError};
use seitenwerk_core::types::{PageNumberPosition, PageOperationState, WatermarkPosition};
use tracing::{debug, info, instrument, warn};

/// Merge any number of documents into one, pages in input order.
#[instrument(skip_all, fields(sources = sources.len()))]
pub fn merge(sources: &[&[u8]]) -> Result<Vec<u8>> {
    if sources.is_empty() {
        return Err(SeitenwerkError::Document(
            "merge requires at least one source document".into(),
        ));
    }

    let docs: Vec<Document> = sources
        .iter()
        .enumerate()
        .map(|(index, bytes)| {
            load(bytes).map_err(|err| {
                SeitenwerkError::Parse(format!("source document #{}: {err}", index + 1))
            })
        })
        .collect::<Result<_>>()?;

    let doc_refs: Vec<&Document> = docs.iter().collect();
    let mut plan: Vec<(usize, ObjectId)> = Vec::new();
    for (index, doc) in docs.iter().enumerate() {
        for page_id in ordered_page_ids(doc) {
            plan.push((index, page_id));
        }
    }

    info!(total_pages = plan.len(), "Merging documents");
    assemble(&doc_refs, &plan)
}

/// Split a document into one single-page document per input page.
#[instrument(skip_all)]
pub fn split(source: &[u8]) -> Result<Vec<Vec<u8>>> {
    let doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);

    info!(pages = page_ids.len(), "Splitting document");
    page_ids
        .iter()
        .map(|page_id| assemble(&[&doc], &[(0, *page_id)]))
        .collect()
}

/// Extract the given pages (0-based, order preserved as given) into a new
/// document.
#[instrument(skip(source), fields(indices = ?indices))]
pub fn extract_pages(source: &[u8], indices: &[usize]) -> Result<Vec<u8>> {
    if indices.is_empty() {
        return Err(SeitenwerkError::Document(
            "no pages selected for extraction".into(),
        ));
    }

    let doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);

    let mut plan = Vec::with_capacity(indices.len());
    for &index in indices {
        let page_id = *page_ids
            .get(index)
            .ok_or(SeitenwerkError::PageOutOfRange {
                page: index,
                page_count: page_ids.len(),
            })?;
        plan.push((0, page_id));
    }

    assemble(&[&doc], &plan)
}

/// Reorder pages. `new_order[i]` names the source page (0-based) that lands at
/// position `i`; it must be a permutation of `0..page_count`.
#[instrument(skip(source), fields(new_order = ?new_order))]
pub fn reorder(source: &[u8], new_order: &[usize]) -> Result<Vec<u8>> {
    let doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);

    if new_order.len() != page_ids.len() {
        return Err(SeitenwerkError::Document(format!(
            "reorder needs every page exactly once: got {} positions for {} pages",
            new_order.len(),
            page_ids.len()
        )));
    }
    let mut seen = vec![false; page_ids.len()];
    for &index in new_order {
        if index >= page_ids.len() || seen[index] {
            return Err(SeitenwerkError::Document(format!(
                "reorder sequence is not a permutation (page {index})"
            )));
        }
        seen[index] = true;
    }

    let plan: Vec<(usize, ObjectId)> = new_order
        .iter()
        .map(|&index| (0, page_ids[index]))
        .collect();
    assemble(&[&doc], &plan)
}

/// Rotate pages by `degrees` (90, 180, or 270), composed with any existing
/// page-level rotation. `pages` selects 0-based targets; `None` rotates all.
#[instrument(skip(source), fields(degrees, pages = ?pages))]
pub fn rotate(source: &[u8], degrees: i64, pages: Option<&[usize]>) -> Result<Vec<u8>> {
    if !matches!(degrees, 90 | 180 | 270) {
        return Err(SeitenwerkError::Document(format!(
            "rotation must be 90, 180, or 270 degrees, got {degrees}"
        )));
    }

    let mut doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);

    let targets: Vec<usize> = match pages {
        Some(selection) => {
            for &index in selection {
                if index >= page_ids.len() {
                    return Err(SeitenwerkError::PageOutOfRange {
                        page: index,
                        page_count: page_ids.len(),
                    });
                }
            }
            selection.to_vec()
        }
        None => (0..page_ids.len()).collect(),
    };

    for index in targets {
        apply_rotation(&mut doc, page_ids[index], degrees);
    }

    save_bytes(&mut doc)
}

/// Apply a batch of per-page operations (delete, reorder, rotate) in a single
/// pass. Each page's own rotation delta is applied independently — there is
/// no document-wide collapse to one angle.
#[instrument(skip(source), fields(states = states.len()))]
pub fn organize(source: &[u8], states: &[PageOperationState]) -> Result<Vec<u8>> {
    let doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);

    for state in states {
        if state.original_index >= page_ids.len() {
            return Err(SeitenwerkError::PageOutOfRange {
                page: state.original_index,
                page_count: page_ids.len(),
            });
        }
    }

    let mut surviving: Vec<&PageOperationState> =
        states.iter().filter(|state| !state.deleted).collect();
    if surviving.is_empty() {
        return Err(SeitenwerkError::Document(
            "cannot delete every page of a document".into(),
        ));
    }
    surviving.sort_by_key(|state| state.new_order);

    let mut target = Document::with_version("1.5");
    let pages_id = target.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(surviving.len());
    let mut cloned = HashMap::new();

    for state in &surviving {
        let page_id = page_ids[state.original_index];
        let cloned_id = clone_page(&doc, &mut target, page_id, &mut cloned)?;
        if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
        let degrees = state.rotation_delta.degrees();
        if degrees != 0 {
            apply_rotation(&mut target, cloned_id, degrees);
        }
        kids.push(Object::Reference(cloned_id));
    }

    finish_page_tree(&mut target, pages_id, kids);
    debug!(pages = surviving.len(), "Organize pass complete");
    save_bytes(&mut target)
}

/// Stamp a text watermark on every page. The text is drawn as a literal text
/// operation so it survives later text extraction.
#[instrument(skip(source), fields(text, ?position))]
pub fn add_watermark(source: &[u8], text: &str, position: WatermarkPosition) -> Result<Vec<u8>> {
    if text.is_empty() {
        return Err(SeitenwerkError::Document("watermark text is empty".into()));
    }

    let mut doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);

    for page_id in page_ids {
        let (width, height) = page_size(&doc, page_id);
        let font_name = ensure_builtin_font(&mut doc, page_id, "Helvetica")?;
        let content = watermark_content(&font_name, text, position, width, height);
        append_content(&mut doc, page_id, content)?;
    }

    info!(text, "Watermark applied");
    save_bytes(&mut doc)
}

/// Stamp "n / total" labels on every page.
#[instrument(skip(source), fields(?position))]
pub fn add_page_numbers(source: &[u8], position: PageNumberPosition) -> Result<Vec<u8>> {
    let mut doc = load(source)?;
    let page_ids = ordered_page_ids(&doc);
    let total = page_ids.len();

    for (index, page_id) in page_ids.into_iter().enumerate() {
        let (width, height) = page_size(&doc, page_id);
        let font_name = ensure_builtin_font(&mut doc, page_id, "Helvetica")?;
        let label = format!("{} / {}", index + 1, total);

        let size: f32 = 11.0;
        let text_width = approx_text_width(&label, size);
        let (x, y) = match position {
            PageNumberPosition::BottomCenter => ((width - text_width) / 2.0, 24.0),
            PageNumberPosition::BottomLeft => (36.0, 24.0),
            PageNumberPosition::BottomRight => (width - text_width - 36.0, 24.0),
            PageNumberPosition::TopCenter => ((width - text_width) / 2.0, height - 36.0),
        };

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![font_name.as_str().into(), Object::Real(size)]),
                Operation::new("g", vec![Object::Real(0.25)]),
                Operation::new("Td", vec![Object::Real(x), Object::Real(y)]),
                Operation::new("Tj", vec![Object::string_literal(label)]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        append_content(&mut doc, page_id, content)?;
    }

    save_bytes(&mut doc)
}

// -- Shared plumbing ----------------------------------------------------------

fn load(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes)
        .map_err(|err| SeitenwerkError::Parse(format!("failed to load PDF: {err}")))
}

fn save_bytes(doc: &mut Document) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    doc.save_to(&mut output)
        .map_err(|err| SeitenwerkError::Document(format!("failed to serialise PDF: {err}")))?;
    Ok(output)
}

/// Page object ids in page order.
pub fn ordered_page_ids(doc: &Document) -> Vec<ObjectId> {
    let pages = doc.get_pages();
    let mut numbered: Vec<(u32, ObjectId)> = pages.into_iter().collect();
    numbered.sort_by_key(|(number, _)| *number);
    numbered.into_iter().map(|(_, id)| id).collect()
}

/// Compose `degrees` onto a page's existing /Rotate value.
fn apply_rotation(doc: &mut Document, page_id: ObjectId, degrees: i64) {
    let existing = doc
        .get_object(page_id)
        .ok()
        .and_then(|obj| match obj {
            Object::Dictionary(dict) => {
                dict.get(b"Rotate").ok().and_then(|r| r.as_i64().ok())
            }
            _ => None,
        })
        .unwrap_or(0);

    let new_rotation = (existing + degrees).rem_euclid(360);
    if let Ok(Object::Dictionary(dict)) = doc.get_object_mut(page_id) {
        dict.set("Rotate", Object::Integer(new_rotation));
    }
}

/// Page dimensions in points, resolving MediaBox inheritance; Letter fallback.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let mut current = page_id;
    for _ in 0..32 {
        let Ok(dict) = doc.get_dictionary(current) else {
            break;
        };
        if let Ok(obj) = dict.get(b"MediaBox") {
            let resolved = match obj {
                Object::Reference(id) => match doc.get_object(*id) {
                    Ok(inner) => inner,
                    Err(_) => break,
                },
                other => other,
            };
            if let Ok(array) = resolved.as_array() {
                if array.len() == 4 {
                    let coords: Vec<f32> = array
                        .iter()
                        .filter_map(|value| value.as_float().ok())
                        .collect();
                    if coords.len() == 4 {
                        return ((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs());
                    }
                }
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => current = *parent_id,
            _ => break,
        }
    }
    (612.0, 792.0)
}

/// Build a new document from a plan of (source index, page) pairs. One clone
/// map is kept per source document, so resources shared between pages of the
/// same source are cloned once and referenced from every page that uses them.
fn assemble(sources: &[&Document], plan: &[(usize, ObjectId)]) -> Result<Vec<u8>> {
    let mut target = Document::with_version("1.5");
    let pages_id = target.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(plan.len());
    let mut cloned: Vec<HashMap<ObjectId, ObjectId>> = vec![HashMap::new(); sources.len()];

    for &(source_index, page_id) in plan {
        let source = sources[source_index];
        let cloned_id = clone_page(source, &mut target, page_id, &mut cloned[source_index])?;
        if let Ok(Object::Dictionary(page_dict)) = target.get_object_mut(cloned_id) {
            page_dict.set("Parent", Object::Reference(pages_id));
        }
        kids.push(Object::Reference(cloned_id));
    }

    finish_page_tree(&mut target, pages_id, kids);
    save_bytes(&mut target)
}

/// Insert the /Pages node and catalog once all kids are cloned.
fn finish_page_tree(target: &mut Document, pages_id: ObjectId, kids: Vec<Object>) {
    let count = kids.len() as i64;
    target.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = target.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    target.trailer.set("Root", catalog_id);
}

/// Deep-clone a page object and everything it references into `target`,
/// returning the new page id. The caller patches /Parent. The page itself is
/// always cloned fresh (a plan may legitimately repeat a page), but its id is
/// registered in `cloned` first so back-references such as an annotation's /P
/// resolve to the copy instead of recursing without end.
fn clone_page(
    source: &Document,
    target: &mut Document,
    page_id: ObjectId,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    let page_object = source.get_object(page_id).map_err(|err| {
        SeitenwerkError::Document(format!("cannot read page object {page_id:?}: {err}"))
    })?;
    let new_id = target.new_object_id();
    cloned.insert(page_id, new_id);
    let clone = deep_clone_object(source, target, page_object, cloned)?;
    target.objects.insert(new_id, clone);
    Ok(new_id)
}

/// Clone the object behind `ref_id` into `target`, memoised through `cloned`.
/// The target id is reserved before the recursive descent so reference cycles
/// (annotation /P, /Dest arrays) terminate at the already-reserved id.
fn clone_object(
    source: &Document,
    target: &mut Document,
    ref_id: ObjectId,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<ObjectId> {
    if let Some(&existing) = cloned.get(&ref_id) {
        return Ok(existing);
    }
    let object = source.get_object(ref_id).map_err(|err| {
        SeitenwerkError::Document(format!("cannot read object {ref_id:?}: {err}"))
    })?;
    let new_id = target.new_object_id();
    cloned.insert(ref_id, new_id);
    let clone = deep_clone_object(source, target, object, cloned)?;
    target.objects.insert(new_id, clone);
    Ok(new_id)
}

/// Recursively clone a single lopdf Object, resolving references (except
/// /Parent, which is deliberately skipped to avoid circular cloning).
fn deep_clone_object(
    source: &Document,
    target: &mut Document,
    object: &Object,
    cloned: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match object {
        Object::Dictionary(dict) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = deep_clone_object(source, target, value, cloned)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Dictionary(new_dict))
        }
        Object::Array(arr) => {
            let mut new_arr = Vec::with_capacity(arr.len());
            for item in arr {
                new_arr.push(deep_clone_object(source, target, item, cloned)?);
            }
            Ok(Object::Array(new_arr))
        }
        Object::Reference(ref_id) => {
            if source.get_object(*ref_id).is_err() {
                warn!(?ref_id, "Cannot resolve reference, using Null");
                return Ok(Object::Null);
            }
            let new_id = clone_object(source, target, *ref_id, cloned)?;
            Ok(Object::Reference(new_id))
        }
        Object::Stream(stream) => {
            let mut new_dict = Dictionary::new();
            for (key, value) in stream.dict.iter() {
                if key == b"Parent" {
                    continue;
                }
                let cloned_value = deep_clone_object(source, target, value, cloned)?;
                new_dict.set(key.clone(), cloned_value);
            }
            Ok(Object::Stream(Stream::new(new_dict, stream.content.clone())))
        }
        other => Ok(other.clone()),
    }
}

// -- Content-stream stamping --------------------------------------------------

/// Register a base-14 font on a page's resources, returning the resource name
/// it is reachable under. Reuses an existing entry for the same base font.
pub fn ensure_builtin_font(
    doc: &mut Document,
    page_id: ObjectId,
    base_font: &str,
) -> Result<String> {
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base_font,
    });
    let resource_name = format!("SwF{}", font_id.0);

    with_page_resources(doc, page_id, |resources| {
        let fonts = match resources.get_mut(b"Font") {
            Ok(Object::Dictionary(fonts)) => fonts,
            _ => {
                resources.set("Font", Object::Dictionary(Dictionary::new()));
                match resources.get_mut(b"Font") {
                    Ok(Object::Dictionary(fonts)) => fonts,
                    _ => unreachable!("Font entry was just set"),
                }
            }
        };
        fonts.set(resource_name.as_bytes(), Object::Reference(font_id));
    })?;

    Ok(resource_name)
}

/// Run `edit` against a page's (possibly indirect, possibly missing) resource
/// dictionary.
pub fn with_page_resources<F>(doc: &mut Document, page_id: ObjectId, edit: F) -> Result<()>
where
    F: FnOnce(&mut Dictionary),
{
    // Resolve where the resources live before taking a mutable borrow.
    enum Target {
        Inline,
        Indirect(ObjectId),
        Missing,
    }
    let target = match doc.get_dictionary(page_id) {
        Ok(page_dict) => match page_dict.get(b"Resources") {
            Ok(Object::Reference(id)) => Target::Indirect(*id),
            Ok(Object::Dictionary(_)) => Target::Inline,
            _ => Target::Missing,
        },
        Err(err) => {
            return Err(SeitenwerkError::Document(format!(
                "page {page_id:?} has no dictionary: {err}"
            )));
        }
    };

    match target {
        Target::Inline => {
            if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
                if let Ok(Object::Dictionary(resources)) = page_dict.get_mut(b"Resources") {
                    edit(resources);
                }
            }
        }
        Target::Indirect(id) => {
            if let Ok(Object::Dictionary(resources)) = doc.get_object_mut(id) {
                edit(resources);
            }
        }
        Target::Missing => {
            if let Ok(Object::Dictionary(page_dict)) = doc.get_object_mut(page_id) {
                let mut resources = Dictionary::new();
                edit(&mut resources);
                page_dict.set("Resources", Object::Dictionary(resources));
            }
        }
    }
    Ok(())
}

/// Append an encoded content stream to a page's /Contents.
pub fn append_content(
    doc: &mut Document,
    page_id: ObjectId,
    content: Content,
) -> Result<()> {
    let encoded = content
        .encode()
        .map_err(|err| SeitenwerkError::Document(format!("content encode failed: {err}")))?;
    let stream_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    let page_dict = match doc.get_object_mut(page_id) {
        Ok(Object::Dictionary(dict)) => dict,
        _ => {
            return Err(SeitenwerkError::Document(format!(
                "page {page_id:?} is not a dictionary"
            )));
        }
    };

    match page_dict.get_mut(b"Contents") {
        Ok(Object::Array(contents)) => contents.push(Object::Reference(stream_id)),
        Ok(Object::Reference(existing)) => {
            let previous = *existing;
            page_dict.set(
                "Contents",
                Object::Array(vec![
                    Object::Reference(previous),
                    Object::Reference(stream_id),
                ]),
            );
        }
        _ => page_dict.set("Contents", Object::Reference(stream_id)),
    }
    Ok(())
}

/// Rough advance-width estimate for Helvetica, good enough for centring.
fn approx_text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * 0.5
}

fn watermark_content(
    font_name: &str,
    text: &str,
    position: WatermarkPosition,
    width: f32,
    height: f32,
) -> Content {
    let mut operations = vec![Operation::new("q", vec![])];

    match position {
        WatermarkPosition::Center => {
            let size = 42.0;
            let x = (width - approx_text_width(text, size)) / 2.0;
            let y = height / 2.0;
            operations.extend(text_run(font_name, text, size, identity_at(x, y)));
        }
        WatermarkPosition::Diagonal => {
            let size = 42.0;
            // 45-degree rotation about the page centre.
            let cos = std::f32::consts::FRAC_1_SQRT_2;
            let half_run = approx_text_width(text, size) / 2.0;
            let x = width / 2.0 - half_run * cos;
            let y = height / 2.0 - half_run * cos;
            operations.extend(text_run(
                font_name,
                text,
                size,
                [cos, cos, -cos, cos, x, y],
            ));
        }
        WatermarkPosition::Tiled => {
            let size = 18.0;
            let step_x = (approx_text_width(text, size) + 72.0).max(96.0);
            let step_y = 108.0;
            let mut y = 54.0;
            while y < height {
                let mut x = 36.0;
                while x < width {
                    operations.extend(text_run(font_name, text, size, identity_at(x, y)));
                    x += step_x;
                }
                y += step_y;
            }
        }
    }

    operations.push(Operation::new("Q", vec![]));
    Content { operations }
}

fn identity_at(x: f32, y: f32) -> [f32; 6] {
    [1.0, 0.0, 0.0, 1.0, x, y]
}

/// One complete BT..ET run drawing `text` with the given text matrix.
fn text_run(font_name: &str, text: &str, size: f32, tm: [f32; 6]) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font_name.into(), Object::Real(size)]),
        Operation::new("g", vec![Object::Real(0.75)]),
        Operation::new(
            "Tm",
            tm.iter().map(|value| Object::Real(*value)).collect(),
        ),
        Operation::new("Tj", vec![Object::string_literal(text)]),
        Operation::new("ET", vec![]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::text::extract_lines;
    use crate::testutil::sample_pdf;
    use seitenwerk_core::types::RotationDelta;

    fn page_rotation(bytes: &[u8], index: usize) -> i64 {
        let doc = Document::load_mem(bytes).expect("load");
        let page_id = ordered_page_ids(&doc)[index];
        doc.get_dictionary(page_id)
            .ok()
            .and_then(|dict| dict.get(b"Rotate").ok())
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0)
    }

    fn page_text(bytes: &[u8], index: usize) -> String {
        extract_lines(bytes, index)
            .expect("extract")
            .into_iter()
            .map(|line| line.text)
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn merge_keeps_pages_in_input_order() {
        let doc_a = sample_pdf(&["a1", "a2", "a3"]);
        let doc_b = sample_pdf(&["b1", "b2"]);

        let merged = merge(&[&doc_a, &doc_b]).expect("merge");
        let model = crate::DocumentModel::from_bytes(&merged).expect("load merged");
        assert_eq!(model.page_count(), 5);
        assert!(page_text(&merged, 0).contains("a1"));
        assert!(page_text(&merged, 3).contains("b1"));
        assert!(page_text(&merged, 4).contains("b2"));
    }

    #[test]
    fn merge_two_docs_scenario() {
        let doc_a = sample_pdf(&["a1"]);
        let doc_b = sample_pdf(&["b1", "b2"]);

        let merged = merge(&[&doc_a, &doc_b]).expect("merge");
        assert!(page_text(&merged, 0).contains("a1"));
        assert!(page_text(&merged, 1).contains("b1"));
        assert!(page_text(&merged, 2).contains("b2"));
    }

    #[test]
    fn split_produces_one_document_per_page() {
        let bytes = sample_pdf(&["p1", "p2", "p3", "p4"]);
        let parts = split(&bytes).expect("split");
        assert_eq!(parts.len(), 4);
        for (index, part) in parts.iter().enumerate() {
            let model = crate::DocumentModel::from_bytes(part).expect("load part");
            assert_eq!(model.page_count(), 1);
            assert!(page_text(part, 0).contains(&format!("p{}", index + 1)));
        }
    }

    #[test]
    fn merge_of_split_restores_page_order() {
        let bytes = sample_pdf(&["x1", "x2", "x3"]);
        let parts = split(&bytes).expect("split");
        let part_refs: Vec<&[u8]> = parts.iter().map(|p| p.as_slice()).collect();
        let rejoined = merge(&part_refs).expect("merge");

        let model = crate::DocumentModel::from_bytes(&rejoined).expect("load");
        assert_eq!(model.page_count(), 3);
        for index in 0..3 {
            assert!(page_text(&rejoined, index).contains(&format!("x{}", index + 1)));
        }
    }

    /// One-page PDF whose link annotation carries a /P entry referencing the
    /// page that owns it, as most real-world producers emit.
    fn pdf_with_annotation_back_reference() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.new_object_id();
        let annot_id = doc.add_object(dictionary! {
            "Type" => "Annot",
            "Subtype" => "Link",
            "Rect" => vec![
                Object::Real(72.0),
                Object::Real(700.0),
                Object::Real(172.0),
                Object::Real(720.0),
            ],
            "P" => Object::Reference(page_id),
        });
        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
                "Annots" => vec![Object::Reference(annot_id)],
            }),
        );
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![Object::Reference(page_id)],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).expect("serialise annotated PDF");
        out
    }

    #[test]
    fn merge_copes_with_annotation_page_back_references() {
        let bytes = pdf_with_annotation_back_reference();
        let merged = merge(&[&bytes]).expect("merge");
        let model = crate::DocumentModel::from_bytes(&merged).expect("load merged");
        assert_eq!(model.page_count(), 1);

        // The cloned annotation's /P must land on the cloned page, not loop.
        let doc = Document::load_mem(&merged).expect("load");
        let page_id = ordered_page_ids(&doc)[0];
        let annot_id = match doc
            .get_dictionary(page_id)
            .expect("page dict")
            .get(b"Annots")
            .expect("Annots")
        {
            Object::Array(items) => items[0].as_reference().expect("annot reference"),
            other => panic!("unexpected Annots shape: {other:?}"),
        };
        let annot = doc.get_dictionary(annot_id).expect("annot dict");
        let back_ref = annot.get(b"P").expect("P").as_reference().expect("P reference");
        assert_eq!(back_ref, page_id);
    }

    #[test]
    fn split_copes_with_annotation_page_back_references() {
        let bytes = pdf_with_annotation_back_reference();
        let parts = split(&bytes).expect("split");
        assert_eq!(parts.len(), 1);
        let model = crate::DocumentModel::from_bytes(&parts[0]).expect("load part");
        assert_eq!(model.page_count(), 1);
    }

    #[test]
    fn extract_clones_shared_resources_once() {
        // sample_pdf points every page at a single font object; the copy must
        // keep that sharing instead of duplicating the font per page.
        let bytes = sample_pdf(&["p1", "p2", "p3"]);
        let extracted = extract_pages(&bytes, &[0, 1, 2]).expect("extract");
        let doc = Document::load_mem(&extracted).expect("load");
        let font_count = doc
            .objects
            .values()
            .filter(|obj| matches!(obj, Object::Dictionary(dict) if dict.has(b"BaseFont")))
            .count();
        assert_eq!(font_count, 1);
    }

    #[test]
    fn extract_rejects_out_of_range_index() {
        let bytes = sample_pdf(&["only"]);
        let err = extract_pages(&bytes, &[0, 3]).unwrap_err();
        assert!(matches!(err, SeitenwerkError::PageOutOfRange { page: 3, .. }));
    }

    #[test]
    fn extract_preserves_requested_order() {
        let bytes = sample_pdf(&["p1", "p2", "p3"]);
        let extracted = extract_pages(&bytes, &[2, 0]).expect("extract");
        assert!(page_text(&extracted, 0).contains("p3"));
        assert!(page_text(&extracted, 1).contains("p1"));
    }

    #[test]
    fn reorder_requires_a_permutation() {
        let bytes = sample_pdf(&["p1", "p2", "p3"]);
        assert!(reorder(&bytes, &[0, 0, 1]).is_err());
        assert!(reorder(&bytes, &[0, 1]).is_err());

        let swapped = reorder(&bytes, &[2, 1, 0]).expect("reorder");
        assert!(page_text(&swapped, 0).contains("p3"));
        assert!(page_text(&swapped, 2).contains("p1"));
    }

    #[test]
    fn rotate_composes_with_existing_rotation() {
        let bytes = sample_pdf(&["p1"]);
        let once = rotate(&bytes, 90, None).expect("rotate");
        assert_eq!(page_rotation(&once, 0), 90);

        let twice = rotate(&once, 270, None).expect("rotate again");
        assert_eq!(page_rotation(&twice, 0), 0);
    }

    #[test]
    fn rotate_rejects_odd_angles() {
        let bytes = sample_pdf(&["p1"]);
        assert!(rotate(&bytes, 45, None).is_err());
    }

    #[test]
    fn organize_applies_independent_per_page_rotation() {
        let bytes = sample_pdf(&["p1", "p2"]);
        let states = [
            PageOperationState::keep(0),
            PageOperationState {
                original_index: 1,
                rotation_delta: RotationDelta::R90,
                deleted: false,
                new_order: 1,
            },
        ];
        let result = organize(&bytes, &states).expect("organize");
        assert_eq!(page_rotation(&result, 0), 0);
        assert_eq!(page_rotation(&result, 1), 90);
    }

    #[test]
    fn organize_rejects_deleting_every_page() {
        let bytes = sample_pdf(&["p1", "p2"]);
        let states: Vec<PageOperationState> = (0..2)
            .map(|index| PageOperationState {
                original_index: index,
                rotation_delta: RotationDelta::R0,
                deleted: true,
                new_order: index,
            })
            .collect();
        let err = organize(&bytes, &states).unwrap_err();
        assert!(matches!(err, SeitenwerkError::Document(_)));
    }

    #[test]
    fn organize_reorders_and_drops_deleted_pages() {
        let bytes = sample_pdf(&["p1", "p2", "p3"]);
        let states = [
            PageOperationState {
                original_index: 0,
                rotation_delta: RotationDelta::R0,
                deleted: true,
                new_order: 0,
            },
            PageOperationState {
                original_index: 1,
                rotation_delta: RotationDelta::R0,
                deleted: false,
                new_order: 1,
            },
            PageOperationState {
                original_index: 2,
                rotation_delta: RotationDelta::R0,
                deleted: false,
                new_order: 0,
            },
        ];
        let result = organize(&bytes, &states).expect("organize");
        let model = crate::DocumentModel::from_bytes(&result).expect("load");
        assert_eq!(model.page_count(), 2);
        assert!(page_text(&result, 0).contains("p3"));
        assert!(page_text(&result, 1).contains("p2"));
    }

    #[test]
    fn watermark_text_survives_extraction() {
        let bytes = sample_pdf(&["body text"]);
        let stamped =
            add_watermark(&bytes, "CONFIDENTIAL", WatermarkPosition::Center).expect("watermark");
        assert!(page_text(&stamped, 0).contains("CONFIDENTIAL"));
        // Original content is still there too.
        assert!(page_text(&stamped, 0).contains("body text"));
    }

    #[test]
    fn diagonal_watermark_stamps_text() {
        let bytes = sample_pdf(&["body"]);
        let stamped =
            add_watermark(&bytes, "DRAFT", WatermarkPosition::Diagonal).expect("watermark");
        assert!(page_text(&stamped, 0).contains("DRAFT"));
    }

    #[test]
    fn tiled_watermark_stamps_every_page() {
        let bytes = sample_pdf(&["one", "two"]);
        let stamped =
            add_watermark(&bytes, "DRAFT", WatermarkPosition::Tiled).expect("watermark");
        assert!(page_text(&stamped, 0).contains("DRAFT"));
        assert!(page_text(&stamped, 1).contains("DRAFT"));
    }

    #[test]
    fn page_numbers_label_each_page() {
        let bytes = sample_pdf(&["one", "two", "three"]);
        let numbered =
            add_page_numbers(&bytes, PageNumberPosition::BottomCenter).expect("page numbers");
        assert!(page_text(&numbered, 0).contains("1 / 3"));
        assert!(page_text(&numbered, 2).contains("3 / 3"));
    }

    #[test]
    fn operations_leave_source_bytes_untouched() {
        let bytes = sample_pdf(&["p1", "p2"]);
        let snapshot = bytes.clone();
        let _ = rotate(&bytes, 90, None).expect("rotate");
        let _ = split(&bytes).expect("split");
        let _ = add_watermark(&bytes, "W", WatermarkPosition::Center).expect("watermark");
        assert_eq!(bytes, snapshot);
    }
}
