//! Shared helpers: input pattern expansion and page-tree lookups.

use lopdf::{Document, Object, ObjectId};
use std::path::PathBuf;

use crate::error::{PdfDeskError, Result};

/// US Letter, used when no `MediaBox` is found anywhere up the page tree.
pub const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Page attributes a page may inherit from its ancestors.
pub const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

const MAX_TREE_DEPTH: usize = 64;

/// Expand shell-style patterns into paths, preserving argument order.
///
/// A pattern matching nothing is kept verbatim so the caller reports it as
/// missing instead of silently dropping it.
pub fn collect_paths_for_patterns<T>(patterns: T) -> Result<Vec<PathBuf>>
where
    T: IntoIterator,
    T::Item: AsRef<str>,
{
    let mut resolved_paths = Vec::new();

    for pattern in patterns {
        resolved_paths.extend(collect_paths_for_pattern(pattern.as_ref())?);
    }

    Ok(resolved_paths)
}

fn collect_paths_for_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|err| PdfDeskError::invalid_config(format!("bad pattern '{pattern}': {err}")))?;

    let mut resolved_paths = Vec::new();
    for entry in entries {
        let path = entry.map_err(|err| PdfDeskError::io(err.path().to_path_buf(), err.into_error()))?;
        resolved_paths.push(path);
    }

    if resolved_paths.is_empty() {
        resolved_paths.push(PathBuf::from(pattern));
    }

    Ok(resolved_paths)
}

/// Follow a reference to the object it names; other objects pass through.
pub fn resolve<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id).ok(),
        other => Some(other),
    }
}

/// Look up `key` on a page, walking `Parent` links for inherited values.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = doc.get_dictionary(page_id).ok()?;

    for _ in 0..MAX_TREE_DEPTH {
        if let Ok(value) = current.get(key) {
            return Some(value.clone());
        }
        let parent = current.get(b"Parent").and_then(Object::as_reference).ok()?;
        current = doc.get_dictionary(parent).ok()?;
    }

    None
}

/// Rendered page size in points: effective `MediaBox`, swapped for quarter turns.
pub fn page_size(doc: &Document, page_id: ObjectId) -> (f32, f32) {
    let (width, height) = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|mediabox| rect_size(doc, &mediabox))
        .unwrap_or(DEFAULT_PAGE_SIZE);

    let rotate = inherited_attribute(doc, page_id, b"Rotate")
        .and_then(|r| r.as_i64().ok())
        .unwrap_or(0)
        .rem_euclid(360);

    if rotate == 90 || rotate == 270 {
        (height, width)
    } else {
        (width, height)
    }
}

fn rect_size(doc: &Document, rect: &Object) -> Option<(f32, f32)> {
    let Object::Array(values) = resolve(doc, rect)? else {
        return None;
    };
    if values.len() < 4 {
        return None;
    }

    let mut coords = [0.0f32; 4];
    for (slot, value) in coords.iter_mut().zip(values) {
        *slot = resolve(doc, value)?.as_float().ok()?;
    }

    let width = (coords[2] - coords[0]).abs();
    let height = (coords[3] - coords[1]).abs();
    (width > 0.0 && height > 0.0).then_some((width, height))
}
