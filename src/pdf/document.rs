use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lopdf::{Document, IncrementalDocument, Object, ObjectId};
use same_file::is_same_file;
use tracing::info;

use super::outline_writer::{write_outline, WriteSummary};
use super::toc::extract_outline;
use crate::outline::Outline;

pub struct PdfDocument {
    pub doc: Document,
    pub path: PathBuf,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path)
            .with_context(|| format!("Failed to open PDF: {}", path.display()))?;
        Ok(PdfDocument {
            doc,
            path: path.to_path_buf(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Read the current bookmark tree
    pub fn outline(&self) -> Result<Outline> {
        extract_outline(&self.doc)
            .with_context(|| format!("Failed to read outline of {}", self.path.display()))
    }
}

/// Get page object IDs in page order
fn page_ids(doc: &Document) -> Vec<ObjectId> {
    let mut pages: Vec<_> = doc.get_pages().into_iter().collect();
    pages.sort_by_key(|(num, _)| *num);
    pages.into_iter().map(|(_, id)| id).collect()
}

/// Replace the outline of the PDF at `path` by appending an incremental
/// update; the original bytes are left as they are.
pub fn save_outline<P: AsRef<Path>>(path: P, outline: &Outline) -> Result<WriteSummary> {
    let path = path.as_ref();
    let mut incremental = IncrementalDocument::load(path)
        .with_context(|| format!("Failed to open PDF: {}", path.display()))?;

    let prev = incremental.get_prev_documents();
    let root_id = prev
        .trailer
        .get(b"Root")
        .and_then(Object::as_reference)
        .with_context(|| format!("PDF has no document catalog: {}", path.display()))?;
    let pages = page_ids(prev);

    incremental
        .opt_clone_object_to_new_document(root_id)
        .with_context(|| "Failed to copy document catalog")?;

    let summary = write_outline(&mut incremental.new_document, outline, &pages);

    let catalog = incremental
        .new_document
        .get_object_mut(root_id)
        .and_then(Object::as_dict_mut)
        .with_context(|| "Failed to get document catalog")?;
    match summary.root {
        Some(outlines_id) => catalog.set("Outlines", outlines_id),
        None => {
            catalog.remove(b"Outlines");
        }
    }

    incremental
        .save(path)
        .with_context(|| format!("Failed to save PDF: {}", path.display()))?;

    info!(
        path = %path.display(),
        entries = summary.entries,
        without_destination = summary.without_destination,
        "saved outline"
    );
    Ok(summary)
}

/// Copy `source` to `dest`, then save the outline into the copy. When `dest`
/// is `source` under another name the copy is skipped and the file is updated
/// in place.
pub fn save_outline_as<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest: Q,
    outline: &Outline,
) -> Result<WriteSummary> {
    let source = source.as_ref();
    let dest = dest.as_ref();
    // Copying a file onto itself truncates it before it is read.
    let same = dest.exists()
        && is_same_file(source, dest).with_context(|| {
            format!(
                "Failed to compare {} and {}",
                source.display(),
                dest.display()
            )
        })?;
    if !same {
        fs::copy(source, dest).with_context(|| {
            format!(
                "Failed to copy {} to {}",
                source.display(),
                dest.display()
            )
        })?;
    }
    save_outline(dest, outline)
}
