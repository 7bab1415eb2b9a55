//! Builds `/Outlines` objects for a bookmark tree.

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use tracing::warn;

use super::strings::encode_pdf_string;
use crate::outline::{Node, Outline};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteSummary {
    /// Id of the new `/Outlines` dictionary, `None` for an empty tree.
    pub root: Option<ObjectId>,
    pub entries: usize,
    /// Entries written without a destination (unresolved or past the last page).
    pub without_destination: usize,
}

/// Add outline objects for `outline` to `doc`. `page_ids` are the page
/// objects in page order. The catalog is left untouched.
pub fn write_outline(doc: &mut Document, outline: &Outline, page_ids: &[ObjectId]) -> WriteSummary {
    let mut summary = WriteSummary::default();
    if outline.is_empty() {
        return summary;
    }

    let root_id = doc.new_object_id();
    let (first, last) = write_level(doc, &outline.roots, root_id, page_ids, &mut summary);

    doc.objects.insert(
        root_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => first,
            "Last" => last,
            "Count" => outline.len() as i64,
        }),
    );

    summary.root = Some(root_id);
    summary
}

/// Write one sibling chain under `parent_id`, returning its first and last ids.
fn write_level(
    doc: &mut Document,
    nodes: &[Node],
    parent_id: ObjectId,
    page_ids: &[ObjectId],
    summary: &mut WriteSummary,
) -> (ObjectId, ObjectId) {
    let ids: Vec<ObjectId> = nodes.iter().map(|_| doc.new_object_id()).collect();

    for (i, node) in nodes.iter().enumerate() {
        let mut dict = Dictionary::new();
        dict.set("Title", encode_pdf_string(&node.title));
        dict.set("Parent", parent_id);
        if i > 0 {
            dict.set("Prev", ids[i - 1]);
        }
        if i + 1 < ids.len() {
            dict.set("Next", ids[i + 1]);
        }

        // Ranges point at their first page.
        match node
            .target
            .start_page()
            .and_then(|page| (page as usize).checked_sub(1))
            .and_then(|index| page_ids.get(index))
        {
            Some(page_id) => dict.set(
                "Dest",
                vec![
                    Object::Reference(*page_id),
                    "XYZ".into(),
                    Object::Null,
                    Object::Null,
                    Object::Null,
                ],
            ),
            None => {
                warn!(title = %node.title, target = %node.target, pages = page_ids.len(), "bookmark has no page in this document");
                summary.without_destination += 1;
            }
        }

        if !node.children.is_empty() {
            let (first, last) = write_level(doc, &node.children, ids[i], page_ids, summary);
            dict.set("First", first);
            dict.set("Last", last);
            dict.set("Count", node.descendant_count() as i64);
        }

        doc.objects.insert(ids[i], Object::Dictionary(dict));
        summary.entries += 1;
    }

    (ids[0], ids[ids.len() - 1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outline::TocEntry;
    use crate::pdf::toc::extract_outline;
    use crate::target::Target;
    use lopdf::dictionary;

    fn doc_with_pages(n: usize) -> (Document, Vec<ObjectId>) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_ids: Vec<ObjectId> = (0..n)
            .map(|_| doc.add_object(dictionary! { "Type" => "Page", "Parent" => pages_id }))
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => n as i64,
            }),
        );
        let catalog_id = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
        doc.trailer.set("Root", catalog_id);
        (doc, page_ids)
    }

    fn attach(doc: &mut Document, root: ObjectId) {
        let catalog_id = doc.trailer.get(b"Root").unwrap().as_reference().unwrap();
        doc.get_object_mut(catalog_id)
            .unwrap()
            .as_dict_mut()
            .unwrap()
            .set("Outlines", root);
    }

    #[test]
    fn test_written_tree_reads_back() {
        let (mut doc, page_ids) = doc_with_pages(12);
        let outline = Outline::from_entries(vec![
            TocEntry::new(1, "One", Target::Page(1)),
            TocEntry::new(2, "One.A", Target::Page(2)),
            TocEntry::new(2, "Ünïcode", Target::Page(3)),
            TocEntry::new(1, "Two", Target::Range { start: 5, end: 10 }),
        ]);

        let summary = write_outline(&mut doc, &outline, &page_ids);
        assert_eq!(summary.entries, 4);
        assert_eq!(summary.without_destination, 0);
        attach(&mut doc, summary.root.unwrap());

        let read = extract_outline(&doc).unwrap();
        let entries = read.entries();
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[2], TocEntry::new(2, "Ünïcode", Target::Page(3)));
        // "5-10" is stored as page 5 only.
        assert_eq!(entries[3], TocEntry::new(1, "Two", Target::Page(5)));
    }

    #[test]
    fn test_counts_and_links() {
        let (mut doc, page_ids) = doc_with_pages(3);
        let outline = Outline::from_entries(vec![
            TocEntry::new(1, "A", Target::Page(1)),
            TocEntry::new(2, "A1", Target::Page(2)),
            TocEntry::new(2, "A2", Target::Page(3)),
        ]);
        let summary = write_outline(&mut doc, &outline, &page_ids);
        let root = doc.get_dictionary(summary.root.unwrap()).unwrap();
        assert_eq!(root.get(b"Count").unwrap().as_i64().unwrap(), 3);

        let a_id = root.get(b"First").unwrap().as_reference().unwrap();
        let a = doc.get_dictionary(a_id).unwrap();
        assert_eq!(a.get(b"Count").unwrap().as_i64().unwrap(), 2);
        let a1_id = a.get(b"First").unwrap().as_reference().unwrap();
        let a2_id = a.get(b"Last").unwrap().as_reference().unwrap();
        let a1 = doc.get_dictionary(a1_id).unwrap();
        assert_eq!(a1.get(b"Next").unwrap().as_reference().unwrap(), a2_id);
        assert_eq!(a1.get(b"Parent").unwrap().as_reference().unwrap(), a_id);
        assert!(a1.get(b"Prev").is_err());
    }

    #[test]
    fn test_pages_out_of_range_have_no_destination() {
        let (mut doc, page_ids) = doc_with_pages(2);
        let outline = Outline::from_entries(vec![
            TocEntry::new(1, "Far", Target::Page(99)),
            TocEntry::new(1, "Lost", Target::Unresolved),
        ]);
        let summary = write_outline(&mut doc, &outline, &page_ids);
        assert_eq!(summary.without_destination, 2);
        let root = doc.get_dictionary(summary.root.unwrap()).unwrap();
        let first = root.get(b"First").unwrap().as_reference().unwrap();
        assert!(doc.get_dictionary(first).unwrap().get(b"Dest").is_err());
    }

    #[test]
    fn test_empty_outline_writes_nothing() {
        let (mut doc, page_ids) = doc_with_pages(1);
        let before = doc.objects.len();
        let summary = write_outline(&mut doc, &Outline::default(), &page_ids);
        assert_eq!(summary.root, None);
        assert_eq!(doc.objects.len(), before);
    }
}
