use std::collections::HashSet;

use anyhow::{Context, Result};
use lopdf::{Document, Object, ObjectId};
use tracing::warn;

use super::strings::decode_pdf_string;
use crate::outline::{Node, Outline};
use crate::target::Target;

/// Read the bookmark tree of a loaded document.
pub fn extract_outline(doc: &Document) -> Result<Outline> {
    let catalog = doc
        .catalog()
        .with_context(|| "Failed to get document catalog")?;

    // No Outlines entry means no bookmarks
    let outlines_ref = match catalog.get(b"Outlines") {
        Ok(Object::Reference(r)) => *r,
        _ => return Ok(Outline::default()),
    };

    let outlines = match doc.get_dictionary(outlines_ref) {
        Ok(d) => d,
        _ => return Ok(Outline::default()),
    };

    let first_ref = match outlines.get(b"First") {
        Ok(Object::Reference(r)) => *r,
        _ => return Ok(Outline::default()),
    };

    let page_map = build_page_map(doc);
    let mut seen = HashSet::new();
    let roots = parse_outline_items(doc, first_ref, &page_map, &mut seen);

    Ok(Outline::new(roots))
}

fn parse_outline_items(
    doc: &Document,
    first_id: ObjectId,
    page_map: &[(ObjectId, u32)],
    seen: &mut HashSet<ObjectId>,
) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut current_id = Some(first_id);

    while let Some(id) = current_id {
        if !seen.insert(id) {
            warn!(?id, "outline item visited twice, stopping");
            break;
        }

        let dict = match doc.get_dictionary(id) {
            Ok(d) => d,
            Err(_) => break,
        };

        let title = match dict.get(b"Title") {
            Ok(Object::String(bytes, _)) => decode_pdf_string(bytes),
            _ => "Untitled".to_string(),
        };

        let target = get_destination_page(doc, dict, page_map)
            .map(Target::Page)
            .unwrap_or(Target::Unresolved);

        let children = match dict.get(b"First") {
            Ok(Object::Reference(child_ref)) => {
                parse_outline_items(doc, *child_ref, page_map, seen)
            }
            _ => Vec::new(),
        };

        nodes.push(Node {
            title,
            target,
            children,
        });

        current_id = match dict.get(b"Next") {
            Ok(Object::Reference(r)) => Some(*r),
            _ => None,
        };
    }

    nodes
}

fn get_destination_page(
    doc: &Document,
    dict: &lopdf::Dictionary,
    page_map: &[(ObjectId, u32)],
) -> Option<u32> {
    // Direct destination
    if let Ok(dest) = dict.get(b"Dest") {
        return resolve_destination(doc, dest, page_map);
    }

    // GoTo action, either referenced or inline
    let action = match dict.get(b"A") {
        Ok(Object::Reference(action_ref)) => doc.get_dictionary(*action_ref).ok(),
        Ok(Object::Dictionary(action_dict)) => Some(action_dict),
        _ => None,
    }?;

    match action.get(b"S") {
        Ok(Object::Name(action_type)) if action_type == b"GoTo" => {
            let dest = action.get(b"D").ok()?;
            resolve_destination(doc, dest, page_map)
        }
        _ => None,
    }
}

fn resolve_destination(doc: &Document, dest: &Object, page_map: &[(ObjectId, u32)]) -> Option<u32> {
    match dest {
        Object::String(name, _) | Object::Name(name) => {
            resolve_named_destination(doc, name, page_map)
        }
        Object::Array(arr) => get_page_from_dest_array(arr, page_map),
        // Named destinations may also be wrapped as << /D [...] >>
        Object::Dictionary(d) => d
            .get(b"D")
            .ok()
            .and_then(|inner| resolve_destination(doc, inner, page_map)),
        Object::Reference(r) => doc
            .get_object(*r)
            .ok()
            .and_then(|obj| resolve_destination(doc, obj, page_map)),
        _ => None,
    }
}

fn resolve_named_destination(
    doc: &Document,
    name: &[u8],
    page_map: &[(ObjectId, u32)],
) -> Option<u32> {
    let catalog = doc.catalog().ok()?;

    // Names/Dests name tree
    if let Ok(Object::Reference(names_ref)) = catalog.get(b"Names") {
        if let Ok(names_dict) = doc.get_dictionary(*names_ref) {
            if let Ok(Object::Reference(dests_ref)) = names_dict.get(b"Dests") {
                let mut visited = HashSet::new();
                if let Some(page) =
                    search_name_tree(doc, *dests_ref, name, page_map, &mut visited)
                {
                    return Some(page);
                }
            }
        }
    }

    // Older-style Dests dictionary
    if let Ok(Object::Reference(dests_ref)) = catalog.get(b"Dests") {
        if let Ok(dests_dict) = doc.get_dictionary(*dests_ref) {
            if let Ok(dest) = dests_dict.get(name) {
                return resolve_destination(doc, dest, page_map);
            }
        }
    }

    None
}

fn search_name_tree(
    doc: &Document,
    node_id: ObjectId,
    name: &[u8],
    page_map: &[(ObjectId, u32)],
    visited: &mut HashSet<ObjectId>,
) -> Option<u32> {
    if !visited.insert(node_id) {
        return None;
    }
    let dict = doc.get_dictionary(node_id).ok()?;

    // Leaf: flat [key value key value ...] array
    if let Ok(Object::Array(names)) = dict.get(b"Names") {
        for chunk in names.chunks(2) {
            if let [Object::String(key, _), value] = chunk {
                if key == name {
                    return resolve_destination(doc, value, page_map);
                }
            }
        }
    }

    if let Ok(Object::Array(kids)) = dict.get(b"Kids") {
        for kid in kids {
            if let Object::Reference(kid_ref) = kid {
                if let Some(page) = search_name_tree(doc, *kid_ref, name, page_map, visited) {
                    return Some(page);
                }
            }
        }
    }

    None
}

fn get_page_from_dest_array(arr: &[Object], page_map: &[(ObjectId, u32)]) -> Option<u32> {
    // [page_ref /XYZ left top zoom] and friends
    if let Some(Object::Reference(page_ref)) = arr.first() {
        return page_map
            .iter()
            .find(|(id, _)| id == page_ref)
            .map(|(_, num)| *num);
    }
    None
}

fn build_page_map(doc: &Document) -> Vec<(ObjectId, u32)> {
    let mut pages: Vec<_> = doc.get_pages().into_iter().collect();
    pages.sort_by_key(|(num, _)| *num);
    pages.into_iter().map(|(num, id)| (id, num)).collect()
}
