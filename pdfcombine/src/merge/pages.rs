//! Page tree assembly.
//!
//! [`PageAssembler`] owns the output document. Each appended source is
//! renumbered past the objects already present, its pages are flattened into
//! the output's single root `Pages` node in their internal order, and the
//! source's own catalog and intermediate `Pages` nodes are dropped.
//!
//! Attributes a page inherits from its ancestors (`MediaBox`, `Resources`,
//! `CropBox`, `Rotate`) are copied onto the page before it is reparented,
//! so it renders the same without its old parent chain.

use lopdf::{Document, Object, ObjectId, dictionary};

use crate::error::{CombineError, Result};

/// Page attributes that may be inherited from `Pages` nodes.
const INHERITABLE: [&str; 4] = ["MediaBox", "Resources", "CropBox", "Rotate"];

/// Parent chains deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

/// Builds the output document one source at a time.
#[derive(Debug)]
pub struct PageAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<ObjectId>,
}

impl PageAssembler {
    /// Create an empty output with a catalog and an empty root `Pages` node.
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Vec::<Object>::new(),
                "Count" => 0,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_id,
            kids: Vec::new(),
        }
    }

    /// Number of pages appended so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Append every page of `source`, in order.
    ///
    /// Returns the number of pages appended.
    ///
    /// # Errors
    ///
    /// Returns `CombineFailed` if a page object is missing or is not a
    /// dictionary. The output is left untouched in that case.
    pub fn append(&mut self, mut source: Document) -> Result<usize> {
        source.renumber_objects_with(self.doc.max_id + 1);

        let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

        let mut inherited = Vec::with_capacity(page_ids.len());
        for &page_id in &page_ids {
            inherited.push(inherited_attributes(&source, page_id)?);
        }

        for (&page_id, attributes) in page_ids.iter().zip(inherited) {
            let page = source
                .get_object_mut(page_id)
                .and_then(Object::as_dict_mut)
                .map_err(|e| CombineError::combine_failed(format!("Page {page_id:?}: {e}")))?;

            for (key, value) in attributes {
                page.set(key, value);
            }
            if !page.has(b"MediaBox") {
                page.set("MediaBox", letter_media_box());
            }
            page.set("Parent", self.pages_id);
        }

        drop_structure(&mut source);

        if source.version > self.doc.version {
            self.doc.version = source.version.clone();
        }
        self.doc.max_id = self.doc.max_id.max(source.max_id);
        self.doc.objects.extend(source.objects);
        self.kids.extend_from_slice(&page_ids);

        Ok(page_ids.len())
    }

    /// Finalise the root `Pages` node and return the document.
    pub fn finish(mut self) -> Document {
        let kids: Vec<Object> = self.kids.iter().map(|&id| Object::Reference(id)).collect();
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => self.kids.len() as i64,
            }),
        );
        self.doc
    }
}

impl Default for PageAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Attributes `page_id` inherits and does not define itself.
fn inherited_attributes(doc: &Document, page_id: ObjectId) -> Result<Vec<(&'static str, Object)>> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| CombineError::combine_failed(format!("Page {page_id:?}: {e}")))?;

    let mut missing: Vec<&'static str> = INHERITABLE
        .iter()
        .copied()
        .filter(|key| !page.has(key.as_bytes()))
        .collect();
    let mut found = Vec::new();

    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;
    while let Some(node_id) = parent {
        if missing.is_empty() || depth >= MAX_TREE_DEPTH {
            break;
        }
        let Ok(node) = doc.get_dictionary(node_id) else {
            break;
        };

        missing.retain(|key| match node.get(key.as_bytes()) {
            Ok(value) => {
                found.push((*key, value.clone()));
                false
            }
            Err(_) => true,
        });

        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    Ok(found)
}

/// Remove the source's catalog, info dictionary and `Pages` nodes.
fn drop_structure(doc: &mut Document) {
    for key in [b"Root".as_slice(), b"Info".as_slice()] {
        if let Ok(id) = doc.trailer.get(key).and_then(Object::as_reference) {
            doc.objects.remove(&id);
        }
    }

    doc.objects.retain(|_, object| !is_pages_node(object));
}

fn is_pages_node(object: &Object) -> bool {
    match object {
        Object::Dictionary(dict) => {
            matches!(dict.get(b"Type"), Ok(Object::Name(name)) if name == b"Pages")
        }
        _ => false,
    }
}

fn letter_media_box() -> Object {
    vec![0.into(), 0.into(), 612.into(), 792.into()].into()
}
