//! Structure tree reading.
//!
//! The document's `/StructTreeRoot` is parsed once into a page-independent
//! tree. Each page then gets a projection of that tree holding only the
//! marked-content leaves drawn on it, in tree order.

use std::collections::{BTreeMap, HashMap, HashSet};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{StructChild, StructNode, StructRole};

use super::content::{resolve, resolve_dict};

/// Deepest element nesting accepted before the tree is rejected.
const MAX_DEPTH: usize = 256;

/// Longest `/RoleMap` chain followed.
const MAX_ROLE_CHAIN: usize = 16;

/// A parsed, page-independent structure tree.
#[derive(Debug, Clone, Default)]
pub(crate) struct StructTree {
    kids: Vec<Kid>,
}

#[derive(Debug, Clone)]
enum Kid {
    Elem(StructElem),
    Content { mcid: i64, page: Option<ObjectId> },
}

#[derive(Debug, Clone)]
struct StructElem {
    tag: String,
    kids: Vec<Kid>,
}

impl StructTree {
    /// Read the tree from a document; `Ok(None)` when it has none.
    pub(crate) fn read(doc: &LopdfDocument) -> Result<Option<Self>> {
        let Some(catalog) = doc
            .trailer
            .get(b"Root")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
        else {
            return Ok(None);
        };

        let Some(root) = catalog
            .get(b"StructTreeRoot")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
        else {
            return Ok(None);
        };

        let role_map = root
            .get(b"RoleMap")
            .ok()
            .and_then(|r| resolve_dict(doc, r))
            .map(read_role_map)
            .unwrap_or_default();

        let mut reader = TreeReader {
            doc,
            role_map,
            visited: HashSet::new(),
        };

        let kids = match root.get(b"K") {
            Ok(k) => reader.parse_kids(k, None, 0)?,
            Err(_) => Vec::new(),
        };

        log::debug!("structure tree with {} top-level elements", kids.len());
        Ok(Some(Self { kids }))
    }

    /// Project the tree onto one page.
    ///
    /// Returns the page's root node and one item per leaf, looked up in
    /// `texts` by MCID (missing MCIDs give an empty item).
    pub(crate) fn page_tree(
        &self,
        page_id: ObjectId,
        texts: &BTreeMap<i64, String>,
    ) -> (StructNode, Vec<String>) {
        let mut items = Vec::new();
        let mut root = StructNode::new(StructRole::Container);
        for kid in &self.kids {
            if let Some(child) = project(kid, page_id, texts, &mut items) {
                root.children.push(child);
            }
        }
        (root, items)
    }
}

fn project(
    kid: &Kid,
    page_id: ObjectId,
    texts: &BTreeMap<i64, String>,
    items: &mut Vec<String>,
) -> Option<StructChild> {
    match kid {
        Kid::Content { mcid, page } => {
            if *page != Some(page_id) {
                return None;
            }
            items.push(texts.get(mcid).cloned().unwrap_or_default());
            Some(StructChild::Leaf)
        }
        Kid::Elem(elem) => {
            let children: Vec<StructChild> = elem
                .kids
                .iter()
                .filter_map(|k| project(k, page_id, texts, items))
                .collect();
            if children.is_empty() {
                return None;
            }
            Some(StructChild::Node(StructNode {
                role: StructRole::from_tag(&elem.tag),
                children,
            }))
        }
    }
}

fn read_role_map(dict: &Dictionary) -> HashMap<Vec<u8>, Vec<u8>> {
    dict.iter()
        .filter_map(|(k, v)| v.as_name().ok().map(|n| (k.clone(), n.to_vec())))
        .collect()
}

struct TreeReader<'a> {
    doc: &'a LopdfDocument,
    role_map: HashMap<Vec<u8>, Vec<u8>>,
    visited: HashSet<ObjectId>,
}

impl<'a> TreeReader<'a> {
    fn parse_kids(&mut self, obj: &Object, page: Option<ObjectId>, depth: usize) -> Result<Vec<Kid>> {
        if depth > MAX_DEPTH {
            return Err(Error::Structure("structure tree nested too deeply".to_string()));
        }

        match obj {
            Object::Integer(mcid) => Ok(vec![Kid::Content { mcid: *mcid, page }]),
            Object::Array(arr) => {
                let mut kids = Vec::new();
                for item in arr {
                    kids.extend(self.parse_kids(item, page, depth)?);
                }
                Ok(kids)
            }
            Object::Reference(id) => {
                if !self.visited.insert(*id) {
                    return Err(Error::Structure(format!(
                        "structure element {} {} R is referenced twice",
                        id.0, id.1
                    )));
                }
                let doc = self.doc;
                let target = doc.get_object(*id)?;
                self.parse_kids(target, page, depth)
            }
            Object::Dictionary(dict) => self.parse_dict(dict, page, depth),
            _ => Ok(Vec::new()),
        }
    }

    fn parse_dict(&mut self, dict: &Dictionary, page: Option<ObjectId>, depth: usize) -> Result<Vec<Kid>> {
        let page_ref = dict.get(b"Pg").ok().and_then(|p| p.as_reference().ok());

        match dict.get(b"Type").ok().and_then(|t| t.as_name().ok()) {
            Some(b"MCR") => {
                let mcid = dict
                    .get(b"MCID")
                    .ok()
                    .and_then(|m| resolve(self.doc, m))
                    .and_then(|m| m.as_i64().ok());
                Ok(mcid
                    .map(|mcid| Kid::Content {
                        mcid,
                        page: page_ref.or(page),
                    })
                    .into_iter()
                    .collect())
            }
            Some(b"OBJR") => Ok(Vec::new()),
            _ => {
                let Some(tag) = dict.get(b"S").ok().and_then(|s| s.as_name().ok()) else {
                    return Ok(Vec::new());
                };
                let tag = self.resolve_role(tag);
                let elem_page = page_ref.or(page);
                let kids = match dict.get(b"K") {
                    Ok(k) => self.parse_kids(k, elem_page, depth + 1)?,
                    Err(_) => Vec::new(),
                };
                Ok(vec![Kid::Elem(StructElem { tag, kids })])
            }
        }
    }

    /// Follow `/RoleMap` until a standard tag (or the end of the chain).
    fn resolve_role(&self, tag: &[u8]) -> String {
        let mut current = tag;
        for _ in 0..MAX_ROLE_CHAIN {
            let name = String::from_utf8_lossy(current);
            if StructRole::from_tag(&name).is_known() {
                break;
            }
            match self.role_map.get(current) {
                Some(mapped) if mapped.as_slice() != current => current = mapped.as_slice(),
                _ => break,
            }
        }
        String::from_utf8_lossy(current).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn elem(tag: &str, kids: Vec<Kid>) -> Kid {
        Kid::Elem(StructElem {
            tag: tag.to_string(),
            kids,
        })
    }

    fn mcid(id: i64, page: ObjectId) -> Kid {
        Kid::Content {
            mcid: id,
            page: Some(page),
        }
    }

    #[test]
    fn test_page_projection_keeps_page_leaves() {
        let p1 = (10, 0);
        let p2 = (20, 0);
        let tree = StructTree {
            kids: vec![elem(
                "Document",
                vec![
                    elem("H1", vec![mcid(0, p1)]),
                    elem("P", vec![mcid(1, p1), mcid(0, p2)]),
                    elem("P", vec![mcid(1, p2)]),
                ],
            )],
        };

        let texts: BTreeMap<i64, String> =
            [(0, "Title".to_string()), (1, "Body".to_string())].into_iter().collect();
        let (root, items) = tree.page_tree(p1, &texts);
        assert_eq!(items, vec!["Title", "Body"]);
        assert_eq!(root.leaf_count(), 2);

        let (root, items) = tree.page_tree(p2, &BTreeMap::new());
        assert_eq!(items, vec!["", ""]);
        // The H1 subtree has nothing on page 2
        let StructChild::Node(doc) = &root.children[0] else {
            panic!("expected document node");
        };
        assert_eq!(doc.children.len(), 2);
    }

    #[test]
    fn test_leaf_without_page_is_dropped() {
        let tree = StructTree {
            kids: vec![elem("P", vec![Kid::Content { mcid: 0, page: None }])],
        };
        let (root, items) = tree.page_tree((1, 0), &BTreeMap::new());
        assert!(items.is_empty());
        assert!(root.is_empty());
    }
}
