//! Structure tree under construction.
//!
//! Elements live in an arena keyed by object id. Parent links are plain
//! ids, so the tree never holds owning cycles; the kids of each element
//! keep the order in which they were added, which is the reading order.

use super::parent_tree::ParentTree;
use super::types::{StructKid, StructOptions, StructType};
use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::HashMap;

/// One structure element.
#[derive(Debug, Clone)]
pub struct StructNode {
    /// Indirect object holding the element dictionary
    pub reference: ObjectRef,
    /// Structure type
    pub role: StructType,
    /// Parent element; `None` for the document element
    pub parent: Option<ObjectRef>,
    /// Optional dictionary entries
    pub options: StructOptions,
    /// Children in reading order
    pub kids: Vec<StructKid>,
    /// First page holding content of this element (`/Pg`)
    pub page: Option<usize>,
    /// Whether the element dictionary was built
    pub ended: bool,
}

/// Arena of structure elements plus the parent tree.
#[derive(Debug, Clone)]
pub struct StructureTree {
    root: ObjectRef,
    document: ObjectRef,
    nodes: Vec<StructNode>,
    index: HashMap<u32, usize>,
    parent_tree: ParentTree,
}

impl StructureTree {
    /// Tree whose `StructTreeRoot` is `root` and whose single top-level
    /// element (of type Document) is `document`.
    pub fn new(root: ObjectRef, document: ObjectRef) -> Self {
        let mut tree = Self {
            root,
            document,
            nodes: Vec::new(),
            index: HashMap::new(),
            parent_tree: ParentTree::new(),
        };
        tree.insert(StructNode {
            reference: document,
            role: StructType::Document,
            parent: None,
            options: StructOptions::default(),
            kids: Vec::new(),
            page: None,
            ended: false,
        });
        tree
    }

    fn insert(&mut self, node: StructNode) {
        self.index.insert(node.reference.id, self.nodes.len());
        self.nodes.push(node);
    }

    /// The `StructTreeRoot` object.
    pub fn root(&self) -> ObjectRef {
        self.root
    }

    /// The document element.
    pub fn document(&self) -> ObjectRef {
        self.document
    }

    /// The parent tree.
    pub fn parent_tree(&self) -> &ParentTree {
        &self.parent_tree
    }

    /// Element stored under `element`.
    pub fn node(&self, element: ObjectRef) -> Result<&StructNode> {
        self.index
            .get(&element.id)
            .map(|&i| &self.nodes[i])
            .filter(|node| node.reference == element)
            .ok_or(Error::NotAStructureElement(element))
    }

    /// Open element stored under `element`.
    fn open_node_mut(&mut self, element: ObjectRef) -> Result<&mut StructNode> {
        let i = *self
            .index
            .get(&element.id)
            .ok_or(Error::NotAStructureElement(element))?;
        let node = &mut self.nodes[i];
        if node.reference != element {
            return Err(Error::NotAStructureElement(element));
        }
        if node.ended {
            return Err(Error::InvalidState {
                object: element,
                state: "ended",
            });
        }
        Ok(node)
    }

    /// Parent-tree key of `page`, registering it on first use.
    pub fn register_page(&mut self, page: usize) -> u32 {
        self.parent_tree.register_page(page)
    }

    /// Fail unless `element` is an open element of this tree.
    pub fn check_open(&mut self, element: ObjectRef) -> Result<()> {
        self.open_node_mut(element).map(|_| ())
    }

    /// Whether `element` is a structure element of this tree.
    pub fn contains(&self, element: ObjectRef) -> bool {
        self.node(element).is_ok()
    }

    /// Register `element` as the last kid of `parent`.
    pub fn add_element(
        &mut self,
        element: ObjectRef,
        parent: ObjectRef,
        role: StructType,
        options: StructOptions,
    ) -> Result<()> {
        self.open_node_mut(parent)?.kids.push(StructKid::Element(element));
        self.insert(StructNode {
            reference: element,
            role,
            parent: Some(parent),
            options,
            kids: Vec::new(),
            page: None,
            ended: false,
        });
        Ok(())
    }

    /// Attribute `mcid` on `page` to `element`.
    pub fn add_marked_content(&mut self, element: ObjectRef, page: usize, mcid: u32) -> Result<()> {
        self.open_node_mut(element)?;
        self.parent_tree.claim(page, mcid, element)?;
        let node = self.open_node_mut(element)?;
        node.kids.push(StructKid::MarkedContent { page, mcid });
        node.page.get_or_insert(page);
        Ok(())
    }

    /// Attribute the next free MCID on `page` to `element`.
    pub fn assign_marked_content(&mut self, element: ObjectRef, page: usize) -> Result<u32> {
        self.open_node_mut(element)?;
        let mcid = self.parent_tree.next_mcid(page);
        self.add_marked_content(element, page, mcid)?;
        Ok(mcid)
    }

    /// Attribute a whole object on `page` (an annotation or XObject) to `element`.
    ///
    /// Returns the parent-tree key the object must carry as `/StructParent`.
    pub fn add_object(&mut self, element: ObjectRef, page: usize, object: ObjectRef) -> Result<u32> {
        let node = self.open_node_mut(element)?;
        node.kids.push(StructKid::Object { page, object });
        node.page.get_or_insert(page);
        Ok(self.parent_tree.register_object(element))
    }

    /// Whether `element` was ended.
    pub fn is_ended(&self, element: ObjectRef) -> Result<bool> {
        Ok(self.node(element)?.ended)
    }

    /// Close `element` and build its dictionary.
    ///
    /// `pages[i]` is the page object of page index `i`. Kids on the
    /// element's own page are written as bare MCIDs, others as `/MCR`
    /// dictionaries.
    pub fn end_element(&mut self, element: ObjectRef, pages: &[ObjectRef]) -> Result<Dictionary> {
        let root = self.root;
        let node = self.open_node_mut(element)?.clone();

        let page_ref = |page: usize| pages.get(page).copied().ok_or(Error::UnknownPage(page));

        let mut dict = Dictionary::new();
        dict.insert("Type".into(), Object::name("StructElem"));
        dict.insert("S".into(), Object::name(node.role.as_name()));
        dict.insert("P".into(), Object::Reference(node.parent.unwrap_or(root)));
        if let Some(page) = node.page {
            dict.insert("Pg".into(), Object::Reference(page_ref(page)?));
        }

        let mut kids = Vec::with_capacity(node.kids.len());
        for kid in &node.kids {
            kids.push(match *kid {
                StructKid::Element(r) => Object::Reference(r),
                StructKid::MarkedContent { page, mcid } if Some(page) == node.page => {
                    Object::from(mcid)
                },
                StructKid::MarkedContent { page, mcid } => Object::dict(vec![
                    ("Type", Object::name("MCR")),
                    ("Pg", Object::Reference(page_ref(page)?)),
                    ("MCID", Object::from(mcid)),
                ]),
                StructKid::Object { page, object } => Object::dict(vec![
                    ("Type", Object::name("OBJR")),
                    ("Pg", Object::Reference(page_ref(page)?)),
                    ("Obj", Object::Reference(object)),
                ]),
            });
        }
        dict.insert("K".into(), Object::Array(kids));

        let options = &node.options;
        for (key, value) in [
            ("Alt", &options.alt),
            ("ActualText", &options.actual_text),
            ("Lang", &options.lang),
            ("T", &options.title),
            ("E", &options.expanded),
        ] {
            if let Some(value) = value {
                dict.insert(key.into(), Object::text(value));
            }
        }
        self.open_node_mut(element)?.ended = true;
        Ok(dict)
    }

    /// Elements not yet ended, children before their parents.
    pub fn open_elements(&self) -> Vec<ObjectRef> {
        let mut out = Vec::new();
        // Iterative post-order: (element, kids visited)
        let mut stack = vec![(self.document, false)];
        while let Some((element, visited)) = stack.pop() {
            let Ok(node) = self.node(element) else {
                continue;
            };
            if visited {
                if !node.ended {
                    out.push(element);
                }
                continue;
            }
            stack.push((element, true));
            for kid in node.kids.iter().rev() {
                if let StructKid::Element(child) = kid {
                    stack.push((*child, false));
                }
            }
        }
        out
    }

    /// Dictionary of the `StructTreeRoot`.
    pub fn root_dict(&self, parent_tree: ObjectRef) -> Dictionary {
        let mut dict = Dictionary::new();
        dict.insert("Type".into(), Object::name("StructTreeRoot"));
        dict.insert("K".into(), Object::Array(vec![Object::Reference(self.document)]));
        dict.insert("ParentTree".into(), Object::Reference(parent_tree));
        dict.insert(
            "ParentTreeNextKey".into(),
            Object::from(self.parent_tree.next_key()),
        );
        dict
    }
}
