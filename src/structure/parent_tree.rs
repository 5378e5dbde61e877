//! Parent tree: marked content back to its structure element.
//!
//! PDF Spec: Section 14.7.4.4. Keys come from one counter shared by
//! pages (`/StructParents`, value is an array indexed by MCID) and by
//! whole objects such as annotations (`/StructParent`, value is the
//! element itself).

use crate::error::{Error, Result};
use crate::object::{Dictionary, Object, ObjectRef};
use std::collections::BTreeMap;

/// Parent-tree entries keyed by page and by object.
#[derive(Debug, Clone, Default)]
pub struct ParentTree {
    /// `/StructParents` key of each page
    page_keys: BTreeMap<usize, u32>,
    /// Owners on each page by MCID; sparse until validated
    pages: BTreeMap<usize, BTreeMap<u32, ObjectRef>>,
    /// Owners of whole objects by `/StructParent` key
    objects: BTreeMap<u32, ObjectRef>,
    next_key: u32,
}

impl ParentTree {
    /// Create an empty parent tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Key of `page`, handing out the next one on first use.
    pub fn register_page(&mut self, page: usize) -> u32 {
        if let Some(&key) = self.page_keys.get(&page) {
            return key;
        }
        let key = self.take_key();
        self.page_keys.insert(page, key);
        key
    }

    /// Key for a whole object owned by `element`.
    pub fn register_object(&mut self, element: ObjectRef) -> u32 {
        let key = self.take_key();
        self.objects.insert(key, element);
        key
    }

    fn take_key(&mut self) -> u32 {
        let key = self.next_key;
        self.next_key += 1;
        key
    }

    /// Key the next registration gets (`/ParentTreeNextKey`).
    pub fn next_key(&self) -> u32 {
        self.next_key
    }

    /// Key registered for `page`.
    pub fn page_key(&self, page: usize) -> Option<u32> {
        self.page_keys.get(&page).copied()
    }

    /// Next unused MCID on `page`.
    pub fn next_mcid(&self, page: usize) -> u32 {
        self.pages
            .get(&page)
            .and_then(|entries| entries.keys().next_back())
            .map_or(0, |&mcid| mcid.saturating_add(1))
    }

    /// Record that `element` owns `mcid` on `page`.
    pub fn claim(&mut self, page: usize, mcid: u32, element: ObjectRef) -> Result<()> {
        self.register_page(page);
        let entries = self.pages.entry(page).or_default();
        if entries.contains_key(&mcid) {
            return Err(Error::DuplicateMarkedContent { page, mcid });
        }
        entries.insert(mcid, element);
        Ok(())
    }

    /// Assign the next MCID on `page` to `element`.
    pub fn assign(&mut self, page: usize, element: ObjectRef) -> Result<u32> {
        let mcid = self.next_mcid(page);
        self.claim(page, mcid, element)?;
        Ok(mcid)
    }

    /// Owner of `mcid` on `page`.
    pub fn get(&self, page: usize, mcid: u32) -> Option<ObjectRef> {
        self.pages
            .get(&page)
            .and_then(|entries| entries.get(&mcid))
            .copied()
    }

    /// Owner of the object registered under `key`.
    pub fn object_owner(&self, key: u32) -> Option<ObjectRef> {
        self.objects.get(&key).copied()
    }

    /// Whether no marked content or object was registered.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.objects.is_empty()
    }

    /// Reject gaps: every MCID below a page's highest must have an owner.
    pub fn validate(&self) -> Result<()> {
        for (&page, entries) in &self.pages {
            for (expected, &mcid) in (0u32..).zip(entries.keys()) {
                if mcid != expected {
                    return Err(Error::MissingMarkedContent {
                        page,
                        mcid: expected,
                    });
                }
            }
        }
        Ok(())
    }

    /// Number tree dictionary (`<< /Nums [key value ...] >>`).
    ///
    /// Validates first, so the per-page arrays never contain holes.
    pub fn to_dict(&self) -> Result<Dictionary> {
        self.validate()?;

        let mut entries: BTreeMap<u32, Object> = self
            .objects
            .iter()
            .map(|(&key, &element)| (key, Object::Reference(element)))
            .collect();
        for (page, owners) in &self.pages {
            if let Some(&key) = self.page_keys.get(page) {
                let refs = owners.values().copied().map(Object::Reference).collect();
                entries.insert(key, Object::Array(refs));
            }
        }

        let mut nums = Vec::with_capacity(entries.len() * 2);
        for (key, value) in entries {
            nums.push(Object::from(key));
            nums.push(value);
        }
        let mut dict = Dictionary::new();
        dict.insert("Nums".to_string(), Object::Array(nums));
        Ok(dict)
    }
}
