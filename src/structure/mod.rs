//! Logical structure tree for tagged PDF.
//!
//! Structure elements are indirect objects written through the incremental
//! writer. Each element keeps its kids in reading order: nested elements,
//! marked-content sequences, and whole objects such as annotations.
//! The parent tree maps each page's marked content back to its element.
//!
//! See ISO 32000-1:2008, Section 14.7.

mod parent_tree;
mod tree;
mod types;

pub use parent_tree::ParentTree;
pub use tree::{StructNode, StructureTree};
pub use types::{StructKid, StructOptions, StructType};
