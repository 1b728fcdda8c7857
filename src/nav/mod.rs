//! Navigation tree assembly.
//!
//! The configured skeleton (see [`crate::config::DocConfig::sections`]) is
//! filled with generated subtrees: the annotated class list, the class
//! hierarchy, namespaces, concepts, files and the member letter indexes.
//! Generated subtrees come from containment traversals or from the
//! cycle-free [`crate::hierarchy::Forest`], never from raw base links.
//!
//! The finished tree is flattened in pre-order and cut into fixed-size pages
//! for `navtreeindexN.js`.

pub mod pages;
pub mod tree;

pub use pages::{FlatEntry, NavPage};
pub use tree::{NavInputs, NavNode, NavTree};
