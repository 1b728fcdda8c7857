//! Token-sharded search index.
//!
//! Every entity and member name is split into lowercase tokens (see
//! [`crate::utils::name_tokens`]). A token keeps every symbol that produced
//! it, in the order the symbol table was traversed. For emission the tokens
//! are cut into shards by category and leading character.

pub mod index;

pub use index::*;
