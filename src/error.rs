//! Error taxonomy for index building.
//!
//! Every variant carries the qualified name of the symbol that caused it.
//! `MalformedSymbol` and `CyclicHierarchy` are recovered locally and kept as
//! diagnostics; `DuplicateAnchor` aborts emission of the affected file.

use std::fmt;
use thiserror::Error;

/// Which reference of a declaration could not be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Scope,
    Base,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Scope => write!(f, "parent scope"),
            ReferenceKind::Base => write!(f, "base type"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// A declaration references a scope or base that is not in the table.
    #[error("malformed symbol `{name}`: {kind} `{reference}` is not in the symbol table")]
    MalformedSymbol {
        name: String,
        reference: String,
        kind: ReferenceKind,
    },

    /// A base chain leads back to the entity itself.
    #[error("cyclic hierarchy at `{name}`: {}", chain.join(" -> "))]
    CyclicHierarchy { name: String, chain: Vec<String> },

    /// Two different symbols resolve to the same anchor within one file.
    #[error("duplicate anchor `{anchor}` in {file}: `{first}` and `{name}`")]
    DuplicateAnchor {
        file: String,
        anchor: String,
        first: String,
        name: String,
    },
}

impl IndexError {
    /// Qualified name of the offending symbol
    pub fn qualified_name(&self) -> &str {
        match self {
            IndexError::MalformedSymbol { name, .. }
            | IndexError::CyclicHierarchy { name, .. }
            | IndexError::DuplicateAnchor { name, .. } => name,
        }
    }

    /// Fatal errors abort the emission of the file they occur in
    pub fn is_fatal(&self) -> bool {
        matches!(self, IndexError::DuplicateAnchor { .. })
    }
}
