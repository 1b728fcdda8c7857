//! Utility functions shared by the builders.
//!
//! - [`tokenizer`] - Identifier splitting for the search index (camelCase, snake_case)
//! - [`links`] - Page names, page directories and anchor ids
//! - [`js`] - JavaScript literal escaping for the emitted data files
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//!
//! ```no_run
//! use docindex::utils::name_tokens;
//!
//! let tokens = name_tokens("getRole", 2);
//! // Returns: ["getrole", "get", "role"]
//! ```

pub mod js;
pub mod links;
pub mod progress;
pub mod tokenizer;

pub use js::*;
pub use links::*;
pub use tokenizer::*;
