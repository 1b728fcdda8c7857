//! # docindex - navigation and search indexes for C++ API documentation
//!
//! docindex turns a symbol table extracted from annotated C++ headers into
//! the static JavaScript files that drive a browsable documentation site:
//! the annotated class list, the class hierarchy, per-class member tables,
//! sharded search data and a paged navigation tree.
//!
//! ## Architecture
//!
//! The build is a single stateless pass over an immutable graph:
//!
//! - [`symbols`] - Symbol-table input and the Entity/Member graph
//! - [`hierarchy`] - Inheritance forest for display, cycles cut
//! - [`search`] - Token index sharded by category and leading character
//! - [`nav`] - Navigation tree assembly, flattening and paging
//! - [`emit`] - Rendering and writing of the JavaScript artifacts
//! - [`build`] - The pipeline tying the above together
//! - [`config`] - Build configuration and the navigation skeleton
//! - [`output`] - Terminal output (search results, problems)
//! - [`utils`] - Tokenizer, link and anchor generation, JS escaping
//!
//! ## Quick Start
//!
//! ```no_run
//! use docindex::build::{BuildOptions, build_docs};
//! use docindex::config::DocConfig;
//! use std::path::PathBuf;
//!
//! let options = BuildOptions {
//!     input: PathBuf::from("symbols/"),
//!     out_dir: PathBuf::from("html/"),
//!     force: true,
//!     quiet: true,
//! };
//! let report = build_docs(&options, &DocConfig::default()).unwrap();
//! println!("{} files written", report.files_written);
//! ```
//!
//! Hierarchy and search indexes are built in parallel on rayon, and every
//! artifact is rendered independently, so one bad file never stops the rest.

pub mod build;
pub mod config;
pub mod emit;
pub mod error;
pub mod hierarchy;
pub mod nav;
pub mod output;
pub mod search;
pub mod stats;
pub mod symbols;
pub mod utils;

pub use error::IndexError;
