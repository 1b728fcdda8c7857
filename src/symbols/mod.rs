pub mod input;
pub mod table;
pub mod types;

pub use input::{discover_symbol_files, load_symbol_files};
pub use table::SymbolTable;
pub use types::*;
