use crate::symbols::types::SymbolFile;
use anyhow::{Context, Result, bail};
use globset::{Glob, GlobMatcher};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find symbol-table documents below `input`.
///
/// A file is taken as-is; a directory is walked (respecting ignore files)
/// and filtered by `pattern`. Paths come back sorted so the ingestion order,
/// and therefore the output, does not depend on directory iteration order.
pub fn discover_symbol_files(input: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        bail!("Symbol table input not found: {}", input.display());
    }

    let matcher: GlobMatcher = Glob::new(pattern)
        .with_context(|| format!("Invalid input glob: {}", pattern))?
        .compile_matcher();

    let walker = WalkBuilder::new(input)
        .hidden(true)
        .git_ignore(true)
        .git_exclude(true)
        .build();

    let mut files: Vec<PathBuf> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter(|entry| {
            entry
                .path()
                .file_name()
                .is_some_and(|name| matcher.is_match(Path::new(name)))
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    debug!(count = files.len(), root = %input.display(), "discovered symbol tables");
    Ok(files)
}

/// Parse every document in parallel, keeping the order of `paths`
pub fn load_symbol_files(paths: &[PathBuf]) -> Result<Vec<SymbolFile>> {
    paths
        .par_iter()
        .map(|path| {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read symbol table {}", path.display()))?;
            serde_json::from_str::<SymbolFile>(&content)
                .with_context(|| format!("Failed to parse symbol table {}", path.display()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("nested")).unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("nested/a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let files = discover_symbol_files(dir.path(), "*.json").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(names, vec![PathBuf::from("b.json"), PathBuf::from("nested/a.json")]);
    }

    #[test]
    fn test_single_file_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("symbols.txt");
        fs::write(&path, "{}").unwrap();

        let files = discover_symbol_files(&path, "*.json").unwrap();
        assert_eq!(files, vec![path]);
    }

    #[test]
    fn test_load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_symbol_files(&[path]).unwrap_err();
        assert!(err.to_string().contains("Failed to parse symbol table"));
    }

    #[test]
    fn test_missing_input() {
        assert!(discover_symbol_files(Path::new("/definitely/not/here"), "*.json").is_err());
    }
}
