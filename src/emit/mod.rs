//! Rendering of the index artifacts into JavaScript data files.
//!
//! Rendering is pure: every file becomes an [`Artifact`] in memory and is
//! written afterwards, so identical input and anchor seed give byte-identical
//! output. Each file is checked for anchor collisions on its own; a
//! collision drops that file and is reported, the others are still written.

pub mod anchors;
pub mod navtree;
pub mod search;

use crate::error::IndexError;
use crate::nav::{NavNode, NavPage, NavTree};
use crate::search::{SearchCategory, SearchIndex, Shard};
use crate::symbols::SymbolTable;
use crate::utils::LinkResolver;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub use anchors::AnchorRegistry;

/// Marker file of a previously generated output directory
pub const NAVTREE_DATA: &str = "navtreedata.js";

/// One rendered output file, path relative to the output directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

#[derive(Debug, Default)]
pub struct RenderOutput {
    pub artifacts: Vec<Artifact>,
    /// Files that were not rendered, one error each
    pub failures: Vec<IndexError>,
}

/// Everything the renderers read
pub struct Site<'a> {
    pub table: &'a SymbolTable,
    pub search: &'a SearchIndex,
    pub tree: &'a NavTree,
    pub links: &'a LinkResolver<'a>,
    pub page_size: usize,
}

enum Job<'a> {
    NavTreeData(&'a [NavPage]),
    NavTreeIndex(&'a NavPage),
    Script(&'a NavNode),
    SearchData,
    Shard(Shard<'a>),
}

/// Render every artifact of the site
pub fn render_site(site: &Site<'_>) -> RenderOutput {
    let pages = site.tree.paginate(site.page_size);

    let mut jobs: Vec<Job<'_>> = vec![Job::NavTreeData(&pages)];
    jobs.extend(pages.iter().map(Job::NavTreeIndex));
    jobs.extend(site.tree.scripted().into_iter().map(Job::Script));
    jobs.push(Job::SearchData);
    for category in SearchCategory::ALL {
        jobs.extend(site.search.shards(category).into_iter().map(Job::Shard));
    }
    debug!(files = jobs.len(), pages = pages.len(), "rendering artifacts");

    let results: Vec<Result<Artifact, IndexError>> = jobs.par_iter().map(|job| render_job(site, job)).collect();

    let mut output = RenderOutput::default();
    for result in results {
        match result {
            Ok(artifact) => output.artifacts.push(artifact),
            Err(err) => {
                warn!("{}; file skipped", err);
                output.failures.push(err);
            }
        }
    }
    output
}

fn render_job(site: &Site<'_>, job: &Job<'_>) -> Result<Artifact, IndexError> {
    let (path, contents) = match job {
        Job::NavTreeData(pages) => {
            let contents = navtree::render_navtree_data(site.tree.root(), pages, NAVTREE_DATA)?;
            (NAVTREE_DATA.to_string(), contents)
        }
        Job::NavTreeIndex(page) => (
            format!("navtreeindex{}.js", page.index),
            navtree::render_navtree_index(page),
        ),
        Job::Script(node) => {
            let path = format!("{}.js", node.script.as_deref().unwrap_or_default());
            let contents = navtree::render_script(node, &path)?;
            (path, contents)
        }
        Job::SearchData => (
            "search/searchdata.js".to_string(),
            search::render_search_data(site.search),
        ),
        Job::Shard(shard) => {
            let path = format!("search/{}", shard.file_name());
            let contents = search::render_shard(shard, site.table, site.links, &path)?;
            (path, contents)
        }
    };

    Ok(Artifact {
        path: PathBuf::from(path),
        contents,
    })
}

/// Write artifacts below `out_dir`, creating directories as needed
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("Failed to create output directory {}", out_dir.display()))?;

    artifacts.par_iter().try_for_each(|artifact| -> Result<()> {
        let path = out_dir.join(&artifact.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &artifact.contents).with_context(|| format!("Failed to write {}", path.display()))
    })
}

/// Remove a previous output directory. Refuses directories that do not look
/// like generated output.
pub fn clear_output(out_dir: &Path) -> Result<()> {
    if !out_dir.exists() {
        return Ok(());
    }
    if !out_dir.join(NAVTREE_DATA).exists() {
        anyhow::bail!(
            "Refusing to clear {}: no {} found, not a generated output directory",
            out_dir.display(),
            NAVTREE_DATA
        );
    }
    fs::remove_dir_all(out_dir).with_context(|| format!("Failed to clear {}", out_dir.display()))
}
