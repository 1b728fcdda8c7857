use crate::config::DocConfig;
use crate::emit::{self, RenderOutput, Site};
use crate::error::IndexError;
use crate::hierarchy::Forest;
use crate::nav::{NavInputs, NavTree};
use crate::search::SearchIndex;
use crate::symbols::{SymbolTable, discover_symbol_files, load_symbol_files};
use crate::utils::LinkResolver;
use crate::utils::progress::BuildProgress;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::info;

/// Options of one `build` run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Symbol-table file, or a directory searched with the configured glob
    pub input: PathBuf,
    pub out_dir: PathBuf,
    /// Clear a previous output directory first
    pub force: bool,
    /// No spinners and no summary lines on stdout
    pub quiet: bool,
}

/// Outcome of a build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub inputs: usize,
    pub entities: usize,
    pub members: usize,
    pub namespaces: usize,
    pub tokens: usize,
    pub pages: usize,
    pub files_written: usize,
    /// Recoverable problems: skipped declarations, dropped bases, cycles
    pub diagnostics: Vec<IndexError>,
    /// Files that could not be emitted
    pub failures: Vec<IndexError>,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Forest and search index of a table, built side by side
pub struct Analysis {
    pub forest: Forest,
    pub search: SearchIndex,
}

pub fn analyze(table: &SymbolTable, config: &DocConfig) -> Analysis {
    let (forest, search) = rayon::join(
        || Forest::build(table),
        || SearchIndex::build(table, config.min_segment_len),
    );
    Analysis { forest, search }
}

/// Read and ingest every symbol table below `input`
pub fn load_table(input: &Path, config: &DocConfig) -> Result<(SymbolTable, usize)> {
    let paths = discover_symbol_files(input, &config.input_glob)?;
    let files = load_symbol_files(&paths)?;
    Ok((SymbolTable::ingest(files), paths.len()))
}

/// Render the complete site for a table, without touching the file system
pub fn render_table(table: &SymbolTable, analysis: &Analysis, config: &DocConfig) -> (RenderOutput, usize) {
    let links = LinkResolver::new(table, &config.anchor_seed);
    let inputs = NavInputs {
        table,
        forest: &analysis.forest,
        search: &analysis.search,
        links: &links,
    };
    let tree = NavTree::assemble(&inputs, config);
    let pages = tree.flatten().len().div_ceil(config.page_size.max(1));

    let site = Site {
        table,
        search: &analysis.search,
        tree: &tree,
        links: &links,
        page_size: config.page_size,
    };
    (emit::render_site(&site), pages)
}

/// Build the documentation index from symbol tables into `options.out_dir`
pub fn build_docs(options: &BuildOptions, config: &DocConfig) -> Result<BuildReport> {
    let start = Instant::now();
    config.validate()?;

    if !options.quiet {
        println!("Building index: {}", options.input.display());
    }

    let progress = BuildProgress::start(options.quiet, "Reading symbol tables...");
    let (table, inputs) = load_table(&options.input, config)?;

    progress.stage(format!("Indexing {} entities...", table.len()));
    let analysis = analyze(&table, config);

    progress.stage("Rendering artifacts...");
    let (output, pages) = render_table(&table, &analysis, config);

    if options.force {
        emit::clear_output(&options.out_dir).context("Failed to clear output directory")?;
    }
    emit::write_artifacts(&options.out_dir, &output.artifacts)?;
    progress.finish(format!("Wrote {} files", output.artifacts.len()));

    let mut diagnostics = table.diagnostics().to_vec();
    diagnostics.extend_from_slice(analysis.forest.diagnostics());

    let report = BuildReport {
        inputs,
        entities: table.len(),
        members: table.member_count(),
        namespaces: table.namespaces().len(),
        tokens: analysis.search.len(),
        pages,
        files_written: output.artifacts.len(),
        diagnostics,
        failures: output.failures,
        elapsed: start.elapsed(),
    };

    info!(
        entities = report.entities,
        members = report.members,
        files = report.files_written,
        failed = report.failures.len(),
        diagnostics = report.diagnostics.len(),
        "build finished in {:.2?}",
        report.elapsed
    );

    if !options.quiet {
        println!("Output written to: {}", options.out_dir.display());
    }
    Ok(report)
}
