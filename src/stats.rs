use crate::build::{Analysis, analyze, load_table};
use crate::config::DocConfig;
use crate::nav::{NavInputs, NavTree};
use crate::search::SearchCategory;
use crate::symbols::{EntityKind, MemberKind, SymbolTable};
use crate::utils::LinkResolver;
use crate::emit;
use anyhow::{Result, bail};
use ignore::WalkBuilder;
use std::collections::BTreeMap;
use std::path::Path;

/// Counts describing a symbol table and the index built from it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocStats {
    pub inputs: usize,
    pub entities: BTreeMap<EntityKind, usize>,
    pub members: BTreeMap<MemberKind, usize>,
    pub namespaces: usize,
    pub files: usize,
    pub hierarchy_roots: usize,
    pub hierarchy_depth: usize,
    pub detached: usize,
    pub tokens: usize,
    pub hits: usize,
    pub shards: usize,
    pub nav_nodes: usize,
    pub nav_pages: usize,
    pub diagnostics: Vec<String>,
}

impl DocStats {
    pub fn collect(table: &SymbolTable, analysis: &Analysis, config: &DocConfig) -> Self {
        let mut entities = BTreeMap::new();
        let mut members = BTreeMap::new();
        for entity in table.entities() {
            *entities.entry(entity.kind).or_insert(0) += 1;
            for member in &entity.members {
                *members.entry(member.kind).or_insert(0) += 1;
            }
        }

        let links = LinkResolver::new(table, &config.anchor_seed);
        let tree = NavTree::assemble(
            &NavInputs {
                table,
                forest: &analysis.forest,
                search: &analysis.search,
                links: &links,
            },
            config,
        );

        let diagnostics = table
            .diagnostics()
            .iter()
            .chain(analysis.forest.diagnostics())
            .map(|d| d.to_string())
            .collect();

        Self {
            inputs: 0,
            entities,
            members,
            namespaces: table.namespaces().len(),
            files: table.files().len(),
            hierarchy_roots: analysis.forest.roots().len(),
            hierarchy_depth: analysis.forest.max_depth(),
            detached: analysis.forest.detached().len(),
            tokens: analysis.search.len(),
            hits: analysis.search.hit_count(),
            shards: SearchCategory::ALL
                .iter()
                .map(|&c| analysis.search.shards(c).len())
                .sum(),
            nav_nodes: tree.node_count(),
            nav_pages: tree.paginate(config.page_size).len(),
            diagnostics,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.values().sum()
    }

    pub fn member_count(&self) -> usize {
        self.members.values().sum()
    }
}

/// Display statistics for the symbol tables below `input`
pub fn show_stats(input: &Path, out_dir: Option<&Path>, config: &DocConfig) -> Result<()> {
    let (table, inputs) = load_table(input, config)?;
    let analysis = analyze(&table, config);
    let stats = DocStats {
        inputs,
        ..DocStats::collect(&table, &analysis, config)
    };

    println!("Index Statistics");
    println!("================");
    println!();
    println!("Input:            {}", input.display());
    println!("Symbol tables:    {}", stats.inputs);
    println!("Namespaces:       {}", stats.namespaces);
    println!("Header files:     {}", stats.files);

    println!();
    println!("Entities:         {}", stats.entity_count());
    for (kind, count) in &stats.entities {
        println!("  {:15} {}", format!("{:?}", kind).to_lowercase(), count);
    }

    println!();
    println!("Members:          {}", stats.member_count());
    for (kind, count) in &stats.members {
        println!("  {:15} {}", format!("{:?}", kind).to_lowercase(), count);
    }

    println!();
    println!("Hierarchy roots:  {}", stats.hierarchy_roots);
    println!("Hierarchy depth:  {}", stats.hierarchy_depth);
    if stats.detached > 0 {
        println!("Cycles cut:       {}", stats.detached);
    }

    println!();
    println!("Search tokens:    {} ({} hits)", stats.tokens, stats.hits);
    println!("Search shards:    {}", stats.shards);
    println!("Nav nodes:        {}", stats.nav_nodes);
    println!("Nav pages:        {} (page size {})", stats.nav_pages, config.page_size);

    if let Some(out_dir) = out_dir {
        let output = OutputStats::measure(out_dir)?;
        println!();
        println!(
            "Output:           {} scripts, {} search files, {}",
            output.scripts,
            output.search_files,
            format_bytes(output.bytes)
        );
    }

    if !stats.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:      {}", stats.diagnostics.len());
        for diagnostic in stats.diagnostics.iter().take(15) {
            println!("  {}", diagnostic);
        }
        if stats.diagnostics.len() > 15 {
            println!("  ... and {} more", stats.diagnostics.len() - 15);
        }
    }

    Ok(())
}

/// What a previous build left in an output directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputStats {
    /// Navigation scripts and member tables
    pub scripts: usize,
    /// Files below `search/`
    pub search_files: usize,
    pub bytes: u64,
}

impl OutputStats {
    /// Walk `out_dir`, counting generated `.js` files
    pub fn measure(out_dir: &Path) -> Result<Self> {
        if !out_dir.join(emit::NAVTREE_DATA).is_file() {
            bail!("No generated index in {}", out_dir.display());
        }

        let mut stats = OutputStats::default();
        let walker = WalkBuilder::new(out_dir).standard_filters(false).build();
        for entry in walker {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().is_none_or(|ext| ext != "js") {
                continue;
            }
            if path.parent().is_some_and(|parent| parent.ends_with("search")) {
                stats.search_files += 1;
            } else {
                stats.scripts += 1;
            }
            stats.bytes += entry.metadata()?.len();
        }
        Ok(stats)
    }
}

/// `1536` -> `1.5 KiB`
fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
