use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use docindex::build::{BuildOptions, analyze, build_docs, load_table};
use docindex::config::{DocConfig, get_config_path};
use docindex::output;
use docindex::utils::LinkResolver;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "docindex")]
#[command(about = "Build navigation and search indexes for C++ API documentation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to the user config, then built-in defaults)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the index artifacts from symbol tables
    Build {
        /// Symbol-table file or directory
        #[arg(default_value = ".")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "html")]
        out: PathBuf,

        /// Clear a previously generated output directory first
        #[arg(short, long)]
        force: bool,

        /// No progress or summary output
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show symbol table and index statistics
    Stats {
        /// Symbol-table file or directory
        #[arg(default_value = ".")]
        input: PathBuf,

        /// Generated output directory to measure
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Look up symbols by name prefix
    Search {
        /// Query words, matched as token prefixes
        query: String,

        /// Symbol-table file or directory
        #[arg(short, long, default_value = ".")]
        input: PathBuf,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },
    /// Print the effective configuration
    Config {
        /// Also save it to the config file (`--config`, else the user config)
        #[arg(short, long)]
        write: bool,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        // Diagnostics are printed after the build, not logged twice
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = DocConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build {
            input,
            out,
            force,
            quiet,
        } => {
            let options = BuildOptions {
                input,
                out_dir: out,
                force,
                quiet,
            };
            let report = build_docs(&options, &config)?;

            if !quiet {
                println!(
                    "Indexed {} entities, {} members, {} tokens in {:.2?}",
                    report.entities, report.members, report.tokens, report.elapsed
                );
                println!("Wrote {} files ({} nav pages)", report.files_written, report.pages);
            }
            output::print_problems(&report.diagnostics, &report.failures, std::io::stderr().is_terminal())?;

            if !report.is_success() {
                bail!("{} file(s) could not be generated", report.failures.len());
            }
        }
        Commands::Stats { input, out } => {
            docindex::stats::show_stats(&input, out.as_deref(), &config)?;
        }
        Commands::Search {
            query,
            input,
            no_color,
        } => {
            run_search(&input, &query, &config, !no_color)?;
        }
        Commands::Config { write } => {
            let path = cli.config.clone().or_else(get_config_path);
            if let Some(path) = &path {
                eprintln!("config file: {}", path.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);

            if write {
                let Some(path) = path else {
                    bail!("No config directory on this system; pass --config");
                };
                config.save(&path)?;
                eprintln!("Saved {}", path.display());
            }
        }
    }

    Ok(())
}

fn run_search(input: &Path, query: &str, config: &DocConfig, color: bool) -> Result<()> {
    let (table, _) = load_table(input, config)?;
    let analysis = analyze(&table, config);
    let links = LinkResolver::new(&table, &config.anchor_seed);

    let matches = output::find_matches(&analysis.search, query);
    if matches.is_empty() {
        println!("No symbols match \"{}\"", query);
        return Ok(());
    }
    output::print_matches(&matches, &table, &links, color)?;
    Ok(())
}
