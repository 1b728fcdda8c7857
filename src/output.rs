//! Terminal output for search results and build problems

use crate::error::IndexError;
use crate::search::{SearchHit, SearchIndex, SearchTarget, TokenEntry};
use crate::symbols::SymbolTable;
use crate::utils::{LinkResolver, tokenize_query};
use std::io::{self, Write};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// A token matching a query, with its hits
pub struct TokenMatch<'a> {
    pub token: &'a str,
    pub entry: &'a TokenEntry,
}

/// Tokens matching any word of `query` by prefix: the matches of each word
/// in turn, a token already listed for an earlier word skipped
pub fn find_matches<'a>(index: &'a SearchIndex, query: &str) -> Vec<TokenMatch<'a>> {
    let mut seen = rustc_hash::FxHashSet::default();
    let mut out = Vec::new();
    for word in tokenize_query(query) {
        for (token, entry) in index.lookup_prefix(&word) {
            if seen.insert(token) {
                out.push(TokenMatch { token, entry });
            }
        }
    }
    out
}

fn color_choice(color: bool) -> ColorChoice {
    if color { ColorChoice::Auto } else { ColorChoice::Never }
}

/// Print matches: the token spelling as a heading, one line per hit
pub fn print_matches(
    matches: &[TokenMatch<'_>],
    table: &SymbolTable,
    links: &LinkResolver<'_>,
    color: bool,
) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice(color));

    for (i, m) in matches.iter().enumerate() {
        if i > 0 {
            writeln!(stdout)?;
        }

        stdout.set_color(ColorSpec::new().set_fg(Some(Color::Magenta)).set_bold(true))?;
        write!(stdout, "{}", m.entry.display)?;
        stdout.reset()?;
        writeln!(stdout, " ({})", m.token)?;

        for hit in &m.entry.hits {
            print_hit(&mut stdout, hit, table, links)?;
        }
    }

    Ok(())
}

fn print_hit(
    stdout: &mut StandardStream,
    hit: &SearchHit,
    table: &SymbolTable,
    links: &LinkResolver<'_>,
) -> io::Result<()> {
    let link = match hit.target {
        SearchTarget::Entity(id) => links.entity_url(id),
        SearchTarget::Member { owner, index } => links.member_url(owner, index),
    };

    write!(stdout, "  ")?;
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)))?;
    write!(stdout, "{:<10}", hit.category.name())?;
    stdout.reset()?;

    stdout.set_color(ColorSpec::new().set_bold(true))?;
    write!(stdout, " {}", hit.label)?;
    stdout.reset()?;

    if let Some(file) = table.entity(hit.target.owner()).file.as_deref() {
        write!(stdout, " [{}]", file)?;
    }

    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)))?;
    writeln!(stdout, " {}", link)?;
    stdout.reset()?;

    Ok(())
}

/// Print problems to stderr, yellow for recovered ones, red for failed files
pub fn print_problems(diagnostics: &[IndexError], failures: &[IndexError], color: bool) -> io::Result<()> {
    let mut stderr = StandardStream::stderr(color_choice(color));

    for (problems, label, fg) in [
        (diagnostics, "warning", Color::Yellow),
        (failures, "error", Color::Red),
    ] {
        for problem in problems {
            stderr.set_color(ColorSpec::new().set_fg(Some(fg)).set_bold(true))?;
            write!(stderr, "{}", label)?;
            stderr.reset()?;
            writeln!(stderr, ": {}", problem)?;
        }
    }

    Ok(())
}
