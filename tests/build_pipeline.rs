//! End-to-end tests: symbol tables in, JavaScript index files out.
//!
//! The library pipeline and the compiled binary are both driven over the
//! JSON fixtures in `tests/fixtures/`.

use docindex::build::{BuildOptions, BuildReport, build_docs, load_table};
use docindex::config::DocConfig;
use docindex::utils::LinkResolver;
use docindex::IndexError;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn build(out_dir: &Path, config: &DocConfig) -> BuildReport {
    let options = BuildOptions {
        input: fixture("endpoint.json"),
        out_dir: out_dir.to_path_buf(),
        force: false,
        quiet: true,
    };
    build_docs(&options, config).expect("build failed")
}

/// Relative path -> contents of every file below `dir`
fn read_tree(dir: &Path) -> BTreeMap<PathBuf, String> {
    let mut files = BTreeMap::new();
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in fs::read_dir(&current).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                stack.push(path);
            } else {
                let rel = path.strip_prefix(dir).unwrap().to_path_buf();
                files.insert(rel, fs::read_to_string(&path).unwrap());
            }
        }
    }
    files
}

/// Page of an entity in the fixture, as the build names it
fn entity_page(qualified_name: &str) -> String {
    let (table, _) = load_table(&fixture("endpoint.json"), &DocConfig::default()).unwrap();
    let links = LinkResolver::new(&table, "");
    let id = table.lookup(qualified_name).unwrap().id;
    links.entity_page(id).unwrap()
}

fn docindex_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_docindex"))
}

fn run_docindex(args: &[&str]) -> (String, String, bool) {
    let output = Command::new(docindex_binary())
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to run docindex");
    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.success(),
    )
}

#[test]
fn test_build_writes_every_artifact() {
    let dir = TempDir::new().unwrap();
    let report = build(dir.path(), &DocConfig::default());

    assert!(report.is_success());
    assert_eq!(report.entities, 10);
    for file in [
        "navtreedata.js",
        "navtreeindex0.js",
        "annotated_dup.js",
        "hierarchy.js",
        "namespaces_dup.js",
        "concepts.js",
        "files_dup.js",
        "functions_dup.js",
        "functions_func.js",
        "functions_vars.js",
        "functions_type.js",
        "functions_eval.js",
        "search/searchdata.js",
    ] {
        assert!(dir.path().join(file).is_file(), "missing {}", file);
    }

    let endpoint = format!("{}.js", entity_page("dxfcpp::DXEndpoint"));
    assert!(endpoint.ends_with("structdxfcpp_1_1_d_x_endpoint.js"));
    assert!(dir.path().join(&endpoint).is_file());
}

#[test]
fn test_malformed_symbols_are_reported_not_fatal() {
    let dir = TempDir::new().unwrap();
    let report = build(dir.path(), &DocConfig::default());

    let names: Vec<_> = report.diagnostics.iter().map(|d| d.qualified_name()).collect();
    assert_eq!(names, vec!["dxfcpp::detail::Missing::Orphan", "dxfcpp::Loose"]);
    assert!(report.diagnostics.iter().all(|d| matches!(d, IndexError::MalformedSymbol { .. })));

    // The entity with the unknown base is still listed
    let annotated = fs::read_to_string(dir.path().join("annotated_dup.js")).unwrap();
    assert!(annotated.contains("[ \"Loose\", "));
    assert!(!annotated.contains("Orphan"));
}

#[test]
fn test_hierarchy_chain() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), &DocConfig::default());
    let hierarchy = fs::read_to_string(dir.path().join("hierarchy.js")).unwrap();

    let entity = hierarchy.find("\n    [ \"dxfcpp::Entity\"").unwrap();
    let shared = hierarchy.find("\n      [ \"dxfcpp::SharedEntity\"").unwrap();
    let endpoint = hierarchy.find("\n        [ \"dxfcpp::DXEndpoint\"").unwrap();
    assert!(entity < shared && shared < endpoint);

    // Each entity is placed once
    assert_eq!(hierarchy.matches("[ \"dxfcpp::DXEndpoint\"").count(), 1);

    // The mixin application gets its own node under the template
    let template = hierarchy.find("[ \"dxfcpp::RequireMakeShared< T >\"").unwrap();
    let instantiation = hierarchy
        .find("[ \"RequireMakeShared< DXEndpoint::Builder >\"")
        .unwrap();
    let builder = hierarchy.find("[ \"dxfcpp::DXEndpoint::Builder\"").unwrap();
    assert!(template < instantiation && instantiation < builder);
}

#[test]
fn test_member_table_lists_nested_types_and_members() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), &DocConfig::default());

    let page = entity_page("dxfcpp::DXEndpoint");
    let table = fs::read_to_string(dir.path().join(format!("{}.js", page))).unwrap();

    assert!(table.starts_with("var structdxfcpp_1_1_d_x_endpoint =\n[\n    [ \"Role\", "));
    assert!(table.contains("      [ \"ON_DEMAND_FEED\", "));
    assert!(table.contains(&format!("[ \"Builder\", \"{}", entity_page("dxfcpp::DXEndpoint::Builder"))));
    assert!(table.contains("[ \"connect\", "));
    assert_eq!(table.matches("[ \"getInstance\", ").count(), 2);
}

#[test]
fn test_search_token_leads_to_owner() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), &DocConfig::default());
    let publisher = entity_page("dxfcpp::DXPublisher");

    let files = read_tree(&dir.path().join("search"));
    let (_, shard) = files
        .iter()
        .find(|(path, text)| {
            path.to_string_lossy().starts_with("all_") && text.contains("['publishevents_")
        })
        .expect("no shard holds publishevents");

    let row = shard
        .lines()
        .find(|line| line.contains("['publishevents_"))
        .unwrap();
    assert!(row.contains(&format!("'../{}.html#a", publisher)));
    // Overloads are told apart by their signatures
    assert!(row.contains("dxfcpp::DXPublisher::publishEvents(std::shared_ptr&lt; EventType &gt; event)"));
    assert_eq!(row.matches(",1,'").count(), 2);
}

#[test]
fn test_endpoint_scenario_search_hits() {
    let dir = TempDir::new().unwrap();
    build(dir.path(), &DocConfig::default());
    let files = read_tree(&dir.path().join("search"));
    let functions: String = files
        .iter()
        .filter(|(path, _)| path.to_string_lossy().starts_with("functions_"))
        .map(|(_, text)| text.as_str())
        .collect();

    // Tokens with a single hit name the owning entity
    for token in ["['connect_", "['close_"] {
        let row = functions.lines().find(|line| line.contains(token)).unwrap();
        assert!(row.ends_with(",1,'dxfcpp::DXEndpoint']]],"), "{}", row);
    }
    // "get" is shared, so each hit carries its full label
    let get = functions.lines().find(|line| line.contains("['get_")).unwrap();
    assert!(get.contains("'dxfcpp::DXEndpoint::getRole()'"));
    assert!(get.contains("'dxfcpp::DXEndpoint::getState()'"));

    let searchdata = &files[Path::new("searchdata.js")];
    assert!(searchdata.contains("\"enumvalues\""));
    assert!(searchdata.contains("\"concepts\""));
}

#[test]
fn test_rebuild_is_byte_identical() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    build(first.path(), &DocConfig::default());
    build(second.path(), &DocConfig::default());

    assert_eq!(read_tree(first.path()), read_tree(second.path()));
}

#[test]
fn test_anchor_seed_versions_anchors() {
    let plain = TempDir::new().unwrap();
    let seeded = TempDir::new().unwrap();
    build(plain.path(), &DocConfig::default());
    build(
        seeded.path(),
        &DocConfig {
            anchor_seed: "v2".to_string(),
            ..DocConfig::default()
        },
    );

    let plain = read_tree(plain.path());
    let seeded = read_tree(seeded.path());
    assert_eq!(plain.keys().collect::<Vec<_>>(), seeded.keys().collect::<Vec<_>>());
    assert_ne!(plain[Path::new("search/searchdata.js")], String::new());
    assert_eq!(plain[Path::new("search/searchdata.js")], seeded[Path::new("search/searchdata.js")]);
    assert_ne!(plain[Path::new("navtreeindex0.js")], seeded[Path::new("navtreeindex0.js")]);
}

#[test]
fn test_small_pages_split_the_index() {
    let dir = TempDir::new().unwrap();
    let config = DocConfig {
        page_size: 10,
        ..DocConfig::default()
    };
    let report = build(dir.path(), &config);
    assert!(report.pages > 1);

    let navtree = fs::read_to_string(dir.path().join("navtreedata.js")).unwrap();
    assert!(navtree.starts_with("var NAVTREE =\n[\n  [ \"dxFeed Graal CXX API\", \"index.html\", [\n"));

    for page in 0..report.pages {
        let index = fs::read_to_string(dir.path().join(format!("navtreeindex{}.js", page))).unwrap();
        assert!(index.starts_with(&format!("var NAVTREEINDEX{} =\n{{\n", page)));

        // The first key of every page is listed in NAVTREEINDEX
        let first = index.lines().nth(2).unwrap();
        let link = &first[..first.find(":[").unwrap()];
        assert!(navtree.contains(link));
    }
    assert!(!dir.path().join(format!("navtreeindex{}.js", report.pages)).exists());

    // Pages are looked up by comparing against their first links in order
    let start = navtree.find("var NAVTREEINDEX =\n[\n").unwrap() + "var NAVTREEINDEX =\n[\n".len();
    let end = start + navtree[start..].find("\n];").unwrap();
    let firsts: Vec<&str> = navtree[start..end].split(",\n").collect();
    assert_eq!(firsts.len(), report.pages);
    assert!(firsts.windows(2).all(|w| w[0] < w[1]), "unsorted: {:?}", firsts);
}

#[test]
fn test_duplicate_pinned_anchor_fails_only_its_files() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("pinned.json");
    fs::write(
        &input,
        r#"{
            "declarations": [
                { "name": "Quote", "kind": "class", "members": [
                    { "name": "getBidPrice", "kind": "function", "anchor": "a_price" },
                    { "name": "getAskPrice", "kind": "function", "anchor": "a_price" }
                ] },
                { "name": "Trade", "kind": "class", "members": [
                    { "name": "getPrice", "kind": "function" }
                ] }
            ]
        }"#,
    )
    .unwrap();

    let out = dir.path().join("html");
    let options = BuildOptions {
        input,
        out_dir: out.clone(),
        force: false,
        quiet: true,
    };
    let report = build_docs(&options, &DocConfig::default()).unwrap();

    assert!(!report.is_success());
    assert!(report.failures.iter().all(|f| matches!(f, IndexError::DuplicateAnchor { .. })));
    let failed: Vec<_> = report
        .failures
        .iter()
        .map(|f| match f {
            IndexError::DuplicateAnchor { file, .. } => file.clone(),
            _ => unreachable!(),
        })
        .collect();
    assert!(failed.iter().any(|f| f.ends_with("class_quote.js")));

    // Unaffected files are still written
    assert!(out.join("navtreedata.js").exists());
    assert!(out.join("hierarchy.js").exists());
    for file in &failed {
        assert!(!out.join(file).exists(), "{} should not be written", file);
    }
}

#[test]
fn test_cli_build_and_search() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("html");
    let input = fixture("endpoint.json");

    let (_, stderr, ok) = run_docindex(&[
        "build",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--quiet",
    ]);
    assert!(ok, "build failed: {}", stderr);
    assert!(out.join("navtreedata.js").exists());
    // Recovered problems are printed, the build still succeeds
    assert!(stderr.contains("warning: malformed symbol `dxfcpp::Loose`"));

    let (stdout, _, ok) = run_docindex(&["search", "getRole", "--input", input.to_str().unwrap(), "--no-color"]);
    assert!(ok);
    assert!(stdout.contains("dxfcpp::DXEndpoint::getRole()"));
    assert!(stdout.contains("[DXEndpoint.hpp]"));
}

#[test]
fn test_cli_force_refuses_foreign_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("site");
    fs::create_dir_all(&out).unwrap();
    fs::write(out.join("index.html"), "<html></html>").unwrap();

    let input = fixture("endpoint.json");
    let (_, stderr, ok) = run_docindex(&[
        "build",
        input.to_str().unwrap(),
        "--out",
        out.to_str().unwrap(),
        "--force",
        "--quiet",
    ]);
    assert!(!ok);
    assert!(stderr.contains("Refusing to clear"));
    assert!(out.join("index.html").exists());
}

#[test]
fn test_cli_force_replaces_previous_output() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("html");
    let input = fixture("endpoint.json");
    let args = ["build", input.to_str().unwrap(), "--out", out.to_str().unwrap(), "--quiet"];

    assert!(run_docindex(&args).2);
    fs::write(out.join("stale.js"), "var stale = [];").unwrap();

    let mut forced = args.to_vec();
    forced.push("--force");
    assert!(run_docindex(&forced).2);
    assert!(!out.join("stale.js").exists());
    assert!(out.join("navtreedata.js").exists());
}

#[test]
fn test_cli_config_and_stats() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"page_size": 7, "project_name": "Test API"}"#).unwrap();

    let (stdout, _, ok) = run_docindex(&["config", "--config", config.to_str().unwrap()]);
    assert!(ok);
    let effective: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(effective["page_size"], 7);
    assert_eq!(effective["min_segment_len"], 2);

    let input = fixture("endpoint.json");
    let (stdout, _, ok) = run_docindex(&["stats", input.to_str().unwrap(), "--config", config.to_str().unwrap()]);
    assert!(ok);
    assert!(stdout.contains("Entities:         10"));
    assert!(stdout.contains("Diagnostics:      2"));
    assert!(stdout.contains("(page size 7)"));
}

#[test]
fn test_cli_config_write_completes_partial_file() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.json");
    fs::write(&config, r#"{"page_size": 40}"#).unwrap();

    let (_, stderr, ok) = run_docindex(&["config", "--write", "--config", config.to_str().unwrap()]);
    assert!(ok, "{}", stderr);

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config).unwrap()).unwrap();
    assert_eq!(saved["page_size"], 40);
    assert_eq!(saved["input_glob"], "*.json");
    assert!(saved["sections"].as_array().is_some_and(|s| !s.is_empty()));
}
