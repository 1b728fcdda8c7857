#![no_main]

use docindex::build::{analyze, render_table};
use docindex::config::DocConfig;
use docindex::symbols::{SymbolFile, SymbolTable};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary scopes and bases must never loop or panic, cycles included
    let Ok(file) = serde_json::from_slice::<SymbolFile>(data) else {
        return;
    };
    let table = SymbolTable::ingest([file]);
    let config = DocConfig::default();
    let analysis = analyze(&table, &config);
    let _ = render_table(&table, &analysis, &config);
});
