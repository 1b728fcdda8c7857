#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // Names come from parsed headers and may hold anything
    let _ = docindex::utils::name_tokens(data, 1);
    let _ = docindex::utils::tokenize_query(data);
    let _ = docindex::utils::escape_name(data);
    let _ = docindex::utils::js_string(data);
});
