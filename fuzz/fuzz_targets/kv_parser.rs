#![no_main]

use libfuzzer_sys::fuzz_target;
use siemnorm_transform::kv::KeyValueParser;

fuzz_target!(|data: &[u8]| {
    if let Ok(body) = std::str::from_utf8(data) {
        let table = KeyValueParser::new().parse(body);
        for (key, value) in table.iter() {
            assert!(!key.is_empty());
            assert!(!value.is_empty());
        }
    }
});
