#![no_main]

use libfuzzer_sys::fuzz_target;
use siemnorm_core::record::Node;

fuzz_target!(|data: (&[u8], &[u8])| {
    let (Ok(a), Ok(b)) = (
        serde_json::from_slice::<serde_json::Value>(data.0),
        serde_json::from_slice::<serde_json::Value>(data.1),
    ) else {
        return;
    };
    let b = Node::from(b);

    let mut once = Node::from(a);
    once.merge(b.clone());
    let mut twice = once.clone();
    twice.merge(b);

    assert_eq!(once, twice, "merge must be idempotent");
});
