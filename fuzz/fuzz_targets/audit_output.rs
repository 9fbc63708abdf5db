#![no_main]

use std::collections::HashSet;

use libfuzzer_sys::fuzz_target;
use npmscan_core::pipeline::AuditOutputParser;
use npmscan_scanner::TextAuditParser;

fuzz_target!(|data: &[u8]| {
    let output = String::from_utf8_lossy(data);
    let vulns = TextAuditParser::new().parse(&output);

    // dedup 이후 같은 (severity, package, description)은 없어야 함
    let mut seen = HashSet::new();
    for v in &vulns {
        assert!(!v.fixed);
        assert!(!v.package.is_empty());
        assert!(seen.insert((v.severity, v.package.clone(), v.description.clone())));
    }
});
