#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use npmscan_scanner::{StepVerdict, classify_audit_exit, classify_strict};

#[derive(Debug, Arbitrary)]
struct Input {
    exit_code: Option<i32>,
    output: String,
    findings_exit_code: i32,
}

fuzz_target!(|input: Input| {
    let strict = classify_strict(input.exit_code);
    assert_eq!(strict.is_success(), input.exit_code == Some(0));

    let verdict = classify_audit_exit(input.exit_code, &input.output, input.findings_exit_code);
    match input.exit_code {
        Some(0) => assert_eq!(verdict, StepVerdict::Succeeded),
        None => assert!(!verdict.is_success()),
        Some(code) if code != input.findings_exit_code => assert!(!verdict.is_success()),
        Some(_) => {}
    }
});
