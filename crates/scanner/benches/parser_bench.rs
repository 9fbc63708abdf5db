use criterion::{Criterion, black_box, criterion_group, criterion_main};
use npmscan_core::pipeline::AuditOutputParser;
use npmscan_scanner::TextAuditParser;

fn generate_audit_output(advisories: usize) -> String {
    let severities = ["low", "moderate", "high", "critical"];
    let mut out = String::from("# npm audit report\n\n");
    for i in 0..advisories {
        let severity = severities[i % severities.len()];
        out.push_str(&format!(
            "pkg-{i}  <1.{i}.0\nSeverity: {severity}\nSome advisory - https://github.com/advisories/GHSA-{i}\nfix available via `npm audit fix`\nnode_modules/pkg-{i}\n\n"
        ));
    }
    out.push_str(&format!("{advisories} vulnerabilities found\n"));
    out.push_str("1 high severity vulnerability found\n");
    out
}

fn bench_text_parser(c: &mut Criterion) {
    let parser = TextAuditParser;

    let small = generate_audit_output(10);
    c.bench_function("text_parser_10_advisories", |b| {
        b.iter(|| parser.parse(black_box(&small)))
    });

    let medium = generate_audit_output(200);
    c.bench_function("text_parser_200_advisories", |b| {
        b.iter(|| parser.parse(black_box(&medium)))
    });

    let large = generate_audit_output(5_000);
    c.bench_function("text_parser_5000_advisories", |b| {
        b.iter(|| parser.parse(black_box(&large)))
    });
}

fn bench_clean_output(c: &mut Criterion) {
    let parser = TextAuditParser;
    let clean = "up to date, audited 512 packages in 3s\n\nfound 0 vulnerabilities\n";
    c.bench_function("text_parser_clean", |b| {
        b.iter(|| parser.parse(black_box(clean)))
    });
}

criterion_group!(benches, bench_text_parser, bench_clean_output);
criterion_main!(benches);
