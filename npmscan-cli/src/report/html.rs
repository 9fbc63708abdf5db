//! Self-contained HTML report
//!
//! Inline CSS only, no external assets. Every value interpolated into the
//! document goes through [`escape_html`].

use std::fmt::Write as _;

use npmscan_core::types::{ActionOutcome, ProjectScanResult, ScanStatus, Severity, Vulnerability};
use npmscan_scanner::ScanReport;

use crate::output::format_duration;

const STYLE: &str = r#"
body { font-family: -apple-system, "Segoe UI", Roboto, sans-serif; background: #f5f6fa; color: #2d3436; margin: 0; }
header.hero { background: #2d3436; color: #fff; padding: 2rem 3rem; }
header.hero h1 { margin: 0 0 .3rem 0; font-size: 1.8rem; }
header.hero p { margin: 0; opacity: .8; }
main { padding: 2rem 3rem; }
.cards { display: flex; flex-wrap: wrap; gap: 1rem; margin-bottom: 2rem; }
.card { background: #fff; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,.12); padding: 1rem 1.5rem; min-width: 10rem; }
.card .heading { font-size: .75rem; text-transform: uppercase; letter-spacing: .05em; color: #636e72; }
.card .value { font-size: 1.8rem; font-weight: 700; }
.project { background: #fff; border-radius: 8px; box-shadow: 0 1px 3px rgba(0,0,0,.12); margin-bottom: 1.5rem; }
.project header { display: flex; justify-content: space-between; align-items: center; padding: 1rem 1.5rem; border-bottom: 1px solid #dfe6e9; }
.project header h2 { margin: 0; font-size: 1.1rem; word-break: break-all; }
.project .body { padding: 1rem 1.5rem; }
.meta { display: flex; gap: 2rem; margin-bottom: 1rem; color: #636e72; }
.tag { display: inline-block; border-radius: 4px; padding: .2rem .6rem; font-size: .8rem; font-weight: 600; color: #fff; }
.is-success { background: #00b894; }
.is-danger { background: #d63031; }
.is-warning { background: #fdcb6e; color: #2d3436; }
.is-info { background: #0984e3; }
.is-dark { background: #2d3436; }
.is-light { background: #b2bec3; color: #2d3436; }
.steps { display: flex; flex-wrap: wrap; gap: .5rem; margin-bottom: 1rem; }
.step-error { color: #d63031; font-size: .85rem; margin: .2rem 0; }
.vuln { display: flex; justify-content: space-between; align-items: center; padding: .6rem .8rem; border-radius: 4px; margin-bottom: .4rem; }
.vuln.sev-critical, .vuln.sev-high { background: #ffeaea; }
.vuln.sev-moderate { background: #fff8e1; }
.vuln.sev-low { background: #e8f4fd; }
.vuln .desc { font-size: .8rem; color: #636e72; }
.notice { padding: .8rem 1rem; border-radius: 4px; background: #e6fff7; }
.banner { padding: .8rem 1rem; border-radius: 4px; background: #fff3cd; margin-bottom: 1.5rem; }
footer { padding: 1rem 3rem 2rem; color: #636e72; font-size: .8rem; }
"#;

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Render the whole report as a standalone HTML document.
pub fn render_html(report: &ScanReport) -> String {
    let mut html = String::with_capacity(8 * 1024);
    let scan_id = escape_html(&report.scan_id);

    let _ = write!(
        html,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>npm Security Scan Report - {scan_id}</title>
<style>{STYLE}</style>
</head>
<body>
<header class="hero">
<h1>npm Security Scan Report</h1>
<p>{scan_id} &middot; {start} &middot; {duration}</p>
</header>
<main>
"#,
        start = escape_html(&report.start_time.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        duration = escape_html(&format_duration(report.total_duration)),
    );

    if report.interrupted {
        html.push_str(
            "<div class=\"banner\"><strong>Scan interrupted.</strong> Remaining projects were skipped.</div>\n",
        );
    }

    html.push_str(&summary_cards(report));

    let total = report.results.len();
    for (i, result) in report.results.iter().enumerate() {
        html.push_str(&project_card(i + 1, total, result));
    }

    let _ = write!(
        html,
        "</main>\n<footer>Generated by npmscan {} &middot; {}</footer>\n</body>\n</html>\n",
        escape_html(env!("CARGO_PKG_VERSION")),
        scan_id
    );
    html
}

fn summary_cards(report: &ScanReport) -> String {
    let (tool_class, tool_text) = if report.audit_tool_enabled {
        ("is-success", "Enabled")
    } else {
        ("is-warning", "Demo mode")
    };
    let counts = report.severity_counts();

    format!(
        r#"<section class="cards">
<div class="card"><p class="heading">Projects</p><p class="value">{projects}</p></div>
<div class="card"><p class="heading">Successful</p><p class="value">{success}</p></div>
<div class="card"><p class="heading">Failed</p><p class="value">{failed}</p></div>
<div class="card"><p class="heading">Vulnerabilities</p><p class="value">{vulns}</p><p class="heading">C {c} &middot; H {h} &middot; M {m} &middot; L {l}</p></div>
<div class="card"><p class="heading">Audit tool</p><p class="value"><span class="tag {tool_class}">{tool_text}</span></p></div>
</section>
"#,
        projects = report.project_count,
        success = report.success_count,
        failed = report.failure_count,
        vulns = counts.total(),
        c = counts.critical,
        h = counts.high,
        m = counts.moderate,
        l = counts.low,
    )
}

fn project_card(index: usize, total: usize, result: &ProjectScanResult) -> String {
    let status_class = match result.status {
        ScanStatus::Success => "is-success",
        ScanStatus::Failed => "is-danger",
        ScanStatus::InProgress => "is-info",
    };

    let mut steps = String::new();
    let mut errors = String::new();
    for (label, outcome) in [
        ("Node Modules", &result.remove_cache),
        ("npm install", &result.install),
        ("Security Scan", &result.audit),
    ] {
        steps.push_str(&step_badge(label, outcome));
        if let Some(error) = &outcome.error {
            let _ = writeln!(
                errors,
                "<p class=\"step-error\">{}: {}</p>",
                escape_html(label),
                escape_html(error)
            );
        }
    }

    format!(
        r#"<article class="project">
<header><h2>{index}/{total}. {path}</h2><span class="tag {status_class}">{status}</span></header>
<div class="body">
<div class="meta"><span>Duration: <strong>{duration}</strong></span><span>Started: <strong>{started}</strong></span></div>
<div class="steps">{steps}</div>
{errors}{vulns}</div>
</article>
"#,
        path = escape_html(&result.project_path.display().to_string()),
        status = escape_html(&result.status.to_string()),
        duration = escape_html(&format_duration(result.duration)),
        started = escape_html(&result.start_time.format("%H:%M:%S").to_string()),
        vulns = vulnerabilities_section(&result.vulnerabilities, result.audit.succeeded),
    )
}

fn step_badge(label: &str, outcome: &ActionOutcome) -> String {
    let (class, mark) = if outcome.succeeded {
        ("is-success", "&#10003;")
    } else if outcome.error.is_some() {
        ("is-danger", "&#10007;")
    } else {
        ("is-light", "&ndash;")
    };
    format!(
        "<span><span class=\"tag is-dark\">{}</span> <span class=\"tag {class}\">{mark}</span></span>",
        escape_html(label)
    )
}

fn vulnerabilities_section(vulnerabilities: &[Vulnerability], audit_succeeded: bool) -> String {
    if vulnerabilities.is_empty() {
        return if audit_succeeded {
            "<div class=\"notice\"><strong>No vulnerabilities detected</strong></div>\n".to_owned()
        } else {
            String::new()
        };
    }

    let mut html = format!(
        "<h3>Security Vulnerabilities ({} found)</h3>\n",
        vulnerabilities.len()
    );
    for vuln in vulnerabilities {
        let (marker_class, marker) = if vuln.fixed {
            ("is-success", "FIXED")
        } else {
            ("is-warning", "PENDING")
        };
        let _ = writeln!(
            html,
            r#"<div class="vuln sev-{sev}"><div><span class="tag {sev_class}">{sev_upper}</span> <strong>{package}</strong><p class="desc">{description}</p></div><span class="tag {marker_class}">{marker}</span></div>"#,
            sev = vuln.severity.as_str(),
            sev_class = severity_class(vuln.severity),
            sev_upper = vuln.severity.as_str().to_uppercase(),
            package = escape_html(&vuln.package),
            description = escape_html(&vuln.description),
        );
    }
    html
}

fn severity_class(severity: Severity) -> &'static str {
    match severity {
        Severity::Critical | Severity::High => "is-danger",
        Severity::Moderate => "is-warning",
        Severity::Low => "is-info",
    }
}
