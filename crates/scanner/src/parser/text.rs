//! 텍스트 휴리스틱 감사 파서
//!
//! [`TextAuditParser`]는 두 번의 패스와 중복 제거로 동작합니다.
//!
//! 1. **심각도 라인**: 출력에 `vulnerabilities`가 있을 때만 수행합니다.
//!    `Severity: high` 같은 라인에서 취약점을 만들고, 이후 `node_modules/<pkg>`를
//!    포함한 라인이 나오면 가장 최근 취약점의 패키지 이름을 갱신합니다.
//! 2. **요약 라인**: `1 moderate severity vulnerability found`처럼
//!    ` vulnerabilit`와 심각도/`found` 단어를 함께 포함한 라인에서 취약점을 만듭니다.
//!
//! 마지막으로 `(severity, package, description)`이 같은 항목을 제거합니다
//! (처음 나온 항목 유지, 순서 보존).
//!
//! # 출력 예시
//!
//! ```text
//! # npm audit report
//!
//! lodash  <=4.17.20
//! Severity: high
//! Prototype Pollution - https://github.com/advisories/GHSA-xxxx
//! fix available via `npm audit fix`
//! node_modules/lodash
//!
//! 1 high severity vulnerability
//! ```

use std::collections::HashSet;

use tracing::debug;

use npmscan_core::pipeline::AuditOutputParser;
use npmscan_core::types::{Severity, Vulnerability};

/// 심각도 라인에서 만든 취약점의 기본 패키지 이름
pub const DETECTED_PACKAGE: &str = "detected-package";

/// 요약 라인에서 만든 취약점의 패키지 이름
pub const SUMMARY_PACKAGE: &str = "npm-audit-detected";

const SEVERITY_MARKER: &str = "Severity: ";
const PACKAGE_MARKER: &str = "node_modules/";
const SUMMARY_MARKER: &str = " vulnerabilit";
const SUMMARY_HINTS: [&str; 5] = ["found", "moderate", "high", "critical", "low"];
const SUMMARY_SEVERITIES: [&str; 4] = ["low", "moderate", "high", "critical"];

/// npm audit 텍스트 출력 파서
#[derive(Debug, Clone, Copy, Default)]
pub struct TextAuditParser;

impl TextAuditParser {
    /// 새 파서를 생성합니다.
    pub fn new() -> Self {
        Self
    }

    fn severity_lines(output: &str, found: &mut Vec<Vulnerability>) {
        if !output.contains("vulnerabilities") {
            return;
        }

        // 마지막 심각도 라인이 취약점을 만들었을 때만 패키지 라인을 적용
        let mut accepting = false;
        for line in output.lines().map(str::trim) {
            if let Some(idx) = line.find(SEVERITY_MARKER) {
                let token = line[idx + SEVERITY_MARKER.len()..]
                    .split_whitespace()
                    .next()
                    .unwrap_or_default();
                match Severity::from_str_loose(token) {
                    Some(severity) => {
                        found.push(Vulnerability::new(
                            severity,
                            DETECTED_PACKAGE,
                            format!("{severity} severity vulnerability found"),
                        ));
                        accepting = true;
                    }
                    None => {
                        debug!(token, "ignoring unknown severity token");
                        accepting = false;
                    }
                }
            }

            if !accepting {
                continue;
            }
            if let Some(idx) = line.find(PACKAGE_MARKER) {
                if let Some(name) = package_after_marker(&line[idx + PACKAGE_MARKER.len()..]) {
                    if let Some(last) = found.last_mut() {
                        last.package = name.to_owned();
                    }
                }
            }
        }
    }

    fn summary_lines(output: &str, found: &mut Vec<Vulnerability>) {
        if !output.contains(SUMMARY_MARKER) {
            return;
        }

        for line in output.lines() {
            if !line.contains(SUMMARY_MARKER) || !SUMMARY_HINTS.iter().any(|h| line.contains(h)) {
                continue;
            }

            let hit = line
                .split_whitespace()
                .enumerate()
                .skip(1)
                .find(|(_, word)| SUMMARY_SEVERITIES.contains(word))
                .and_then(|(_, word)| Severity::from_str_loose(word));

            if let Some(severity) = hit {
                found.push(Vulnerability::new(
                    severity,
                    SUMMARY_PACKAGE,
                    format!("{severity} severity vulnerability detected via npm audit"),
                ));
            }
        }
    }
}

impl AuditOutputParser for TextAuditParser {
    fn name(&self) -> &str {
        "npm-audit-text"
    }

    fn parse(&self, output: &str) -> Vec<Vulnerability> {
        let mut found = Vec::new();
        Self::severity_lines(output, &mut found);
        Self::summary_lines(output, &mut found);
        dedup(found)
    }
}

/// `node_modules/` 뒤의 첫 토큰에서 패키지 이름을 꺼냅니다.
///
/// 중첩 경로(`a/node_modules/b`)는 가장 안쪽 패키지를 사용합니다.
fn package_after_marker(rest: &str) -> Option<&str> {
    let token = rest.split(char::is_whitespace).next()?;
    let name = token.rsplit(PACKAGE_MARKER).next().unwrap_or(token);
    (!name.is_empty()).then_some(name)
}

fn dedup(found: Vec<Vulnerability>) -> Vec<Vulnerability> {
    let mut seen = HashSet::new();
    found
        .into_iter()
        .filter(|v| seen.insert((v.severity, v.package.clone(), v.description.clone())))
        .collect()
}
