//! 실행 단위 리포트 집계
//!
//! [`ReportAggregator`]는 `init → append × N → finalize` 생명주기를 가집니다.
//! 호출자가 소유하는 명시적 값이며, 전역 상태나 잠금을 사용하지 않습니다.
//! `finalize`가 반환하는 [`ScanReport`]는 닫힌 리포트로, 렌더러가 읽기만 합니다.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use npmscan_core::types::{ProjectScanResult, ScanStatus, Severity, duration_ms};

/// 심각도별 취약점 개수
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub critical: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl SeverityCounts {
    /// 전체 취약점 수를 반환합니다.
    pub fn total(&self) -> usize {
        self.critical + self.high + self.moderate + self.low
    }

    /// 심각도 하나의 개수를 반환합니다.
    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::Critical => self.critical,
            Severity::High => self.high,
            Severity::Moderate => self.moderate,
            Severity::Low => self.low,
        }
    }
}

/// 완료된 스캔 실행 리포트
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// 실행 식별자 (`scan_<unix seconds>`)
    pub scan_id: String,
    /// 시작 시각
    pub start_time: DateTime<Utc>,
    /// 종료 시각
    pub end_time: DateTime<Utc>,
    /// 전체 소요 시간
    #[serde(rename = "total_duration_ms", with = "duration_ms")]
    pub total_duration: Duration,
    /// 프로젝트별 결과 (탐색 순서)
    pub results: Vec<ProjectScanResult>,
    /// 처리한 프로젝트 수
    pub project_count: usize,
    /// 성공한 프로젝트 수
    pub success_count: usize,
    /// 실패한 프로젝트 수
    pub failure_count: usize,
    /// 감사 도구 사용 여부 (false면 데모 모드)
    pub audit_tool_enabled: bool,
    /// 인터럽트로 중단되었는지 여부
    pub interrupted: bool,
}

impl ScanReport {
    /// 모든 프로젝트의 취약점 수 합계
    pub fn total_vulnerabilities(&self) -> usize {
        self.results.iter().map(|r| r.vulnerabilities.len()).sum()
    }

    /// 자동 수정된 취약점 수
    pub fn fixed_vulnerabilities(&self) -> usize {
        self.results
            .iter()
            .flat_map(|r| &r.vulnerabilities)
            .filter(|v| v.fixed)
            .count()
    }

    /// 심각도별 취약점 개수
    pub fn severity_counts(&self) -> SeverityCounts {
        let mut counts = SeverityCounts::default();
        for vuln in self.results.iter().flat_map(|r| &r.vulnerabilities) {
            match vuln.severity {
                Severity::Critical => counts.critical += 1,
                Severity::High => counts.high += 1,
                Severity::Moderate => counts.moderate += 1,
                Severity::Low => counts.low += 1,
            }
        }
        counts
    }

    /// 실패한 프로젝트 결과
    pub fn failed_results(&self) -> impl Iterator<Item = &ProjectScanResult> {
        self.results.iter().filter(|r| r.status == ScanStatus::Failed)
    }
}

/// 리포트 집계기
#[derive(Debug)]
pub struct ReportAggregator {
    scan_id: String,
    start_time: DateTime<Utc>,
    results: Vec<ProjectScanResult>,
    success_count: usize,
    failure_count: usize,
    audit_tool_enabled: bool,
    interrupted: bool,
}

impl ReportAggregator {
    /// 새 실행을 시작합니다. 시작 시각과 scan id를 기록하고 카운터를 0으로 둡니다.
    pub fn init() -> Self {
        let start_time = Utc::now();
        let scan_id = format!("scan_{}", start_time.timestamp());
        info!(scan_id = %scan_id, "scan report initialized");
        Self {
            scan_id,
            start_time,
            results: Vec::new(),
            success_count: 0,
            failure_count: 0,
            audit_tool_enabled: false,
            interrupted: false,
        }
    }

    /// scan id를 반환합니다.
    pub fn scan_id(&self) -> &str {
        &self.scan_id
    }

    /// 감사 도구 사용 여부를 기록합니다.
    pub fn set_audit_tool_enabled(&mut self, enabled: bool) {
        self.audit_tool_enabled = enabled;
    }

    /// 완료된 프로젝트 결과를 추가합니다.
    pub fn append(&mut self, result: ProjectScanResult) {
        if result.status == ScanStatus::Success {
            self.success_count += 1;
        } else {
            self.failure_count += 1;
        }
        debug!(
            project = %result.project_path.display(),
            status = %result.status,
            "project result appended"
        );
        self.results.push(result);
    }

    /// 인터럽트로 중단되었음을 기록합니다.
    pub fn mark_interrupted(&mut self) {
        self.interrupted = true;
    }

    /// 지금까지 추가된 프로젝트 수
    pub fn project_count(&self) -> usize {
        self.results.len()
    }

    /// 종료 시각과 전체 소요 시간을 기록하고 리포트를 닫습니다.
    pub fn finalize(self) -> ScanReport {
        let end_time = Utc::now();
        let total_duration = (end_time - self.start_time).to_std().unwrap_or_default();
        let project_count = self.results.len();

        info!(
            scan_id = %self.scan_id,
            projects = project_count,
            succeeded = self.success_count,
            failed = self.failure_count,
            interrupted = self.interrupted,
            "scan report finalized"
        );

        ScanReport {
            scan_id: self.scan_id,
            start_time: self.start_time,
            end_time,
            total_duration,
            results: self.results,
            project_count,
            success_count: self.success_count,
            failure_count: self.failure_count,
            audit_tool_enabled: self.audit_tool_enabled,
            interrupted: self.interrupted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use npmscan_core::types::Vulnerability;

    fn result(path: &str, status: ScanStatus) -> ProjectScanResult {
        let mut r = ProjectScanResult::begin(path);
        r.finish(status);
        r
    }

    #[test]
    fn init_has_scan_id_and_zero_counters() {
        let agg = ReportAggregator::init();
        assert!(agg.scan_id().starts_with("scan_"));
        assert!(agg.scan_id()["scan_".len()..].parse::<i64>().is_ok());
        assert_eq!(agg.project_count(), 0);

        let report = agg.finalize();
        assert_eq!(report.project_count, 0);
        assert_eq!(report.success_count, 0);
        assert_eq!(report.failure_count, 0);
        assert!(!report.interrupted);
    }

    #[test]
    fn append_counts_success_and_failure() {
        let mut agg = ReportAggregator::init();
        agg.append(result("/a", ScanStatus::Success));
        agg.append(result("/b", ScanStatus::Failed));
        agg.append(result("/c", ScanStatus::Success));

        let report = agg.finalize();
        assert_eq!(report.project_count, 3);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failure_count, 1);
        assert_eq!(report.failed_results().count(), 1);
    }

    #[test]
    fn append_preserves_order() {
        let mut agg = ReportAggregator::init();
        for p in ["/z", "/a", "/m"] {
            agg.append(result(p, ScanStatus::Success));
        }
        let report = agg.finalize();
        let paths: Vec<_> = report
            .results
            .iter()
            .map(|r| r.project_path.to_string_lossy().into_owned())
            .collect();
        assert_eq!(paths, vec!["/z", "/a", "/m"]);
    }

    #[test]
    fn finalize_stamps_end_time() {
        let agg = ReportAggregator::init();
        let report = agg.finalize();
        assert!(report.end_time >= report.start_time);
    }

    #[test]
    fn audit_tool_flag_and_interrupt_are_recorded() {
        let mut agg = ReportAggregator::init();
        agg.set_audit_tool_enabled(true);
        agg.mark_interrupted();
        let report = agg.finalize();
        assert!(report.audit_tool_enabled);
        assert!(report.interrupted);
    }

    #[test]
    fn vulnerability_totals() {
        let mut r = result("/a", ScanStatus::Success);
        let mut fixed = Vulnerability::new(Severity::High, "lodash", "x");
        fixed.fixed = true;
        r.vulnerabilities.push(fixed);
        r.vulnerabilities
            .push(Vulnerability::new(Severity::Low, "minimist", "y"));

        let mut agg = ReportAggregator::init();
        agg.append(r);
        let report = agg.finalize();

        assert_eq!(report.total_vulnerabilities(), 2);
        assert_eq!(report.fixed_vulnerabilities(), 1);
        let counts = report.severity_counts();
        assert_eq!(counts.high, 1);
        assert_eq!(counts.low, 1);
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.get(Severity::Critical), 0);
    }

    #[test]
    fn report_json_field_names() {
        let report = ReportAggregator::init().finalize();
        let value = serde_json::to_value(&report).unwrap();
        assert!(value["scan_id"].is_string());
        assert!(value["total_duration_ms"].is_u64());
        assert!(value["results"].is_array());
        assert_eq!(value["audit_tool_enabled"], false);
        assert_eq!(value["interrupted"], false);
    }
}
