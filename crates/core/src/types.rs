//! 도메인 타입: 시스템 전역에서 사용되는 공통 타입
//!
//! 스캐너, 리포트 렌더러, CLI가 공유하는 데이터 구조를 정의합니다.
//! JSON 리포트의 필드 이름과 순서는 이 구조체의 선언 순서를 따릅니다.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 취약점 심각도
///
/// npm audit의 네 단계 분류를 따릅니다.
/// `Ord` 구현으로 비교가 가능합니다 (`Low < Moderate < High < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도
    Low,
    /// 중간 심각도
    Moderate,
    /// 높은 심각도
    High,
    /// 치명적
    Critical,
}

impl Severity {
    /// 모든 심각도 (낮은 순)
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Moderate,
        Severity::High,
        Severity::Critical,
    ];

    /// 문자열에서 심각도를 파싱합니다.
    ///
    /// 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "moderate" => Some(Self::Moderate),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// 소문자 이름을 반환합니다.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 감사 출력에서 추출한 취약점
///
/// 파서만 생성하며, 이후에는 `fixed` 플래그만 변경될 수 있습니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    /// 심각도
    pub severity: Severity,
    /// 패키지 이름 (식별 불가 시 placeholder)
    pub package: String,
    /// 설명
    pub description: String,
    /// 자동 수정 적용 여부
    pub fixed: bool,
}

impl Vulnerability {
    /// 수정되지 않은 취약점을 생성합니다.
    pub fn new(
        severity: Severity,
        package: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            package: package.into(),
            description: description.into(),
            fixed: false,
        }
    }
}

impl fmt::Display for Vulnerability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.package, self.description)
    }
}

/// 파이프라인 단계 하나의 결과
///
/// `Default` 값(`succeeded = false`, 에러 없음, 빈 출력)은 "실행되지 않음"을 뜻합니다.
/// 불변식: `succeeded`가 true이면 `error`는 `None`입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// 성공 여부
    pub succeeded: bool,
    /// 실패 사유
    pub error: Option<String>,
    /// 수집된 출력
    pub output: String,
}

impl ActionOutcome {
    /// 성공 결과를 생성합니다.
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            succeeded: true,
            error: None,
            output: output.into(),
        }
    }

    /// 실패 결과를 생성합니다.
    pub fn failure(error: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            error: Some(error.into()),
            output: output.into(),
        }
    }

    /// 단계가 실행되었는지 (성공 또는 실패가 기록되었는지) 반환합니다.
    pub fn was_run(&self) -> bool {
        self.succeeded || self.error.is_some()
    }
}

/// 프로젝트 스캔 상태
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStatus {
    /// 진행 중
    #[default]
    InProgress,
    /// 모든 단계 성공
    Success,
    /// 어느 단계에서 실패
    Failed,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InProgress => write!(f, "in_progress"),
            Self::Success => write!(f, "success"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// 프로젝트 하나의 파이프라인 실행 결과
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectScanResult {
    /// 프로젝트 디렉토리
    pub project_path: PathBuf,
    /// 시작 시각
    pub start_time: DateTime<Utc>,
    /// 종료 시각 (진행 중이면 None)
    pub end_time: Option<DateTime<Utc>>,
    /// 소요 시간
    #[serde(rename = "duration_ms", with = "duration_ms")]
    pub duration: Duration,
    /// 최종 상태
    pub status: ScanStatus,
    /// node_modules 삭제 결과
    pub remove_cache: ActionOutcome,
    /// 의존성 설치 결과
    pub install: ActionOutcome,
    /// 보안 감사 결과
    pub audit: ActionOutcome,
    /// 발견된 취약점 (중복 제거, 발견 순서 유지)
    pub vulnerabilities: Vec<Vulnerability>,
}

impl ProjectScanResult {
    /// 진행 중 상태의 결과를 생성합니다.
    pub fn begin(project_path: impl Into<PathBuf>) -> Self {
        Self {
            project_path: project_path.into(),
            start_time: Utc::now(),
            end_time: None,
            duration: Duration::ZERO,
            status: ScanStatus::InProgress,
            remove_cache: ActionOutcome::default(),
            install: ActionOutcome::default(),
            audit: ActionOutcome::default(),
            vulnerabilities: Vec::new(),
        }
    }

    /// 최종 상태와 종료 시각, 소요 시간을 기록합니다.
    pub fn finish(&mut self, status: ScanStatus) {
        let end = Utc::now();
        self.duration = (end - self.start_time).to_std().unwrap_or_default();
        self.end_time = Some(end);
        self.status = status;
    }

    /// 성공 여부
    pub fn is_success(&self) -> bool {
        self.status == ScanStatus::Success
    }

    /// 수정되지 않은 취약점 수
    pub fn unfixed_count(&self) -> usize {
        self.vulnerabilities.iter().filter(|v| !v.fixed).count()
    }
}

impl fmt::Display for ProjectScanResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}, {} vulnerabilities)",
            self.project_path.display(),
            self.status,
            self.vulnerabilities.len(),
        )
    }
}

/// `Duration`을 정수 밀리초로 직렬화합니다.
pub mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(value.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
