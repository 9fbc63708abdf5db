//! 설정 관리: npmscan.toml 파싱 및 런타임 설정
//!
//! [`NpmscanConfig`]는 모든 구성 요소의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`NPMSCAN_SCAN_STEP_TIMEOUT_SECS=60` 형식)
//! 3. 설정 파일 (`npmscan.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), npmscan_core::error::NpmscanError> {
//! use npmscan_core::config::NpmscanConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = NpmscanConfig::load("npmscan.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = NpmscanConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, NpmscanError};

/// 설정 파일 기본 이름
pub const DEFAULT_CONFIG_FILE: &str = "npmscan.toml";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const VALID_LOG_FORMATS: [&str; 2] = ["json", "pretty"];
const VALID_AUDIT_LEVELS: [&str; 5] = ["info", "low", "moderate", "high", "critical"];

/// npmscan 통합 설정
///
/// `npmscan.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpmscanConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 스캔 설정
    #[serde(default)]
    pub scan: ScanConfig,
    /// 감사 도구 설정
    #[serde(default)]
    pub audit: AuditConfig,
}

impl NpmscanConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, NpmscanError> {
        let (config, ignored) = Self::load_unvalidated(path, true).await?;
        ignored.iter().for_each(IgnoredEnvVar::warn);
        config.validate()?;
        Ok(config)
    }

    /// 파일이 없으면 기본값에서 시작합니다.
    ///
    /// 기본 경로(`npmscan.toml`)처럼 선택적인 설정 파일에 사용합니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, NpmscanError> {
        let (config, ignored) = Self::load_unvalidated(path, false).await?;
        ignored.iter().for_each(IgnoredEnvVar::warn);
        config.validate()?;
        Ok(config)
    }

    /// 파일(또는 기본값)과 환경변수 레이어만 합칩니다. 검증은 하지 않습니다.
    ///
    /// 상위 레이어(CLI 인자)를 더 적용한 뒤 [`validate`](Self::validate)를
    /// 한 번 호출하는 쪽에서 사용합니다. 해석하지 못한 환경변수는 로그 대신
    /// 목록으로 돌려주므로 로깅 초기화 이후에 보고할 수 있습니다.
    pub async fn load_unvalidated(
        path: impl AsRef<Path>,
        required: bool,
    ) -> Result<(Self, Vec<IgnoredEnvVar>), NpmscanError> {
        let path = path.as_ref();
        let mut config = match Self::read_file(path).await {
            Ok(config) => config,
            Err(NpmscanError::Config(ConfigError::FileNotFound { .. })) if !required => {
                tracing::debug!(path = %path.display(), "config file not found, using defaults");
                Self::default()
            }
            Err(e) => return Err(e),
        };
        let ignored = config.apply_env_overrides();
        Ok((config, ignored))
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, NpmscanError> {
        let config = Self::read_file(path.as_ref()).await?;
        config.validate()?;
        Ok(config)
    }

    async fn read_file(path: &Path) -> Result<Self, NpmscanError> {
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                NpmscanError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                NpmscanError::Io(e)
            }
        })?;
        Self::parse(&content)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, NpmscanError> {
        toml::from_str(toml_str).map_err(|e| {
            NpmscanError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `NPMSCAN_{SECTION}_{FIELD}`
    /// 예: `NPMSCAN_AUDIT_TOOL=safe-chain`
    ///
    /// 값을 해석할 수 없는 변수는 무시하고 반환 목록에 담습니다.
    pub fn apply_env_overrides(&mut self) -> Vec<IgnoredEnvVar> {
        let mut ignored = Vec::new();

        // General
        override_string(&mut self.general.log_level, "NPMSCAN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "NPMSCAN_GENERAL_LOG_FORMAT");

        // Scan
        override_string(&mut self.scan.reports_dir, "NPMSCAN_SCAN_REPORTS_DIR");
        override_parsed(
            &mut self.scan.step_timeout_secs,
            "NPMSCAN_SCAN_STEP_TIMEOUT_SECS",
            &mut ignored,
        );
        override_parsed(
            &mut self.scan.follow_symlinks,
            "NPMSCAN_SCAN_FOLLOW_SYMLINKS",
            &mut ignored,
        );
        override_parsed(
            &mut self.scan.max_depth,
            "NPMSCAN_SCAN_MAX_DEPTH",
            &mut ignored,
        );

        // Audit
        override_string(&mut self.audit.tool, "NPMSCAN_AUDIT_TOOL");
        override_string(&mut self.audit.tool_package, "NPMSCAN_AUDIT_TOOL_PACKAGE");
        override_string(
            &mut self.audit.package_manager,
            "NPMSCAN_AUDIT_PACKAGE_MANAGER",
        );
        override_string(&mut self.audit.audit_level, "NPMSCAN_AUDIT_AUDIT_LEVEL");
        override_parsed(
            &mut self.audit.findings_exit_code,
            "NPMSCAN_AUDIT_FINDINGS_EXIT_CODE",
            &mut ignored,
        );

        ignored
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), NpmscanError> {
        if !VALID_LOG_LEVELS.contains(&self.general.log_level.as_str()) {
            return Err(invalid(
                "general.log_level",
                format!("must be one of: {}", VALID_LOG_LEVELS.join(", ")),
            ));
        }

        if !VALID_LOG_FORMATS.contains(&self.general.log_format.as_str()) {
            return Err(invalid(
                "general.log_format",
                format!("must be one of: {}", VALID_LOG_FORMATS.join(", ")),
            ));
        }

        if self.scan.reports_dir.is_empty() {
            return Err(invalid("scan.reports_dir", "must not be empty".to_owned()));
        }

        if Path::new(&self.scan.reports_dir)
            .components()
            .any(|c| c == std::path::Component::ParentDir)
        {
            return Err(invalid(
                "scan.reports_dir",
                "must not contain path traversal pattern '..'".to_owned(),
            ));
        }

        if self.audit.tool.trim().is_empty() {
            return Err(invalid("audit.tool", "must not be empty".to_owned()));
        }

        if self.audit.package_manager.trim().is_empty() {
            return Err(invalid(
                "audit.package_manager",
                "must not be empty".to_owned(),
            ));
        }

        if !VALID_AUDIT_LEVELS.contains(&self.audit.audit_level.as_str()) {
            return Err(invalid(
                "audit.audit_level",
                format!("must be one of: {}", VALID_AUDIT_LEVELS.join(", ")),
            ));
        }

        if self.audit.findings_exit_code == 0 {
            return Err(invalid(
                "audit.findings_exit_code",
                "must be non-zero (0 already means a clean audit)".to_owned(),
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: String) -> NpmscanError {
    ConfigError::InvalidValue {
        field: field.to_owned(),
        reason,
    }
    .into()
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 스캔 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// 리포트 출력 디렉토리 (작업 디렉토리 기준)
    pub reports_dir: String,
    /// 외부 프로세스 하나당 제한 시간 (초). 0이면 제한 없음
    pub step_timeout_secs: u64,
    /// 디렉토리 탐색 시 심볼릭 링크 추적 여부
    pub follow_symlinks: bool,
    /// 최대 탐색 깊이. 0이면 제한 없음
    pub max_depth: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            reports_dir: "reports".to_owned(),
            step_timeout_secs: 900,
            follow_symlinks: false,
            max_depth: 0,
        }
    }
}

/// 감사 도구 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// 감사 래퍼 명령 이름
    pub tool: String,
    /// 감사 래퍼 설치 시 사용할 npm 패키지
    pub tool_package: String,
    /// 패키지 매니저 명령
    pub package_manager: String,
    /// `npm audit --audit-level` 값
    pub audit_level: String,
    /// "취약점 발견"을 의미하는 감사 명령 종료 코드
    pub findings_exit_code: i32,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            tool: "safe-chain".to_owned(),
            tool_package: "safe-chain-test".to_owned(),
            package_manager: "npm".to_owned(),
            audit_level: "moderate".to_owned(),
            findings_exit_code: 1,
        }
    }
}

/// 타입에 맞게 해석하지 못해 무시된 환경변수
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredEnvVar {
    /// 환경변수 이름
    pub key: &'static str,
    /// 원래 값
    pub value: String,
    /// 기대한 타입 이름
    pub expected: &'static str,
}

impl IgnoredEnvVar {
    /// `warn` 레벨로 보고합니다.
    pub fn warn(&self) {
        warn!(
            env_key = self.key,
            value = self.value.as_str(),
            expected = self.expected,
            "failed to parse env var, ignoring"
        );
    }
}

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_parsed<T: FromStr>(
    target: &mut T,
    env_key: &'static str,
    ignored: &mut Vec<IgnoredEnvVar>,
) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<T>() {
            Ok(parsed) => *target = parsed,
            Err(_) => ignored.push(IgnoredEnvVar {
                key: env_key,
                value: val,
                expected: std::any::type_name::<T>(),
            }),
        }
    }
}
