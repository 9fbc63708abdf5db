//! 스캐너 설정
//!
//! [`ScannerConfig`]는 core의 [`NpmscanConfig`]에서 스캔 파이프라인에 필요한 값만
//! 추려 타입을 구체화한 설정입니다 (초 단위 정수 → `Duration`, 0 → `None`).
//!
//! # 사용 예시
//!
//! ```
//! use npmscan_scanner::ScannerConfigBuilder;
//!
//! let config = ScannerConfigBuilder::new()
//!     .step_timeout_secs(60)
//!     .audit_level("high")
//!     .build()
//!     .unwrap();
//! assert_eq!(config.step_timeout.map(|t| t.as_secs()), Some(60));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use npmscan_core::config::NpmscanConfig;

use crate::error::ScannerError;

const VALID_AUDIT_LEVELS: [&str; 5] = ["info", "low", "moderate", "high", "critical"];

/// 스캔 파이프라인 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// 외부 프로세스 하나당 제한 시간 (None이면 무제한)
    pub step_timeout: Option<Duration>,
    /// 심볼릭 링크 추적 여부
    pub follow_symlinks: bool,
    /// 최대 탐색 깊이 (None이면 무제한)
    pub max_depth: Option<usize>,
    /// 감사 래퍼 명령 이름
    pub tool: String,
    /// 감사 래퍼 npm 패키지
    pub tool_package: String,
    /// 패키지 매니저 명령
    pub package_manager: String,
    /// `--audit-level` 값
    pub audit_level: String,
    /// "취약점 발견" 종료 코드
    pub findings_exit_code: i32,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::from_core(&NpmscanConfig::default())
    }
}

impl ScannerConfig {
    /// core 설정에서 스캐너 설정을 생성합니다.
    pub fn from_core(core: &NpmscanConfig) -> Self {
        let step_timeout = match core.scan.step_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let max_depth = match core.scan.max_depth {
            0 => None,
            depth => Some(depth),
        };

        Self {
            step_timeout,
            follow_symlinks: core.scan.follow_symlinks,
            max_depth,
            tool: core.audit.tool.clone(),
            tool_package: core.audit.tool_package.clone(),
            package_manager: core.audit.package_manager.clone(),
            audit_level: core.audit.audit_level.clone(),
            findings_exit_code: core.audit.findings_exit_code,
        }
    }

    /// 설정 값의 유효성을 검증합니다.
    ///
    /// # 검증 규칙
    ///
    /// - `tool`, `tool_package`, `package_manager`: 비어있으면 안 되며 공백을 포함할 수 없음
    /// - `audit_level`: info, low, moderate, high, critical 중 하나
    /// - `findings_exit_code`: 0이 아닌 값
    /// - `step_timeout`: 지정 시 0보다 커야 함
    pub fn validate(&self) -> Result<(), ScannerError> {
        for (field, value) in [
            ("tool", &self.tool),
            ("tool_package", &self.tool_package),
            ("package_manager", &self.package_manager),
        ] {
            if value.is_empty() {
                return Err(ScannerError::Config {
                    field: field.to_owned(),
                    reason: "must not be empty".to_owned(),
                });
            }
            if value.chars().any(char::is_whitespace) {
                return Err(ScannerError::Config {
                    field: field.to_owned(),
                    reason: format!("'{value}' must be a single command word"),
                });
            }
        }

        if !VALID_AUDIT_LEVELS.contains(&self.audit_level.as_str()) {
            return Err(ScannerError::Config {
                field: "audit_level".to_owned(),
                reason: format!("must be one of: {}", VALID_AUDIT_LEVELS.join(", ")),
            });
        }

        if self.findings_exit_code == 0 {
            return Err(ScannerError::Config {
                field: "findings_exit_code".to_owned(),
                reason: "must be non-zero".to_owned(),
            });
        }

        if self.step_timeout.is_some_and(|t| t.is_zero()) {
            return Err(ScannerError::Config {
                field: "step_timeout".to_owned(),
                reason: "use None to disable the timeout".to_owned(),
            });
        }

        Ok(())
    }
}

/// [`ScannerConfig`] 빌더
#[derive(Default)]
pub struct ScannerConfigBuilder {
    config: ScannerConfig,
}

impl ScannerConfigBuilder {
    /// 기본값을 가진 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 단계별 제한 시간(초)을 설정합니다. 0이면 무제한입니다.
    pub fn step_timeout_secs(mut self, secs: u64) -> Self {
        self.config.step_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    /// 심볼릭 링크 추적 여부를 설정합니다.
    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.follow_symlinks = follow;
        self
    }

    /// 최대 탐색 깊이를 설정합니다.
    pub fn max_depth(mut self, depth: Option<usize>) -> Self {
        self.config.max_depth = depth;
        self
    }

    /// 감사 래퍼 명령을 설정합니다.
    pub fn tool(mut self, tool: impl Into<String>) -> Self {
        self.config.tool = tool.into();
        self
    }

    /// 감사 래퍼 npm 패키지를 설정합니다.
    pub fn tool_package(mut self, package: impl Into<String>) -> Self {
        self.config.tool_package = package.into();
        self
    }

    /// 패키지 매니저 명령을 설정합니다.
    pub fn package_manager(mut self, program: impl Into<String>) -> Self {
        self.config.package_manager = program.into();
        self
    }

    /// `--audit-level` 값을 설정합니다.
    pub fn audit_level(mut self, level: impl Into<String>) -> Self {
        self.config.audit_level = level.into();
        self
    }

    /// "취약점 발견" 종료 코드를 설정합니다.
    pub fn findings_exit_code(mut self, code: i32) -> Self {
        self.config.findings_exit_code = code;
        self
    }

    /// 설정을 검증하고 빌드합니다.
    ///
    /// # Errors
    ///
    /// 유효성 검증 실패 시 `ScannerError::Config` 반환
    pub fn build(self) -> Result<ScannerConfig, ScannerError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
