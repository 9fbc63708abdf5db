//! 스캐너 에러 타입
//!
//! [`ScannerError`]는 실행 전체를 중단시키는 에러(탐색 실패, 설정 오류, 감사 도구 설치 실패)를,
//! [`StepError`]는 프로젝트 하나의 파이프라인 단계 실패를 나타냅니다.
//!
//! `StepError`는 해당 프로젝트의 [`ActionOutcome`](npmscan_core::types::ActionOutcome)에
//! 기록될 뿐 상위로 전파되지 않습니다. `ScannerError`는
//! `From<ScannerError> for NpmscanError` 구현으로 `?` 연산자를 통해 전파됩니다.

use npmscan_core::error::{ConfigError, NpmscanError, ScanError};

/// 스캐너 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    /// 디렉토리 탐색 실패
    #[error("discovery error: {path}: {reason}")]
    Discovery {
        /// 탐색 대상 경로
        path: String,
        /// 실패 사유
        reason: String,
    },

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 감사 도구 설치 실패
    #[error("audit tool setup error: {0}")]
    Setup(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl From<ScannerError> for NpmscanError {
    fn from(err: ScannerError) -> Self {
        match err {
            ScannerError::Discovery { path, reason } => {
                NpmscanError::Scan(ScanError::Discovery(format!("{path}: {reason}")))
            }
            ScannerError::Config { field, reason } => {
                NpmscanError::Config(ConfigError::InvalidValue { field, reason })
            }
            ScannerError::Setup(msg) => NpmscanError::Scan(ScanError::Setup(msg)),
            ScannerError::Io { source, .. } => NpmscanError::Io(source),
        }
    }
}

/// 파이프라인 단계 실패
///
/// 한 프로젝트 안에서만 의미가 있으며, 실패한 단계 이후의 단계는 실행되지 않습니다.
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// 프로세스 실행 자체가 실패 (명령 없음, 권한 없음 등)
    #[error("failed to spawn '{program}': {reason}")]
    Spawn {
        /// 실행하려던 명령줄
        program: String,
        /// 실패 사유
        reason: String,
    },

    /// 분류기가 실패로 판정한 종료 상태
    #[error("'{program}' failed: {reason}")]
    Failed {
        /// 실행한 명령줄
        program: String,
        /// 판정 사유 (예: "exit status 254")
        reason: String,
    },

    /// 제한 시간 초과로 강제 종료됨
    #[error("'{program}' timed out after {secs}s")]
    TimedOut {
        /// 실행한 명령줄
        program: String,
        /// 제한 시간 (초)
        secs: u64,
    },

    /// 사용자 인터럽트로 취소됨
    #[error("cancelled")]
    Cancelled,

    /// 파일시스템 작업 실패
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },
}

impl StepError {
    /// 취소로 인한 실패인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// 종료 상태를 사람이 읽을 수 있는 문자열로 변환합니다.
pub fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_owned(),
    }
}
