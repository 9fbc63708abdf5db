//! 에러 타입: 도메인별 에러 정의

/// npmscan 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum NpmscanError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 처리 에러
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 처리 에러
///
/// 프로젝트 단위의 단계 실패는 결과에 기록될 뿐 이 타입으로 전파되지 않습니다.
/// 여기에는 실행 전체를 중단시키는 에러만 담깁니다.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// 디렉토리 탐색 실패 (치명적)
    #[error("discovery failed: {0}")]
    Discovery(String),

    /// 감사 도구 설치/설정 실패
    #[error("audit tool setup failed: {0}")]
    Setup(String),
}
