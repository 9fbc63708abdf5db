//! npmscan 공통 크레이트
//!
//! 스캐너와 CLI가 공유하는 설정, 에러, 도메인 타입, 협력자 trait을 제공합니다.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod types;

// --- 주요 타입 re-export ---

// 에러
pub use error::{ConfigError, NpmscanError, ScanError};

// 설정
pub use config::{AuditConfig, GeneralConfig, IgnoredEnvVar, NpmscanConfig, ScanConfig};

// 협력자 trait
pub use pipeline::{
    AuditOutputParser, CommandLocator, NoopObserver, Prompter, ScanObserver, StepKind,
};

// 도메인 타입
pub use types::{ActionOutcome, ProjectScanResult, ScanStatus, Severity, Vulnerability};
