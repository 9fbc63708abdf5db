//! npm 프로젝트 보안 스캐너
//!
//! 루트 디렉토리 아래의 npm 프로젝트를 찾아 프로젝트마다
//! `node_modules` 삭제 → `npm install` → `npm audit` + `npm audit fix`
//! 파이프라인을 순차 실행하고, 결과를 실행 단위 리포트로 집계합니다.
//!
//! # Module Structure
//!
//! - [`error`]: Domain error types (`ScannerError`, `StepError`)
//! - [`config`]: Scanner configuration (`ScannerConfig`, builder)
//! - [`finder`]: Project discovery (`ProjectFinder`)
//! - [`process`]: External process execution (`CommandRunner`, `TokioCommandRunner`, `PathLocator`)
//! - [`classify`]: Exit status classification (`StepVerdict`)
//! - [`steps`]: Pipeline step runners (`PipelineSteps`, `remove_node_modules`)
//! - [`parser`]: Audit output parsers (`TextAuditParser`)
//! - [`orchestrator`]: Per-project pipeline driver (`ScanOrchestrator`)
//! - [`report`]: Run-level aggregation (`ReportAggregator`, `ScanReport`)
//! - [`setup`]: Audit tool installation (`AuditToolSetup`)
//!
//! # Architecture
//!
//! ```text
//! root --> ProjectFinder --> [project paths]
//!                                  |
//!                          ScanOrchestrator --(per project)--> PipelineSteps --> CommandRunner
//!                                  |                                 |
//!                                  |                       AuditOutputParser
//!                                  v
//!                          ReportAggregator --> ScanReport --> (renderers)
//! ```

pub mod classify;
pub mod config;
pub mod error;
pub mod finder;
pub mod orchestrator;
pub mod parser;
pub mod process;
pub mod report;
pub mod setup;
pub mod steps;

// --- Public API Re-exports ---

// Orchestrator
pub use orchestrator::{ProjectRun, ProjectStage, RunSummary, ScanOrchestrator};

// Configuration
pub use config::{ScannerConfig, ScannerConfigBuilder};

// Error
pub use error::{ScannerError, StepError};

// Discovery
pub use finder::ProjectFinder;

// Process
pub use process::{CommandOutput, CommandRunner, CommandSpec, PathLocator, TokioCommandRunner};

// Classification
pub use classify::{StepVerdict, classify_audit_exit, classify_strict};

// Steps
pub use steps::{
    AuditRun, CacheRemoval, DEMO_OUTPUT, PipelineSteps, StepFailure, remove_node_modules,
};

// Parser
pub use parser::TextAuditParser;

// Report
pub use report::{ReportAggregator, ScanReport, SeverityCounts};

// Setup
pub use setup::{AuditToolSetup, SetupStatus};
