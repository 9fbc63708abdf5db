//! 스캔 오케스트레이터 -- 프로젝트별 파이프라인 실행
//!
//! [`ScanOrchestrator`]는 탐색된 프로젝트마다 다음 상태 기계를 순차 실행합니다.
//!
//! ```text
//! pending --> removing_cache --> installing --> auditing --> success
//!                  |                 |              |
//!                  +-----------------+--------------+--> failed
//! ```
//!
//! - 각 단계는 직전 단계가 성공했을 때만 실행됩니다.
//! - 실패하면 나머지 단계는 "실행되지 않음" 기본값으로 남습니다.
//! - 재시도하지 않으며, 프로젝트는 한 번에 하나씩 처리합니다.
//! - 입력 프로젝트마다 정확히 하나의 결과가 입력 순서대로 집계기에 추가됩니다.
//!   단, 인터럽트 이후에는 새 프로젝트를 시작하지 않습니다.

use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use npmscan_core::pipeline::{AuditOutputParser, ScanObserver, StepKind};
use npmscan_core::types::{ActionOutcome, ProjectScanResult, ScanStatus};

use crate::process::CommandRunner;
use crate::report::ReportAggregator;
use crate::steps::PipelineSteps;

/// 프로젝트 파이프라인 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStage {
    /// 시작 전
    Pending,
    /// node_modules 삭제 중
    RemovingCache,
    /// 의존성 설치 중
    Installing,
    /// 감사 중
    Auditing,
    /// 종료 (최종 상태 포함)
    Finished(ScanStatus),
}

/// 프로젝트 하나를 처리한 결과
#[derive(Debug)]
pub struct ProjectRun {
    /// 최종 결과 레코드
    pub result: ProjectScanResult,
    /// 인터럽트로 중단되었는지 여부
    pub cancelled: bool,
}

/// 실행 전체 요약
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// 결과가 기록된 프로젝트 수
    pub processed: usize,
    /// 인터럽트로 중단되었는지 여부
    pub interrupted: bool,
}

/// 스캔 오케스트레이터
pub struct ScanOrchestrator<R, P> {
    steps: PipelineSteps<R>,
    parser: P,
    audit_tool_enabled: bool,
    cancel: CancellationToken,
}

impl<R, P> ScanOrchestrator<R, P>
where
    R: CommandRunner,
    P: AuditOutputParser,
{
    /// 단계 실행기와 파서로 오케스트레이터를 생성합니다.
    pub fn new(steps: PipelineSteps<R>, parser: P, audit_tool_enabled: bool) -> Self {
        Self {
            steps,
            parser,
            audit_tool_enabled,
            cancel: CancellationToken::new(),
        }
    }

    /// 인터럽트 감지용 취소 토큰을 지정합니다.
    ///
    /// 명령 실행기에 같은 토큰을 넘겨야 실행 중인 자식 프로세스도 종료됩니다.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 감사 도구 사용 여부
    pub fn audit_tool_enabled(&self) -> bool {
        self.audit_tool_enabled
    }

    /// 모든 프로젝트를 순서대로 처리하고 결과를 집계기에 추가합니다.
    pub async fn run(
        &self,
        projects: &[PathBuf],
        report: &mut ReportAggregator,
        observer: &mut dyn ScanObserver,
    ) -> RunSummary {
        let total = projects.len();
        report.set_audit_tool_enabled(self.audit_tool_enabled);
        info!(
            projects = total,
            audit_tool_enabled = self.audit_tool_enabled,
            "starting security scan"
        );

        let mut processed = 0;
        let mut interrupted = false;

        for (index, project) in projects.iter().enumerate() {
            if self.cancel.is_cancelled() {
                interrupted = true;
                break;
            }

            observer.project_started(index, total, project);
            let run = self.scan_project(project, observer).await;
            observer.project_finished(index, total, &run.result);

            report.append(run.result);
            processed += 1;

            if run.cancelled {
                interrupted = true;
                break;
            }
        }

        if interrupted {
            warn!(
                processed,
                remaining = total - processed,
                "scan interrupted, remaining projects skipped"
            );
            report.mark_interrupted();
        }

        RunSummary {
            processed,
            interrupted,
        }
    }

    /// 프로젝트 하나의 파이프라인을 실행합니다.
    pub async fn scan_project(
        &self,
        project: &Path,
        observer: &mut dyn ScanObserver,
    ) -> ProjectRun {
        let mut result = ProjectScanResult::begin(project);
        let mut cancelled = false;
        let mut stage = ProjectStage::Pending;

        info!(project = %project.display(), "processing project");

        let status = loop {
            stage = match stage {
                ProjectStage::Pending => ProjectStage::RemovingCache,

                ProjectStage::RemovingCache => {
                    let next = match self.steps.remove_cache(project).await {
                        Ok(output) => {
                            result.remove_cache = ActionOutcome::success(output);
                            ProjectStage::Installing
                        }
                        Err(failure) => {
                            cancelled = failure.is_cancelled();
                            result.remove_cache = failure.to_outcome();
                            ProjectStage::Finished(ScanStatus::Failed)
                        }
                    };
                    observer.step_finished(project, StepKind::RemoveCache, &result.remove_cache);
                    next
                }

                ProjectStage::Installing => {
                    let next = match self.steps.install(project).await {
                        Ok(output) => {
                            result.install = ActionOutcome::success(output);
                            ProjectStage::Auditing
                        }
                        Err(failure) => {
                            cancelled = failure.is_cancelled();
                            result.install = failure.to_outcome();
                            ProjectStage::Finished(ScanStatus::Failed)
                        }
                    };
                    observer.step_finished(project, StepKind::Install, &result.install);
                    next
                }

                ProjectStage::Auditing => {
                    let next = match self.steps.audit(project, self.audit_tool_enabled).await {
                        Ok(run) => {
                            let mut vulnerabilities = self.parser.parse(&run.audit_output);
                            if run.fix_applied {
                                for vuln in &mut vulnerabilities {
                                    vuln.fixed = true;
                                }
                            }
                            result.vulnerabilities = vulnerabilities;
                            result.audit = ActionOutcome::success(run.recorded_output());
                            ProjectStage::Finished(ScanStatus::Success)
                        }
                        Err(failure) => {
                            cancelled = failure.is_cancelled();
                            result.audit = failure.to_outcome();
                            ProjectStage::Finished(ScanStatus::Failed)
                        }
                    };
                    observer.step_finished(project, StepKind::Audit, &result.audit);
                    next
                }

                ProjectStage::Finished(status) => break status,
            };
        };

        result.finish(status);

        info!(
            project = %project.display(),
            status = %result.status,
            vulnerabilities = result.vulnerabilities.len(),
            duration_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            "project finished"
        );

        ProjectRun { result, cancelled }
    }
}
