//! 파이프라인 단계 실행기
//!
//! 프로젝트 하나에 대해 세 단계를 실행합니다.
//!
//! 1. `node_modules` 삭제 (파일시스템 작업, 멱등)
//! 2. `npm install`
//! 3. `npm audit --audit-level=<level>` 후 `npm audit fix`
//!
//! 각 단계는 성공 시 수집한 출력을, 실패 시 [`StepFailure`]를 반환합니다.
//! 단계 간 순서와 단락(short-circuit)은 오케스트레이터가 담당합니다.

use std::path::Path;

use tracing::{debug, info, warn};

use npmscan_core::types::ActionOutcome;

use crate::classify::{StepVerdict, classify_audit_exit, classify_strict};
use crate::config::ScannerConfig;
use crate::error::StepError;
use crate::finder::DEPENDENCY_DIR;
use crate::process::{CommandRunner, CommandSpec};

/// 데모 모드 감사 출력
pub const DEMO_OUTPUT: &str = "Demo scan - no vulnerabilities detected";

/// `node_modules` 삭제 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheRemoval {
    /// 삭제함
    Removed,
    /// 원래 없었음
    NotPresent,
}

/// `<project>/node_modules`를 삭제합니다.
///
/// 없으면 아무 것도 하지 않고 성공합니다. 부분 삭제 후 실패해도 되돌리지 않습니다.
pub async fn remove_node_modules(project: &Path) -> Result<CacheRemoval, StepError> {
    let target = project.join(DEPENDENCY_DIR);

    let metadata = match tokio::fs::symlink_metadata(&target).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %target.display(), "node_modules not present");
            return Ok(CacheRemoval::NotPresent);
        }
        Err(e) => {
            return Err(StepError::Io {
                path: target.display().to_string(),
                source: e,
            });
        }
    };

    info!(path = %target.display(), "removing node_modules");

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(&target).await
    } else {
        // 심볼릭 링크나 파일은 링크 자체만 삭제
        tokio::fs::remove_file(&target).await
    };

    result.map_err(|e| StepError::Io {
        path: target.display().to_string(),
        source: e,
    })?;

    Ok(CacheRemoval::Removed)
}

/// 단계 실패와 그 시점까지 수집한 출력
#[derive(Debug)]
pub struct StepFailure {
    /// 실패 원인
    pub error: StepError,
    /// 수집된 출력
    pub output: String,
}

impl StepFailure {
    fn new(error: StepError, output: impl Into<String>) -> Self {
        Self {
            error,
            output: output.into(),
        }
    }

    /// 취소로 인한 실패인지 확인합니다.
    pub fn is_cancelled(&self) -> bool {
        self.error.is_cancelled()
    }

    /// 결과 레코드용 [`ActionOutcome`]으로 변환합니다.
    pub fn to_outcome(&self) -> ActionOutcome {
        ActionOutcome::failure(self.error.to_string(), self.output.clone())
    }
}

impl From<StepError> for StepFailure {
    fn from(error: StepError) -> Self {
        Self::new(error, String::new())
    }
}

/// 감사 단계 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRun {
    /// 감사 명령 판정
    pub verdict: StepVerdict,
    /// 감사 명령 출력 (파서 입력)
    pub audit_output: String,
    /// `npm audit fix` 출력 (실행하지 못했으면 None)
    pub fix_output: Option<String>,
    /// 자동 수정 명령 성공 여부
    pub fix_applied: bool,
    /// 데모 모드 여부
    pub demo: bool,
}

impl AuditRun {
    /// 프로세스를 실행하지 않는 데모 결과
    pub fn demo() -> Self {
        Self {
            verdict: StepVerdict::Succeeded,
            audit_output: DEMO_OUTPUT.to_owned(),
            fix_output: None,
            fix_applied: false,
            demo: true,
        }
    }

    /// 결과 레코드에 남길 출력 (감사 출력 뒤에 fix 출력)
    pub fn recorded_output(&self) -> String {
        match &self.fix_output {
            Some(fix) if !fix.is_empty() => {
                format!("{}\n--- audit fix ---\n{}", self.audit_output, fix)
            }
            _ => self.audit_output.clone(),
        }
    }
}

/// 세 단계를 실행하는 실행기
pub struct PipelineSteps<R> {
    runner: R,
    package_manager: String,
    audit_level: String,
    findings_exit_code: i32,
}

impl<R: CommandRunner> PipelineSteps<R> {
    /// 명령 실행기와 스캐너 설정으로 생성합니다.
    pub fn new(runner: R, config: &ScannerConfig) -> Self {
        Self {
            runner,
            package_manager: config.package_manager.clone(),
            audit_level: config.audit_level.clone(),
            findings_exit_code: config.findings_exit_code,
        }
    }

    /// 명령 실행기를 반환합니다.
    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// 1단계: `node_modules` 삭제
    pub async fn remove_cache(&self, project: &Path) -> Result<String, StepFailure> {
        match remove_node_modules(project).await? {
            CacheRemoval::Removed => Ok("node_modules removed".to_owned()),
            CacheRemoval::NotPresent => Ok("node_modules not present, skipped".to_owned()),
        }
    }

    /// 2단계: 의존성 설치
    pub async fn install(&self, project: &Path) -> Result<String, StepFailure> {
        let spec = CommandSpec::new(&self.package_manager)
            .arg("install")
            .current_dir(project);

        info!(project = %project.display(), command = %spec.display(), "installing dependencies");
        let output = self.runner.run(&spec).await?;

        match classify_strict(output.exit_code) {
            StepVerdict::Failed(reason) => Err(StepFailure::new(
                StepError::Failed {
                    program: spec.display(),
                    reason,
                },
                output.combined,
            )),
            _ => Ok(output.combined),
        }
    }

    /// 3단계: 보안 감사 후 자동 수정
    ///
    /// `tool_enabled`가 false이면 프로세스를 실행하지 않고 데모 결과를 반환합니다.
    /// 감사 판정과 상관없이 `npm audit fix`를 실행하며, fix 실패는 경고만 남깁니다.
    pub async fn audit(&self, project: &Path, tool_enabled: bool) -> Result<AuditRun, StepFailure> {
        if !tool_enabled {
            warn!(project = %project.display(), "audit tool not available, running demo scan");
            return Ok(AuditRun::demo());
        }

        let audit_spec = CommandSpec::new(&self.package_manager)
            .arg("audit")
            .arg(format!("--audit-level={}", self.audit_level))
            .current_dir(project);
        let fix_spec = CommandSpec::new(&self.package_manager)
            .arg("audit")
            .arg("fix")
            .current_dir(project);

        info!(
            project = %project.display(),
            command = %audit_spec.display(),
            "running security audit"
        );
        // 감사 명령을 실행하지 못해도 (취소가 아니면) fix는 실행
        let audit = match self.runner.run(&audit_spec).await {
            Err(e) if e.is_cancelled() => return Err(e.into()),
            other => other,
        };
        let audit_output = audit
            .as_ref()
            .map(|output| output.combined.clone())
            .unwrap_or_default();

        info!(project = %project.display(), command = %fix_spec.display(), "running audit fix");
        let (fix_output, fix_applied) = match self.runner.run(&fix_spec).await {
            Ok(fix) => {
                let applied = classify_strict(fix.exit_code).is_success();
                if !applied {
                    warn!(
                        project = %project.display(),
                        exit_code = ?fix.exit_code,
                        "some fixes may not have been applied"
                    );
                }
                (Some(fix.combined), applied)
            }
            Err(e) if e.is_cancelled() => {
                return Err(StepFailure::new(e, audit_output));
            }
            Err(e) => {
                warn!(project = %project.display(), error = %e, "audit fix did not run");
                (None, false)
            }
        };

        let audit = match audit {
            Ok(audit) => audit,
            Err(e) => {
                let output = match &fix_output {
                    Some(fix) if !fix.is_empty() => format!("--- audit fix ---\n{fix}"),
                    _ => String::new(),
                };
                return Err(StepFailure::new(e, output));
            }
        };
        let verdict =
            classify_audit_exit(audit.exit_code, &audit.combined, self.findings_exit_code);
        debug!(project = %project.display(), verdict = ?verdict, "audit classified");

        let run = AuditRun {
            verdict,
            audit_output: audit.combined,
            fix_output,
            fix_applied,
            demo: false,
        };

        if let StepVerdict::Failed(reason) = &run.verdict {
            return Err(StepFailure::new(
                StepError::Failed {
                    program: audit_spec.display(),
                    reason: reason.clone(),
                },
                run.recorded_output(),
            ));
        }

        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockCommandRunner, MockResponse};
    use tempfile::TempDir;

    fn steps(runner: MockCommandRunner) -> PipelineSteps<MockCommandRunner> {
        PipelineSteps::new(runner, &ScannerConfig::default())
    }

    #[tokio::test]
    async fn remove_node_modules_deletes_tree() {
        let tmp = TempDir::new().unwrap();
        let nm = tmp.path().join("node_modules/lodash");
        std::fs::create_dir_all(&nm).unwrap();
        std::fs::write(nm.join("index.js"), "module.exports = {}").unwrap();

        let removal = remove_node_modules(tmp.path()).await.unwrap();
        assert_eq!(removal, CacheRemoval::Removed);
        assert!(!tmp.path().join("node_modules").exists());
    }

    #[tokio::test]
    async fn remove_node_modules_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("node_modules")).unwrap();

        assert_eq!(
            remove_node_modules(tmp.path()).await.unwrap(),
            CacheRemoval::Removed
        );
        assert_eq!(
            remove_node_modules(tmp.path()).await.unwrap(),
            CacheRemoval::NotPresent
        );
    }

    #[tokio::test]
    async fn install_success_returns_output() {
        let runner = MockCommandRunner::new()
            .on("npm install", MockResponse::Exit(0, "added 3 packages".into()));
        let out = steps(runner).install(Path::new("/tmp/app")).await.unwrap();
        assert_eq!(out, "added 3 packages");
    }

    #[tokio::test]
    async fn install_non_zero_exit_fails_with_output() {
        let runner = MockCommandRunner::new()
            .on("npm install", MockResponse::Exit(1, "npm ERR! 404".into()));
        let failure = steps(runner)
            .install(Path::new("/tmp/app"))
            .await
            .unwrap_err();
        assert_eq!(failure.output, "npm ERR! 404");
        let outcome = failure.to_outcome();
        assert!(!outcome.succeeded);
        assert!(outcome.error.unwrap().contains("exit status 1"));
    }

    #[tokio::test]
    async fn install_runs_in_project_dir() {
        let runner = MockCommandRunner::new();
        let steps = steps(runner);
        steps.install(Path::new("/tmp/app")).await.unwrap();
        let calls = steps.runner().calls.lock().unwrap().clone();
        assert_eq!(calls[0].cwd.as_deref(), Some(Path::new("/tmp/app")));
    }

    #[tokio::test]
    async fn audit_demo_mode_spawns_nothing() {
        let steps = steps(MockCommandRunner::new());
        let run = steps.audit(Path::new("/tmp/app"), false).await.unwrap();
        assert!(run.demo);
        assert_eq!(run.audit_output, DEMO_OUTPUT);
        assert!(steps.runner().command_lines().is_empty());
    }

    #[tokio::test]
    async fn audit_runs_audit_then_fix() {
        let steps = steps(MockCommandRunner::new());
        steps.audit(Path::new("/tmp/app"), true).await.unwrap();
        assert_eq!(
            steps.runner().command_lines(),
            vec!["npm audit --audit-level=moderate", "npm audit fix"]
        );
    }

    #[tokio::test]
    async fn audit_findings_exit_is_success() {
        let runner = MockCommandRunner::new()
            .on(
                "npm audit --audit-level",
                MockResponse::Exit(1, "1 high severity vulnerability".into()),
            )
            .on("npm audit fix", MockResponse::Exit(0, "fixed 1 of 1".into()));
        let run = steps(runner)
            .audit(Path::new("/tmp/app"), true)
            .await
            .unwrap();
        assert_eq!(run.verdict, StepVerdict::SucceededWithFindings);
        assert!(run.fix_applied);
        assert!(run.recorded_output().contains("fixed 1 of 1"));
    }

    #[tokio::test]
    async fn audit_fix_failure_is_tolerated() {
        let runner = MockCommandRunner::new()
            .on("npm audit fix", MockResponse::Exit(1, "could not fix".into()));
        let run = steps(runner)
            .audit(Path::new("/tmp/app"), true)
            .await
            .unwrap();
        assert_eq!(run.verdict, StepVerdict::Succeeded);
        assert!(!run.fix_applied);
    }

    #[tokio::test]
    async fn audit_unexpected_exit_fails_after_fix() {
        let runner = MockCommandRunner::new()
            .on("npm audit --audit-level", MockResponse::Exit(7, "boom".into()));
        let steps = steps(runner);
        let failure = steps
            .audit(Path::new("/tmp/app"), true)
            .await
            .unwrap_err();
        assert!(failure.to_outcome().error.unwrap().contains("exit status 7"));
        assert_eq!(steps.runner().command_lines().len(), 2);
    }

    #[tokio::test]
    async fn audit_spawn_failure_fails() {
        let runner =
            MockCommandRunner::new().on("npm audit --audit-level", MockResponse::SpawnError);
        let runner = runner.on("npm audit fix", MockResponse::Exit(0, "fixed 1 package".into()));
        let steps = steps(runner);
        let failure = steps.audit(Path::new("/tmp/app"), true).await.unwrap_err();

        assert!(matches!(failure.error, StepError::Spawn { .. }));
        assert_eq!(failure.output, "--- audit fix ---\nfixed 1 package");
        assert_eq!(
            steps.runner().command_lines(),
            vec!["npm audit --audit-level=moderate", "npm audit fix"]
        );
    }

    #[tokio::test]
    async fn audit_cancelled_skips_fix() {
        let runner =
            MockCommandRunner::new().on("npm audit --audit-level", MockResponse::Cancelled);
        let steps = steps(runner);
        let failure = steps.audit(Path::new("/tmp/app"), true).await.unwrap_err();

        assert!(failure.is_cancelled());
        assert_eq!(steps.runner().command_lines().len(), 1);
    }

    #[tokio::test]
    async fn audit_cancelled_during_fix_propagates() {
        let runner = MockCommandRunner::new().on("npm audit fix", MockResponse::Cancelled);
        let failure = steps(runner)
            .audit(Path::new("/tmp/app"), true)
            .await
            .unwrap_err();
        assert!(failure.is_cancelled());
    }
}
