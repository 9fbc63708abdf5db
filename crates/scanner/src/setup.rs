//! 감사 도구(Safe Chain) 설치 확인 및 설치
//!
//! 스캔 전에 감사 래퍼가 `PATH`에 있는지 확인합니다.
//!
//! - 있으면: 셸 통합(`npm`이 alias/function으로 감싸져 있는지)을 확인합니다.
//!   통합이 안 되어 있어도 경고만 남기고 도구를 사용합니다.
//! - 없으면: 설치 여부를 묻습니다. 거절하면 데모 모드, 수락하면
//!   `npm install -g <package>` 후 `<tool> setup`을 실행하고 재시작을 요구합니다.

use tracing::{debug, info, warn};

use npmscan_core::pipeline::{CommandLocator, Prompter};

use crate::classify::{StepVerdict, classify_strict};
use crate::config::ScannerConfig;
use crate::error::ScannerError;
use crate::process::{CommandRunner, CommandSpec};

/// 설치 확인 질문
pub const INSTALL_QUESTION: &str = "Would you like to install Safe Chain now?";

const SHELLS: [&str; 3] = ["zsh", "bash", "sh"];
const INTEGRATION_MARKERS: [&str; 3] = ["aliased to", "shell function", "function"];

/// 감사 도구 준비 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupStatus {
    /// 도구 사용 가능
    Ready {
        /// 셸 통합 확인 여부
        shell_integrated: bool,
    },
    /// 도구 없이 데모 모드로 진행
    Demo,
    /// 방금 설치함, 터미널 재시작 후 다시 실행해야 함
    RestartRequired,
}

impl SetupStatus {
    /// 스캔에서 감사 도구를 사용할 수 있는지 확인합니다.
    pub fn tool_enabled(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

/// 감사 도구 설치 관리자
pub struct AuditToolSetup<'a, R, L> {
    runner: &'a R,
    locator: &'a L,
    tool: String,
    tool_package: String,
    package_manager: String,
}

impl<'a, R, L> AuditToolSetup<'a, R, L>
where
    R: CommandRunner,
    L: CommandLocator,
{
    /// 실행기와 명령 탐색기로 생성합니다.
    pub fn new(runner: &'a R, locator: &'a L, config: &ScannerConfig) -> Self {
        Self {
            runner,
            locator,
            tool: config.tool.clone(),
            tool_package: config.tool_package.clone(),
            package_manager: config.package_manager.clone(),
        }
    }

    /// 감사 도구 명령 이름
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// 감사 도구가 `PATH`에 있는지 확인합니다.
    pub fn is_installed(&self) -> bool {
        self.locator.is_available(&self.tool)
    }

    /// 도구 상태를 확인하고 필요하면 설치합니다.
    ///
    /// # Errors
    ///
    /// 사용자가 설치를 수락했지만 패키지 설치가 실패하면 `ScannerError::Setup`
    pub async fn ensure(&self, prompter: &dyn Prompter) -> Result<SetupStatus, ScannerError> {
        info!(tool = %self.tool, "checking audit tool installation");

        if self.is_installed() {
            let shell_integrated = self.shell_integrated().await;
            if !shell_integrated {
                warn!(tool = %self.tool, "audit tool found but shell integration not detected");
            }
            return Ok(SetupStatus::Ready { shell_integrated });
        }

        warn!(tool = %self.tool, "audit tool is not installed");

        if !prompter.confirm(INSTALL_QUESTION) {
            info!("installation declined, running in demo mode");
            return Ok(SetupStatus::Demo);
        }

        self.install().await?;
        Ok(SetupStatus::RestartRequired)
    }

    /// 셸에서 `npm`이 alias나 function으로 감싸져 있는지 확인합니다.
    pub async fn shell_integrated(&self) -> bool {
        for shell in SHELLS {
            if !self.locator.is_available(shell) {
                continue;
            }
            let spec = CommandSpec::new(shell).arg("-c").arg("type npm 2>/dev/null");
            match self.runner.run(&spec).await {
                Ok(output) if output.success() => {
                    if INTEGRATION_MARKERS.iter().any(|m| output.combined.contains(m)) {
                        debug!(shell, "npm is wrapped in shell");
                        return true;
                    }
                }
                Ok(_) => {}
                Err(e) => debug!(shell, error = %e, "shell integration probe failed"),
            }
        }
        false
    }

    /// 패키지를 전역 설치하고 `<tool> setup`을 실행합니다.
    ///
    /// setup 실패는 경고만 남깁니다 (재시작 후 완료되는 경우가 많음).
    pub async fn install(&self) -> Result<(), ScannerError> {
        let install_spec = CommandSpec::new(&self.package_manager)
            .arg("install")
            .arg("-g")
            .arg(&self.tool_package);
        info!(command = %install_spec.display(), "installing audit tool");

        let output = self
            .runner
            .run(&install_spec)
            .await
            .map_err(|e| ScannerError::Setup(e.to_string()))?;

        if let StepVerdict::Failed(reason) = classify_strict(output.exit_code) {
            return Err(ScannerError::Setup(format!(
                "'{}' failed: {reason}\n{}",
                install_spec.display(),
                output.combined.trim_end()
            )));
        }

        let setup_spec = CommandSpec::new(&self.tool).arg("setup");
        info!(command = %setup_spec.display(), "running audit tool setup");
        match self.runner.run(&setup_spec).await {
            Ok(output) if output.success() => info!("audit tool setup completed"),
            Ok(output) => warn!(
                exit_code = ?output.exit_code,
                output = %output.combined.trim_end(),
                "audit tool setup did not complete, it will finish after a terminal restart"
            ),
            Err(e) => warn!(error = %e, "audit tool setup could not run"),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::{MockCommandRunner, MockResponse};
    use std::collections::HashSet;

    struct FakeLocator(HashSet<&'static str>);

    impl FakeLocator {
        fn with(names: &[&'static str]) -> Self {
            Self(names.iter().copied().collect())
        }
    }

    impl CommandLocator for FakeLocator {
        fn is_available(&self, name: &str) -> bool {
            self.0.contains(name)
        }
    }

    struct FixedAnswer(bool);

    impl Prompter for FixedAnswer {
        fn confirm(&self, _question: &str) -> bool {
            self.0
        }
    }

    #[tokio::test]
    async fn installed_tool_is_ready() {
        let runner = MockCommandRunner::new()
            .on("bash -c", MockResponse::Exit(0, "npm is a function".into()));
        let locator = FakeLocator::with(&["safe-chain", "bash"]);
        let setup = AuditToolSetup::new(&runner, &locator, &ScannerConfig::default());

        let status = setup.ensure(&FixedAnswer(false)).await.unwrap();
        assert_eq!(
            status,
            SetupStatus::Ready {
                shell_integrated: true
            }
        );
        assert!(status.tool_enabled());
    }

    #[tokio::test]
    async fn missing_integration_is_still_ready() {
        let runner = MockCommandRunner::new()
            .on("sh -c", MockResponse::Exit(0, "npm is /usr/bin/npm".into()));
        let locator = FakeLocator::with(&["safe-chain", "sh"]);
        let setup = AuditToolSetup::new(&runner, &locator, &ScannerConfig::default());

        let status = setup.ensure(&FixedAnswer(false)).await.unwrap();
        assert_eq!(
            status,
            SetupStatus::Ready {
                shell_integrated: false
            }
        );
    }

    #[tokio::test]
    async fn declined_install_is_demo() {
        let runner = MockCommandRunner::new();
        let locator = FakeLocator::with(&[]);
        let setup = AuditToolSetup::new(&runner, &locator, &ScannerConfig::default());

        let status = setup.ensure(&FixedAnswer(false)).await.unwrap();
        assert_eq!(status, SetupStatus::Demo);
        assert!(!status.tool_enabled());
        assert!(runner.command_lines().is_empty());
    }

    #[tokio::test]
    async fn accepted_install_requires_restart() {
        let runner = MockCommandRunner::new()
            .on("safe-chain setup", MockResponse::Exit(1, "not yet".into()));
        let locator = FakeLocator::with(&[]);
        let setup = AuditToolSetup::new(&runner, &locator, &ScannerConfig::default());

        let status = setup.ensure(&FixedAnswer(true)).await.unwrap();
        assert_eq!(status, SetupStatus::RestartRequired);
        assert_eq!(
            runner.command_lines(),
            vec!["npm install -g safe-chain-test", "safe-chain setup"]
        );
    }

    #[tokio::test]
    async fn failed_install_is_fatal() {
        let runner = MockCommandRunner::new()
            .on("npm install -g", MockResponse::Exit(243, "EACCES".into()));
        let locator = FakeLocator::with(&[]);
        let setup = AuditToolSetup::new(&runner, &locator, &ScannerConfig::default());

        let err = setup.ensure(&FixedAnswer(true)).await.unwrap_err();
        assert!(matches!(err, ScannerError::Setup(_)));
        assert!(err.to_string().contains("EACCES"));
        assert_eq!(runner.command_lines().len(), 1);
    }
}
