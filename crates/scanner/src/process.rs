//! 외부 프로세스 실행
//!
//! [`CommandRunner`] trait은 파이프라인 단계가 외부 명령을 실행하는 경로입니다.
//! 실제 구현인 [`TokioCommandRunner`]는 stdout/stderr를 모두 캡처하고,
//! 제한 시간 초과나 취소 시 자식 프로세스를 종료합니다.
//! 테스트에서는 스크립트된 mock runner로 교체합니다.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use npmscan_core::pipeline::CommandLocator;

use crate::error::StepError;

/// 실행할 명령 정의
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    /// 실행 파일 이름
    pub program: String,
    /// 인자 목록
    pub args: Vec<String>,
    /// 작업 디렉토리
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    /// 인자 없는 명령을 생성합니다.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    /// 인자를 추가합니다.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// 작업 디렉토리를 지정합니다.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// 로그와 에러 메시지용 명령줄 표현
    pub fn display(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

/// 종료된 프로세스의 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// 종료 코드 (시그널로 종료되면 None)
    pub exit_code: Option<i32>,
    /// stdout 다음에 stderr를 이어 붙인 출력
    pub combined: String,
}

impl CommandOutput {
    /// 종료 코드 0인지 확인합니다.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// 외부 명령 실행 trait
///
/// 종료 코드 해석은 호출자(분류기)의 몫이므로, 프로세스가 끝나기만 하면
/// 종료 코드와 상관없이 `Ok`를 반환합니다.
pub trait CommandRunner: Send + Sync {
    /// 명령을 실행하고 종료될 때까지 기다립니다.
    ///
    /// # Errors
    ///
    /// - `StepError::Spawn`: 프로세스를 시작할 수 없음
    /// - `StepError::TimedOut`: 제한 시간 초과 (자식 프로세스는 종료됨)
    /// - `StepError::Cancelled`: 취소됨 (자식 프로세스는 종료됨)
    fn run(
        &self,
        spec: &CommandSpec,
    ) -> impl Future<Output = Result<CommandOutput, StepError>> + Send;
}

/// tokio 기반 명령 실행기
#[derive(Debug, Clone, Default)]
pub struct TokioCommandRunner {
    timeout: Option<Duration>,
    cancel: CancellationToken,
}

impl TokioCommandRunner {
    /// 제한 시간과 취소 토큰으로 실행기를 생성합니다.
    pub fn new(timeout: Option<Duration>, cancel: CancellationToken) -> Self {
        Self { timeout, cancel }
    }

    /// 취소 토큰을 반환합니다.
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }
}

impl CommandRunner for TokioCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, StepError> {
        if self.cancel.is_cancelled() {
            return Err(StepError::Cancelled);
        }

        let program = spec.display();
        debug!(command = %program, cwd = ?spec.cwd, "spawning command");

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| StepError::Spawn {
            program: program.clone(),
            reason: e.to_string(),
        })?;

        // 이 future가 drop되면 kill_on_drop으로 자식 프로세스가 종료됩니다.
        let wait = async {
            let output = match self.timeout {
                Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                    .await
                    .map_err(|_elapsed| StepError::TimedOut {
                        program: program.clone(),
                        secs: limit.as_secs(),
                    })?,
                None => child.wait_with_output().await,
            };
            output.map_err(|e| StepError::Io {
                path: program.clone(),
                source: e,
            })
        };

        let output = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                debug!(command = %program, "command cancelled");
                return Err(StepError::Cancelled);
            }
            result = wait => result?,
        };

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        debug!(
            command = %program,
            exit_code = ?output.status.code(),
            bytes = combined.len(),
            "command finished"
        );

        Ok(CommandOutput {
            exit_code: output.status.code(),
            combined,
        })
    }
}

/// `PATH` 검색 기반 명령 존재 확인
#[derive(Debug, Clone, Copy, Default)]
pub struct PathLocator;

impl CommandLocator for PathLocator {
    fn is_available(&self, name: &str) -> bool {
        let Some(paths) = std::env::var_os("PATH") else {
            return false;
        };
        std::env::split_paths(&paths).any(|dir| is_executable(&dir.join(name)))
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).is_ok_and(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file() || path.with_extension("cmd").is_file()
}

/// 스크립트된 응답을 돌려주는 테스트용 runner
#[cfg(test)]
#[derive(Default)]
pub struct MockCommandRunner {
    /// (명령줄 접두사, 결과) 목록. 처음 일치하는 항목을 사용합니다.
    pub responses: Vec<(String, MockResponse)>,
    /// 실행된 명령 기록
    pub calls: std::sync::Mutex<Vec<CommandSpec>>,
}

/// mock runner 응답
#[cfg(test)]
#[derive(Clone)]
pub enum MockResponse {
    /// 주어진 종료 코드와 출력으로 종료
    Exit(i32, String),
    /// 실행 실패
    SpawnError,
    /// 제한 시간 초과
    TimedOut,
    /// 취소
    Cancelled,
}

#[cfg(test)]
impl MockCommandRunner {
    /// 응답이 없는 mock을 생성합니다 (일치하지 않는 명령은 exit 0).
    pub fn new() -> Self {
        Self::default()
    }

    /// 명령줄 접두사에 대한 응답을 추가합니다.
    pub fn on(mut self, prefix: &str, response: MockResponse) -> Self {
        self.responses.push((prefix.to_owned(), response));
        self
    }

    /// 실행된 명령줄 목록을 반환합니다.
    pub fn command_lines(&self) -> Vec<String> {
        self.calls
            .lock()
            .map(|calls| calls.iter().map(CommandSpec::display).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, StepError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(spec.clone());
        }
        let line = spec.display();
        let response = self
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, r)| r.clone())
            .unwrap_or(MockResponse::Exit(0, String::new()));

        match response {
            MockResponse::Exit(code, combined) => Ok(CommandOutput {
                exit_code: Some(code),
                combined,
            }),
            MockResponse::SpawnError => Err(StepError::Spawn {
                program: line,
                reason: "mock spawn failure".to_owned(),
            }),
            MockResponse::TimedOut => Err(StepError::TimedOut {
                program: line,
                secs: 1,
            }),
            MockResponse::Cancelled => Err(StepError::Cancelled),
        }
    }
}
