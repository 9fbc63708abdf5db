//! 종료 상태 분류기
//!
//! 외부 명령의 `(종료 코드, 출력)`을 단계 결과로 해석합니다.
//! `npm audit`은 취약점이 있으면 0이 아닌 코드(기본 1)로 종료하므로
//! 감사 명령에는 별도의 분류 규칙을 적용합니다.

use crate::error::describe_exit;

/// 단계 실행 판정
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepVerdict {
    /// 성공
    Succeeded,
    /// 성공, 다만 감사 도구가 취약점을 보고함
    SucceededWithFindings,
    /// 실패 (사유 포함)
    Failed(String),
}

impl StepVerdict {
    /// 단계가 성공으로 간주되는지 확인합니다.
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }
}

/// 종료 코드 0만 성공으로 보는 분류기 (install, audit fix)
pub fn classify_strict(exit_code: Option<i32>) -> StepVerdict {
    match exit_code {
        Some(0) => StepVerdict::Succeeded,
        other => StepVerdict::Failed(describe_exit(other)),
    }
}

/// 감사 명령 분류기
///
/// - 0: 성공
/// - `findings_exit_code`: 취약점 발견 (성공). 단, 출력에 npm 에러 표식만 있고
///   취약점 언급이 없으면 (예: lockfile 없음) 실패로 봅니다.
/// - 그 외 코드, 시그널 종료: 실패
pub fn classify_audit_exit(
    exit_code: Option<i32>,
    combined_output: &str,
    findings_exit_code: i32,
) -> StepVerdict {
    match exit_code {
        Some(0) => StepVerdict::Succeeded,
        Some(code) if code == findings_exit_code => {
            if reports_npm_error(combined_output) && !combined_output.contains("vulnerabilit") {
                StepVerdict::Failed(format!(
                    "{}: audit could not run",
                    describe_exit(exit_code)
                ))
            } else {
                StepVerdict::SucceededWithFindings
            }
        }
        other => StepVerdict::Failed(describe_exit(other)),
    }
}

fn reports_npm_error(output: &str) -> bool {
    output
        .lines()
        .any(|line| line.starts_with("npm ERR!") || line.starts_with("npm error"))
}
