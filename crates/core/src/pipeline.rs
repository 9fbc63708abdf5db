//! 협력자 trait: 스캔 파이프라인이 외부에 위임하는 확장 포인트

use std::path::Path;

use crate::types::{ActionOutcome, ProjectScanResult, Vulnerability};

/// 감사 도구 출력 파서 trait
///
/// 현재 구현은 텍스트 휴리스틱이며, 기계 판독 가능한 출력을 다루는
/// 파서로 교체하려면 이 trait을 구현합니다.
pub trait AuditOutputParser: Send + Sync {
    /// 파서 이름
    fn name(&self) -> &str;

    /// 감사 출력에서 취약점 목록을 추출합니다 (중복 제거, 순서 유지).
    fn parse(&self, output: &str) -> Vec<Vulnerability>;
}

/// 예/아니오 확인 프롬프트
pub trait Prompter {
    /// 질문을 표시하고 사용자의 동의 여부를 반환합니다.
    fn confirm(&self, question: &str) -> bool;
}

/// 명령 존재 여부 확인
pub trait CommandLocator: Send + Sync {
    /// `name` 명령을 실행할 수 있으면 true
    fn is_available(&self, name: &str) -> bool;
}

/// 파이프라인 단계 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// node_modules 삭제
    RemoveCache,
    /// 의존성 설치
    Install,
    /// 보안 감사 및 자동 수정
    Audit,
}

impl StepKind {
    /// 사용자에게 보여줄 이름
    pub fn label(&self) -> &'static str {
        match self {
            Self::RemoveCache => "node_modules removal",
            Self::Install => "npm install",
            Self::Audit => "security audit",
        }
    }
}

/// 스캔 진행 상황 수신자
///
/// 오케스트레이터가 진행 이벤트를 알립니다. 기본 구현은 아무것도 하지 않습니다.
pub trait ScanObserver {
    /// 프로젝트 파이프라인 시작
    fn project_started(&mut self, _index: usize, _total: usize, _path: &Path) {}

    /// 단계 하나가 끝남
    fn step_finished(&mut self, _path: &Path, _step: StepKind, _outcome: &ActionOutcome) {}

    /// 프로젝트 파이프라인 종료
    fn project_finished(&mut self, _index: usize, _total: usize, _result: &ProjectScanResult) {}
}

/// 아무 것도 하지 않는 관찰자
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl ScanObserver for NoopObserver {}
