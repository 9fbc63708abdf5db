//! 감사 출력 파서
//!
//! 감사 도구의 비정형 텍스트 출력에서 [`Vulnerability`](npmscan_core::types::Vulnerability)
//! 목록을 추출합니다. 파서는 core의
//! [`AuditOutputParser`](npmscan_core::pipeline::AuditOutputParser) trait을 구현하므로
//! 기계 판독 가능한 출력(`npm audit --json`)을 다루는 파서로 교체할 수 있습니다.
//!
//! # 지원 형식
//!
//! - 텍스트 휴리스틱 -- [`TextAuditParser`]

pub mod text;

pub use text::TextAuditParser;
