//! CLI 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 캔들 데이터셋 생성과 간격 추가
//! - 데이터셋 조회
//! - 포지션 시뮬레이터 실행

pub mod commands;
