//! # Trader Core
//!
//! 캔들 데이터셋과 포지션 시뮬레이터가 공유하는 핵심 타입을 제공합니다:
//! - 타임프레임, 심볼, 날짜 레이블, Decimal 유틸리티
//! - 과거 캔들 제공자 trait (`HistoricalBarSource`)
//! - 설정 관리 (자격증명, 시뮬레이터)
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use types::*;
