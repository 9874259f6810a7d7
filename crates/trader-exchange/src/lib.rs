//! 거래소 연결.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Binance REST 커넥터 (과거 캔들 페이지 단위 다운로드)
//! - `HistoricalBarSource` 구현
//! - 거래소 에러 처리

pub mod connector;
pub mod error;

pub use connector::*;
pub use error::*;
