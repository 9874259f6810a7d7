//! 시뮬레이터 에러 타입.

use rust_decimal::Decimal;
use thiserror::Error;
use trader_core::TraderError;
use trader_data::DataError;

/// 시뮬레이터 에러.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// 인식할 수 없는 행동 코드 (0=buy, 1=sell, 2=hold만 허용)
    #[error("Invalid action code: {0}")]
    InvalidAction(i64),

    /// 시계열이 에피소드 창보다 짧음
    #[error(
        "Insufficient data: series has {series_len} rows, need at least {required} \
         (num_steps + window_length)"
    )]
    InsufficientData { series_len: usize, required: usize },

    /// 시계열 끝을 지나서 스텝 진행
    #[error("End of series: cursor {cursor} is past the last row ({len} rows)")]
    EndOfSeries { cursor: usize, len: usize },

    /// `reset` 전에 `step` 호출
    #[error("Episode not started: call reset() first")]
    EpisodeNotStarted,

    /// 거래 불가능한 가격
    #[error("Invalid price: {0}")]
    InvalidPrice(Decimal),

    /// 잘못된 가격 시계열 (길이 불일치, 컬럼 누락 등)
    #[error("Invalid series: {0}")]
    InvalidSeries(String),

    /// 데이터셋 에러
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    /// 설정 에러
    #[error("Config error: {0}")]
    Config(#[from] TraderError),
}

pub type Result<T> = std::result::Result<T, SimulatorError>;
