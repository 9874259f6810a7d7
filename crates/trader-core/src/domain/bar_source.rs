//! 과거 캔들 데이터 제공자 추상화.
//!
//! 데이터셋은 거래소 API를 직접 알지 못하고 이 trait를 통해서만 과거 캔들을 가져옵니다.
//! 자격증명은 구현체가 생성 시점에 보관합니다.

use async_trait::async_trait;
use thiserror::Error;

use crate::types::Timeframe;

/// 제공자가 반환하는 원시 캔들 레코드.
///
/// 최소 7개 필드(open_time, open, high, low, close, volume, close_time)를 가지며,
/// 이후의 거래소별 필드는 정규화 과정에서 버려집니다. 숫자는 문자열이나 숫자 JSON
/// 값으로 올 수 있고 `null`은 결측값입니다.
pub type RawKline = Vec<serde_json::Value>;

// =============================================================================
// 에러 타입
// =============================================================================

/// 과거 데이터 제공자 에러.
#[derive(Debug, Error)]
pub enum SourceError {
    /// 네트워크 에러
    #[error("네트워크 에러: {0}")]
    Network(String),

    /// 인증 실패
    #[error("인증 실패: {0}")]
    Authentication(String),

    /// API 에러
    #[error("API 에러: {0}")]
    Api(String),

    /// 파싱 에러
    #[error("파싱 에러: {0}")]
    Parse(String),

    /// 잘못된 요청 (심볼, 날짜 레이블 등)
    #[error("잘못된 요청: {0}")]
    InvalidRequest(String),
}

// =============================================================================
// HistoricalBarSource Trait
// =============================================================================

/// 과거 캔들 제공자 trait.
///
/// 호출은 순차적이며 재시도나 타임아웃 정책은 정의하지 않습니다.
/// 구현체의 실패는 그대로 호출자에게 전달됩니다.
#[async_trait]
pub trait HistoricalBarSource: Send + Sync {
    /// 제공자 이름 (로그용).
    fn name(&self) -> &str;

    /// 기간 내 과거 캔들을 조회합니다.
    ///
    /// # 인자
    /// * `symbol` - 거래소 심볼 (예: "BTCUSDT")
    /// * `start` - 시작일 레이블 (예: "01 Jan, 2021")
    /// * `end` - 종료일 레이블
    /// * `timeframe` - 캔들 간격
    ///
    /// # Errors
    ///
    /// - `SourceError::InvalidRequest`: 날짜 레이블을 해석할 수 없음
    /// - `SourceError::Network` / `SourceError::Api`: 제공자 호출 실패
    async fn fetch_historical_bars(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<RawKline>, SourceError>;
}
