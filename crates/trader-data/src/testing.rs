//! 테스트용 메모리 캔들 소스.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use trader_core::{HistoricalBarSource, RawKline, SourceError, Timeframe};

/// 미리 정해 둔 원시 캔들을 돌려주는 `HistoricalBarSource`.
#[derive(Debug, Default)]
pub struct StaticBarSource {
    bars: HashMap<Timeframe, Vec<RawKline>>,
    failures: HashMap<Timeframe, String>,
    calls: Mutex<Vec<(String, String, String, Timeframe)>>,
}

impl StaticBarSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// 캔들 간격에 원시 레코드를 등록합니다.
    pub fn with_bars(mut self, timeframe: Timeframe, rows: Vec<RawKline>) -> Self {
        self.bars.insert(timeframe, rows);
        self
    }

    /// 종가 목록으로 거래소 형식(12필드) 레코드를 만들어 등록합니다.
    pub fn with_series<T>(self, timeframe: Timeframe, start_ms: i64, closes: &[T]) -> Self
    where
        T: Into<Decimal> + Copy,
    {
        self.with_bars(timeframe, synthetic_klines(timeframe, start_ms, closes))
    }

    /// 캔들 간격 요청이 실패하도록 설정합니다.
    pub fn with_failure(mut self, timeframe: Timeframe, message: impl Into<String>) -> Self {
        self.failures.insert(timeframe, message.into());
        self
    }

    /// 지금까지의 요청 (심볼, 시작, 종료, 간격).
    pub fn calls(&self) -> Vec<(String, String, String, Timeframe)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl HistoricalBarSource for StaticBarSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn fetch_historical_bars(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<RawKline>, SourceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((symbol.to_string(), start.to_string(), end.to_string(), timeframe));
        }
        if let Some(message) = self.failures.get(&timeframe) {
            return Err(SourceError::Network(message.clone()));
        }
        Ok(self.bars.get(&timeframe).cloned().unwrap_or_default())
    }
}

/// 종가 목록으로 거래소 형식의 원시 캔들을 만듭니다.
///
/// 시가는 직전 종가, 고가/저가는 두 값의 최대/최소입니다.
pub fn synthetic_klines<T>(timeframe: Timeframe, start_ms: i64, closes: &[T]) -> Vec<RawKline>
where
    T: Into<Decimal> + Copy,
{
    let step = timeframe.as_millis();
    let mut prev: Option<Decimal> = None;

    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let close: Decimal = close.into();
            let open = prev.unwrap_or(close);
            prev = Some(close);
            let open_time = start_ms + i as i64 * step;
            vec![
                json!(open_time),
                Value::String(open.to_string()),
                Value::String(open.max(close).to_string()),
                Value::String(open.min(close).to_string()),
                Value::String(close.to_string()),
                json!("1.0"),
                json!(open_time + step - 1),
                json!("0"),
                json!(1),
                json!("0"),
                json!("0"),
                json!("0"),
            ]
        })
        .collect()
}
