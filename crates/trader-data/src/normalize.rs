//! 데이터 소스 원시 캔들의 정규화.
//!
//! 원시 레코드는 최소 7개 필드(`open_time, open, high, low, close, volume, close_time`)를
//! 가지며 그 뒤의 거래소 전용 필드는 버립니다. 시각은 epoch 밀리초 정수이고 가격과
//! 거래량은 숫자 또는 숫자 문자열입니다.
//!
//! 거래소의 `close_time`은 구간 끝 직전 밀리초(포함 경계)이므로 1ms를 더해
//! 다음 캔들의 `open_time`과 같아지도록 맞춥니다.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde_json::Value;
use tracing::warn;
use trader_core::{parse_decimal, RawKline, Timeframe};

use crate::error::{DataError, Result};

/// 원시 레코드에서 사용하는 필드 수.
pub const KLINE_FIELDS: usize = 7;

/// `close_time` 보정값 (밀리초).
pub const CLOSE_TIME_ADJUST_MS: i64 = 1;

/// 정규화된 캔들 한 개.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub open_time: DateTime<Utc>,
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub close_time: DateTime<Utc>,
}

/// 원시 캔들 묶음을 정규화합니다.
///
/// 하나라도 결측값이나 숫자로 바꿀 수 없는 값이 있으면 묶음 전체를 거부합니다.
/// `open_time`은 엄격하게 오름차순이어야 합니다.
pub fn normalize_klines(raw: &[RawKline], timeframe: Timeframe) -> Result<Vec<Bar>> {
    let mut bars = Vec::with_capacity(raw.len());

    for (row, fields) in raw.iter().enumerate() {
        if fields.len() < KLINE_FIELDS {
            return Err(DataError::Validation(format!(
                "row {}: expected at least {} fields, got {}",
                row,
                KLINE_FIELDS,
                fields.len()
            )));
        }

        let mut values = [Decimal::ZERO; KLINE_FIELDS];
        for (col, value) in fields.iter().take(KLINE_FIELDS).enumerate() {
            values[col] = coerce(value).ok_or_else(|| {
                DataError::Validation(format!(
                    "row {} field {}: null or non-numeric value {}",
                    row, col, value
                ))
            })?;
        }

        let [open_time, open, high, low, close, volume, close_time] = values;
        bars.push(Bar {
            open_time: millis_to_datetime(open_time, row)?,
            open,
            high,
            low,
            close,
            volume,
            close_time: millis_to_datetime(close_time + Decimal::from(CLOSE_TIME_ADJUST_MS), row)?,
        });
    }

    check_order(&bars, timeframe)?;
    Ok(bars)
}

fn coerce(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

fn millis_to_datetime(ms: Decimal, row: usize) -> Result<DateTime<Utc>> {
    ms.trunc()
        .to_i64()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .ok_or_else(|| DataError::Validation(format!("row {}: timestamp {} out of range", row, ms)))
}

fn check_order(bars: &[Bar], timeframe: Timeframe) -> Result<()> {
    let nominal = chrono::Duration::milliseconds(timeframe.as_millis());
    let mut gaps = 0usize;

    for (row, pair) in bars.windows(2).enumerate() {
        let step = pair[1].open_time - pair[0].open_time;
        if step <= chrono::Duration::zero() {
            return Err(DataError::Validation(format!(
                "row {}: open_time {} is not after {}",
                row + 1,
                pair[1].open_time,
                pair[0].open_time
            )));
        }
        if step > nominal {
            gaps += 1;
        }
    }

    if gaps > 0 {
        warn!(
            interval = %timeframe,
            gaps,
            "Kline series has gaps larger than the interval"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn kline(open_time: i64) -> RawKline {
        vec![
            json!(open_time),
            json!("100.5"),
            json!("101.0"),
            json!("99.75"),
            json!("100.25"),
            json!("12.345"),
            json!(open_time + 299_999),
            json!("1234.5"),
            json!(42),
            json!("6.1"),
            json!("612.3"),
            json!("0"),
        ]
    }

    #[test]
    fn test_normalize_drops_extra_fields_and_adjusts_close_time() {
        let raw = vec![kline(1_609_459_200_000), kline(1_609_459_500_000)];
        let bars = normalize_klines(&raw, Timeframe::M5).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].open, dec!(100.5));
        assert_eq!(bars[0].volume, dec!(12.345));
        assert_eq!(bars[0].close_time, bars[1].open_time);
        assert_eq!(
            bars[0].open_time,
            Utc.timestamp_millis_opt(1_609_459_200_000).unwrap()
        );
    }

    #[test]
    fn test_numeric_fields_accept_numbers() {
        let raw = vec![vec![
            json!(1_609_459_200_000i64),
            json!(1.5),
            json!(2),
            json!(1),
            json!(1.75),
            json!(0),
            json!(1_609_459_259_999i64),
        ]];
        let bars = normalize_klines(&raw, Timeframe::M1).unwrap();
        assert_eq!(bars[0].close, dec!(1.75));
    }

    #[test]
    fn test_null_rejects_batch() {
        let mut bad = kline(1_609_459_500_000);
        bad[4] = Value::Null;
        let raw = vec![kline(1_609_459_200_000), bad];

        let err = normalize_klines(&raw, Timeframe::M5).unwrap_err();
        assert!(matches!(err, DataError::Validation(_)));
    }

    #[test]
    fn test_short_row_and_bad_number() {
        let short = vec![vec![json!(1), json!("1")]];
        assert!(matches!(
            normalize_klines(&short, Timeframe::M5),
            Err(DataError::Validation(_))
        ));

        let mut bad = kline(1_609_459_200_000);
        bad[1] = json!("n/a");
        assert!(matches!(
            normalize_klines(&[bad], Timeframe::M5),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn test_unordered_rows_rejected() {
        let raw = vec![kline(1_609_459_500_000), kline(1_609_459_200_000)];
        assert!(matches!(
            normalize_klines(&raw, Timeframe::M5),
            Err(DataError::Validation(_))
        ));
    }

    #[test]
    fn test_empty_batch() {
        assert!(normalize_klines(&[], Timeframe::H1).unwrap().is_empty());
    }
}
