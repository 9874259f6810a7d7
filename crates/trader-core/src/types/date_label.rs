//! 과거 데이터 요청에 사용하는 날짜 레이블.
//!
//! 데이터 소스와 메타데이터에는 사람이 읽을 수 있는 `"01 Jan, 2021"` 형식이 사용됩니다.

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 날짜 레이블 형식 (`"%d %b, %Y"`).
pub const DATE_LABEL_FORMAT: &str = "%d %b, %Y";

/// 날짜를 레이블 문자열로 변환합니다.
pub fn format_date_label(date: NaiveDate) -> String {
    date.format(DATE_LABEL_FORMAT).to_string()
}

/// 레이블 문자열을 날짜로 파싱합니다.
pub fn parse_date_label(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(label.trim(), DATE_LABEL_FORMAT).ok()
}

/// 레이블 문자열을 UTC 자정 기준 epoch 밀리초로 변환합니다.
pub fn date_label_to_millis(label: &str) -> Option<i64> {
    let date = parse_date_label(label)?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).timestamp_millis())
}

/// 시작일 ≤ 종료일이 보장되는 날짜 범위.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// 새 날짜 범위를 생성합니다. 시작일이 종료일보다 늦으면 `None`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// 레이블 쌍에서 날짜 범위를 파싱합니다.
    pub fn from_labels(start: &str, end: &str) -> Option<Self> {
        Self::new(parse_date_label(start)?, parse_date_label(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// (시작, 종료) 레이블 쌍을 반환합니다.
    pub fn labels(&self) -> (String, String) {
        (format_date_label(self.start), format_date_label(self.end))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (start, end) = self.labels();
        write!(f, "{} ~ {}", start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trip() {
        let date = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        assert_eq!(format_date_label(date), "01 Jan, 2021");
        assert_eq!(parse_date_label("01 Jan, 2021"), Some(date));
        assert_eq!(parse_date_label("2021-01-01"), None);
    }

    #[test]
    fn test_label_to_millis() {
        assert_eq!(date_label_to_millis("01 Jan, 2021"), Some(1_609_459_200_000));
        assert_eq!(date_label_to_millis("garbage"), None);
    }

    #[test]
    fn test_date_range_ordering() {
        let a = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap();

        assert!(DateRange::new(a, b).is_some());
        assert!(DateRange::new(a, a).is_some());
        assert!(DateRange::new(b, a).is_none());

        let range = DateRange::from_labels("01 Jan, 2021", "01 Feb, 2021").unwrap();
        assert_eq!(
            range.labels(),
            ("01 Jan, 2021".to_string(), "01 Feb, 2021".to_string())
        );
    }
}
