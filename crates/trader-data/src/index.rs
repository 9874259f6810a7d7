//! 데이터셋 읽기 인덱스.
//!
//! | 형태 | 결과 |
//! |---|---|
//! | `ByGranularity(tf)` | 일곱 컬럼 전체 + 행 인덱스 |
//! | `ByFeature(tf, name)` | 단일 컬럼 테이블 (행 인덱스 없음) |
//! | `ByFeatureSet(tf, names)` | 요청 순서대로의 다중 컬럼 테이블 |

use std::fmt;

use trader_core::Timeframe;

use crate::error::{DataError, Result};

/// 데이터셋 읽기 인덱스.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetIndex {
    /// 캔들 간격의 전체 테이블
    ByGranularity(Timeframe),
    /// 피처 하나
    ByFeature(Timeframe, String),
    /// 피처 부분집합 (순서 유지)
    ByFeatureSet(Timeframe, Vec<String>),
}

impl DatasetIndex {
    pub fn timeframe(&self) -> Timeframe {
        match self {
            DatasetIndex::ByGranularity(tf)
            | DatasetIndex::ByFeature(tf, _)
            | DatasetIndex::ByFeatureSet(tf, _) => *tf,
        }
    }

    /// 문자열에서 인덱스를 만듭니다.
    ///
    /// `"5m"`, `"5m:close"`, `"5m:close_time,close"` 형태를 지원합니다.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || DataError::InvalidIndex(s.to_string());

        let (label, features) = match s.split_once(':') {
            Some((label, features)) => (label, Some(features)),
            None => (s, None),
        };
        let timeframe = Timeframe::from_label(label.trim()).ok_or_else(invalid)?;

        let Some(features) = features else {
            return Ok(DatasetIndex::ByGranularity(timeframe));
        };
        let names: Vec<String> = features
            .split(',')
            .map(|f| f.trim().to_string())
            .collect();
        if names.iter().any(String::is_empty) {
            return Err(invalid());
        }

        if names.len() > 1 {
            return Ok(DatasetIndex::ByFeatureSet(timeframe, names));
        }
        Ok(DatasetIndex::ByFeature(timeframe, features.trim().to_string()))
    }
}

impl From<Timeframe> for DatasetIndex {
    fn from(tf: Timeframe) -> Self {
        DatasetIndex::ByGranularity(tf)
    }
}

impl From<(Timeframe, &str)> for DatasetIndex {
    fn from((tf, feature): (Timeframe, &str)) -> Self {
        DatasetIndex::ByFeature(tf, feature.to_string())
    }
}

impl From<(Timeframe, String)> for DatasetIndex {
    fn from((tf, feature): (Timeframe, String)) -> Self {
        DatasetIndex::ByFeature(tf, feature)
    }
}

impl From<(Timeframe, &[&str])> for DatasetIndex {
    fn from((tf, features): (Timeframe, &[&str])) -> Self {
        DatasetIndex::ByFeatureSet(tf, features.iter().map(|f| f.to_string()).collect())
    }
}

impl<const N: usize> From<(Timeframe, [&str; N])> for DatasetIndex {
    fn from((tf, features): (Timeframe, [&str; N])) -> Self {
        DatasetIndex::ByFeatureSet(tf, features.iter().map(|f| f.to_string()).collect())
    }
}

impl From<(Timeframe, Vec<String>)> for DatasetIndex {
    fn from((tf, features): (Timeframe, Vec<String>)) -> Self {
        DatasetIndex::ByFeatureSet(tf, features)
    }
}

impl fmt::Display for DatasetIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetIndex::ByGranularity(tf) => write!(f, "{}", tf),
            DatasetIndex::ByFeature(tf, name) => write!(f, "{}:{}", tf, name),
            DatasetIndex::ByFeatureSet(tf, names) => write!(f, "{}:{}", tf, names.join(",")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_shapes() {
        assert_eq!(
            DatasetIndex::parse("5m").unwrap(),
            DatasetIndex::ByGranularity(Timeframe::M5)
        );
        assert_eq!(
            DatasetIndex::parse("1h:close").unwrap(),
            DatasetIndex::ByFeature(Timeframe::H1, "close".into())
        );
        assert_eq!(
            DatasetIndex::parse("1h:close_time, close").unwrap(),
            DatasetIndex::ByFeatureSet(Timeframe::H1, vec!["close_time".into(), "close".into()])
        );
    }

    #[test]
    fn test_parse_invalid() {
        for s in ["", "7m", "5m:", "5m:close,", "5m:,close"] {
            assert!(
                matches!(DatasetIndex::parse(s), Err(DataError::InvalidIndex(_))),
                "{s} should be rejected"
            );
        }
    }

    #[test]
    fn test_from_conversions() {
        assert_eq!(
            DatasetIndex::from(Timeframe::D1),
            DatasetIndex::ByGranularity(Timeframe::D1)
        );
        assert_eq!(
            DatasetIndex::from((Timeframe::D1, "open")),
            DatasetIndex::ByFeature(Timeframe::D1, "open".into())
        );
        let set = DatasetIndex::from((Timeframe::D1, ["close_time", "close"]));
        assert_eq!(set.timeframe(), Timeframe::D1);
        assert_eq!(set.to_string(), "1d:close_time,close");
    }
}
