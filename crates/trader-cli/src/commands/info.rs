//! 데이터셋 정보 출력 명령어.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use trader_core::Timeframe;
use trader_data::{TableSummary, TimeSeriesDataset};

/// 데이터셋 정보
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    pub symbol: String,
    pub date_range: Option<(String, String)>,
    pub base_asset: Option<String>,
    pub quote_asset: Option<String>,
    pub intervals: Vec<(Timeframe, TableSummary)>,
}

impl DatasetInfo {
    /// 출력용 텍스트.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "종목: {}", self.symbol);
        if let Some((start, end)) = &self.date_range {
            let _ = writeln!(out, "기간: {} ~ {}", start, end);
        }
        if let (Some(base), Some(quote)) = (&self.base_asset, &self.quote_asset) {
            let _ = writeln!(out, "자산: {} / {}", base, quote);
        }
        let _ = writeln!(out, "캔들 간격:");
        for (interval, summary) in &self.intervals {
            let span = match (summary.first_open_time, summary.last_open_time) {
                (Some(first), Some(last)) => format!(
                    "{} ~ {}",
                    first.format("%Y-%m-%d %H:%M"),
                    last.format("%Y-%m-%d %H:%M")
                ),
                _ => "-".to_string(),
            };
            let _ = writeln!(out, "  {:>4}  {:>8} rows  {}", interval.label(), summary.rows, span);
        }
        out
    }
}

/// 데이터셋 메타데이터와 간격별 요약을 수집합니다.
pub fn dataset_info(path: &Path) -> Result<DatasetInfo> {
    let dataset = TimeSeriesDataset::open(path)
        .with_context(|| format!("Failed to open dataset at {}", path.display()))?;

    let intervals = dataset
        .granularities()
        .into_iter()
        .map(|tf| Ok((tf, dataset.summary(tf)?)))
        .collect::<Result<Vec<_>>>()?;

    Ok(DatasetInfo {
        symbol: dataset.symbol().unwrap_or_default().to_string(),
        date_range: dataset.date_range().map(|range| range.labels()),
        base_asset: dataset.base_asset().map(str::to_string),
        quote_asset: dataset.quote_asset().map(str::to_string),
        intervals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_core::DateRange;
    use trader_data::testing::StaticBarSource;

    const START_MS: i64 = 1_609_459_200_000;

    #[tokio::test]
    async fn test_dataset_info() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("btc");
        let source = StaticBarSource::new()
            .with_series(Timeframe::M5, START_MS, &[100, 101, 102])
            .with_series(Timeframe::H1, START_MS, &[100]);
        let range = DateRange::from_labels("01 Jan, 2021", "02 Jan, 2021").unwrap();
        TimeSeriesDataset::create(&path, "BTCUSDT", range, &[Timeframe::M5, Timeframe::H1], &source)
            .await
            .unwrap();

        let info = dataset_info(&path).unwrap();
        assert_eq!(info.symbol, "BTCUSDT");
        assert_eq!(info.base_asset.as_deref(), Some("BTC"));
        assert_eq!(info.intervals.len(), 2);
        assert_eq!(info.intervals[0].1.rows, 3);

        let text = info.render();
        assert!(text.contains("01 Jan, 2021 ~ 02 Jan, 2021"));
        assert!(text.contains("2021-01-01 00:10"));
    }

    #[test]
    fn test_dataset_info_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(dataset_info(&dir.path().join("nope")).is_err());
    }
}
