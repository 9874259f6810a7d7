//! 기존 데이터셋에 캔들 간격 추가 명령어.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;
use trader_core::{HistoricalBarSource, Timeframe};
use trader_data::{TableSummary, TimeSeriesDataset};

use super::spinner;

/// 데이터셋을 열어 새 간격의 캔들을 다운로드합니다.
///
/// 반환값은 추가된 테이블의 요약입니다.
pub async fn add_interval<S>(path: &Path, interval: Timeframe, source: &S) -> Result<TableSummary>
where
    S: HistoricalBarSource + ?Sized,
{
    let mut dataset = TimeSeriesDataset::open(path)
        .with_context(|| format!("Failed to open dataset at {}", path.display()))?;

    let pb = spinner(format!(
        "Downloading {} {} from {}...",
        dataset.symbol().unwrap_or("?"),
        interval,
        source.name()
    ));
    let result = dataset
        .add_granularity(interval, source)
        .await
        .with_context(|| format!("Failed to add interval {}", interval));
    pb.finish_and_clear();
    result?;

    let summary = dataset.summary(interval)?;
    info!(
        path = %path.display(),
        interval = %interval,
        rows = summary.rows,
        "Interval added"
    );
    Ok(summary)
}
