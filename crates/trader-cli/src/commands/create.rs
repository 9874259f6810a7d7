//! 새 캔들 데이터셋 생성 명령어.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::info;
use trader_core::{DateRange, HistoricalBarSource, Timeframe};
use trader_data::TimeSeriesDataset;

use super::spinner;

/// 생성 설정
#[derive(Debug, Clone)]
pub struct CreateConfig {
    pub path: PathBuf,
    pub symbol: String,
    pub date_range: DateRange,
    pub intervals: Vec<Timeframe>,
}

/// 데이터셋을 생성하고 모든 간격의 캔들을 다운로드합니다.
pub async fn create_dataset<S>(config: &CreateConfig, source: &S) -> Result<TimeSeriesDataset>
where
    S: HistoricalBarSource + ?Sized,
{
    let labels: Vec<&str> = config.intervals.iter().map(|tf| tf.label()).collect();
    let pb = spinner(format!(
        "Downloading {} [{}] from {}...",
        config.symbol.to_uppercase(),
        labels.join(", "),
        source.name()
    ));

    let result = TimeSeriesDataset::create(
        &config.path,
        &config.symbol,
        config.date_range,
        &config.intervals,
        source,
    )
    .await
    .with_context(|| format!("Failed to create dataset at {}", config.path.display()));

    match &result {
        Ok(_) => pb.finish_with_message("Download completed"),
        Err(_) => pb.finish_and_clear(),
    }

    let dataset = result?;
    info!(
        path = %dataset.path().display(),
        symbol = %config.symbol,
        intervals = ?labels,
        "Dataset created"
    );
    Ok(dataset)
}
