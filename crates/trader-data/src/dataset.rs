//! 캔들 시계열 데이터셋.
//!
//! 디렉토리 하나가 데이터셋 하나이며, 디렉토리 경로가 데이터셋의 식별자입니다.
//!
//! ```text
//! <dataset>/
//! ├── dbid.json          # 메타데이터
//! ├── 5m/5m.csv          # 캔들 간격별 테이블
//! └── 1h/1h.csv
//! ```
//!
//! # 사용 예제
//!
//! ```rust,ignore
//! use trader_core::{DateRange, Timeframe};
//! use trader_data::TimeSeriesDataset;
//!
//! let range = DateRange::from_labels("01 Jan, 2021", "01 Feb, 2021").unwrap();
//! let dataset = TimeSeriesDataset::create(
//!     "data/btcusdt", "BTCUSDT", range, &[Timeframe::M5], &binance,
//! ).await?;
//!
//! let closes = dataset.read((Timeframe::M5, "close"))?;
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn, Instrument};
use trader_core::{dataset_span, DateRange, HistoricalBarSource, Symbol, Timeframe};

use crate::error::{DataError, Result};
use crate::index::DatasetIndex;
use crate::normalize::normalize_klines;
use crate::storage::metadata::{DatasetRecord, MetadataStore};
use crate::storage::table::{
    read_columns, read_table, summarize_table, table_file, write_table, IntervalTable,
    TableSummary,
};

/// 캔들 시계열 데이터셋 핸들.
///
/// 메타데이터는 핸들이 살아 있는 동안 메모리에 유지되며, 핸들이 해제되면
/// 항상 디스크에 기록됩니다. 같은 디렉토리에 대한 핸들은 하나만 열어야 합니다.
#[derive(Debug)]
pub struct TimeSeriesDataset {
    path: PathBuf,
    metadata: MetadataStore,
}

impl TimeSeriesDataset {
    /// 기존 데이터셋을 엽니다.
    ///
    /// # Errors
    /// - `DatasetNotFound`: 경로가 존재하지 않음
    /// - `NotADataset`: 디렉토리가 아니거나 메타데이터 파일이 없음
    /// - `Corrupt`: 메타데이터를 해석할 수 없음
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Err(DataError::DatasetNotFound(path));
        }
        if !path.is_dir() || !MetadataStore::exists(&path) {
            return Err(DataError::NotADataset(path));
        }

        let metadata = MetadataStore::open(&path)?;
        info!(
            dataset = %path.display(),
            symbol = metadata.symbol().unwrap_or_default(),
            "Dataset opened"
        );
        Ok(Self { path, metadata })
    }

    /// 과거 캔들을 내려받아 새 데이터셋을 만듭니다.
    ///
    /// 모든 캔들 간격을 내려받은 뒤에 메타데이터를 기록합니다. 중간에 하나라도
    /// 실패하면 만들던 디렉토리 전체를 지우고 오류를 그대로 반환합니다.
    ///
    /// # Errors
    /// - `AlreadyExists`: 경로가 이미 존재함 (파일시스템을 변경하지 않음)
    /// - `InvalidInput`: 심볼이 비어 있거나 캔들 간격이 없음
    /// - `Fetch` / `Validation`: 데이터 소스 실패 또는 결측값 포함
    /// - `Io`: 상위 디렉토리가 없음 (상위 디렉토리는 만들지 않음)
    #[instrument(skip_all, fields(dataset = %base_path.as_ref().display(), symbol = %symbol))]
    pub async fn create<P, S>(
        base_path: P,
        symbol: &str,
        date_range: DateRange,
        granularities: &[Timeframe],
        source: &S,
    ) -> Result<Self>
    where
        P: AsRef<Path>,
        S: HistoricalBarSource + ?Sized,
    {
        let path = base_path.as_ref().to_path_buf();
        if path.exists() {
            return Err(DataError::AlreadyExists(path.display().to_string()));
        }
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(DataError::InvalidInput("symbol must not be empty".into()));
        }

        let mut intervals: Vec<Timeframe> = Vec::with_capacity(granularities.len());
        for tf in granularities {
            if !intervals.contains(tf) {
                intervals.push(*tf);
            }
        }
        if intervals.is_empty() {
            return Err(DataError::InvalidInput(
                "at least one candlestick interval is required".into(),
            ));
        }

        fs::create_dir(&path)?;

        match Self::populate(&path, &symbol, date_range, &intervals, source).await {
            Ok(metadata) => {
                info!(
                    intervals = ?intervals.iter().map(Timeframe::label).collect::<Vec<_>>(),
                    source = source.name(),
                    "Dataset created"
                );
                Ok(Self { path, metadata })
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&path) {
                    warn!(error = %cleanup, "Failed to remove partially created dataset");
                }
                warn!(error = %e, "Dataset creation failed, directory removed");
                Err(e)
            }
        }
    }

    async fn populate<S>(
        path: &Path,
        symbol: &str,
        date_range: DateRange,
        intervals: &[Timeframe],
        source: &S,
    ) -> Result<MetadataStore>
    where
        S: HistoricalBarSource + ?Sized,
    {
        for &tf in intervals {
            download_table(path, symbol, date_range, tf, source)
                .instrument(dataset_span!("download", path, tf))
                .await?;
        }

        let assets = Symbol::from_exchange_symbol(symbol);
        MetadataStore::create(
            path,
            DatasetRecord {
                symbol: symbol.to_string(),
                date_range,
                intervals: intervals.to_vec(),
                base_asset: assets.as_ref().map(|s| s.base.clone()),
                quote_asset: assets.map(|s| s.quote),
            },
        )
    }

    /// 새 캔들 간격을 내려받아 데이터셋에 추가합니다.
    ///
    /// # Errors
    /// - `AlreadyExists`: 메타데이터나 디렉토리에 이미 존재함 (데이터셋 변경 없음)
    /// - 내려받기/검증 실패 시 새 테이블 디렉토리를 지우고 오류를 반환
    pub async fn add_granularity<S>(&mut self, timeframe: Timeframe, source: &S) -> Result<()>
    where
        S: HistoricalBarSource + ?Sized,
    {
        let table_dir = self.path.join(timeframe.label());
        if self.has_granularity(timeframe) || table_dir.exists() {
            return Err(DataError::AlreadyExists(format!(
                "candlestick interval {} in {}",
                timeframe,
                self.path.display()
            )));
        }

        let (symbol, date_range) = self.download_params()?;
        let result = download_table(&self.path, &symbol, date_range, timeframe, source)
            .instrument(dataset_span!("add_granularity", self.path, timeframe))
            .await;

        if let Err(e) = result {
            if table_dir.exists() {
                if let Err(cleanup) = fs::remove_dir_all(&table_dir) {
                    warn!(error = %cleanup, dir = %table_dir.display(), "Failed to remove table directory");
                }
            }
            return Err(e);
        }

        self.metadata.push_interval(timeframe);
        self.metadata.flush()?;
        info!(dataset = %self.path.display(), interval = %timeframe, "Candlestick interval added");
        Ok(())
    }

    fn download_params(&self) -> Result<(String, DateRange)> {
        let symbol = self
            .metadata
            .symbol()
            .ok_or_else(|| DataError::Corrupt("metadata has no symbol".into()))?;
        let date_range = self
            .metadata
            .date_range()
            .ok_or_else(|| DataError::Corrupt("metadata has no valid date range".into()))?;
        Ok((symbol.to_string(), date_range))
    }

    /// 인덱스로 테이블을 읽습니다.
    ///
    /// # Errors
    /// - `GranularityNotFound`: 데이터셋에 없는 캔들 간격
    /// - `TableNotFound`: 메타데이터에는 있으나 테이블 파일이 없음
    /// - `FeatureNotFound`: 테이블에 없는 피처
    /// - `InvalidIndex`: 빈 피처 목록
    pub fn read(&self, index: impl Into<DatasetIndex>) -> Result<IntervalTable> {
        let index = index.into();
        dataset_span!("read", self.path, index).in_scope(|| {
            let table = match &index {
                DatasetIndex::ByGranularity(tf) => read_table(&self.require_table(*tf)?),
                DatasetIndex::ByFeature(tf, name) => {
                    read_columns(&self.require_table(*tf)?, std::slice::from_ref(name))
                        .map_err(feature_not_found)
                }
                DatasetIndex::ByFeatureSet(tf, names) => {
                    if names.is_empty() {
                        return Err(DataError::InvalidIndex(format!(
                            "{}: empty feature list",
                            index
                        )));
                    }
                    read_columns(&self.require_table(*tf)?, names).map_err(feature_not_found)
                }
            }?;
            debug!(rows = table.num_rows(), "Dataset read");
            Ok(table)
        })
    }

    fn require_table(&self, timeframe: Timeframe) -> Result<PathBuf> {
        if !self.has_granularity(timeframe) {
            return Err(DataError::GranularityNotFound(timeframe.label().to_string()));
        }
        let path = table_file(&self.path, timeframe);
        if !path.is_file() {
            return Err(DataError::TableNotFound(path));
        }
        Ok(path)
    }

    /// 캔들 간격이 메타데이터에 등록되어 있는지 확인합니다.
    pub fn has_granularity(&self, timeframe: Timeframe) -> bool {
        self.metadata.intervals().contains(&timeframe)
    }

    /// 등록된 캔들 간격 목록 (등록 순서).
    pub fn granularities(&self) -> Vec<Timeframe> {
        self.metadata.intervals()
    }

    /// 캔들 간격의 테이블 파일 경로. 등록되지 않았거나 파일이 없으면 `None`.
    pub fn table_path(&self, timeframe: Timeframe) -> Option<PathBuf> {
        self.require_table(timeframe).ok()
    }

    /// 테이블 요약 (행 수, 첫/마지막 open_time).
    pub fn summary(&self, timeframe: Timeframe) -> Result<TableSummary> {
        summarize_table(&self.require_table(timeframe)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn symbol(&self) -> Option<&str> {
        self.metadata.symbol()
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.metadata.date_range()
    }

    pub fn base_asset(&self) -> Option<&str> {
        self.metadata.base_asset()
    }

    pub fn quote_asset(&self) -> Option<&str> {
        self.metadata.quote_asset()
    }

    pub fn metadata(&self) -> &MetadataStore {
        &self.metadata
    }

    /// 메타데이터 변경 (디스크 반영은 `flush` 또는 핸들 해제 시).
    pub fn metadata_mut(&mut self) -> &mut MetadataStore {
        &mut self.metadata
    }

    /// 메타데이터를 즉시 기록합니다.
    pub fn flush(&self) -> Result<()> {
        self.metadata.flush()
    }
}

fn feature_not_found(err: DataError) -> DataError {
    match err {
        DataError::ColumnNotFound(name) => DataError::FeatureNotFound(name),
        other => other,
    }
}

async fn download_table<S>(
    dir: &Path,
    symbol: &str,
    date_range: DateRange,
    timeframe: Timeframe,
    source: &S,
) -> Result<usize>
where
    S: HistoricalBarSource + ?Sized,
{
    let (start, end) = date_range.labels();
    debug!(symbol, start = %start, end = %end, "Fetching historical klines");

    let raw = source
        .fetch_historical_bars(symbol, &start, &end, timeframe)
        .await?;
    let bars = normalize_klines(&raw, timeframe)?;
    if bars.is_empty() {
        warn!(symbol, "Data source returned no klines");
    }

    write_table(&table_file(dir, timeframe), &IntervalTable::from_bars(&bars))?;
    info!(symbol, rows = bars.len(), "Klines stored");
    Ok(bars.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::table::Feature;
    use crate::testing::StaticBarSource;

    fn range() -> DateRange {
        DateRange::from_labels("01 Jan, 2021", "02 Jan, 2021").unwrap()
    }

    fn source() -> StaticBarSource {
        StaticBarSource::new()
            .with_series(Timeframe::M5, 1_609_459_200_000, &[100, 101, 102, 103])
            .with_series(Timeframe::H1, 1_609_459_200_000, &[100, 110])
    }

    #[tokio::test]
    async fn test_create_writes_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("btc");
        let dataset = TimeSeriesDataset::create(&path, "btcusdt", range(), &[Timeframe::M5], &source())
            .await
            .unwrap();

        assert_eq!(dataset.symbol(), Some("BTCUSDT"));
        assert_eq!(dataset.base_asset(), Some("BTC"));
        assert_eq!(dataset.quote_asset(), Some("USDT"));
        assert_eq!(dataset.granularities(), vec![Timeframe::M5]);
        assert!(path.join("dbid.json").is_file());
        assert!(path.join("5m").join("5m.csv").is_file());
        assert_eq!(dataset.table_path(Timeframe::H1), None);
    }

    #[tokio::test]
    async fn test_create_dedups_and_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = TimeSeriesDataset::create(
            dir.path().join("a"),
            "BTCUSDT",
            range(),
            &[Timeframe::H1, Timeframe::M5, Timeframe::H1],
            &source(),
        )
        .await
        .unwrap();
        assert_eq!(dataset.granularities(), vec![Timeframe::H1, Timeframe::M5]);

        let err = TimeSeriesDataset::create(dir.path().join("b"), "BTCUSDT", range(), &[], &source())
            .await
            .unwrap_err();
        assert!(matches!(err, DataError::InvalidInput(_)));
        assert!(!dir.path().join("b").exists());
    }

    #[tokio::test]
    async fn test_read_shapes() {
        let dir = tempfile::tempdir().unwrap();
        let dataset =
            TimeSeriesDataset::create(dir.path().join("d"), "BTCUSDT", range(), &[Timeframe::M5], &source())
                .await
                .unwrap();

        let full = dataset.read(Timeframe::M5).unwrap();
        assert_eq!(full.num_rows(), 4);
        assert!(full.index().is_some());

        let single = dataset.read((Timeframe::M5, "close")).unwrap();
        assert_eq!(single.features(), vec![Feature::Close]);
        assert!(single.index().is_none());

        let pair = dataset.read((Timeframe::M5, ["close_time", "close"])).unwrap();
        assert_eq!(pair.features(), vec![Feature::CloseTime, Feature::Close]);

        assert!(matches!(
            dataset.read(Timeframe::H1),
            Err(DataError::GranularityNotFound(label)) if label == "1h"
        ));
        assert!(matches!(
            dataset.read((Timeframe::M5, "vwap")),
            Err(DataError::FeatureNotFound(name)) if name == "vwap"
        ));
        assert!(matches!(
            dataset.read((Timeframe::M5, Vec::<String>::new())),
            Err(DataError::InvalidIndex(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_table_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d");
        let dataset = TimeSeriesDataset::create(&path, "BTCUSDT", range(), &[Timeframe::M5], &source())
            .await
            .unwrap();

        fs::remove_file(path.join("5m").join("5m.csv")).unwrap();
        assert!(matches!(
            dataset.read(Timeframe::M5),
            Err(DataError::TableNotFound(_))
        ));
        assert!(dataset.summary(Timeframe::M5).is_err());
    }

    #[test]
    fn test_open_distinguishes_failures() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            TimeSeriesDataset::open(dir.path().join("missing")),
            Err(DataError::DatasetNotFound(_))
        ));
        assert!(matches!(
            TimeSeriesDataset::open(dir.path()),
            Err(DataError::NotADataset(_))
        ));

        fs::write(dir.path().join("dbid.json"), "not json").unwrap();
        assert!(matches!(
            TimeSeriesDataset::open(dir.path()),
            Err(DataError::Corrupt(_))
        ));
    }
}
