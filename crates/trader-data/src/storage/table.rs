//! 캔들 간격별 테이블 (`<dataset>/<interval>/<interval>.csv`).
//!
//! 컬럼 지향 테이블로 메모리에 적재합니다. 컬럼 선택 읽기는 요청된 컬럼만 파싱하므로
//! 시뮬레이션처럼 `close`만 필요한 경우 나머지 OHLCV 컬럼을 만들지 않습니다.
//!
//! # 파일 형식
//!
//! ```text
//! index,open_time,open,high,low,close,volume,close_time
//! 0,2021-01-01 00:00:00,28923.63,29031.34,28690.17,28995.13,2311.811445,2021-01-01 00:05:00
//! ```
//!
//! 타임스탬프는 UTC `YYYY-MM-DD HH:MM:SS[.fff]`로 기록합니다. 읽을 때는 날짜만 있는 값,
//! RFC 3339, epoch 밀리초 정수도 허용합니다.
//!
//! `index` 컬럼은 피처가 아닙니다. 전체 읽기에서 행 위치로 다시 만들어지며
//! (`IntervalTable::index`), 이름으로 선택하면 `ColumnNotFound`입니다.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use trader_core::{parse_decimal, Timeframe};

use crate::error::{DataError, Result};
use crate::normalize::Bar;

/// 행 인덱스 컬럼 이름.
pub const INDEX_COLUMN: &str = "index";

const TIMESTAMP_WRITE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";

/// 테이블 피처 (컬럼).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    OpenTime,
    Open,
    High,
    Low,
    Close,
    Volume,
    CloseTime,
}

impl Feature {
    /// 디스크 상의 컬럼 순서.
    pub const ALL: [Feature; 7] = [
        Feature::OpenTime,
        Feature::Open,
        Feature::High,
        Feature::Low,
        Feature::Close,
        Feature::Volume,
        Feature::CloseTime,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Feature::OpenTime => "open_time",
            Feature::Open => "open",
            Feature::High => "high",
            Feature::Low => "low",
            Feature::Close => "close",
            Feature::Volume => "volume",
            Feature::CloseTime => "close_time",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }

    /// 타임스탬프 컬럼 여부.
    pub fn is_timestamp(&self) -> bool {
        matches!(self, Feature::OpenTime | Feature::CloseTime)
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 컬럼 값.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Number(Vec<Decimal>),
    Timestamp(Vec<DateTime<Utc>>),
}

impl Column {
    fn empty_for(feature: Feature) -> Self {
        if feature.is_timestamp() {
            Column::Timestamp(Vec::new())
        } else {
            Column::Number(Vec::new())
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Column::Number(v) => v.len(),
            Column::Timestamp(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_numbers(&self) -> Option<&[Decimal]> {
        match self {
            Column::Number(v) => Some(v),
            Column::Timestamp(_) => None,
        }
    }

    pub fn as_timestamps(&self) -> Option<&[DateTime<Utc>]> {
        match self {
            Column::Timestamp(v) => Some(v),
            Column::Number(_) => None,
        }
    }

    fn cell(&self, row: usize) -> String {
        match self {
            Column::Number(v) => v[row].normalize().to_string(),
            Column::Timestamp(v) => v[row].format(TIMESTAMP_WRITE_FORMAT).to_string(),
        }
    }

    fn truncate(&mut self, len: usize) {
        match self {
            Column::Number(v) => v.truncate(len),
            Column::Timestamp(v) => v.truncate(len),
        }
    }

    fn push_parsed(&mut self, raw: &str, feature: Feature, row: usize) -> Result<()> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(DataError::Validation(format!(
                "null value in column '{}' at row {}",
                feature, row
            )));
        }

        let bad = || {
            DataError::Corrupt(format!(
                "column '{}' row {}: cannot parse {:?}",
                feature, row, raw
            ))
        };
        match self {
            Column::Number(v) => v.push(parse_decimal(raw).ok_or_else(bad)?),
            Column::Timestamp(v) => v.push(parse_timestamp(raw).ok_or_else(bad)?),
        }
        Ok(())
    }
}

/// 저장된 타임스탬프 문자열을 UTC 시각으로 해석합니다.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, TIMESTAMP_WRITE_FORMAT) {
        return Some(Utc.from_utc_datetime(&naive));
    }
    // 모든 값이 자정이면 날짜만 기록된 파일이 있음
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
}

/// 메모리에 적재된 캔들 테이블.
///
/// 전체 읽기는 행 인덱스를 포함하고, 컬럼 선택 읽기는 인덱스 없이 요청 순서대로
/// 컬럼을 담습니다.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTable {
    index: Option<Vec<usize>>,
    columns: Vec<(Feature, Column)>,
}

impl IntervalTable {
    /// 정규화된 캔들로 전체 테이블을 만듭니다.
    pub fn from_bars(bars: &[Bar]) -> Self {
        let mut columns: Vec<(Feature, Column)> = Feature::ALL
            .into_iter()
            .map(|f| (f, Column::empty_for(f)))
            .collect();

        for bar in bars {
            for (feature, column) in columns.iter_mut() {
                match column {
                    Column::Timestamp(v) => v.push(match feature {
                        Feature::OpenTime => bar.open_time,
                        _ => bar.close_time,
                    }),
                    Column::Number(v) => v.push(match feature {
                        Feature::Open => bar.open,
                        Feature::High => bar.high,
                        Feature::Low => bar.low,
                        Feature::Close => bar.close,
                        _ => bar.volume,
                    }),
                }
            }
        }

        Self {
            index: Some((0..bars.len()).collect()),
            columns,
        }
    }

    /// 행 인덱스 (전체 읽기에서만 존재).
    pub fn index(&self) -> Option<&[usize]> {
        self.index.as_deref()
    }

    pub fn num_rows(&self) -> usize {
        self.columns
            .first()
            .map(|(_, c)| c.len())
            .or_else(|| self.index.as_ref().map(Vec::len))
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows() == 0
    }

    /// 컬럼 순서대로의 피처 목록.
    pub fn features(&self) -> Vec<Feature> {
        self.columns.iter().map(|(f, _)| *f).collect()
    }

    pub fn columns(&self) -> &[(Feature, Column)] {
        &self.columns
    }

    pub fn column(&self, feature: Feature) -> Option<&Column> {
        self.columns
            .iter()
            .find(|(f, _)| *f == feature)
            .map(|(_, c)| c)
    }

    pub fn numbers(&self, feature: Feature) -> Option<&[Decimal]> {
        self.column(feature).and_then(Column::as_numbers)
    }

    pub fn timestamps(&self, feature: Feature) -> Option<&[DateTime<Utc>]> {
        self.column(feature).and_then(Column::as_timestamps)
    }

    /// 앞쪽 `n`개 행만 남긴 테이블을 반환합니다.
    pub fn head(mut self, n: usize) -> Self {
        if let Some(index) = self.index.as_mut() {
            index.truncate(n);
        }
        for (_, column) in self.columns.iter_mut() {
            column.truncate(n);
        }
        self
    }

    /// 일곱 컬럼이 모두 같은 길이로 디스크 순서대로 있는지 검증합니다.
    pub fn validate(&self) -> Result<()> {
        if self.features() != Feature::ALL {
            return Err(DataError::Validation(format!(
                "table must contain exactly the columns {:?}, got {:?}",
                Feature::ALL.map(|f| f.name()),
                self.features().iter().map(Feature::name).collect::<Vec<_>>()
            )));
        }
        let rows = self.num_rows();
        if let Some((feature, _)) = self.columns.iter().find(|(_, c)| c.len() != rows) {
            return Err(DataError::Validation(format!(
                "column '{}' length differs from {} rows",
                feature, rows
            )));
        }
        Ok(())
    }

    /// CSV로 기록합니다. 행 인덱스가 있으면 첫 컬럼으로 씁니다.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);

        let mut header: Vec<&str> = Vec::with_capacity(self.columns.len() + 1);
        if self.index.is_some() {
            header.push(INDEX_COLUMN);
        }
        header.extend(self.columns.iter().map(|(f, _)| f.name()));
        wtr.write_record(&header)?;

        for row in 0..self.num_rows() {
            let mut record: Vec<String> = Vec::with_capacity(header.len());
            if let Some(index) = &self.index {
                record.push(index[row].to_string());
            }
            record.extend(self.columns.iter().map(|(_, c)| c.cell(row)));
            wtr.write_record(&record)?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// 데이터셋 디렉토리 기준 캔들 간격 테이블 경로.
pub fn table_file(dataset_dir: &Path, timeframe: Timeframe) -> PathBuf {
    let label = timeframe.label();
    dataset_dir.join(label).join(format!("{}.csv", label))
}

/// 전체 테이블을 기록합니다. 상위 디렉토리가 없으면 만듭니다.
///
/// 행 인덱스는 0부터 시작하는 연속 값으로 다시 매깁니다.
pub fn write_table(path: &Path, table: &IntervalTable) -> Result<()> {
    table.validate()?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let dense = IntervalTable {
        index: Some((0..table.num_rows()).collect()),
        columns: table.columns.clone(),
    };
    dense.write_csv(File::create(path)?)?;

    debug!(path = %path.display(), rows = dense.num_rows(), "Table written");
    Ok(())
}

/// 모든 컬럼을 행 인덱스와 함께 읽습니다.
pub fn read_table(path: &Path) -> Result<IntervalTable> {
    let mut table = read_selected(path, &Feature::ALL)?;
    table.index = Some((0..table.num_rows()).collect());
    Ok(table)
}

/// 요청한 컬럼만 요청 순서대로 읽습니다 (행 인덱스 없음).
///
/// # Errors
/// - `TableNotFound`: 테이블 파일 없음
/// - `ColumnNotFound`: 알 수 없는 컬럼 이름 또는 파일에 없는 컬럼
pub fn read_columns<S: AsRef<str>>(path: &Path, names: &[S]) -> Result<IntervalTable> {
    let features = names
        .iter()
        .map(|n| {
            Feature::from_name(n.as_ref())
                .ok_or_else(|| DataError::ColumnNotFound(n.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>>>()?;
    read_selected(path, &features)
}

fn read_selected(path: &Path, features: &[Feature]) -> Result<IntervalTable> {
    if !path.is_file() {
        return Err(DataError::TableNotFound(path.to_path_buf()));
    }

    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    let positions = features
        .iter()
        .map(|f| {
            headers
                .iter()
                .position(|h| h.trim() == f.name())
                .ok_or_else(|| DataError::ColumnNotFound(f.name().to_string()))
        })
        .collect::<Result<Vec<_>>>()?;

    let mut columns: Vec<(Feature, Column)> = features
        .iter()
        .map(|&f| (f, Column::empty_for(f)))
        .collect();

    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        for ((feature, column), &pos) in columns.iter_mut().zip(&positions) {
            let raw = record.get(pos).unwrap_or("");
            column.push_parsed(raw, *feature, row)?;
        }
    }

    let table = IntervalTable {
        index: None,
        columns,
    };
    debug!(
        path = %path.display(),
        rows = table.num_rows(),
        columns = features.len(),
        "Table read"
    );
    Ok(table)
}

/// 테이블 요약 (CLI `info`용).
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub rows: usize,
    pub first_open_time: Option<DateTime<Utc>>,
    pub last_open_time: Option<DateTime<Utc>>,
}

/// `open_time` 컬럼만 읽어 요약을 만듭니다.
pub fn summarize_table(path: &Path) -> Result<TableSummary> {
    let table = read_selected(path, &[Feature::OpenTime])?;
    let times = table.timestamps(Feature::OpenTime).unwrap_or(&[]);
    Ok(TableSummary {
        rows: times.len(),
        first_open_time: times.first().copied(),
        last_open_time: times.last().copied(),
    })
}
