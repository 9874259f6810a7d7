//! 데이터셋 메타데이터 저장소 (`dbid.json`).
//!
//! 하나의 데이터셋 인스턴스를 설명하는 키-값 레코드입니다:
//! 심볼, 날짜 범위, 저장된 캔들 간격 목록, 기준/호가 자산.
//!
//! # 수명 주기
//!
//! - 열 때 전체 레코드를 메모리로 읽습니다.
//! - `set`은 메모리만 변경하고 `flush`가 디스크에 기록합니다.
//! - 핸들이 드롭되면 `flush`가 무조건 실행되므로 명시적으로 호출하지 않아도 변경이
//!   유실되지 않습니다. 같은 경로에 대한 동시 핸들은 지원하지 않습니다 (단일 writer).
//!
//! `flush`는 임시 파일에 쓴 뒤 rename하므로 기록 도중 실패해도 기존 파일이 손상되지 않습니다.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};
use trader_core::{DateRange, Timeframe};

use crate::error::{DataError, Result};

/// 메타데이터 파일 이름.
pub const METADATA_FILE: &str = "dbid.json";

pub const KEY_SYMBOL: &str = "symbol";
pub const KEY_DATE_RANGE: &str = "date_range";
pub const KEY_INTERVALS: &str = "candlestick_interval";
pub const KEY_BASE_ASSET: &str = "base_asset";
pub const KEY_QUOTE_ASSET: &str = "quote_asset";

/// 새 데이터셋의 초기 메타데이터.
#[derive(Debug, Clone)]
pub struct DatasetRecord {
    pub symbol: String,
    pub date_range: DateRange,
    pub intervals: Vec<Timeframe>,
    pub base_asset: Option<String>,
    pub quote_asset: Option<String>,
}

impl DatasetRecord {
    fn into_map(self) -> Map<String, Value> {
        let (start, end) = self.date_range.labels();
        let mut map = Map::new();
        map.insert(KEY_SYMBOL.into(), Value::String(self.symbol));
        map.insert(
            KEY_DATE_RANGE.into(),
            Value::Array(vec![Value::String(start), Value::String(end)]),
        );
        map.insert(
            KEY_INTERVALS.into(),
            Value::Array(
                self.intervals
                    .iter()
                    .map(|tf| Value::String(tf.label().to_string()))
                    .collect(),
            ),
        );
        if let Some(base) = self.base_asset {
            map.insert(KEY_BASE_ASSET.into(), Value::String(base));
        }
        if let Some(quote) = self.quote_asset {
            map.insert(KEY_QUOTE_ASSET.into(), Value::String(quote));
        }
        map
    }
}

/// 메타데이터 키-값 저장소.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    record: Map<String, Value>,
}

impl MetadataStore {
    /// 데이터셋 디렉토리의 메타데이터 파일 경로를 반환합니다.
    pub fn file_path(dataset_dir: &Path) -> PathBuf {
        dataset_dir.join(METADATA_FILE)
    }

    /// 메타데이터 파일이 존재하는지 확인합니다.
    pub fn exists(dataset_dir: &Path) -> bool {
        Self::file_path(dataset_dir).is_file()
    }

    /// 기존 메타데이터를 엽니다.
    ///
    /// # Errors
    /// - `MetadataNotFound`: 파일 없음
    /// - `Corrupt`: JSON 객체로 해석할 수 없거나 필수 키(`symbol`, `date_range`,
    ///   `candlestick_interval`)가 잘못됨
    pub fn open(dataset_dir: &Path) -> Result<Self> {
        let path = Self::file_path(dataset_dir);
        if !path.is_file() {
            return Err(DataError::MetadataNotFound(path));
        }

        let content = fs::read_to_string(&path)?;
        let value: Value = serde_json::from_str(&content).map_err(|e| {
            DataError::Corrupt(format!("{} is not valid JSON: {}", path.display(), e))
        })?;
        let Value::Object(record) = value else {
            return Err(DataError::Corrupt(format!(
                "{} must contain a JSON object",
                path.display()
            )));
        };

        check_required(&path, &record)?;
        let store = Self { path, record };

        debug!(
            path = %store.path.display(),
            intervals = store.intervals().len(),
            "Metadata loaded"
        );
        Ok(store)
    }

    /// 새 메타데이터를 생성하고 즉시 기록합니다.
    pub fn create(dataset_dir: &Path, record: DatasetRecord) -> Result<Self> {
        let store = Self {
            path: Self::file_path(dataset_dir),
            record: record.into_map(),
        };
        store.flush()?;
        Ok(store)
    }

    /// 메타데이터 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 키 값을 조회합니다.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    /// 키 값을 설정합니다 (메모리만 변경).
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.record.insert(key.into(), value.into());
    }

    pub fn symbol(&self) -> Option<&str> {
        self.get(KEY_SYMBOL).and_then(Value::as_str)
    }

    pub fn date_range(&self) -> Option<DateRange> {
        record_date_range(&self.record)
    }

    /// 저장된 캔들 간격 목록 (기록된 순서).
    pub fn intervals(&self) -> Vec<Timeframe> {
        self.get(KEY_INTERVALS)
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(|v| v.as_str().and_then(Timeframe::from_label))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// 캔들 간격을 목록 끝에 추가합니다 (이미 있으면 무시).
    pub fn push_interval(&mut self, timeframe: Timeframe) {
        let mut intervals = self.intervals();
        if intervals.contains(&timeframe) {
            return;
        }
        intervals.push(timeframe);
        self.set(
            KEY_INTERVALS,
            intervals
                .iter()
                .map(|tf| Value::String(tf.label().to_string()))
                .collect::<Vec<_>>(),
        );
    }

    pub fn base_asset(&self) -> Option<&str> {
        self.get(KEY_BASE_ASSET).and_then(Value::as_str)
    }

    pub fn quote_asset(&self) -> Option<&str> {
        self.get(KEY_QUOTE_ASSET).and_then(Value::as_str)
    }

    /// 메모리의 전체 레코드를 디스크에 기록합니다.
    pub fn flush(&self) -> Result<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.record.serialize(&mut serializer)?;

        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = File::create(&tmp_path)?;
            file.write_all(&buf)?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;

        debug!(path = %self.path.display(), "Metadata flushed");
        Ok(())
    }
}

fn record_date_range(record: &Map<String, Value>) -> Option<DateRange> {
    match record.get(KEY_DATE_RANGE)?.as_array()?.as_slice() {
        [start, end] => DateRange::from_labels(start.as_str()?, end.as_str()?),
        _ => None,
    }
}

/// 필수 키 검증 (핸들 생성 전).
fn check_required(path: &Path, record: &Map<String, Value>) -> Result<()> {
    let corrupt = |what: &str| DataError::Corrupt(format!("{}: {}", path.display(), what));

    if record.get(KEY_SYMBOL).and_then(Value::as_str).is_none() {
        return Err(corrupt("missing string key 'symbol'"));
    }
    if record_date_range(record).is_none() {
        return Err(corrupt("'date_range' must be two date labels, start <= end"));
    }
    let labels = record
        .get(KEY_INTERVALS)
        .and_then(Value::as_array)
        .ok_or_else(|| corrupt("missing array key 'candlestick_interval'"))?;
    for label in labels {
        let parsed = label.as_str().and_then(Timeframe::from_label);
        if parsed.is_none() {
            return Err(corrupt(&format!("unknown candlestick interval {}", label)));
        }
    }
    Ok(())
}

impl Drop for MetadataStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to flush metadata on release"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record() -> DatasetRecord {
        DatasetRecord {
            symbol: "BTCUSDT".to_string(),
            date_range: DateRange::new(
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
            )
            .unwrap(),
            intervals: vec![Timeframe::M5],
            base_asset: Some("BTC".to_string()),
            quote_asset: Some("USDT".to_string()),
        }
    }

    #[test]
    fn test_create_and_open() {
        let dir = tempfile::tempdir().unwrap();
        drop(MetadataStore::create(dir.path(), record()).unwrap());

        let store = MetadataStore::open(dir.path()).unwrap();
        assert_eq!(store.symbol(), Some("BTCUSDT"));
        assert_eq!(store.intervals(), vec![Timeframe::M5]);
        assert_eq!(store.base_asset(), Some("BTC"));
        assert_eq!(store.quote_asset(), Some("USDT"));
        assert_eq!(
            store.date_range().unwrap().labels(),
            ("01 Jan, 2021".to_string(), "01 Feb, 2021".to_string())
        );
    }

    #[test]
    fn test_file_layout_is_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        drop(MetadataStore::create(dir.path(), record()).unwrap());

        let content = fs::read_to_string(dir.path().join(METADATA_FILE)).unwrap();
        assert!(content.contains("\n    \"symbol\": \"BTCUSDT\""));
        let value: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value["candlestick_interval"], serde_json::json!(["5m"]));
        assert_eq!(
            value["date_range"],
            serde_json::json!(["01 Jan, 2021", "01 Feb, 2021"])
        );
        assert!(!dir.path().join("dbid.json.tmp").exists());
    }

    #[test]
    fn test_open_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            MetadataStore::open(dir.path()),
            Err(DataError::MetadataNotFound(_))
        ));

        fs::write(dir.path().join(METADATA_FILE), "{ nope").unwrap();
        assert!(matches!(
            MetadataStore::open(dir.path()),
            Err(DataError::Corrupt(_))
        ));

        fs::write(dir.path().join(METADATA_FILE), r#"{"symbol": "BTCUSDT"}"#).unwrap();
        assert!(matches!(
            MetadataStore::open(dir.path()),
            Err(DataError::Corrupt(_))
        ));
    }

    #[test]
    fn test_rejected_metadata_is_left_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join(METADATA_FILE);
        let original = r#"{"symbol":"BTCUSDT","candlestick_interval":["5m"]}"#;
        fs::write(&file, original).unwrap();

        assert!(matches!(
            MetadataStore::open(dir.path()),
            Err(DataError::Corrupt(_))
        ));
        assert_eq!(fs::read_to_string(&file).unwrap(), original);
        assert!(!dir.path().join("dbid.json.tmp").exists());
    }

    #[test]
    fn test_set_is_persisted_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        drop(MetadataStore::create(dir.path(), record()).unwrap());

        {
            let mut store = MetadataStore::open(dir.path()).unwrap();
            store.set("note", "added later");
            store.push_interval(Timeframe::H1);
            store.push_interval(Timeframe::H1);
            // flush 호출 없이 스코프 종료
        }

        let store = MetadataStore::open(dir.path()).unwrap();
        assert_eq!(store.get("note"), Some(&Value::from("added later")));
        assert_eq!(store.intervals(), vec![Timeframe::M5, Timeframe::H1]);
    }

    #[test]
    fn test_unknown_keys_preserved() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(METADATA_FILE),
            r#"{"symbol": "ETHUSDT", "date_range": ["01 Jan, 2021", "02 Jan, 2021"],
                "candlestick_interval": ["1h"], "source": "legacy"}"#,
        )
        .unwrap();

        {
            let store = MetadataStore::open(dir.path()).unwrap();
            store.flush().unwrap();
        }

        let store = MetadataStore::open(dir.path()).unwrap();
        assert_eq!(store.get("source"), Some(&Value::from("legacy")));
        assert!(store.base_asset().is_none());
    }
}
