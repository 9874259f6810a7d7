//! 캔들 시계열 데이터셋 저장소.
//!
//! 이 crate는 다음을 제공합니다:
//! - 데이터셋 메타데이터 저장소 (`dbid.json`)
//! - 캔들 간격별 CSV 테이블 읽기/쓰기 (컬럼 선택 읽기 지원)
//! - 데이터 소스 원시 캔들 정규화
//! - 데이터셋 생성, 캔들 간격 추가, 인덱스 기반 읽기

pub mod dataset;
pub mod error;
pub mod index;
pub mod normalize;
pub mod storage;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use dataset::TimeSeriesDataset;
pub use error::{DataError, Result};
pub use index::DatasetIndex;
pub use normalize::{normalize_klines, Bar};
pub use storage::metadata::{DatasetRecord, MetadataStore, METADATA_FILE};
pub use storage::table::{Column, Feature, IntervalTable, TableSummary};
