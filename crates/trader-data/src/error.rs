//! 데이터 모듈 오류 타입.

use std::path::PathBuf;
use thiserror::Error;
use trader_core::SourceError;

/// 데이터셋 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 데이터셋 디렉토리가 존재하지 않음
    #[error("Dataset directory not found: {}", .0.display())]
    DatasetNotFound(PathBuf),

    /// 디렉토리는 존재하지만 데이터셋이 아님 (메타데이터 없음)
    #[error("Not a dataset (no metadata file): {}", .0.display())]
    NotADataset(PathBuf),

    /// 메타데이터 파일이 존재하지 않음
    #[error("Metadata file not found: {}", .0.display())]
    MetadataNotFound(PathBuf),

    /// 캔들 간격이 데이터셋에 없음
    #[error("Candlestick interval not available in this dataset: {0}")]
    GranularityNotFound(String),

    /// 요청한 피처가 테이블에 없음
    #[error("Feature not available in this dataset: {0}")]
    FeatureNotFound(String),

    /// 테이블 파일이 존재하지 않음
    #[error("Table not found: {}", .0.display())]
    TableNotFound(PathBuf),

    /// 요청한 컬럼이 테이블 파일에 없음
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// 파일을 해석할 수 없음
    #[error("Corrupt data: {0}")]
    Corrupt(String),

    /// 데이터 품질 검증 실패 (결측값, 필드 수 부족 등)
    #[error("Validation error: {0}")]
    Validation(String),

    /// 생성 대상이 이미 존재함
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// 지원하지 않는 인덱스 형태
    #[error("Invalid index: {0}")]
    InvalidIndex(String),

    /// 잘못된 인자
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// 데이터 가져오기 오류 (외부 소스)
    #[error("Fetch error: {0}")]
    Fetch(#[from] SourceError),

    /// 입출력 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DataError {
    fn from(err: serde_json::Error) -> Self {
        DataError::Corrupt(err.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            match err.into_kind() {
                csv::ErrorKind::Io(io) => DataError::Io(io),
                other => DataError::Corrupt(format!("{:?}", other)),
            }
        } else {
            DataError::Corrupt(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
