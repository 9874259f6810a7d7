//! 트레이딩 시스템의 공통 에러 타입.

use thiserror::Error;

/// 핵심 트레이딩 에러.
#[derive(Debug, Error)]
pub enum TraderError {
    /// 설정 에러 (설정 파일 누락/문법 오류/필수 값 누락)
    #[error("설정 에러: {0}")]
    Config(String),

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),
}

/// 트레이딩 작업을 위한 Result 타입.
pub type TraderResult<T> = Result<T, TraderError>;

impl TraderError {
    /// 설정 문제로 인한 에러인지 확인합니다.
    pub fn is_config(&self) -> bool {
        matches!(self, TraderError::Config(_))
    }
}

impl From<config::ConfigError> for TraderError {
    fn from(err: config::ConfigError) -> Self {
        TraderError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_conversion() {
        let err: TraderError = config::ConfigError::Message("missing field".into()).into();
        assert!(err.is_config());
        assert!(err.to_string().contains("missing field"));

        let input = TraderError::InvalidInput("numSteps must be >= 1".into());
        assert!(!input.is_config());
    }
}
