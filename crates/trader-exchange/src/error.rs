//! 거래소 에러 타입.

use thiserror::Error;
use trader_core::SourceError;

/// 거래소 관련 에러.
#[derive(Debug, Error)]
pub enum ExchangeError {
    /// 네트워크/연결 에러
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 인증/권한 에러
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// 요청 한도 초과
    #[error("Rate limit exceeded")]
    RateLimited,

    /// API 에러 코드
    #[error("API error {code}: {message}")]
    ApiError { code: i32, message: String },

    /// 파싱/역직렬화 에러
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 잘못된 요청 (심볼, 간격, 기간)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 타임아웃
    #[error("Request timeout: {0}")]
    Timeout(String),

    /// 알 수 없는 에러
    #[error("Unknown error: {0}")]
    Unknown(String),
}

/// 거래소 작업 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

impl ExchangeError {
    /// 인증 에러인지 확인.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ExchangeError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ExchangeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExchangeError::Timeout(err.to_string())
        } else if err.is_connect() || err.is_request() {
            ExchangeError::NetworkError(err.to_string())
        } else {
            ExchangeError::Unknown(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ExchangeError {
    fn from(err: serde_json::Error) -> Self {
        ExchangeError::ParseError(err.to_string())
    }
}

impl From<ExchangeError> for SourceError {
    fn from(err: ExchangeError) -> Self {
        match err {
            ExchangeError::NetworkError(msg) | ExchangeError::Timeout(msg) => {
                SourceError::Network(msg)
            }
            ExchangeError::Unauthorized(msg) => SourceError::Authentication(msg),
            ExchangeError::ParseError(msg) => SourceError::Parse(msg),
            ExchangeError::InvalidRequest(msg) => SourceError::InvalidRequest(msg),
            other @ (ExchangeError::RateLimited
            | ExchangeError::ApiError { .. }
            | ExchangeError::Unknown(_)) => SourceError::Api(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_mapping() {
        assert!(matches!(
            SourceError::from(ExchangeError::Timeout("30s".into())),
            SourceError::Network(_)
        ));
        assert!(matches!(
            SourceError::from(ExchangeError::Unauthorized("bad key".into())),
            SourceError::Authentication(_)
        ));

        let api = SourceError::from(ExchangeError::ApiError {
            code: -1000,
            message: "unknown".into(),
        });
        assert!(api.to_string().contains("-1000"));
    }
}
