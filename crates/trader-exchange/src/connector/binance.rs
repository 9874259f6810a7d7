//! Binance 거래소 커넥터.
//!
//! Binance Spot REST API의 과거 캔들(`/api/v3/klines`) 조회 구현.
//! 한 번에 최대 1000개씩 페이지 단위로 내려받아 기간 전체를 이어 붙입니다.

use std::fmt;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info};
use trader_core::{
    date_label_to_millis, CredentialsConfig, HistoricalBarSource, RawKline, SourceError,
    Timeframe,
};

use crate::error::{ExchangeError, ExchangeResult};

/// 자격증명 문서에서 Binance 항목의 이름.
pub const BINANCE_PROVIDER: &str = "binance";

/// `/api/v3/klines` 한 번의 요청에서 받을 수 있는 최대 캔들 수.
pub const MAX_KLINES_PER_REQUEST: u16 = 1000;

// ============================================================================
// 설정
// ============================================================================

/// Binance 클라이언트 설정.
///
/// # 보안
/// - `Debug` 구현은 `api_key`를 마스킹합니다.
#[derive(Clone)]
pub struct BinanceConfig {
    /// API 키 (공개 엔드포인트에서는 선택)
    pub api_key: Option<String>,
    /// 테스트넷 사용
    pub testnet: bool,
    /// REST 기본 URL 재정의 (테스트용 목 서버 등)
    pub base_url: Option<String>,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 페이지당 캔들 수
    pub page_limit: u16,
}

impl fmt::Debug for BinanceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let masked_key = match &self.api_key {
            Some(key) if key.len() > 8 => {
                format!("{}...{}", &key[..4], &key[key.len() - 4..])
            }
            Some(_) => "***REDACTED***".to_string(),
            None => "<none>".to_string(),
        };

        f.debug_struct("BinanceConfig")
            .field("api_key", &masked_key)
            .field("testnet", &self.testnet)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("page_limit", &self.page_limit)
            .finish()
    }
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            testnet: false,
            base_url: None,
            timeout_secs: 30,
            page_limit: MAX_KLINES_PER_REQUEST,
        }
    }
}

impl BinanceConfig {
    /// API 키로 설정 생성.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// 자격증명 문서의 `binance` 항목으로 설정 생성.
    ///
    /// 항목이 없거나 키가 비어 있으면 키 없이 공개 엔드포인트만 사용합니다.
    pub fn from_credentials(credentials: &CredentialsConfig) -> Self {
        let api_key = credentials
            .get(BINANCE_PROVIDER)
            .map(|c| c.key.trim().to_string())
            .filter(|k| !k.is_empty());

        Self {
            api_key,
            ..Default::default()
        }
    }

    /// 테스트넷 사용.
    pub fn with_testnet(mut self, testnet: bool) -> Self {
        self.testnet = testnet;
        self
    }

    /// REST 기본 URL 재정의.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// 페이지당 캔들 수 설정 (1..=1000).
    pub fn with_page_limit(mut self, limit: u16) -> Self {
        self.page_limit = limit.clamp(1, MAX_KLINES_PER_REQUEST);
        self
    }

    /// REST API 기본 URL 반환.
    pub fn rest_base_url(&self) -> &str {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/');
        }
        if self.testnet {
            "https://testnet.binance.vision"
        } else {
            "https://api.binance.com"
        }
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

/// Binance 거래소 클라이언트.
pub struct BinanceClient {
    config: BinanceConfig,
    client: Client,
}

impl fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BinanceClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BinanceClient {
    /// 새 Binance 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: BinanceConfig) -> Result<Self, ExchangeError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                ExchangeError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// 자격증명 문서에서 생성.
    pub fn from_credentials(credentials: &CredentialsConfig) -> Result<Self, ExchangeError> {
        Self::new(BinanceConfig::from_credentials(credentials))
    }

    pub fn config(&self) -> &BinanceConfig {
        &self.config
    }

    /// 파라미터에서 쿼리 문자열 생성.
    fn build_query(params: &[(&str, String)]) -> String {
        params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }

    /// 공개 API 요청. API 키가 있으면 `X-MBX-APIKEY` 헤더로 보냅니다.
    async fn public_get<T: for<'de> Deserialize<'de>>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}{}", self.config.rest_base_url(), endpoint);
        let query = Self::build_query(params);

        let full_url = if query.is_empty() {
            url
        } else {
            format!("{}?{}", url, query)
        };

        debug!("GET {}", full_url);

        let mut request = self.client.get(&full_url);
        if let Some(key) = &self.config.api_key {
            request = request.header("X-MBX-APIKEY", key);
        }
        let response = request.send().await?;

        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExchangeError::NetworkError(e.to_string()))?;

        if status.is_success() {
            serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ExchangeError::ParseError(e.to_string())
            })
        } else if status.as_u16() == 429 || status.as_u16() == 418 {
            Err(ExchangeError::RateLimited)
        } else if let Ok(error) = serde_json::from_str::<BinanceError>(&body) {
            Err(self.map_error_code(error.code, &error.msg))
        } else {
            Err(ExchangeError::ApiError {
                code: status.as_u16() as i32,
                message: body,
            })
        }
    }

    /// Binance 에러 코드를 ExchangeError로 매핑.
    fn map_error_code(&self, code: i32, msg: &str) -> ExchangeError {
        match code {
            -1002 | -2014 | -2015 => ExchangeError::Unauthorized(msg.to_string()),
            -1003 => ExchangeError::RateLimited,
            -1100 | -1120 | -1121 => ExchangeError::InvalidRequest(msg.to_string()),
            _ => ExchangeError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    /// 기간 내 과거 캔들을 모두 조회합니다.
    ///
    /// `startTime`부터 페이지 단위로 요청하고, 다음 페이지는 마지막 캔들의
    /// open_time + 간격에서 시작합니다. 빈 페이지, 페이지 크기보다 짧은 응답,
    /// 또는 `end_ms`를 넘어서면 종료합니다. 재시도하지 않습니다.
    ///
    /// 각 레코드는 Binance 원본 12개 필드를 그대로 담습니다.
    pub async fn get_historical_klines(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        start_ms: i64,
        end_ms: i64,
    ) -> ExchangeResult<Vec<RawKline>> {
        if start_ms > end_ms {
            return Err(ExchangeError::InvalidRequest(format!(
                "start {} is after end {}",
                start_ms, end_ms
            )));
        }

        let symbol = symbol.replace('/', "").to_uppercase();
        let interval_ms = timeframe.as_millis();
        let limit = self.config.page_limit;
        let mut cursor = start_ms;
        let mut klines: Vec<RawKline> = Vec::new();
        let mut pages = 0usize;

        loop {
            let page: Vec<RawKline> = self
                .public_get(
                    "/api/v3/klines",
                    &[
                        ("symbol", symbol.clone()),
                        ("interval", timeframe.label().to_string()),
                        ("startTime", cursor.to_string()),
                        ("endTime", end_ms.to_string()),
                        ("limit", limit.to_string()),
                    ],
                )
                .await?;
            pages += 1;

            let Some(last) = page.last() else {
                break;
            };
            let last_open = open_time_of(last)?;
            let page_len = page.len();
            klines.extend(page);

            cursor = last_open + interval_ms;
            if page_len < limit as usize || cursor > end_ms {
                break;
            }
        }

        info!(
            symbol = %symbol,
            interval = %timeframe,
            pages,
            klines = klines.len(),
            "Historical klines downloaded"
        );
        Ok(klines)
    }
}

fn open_time_of(kline: &RawKline) -> ExchangeResult<i64> {
    kline
        .first()
        .and_then(Value::as_i64)
        .ok_or_else(|| ExchangeError::ParseError(format!("kline without open time: {:?}", kline)))
}

#[async_trait]
impl HistoricalBarSource for BinanceClient {
    fn name(&self) -> &str {
        if self.config.testnet {
            "binance-testnet"
        } else {
            "binance"
        }
    }

    async fn fetch_historical_bars(
        &self,
        symbol: &str,
        start: &str,
        end: &str,
        timeframe: Timeframe,
    ) -> Result<Vec<RawKline>, SourceError> {
        let start_ms = date_label_to_millis(start)
            .ok_or_else(|| SourceError::InvalidRequest(format!("invalid start date: {}", start)))?;
        let end_ms = date_label_to_millis(end)
            .ok_or_else(|| SourceError::InvalidRequest(format!("invalid end date: {}", end)))?;

        Ok(self
            .get_historical_klines(symbol, timeframe, start_ms, end_ms)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trader_core::ApiCredentials;

    #[test]
    fn test_config_from_credentials() {
        let creds = CredentialsConfig::default()
            .with_provider("binance", ApiCredentials::new("abcd1234efgh5678", "s3cr3t"));
        let config = BinanceConfig::from_credentials(&creds);
        assert_eq!(config.api_key.as_deref(), Some("abcd1234efgh5678"));
        assert_eq!(config.page_limit, 1000);

        let empty = BinanceConfig::from_credentials(&CredentialsConfig::default());
        assert!(empty.api_key.is_none());
    }

    #[test]
    fn test_config_debug_masks_key() {
        let config = BinanceConfig::new("abcd1234efgh5678");
        let debug = format!("{:?}", config);
        assert!(debug.contains("abcd...5678"));
        assert!(!debug.contains("1234efgh"));
    }

    #[test]
    fn test_base_url_override() {
        let config = BinanceConfig::default().with_base_url("http://127.0.0.1:1234/");
        assert_eq!(config.rest_base_url(), "http://127.0.0.1:1234");
        assert_eq!(
            BinanceConfig::default().with_testnet(true).rest_base_url(),
            "https://testnet.binance.vision"
        );
        assert_eq!(BinanceConfig::default().with_page_limit(0).page_limit, 1);
    }

    #[test]
    fn test_error_code_mapping() {
        let client = BinanceClient::new(BinanceConfig::default()).unwrap();
        assert!(client.map_error_code(-1002, "no").is_auth_error());
        assert!(matches!(
            client.map_error_code(-1121, "Invalid symbol."),
            ExchangeError::InvalidRequest(_)
        ));
        assert!(matches!(
            client.map_error_code(-1003, "slow down"),
            ExchangeError::RateLimited
        ));
    }

    #[tokio::test]
    async fn test_invalid_date_label() {
        let client = BinanceClient::new(BinanceConfig::default()).unwrap();
        let err = client
            .fetch_historical_bars("BTCUSDT", "2021-01-01", "01 Feb, 2021", Timeframe::H1)
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::InvalidRequest(_)));
    }
}
