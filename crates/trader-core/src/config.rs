//! 설정 관리.
//!
//! 두 종류의 설정 문서를 다룹니다:
//! - [`CredentialsConfig`]: 데이터 제공자 API 자격증명 (`{"binance": {"key": .., "secret": ..}}`)
//! - [`SimulatorConfig`]: 포지션 시뮬레이터 설정 (`database`, `portfolio`, `env` 섹션)
//!
//! 두 설정 모두 `config` crate로 파일을 읽고 환경 변수로 오버라이드합니다.

use crate::error::{TraderError, TraderResult};
use crate::types::{DecimalExt, Timeframe};
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// 경로가 주어지지 않았을 때 사용하는 자격증명 파일 이름 (현재 작업 디렉토리 기준).
pub const DEFAULT_CREDENTIALS_FILE: &str = "config.json";

/// 자격증명 오버라이드용 환경 변수 접두사 (예: `PROTEUS__BINANCE__KEY`).
pub const CREDENTIALS_ENV_PREFIX: &str = "PROTEUS";

/// 시뮬레이터 설정 오버라이드용 환경 변수 접두사 (예: `PROTEUS_SIM__ENV__NUMSTEPS`).
pub const SIMULATOR_ENV_PREFIX: &str = "PROTEUS_SIM";

// ============================================================================
// 자격증명
// ============================================================================

/// 한 데이터 제공자의 API 자격증명.
///
/// # 보안
/// - `secret`은 `SecretString`으로 보관되며 `Debug` 출력에서 마스킹됩니다.
#[derive(Deserialize)]
pub struct ApiCredentials {
    /// API 키
    #[serde(default)]
    pub key: String,
    /// API 시크릿
    #[serde(default = "empty_secret", deserialize_with = "deserialize_secret")]
    pub secret: SecretString,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

impl ApiCredentials {
    /// 새 자격증명을 생성합니다.
    pub fn new(key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            secret: SecretString::from(secret.into()),
        }
    }

    /// 시크릿 원문을 반환합니다.
    pub fn expose_secret(&self) -> &str {
        self.secret.expose_secret()
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chars: Vec<char> = self.key.chars().collect();
        let masked_key = if chars.len() > 8 {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        } else {
            "***REDACTED***".to_string()
        };

        f.debug_struct("ApiCredentials")
            .field("key", &masked_key)
            .field("secret", &"***REDACTED***")
            .finish()
    }
}

/// 제공자 이름별 자격증명 문서.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsConfig {
    #[serde(flatten)]
    providers: HashMap<String, ApiCredentials>,
}

impl CredentialsConfig {
    /// 자격증명 파일 경로를 결정합니다.
    ///
    /// - 디렉토리가 주어지면 그 안의 `config.json`
    /// - 파일 경로가 주어지면 그 파일
    /// - 아무것도 없으면 현재 작업 디렉토리의 `config.json`
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        match path {
            Some(p) if p.is_dir() => p.join(DEFAULT_CREDENTIALS_FILE),
            Some(p) => p.to_path_buf(),
            None => PathBuf::from(DEFAULT_CREDENTIALS_FILE),
        }
    }

    /// 자격증명 문서를 로드합니다.
    ///
    /// 파일이 없거나 JSON 문법이 잘못된 경우 모두 `TraderError::Config`를 반환합니다.
    pub fn load(path: Option<&Path>) -> TraderResult<Self> {
        let file_path = Self::resolve_path(path);

        let loaded = config::Config::builder()
            .add_source(
                config::File::from(file_path.as_path())
                    .format(config::FileFormat::Json)
                    .required(true),
            )
            .add_source(
                config::Environment::with_prefix(CREDENTIALS_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(false),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Self>())
            .map_err(|e| {
                TraderError::Config(format!(
                    "config file {} is corrupt (wrong syntax, missing values, ...): {}",
                    file_path.display(),
                    e
                ))
            })?;

        tracing::debug!(
            path = %file_path.display(),
            providers = loaded.providers.len(),
            "Credentials loaded"
        );

        Ok(loaded)
    }

    /// 메모리 상의 자격증명 문서에 제공자를 추가합니다.
    pub fn with_provider(mut self, name: impl Into<String>, credentials: ApiCredentials) -> Self {
        self.providers.insert(name.into().to_lowercase(), credentials);
        self
    }

    /// 제공자 자격증명을 조회합니다.
    pub fn get(&self, provider: &str) -> Option<&ApiCredentials> {
        self.providers.get(&provider.to_lowercase())
    }

    /// 제공자 자격증명을 조회하고, 없으면 설정 에러를 반환합니다.
    pub fn require(&self, provider: &str) -> TraderResult<&ApiCredentials> {
        self.get(provider).ok_or_else(|| {
            TraderError::Config(format!("no credentials for provider '{}'", provider))
        })
    }
}

// ============================================================================
// 시뮬레이터 설정
// ============================================================================

/// 시뮬레이터가 사용할 데이터셋 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseConfig {
    /// 데이터셋 디렉토리 경로
    pub path: PathBuf,
    /// 사용할 캔들 간격
    #[serde(alias = "candlestickinterval", alias = "candlestick_interval")]
    pub candlestick_interval: Timeframe,
}

/// 포트폴리오 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioConfig {
    /// 초기 호가 자산 수량 (예: BTCUSDT → USDT 수량)
    #[serde(
        default = "default_initial_amount",
        alias = "initialamount",
        alias = "initial_amount"
    )]
    pub initial_amount: Decimal,
    /// 거래 수수료 (퍼센트, 0.036 = 0.036%)
    #[serde(
        default = "default_trading_fees_percent",
        alias = "tradingfeespercent",
        alias = "trading_fees_percent"
    )]
    pub trading_fees_percent: Decimal,
}

impl PortfolioConfig {
    /// 수수료 퍼센트를 비율로 변환합니다 (0.036 → 0.00036).
    pub fn fee_rate(&self) -> Decimal {
        self.trading_fees_percent.percent_to_rate()
    }
}

impl Default for PortfolioConfig {
    fn default() -> Self {
        Self {
            initial_amount: default_initial_amount(),
            trading_fees_percent: default_trading_fees_percent(),
        }
    }
}

fn default_initial_amount() -> Decimal {
    Decimal::new(1000, 0)
}

fn default_trading_fees_percent() -> Decimal {
    Decimal::new(36, 3)
}

/// 에피소드 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvConfig {
    /// 에피소드당 스텝 수
    #[serde(default = "default_num_steps", alias = "numsteps", alias = "num_steps")]
    pub num_steps: usize,
    /// 관측 윈도우 길이
    #[serde(
        default = "default_window_length",
        alias = "windowlength",
        alias = "window_length"
    )]
    pub window_length: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            num_steps: default_num_steps(),
            window_length: default_window_length(),
        }
    }
}

fn default_num_steps() -> usize {
    10
}

fn default_window_length() -> usize {
    10
}

/// 포지션 시뮬레이터 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SimulatorConfig {
    /// 데이터셋 설정
    pub database: DatabaseConfig,
    /// 포트폴리오 설정
    #[serde(default)]
    pub portfolio: PortfolioConfig,
    /// 에피소드 설정
    #[serde(default)]
    pub env: EnvConfig,
}

impl SimulatorConfig {
    /// 기본 포트폴리오/에피소드 설정으로 새 설정을 생성합니다.
    pub fn new(path: impl Into<PathBuf>, candlestick_interval: Timeframe) -> Self {
        Self {
            database: DatabaseConfig {
                path: path.into(),
                candlestick_interval,
            },
            portfolio: PortfolioConfig::default(),
            env: EnvConfig::default(),
        }
    }

    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일 형식은 확장자로 결정됩니다 (`.toml`, `.json`, `.yaml` ...).
    pub fn load<P: AsRef<Path>>(path: P) -> TraderResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix(SIMULATOR_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 설정 값의 범위를 검증합니다.
    pub fn validate(&self) -> TraderResult<()> {
        if self.env.num_steps == 0 {
            return Err(TraderError::InvalidInput("env.numSteps must be >= 1".into()));
        }
        if self.env.window_length == 0 {
            return Err(TraderError::InvalidInput(
                "env.windowLength must be >= 1".into(),
            ));
        }
        if self.portfolio.initial_amount <= Decimal::ZERO {
            return Err(TraderError::InvalidInput(
                "portfolio.initialAmount must be positive".into(),
            ));
        }
        let fees = self.portfolio.trading_fees_percent;
        if fees < Decimal::ZERO || fees >= Decimal::ONE_HUNDRED {
            return Err(TraderError::InvalidInput(format!(
                "portfolio.tradingFeesPercent must be in [0, 100): {}",
                fees
            )));
        }
        Ok(())
    }

    /// 에피소드 설정을 변경합니다.
    pub fn with_env(mut self, num_steps: usize, window_length: usize) -> Self {
        self.env = EnvConfig {
            num_steps,
            window_length,
        };
        self
    }

    /// 포트폴리오 설정을 변경합니다.
    pub fn with_portfolio(mut self, initial_amount: Decimal, trading_fees_percent: Decimal) -> Self {
        self.portfolio = PortfolioConfig {
            initial_amount,
            trading_fees_percent,
        };
        self
    }
}
