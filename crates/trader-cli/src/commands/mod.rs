//! CLI 명령어 구현 모듈.

pub mod add_interval;
pub mod create;
pub mod info;
pub mod read;
pub mod simulate;

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;
use trader_core::{format_date_label, CredentialsConfig, DateRange, Timeframe};
use trader_exchange::BinanceClient;

/// `YYYY-MM-DD` 날짜 파싱.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Expected YYYY-MM-DD", s))
}

/// 시작/종료 날짜에서 데이터셋 날짜 범위 생성.
pub fn parse_date_range(from: &str, to: &str) -> Result<DateRange> {
    let start = parse_date(from)?;
    let end = parse_date(to)?;
    match DateRange::new(start, end) {
        Some(range) => Ok(range),
        None => bail!(
            "Start date must not be after end date: {} > {}",
            format_date_label(start),
            format_date_label(end)
        ),
    }
}

/// 쉼표로 구분된 캔들 간격 목록 파싱 (예: `1m,5m,1h`).
pub fn parse_intervals(s: &str) -> Result<Vec<Timeframe>> {
    let intervals = s
        .split(',')
        .map(str::trim)
        .filter(|label| !label.is_empty())
        .map(|label| label.parse::<Timeframe>().map_err(anyhow::Error::msg))
        .collect::<Result<Vec<_>>>()?;

    if intervals.is_empty() {
        bail!("At least one interval is required");
    }
    Ok(intervals)
}

/// 자격증명 문서로 Binance 클라이언트 생성.
///
/// 경로를 지정하면 반드시 읽을 수 있어야 합니다. 지정하지 않았고 기본 위치에
/// 파일이 없으면 API 키 없이 공개 엔드포인트만 사용합니다.
pub fn binance_source(config: Option<&Path>) -> Result<BinanceClient> {
    let credentials = match config {
        Some(path) => CredentialsConfig::load(Some(path))
            .with_context(|| format!("Failed to load credentials from {}", path.display()))?,
        None => {
            let default_path = CredentialsConfig::resolve_path(None);
            if default_path.exists() {
                CredentialsConfig::load(None)?
            } else {
                debug!(path = %default_path.display(), "No credentials file, using anonymous access");
                CredentialsConfig::default()
            }
        }
    };

    BinanceClient::from_credentials(&credentials).context("Failed to create Binance client")
}

/// 다운로드 진행 표시용 스피너.
pub(crate) fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(120));
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range() {
        let range = parse_date_range("2021-01-01", "2021-03-01").unwrap();
        assert_eq!(
            range.labels(),
            ("01 Jan, 2021".to_string(), "01 Mar, 2021".to_string())
        );

        assert!(parse_date_range("2021-03-01", "2021-01-01").is_err());
        assert!(parse_date_range("01/01/2021", "2021-01-02").is_err());
    }

    #[test]
    fn test_parse_intervals() {
        assert_eq!(
            parse_intervals("1m, 5m,1h").unwrap(),
            vec![Timeframe::M1, Timeframe::M5, Timeframe::H1]
        );
        assert!(parse_intervals("").is_err());
        assert!(parse_intervals("5m,7x").is_err());
    }
}
