//! SimpleEnv 통합 테스트
//!
//! 데이터셋 기반 생성과 임의 행동 시퀀스에 대한 포트폴리오 불변식 검증.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use trader_core::{DateRange, SimulatorConfig, Timeframe};
use trader_data::testing::StaticBarSource;
use trader_data::{DataError, TimeSeriesDataset};
use trader_simulator::{PriceSeries, SimpleEnv, SimulatorError, TradingAction};

const START_MS: i64 = 1_609_459_200_000; // 2021-01-01 00:00:00 UTC

fn series(len: usize) -> PriceSeries {
    let times = (0..len as i64)
        .map(|i| Utc.timestamp_millis_opt(START_MS + i * 60_000).unwrap())
        .collect();
    let prices = (0..len).map(|i| Decimal::from(100 + (i % 7) as i64)).collect();
    PriceSeries::new(times, prices).unwrap()
}

fn action_strategy() -> impl Strategy<Value = TradingAction> {
    prop_oneof![
        Just(TradingAction::Buy),
        Just(TradingAction::Sell),
        Just(TradingAction::Hold),
    ]
}

proptest! {
    #[test]
    fn prop_exactly_one_balance_nonzero(actions in prop::collection::vec(action_strategy(), 1..40)) {
        let config = SimulatorConfig::new("unused", Timeframe::M1)
            .with_env(actions.len(), 5)
            .with_portfolio(dec!(1000), dec!(0.1));
        let mut env = SimpleEnv::new(series(actions.len() + 10), &config)
            .unwrap()
            .with_rng_seed(1);
        env.reset().unwrap();

        for action in actions {
            env.step(action).unwrap();
            let portfolio = env.portfolio();
            let quote_nonzero = !portfolio.quote_balance().is_zero();
            let base_nonzero = !portfolio.base_balance().is_zero();
            prop_assert!(quote_nonzero ^ base_nonzero);
        }
        prop_assert!(env.is_done());
    }

    #[test]
    fn prop_reset_cursor_in_window(len in 10usize..60, seed in any::<u64>()) {
        let config = SimulatorConfig::new("unused", Timeframe::M1).with_env(4, 6);
        let mut env = SimpleEnv::new(series(len), &config).unwrap().with_rng_seed(seed);
        env.reset().unwrap();
        prop_assert!(env.cursor() >= 5);
        prop_assert!(env.cursor() <= len - 4 - 1);
    }
}

#[tokio::test]
async fn test_from_config_reads_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btc");
    let closes: Vec<i64> = (0..30).map(|i| 100 + i).collect();
    let source = StaticBarSource::new().with_series(Timeframe::M5, START_MS, &closes);
    let range = DateRange::from_labels("01 Jan, 2021", "02 Jan, 2021").unwrap();
    TimeSeriesDataset::create(&path, "BTCUSDT", range, &[Timeframe::M5], &source)
        .await
        .unwrap();

    let config = SimulatorConfig::new(&path, Timeframe::M5).with_env(10, 5);
    let mut env = SimpleEnv::from_config(&config).unwrap().with_rng_seed(3);

    assert_eq!(env.series().len(), 30);
    assert_eq!(env.portfolio().base_asset(), "BTC");
    assert_eq!(env.portfolio().quote_asset(), "USDT");

    env.reset().unwrap();
    let cursor = env.cursor();
    let outcome = env.step(TradingAction::Hold).unwrap();
    assert_eq!(outcome.price, Decimal::from(100 + cursor as i64));
    // close_time = 다음 봉의 open_time
    assert_eq!(
        outcome.time,
        Utc.timestamp_millis_opt(START_MS + (cursor as i64 + 1) * 300_000).unwrap()
    );
}

#[tokio::test]
async fn test_from_config_missing_interval() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("btc");
    let source = StaticBarSource::new().with_series(Timeframe::M5, START_MS, &[100, 101]);
    let range = DateRange::from_labels("01 Jan, 2021", "02 Jan, 2021").unwrap();
    TimeSeriesDataset::create(&path, "BTCUSDT", range, &[Timeframe::M5], &source)
        .await
        .unwrap();

    let config = SimulatorConfig::new(&path, Timeframe::H1);
    assert!(matches!(
        SimpleEnv::from_config(&config),
        Err(SimulatorError::Data(DataError::GranularityNotFound(_)))
    ));
}

#[test]
fn test_from_config_missing_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let config = SimulatorConfig::new(dir.path().join("nope"), Timeframe::M5);
    assert!(matches!(
        SimpleEnv::from_config(&config),
        Err(SimulatorError::Data(DataError::DatasetNotFound(_)))
    ));
}
