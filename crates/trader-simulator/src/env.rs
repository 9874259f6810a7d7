//! 에피소드 드라이버.
//!
//! # 에피소드 프로토콜
//!
//! 1. `reset()`: `[window_length - 1, len - num_steps - 1]` 범위에서 시작 위치를 균등하게
//!    고르고 포트폴리오와 행동 기록을 초기화합니다.
//! 2. `step(action)`: 현재 위치의 가격으로 행동을 적용하고 렌더러를 호출한 뒤
//!    위치와 스텝 번호를 하나씩 증가시킵니다.
//! 3. 호출자는 `num_steps`번 스텝 후 멈춥니다 (`is_done`). 그 이후에도 시계열이 남아
//!    있으면 스텝을 허용하며, 시계열 끝을 넘으면 `EndOfSeries`를 반환합니다.

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing::{debug, info};
use trader_core::SimulatorConfig;
use trader_data::{DataError, Feature, IntervalTable, TimeSeriesDataset};

use crate::action::TradingAction;
use crate::error::{Result, SimulatorError};
use crate::portfolio::Portfolio;
use crate::render::{NoopRenderer, RenderFrame, Renderer};

/// 시뮬레이터가 재생하는 (close_time, close) 시계열.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    times: Vec<DateTime<Utc>>,
    prices: Vec<Decimal>,
}

impl PriceSeries {
    pub fn new(times: Vec<DateTime<Utc>>, prices: Vec<Decimal>) -> Result<Self> {
        if times.len() != prices.len() {
            return Err(SimulatorError::InvalidSeries(format!(
                "{} timestamps but {} prices",
                times.len(),
                prices.len()
            )));
        }
        Ok(Self { times, prices })
    }

    /// `close_time`, `close` 컬럼을 가진 테이블에서 만듭니다.
    pub fn from_table(table: &IntervalTable) -> Result<Self> {
        let times = table.timestamps(Feature::CloseTime).ok_or_else(|| {
            SimulatorError::InvalidSeries("table has no close_time column".into())
        })?;
        let prices = table
            .numbers(Feature::Close)
            .ok_or_else(|| SimulatorError::InvalidSeries("table has no close column".into()))?;
        Self::new(times.to_vec(), prices.to_vec())
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn price(&self, i: usize) -> Option<Decimal> {
        self.prices.get(i).copied()
    }

    pub fn time(&self, i: usize) -> Option<DateTime<Utc>> {
        self.times.get(i).copied()
    }
}

/// 한 스텝의 결과.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub action: TradingAction,
    /// 실제 거래 발생 여부
    pub executed: bool,
    /// 행동이 적용된 가격
    pub price: Decimal,
    pub time: DateTime<Utc>,
}

/// 에피소드 요약.
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub start_cursor: usize,
    pub actions: Vec<TradingAction>,
    /// 실제 체결된 거래 수
    pub trades: usize,
    pub total_profit: Decimal,
}

/// 매수/매도/보유 3가지 행동 환경.
pub struct SimpleEnv {
    series: PriceSeries,
    num_steps: usize,
    window_length: usize,
    portfolio: Portfolio,
    cursor: usize,
    start_cursor: usize,
    local_step: usize,
    action_log: Vec<Option<TradingAction>>,
    started: bool,
    renderer: Box<dyn Renderer>,
    rng: StdRng,
}

impl std::fmt::Debug for SimpleEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleEnv")
            .field("series_len", &self.series.len())
            .field("num_steps", &self.num_steps)
            .field("window_length", &self.window_length)
            .field("cursor", &self.cursor)
            .field("local_step", &self.local_step)
            .field("portfolio", &self.portfolio)
            .finish_non_exhaustive()
    }
}

impl SimpleEnv {
    /// 메모리 시계열로 환경을 만듭니다. `database` 설정은 사용하지 않습니다.
    pub fn new(series: PriceSeries, config: &SimulatorConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            series,
            num_steps: config.env.num_steps,
            window_length: config.env.window_length,
            portfolio: Portfolio::new(config.portfolio.initial_amount, config.portfolio.fee_rate()),
            cursor: 0,
            start_cursor: 0,
            local_step: 0,
            action_log: vec![None; config.env.num_steps],
            started: false,
            renderer: Box::new(NoopRenderer),
            rng: StdRng::from_entropy(),
        })
    }

    /// 설정의 데이터셋에서 `(interval, [close_time, close])`를 읽어 환경을 만듭니다.
    ///
    /// # Errors
    /// - `Data(DatasetNotFound | NotADataset | Corrupt)`: 데이터셋을 열 수 없음
    /// - `Data(GranularityNotFound)`: 설정한 캔들 간격이 데이터셋에 없음
    pub fn from_config(config: &SimulatorConfig) -> Result<Self> {
        let interval = config.database.candlestick_interval;
        let dataset = TimeSeriesDataset::open(&config.database.path)?;
        if !dataset.has_granularity(interval) {
            return Err(DataError::GranularityNotFound(interval.label().to_string()).into());
        }

        let table = dataset.read((interval, [Feature::CloseTime.name(), Feature::Close.name()]))?;
        let series = PriceSeries::from_table(&table)?;

        let base = dataset.base_asset().unwrap_or("BASE").to_string();
        let quote = dataset.quote_asset().unwrap_or("QUOTE").to_string();

        info!(
            dataset = %config.database.path.display(),
            interval = %interval,
            rows = series.len(),
            base = %base,
            quote = %quote,
            "Simulator data loaded"
        );

        let mut env = Self::new(series, config)?;
        env.portfolio = env.portfolio.with_assets(base, quote);
        Ok(env)
    }

    /// 렌더러를 교체합니다.
    pub fn with_renderer(mut self, renderer: Box<dyn Renderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// 시작 위치 선택에 고정 시드를 사용합니다.
    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// 새 에피소드를 시작합니다.
    ///
    /// # Errors
    /// 시계열 길이가 `num_steps + window_length`보다 짧으면 `InsufficientData`.
    pub fn reset(&mut self) -> Result<()> {
        let len = self.series.len();
        let required = self.num_steps + self.window_length;
        if len < required {
            return Err(SimulatorError::InsufficientData {
                series_len: len,
                required,
            });
        }

        let low = self.window_length - 1;
        let high = len - self.num_steps - 1;
        self.cursor = self.rng.gen_range(low..=high);
        self.start_cursor = self.cursor;
        self.local_step = 0;
        self.portfolio.reset();
        self.action_log = vec![None; self.num_steps];
        self.started = true;

        debug!(cursor = self.cursor, low, high, "Episode reset");
        Ok(())
    }

    /// 행동 하나를 적용하고 한 스텝 진행합니다.
    pub fn step(&mut self, action: TradingAction) -> Result<StepOutcome> {
        if !self.started {
            return Err(SimulatorError::EpisodeNotStarted);
        }
        let len = self.series.len();
        let (Some(price), Some(time)) = (self.series.price(self.cursor), self.series.time(self.cursor))
        else {
            return Err(SimulatorError::EndOfSeries {
                cursor: self.cursor,
                len,
            });
        };

        let executed = self.portfolio.apply(action, price)?;
        if let Some(slot) = self.action_log.get_mut(self.local_step) {
            *slot = Some(action);
        }

        self.renderer.render(&RenderFrame {
            cursor: self.cursor,
            local_step: self.local_step,
            time,
            price,
            action,
            executed,
            portfolio: &self.portfolio,
        });

        debug!(
            cursor = self.cursor,
            step = self.local_step,
            action = %action,
            executed,
            price = %price,
            "Step"
        );

        self.cursor += 1;
        self.local_step += 1;

        Ok(StepOutcome {
            action,
            executed,
            price,
            time,
        })
    }

    /// 정수 행동 코드로 스텝을 진행합니다.
    ///
    /// 코드가 0/1/2가 아니면 상태를 바꾸지 않고 `InvalidAction`을 반환합니다.
    pub fn step_code(&mut self, code: i64) -> Result<StepOutcome> {
        let action = TradingAction::try_from(code)?;
        self.step(action)
    }

    /// `reset` 후 정책이 고른 행동으로 `num_steps` 스텝을 진행합니다.
    pub fn run_episode<F>(&mut self, mut policy: F) -> Result<EpisodeSummary>
    where
        F: FnMut(&SimpleEnv) -> TradingAction,
    {
        self.reset()?;

        let mut actions = Vec::with_capacity(self.num_steps);
        let mut trades = 0;
        while !self.is_done() {
            let action = policy(self);
            let outcome = self.step(action)?;
            actions.push(action);
            trades += usize::from(outcome.executed);
        }

        Ok(EpisodeSummary {
            start_cursor: self.start_cursor,
            actions,
            trades,
            total_profit: self.total_profit()?,
        })
    }

    /// `num_steps`번 스텝을 진행했는지 여부.
    pub fn is_done(&self) -> bool {
        self.started && self.local_step >= self.num_steps
    }

    /// 현재 위치의 가격.
    pub fn current_price(&self) -> Result<Decimal> {
        self.series.price(self.cursor).ok_or(SimulatorError::EndOfSeries {
            cursor: self.cursor,
            len: self.series.len(),
        })
    }

    /// 현재 위치의 시각 (close_time).
    pub fn current_time(&self) -> Result<DateTime<Utc>> {
        self.series.time(self.cursor).ok_or(SimulatorError::EndOfSeries {
            cursor: self.cursor,
            len: self.series.len(),
        })
    }

    /// 현재 가격으로 평가한 총 손익.
    pub fn total_profit(&self) -> Result<Decimal> {
        Ok(self.portfolio.total_profit(self.current_price()?))
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn start_cursor(&self) -> usize {
        self.start_cursor
    }

    pub fn local_step(&self) -> usize {
        self.local_step
    }

    /// 에피소드 행동 기록 (`None` = 아직 진행하지 않은 스텝).
    pub fn action_log(&self) -> &[Option<TradingAction>] {
        &self.action_log
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn series(&self) -> &PriceSeries {
        &self.series
    }

    pub fn num_steps(&self) -> usize {
        self.num_steps
    }

    pub fn window_length(&self) -> usize {
        self.window_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;
    use std::sync::{Arc, Mutex};
    use trader_core::Timeframe;

    fn series(prices: &[Decimal]) -> PriceSeries {
        let times = (0..prices.len() as i64)
            .map(|i| Utc.timestamp_millis_opt(1_609_459_200_000 + i * 60_000).unwrap())
            .collect();
        PriceSeries::new(times, prices.to_vec()).unwrap()
    }

    fn config(num_steps: usize, window_length: usize) -> SimulatorConfig {
        SimulatorConfig::new("unused", Timeframe::M1).with_env(num_steps, window_length)
    }

    #[test]
    fn test_reset_window_is_inclusive() {
        let prices: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let mut env = SimpleEnv::new(series(&prices), &config(10, 10))
            .unwrap()
            .with_rng_seed(7);

        for _ in 0..50 {
            env.reset().unwrap();
            assert_eq!(env.cursor(), 9);
        }
    }

    #[test]
    fn test_reset_range_bounds() {
        let prices: Vec<Decimal> = (1..=30).map(Decimal::from).collect();
        let mut env = SimpleEnv::new(series(&prices), &config(5, 4))
            .unwrap()
            .with_rng_seed(42);

        let mut seen = std::collections::BTreeSet::new();
        for _ in 0..500 {
            env.reset().unwrap();
            seen.insert(env.cursor());
        }
        assert_eq!(seen.first(), Some(&3));
        assert_eq!(seen.last(), Some(&24));
    }

    #[test]
    fn test_insufficient_data() {
        let prices: Vec<Decimal> = (1..=19).map(Decimal::from).collect();
        let mut env = SimpleEnv::new(series(&prices), &config(10, 10)).unwrap();
        assert!(matches!(
            env.reset(),
            Err(SimulatorError::InsufficientData {
                series_len: 19,
                required: 20
            })
        ));
    }

    #[test]
    fn test_step_uses_price_before_advancing() {
        let mut prices = vec![dec!(50); 20];
        prices[9] = dec!(100);
        prices[10] = dec!(110);
        let cfg = config(10, 10).with_portfolio(dec!(1000), dec!(0.036));
        let mut env = SimpleEnv::new(series(&prices), &cfg).unwrap();
        env.reset().unwrap();

        let outcome = env.step(TradingAction::Buy).unwrap();
        assert!(outcome.executed);
        assert_eq!(outcome.price, dec!(100));
        assert_eq!(env.portfolio().base_balance(), dec!(9.9964));
        assert_eq!(env.cursor(), 10);
        assert_eq!(env.local_step(), 1);

        env.step(TradingAction::Sell).unwrap();
        assert_eq!(env.portfolio().quote_balance(), dec!(1099.20814256));
        assert_eq!(
            env.action_log()[..3],
            [Some(TradingAction::Buy), Some(TradingAction::Sell), None]
        );
    }

    #[test]
    fn test_invalid_code_leaves_state() {
        let prices: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let mut env = SimpleEnv::new(series(&prices), &config(10, 10)).unwrap();
        env.reset().unwrap();
        let before = env.portfolio().clone();

        assert!(matches!(
            env.step_code(5),
            Err(SimulatorError::InvalidAction(5))
        ));
        assert_eq!(env.portfolio(), &before);
        assert_eq!(env.cursor(), 9);
        assert_eq!(env.local_step(), 0);
        assert!(env.action_log().iter().all(Option::is_none));
    }

    #[test]
    fn test_step_before_reset_and_past_end() {
        let prices: Vec<Decimal> = (1..=4).map(Decimal::from).collect();
        let mut env = SimpleEnv::new(series(&prices), &config(2, 2)).unwrap();
        assert!(matches!(
            env.step(TradingAction::Hold),
            Err(SimulatorError::EpisodeNotStarted)
        ));

        env.reset().unwrap();
        assert_eq!(env.cursor(), 1);
        for _ in 0..3 {
            env.step(TradingAction::Hold).unwrap();
        }
        assert!(env.is_done());
        assert!(matches!(
            env.step(TradingAction::Hold),
            Err(SimulatorError::EndOfSeries { cursor: 4, len: 4 })
        ));
    }

    #[derive(Default)]
    struct Recorder(Arc<Mutex<Vec<(usize, TradingAction)>>>);

    impl Renderer for Recorder {
        fn render(&mut self, frame: &RenderFrame<'_>) {
            self.0.lock().unwrap().push((frame.cursor, frame.action));
        }
    }

    #[test]
    fn test_renderer_called_every_step() {
        let frames = Arc::new(Mutex::new(Vec::new()));
        let prices: Vec<Decimal> = (1..=20).map(Decimal::from).collect();
        let mut env = SimpleEnv::new(series(&prices), &config(10, 10))
            .unwrap()
            .with_renderer(Box::new(Recorder(frames.clone())));

        let summary = env
            .run_episode(|env| {
                if env.local_step() % 2 == 0 {
                    TradingAction::Buy
                } else {
                    TradingAction::Sell
                }
            })
            .unwrap();

        assert_eq!(summary.start_cursor, 9);
        assert_eq!(summary.actions.len(), 10);
        assert_eq!(summary.trades, 10);
        let frames = frames.lock().unwrap();
        assert_eq!(frames.len(), 10);
        assert_eq!(frames[0], (9, TradingAction::Buy));
        assert_eq!(frames[9], (18, TradingAction::Sell));
    }
}
