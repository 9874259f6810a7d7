//! 무작위 정책 시뮬레이션 명령어.

use std::path::Path;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;
use trader_core::SimulatorConfig;
use trader_simulator::{EpisodeSummary, SimpleEnv, TradingAction};

/// 시뮬레이션 설정
#[derive(Debug, Clone, Default)]
pub struct SimulateConfig {
    pub episodes: usize,
    /// 시작 위치와 정책 모두에 쓰이는 시드
    pub seed: Option<u64>,
}

/// 설정 파일의 데이터셋으로 무작위 행동 에피소드를 실행합니다.
pub fn simulate(config_path: &Path, options: &SimulateConfig) -> Result<Vec<EpisodeSummary>> {
    let config = SimulatorConfig::load(config_path)
        .with_context(|| format!("Failed to load simulator config {}", config_path.display()))?;
    run_random_episodes(SimpleEnv::from_config(&config)?, options)
}

/// 이미 구성된 환경으로 무작위 행동 에피소드를 실행합니다.
pub fn run_random_episodes(
    env: SimpleEnv,
    options: &SimulateConfig,
) -> Result<Vec<EpisodeSummary>> {
    let (mut env, mut policy_rng) = match options.seed {
        Some(seed) => (env.with_rng_seed(seed), StdRng::seed_from_u64(seed.wrapping_add(1))),
        None => (env, StdRng::from_entropy()),
    };

    let mut summaries = Vec::with_capacity(options.episodes);
    for episode in 0..options.episodes {
        let summary = env.run_episode(|_| {
            *TradingAction::ALL
                .choose(&mut policy_rng)
                .unwrap_or(&TradingAction::Hold)
        })?;

        info!(
            episode,
            start_cursor = summary.start_cursor,
            trades = summary.trades,
            total_profit = %summary.total_profit.round_dp(4),
            quote = %env.portfolio().quote_asset(),
            "Episode finished"
        );
        summaries.push(summary);
    }
    Ok(summaries)
}
