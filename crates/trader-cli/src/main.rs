//! 캔들 데이터셋 / 포지션 시뮬레이터 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # BTCUSDT 1분봉/5분봉 데이터셋 생성 (Binance)
//! trader create -p data/btc -s BTCUSDT -f 2021-01-01 -t 2021-02-01 -i 1m,5m
//!
//! # 1시간봉 추가
//! trader add-interval -p data/btc -i 1h
//!
//! # 데이터셋 정보 / 종가 10개 출력
//! trader info -p data/btc
//! trader read -p data/btc --index 5m:close --limit 10
//!
//! # 무작위 정책으로 5 에피소드 실행
//! trader simulate -c sim.toml --episodes 5 --seed 42
//! ```

use std::io;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info};
use trader_core::{init_logging, init_logging_from_env, LogConfig, LogFormat, Timeframe};

use trader_cli::commands::{
    add_interval::add_interval,
    binance_source,
    create::{create_dataset, CreateConfig},
    info::dataset_info,
    parse_date_range, parse_intervals,
    read::read_dataset,
    simulate::{simulate, SimulateConfig},
};

#[derive(Parser)]
#[command(name = "trader")]
#[command(about = "Candlestick dataset store and position simulator", long_about = None)]
#[command(version)]
struct Cli {
    /// 로그 형식 (pretty, json, compact). 기본값은 LOG_FORMAT 환경변수
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Binance에서 캔들을 받아 새 데이터셋 생성
    Create {
        /// 데이터셋 디렉토리 (존재하지 않아야 함)
        #[arg(short, long)]
        path: PathBuf,

        /// 거래소 심볼 (예: BTCUSDT)
        #[arg(short, long)]
        symbol: String,

        /// 시작 날짜 (YYYY-MM-DD)
        #[arg(short = 'f', long)]
        from: String,

        /// 종료 날짜 (YYYY-MM-DD)
        #[arg(short, long)]
        to: String,

        /// 캔들 간격 목록 (쉼표 구분, 예: 1m,5m,1h)
        #[arg(short, long, default_value = "1m")]
        intervals: String,

        /// 자격증명 파일 또는 디렉토리 (기본: ./config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 기존 데이터셋에 캔들 간격 추가
    AddInterval {
        /// 데이터셋 디렉토리
        #[arg(short, long)]
        path: PathBuf,

        /// 추가할 캔들 간격 (예: 1h)
        #[arg(short, long)]
        interval: String,

        /// 자격증명 파일 또는 디렉토리 (기본: ./config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// 데이터셋 정보 출력
    Info {
        /// 데이터셋 디렉토리
        #[arg(short, long)]
        path: PathBuf,
    },

    /// 인덱스로 읽어 CSV 출력
    Read {
        /// 데이터셋 디렉토리
        #[arg(short, long)]
        path: PathBuf,

        /// 읽기 인덱스 (5m, 5m:close, 5m:close_time,close)
        #[arg(long)]
        index: String,

        /// 출력할 최대 행 수
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// 무작위 정책으로 시뮬레이터 에피소드 실행
    Simulate {
        /// 시뮬레이터 설정 파일 (TOML)
        #[arg(short, long)]
        config: PathBuf,

        /// 에피소드 수
        #[arg(short, long, default_value = "1")]
        episodes: usize,

        /// 난수 시드
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.log_format {
        Some(format) => init_logging(LogConfig::from_env().with_format(format)),
        None => init_logging_from_env(),
    }
    .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    if let Err(e) = run(cli.command).await {
        error!("{:#}", e);
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Create {
            path,
            symbol,
            from,
            to,
            intervals,
            config,
        } => {
            let create_config = CreateConfig {
                path,
                symbol,
                date_range: parse_date_range(&from, &to)?,
                intervals: parse_intervals(&intervals)?,
            };
            let source = binance_source(config.as_deref())?;

            let dataset = create_dataset(&create_config, &source).await?;
            println!("\n데이터셋 생성 완료: {}", dataset.path().display());
            for interval in dataset.granularities() {
                println!("  {}: {} rows", interval, dataset.summary(interval)?.rows);
            }
        }

        Commands::AddInterval {
            path,
            interval,
            config,
        } => {
            let interval = interval.parse::<Timeframe>().map_err(anyhow::Error::msg)?;
            let source = binance_source(config.as_deref())?;

            let summary = add_interval(&path, interval, &source).await?;
            println!("\n캔들 간격 추가 완료: {} ({} rows)", interval, summary.rows);
        }

        Commands::Info { path } => {
            print!("{}", dataset_info(&path)?.render());
        }

        Commands::Read { path, index, limit } => {
            let stdout = io::stdout();
            let rows = read_dataset(&path, &index, limit, stdout.lock())?;
            info!(rows, index = %index, "Rows written");
        }

        Commands::Simulate {
            config,
            episodes,
            seed,
        } => {
            let summaries = simulate(&config, &SimulateConfig { episodes, seed })?;
            for (i, summary) in summaries.iter().enumerate() {
                println!(
                    "episode {}: start={} trades={} profit={}",
                    i,
                    summary.start_cursor,
                    summary.trades,
                    summary.total_profit.round_dp(4)
                );
            }
        }
    }

    Ok(())
}
