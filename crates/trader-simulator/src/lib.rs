//! 포지션 시뮬레이터.
//!
//! 저장된 캔들 테이블의 종가를 한 스텝씩 재생하면서 매수/매도/보유 행동을
//! 단일 자산 포지션에 적용하고 수수료를 반영한 손익을 계산합니다.
//!
//! - [`Portfolio`]: 호가 자산 전액 또는 기준 자산 전액만 보유하는 포지션 상태 기계
//! - [`SimpleEnv`]: 무작위 시작 위치에서 `num_steps` 스텝을 진행하는 에피소드 드라이버
//! - [`Renderer`]: 스텝마다 호출되는 렌더링 훅 (기본값은 아무것도 하지 않음)

pub mod action;
pub mod env;
pub mod error;
pub mod portfolio;
pub mod render;

pub use action::TradingAction;
pub use env::{EpisodeSummary, PriceSeries, SimpleEnv, StepOutcome};
pub use error::{Result, SimulatorError};
pub use portfolio::{Portfolio, TradingStatus};
pub use render::{NoopRenderer, RenderFrame, Renderer};
