//! 스텝 렌더링 훅.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::action::TradingAction;
use crate::portfolio::Portfolio;

/// 한 스텝이 끝난 직후의 상태.
#[derive(Debug, Clone, Copy)]
pub struct RenderFrame<'a> {
    /// 행동이 적용된 시계열 위치
    pub cursor: usize,
    /// 에피소드 내 스텝 번호 (0부터)
    pub local_step: usize,
    pub time: DateTime<Utc>,
    pub price: Decimal,
    pub action: TradingAction,
    /// 실제 거래 발생 여부
    pub executed: bool,
    pub portfolio: &'a Portfolio,
}

/// 스텝마다 호출되는 렌더러.
pub trait Renderer: Send {
    fn render(&mut self, frame: &RenderFrame<'_>);
}

/// 아무것도 하지 않는 기본 렌더러 (headless).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRenderer;

impl Renderer for NoopRenderer {
    fn render(&mut self, _frame: &RenderFrame<'_>) {}
}
