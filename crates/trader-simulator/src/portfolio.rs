//! 단일 자산 포지션 상태 기계.
//!
//! | 상태 | 보유 | 매수 | 매도 | 보유(hold) |
//! |---|---|---|---|---|
//! | `ReadyToBuy` | 호가 자산 전액 | 전액 매수 → `ReadyToSell` | 무시 | 무시 |
//! | `ReadyToSell` | 기준 자산 전액 | 무시 | 전액 매도 → `ReadyToBuy` | 무시 |
//!
//! 현재 상태에서 적용할 수 없는 행동은 에러 없이 무시합니다.

use std::fmt;

use rust_decimal::Decimal;
use tracing::debug;

use crate::action::TradingAction;
use crate::error::{Result, SimulatorError};

/// 포지션 상태.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradingStatus {
    /// 호가 자산만 보유 (FLAT)
    #[default]
    ReadyToBuy,
    /// 기준 자산만 보유 (LONG)
    ReadyToSell,
}

impl TradingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradingStatus::ReadyToBuy => "buy",
            TradingStatus::ReadyToSell => "sell",
        }
    }
}

impl fmt::Display for TradingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 수수료를 반영하는 단일 자산 포트폴리오.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    base_asset: String,
    quote_asset: String,
    initial_quote_balance: Decimal,
    quote_balance: Decimal,
    base_balance: Decimal,
    /// 거래 수수료율 (0.036% → 0.00036)
    fee_rate: Decimal,
    status: TradingStatus,
}

impl Portfolio {
    /// 초기 호가 자산 잔고와 수수료율로 생성합니다.
    pub fn new(initial_quote_balance: Decimal, fee_rate: Decimal) -> Self {
        Self {
            base_asset: "BASE".to_string(),
            quote_asset: "QUOTE".to_string(),
            initial_quote_balance,
            quote_balance: initial_quote_balance,
            base_balance: Decimal::ZERO,
            fee_rate,
            status: TradingStatus::ReadyToBuy,
        }
    }

    /// 잔고에 표시할 자산 이름을 설정합니다.
    pub fn with_assets(mut self, base: impl Into<String>, quote: impl Into<String>) -> Self {
        self.base_asset = base.into();
        self.quote_asset = quote.into();
        self
    }

    /// 에피소드 시작 상태로 되돌립니다.
    pub fn reset(&mut self) {
        self.quote_balance = self.initial_quote_balance;
        self.base_balance = Decimal::ZERO;
        self.status = TradingStatus::ReadyToBuy;
    }

    /// 행동을 현재 가격에 적용합니다.
    ///
    /// 실제로 거래가 일어났으면 `true`, 보유이거나 현재 상태에서 적용할 수 없는
    /// 행동이면 `false`를 반환합니다.
    pub fn apply(&mut self, action: TradingAction, price: Decimal) -> Result<bool> {
        match (action, self.status) {
            (TradingAction::Buy, TradingStatus::ReadyToBuy) => {
                self.buy(price)?;
                Ok(true)
            }
            (TradingAction::Sell, TradingStatus::ReadyToSell) => {
                self.sell(price)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn buy(&mut self, price: Decimal) -> Result<()> {
        if price <= Decimal::ZERO {
            return Err(SimulatorError::InvalidPrice(price));
        }
        self.base_balance = (self.quote_balance / price) * (Decimal::ONE - self.fee_rate);
        self.quote_balance = Decimal::ZERO;
        self.status = TradingStatus::ReadyToSell;

        debug!(
            price = %price,
            base_balance = %self.base_balance,
            asset = %self.base_asset,
            "Bought"
        );
        Ok(())
    }

    fn sell(&mut self, price: Decimal) -> Result<()> {
        if price <= Decimal::ZERO {
            return Err(SimulatorError::InvalidPrice(price));
        }
        self.quote_balance = (self.base_balance * price) * (Decimal::ONE - self.fee_rate);
        self.base_balance = Decimal::ZERO;
        self.status = TradingStatus::ReadyToBuy;

        debug!(
            price = %price,
            quote_balance = %self.quote_balance,
            asset = %self.quote_asset,
            "Sold"
        );
        Ok(())
    }

    /// 주어진 가격으로 평가한 총 손익.
    ///
    /// `(호가 잔고 + 기준 잔고 × 가격) − 초기 잔고`. 보유 중인 포지션도 평가합니다.
    pub fn total_profit(&self, price: Decimal) -> Decimal {
        self.quote_balance + self.base_balance * price - self.initial_quote_balance
    }

    pub fn quote_balance(&self) -> Decimal {
        self.quote_balance
    }

    pub fn base_balance(&self) -> Decimal {
        self.base_balance
    }

    pub fn initial_quote_balance(&self) -> Decimal {
        self.initial_quote_balance
    }

    pub fn fee_rate(&self) -> Decimal {
        self.fee_rate
    }

    pub fn side(&self) -> TradingStatus {
        self.status
    }

    pub fn base_asset(&self) -> &str {
        &self.base_asset
    }

    pub fn quote_asset(&self) -> &str {
        &self.quote_asset
    }
}
