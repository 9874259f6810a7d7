//! 시뮬레이터 행동.

use std::fmt;

use crate::error::SimulatorError;

/// 한 스텝의 행동.
///
/// 정수 코드: `0` = 매수, `1` = 매도, `2` = 보유.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TradingAction {
    Buy = 0,
    Sell = 1,
    Hold = 2,
}

impl TradingAction {
    pub const ALL: [TradingAction; 3] = [TradingAction::Buy, TradingAction::Sell, TradingAction::Hold];

    /// 행동 코드.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TradingAction::Buy => "buy",
            TradingAction::Sell => "sell",
            TradingAction::Hold => "hold",
        }
    }
}

impl TryFrom<i64> for TradingAction {
    type Error = SimulatorError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(TradingAction::Buy),
            1 => Ok(TradingAction::Sell),
            2 => Ok(TradingAction::Hold),
            other => Err(SimulatorError::InvalidAction(other)),
        }
    }
}

impl TryFrom<u8> for TradingAction {
    type Error = SimulatorError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(code))
    }
}

impl fmt::Display for TradingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        for action in TradingAction::ALL {
            assert_eq!(TradingAction::try_from(action.code()).unwrap(), action);
        }
        assert_eq!(TradingAction::Hold.code(), 2);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            TradingAction::try_from(5u8),
            Err(SimulatorError::InvalidAction(5))
        ));
        assert!(matches!(
            TradingAction::try_from(-1i64),
            Err(SimulatorError::InvalidAction(-1))
        ));
    }
}
