//! 거래 심볼 정의.
//!
//! 거래소 심볼(`"BTCUSDT"`)을 기준 자산과 호가 자산으로 분리합니다.

use serde::{Deserialize, Serialize};
use std::fmt;

/// 거래소 심볼 분리에 사용하는 일반적인 호가 자산.
///
/// 긴 접미사가 먼저 매칭되도록 순서를 유지합니다.
pub const KNOWN_QUOTE_ASSETS: [&str; 6] = ["USDT", "BUSD", "USDC", "BTC", "ETH", "BNB"];

/// 거래 가능한 상품을 나타내는 트레이딩 심볼.
///
/// 예: `BTCUSDT` → 기준 자산 `BTC`, 호가 자산 `USDT`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Symbol {
    /// 기준 자산 (예: BTC)
    pub base: String,
    /// 호가 자산 (예: USDT)
    pub quote: String,
}

impl Symbol {
    /// 새 심볼을 생성합니다.
    pub fn new(base: impl Into<String>, quote: impl Into<String>) -> Self {
        Self {
            base: base.into().to_uppercase(),
            quote: quote.into().to_uppercase(),
        }
    }

    /// 거래소 심볼 형식(`"BTCUSDT"`)에서 파싱합니다.
    ///
    /// 알려진 호가 자산 접미사가 없거나 기준 자산이 비어 있으면 `None`을 반환합니다.
    pub fn from_exchange_symbol(s: &str) -> Option<Self> {
        let upper = s.trim().to_uppercase();
        KNOWN_QUOTE_ASSETS.iter().find_map(|quote| {
            upper
                .strip_suffix(quote)
                .filter(|base| !base.is_empty())
                .map(|base| Self::new(base, *quote))
        })
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_creation() {
        let symbol = Symbol::new("btc", "usdt");
        assert_eq!(symbol.base, "BTC");
        assert_eq!(symbol.quote, "USDT");
        assert_eq!(symbol.to_string(), "BTC/USDT");
    }

    #[test]
    fn test_symbol_from_exchange_symbol() {
        let symbol = Symbol::from_exchange_symbol("ethusdt").unwrap();
        assert_eq!(symbol.base, "ETH");
        assert_eq!(symbol.quote, "USDT");

        let symbol = Symbol::from_exchange_symbol("ETHBTC").unwrap();
        assert_eq!(symbol.quote, "BTC");

        assert!(Symbol::from_exchange_symbol("USDT").is_none());
        assert!(Symbol::from_exchange_symbol("FOOBAR").is_none());
    }
}
