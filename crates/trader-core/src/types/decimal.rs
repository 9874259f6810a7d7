//! 정밀한 금융 계산을 위한 Decimal 유틸리티.

use rust_decimal::Decimal;
use std::str::FromStr;

/// Decimal 연산을 위한 확장 트레이트.
pub trait DecimalExt {
    /// 퍼센트 값(예: 0.036 → 0.036%)을 비율(0.00036)로 변환합니다.
    fn percent_to_rate(&self) -> Decimal;
}

impl DecimalExt for Decimal {
    fn percent_to_rate(&self) -> Decimal {
        *self / Decimal::ONE_HUNDRED
    }
}

/// 숫자 문자열을 Decimal로 파싱합니다.
///
/// 일반 표기(`"28923.63"`)와 과학적 표기(`"1e-05"`, `"1.6E+12"`)를 모두 허용합니다.
pub fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_to_rate() {
        assert_eq!(dec!(0.036).percent_to_rate(), dec!(0.00036));
        assert_eq!(dec!(100).percent_to_rate(), Decimal::ONE);
    }

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("28923.63"), Some(dec!(28923.63)));
        assert_eq!(parse_decimal(" 42 "), Some(dec!(42)));
        assert_eq!(parse_decimal("1e-05"), Some(dec!(0.00001)));
        assert_eq!(parse_decimal("1.5E+3"), Some(dec!(1500)));
        assert_eq!(parse_decimal(""), None);
        assert_eq!(parse_decimal("nan"), None);
    }
}
