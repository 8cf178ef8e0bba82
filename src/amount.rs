//! CCD amounts and conversion between CCD and microCCD

use crate::error::{MedShareError, Result};
use serde_json::Value;
use std::fmt;

/// Number of microCCD in one CCD.
pub const MICRO_CCD_PER_CCD: u64 = 1_000_000;

/// Fractional digits representable in microCCD.
const DECIMALS: usize = 6;

/// A non-negative CCD amount, stored losslessly in microCCD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CcdAmount {
    micro_ccd: u64,
}

impl CcdAmount {
    pub const ZERO: CcdAmount = CcdAmount { micro_ccd: 0 };

    pub fn from_micro_ccd(micro_ccd: u64) -> Self {
        CcdAmount { micro_ccd }
    }

    /// Whole CCD, failing on overflow.
    pub fn from_ccd(ccd: u64) -> Result<Self> {
        ccd.checked_mul(MICRO_CCD_PER_CCD)
            .map(Self::from_micro_ccd)
            .ok_or_else(|| MedShareError::Validation("Amount too large".to_string()))
    }

    /// Parses a decimal CCD string such as `"12"`, `"0.5"` or `"3.000001"`.
    ///
    /// Signs, exponents and more than six fractional digits are rejected
    /// since they cannot be expressed as a whole number of microCCD.
    pub fn from_ccd_str(s: &str) -> Result<Self> {
        let invalid = || MedShareError::Validation(format!("Invalid CCD amount: '{}'", s));
        let s = s.trim();

        let (whole, frac) = match s.split_once('.') {
            Some((w, f)) => (w, f),
            None => (s, ""),
        };

        if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if s.contains('.') && (frac.is_empty() || frac.len() > DECIMALS) {
            return Err(invalid());
        }
        if !frac.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u64 = whole.parse().map_err(|_| invalid())?;
        let frac_micro: u64 = if frac.is_empty() {
            0
        } else {
            let padded = format!("{:0<width$}", frac, width = DECIMALS);
            padded.parse().map_err(|_| invalid())?
        };

        whole
            .checked_mul(MICRO_CCD_PER_CCD)
            .and_then(|m| m.checked_add(frac_micro))
            .map(Self::from_micro_ccd)
            .ok_or_else(invalid)
    }

    /// Accepts the shapes a JSON client may send: a number or a string.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Self::from_ccd_str(s),
            Value::Number(n) => {
                if let Some(whole) = n.as_u64() {
                    Self::from_ccd(whole)
                } else {
                    Self::from_ccd_str(&n.to_string())
                }
            }
            _ => Err(MedShareError::Validation(
                "Amount must be a number or a numeric string".to_string(),
            )),
        }
    }

    pub fn micro_ccd(&self) -> u64 {
        self.micro_ccd
    }

    pub fn is_zero(&self) -> bool {
        self.micro_ccd == 0
    }

    /// Decimal CCD representation without trailing zeros, e.g. `1.5`.
    pub fn to_ccd_string(&self) -> String {
        let whole = self.micro_ccd / MICRO_CCD_PER_CCD;
        let frac = self.micro_ccd % MICRO_CCD_PER_CCD;
        if frac == 0 {
            whole.to_string()
        } else {
            let frac = format!("{:06}", frac);
            format!("{}.{}", whole, frac.trim_end_matches('0'))
        }
    }
}

impl fmt::Display for CcdAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} CCD", self.to_ccd_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_whole_and_fractional() {
        assert_eq!(CcdAmount::from_ccd_str("12").unwrap().micro_ccd(), 12_000_000);
        assert_eq!(CcdAmount::from_ccd_str("0.5").unwrap().micro_ccd(), 500_000);
        assert_eq!(CcdAmount::from_ccd_str("3.000001").unwrap().micro_ccd(), 3_000_001);
        assert_eq!(CcdAmount::from_ccd_str(" 7 ").unwrap().micro_ccd(), 7_000_000);
        assert_eq!(CcdAmount::from_ccd_str("0").unwrap(), CcdAmount::ZERO);
    }

    #[test]
    fn test_rejects_invalid_strings() {
        for input in ["-5", "+5", "", ".5", "5.", "1.0000001", "1e6", "abc", "1.2.3", "NaN"] {
            assert!(
                CcdAmount::from_ccd_str(input).is_err(),
                "expected '{}' to be rejected",
                input
            );
        }
    }

    #[test]
    fn test_overflow_rejected() {
        let too_big = (u64::MAX / MICRO_CCD_PER_CCD + 1).to_string();
        assert!(CcdAmount::from_ccd_str(&too_big).is_err());
        assert!(CcdAmount::from_ccd(u64::MAX).is_err());
    }

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(CcdAmount::from_json(&json!(10)).unwrap().micro_ccd(), 10_000_000);
        assert_eq!(CcdAmount::from_json(&json!(2.25)).unwrap().micro_ccd(), 2_250_000);
        assert_eq!(CcdAmount::from_json(&json!("1.5")).unwrap().micro_ccd(), 1_500_000);
        assert!(CcdAmount::from_json(&json!(-5)).is_err());
        assert!(CcdAmount::from_json(&json!("-5")).is_err());
        assert!(CcdAmount::from_json(&json!(null)).is_err());
        assert!(CcdAmount::from_json(&json!(true)).is_err());
    }

    #[test]
    fn test_to_ccd_string() {
        assert_eq!(CcdAmount::from_micro_ccd(1_500_000).to_ccd_string(), "1.5");
        assert_eq!(CcdAmount::from_micro_ccd(1).to_ccd_string(), "0.000001");
        assert_eq!(CcdAmount::from_micro_ccd(42_000_000).to_ccd_string(), "42");
        assert_eq!(CcdAmount::from_micro_ccd(1_500_000).to_string(), "1.5 CCD");
    }

    #[test]
    fn test_denomination_round_trip() {
        let samples = [
            0,
            1,
            999_999,
            1_000_000,
            1_000_001,
            123_456_789,
            u64::MAX / 2,
            u64::MAX,
        ];
        for micro in samples {
            let amount = CcdAmount::from_micro_ccd(micro);
            let back = CcdAmount::from_ccd_str(&amount.to_ccd_string()).unwrap();
            assert_eq!(back, amount, "round trip failed for {}", micro);
        }
    }
}
