use crate::domain::errors::ValidationError;
use serde::{Deserialize, Serialize};

/// Profit and Loss value object
///
/// Unlike Price, PnL can be negative to represent losses.
/// This type ensures PnL values are valid (finite) but allows negative values.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PnL(f64);

impl PnL {
    /// Create a new PnL value
    ///
    /// # Errors
    /// Returns ValidationError::MustBeFinite if the value is NaN or infinite
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::MustBeFinite);
        }
        Ok(PnL(value))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn is_profit(&self) -> bool {
        self.0 > 0.0
    }

    pub fn is_loss(&self) -> bool {
        self.0 < 0.0
    }

    pub fn zero() -> Self {
        PnL(0.0)
    }
}

impl TryFrom<f64> for PnL {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        PnL::new(value)
    }
}

impl From<PnL> for f64 {
    fn from(pnl: PnL) -> Self {
        pnl.0
    }
}

impl std::fmt::Display for PnL {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0 >= 0.0 {
            write!(f, "+${:.2}", self.0)
        } else {
            write!(f, "-${:.2}", self.0.abs())
        }
    }
}

impl std::ops::Add for PnL {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        PnL(self.0 + other.0)
    }
}

impl std::iter::Sum for PnL {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PnL::zero(), |acc, pnl| acc + pnl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pnl_profit() {
        let pnl = PnL::new(1000.0).unwrap();
        assert_eq!(pnl.value(), 1000.0);
        assert!(pnl.is_profit());
        assert!(!pnl.is_loss());
    }

    #[test]
    fn test_pnl_loss() {
        let pnl = PnL::new(-500.0).unwrap();
        assert!(!pnl.is_profit());
        assert!(pnl.is_loss());
    }

    #[test]
    fn test_pnl_zero_is_neither_profit_nor_loss() {
        let pnl = PnL::zero();
        assert!(!pnl.is_profit());
        assert!(!pnl.is_loss());
    }

    #[test]
    fn test_pnl_sum() {
        let total: PnL = [1000.0, -300.0, 50.0]
            .iter()
            .map(|v| PnL::new(*v).unwrap())
            .sum();
        assert_eq!(total.value(), 750.0);
    }

    #[test]
    fn test_pnl_invalid() {
        assert!(PnL::new(f64::NAN).is_err());
        assert!(PnL::new(f64::INFINITY).is_err());
        assert!(PnL::new(f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_pnl_serde_as_plain_number() {
        let pnl = PnL::new(-12.5).unwrap();
        assert_eq!(serde_json::to_string(&pnl).unwrap(), "-12.5");
        let back: PnL = serde_json::from_str("42.0").unwrap();
        assert_eq!(back.value(), 42.0);
    }

    #[test]
    fn test_pnl_display() {
        assert_eq!(format!("{}", PnL::new(1234.56).unwrap()), "+$1234.56");
        assert_eq!(format!("{}", PnL::new(-789.12).unwrap()), "-$789.12");
    }
}
