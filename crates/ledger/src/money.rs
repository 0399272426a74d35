use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// Signed money amount represented as **integer centavos**.
///
/// Use this type for **all** monetary values in the ledger (ceilings, running
/// totals, statement amounts) to avoid floating-point drift.
///
/// The value is signed:
/// - positive = credit / inflow
/// - negative = debit / outflow
///
/// # Examples
///
/// ```rust
/// use ledger::Money;
///
/// let amount = Money::new(12_34);
/// assert_eq!(amount.centavos(), 1234);
/// assert_eq!(amount.to_string(), "12,34");
/// ```
///
/// Parsing covers the formats found in Brazilian bank statements: `R$`
/// prefix, `.` thousands with `,` decimals, or a plain `.` decimal:
///
/// ```rust
/// use ledger::Money;
///
/// assert_eq!("250.00".parse::<Money>().unwrap().centavos(), 25000);
/// assert_eq!("R$ 1.234,56".parse::<Money>().unwrap().centavos(), 123456);
/// assert_eq!("-1.234".parse::<Money>().unwrap().centavos(), -123400);
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    /// Creates a new amount from integer centavos.
    #[must_use]
    pub const fn new(centavos: i64) -> Self {
        Self(centavos)
    }

    /// Returns the raw value in centavos.
    #[must_use]
    pub const fn centavos(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Absolute value.
    #[must_use]
    pub const fn abs(self) -> Money {
        Money(self.0.abs())
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: Money) -> Option<Money> {
        self.0.checked_add(rhs.0).map(Money)
    }

    /// Checked subtraction (returns `None` on overflow).
    #[must_use]
    pub fn checked_sub(self, rhs: Money) -> Option<Money> {
        self.0.checked_sub(rhs.0).map(Money)
    }
}

impl fmt::Display for Money {
    /// Formats as pt-BR: `.` thousands, `,` decimals (`1.234,56`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let inteiro = abs / 100;
        let centavos = abs % 100;

        let digits = inteiro.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, c) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i).is_multiple_of(3) {
                grouped.push('.');
            }
            grouped.push(c);
        }

        write!(f, "{sign}{grouped},{centavos:02}")
    }
}

impl From<i64> for Money {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<Money> for i64 {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl Sub for Money {
    type Output = Money;

    fn sub(self, rhs: Money) -> Self::Output {
        Money(self.0 - rhs.0)
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, rhs: Money) {
        self.0 -= rhs.0;
    }
}

impl Neg for Money {
    type Output = Money;

    fn neg(self) -> Self::Output {
        Money(-self.0)
    }
}

impl FromStr for Money {
    type Err = LedgerError;

    /// Parses a decimal string into centavos.
    ///
    /// Accepts an optional leading `+`/`-`, an optional `R$` prefix, `.`
    /// thousands with `,` decimals (pt-BR), or a plain `.` decimal.
    ///
    /// Disambiguation when there is no comma: a single `.` followed by 1-2
    /// digits is a decimal separator (`250.00`); anything else treats the
    /// dots as thousands separators (`1.234` reads as 1234).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let empty = || LedgerError::InvalidAmount("empty amount".to_string());
        let invalid = || LedgerError::InvalidAmount(format!("invalid amount: {s}"));
        let overflow = || LedgerError::InvalidAmount("amount too large".to_string());

        let mut rest = s.trim();
        if rest.is_empty() {
            return Err(empty());
        }

        let mut sign = 1i64;
        if let Some(stripped) = rest.strip_prefix('-') {
            sign = -1;
            rest = stripped.trim_start();
        } else if let Some(stripped) = rest.strip_prefix('+') {
            rest = stripped.trim_start();
        }
        if let Some(stripped) = rest.strip_prefix("R$") {
            rest = stripped.trim_start();
        }
        // Sign may also come after the currency marker ("R$ -10,00").
        if let Some(stripped) = rest.strip_prefix('-') {
            sign = -sign;
            rest = stripped.trim_start();
        }
        if rest.is_empty() {
            return Err(empty());
        }

        let (inteiro_str, frac_str) = if let Some((head, tail)) = rest.rsplit_once(',') {
            // pt-BR: dots are thousands separators.
            (head.replace('.', ""), tail)
        } else if let Some((head, tail)) = rest.rsplit_once('.') {
            if !head.contains('.') && (1..=2).contains(&tail.len()) {
                (head.to_string(), tail)
            } else {
                (rest.replace('.', ""), "")
            }
        } else {
            (rest.to_string(), "")
        };

        if inteiro_str.is_empty() || !inteiro_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let inteiro: i64 = inteiro_str.parse().map_err(|_| invalid())?;

        let centavos: i64 = match frac_str.len() {
            0 => 0,
            1 | 2 => {
                if !frac_str.chars().all(|c| c.is_ascii_digit()) {
                    return Err(invalid());
                }
                let parsed: i64 = frac_str.parse().map_err(|_| invalid())?;
                if frac_str.len() == 1 { parsed * 10 } else { parsed }
            }
            _ => return Err(LedgerError::InvalidAmount("too many decimals".to_string())),
        };

        let total = inteiro
            .checked_mul(100)
            .and_then(|v| v.checked_add(centavos))
            .ok_or_else(overflow)?;

        let signed = if sign < 0 {
            total.checked_neg().ok_or_else(overflow)?
        } else {
            total
        };

        Ok(Money(signed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_pt_br() {
        assert_eq!(Money::new(0).to_string(), "0,00");
        assert_eq!(Money::new(1).to_string(), "0,01");
        assert_eq!(Money::new(1050).to_string(), "10,50");
        assert_eq!(Money::new(123_456).to_string(), "1.234,56");
        assert_eq!(Money::new(-123_456_789).to_string(), "-1.234.567,89");
    }

    #[test]
    fn parse_plain_decimal() {
        assert_eq!("10".parse::<Money>().unwrap().centavos(), 1000);
        assert_eq!("10.5".parse::<Money>().unwrap().centavos(), 1050);
        assert_eq!("250.00".parse::<Money>().unwrap().centavos(), 25000);
        assert_eq!("-0.01".parse::<Money>().unwrap().centavos(), -1);
        assert_eq!("+1.00".parse::<Money>().unwrap().centavos(), 100);
    }

    #[test]
    fn parse_pt_br() {
        assert_eq!("10,50".parse::<Money>().unwrap().centavos(), 1050);
        assert_eq!("1.234,56".parse::<Money>().unwrap().centavos(), 123_456);
        assert_eq!("R$ 1.234,56".parse::<Money>().unwrap().centavos(), 123_456);
        assert_eq!("R$ -10,00".parse::<Money>().unwrap().centavos(), -1000);
        assert_eq!("-R$ 10,00".parse::<Money>().unwrap().centavos(), -1000);
    }

    #[test]
    fn parse_dots_without_comma_are_thousands() {
        assert_eq!("1.234".parse::<Money>().unwrap().centavos(), 123_400);
        assert_eq!("1.234.567".parse::<Money>().unwrap().centavos(), 123_456_700);
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!("12,345".parse::<Money>().is_err());
        assert!("1,2,3".parse::<Money>().is_err());
    }
}
