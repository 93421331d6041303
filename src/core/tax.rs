use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::error::TaxError;
use super::types::{LineItem, Totals};

/// Standard IGV rate (18%).
pub const DEFAULT_TAX_RATE: Decimal = dec!(0.18);

/// Largest allowed gap between `total` and the sum of gross line amounts.
pub const BALANCE_TOLERANCE: Decimal = dec!(0.01);

/// Tax settings shared by every document kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxConfig {
    /// Rate as a fraction (0.18 = 18%).
    pub rate: Decimal,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self {
            rate: DEFAULT_TAX_RATE,
        }
    }
}

impl TaxConfig {
    pub fn with_rate(mut self, rate: Decimal) -> Self {
        self.rate = rate;
        self
    }
}

/// Derives tax-exclusive subtotal, tax and total from tax-inclusive lines.
///
/// ```
/// use comprobante::core::*;
/// use rust_decimal_macros::dec;
///
/// let lines = vec![
///     LineItemBuilder::new("Pasaje Lima - Ica", dec!(1), dec!(10.00)).build(),
///     LineItemBuilder::new("Encomienda", dec!(2), dec!(5.00)).build(),
/// ];
/// let totals = TaxCalculator::default().compute(&lines).unwrap().presented();
/// assert_eq!(totals.subtotal, dec!(16.95));
/// assert_eq!(totals.tax_amount, dec!(3.05));
/// assert_eq!(totals.total, dec!(20.00));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TaxCalculator {
    config: TaxConfig,
}

impl TaxCalculator {
    pub fn new(config: TaxConfig) -> Result<Self, TaxError> {
        if config.rate.is_sign_negative() || config.rate > Decimal::ONE {
            return Err(TaxError::InvalidRate(config.rate.to_string()));
        }
        Ok(Self { config })
    }

    pub fn rate(&self) -> Decimal {
        self.config.rate
    }

    /// Compute unrounded totals. Round with [`Totals::presented`] only when
    /// the amounts leave the engine.
    pub fn compute(&self, lines: &[LineItem]) -> Result<Totals, TaxError> {
        let divisor = Decimal::ONE + self.config.rate;
        let mut subtotal = Decimal::ZERO;
        let mut gross_sum = Decimal::ZERO;

        for (index, line) in lines.iter().enumerate() {
            check_line(line, index)?;
            let overflow = || TaxError::InvalidLineItem {
                index,
                reason: "amount overflows".to_string(),
            };
            let gross = line.gross_amount().ok_or_else(overflow)?;
            gross_sum = gross_sum.checked_add(gross).ok_or_else(overflow)?;
            subtotal = gross
                .checked_div(divisor)
                .and_then(|base| subtotal.checked_add(base))
                .ok_or_else(overflow)?;
        }

        let tax_amount = subtotal
            .checked_mul(self.config.rate)
            .ok_or(TaxError::Overflow)?;
        let total = subtotal.checked_add(tax_amount).ok_or(TaxError::Overflow)?;
        Ok(Totals {
            subtotal,
            tax_amount,
            total,
            gross_sum,
        })
    }

    /// Tax-exclusive value of one line, unrounded. `None` on overflow.
    pub fn line_base(&self, line: &LineItem) -> Option<Decimal> {
        line.gross_amount()?.checked_div(Decimal::ONE + self.config.rate)
    }
}

fn check_line(line: &LineItem, index: usize) -> Result<(), TaxError> {
    if line.quantity <= Decimal::ZERO {
        return Err(TaxError::InvalidLineItem {
            index,
            reason: format!("quantity must be positive, got {}", line.quantity),
        });
    }
    if line.gross_unit_price < Decimal::ZERO {
        return Err(TaxError::InvalidLineItem {
            index,
            reason: format!("price must not be negative, got {}", line.gross_unit_price),
        });
    }
    Ok(())
}

/// Round a Decimal to `dp` decimal places using half-up (commercial rounding).
pub fn round_half_up(value: Decimal, dp: u32) -> Decimal {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

impl Totals {
    /// Amounts rounded to 2 decimal places for display and transmission.
    pub fn presented(&self) -> Totals {
        Totals {
            subtotal: round_half_up(self.subtotal, 2),
            tax_amount: round_half_up(self.tax_amount, 2),
            total: round_half_up(self.total, 2),
            gross_sum: round_half_up(self.gross_sum, 2),
        }
    }

    /// `subtotal + tax == total` and `total` matches the gross line sum,
    /// both within [`BALANCE_TOLERANCE`].
    pub fn is_balanced(&self) -> bool {
        (self.subtotal + self.tax_amount - self.total).abs() <= BALANCE_TOLERANCE
            && (self.total - self.gross_sum).abs() < BALANCE_TOLERANCE
    }
}
