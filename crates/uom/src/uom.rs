use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use procure_core::{DomainError, DomainResult, ValueObject};

/// Measurement category. Units are convertible only within one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UomCategory {
    Units,
    Weight,
    Volume,
    Length,
    Time,
}

/// Unit of measure.
///
/// `factor` is the multiplier to the category's base unit (a dozen has
/// factor 12 in the `Units` category). `rounding` is the smallest increment
/// a quantity expressed in this unit can take; conversion results are
/// rounded to it. `digits` is the precision used when a quantity in this
/// unit is rendered or derived (e.g. on computed record attributes).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uom {
    name: String,
    symbol: String,
    category: UomCategory,
    factor: Decimal,
    rounding: Decimal,
    digits: u32,
}

impl ValueObject for Uom {}

impl Uom {
    /// Define a unit of measure.
    ///
    /// `factor` and `rounding` must be positive.
    pub fn new(
        name: impl Into<String>,
        symbol: impl Into<String>,
        category: UomCategory,
        factor: Decimal,
        rounding: Decimal,
        digits: u32,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("uom name cannot be empty"));
        }
        if factor <= Decimal::ZERO {
            return Err(DomainError::validation("uom factor must be positive"));
        }
        if rounding <= Decimal::ZERO {
            return Err(DomainError::validation("uom rounding must be positive"));
        }
        Ok(Self {
            name,
            symbol: symbol.into(),
            category,
            factor,
            rounding,
            digits,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn category(&self) -> UomCategory {
        self.category
    }

    pub fn factor(&self) -> Decimal {
        self.factor
    }

    pub fn rounding(&self) -> Decimal {
        self.rounding
    }

    pub fn digits(&self) -> u32 {
        self.digits
    }

    /// Whether quantities can be converted between `self` and `other`.
    pub fn compatible_with(&self, other: &Uom) -> bool {
        self.category == other.category
    }

    /// Round a quantity to this unit's rounding increment (half away from zero).
    pub fn round(&self, qty: Decimal) -> Decimal {
        ((qty / self.rounding).round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            * self.rounding)
            .normalize()
    }

    // Stock catalog units. Handy defaults; hosts define their own as needed.

    pub fn unit() -> Self {
        Self {
            name: "Unit".to_string(),
            symbol: "u".to_string(),
            category: UomCategory::Units,
            factor: Decimal::ONE,
            rounding: Decimal::new(1, 2),
            digits: 2,
        }
    }

    pub fn dozen() -> Self {
        Self {
            name: "Dozen".to_string(),
            symbol: "dz".to_string(),
            category: UomCategory::Units,
            factor: Decimal::from(12),
            rounding: Decimal::new(1, 2),
            digits: 2,
        }
    }

    pub fn kilogram() -> Self {
        Self {
            name: "Kilogram".to_string(),
            symbol: "kg".to_string(),
            category: UomCategory::Weight,
            factor: Decimal::ONE,
            rounding: Decimal::new(1, 2),
            digits: 2,
        }
    }

    pub fn gram() -> Self {
        Self {
            name: "Gram".to_string(),
            symbol: "g".to_string(),
            category: UomCategory::Weight,
            factor: Decimal::new(1, 3),
            rounding: Decimal::new(1, 2),
            digits: 2,
        }
    }
}

/// Convert `qty` expressed in `from` into `to`, rounded to `to`'s increment.
///
/// Identity conversions return the input unchanged. Converting across
/// categories is an invariant violation.
pub fn convert(from: &Uom, qty: Decimal, to: &Uom) -> DomainResult<Decimal> {
    if !from.compatible_with(to) {
        return Err(DomainError::invariant(format!(
            "cannot convert {} to {}: categories differ",
            from.name, to.name
        )));
    }
    if from == to {
        return Ok(qty);
    }
    Ok(to.round(qty * from.factor / to.factor))
}
