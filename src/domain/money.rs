use crate::error::{MarketError, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Fraction units per whole currency unit.
pub const SCALE: i64 = 100_000_000_000_000;

/// Values are rendered one digit short of full scale so representation noise
/// from truncating construction never reaches the wire.
const DISPLAY_DECIMALS: u32 = 13;

/// Fractional parts closer than this are treated as equal.
const EQUALITY_TOLERANCE: i64 = 10;

/// A fixed-point monetary value.
///
/// Keeps the integer and fractional parts as separate `i64`s so that all
/// arithmetic except [`MoneyValue::scale_by`] is exact integer arithmetic,
/// free of binary floating-point drift. Decimal values only appear at the
/// boundary, via [`MoneyValue::from_decimal`] and [`MoneyValue::to_decimal`].
///
/// Invariants: `|fraction| < SCALE`, and the sign of `fraction` matches the
/// sign of `units` unless `units` is zero.
///
/// The derived `PartialEq` is structural; monetary comparisons go through
/// [`MoneyValue::is_equal_to`], which tolerates a difference of a few
/// fraction units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MoneyValue {
    units: i64,
    fraction: i64,
}

impl MoneyValue {
    pub const ZERO: Self = Self {
        units: 0,
        fraction: 0,
    };

    /// Splits a decimal amount into integer and scaled fractional parts.
    ///
    /// The fractional remainder is truncated, not rounded. Amounts whose
    /// integer part does not fit an `i64` are rejected.
    pub fn from_decimal(value: Decimal) -> Result<Self> {
        let whole = value.trunc();
        let units = whole.to_i64().ok_or_else(|| {
            MarketError::InvalidAmount(format!("amount {} is out of range", value))
        })?;
        // |value - whole| < 1, so the scaled remainder always fits an i64.
        let fraction = ((value - whole) * Decimal::from(SCALE))
            .trunc()
            .to_i64()
            .ok_or_else(|| {
                MarketError::InvalidAmount(format!("amount {} is out of range", value))
            })?;
        Ok(Self { units, fraction })
    }

    /// Reconstructs the decimal amount, rounded to display precision
    /// half-away-from-zero.
    pub fn to_decimal(&self) -> Decimal {
        let raw = Decimal::from(self.units) + Decimal::from(self.fraction) / Decimal::from(SCALE);
        raw.round_dp_with_strategy(DISPLAY_DECIMALS, RoundingStrategy::MidpointAwayFromZero)
    }

    pub fn negate(&self) -> Self {
        Self {
            units: -self.units,
            fraction: -self.fraction,
        }
    }

    /// Adds two values, carrying overflowing fractions into the integer part
    /// and restoring the sign-matching invariant.
    pub fn add(&self, other: Self) -> Self {
        let mut units = self.units + other.units;
        let mut fraction = self.fraction + other.fraction;
        // Both inputs keep |fraction| < SCALE, so one carry step is enough.
        if fraction >= SCALE {
            units += 1;
            fraction -= SCALE;
        }
        if fraction <= -SCALE {
            units -= 1;
            fraction += SCALE;
        }
        if units > 0 && fraction < 0 {
            units -= 1;
            fraction += SCALE;
        }
        if units < 0 && fraction > 0 {
            units += 1;
            fraction -= SCALE;
        }
        Self { units, fraction }
    }

    pub fn subtract(&self, other: Self) -> Self {
        self.add(other.negate())
    }

    /// Multiplies through the decimal boundary and re-truncates.
    ///
    /// Repeated scaling accumulates truncation error; callers that need the
    /// exact product must stay in decimal space themselves.
    pub fn scale_by(&self, factor: Decimal) -> Result<Self> {
        Self::from_decimal(self.to_decimal() * factor)
    }

    /// Tolerant equality: equal integer parts and fractional parts within
    /// [`EQUALITY_TOLERANCE`] fraction units of each other.
    pub fn is_equal_to(&self, other: Self) -> bool {
        self.units == other.units && (self.fraction - other.fraction).abs() < EQUALITY_TOLERANCE
    }

    pub fn is_greater_than(&self, other: Self) -> bool {
        if self.is_equal_to(other) {
            return false;
        }
        self.units > other.units || (self.units == other.units && self.fraction > other.fraction)
    }

    pub fn is_less_than(&self, other: Self) -> bool {
        !self.is_equal_to(other) && !self.is_greater_than(other)
    }
}
