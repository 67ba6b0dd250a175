//! Non-negative money amounts using decimal arithmetic.
//!
//! Order totals are stored as `NUMERIC(12, 2)`. An [`Amount`] can only be
//! built from a value that fits that column: not negative, at most two
//! decimal places.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when validating an [`Amount`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The value is below zero.
    #[error("must be greater than or equal to 0")]
    Negative,
    /// The value has more than two decimal places.
    #[error("must have at most {max} decimal places")]
    TooPrecise {
        /// Maximum number of decimal places.
        max: u32,
    },
    /// The value does not fit the storage column.
    #[error("must be less than {max}")]
    TooLarge {
        /// Exclusive upper bound.
        max: Decimal,
    },
}

/// A non-negative monetary amount in the store currency.
///
/// ## Examples
///
/// ```
/// use bookstore_core::Amount;
/// use rust_decimal::Decimal;
///
/// assert!(Amount::parse(Decimal::new(2700, 2)).is_ok()); // 27.00
/// assert!(Amount::parse(Decimal::new(-1, 0)).is_err());
/// assert!(Amount::parse(Decimal::new(1001, 3)).is_err()); // 1.001
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Maximum number of decimal places.
    pub const SCALE: u32 = 2;

    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Validate a decimal as an amount.
    ///
    /// Trailing zeros are ignored when counting decimal places, so `20.000`
    /// is accepted. The stored value always carries two decimal places.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is negative, has more than two decimal
    /// places, or does not fit `NUMERIC(12, 2)`.
    pub fn parse(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }

        let normalized = value.normalize();
        if normalized.scale() > Self::SCALE {
            return Err(AmountError::TooPrecise { max: Self::SCALE });
        }

        let max = Decimal::new(10_i64.pow(10), 0);
        if normalized >= max {
            return Err(AmountError::TooLarge { max });
        }

        let mut value = normalized;
        value.rescale(Self::SCALE);
        Ok(Self(value))
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Amount {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Amount {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let decimal = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::parse(decimal)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Amount {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
