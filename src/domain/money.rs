use crate::error::{GatewayError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of fractional digits kept on derived monetary values.
pub const MONEY_SCALE: u32 = 2;

/// Rounds a derived monetary value to [`MONEY_SCALE`] places, midpoint away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A currency rate reported by the provider.
///
/// Always strictly positive, so dividing by it is defined.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Rate(Decimal);

impl Rate {
    pub fn new(value: Decimal) -> Result<Self> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(GatewayError::UpstreamSchema(format!(
                "currency rate must be positive, got {value}"
            )))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Rate {
    type Error = GatewayError;

    fn try_from(value: Decimal) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Rate> for Decimal {
    fn from(rate: Rate) -> Self {
        rate.0
    }
}

/// `amount / rate`, rounded to the money scale.
pub fn amount_in_usd(amount: Decimal, rate: Rate) -> Result<Decimal> {
    amount
        .checked_div(rate.value())
        .map(round_money)
        .ok_or_else(|| {
            GatewayError::UpstreamSchema(format!("cannot convert {amount} at rate {}", rate.0))
        })
}

/// `fee × amount`, rounded to the money scale.
pub fn commission(fee: Decimal, amount: Decimal) -> Result<Decimal> {
    fee.checked_mul(amount).map(round_money).ok_or_else(|| {
        GatewayError::UpstreamSchema(format!("commission overflow: {fee} x {amount}"))
    })
}
