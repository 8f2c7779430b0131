use std::fmt;

use bigdecimal::BigDecimal;

use crate::units::{to_display_f64, wei_to_gwei};

/// Price of a single resource unit (gas) on the base layer, in wei.
///
/// Sampled from the live chain once per experiment pass and treated as read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePrice(u64);

impl ResourcePrice {
    const WEI_PER_GWEI: u64 = 1_000_000_000;

    pub const fn from_wei(wei: u64) -> Self {
        Self(wei)
    }

    pub const fn from_gwei(gwei: u64) -> Self {
        Self(gwei.saturating_mul(Self::WEI_PER_GWEI))
    }

    pub const fn wei(self) -> u64 {
        self.0
    }

    pub fn to_decimal_wei(self) -> BigDecimal {
        BigDecimal::from(self.0)
    }

    pub fn to_gwei(self) -> BigDecimal {
        wei_to_gwei(self.0)
    }
}

impl fmt::Display for ResourcePrice {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{:.2} Gwei", to_display_f64(&self.to_gwei()))
    }
}
