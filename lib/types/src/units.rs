//! Conversions between the base-currency denominations.
//!
//! All the conversions are exact: ether and gwei amounts are represented as [`BigDecimal`]s with
//! a fixed scale over an integer amount of wei.

use bigdecimal::{
    num_bigint::{BigInt, Sign},
    BigDecimal, ToPrimitive,
};

use crate::U256;

/// Number of decimal places between wei and ether.
pub const ETHER_DECIMALS: i64 = 18;
/// Number of decimal places between wei and gwei.
pub const GWEI_DECIMALS: i64 = 9;

pub fn u256_to_bigint(value: U256) -> BigInt {
    let mut bytes = [0_u8; 32];
    value.to_big_endian(&mut bytes);
    BigInt::from_bytes_be(Sign::Plus, &bytes)
}

/// Converts an integer amount of wei into ether.
pub fn wei_to_ether(wei: BigInt) -> BigDecimal {
    BigDecimal::new(wei, ETHER_DECIMALS)
}

pub fn u256_wei_to_ether(wei: U256) -> BigDecimal {
    wei_to_ether(u256_to_bigint(wei))
}

pub fn wei_to_gwei(wei: u64) -> BigDecimal {
    BigDecimal::new(BigInt::from(wei), GWEI_DECIMALS)
}

/// Converts a decimal into `f64` for display purposes. This is lossy and must only be used at the output boundary.
pub fn to_display_f64(value: &BigDecimal) -> f64 {
    value.to_f64().unwrap_or(f64::NAN)
}
