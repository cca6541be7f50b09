//! Conversions between `alloy` fixed width integers and arbitrary precision
//! numbers.

use {
    alloy::primitives::U256,
    num::{BigInt, BigUint, bigint::Sign as BigSign},
};

pub fn u256_to_big_uint(input: &U256) -> BigUint {
    BigUint::from_bytes_be(&input.to_be_bytes::<32>())
}

pub fn u256_to_big_int(input: &U256) -> BigInt {
    BigInt::from_biguint(BigSign::Plus, u256_to_big_uint(input))
}

/// Returns `None` if the value does not fit into 256 bits.
pub fn big_uint_to_u256(input: &BigUint) -> Option<U256> {
    let bytes = input.to_bytes_be();
    if bytes.len() > 32 {
        return None;
    }
    U256::try_from_be_slice(&bytes)
}

/// Returns `None` for negative values or values that do not fit into 256
/// bits.
pub fn big_int_to_u256(input: &BigInt) -> Option<U256> {
    big_uint_to_u256(&input.to_biguint()?)
}
