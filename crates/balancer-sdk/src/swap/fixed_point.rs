//! Fixed point numbers with exactly 18 decimals, emulating the `FixedPoint`
//! library used by the Balancer V2 contracts.

use {
    super::{error::Error, math::BalU256},
    alloy::primitives::U256,
    anyhow::{Context, Result},
    std::{
        fmt::{self, Debug, Display, Formatter},
        str::FromStr,
    },
};

const ONE_18: U256 = U256::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

/// A Balancer fixed point number. The inner value is the number multiplied by
/// `1e18`.
#[derive(Clone, Copy, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Bfp(U256);

impl Bfp {
    pub fn zero() -> Self {
        Self(U256::ZERO)
    }

    pub fn one() -> Self {
        Self(ONE_18)
    }

    /// `10^exp` as a fixed point number.
    ///
    /// # Panics
    ///
    /// Panics for exponents smaller than -18, which cannot be represented.
    pub fn exp10(exp: i32) -> Self {
        let exp = exp + 18;
        assert!(exp >= 0, "fixed point exponent out of range");
        Self(U256::from(10u8).pow(U256::from(exp.unsigned_abs())))
    }

    pub fn from_wei(num: U256) -> Self {
        Self(num)
    }

    pub fn as_uint256(self) -> U256 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.badd(other.0)?))
    }

    pub fn sub(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.bsub(other.0)?))
    }

    pub fn mul_down(self, other: Self) -> Result<Self, Error> {
        Ok(Self(self.0.bmul(other.0)? / ONE_18))
    }

    pub fn mul_up(self, other: Self) -> Result<Self, Error> {
        let product = self.0.bmul(other.0)?;
        if product.is_zero() {
            return Ok(Self::zero());
        }
        Ok(Self(U256::ONE + (product - U256::ONE) / ONE_18))
    }

    pub fn div_down(self, other: Self) -> Result<Self, Error> {
        if other.is_zero() {
            return Err(Error::ZeroDivision);
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        let inflated = self.0.bmul(ONE_18).map_err(|_| Error::DivInternal)?;
        Ok(Self(inflated / other.0))
    }

    pub fn div_up(self, other: Self) -> Result<Self, Error> {
        if other.is_zero() {
            return Err(Error::ZeroDivision);
        }
        if self.is_zero() {
            return Ok(Self::zero());
        }
        let inflated = self.0.bmul(ONE_18).map_err(|_| Error::DivInternal)?;
        Ok(Self(U256::ONE + (inflated - U256::ONE) / other.0))
    }

    /// `1 - x`, saturating at zero.
    pub fn complement(self) -> Self {
        if self.0 < ONE_18 {
            Self(ONE_18 - self.0)
        } else {
            Self::zero()
        }
    }
}

impl FromStr for Bfp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        number::units::parse_units(s, 18)
            .map(Self)
            .with_context(|| format!("invalid fixed point number {s:?}"))
    }
}

impl Display for Bfp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&number::units::format_units(self.0, 18))
    }
}

impl Debug for Bfp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{self}")
    }
}
