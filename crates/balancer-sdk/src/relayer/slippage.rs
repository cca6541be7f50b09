use {
    crate::{router::SwapKind, swap},
    alloy::primitives::{Address, I256, U256},
    std::fmt::{self, Display, Formatter},
};

const BPS_BASE: u64 = 10_000;

/// Slippage tolerance in basis points.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Slippage(u16);

impl Slippage {
    pub fn from_bps(bps: u16) -> Self {
        Self(bps)
    }

    pub fn zero() -> Self {
        Self(0)
    }

    pub fn bps(&self) -> u16 {
        self.0
    }

    /// `amount * (1 - slippage)`, rounded down. Saturates at zero for
    /// tolerances above 100%.
    pub fn subtract_from(&self, amount: U256) -> Result<U256, swap::Error> {
        self.scale(amount, BPS_BASE.saturating_sub(self.0.into()))
    }

    /// `amount * (1 + slippage)`, rounded down.
    pub fn add_to(&self, amount: U256) -> Result<U256, swap::Error> {
        self.scale(amount, BPS_BASE + u64::from(self.0))
    }

    fn scale(&self, amount: U256, factor: u64) -> Result<U256, swap::Error> {
        let scaled = amount
            .checked_mul(U256::from(factor))
            .ok_or(swap::Error::MulOverflow)?;
        Ok(scaled / U256::from(BPS_BASE))
    }
}

impl Display for Slippage {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}bps", self.0)
    }
}

/// Batch swap limits from router deltas.
///
/// Amounts received by the user (negative deltas) of an exact-in swap shrink
/// by the slippage, amounts paid (positive deltas) of an exact-out swap grow
/// by it. Every other delta is used as is.
pub fn limits_for_slippage(
    tokens_in: &[Address],
    tokens_out: &[Address],
    kind: SwapKind,
    deltas: &[I256],
    assets: &[Address],
    slippage: Slippage,
) -> Result<Vec<I256>, swap::Error> {
    assets
        .iter()
        .zip(deltas)
        .map(|(asset, delta)| match kind {
            SwapKind::GivenIn if tokens_out.contains(asset) => {
                map_magnitude(*delta, |amount| slippage.subtract_from(amount))
            }
            SwapKind::GivenOut if tokens_in.contains(asset) => {
                map_magnitude(*delta, |amount| slippage.add_to(amount))
            }
            _ => Ok(*delta),
        })
        .collect()
}

fn map_magnitude(
    delta: I256,
    f: impl FnOnce(U256) -> Result<U256, swap::Error>,
) -> Result<I256, swap::Error> {
    let magnitude = I256::try_from(f(delta.unsigned_abs())?).map_err(|_| swap::Error::MulOverflow)?;
    Ok(if delta.is_negative() {
        -magnitude
    } else {
        magnitude
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floors_slippage_adjustments() {
        let one_percent = Slippage::from_bps(100);
        assert_eq!(one_percent.subtract_from(U256::from(100)).unwrap(), U256::from(99));
        assert_eq!(one_percent.subtract_from(U256::from(199)).unwrap(), U256::from(197));
        assert_eq!(one_percent.add_to(U256::from(199)).unwrap(), U256::from(200));
        assert_eq!(Slippage::zero().add_to(U256::from(5)).unwrap(), U256::from(5));
        assert_eq!(
            Slippage::from_bps(20_000).subtract_from(U256::from(5)).unwrap(),
            U256::ZERO
        );
        assert_eq!(
            one_percent.add_to(U256::MAX),
            Err(swap::Error::MulOverflow)
        );
    }

    #[test]
    fn limits() {
        let (a, b, c) = (
            Address::repeat_byte(1),
            Address::repeat_byte(2),
            Address::repeat_byte(3),
        );
        let assets = [a, b, c];
        let deltas = [
            I256::try_from(1_000).unwrap(),
            I256::ZERO,
            I256::try_from(-2_000).unwrap(),
        ];
        let slippage = Slippage::from_bps(50);

        assert_eq!(
            limits_for_slippage(&[a], &[c], SwapKind::GivenIn, &deltas, &assets, slippage)
                .unwrap(),
            vec![deltas[0], I256::ZERO, I256::try_from(-1_990).unwrap()]
        );
        assert_eq!(
            limits_for_slippage(&[a], &[c], SwapKind::GivenOut, &deltas, &assets, slippage)
                .unwrap(),
            vec![I256::try_from(1_005).unwrap(), I256::ZERO, deltas[2]]
        );
    }
}
