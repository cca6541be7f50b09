//! Chained references let a relayer call consume the runtime output of an
//! earlier call in the same multicall.
//!
//! A reference is an amount whose top two bytes are `0xba10` (cleared after
//! being read) or `0xba11` (read-only), followed by a key. The relayer stores
//! call outputs under such keys and substitutes them back when it sees a
//! reference in place of an amount. No realistic token amount reaches these
//! values.

use {
    alloy::primitives::U256,
    std::fmt::{self, Display, Formatter},
};

const TEMPORARY_PREFIX: u64 = 0xba10;
const READ_ONLY_PREFIX: u64 = 0xba11;
const PREFIX_SHIFT: usize = 240;

/// Mask the relayer applies to recognise either kind of reference.
const REFERENCE_MASK: U256 = U256::from_limbs([0, 0, 0, 0xfff0 << 48]);
const KIND_MASK: U256 = U256::from_limbs([0, 0, 0, 0xffff << 48]);

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ChainedReference(U256);

impl ChainedReference {
    /// A reference whose stored value is cleared once it has been read.
    pub fn temporary(key: u64) -> Self {
        Self(Self::prefix(TEMPORARY_PREFIX) | U256::from(key))
    }

    /// A reference that can be read any number of times.
    pub fn read_only(key: u64) -> Self {
        Self(Self::prefix(READ_ONLY_PREFIX) | U256::from(key))
    }

    /// Decodes an amount, returning `None` if it is not a reference.
    pub fn from_u256(value: U256) -> Option<Self> {
        let kind = value & KIND_MASK;
        (kind == Self::prefix(TEMPORARY_PREFIX) || kind == Self::prefix(READ_ONLY_PREFIX))
            .then_some(Self(value))
    }

    pub fn key(&self) -> U256 {
        self.0 & !KIND_MASK
    }

    pub fn is_temporary(&self) -> bool {
        self.0 & KIND_MASK == Self::prefix(TEMPORARY_PREFIX)
    }

    pub fn as_u256(&self) -> U256 {
        self.0
    }

    fn prefix(prefix: u64) -> U256 {
        U256::from(prefix) << PREFIX_SHIFT
    }
}

impl From<ChainedReference> for U256 {
    fn from(reference: ChainedReference) -> Self {
        reference.0
    }
}

impl Display for ChainedReference {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(&const_hex::encode_prefixed(self.0.to_be_bytes::<32>()))
    }
}

/// The temporary chained reference for `key`.
pub fn to_chained_reference(key: u64) -> U256 {
    ChainedReference::temporary(key).into()
}

/// Whether the relayer would treat `amount` as a chained reference.
pub fn is_chained_reference(amount: U256) -> bool {
    amount & REFERENCE_MASK == ChainedReference::prefix(TEMPORARY_PREFIX)
}

#[cfg(test)]
mod tests {
    use {super::*, std::collections::HashSet};

    #[test]
    fn wire_format() {
        assert_eq!(
            ChainedReference::temporary(0).to_string(),
            "0xba10000000000000000000000000000000000000000000000000000000000000"
        );
        assert_eq!(
            ChainedReference::temporary(0x1234).to_string(),
            "0xba10000000000000000000000000000000000000000000000000000000001234"
        );
        assert_eq!(
            ChainedReference::read_only(7).to_string(),
            "0xba11000000000000000000000000000000000000000000000000000000000007"
        );
    }

    #[test]
    fn injective_and_decodable() {
        let keys = [0, 1, 2, 255, 256, 1 << 32, u64::MAX];
        let references = keys
            .iter()
            .map(|key| to_chained_reference(*key))
            .collect::<HashSet<_>>();
        assert_eq!(references.len(), keys.len());

        for key in keys {
            let reference = ChainedReference::from_u256(to_chained_reference(key)).unwrap();
            assert_eq!(reference.key(), U256::from(key));
            assert!(reference.is_temporary());

            let read_only = ChainedReference::from_u256(ChainedReference::read_only(key).into())
                .unwrap();
            assert_eq!(read_only.key(), U256::from(key));
            assert!(!read_only.is_temporary());
        }
    }

    #[test]
    fn amounts_are_not_references() {
        let amounts = [
            U256::ZERO,
            U256::from(1_000_000_000_000_000_000_u128),
            U256::from(u128::MAX),
            U256::MAX,
        ];
        for amount in amounts {
            assert!(!is_chained_reference(amount));
            assert_eq!(ChainedReference::from_u256(amount), None);
        }
        assert!(is_chained_reference(to_chained_reference(3)));
        assert!(is_chained_reference(ChainedReference::read_only(3).into()));
    }
}
