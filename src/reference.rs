use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Mask of the complement flag (bit 31).
const COMPLEMENT_BIT: u32 = 0x8000_0000;

/// Mask of the node address (bits 0..31).
const ADDRESS_MASK: u32 = 0x7FFF_FFFF;

/// Largest representable node address.
pub const MAX_ADDRESS: u32 = ADDRESS_MASK;

/// A reference to a BDD node, potentially complemented.
///
/// Bit 31 is the complement flag and the remaining 31 bits hold the node
/// address. Address 0 is the terminal: the uncomplemented edge to it is
/// [`Ref::ONE`], the complemented one is [`Ref::ZERO`]. Negation is a bit flip
/// and never allocates.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    pub const ONE: Self = Self(0);
    pub const ZERO: Self = Self(COMPLEMENT_BIT);

    /// Creates a new reference with the given node address and complement flag.
    pub const fn new(address: u32, complemented: bool) -> Self {
        debug_assert!(address <= ADDRESS_MASK);
        Self(address | ((complemented as u32) << 31))
    }

    /// Creates a positive (uncomplemented) reference.
    pub const fn positive(address: u32) -> Self {
        Self::new(address, false)
    }

    /// Returns the node address this reference points to.
    #[inline]
    pub const fn address(self) -> u32 {
        self.0 & ADDRESS_MASK
    }

    /// Returns the node address as an index into the node store.
    #[inline]
    pub const fn index(self) -> usize {
        self.address() as usize
    }

    /// Returns true if this reference carries the complement flag.
    #[inline]
    pub const fn is_complemented(self) -> bool {
        (self.0 & COMPLEMENT_BIT) != 0
    }

    /// Returns the reference with the complement flag toggled.
    #[inline]
    pub const fn complement(self) -> Self {
        Self(self.0 ^ COMPLEMENT_BIT)
    }

    /// Returns the uncomplemented reference to the same node.
    #[inline]
    pub const fn regular(self) -> Self {
        Self(self.0 & ADDRESS_MASK)
    }

    /// Complements the reference iff `flag` is set.
    #[inline]
    pub const fn complement_if(self, flag: bool) -> Self {
        Self(self.0 ^ ((flag as u32) << 31))
    }

    /// Returns true if this reference points to the terminal node.
    #[inline]
    pub const fn is_terminal(self) -> bool {
        self.address() == 0
    }

    /// Returns the raw underlying value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

// -Ref
impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        self.complement()
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Ref::ONE => write!(f, "1"),
            Ref::ZERO => write!(f, "0"),
            _ if self.is_complemented() => write!(f, "~@{}", self.address()),
            _ => write!(f, "@{}", self.address()),
        }
    }
}
