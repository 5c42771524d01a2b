//! Signed integer used for allowance arithmetic.
//!
//! Allowance updates must be able to observe values below zero and above
//! 2^256 - 1 before they are rejected, so the arithmetic runs on a sign plus a
//! 512-bit magnitude and is narrowed back to [`U256`] only at the storage boundary.

use alloy_primitives::{U256, U512};
use core::{
    cmp::Ordering,
    fmt,
    ops::{Add, Neg, Sub},
};

/// Widest magnitude, in bits, a stored amount may have.
pub const MAX_BIT_LEN: usize = 256;

/// Signed integer with a 512-bit magnitude. Zero is never negative.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Int {
    negative: bool,
    abs: U512,
}

impl Int {
    /// The zero value.
    pub const ZERO: Self = Self { negative: false, abs: U512::ZERO };

    /// Builds a value from a sign and magnitude, normalizing negative zero.
    pub fn new(negative: bool, abs: U512) -> Self {
        Self { negative: negative && !abs.is_zero(), abs }
    }

    /// Widens an unsigned 256-bit value.
    pub fn from_u256(value: U256) -> Self {
        Self::new(false, U512::from_be_slice(&value.to_be_bytes::<32>()))
    }

    /// Narrows to [`U256`]; `None` when negative or wider than 256 bits.
    pub fn to_u256(&self) -> Option<U256> {
        if self.negative || self.bit_len() > MAX_BIT_LEN {
            return None;
        }
        let bytes = self.abs.to_be_bytes::<64>();
        Some(U256::from_be_slice(&bytes[32..]))
    }

    /// Number of bits needed to represent the magnitude.
    pub fn bit_len(&self) -> usize {
        self.abs.bit_len()
    }

    /// Magnitude of the value.
    pub const fn abs(&self) -> U512 {
        self.abs
    }

    pub const fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.abs.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        !self.negative && !self.abs.is_zero()
    }

    /// Sign of the value as -1, 0 or 1.
    pub fn signum(&self) -> i8 {
        if self.is_zero() {
            0
        } else if self.negative {
            -1
        } else {
            1
        }
    }
}

impl From<U256> for Int {
    fn from(value: U256) -> Self {
        Self::from_u256(value)
    }
}

impl From<u64> for Int {
    fn from(value: u64) -> Self {
        Self::new(false, U512::from(value))
    }
}

impl From<i64> for Int {
    fn from(value: i64) -> Self {
        Self::new(value < 0, U512::from(value.unsigned_abs()))
    }
}

impl Neg for Int {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(!self.negative, self.abs)
    }
}

impl Add for Int {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        if self.negative == rhs.negative {
            return Self::new(self.negative, self.abs.saturating_add(rhs.abs));
        }
        match self.abs.cmp(&rhs.abs) {
            Ordering::Less => Self::new(rhs.negative, rhs.abs - self.abs),
            Ordering::Equal => Self::ZERO,
            Ordering::Greater => Self::new(self.negative, self.abs - rhs.abs),
        }
    }
}

impl Sub for Int {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        self + (-rhs)
    }
}

impl Ord for Int {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.negative, other.negative) {
            (false, true) => Ordering::Greater,
            (true, false) => Ordering::Less,
            (false, false) => self.abs.cmp(&other.abs),
            (true, true) => other.abs.cmp(&self.abs),
        }
    }
}

impl PartialOrd for Int {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Int {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negative {
            write!(f, "-{}", self.abs)
        } else {
            write!(f, "{}", self.abs)
        }
    }
}
