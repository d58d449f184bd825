//! Per-node protocol state.

use std::fmt;

use crate::error::Error;

/// The binary value whose global agreement defines legality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "u8", try_from = "u8"))]
pub enum Primary {
    #[default]
    Zero,
    One,
}

impl Primary {
    /// The opposite value.
    pub const fn flipped(self) -> Self {
        match self {
            Primary::Zero => Primary::One,
            Primary::One => Primary::Zero,
        }
    }

    /// Numeric form, 0 or 1.
    pub const fn as_u8(self) -> u8 {
        match self {
            Primary::Zero => 0,
            Primary::One => 1,
        }
    }
}

impl From<Primary> for u8 {
    fn from(p: Primary) -> u8 {
        p.as_u8()
    }
}

impl TryFrom<u8> for Primary {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Error> {
        match value {
            0 => Ok(Primary::Zero),
            1 => Ok(Primary::One),
            other => Err(Error::InvalidPrimary(other)),
        }
    }
}

impl fmt::Display for Primary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_u8())
    }
}

/// State held by one node.
///
/// Fields are read-only outside the crate. The primary only changes by
/// flipping and the secondary only grows, so both invariants are enforced
/// here rather than by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    primary: Primary,
    secondary: u64,
}

impl Node {
    /// A node in an arbitrary starting state.
    pub const fn new(primary: Primary, secondary: u64) -> Self {
        Self { primary, secondary }
    }

    /// Current primary value.
    pub const fn primary(&self) -> Primary {
        self.primary
    }

    /// Current secondary (priority) value.
    pub const fn secondary(&self) -> u64 {
        self.secondary
    }

    /// Whether both nodes hold the same primary.
    pub fn agrees_with(&self, other: &Node) -> bool {
        self.primary == other.primary
    }

    pub(crate) fn flip(&mut self) {
        self.primary = self.primary.flipped();
    }

    /// Saturates at `u64::MAX` so the secondary never wraps downward.
    pub(crate) fn raise_secondary(&mut self, by: u64) {
        self.secondary = self.secondary.saturating_add(by);
    }
}
