//! ID3v2 major versions.

use serde::{Deserialize, Serialize};

use crate::errors::{ProtocolError, Result};

/// ID3v2 major version.
///
/// Only the major version is significant; the revision byte must be zero.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Version {
    /// ID3v2.2 (three-character frame ids; recognised but not decoded)
    V22,
    /// ID3v2.3
    V23,
    /// ID3v2.4
    #[default]
    V24,
}

impl Version {
    /// Map a major version byte.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidVersion`] outside `2..=4`.
    pub const fn from_major(major: u8) -> Result<Self> {
        match major {
            2 => Ok(Self::V22),
            3 => Ok(Self::V23),
            4 => Ok(Self::V24),
            other => Err(ProtocolError::InvalidVersion(other)),
        }
    }

    /// Major version byte
    #[must_use]
    pub const fn major(self) -> u8 {
        match self {
            Self::V22 => 2,
            Self::V23 => 3,
            Self::V24 => 4,
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "2.{}", self.major())
    }
}
