//! Identification and rating frames (`UFID`, `POPM`).

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{Fields, Values};
use crate::walker::Value;

/// Unique file identifier (`UFID`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueFileId {
    /// URL or email of the database that issued the identifier (Latin-1)
    pub owner: String,
    /// Up to 64 bytes of binary identifier
    pub identifier: Bytes,
}

impl Fields for UniqueFileId {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self { owner: v.text()?, identifier: v.bytes()? })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![Value::Text(self.owner.clone()), Value::Bytes(self.identifier.clone())]
    }
}

/// Popularimeter (`POPM`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Popularimeter {
    /// Email of the user the rating belongs to (Latin-1)
    pub email: String,
    /// 1 (worst) to 255 (best); 0 is unknown
    pub rating: u8,
    /// Big-endian play counter, any length, may be empty
    pub counter: Bytes,
}

impl Popularimeter {
    /// Play counter as an integer.
    ///
    /// `None` when the counter is absent or wider than 64 bits.
    #[must_use]
    pub fn play_count(&self) -> Option<u64> {
        if self.counter.is_empty() {
            return None;
        }
        let significant = self.counter.iter().skip_while(|&&b| b == 0).count();
        if significant > 8 {
            return None;
        }
        Some(self.counter.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b)))
    }
}

impl Fields for Popularimeter {
    fn from_values(v: &mut Values) -> Option<Self> {
        Some(Self { email: v.text()?, rating: v.byte()?, counter: v.bytes()? })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::Text(self.email.clone()),
            Value::Byte(self.rating),
            Value::Bytes(self.counter.clone()),
        ]
    }
}
