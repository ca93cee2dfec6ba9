//! Decoder configuration.

use crate::syncsafe;

/// Decode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Largest declared tag size the decoder will allocate for
    ///
    /// Clamped to [`DecodeOptions::HARD_LIMIT`], the largest size a tag
    /// header can declare.
    pub max_tag_size: usize,
}

impl DecodeOptions {
    /// Default allocation ceiling (64 MiB)
    pub const DEFAULT_MAX_TAG_SIZE: usize = 64 * 1024 * 1024;

    /// Largest size a 28-bit sync-safe field can hold
    pub const HARD_LIMIT: usize = syncsafe::MAX_U28 as usize;

    /// Options with a custom ceiling
    #[must_use]
    pub const fn with_max_tag_size(max_tag_size: usize) -> Self {
        Self { max_tag_size }
    }

    /// Ceiling after clamping to [`DecodeOptions::HARD_LIMIT`]
    #[must_use]
    pub const fn limit(&self) -> usize {
        if self.max_tag_size < Self::HARD_LIMIT { self.max_tag_size } else { Self::HARD_LIMIT }
    }
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self { max_tag_size: Self::DEFAULT_MAX_TAG_SIZE }
    }
}
