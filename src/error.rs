//! Error types for the layout-based allocation surface.
//!
//! The raw pointer operations on [`RegionAllocator`](crate::RegionAllocator)
//! keep the classic null-pointer contract: exhaustion returns null and
//! malformed requests are absorbed silently. The typed trait layer reports
//! those same conditions as values of this error type instead.

use crate::freelist::UNIT;

/// Errors reported by the [`Allocator`](crate::Allocator) trait surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    /// No free block can satisfy the request.
    #[error("no free block can satisfy a request of {requested} bytes")]
    Exhausted {
        /// Requested payload size in bytes.
        requested: usize,
    },

    /// Rounding the request up to whole units would overflow.
    #[error("size overflow while rounding {requested} bytes to units")]
    SizeOverflow {
        /// Requested payload size in bytes.
        requested: usize,
    },

    /// The layout demands alignment stronger than the unit alignment.
    #[error("alignment {align} exceeds the supported unit alignment {unit}", unit = UNIT)]
    UnsupportedAlignment {
        /// Requested alignment in bytes.
        align: usize,
    },
}

impl AllocError {
    /// Checks if this is an exhaustion error, the only condition a caller
    /// can clear by freeing or donating memory.
    #[inline]
    pub const fn is_exhausted(&self) -> bool {
        matches!(self, AllocError::Exhausted { .. })
    }
}

/// Result type for allocation operations
pub type AllocResult<T> = Result<T, AllocError>;
