use std::{mem::size_of, num::NonZeroU64};

use static_assertions::const_assert_eq;

const_assert_eq!(size_of::<Option<NonMaxU64>>(), size_of::<NonMaxU64>());

/// A `u64` that is never `u64::MAX`, leaving that bit pattern as the niche
/// for `Option`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NonMaxU64(NonZeroU64);

impl std::fmt::Debug for NonMaxU64 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("NonMaxU64").field(&self.get()).finish()
    }
}

impl NonMaxU64 {
    #[inline]
    pub const fn new(n: u64) -> Option<Self> {
        match NonZeroU64::new(!n) {
            Some(inner) => Some(Self(inner)),
            None => None,
        }
    }

    #[inline]
    pub const fn get(self) -> u64 {
        !self.0.get()
    }
}
