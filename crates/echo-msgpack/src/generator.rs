// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The lazy sequence generator (`spec.md` §4.4, component C4): a single-pass
//! cursor over a decoded array/map's entries, bound to the active `Source`.
//! `construct` implementations drive it one yield at a time; the engine
//! guarantees exactly `n` yields matching the decoded header and, in debug
//! builds, panics if a generator is dropped before being fully drained
//! (`spec.md` §9 "Generator ordering constraint").

use crate::construct::Unpack;
use crate::context::Context;
use crate::error::UnpackError;
use crate::format::FormatTag;
use crate::io::Source;

/// A single-pass, lazy cursor over `len` wire entries read from `src`.
/// Entries must be consumed in order; the cursor never buffers.
pub struct Generator<'s, R> {
    src: &'s mut R,
    len: usize,
    yielded: usize,
}

impl<'s, R: Source> Generator<'s, R> {
    /// Wrap `src`, which is positioned immediately after a header declaring
    /// `len` entries.
    pub(crate) fn new(src: &'s mut R, len: usize) -> Self {
        Self {
            src,
            len,
            yielded: 0,
        }
    }

    /// The number of entries declared by the header.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the header declared zero entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Entries not yet yielded.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.len - self.yielded
    }

    /// Decode and yield the next entry as `T` under format `F`/context `C`.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if called more times than the declared
    /// length — the same contract violation guarded on drop.
    pub fn next<T, F, C>(&mut self, ctx: C) -> Result<T, UnpackError>
    where
        F: FormatTag,
        C: Context,
        T: Unpack<F, C>,
    {
        debug_assert!(
            self.yielded < self.len,
            "Generator::next called past its declared length"
        );
        let value = T::unpack(self.src, ctx)?;
        self.yielded += 1;
        Ok(value)
    }

    /// Borrow the underlying source directly, for formats (e.g.
    /// `DynamicVector`) that need to read a key or tag before deciding the
    /// next element's type.
    pub(crate) fn source(&mut self) -> &mut R {
        self.src
    }

    /// Record one yield performed directly against [`Generator::source`]
    /// without going through [`Generator::next`].
    pub(crate) fn mark_yielded(&mut self) {
        self.yielded += 1;
    }
}

impl<R> Drop for Generator<'_, R> {
    fn drop(&mut self) {
        debug_assert_eq!(
            self.yielded, self.len,
            "Generator dropped without being fully drained; every `construct` \
             implementation must consume exactly the declared entry count"
        );
    }
}
