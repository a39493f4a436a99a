// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `SetContext<C, F>` (`spec.md` §4.3.10, component C3): ignores whatever
//! context is ambient at the call site and substitutes a statically chosen
//! one before delegating to the inner format `F`. Enables per-field context
//! override inside a larger struct/vector/map without threading the
//! override through every sibling field.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{FormatTag, SetContext};
use crate::io::{Sink, Source};

impl<T, F, C, Ambient> Pack<SetContext<C, F>, Ambient> for T
where
    Ambient: Context,
    C: Context,
    F: FormatTag,
    T: Pack<F, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, _ambient: Ambient) -> Result<(), PackError> {
        <T as Pack<F, C>>::pack(self, sink, C::default())
    }
}

impl<T, F, C, Ambient> Unpack<SetContext<C, F>, Ambient> for T
where
    Ambient: Context,
    C: Context,
    F: FormatTag,
    T: Unpack<F, C>,
{
    fn unpack<R: Source>(src: &mut R, _ambient: Ambient) -> Result<Self, UnpackError> {
        <T as Unpack<F, C>>::unpack(src, C::default())
    }
}
