// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The pack/unpack dispatch core (components C2/C5): `Pack<F, C>`/
//! `Unpack<F, C>` are the canonical hooks the engine calls to convert
//! between domain values and a specific format's wire representation —
//! `destruct`/`construct` from `spec.md` §4.5, parameterized explicitly by
//! the format tag so one type may implement several formats (e.g. an `i32`
//! packs under both `Signed` and `Unsigned`).

use crate::context::{Context, DefaultContext};
use crate::error::{PackError, UnpackError};
use crate::format::{DefaultFmt, FormatTag, Formatted};
use crate::io::{Sink, Source};

/// Packs `Self` into `sink` under format `F` and context `C`.
pub trait Pack<F: FormatTag, C: Context = DefaultContext> {
    /// Destruct `self` and emit its wire atoms.
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError>;
}

/// Unpacks `Self` from `src` under format `F` and context `C`.
pub trait Unpack<F: FormatTag, C: Context = DefaultContext>: Sized {
    /// Read wire atoms and construct `Self`.
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError>;
}

/// Top-level entry point: pack `value` under its default format for
/// context `C` (`pack`, `spec.md` §6.2).
pub fn pack<T, C>(value: &T, ctx: C) -> Result<Vec<u8>, PackError>
where
    C: Context,
    T: Formatted<C>,
    T: Pack<<T as Formatted<C>>::Format, C>,
{
    let mut sink = crate::io::VecSink::new();
    pack_into(value, &mut sink, ctx)?;
    Ok(sink.into_vec())
}

/// Pack `value` into an arbitrary [`Sink`] (the `(io, value, ...)` variant
/// of `pack`).
pub fn pack_into<T, S, C>(value: &T, sink: &mut S, ctx: C) -> Result<(), PackError>
where
    C: Context,
    S: Sink,
    T: Formatted<C>,
    T: Pack<<T as Formatted<C>>::Format, C>,
{
    tracing::trace!(type_format = <T::Format as FormatTag>::NAME, "pack");
    <T as Pack<T::Format, C>>::pack(value, sink, ctx)
}

/// Top-level entry point: unpack a `T` from `bytes` under its default
/// format for context `C` (`unpack`, `spec.md` §6.2).
pub fn unpack<T, C>(bytes: &[u8], ctx: C) -> Result<T, UnpackError>
where
    C: Context,
    T: Formatted<C>,
    T: Unpack<<T as Formatted<C>>::Format, C>,
{
    let mut src = crate::io::SliceSource::new(bytes);
    unpack_from(&mut src, ctx)
}

/// Unpack a `T` from an arbitrary [`Source`] (the `(io, ...)` variant of
/// `unpack`).
pub fn unpack_from<T, R, C>(src: &mut R, ctx: C) -> Result<T, UnpackError>
where
    C: Context,
    R: Source,
    T: Formatted<C>,
    T: Unpack<<T as Formatted<C>>::Format, C>,
{
    tracing::trace!(type_format = <T::Format as FormatTag>::NAME, "unpack");
    <T as Unpack<T::Format, C>>::unpack(src, ctx)
}

/// Pack `value` under an explicitly chosen format `F`, overriding whatever
/// `Formatted<C>` would otherwise resolve (the `[format]` override of
/// `spec.md` §6.2's `pack` signature).
pub fn pack_as<F, T, C>(value: &T, ctx: C) -> Result<Vec<u8>, PackError>
where
    F: FormatTag,
    C: Context,
    T: Pack<F, C>,
{
    let mut sink = crate::io::VecSink::new();
    pack_into_as::<F, T, _, C>(value, &mut sink, ctx)?;
    Ok(sink.into_vec())
}

/// The `(io, ...)` variant of [`pack_as`].
pub fn pack_into_as<F, T, S, C>(value: &T, sink: &mut S, ctx: C) -> Result<(), PackError>
where
    F: FormatTag,
    C: Context,
    S: Sink,
    T: Pack<F, C>,
{
    tracing::trace!(format = F::NAME, "pack_as");
    <T as Pack<F, C>>::pack(value, sink, ctx)
}

/// Unpack a `T` under an explicitly chosen format `F`, overriding whatever
/// `Formatted<C>` would otherwise resolve.
pub fn unpack_as<F, T, C>(bytes: &[u8], ctx: C) -> Result<T, UnpackError>
where
    F: FormatTag,
    C: Context,
    T: Unpack<F, C>,
{
    let mut src = crate::io::SliceSource::new(bytes);
    unpack_from_as::<F, T, _, C>(&mut src, ctx)
}

/// The `(io, ...)` variant of [`unpack_as`].
pub fn unpack_from_as<F, T, R, C>(src: &mut R, ctx: C) -> Result<T, UnpackError>
where
    F: FormatTag,
    C: Context,
    R: Source,
    T: Unpack<F, C>,
{
    tracing::trace!(format = F::NAME, "unpack_as");
    <T as Unpack<F, C>>::unpack(src, ctx)
}

// ---------------------------------------------------------------------
// `Default` format: lazy reroute to `format(T, ctx)` (§4.3.11)
// ---------------------------------------------------------------------

impl<T, C> Pack<DefaultFmt, C> for T
where
    C: Context,
    T: Formatted<C>,
    T: Pack<<T as Formatted<C>>::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        if <T::Format as FormatTag>::IS_DEFAULT {
            return Err(PackError::DefaultResolvedToDefault {
                type_name: core::any::type_name::<T>(),
            });
        }
        <T as Pack<T::Format, C>>::pack(self, sink, ctx)
    }
}

impl<T, C> Unpack<DefaultFmt, C> for T
where
    C: Context,
    T: Formatted<C>,
    T: Unpack<<T as Formatted<C>>::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        if <T::Format as FormatTag>::IS_DEFAULT {
            return Err(UnpackError::Source(format!(
                "invariant violated: format({}) resolved to `Default`",
                core::any::type_name::<T>()
            )));
        }
        <T as Unpack<T::Format, C>>::unpack(src, ctx)
    }
}
