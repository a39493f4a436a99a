// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Struct variants (`spec.md` §4.3.4, component C3): an ordered,
//! string-keyed map matching a fixed schema. `StructFmt`, `UnorderedStruct`,
//! and `FlexibleStruct` differ only in key-order/unknown-key discipline on
//! unpack; all three pack identically (declared field order, string keys).
//!
//! There is no derive macro (`spec.md` §1 explicit non-goal: "the
//! convenience macro that emits format bindings from a compact DSL"), so a
//! user type implements [`StructFormat`] by hand — the hook surface
//! `spec.md` §6.3 says is sufficient to express every binding the DSL would
//! otherwise generate.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{FlexibleStruct, StructFmt, UnorderedStruct};
use crate::io::{Sink, Source};
use crate::skip;
use crate::wire;

/// The per-type hand-written binding a struct-shaped type provides: its
/// field names in declared order, and how to write one field's value.
/// Equivalent to `fieldnames`/`fieldformats` + `destruct` (`spec.md`
/// §4.2/§4.5) collapsed into a single write hook per field position.
pub trait StructFormat<C: Context = crate::context::DefaultContext>: Sized {
    /// The struct's name, used in error messages.
    const TYPE_NAME: &'static str;
    /// Field names in declared order — the schema every variant checks
    /// input against.
    const FIELD_NAMES: &'static [&'static str];
    /// Accumulates field values read in any order before [`StructBuilder::finish`]
    /// performs positional/keyword construction (`construct`, `spec.md` §4.5).
    type Builder: StructBuilder<Self, C> + Default;

    /// Write the value of the field at `index` (per [`Self::FIELD_NAMES`]).
    fn pack_field<S: Sink>(&self, index: usize, sink: &mut S, ctx: C) -> Result<(), PackError>;
}

/// The unpack-side counterpart of [`StructFormat`]: reads one field's value
/// at a time (possibly out of declared order) and assembles the final
/// value once every required field has arrived.
pub trait StructBuilder<T, C: Context = crate::context::DefaultContext> {
    /// Read and store the value of the field at `index`.
    fn read_field<R: Source>(&mut self, index: usize, src: &mut R, ctx: C) -> Result<(), UnpackError>;

    /// Construct `T` from the accumulated field values. Called only after
    /// every declared field has been read at least once.
    fn finish(self, ctx: C) -> Result<T, UnpackError>;
}

fn pack_struct_body<T, S, C>(value: &T, sink: &mut S, ctx: C) -> Result<(), PackError>
where
    T: StructFormat<C>,
    S: Sink,
    C: Context + Copy,
{
    wire::write_map_header(sink, T::FIELD_NAMES.len())?;
    for (index, name) in T::FIELD_NAMES.iter().enumerate() {
        wire::write_str(sink, name)?;
        value.pack_field(index, sink, ctx)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------
// StructFmt — exact declared order
// ---------------------------------------------------------------------

impl<T, C> Pack<StructFmt, C> for T
where
    T: StructFormat<C>,
    C: Context + Copy,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        pack_struct_body(self, sink, ctx)
    }
}

impl<T, C> Unpack<StructFmt, C> for T
where
    T: StructFormat<C>,
    C: Context + Copy,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(src)?;
        if len != T::FIELD_NAMES.len() {
            return Err(UnpackError::LengthMismatch {
                format: "Struct",
                expected: T::FIELD_NAMES.len(),
                found: len,
            });
        }
        let mut builder = T::Builder::default();
        for (index, expected) in T::FIELD_NAMES.iter().enumerate() {
            let found = wire::read_str(src)?;
            if &found != expected {
                return Err(UnpackError::OutOfOrderKey {
                    type_name: T::TYPE_NAME,
                    position: index,
                    expected,
                    found,
                });
            }
            builder.read_field(index, src, ctx)?;
        }
        builder.finish(ctx)
    }
}

// ---------------------------------------------------------------------
// UnorderedStruct — any permutation; reject duplicate/unknown keys
// ---------------------------------------------------------------------

impl<T, C> Pack<UnorderedStruct, C> for T
where
    T: StructFormat<C>,
    C: Context + Copy,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        pack_struct_body(self, sink, ctx)
    }
}

impl<T, C> Unpack<UnorderedStruct, C> for T
where
    T: StructFormat<C>,
    C: Context + Copy,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let n = T::FIELD_NAMES.len();
        let len = wire::read_map_header(src)?;
        if len != n {
            return Err(UnpackError::LengthMismatch {
                format: "UnorderedStruct",
                expected: n,
                found: len,
            });
        }
        let mut builder = T::Builder::default();
        let mut seen = vec![false; n];
        for _ in 0..len {
            let key = wire::read_str(src)?;
            let index = T::FIELD_NAMES
                .iter()
                .position(|name| *name == key)
                .ok_or_else(|| UnpackError::UnexpectedKey {
                    type_name: T::TYPE_NAME,
                    key: key.clone(),
                })?;
            if seen[index] {
                return Err(UnpackError::DuplicateKey {
                    type_name: T::TYPE_NAME,
                    key,
                });
            }
            seen[index] = true;
            builder.read_field(index, src, ctx)?;
        }
        builder.finish(ctx)
    }
}

// ---------------------------------------------------------------------
// FlexibleStruct — unknown keys silently skipped; missing declared keys
// still reject (§4.3.4, §9 Open Question: duplicates reject like
// UnorderedStruct)
// ---------------------------------------------------------------------

impl<T, C> Pack<FlexibleStruct, C> for T
where
    T: StructFormat<C>,
    C: Context + Copy,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        pack_struct_body(self, sink, ctx)
    }
}

impl<T, C> Unpack<FlexibleStruct, C> for T
where
    T: StructFormat<C>,
    C: Context + Copy,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let n = T::FIELD_NAMES.len();
        let len = wire::read_map_header(src)?;
        let mut builder = T::Builder::default();
        let mut seen = vec![false; n];
        for _ in 0..len {
            let key = wire::read_str(src)?;
            match T::FIELD_NAMES.iter().position(|name| *name == key) {
                Some(index) => {
                    if seen[index] {
                        return Err(UnpackError::DuplicateKey {
                            type_name: T::TYPE_NAME,
                            key,
                        });
                    }
                    seen[index] = true;
                    builder.read_field(index, src, ctx)?;
                }
                None => skip::skip(src)?,
            }
        }
        for (index, name) in T::FIELD_NAMES.iter().enumerate() {
            if !seen[index] {
                return Err(UnpackError::MissingKey {
                    type_name: T::TYPE_NAME,
                    key: name,
                });
            }
        }
        builder.finish(ctx)
    }
}
