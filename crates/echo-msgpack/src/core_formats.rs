// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Bindings for the seven core atoms (`spec.md` §4.1/§4.3.1-7): `Nil`,
//! `Bool`, `Signed`, `Unsigned`, `Float`, `Str`, `Bin`. Every primitive Rust
//! scalar binds to exactly one of these as its default format; wider or
//! narrower formats are reachable by packing/unpacking under an explicit
//! format tag instead of going through [`crate::construct::pack`].

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{Bin, Bool, Float, FormatTag, Formatted, Nil, OptionFmt, Signed, Str, Unsigned};
use crate::io::{Sink, Source};
use crate::wire;

// ---------------------------------------------------------------------
// Nil
// ---------------------------------------------------------------------

impl<C: Context> Formatted<C> for () {
    type Format = Nil;
}

impl<C: Context> Pack<Nil, C> for () {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_nil(sink)
    }
}

impl<C: Context> Unpack<Nil, C> for () {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        wire::read_nil(src)
    }
}

/// `Option<T>` packs as `Nil` for `None`, or `T`'s own default format for
/// `Some`; the wire representation carries no tag distinguishing "absent"
/// from "present nil", so `T` must not itself default to `Nil`.
impl<T, C> Formatted<C> for Option<T>
where
    C: Context,
    T: Formatted<C>,
{
    type Format = OptionFmt<T::Format>;
}

impl<T, F, C> Pack<OptionFmt<F>, C> for Option<T>
where
    F: FormatTag,
    C: Context,
    T: Pack<F, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        match self {
            Some(value) => value.pack(sink, ctx),
            None => wire::write_nil(sink),
        }
    }
}

impl<T, F, C> Unpack<OptionFmt<F>, C> for Option<T>
where
    F: FormatTag,
    C: Context,
    T: Unpack<F, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        if wire::peek_format(src)? == wire::WireKind::Nil {
            wire::read_nil(src)?;
            return Ok(None);
        }
        T::unpack(src, ctx).map(Some)
    }
}

// ---------------------------------------------------------------------
// Bool
// ---------------------------------------------------------------------

impl<C: Context> Formatted<C> for bool {
    type Format = Bool;
}

impl<C: Context> Pack<Bool, C> for bool {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_bool(sink, *self)
    }
}

impl<C: Context> Unpack<Bool, C> for bool {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        wire::read_bool(src)
    }
}

// ---------------------------------------------------------------------
// Signed / Unsigned integers
// ---------------------------------------------------------------------

macro_rules! signed_int {
    ($ty:ty) => {
        impl<C: Context> Formatted<C> for $ty {
            type Format = Signed;
        }

        impl<C: Context> Pack<Signed, C> for $ty {
            fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
                wire::write_signed(sink, i64::from(*self))
            }
        }

        impl<C: Context> Unpack<Signed, C> for $ty {
            fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
                let v = wire::read_signed(src)?;
                <$ty>::try_from(v).map_err(|_| UnpackError::IntegerOutOfRange {
                    format: "Signed",
                    value: i128::from(v),
                })
            }
        }
    };
}

macro_rules! unsigned_int {
    ($ty:ty) => {
        impl<C: Context> Formatted<C> for $ty {
            type Format = Unsigned;
        }

        impl<C: Context> Pack<Unsigned, C> for $ty {
            fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
                wire::write_unsigned(sink, u64::from(*self))
            }
        }

        impl<C: Context> Unpack<Unsigned, C> for $ty {
            fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
                let v = wire::read_unsigned(src)?;
                <$ty>::try_from(v).map_err(|_| UnpackError::IntegerOutOfRange {
                    format: "Unsigned",
                    value: i128::from(v),
                })
            }
        }
    };
}

signed_int!(i8);
signed_int!(i16);
signed_int!(i32);
signed_int!(i64);
unsigned_int!(u8);
unsigned_int!(u16);
unsigned_int!(u32);
unsigned_int!(u64);

impl<C: Context> Formatted<C> for isize {
    type Format = Signed;
}

impl<C: Context> Pack<Signed, C> for isize {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_signed(sink, *self as i64)
    }
}

impl<C: Context> Unpack<Signed, C> for isize {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        let v = wire::read_signed(src)?;
        isize::try_from(v).map_err(|_| UnpackError::IntegerOutOfRange {
            format: "Signed",
            value: i128::from(v),
        })
    }
}

impl<C: Context> Formatted<C> for usize {
    type Format = Unsigned;
}

impl<C: Context> Pack<Unsigned, C> for usize {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_unsigned(sink, *self as u64)
    }
}

impl<C: Context> Unpack<Unsigned, C> for usize {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        let v = wire::read_unsigned(src)?;
        usize::try_from(v).map_err(|_| UnpackError::IntegerOutOfRange {
            format: "Unsigned",
            value: i128::from(v),
        })
    }
}

// ---------------------------------------------------------------------
// Float
// ---------------------------------------------------------------------

impl<C: Context> Formatted<C> for f32 {
    type Format = Float;
}

impl<C: Context> Pack<Float, C> for f32 {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_f32(sink, *self)
    }
}

impl<C: Context> Unpack<Float, C> for f32 {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        Ok(wire::read_float(src)? as f32)
    }
}

impl<C: Context> Formatted<C> for f64 {
    type Format = Float;
}

impl<C: Context> Pack<Float, C> for f64 {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_f64(sink, *self)
    }
}

impl<C: Context> Unpack<Float, C> for f64 {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        wire::read_float(src)
    }
}

/// `f16` is never a wire representation of its own — every `f16` is widened
/// to `f32` on write (`spec.md` §4.1 "Float"), and narrowed back on read.
impl<C: Context> Formatted<C> for half::f16 {
    type Format = Float;
}

impl<C: Context> Pack<Float, C> for half::f16 {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_f32(sink, self.to_f32())
    }
}

impl<C: Context> Unpack<Float, C> for half::f16 {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        Ok(half::f16::from_f64(wire::read_float(src)?))
    }
}

// ---------------------------------------------------------------------
// Str
// ---------------------------------------------------------------------

impl<C: Context> Formatted<C> for String {
    type Format = Str;
}

impl<C: Context> Pack<Str, C> for String {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_str(sink, self)
    }
}

impl<C: Context> Unpack<Str, C> for String {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        wire::read_str(src)
    }
}

impl<C: Context> Pack<Str, C> for str {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_str(sink, self)
    }
}

// ---------------------------------------------------------------------
// Bin
// ---------------------------------------------------------------------

/// `Vec<u8>`'s *default* format is `Vector` (an array of `Unsigned` bytes),
/// matching every other `Vec<T>` — mirroring `serde`'s stance that `Vec<u8>`
/// is a sequence unless explicitly marked otherwise (`serde_bytes`). `Bin`
/// remains reachable either by packing/unpacking `Vec<u8>` under an
/// explicit format (`construct::pack_as::<Bin, _, _>`) or by wrapping the
/// value in [`Bytes`], whose default format *is* `Bin`.
impl<C: Context> Pack<Bin, C> for Vec<u8> {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_bin(sink, self)
    }
}

impl<C: Context> Unpack<Bin, C> for Vec<u8> {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        wire::read_bin(src)
    }
}

impl<C: Context> Pack<Bin, C> for [u8] {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_bin(sink, self)
    }
}

/// A raw binary blob whose default format is `Bin`, distinguishing "pack me
/// as a byte string" from a `Vec<u8>`'s default of "pack me as an array of
/// bytes" — the analogue of `serde_bytes::ByteBuf`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bytes(pub Vec<u8>);

impl<C: Context> Formatted<C> for Bytes {
    type Format = Bin;
}

impl<C: Context> Pack<Bin, C> for Bytes {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_bin(sink, &self.0)
    }
}

impl<C: Context> Unpack<Bin, C> for Bytes {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        Ok(Bytes(wire::read_bin(src)?))
    }
}
