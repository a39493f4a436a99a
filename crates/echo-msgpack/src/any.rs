// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Any` (`spec.md` §4.3.12, component C3): type-less decode. Peeks the next
//! byte, classifies it into a core format, and decodes generically —
//! recursing into arrays/maps and materializing extensions as
//! [`ExtensionData`] — ignoring whatever context is ambient at the call
//! site.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::extension::ExtensionData;
use crate::format::{AnyFmt, Formatted};
use crate::io::{Sink, Source};
use crate::wire::{self, WireKind};

/// A dynamically typed MessagePack value, materialized by [`unpack_any`]
/// when no target Rust type is known ahead of decode time (`spec.md` §3
/// `Any`).
#[derive(Debug, Clone, PartialEq)]
pub enum AnyValue {
    /// `nil`.
    Nil,
    /// `true`/`false`.
    Bool(bool),
    /// Any negative-capable integer encoding.
    Int(i64),
    /// A non-negative integer encoding too large to fit in `i64`'s positive
    /// range conveniently, or simply decoded via the unsigned family.
    UInt(u64),
    /// `f32`/`f64`, widened to `f64`.
    Float(f64),
    /// A UTF-8 string.
    Str(String),
    /// A raw binary blob.
    Bin(Vec<u8>),
    /// An array, each element itself decoded generically.
    Array(Vec<AnyValue>),
    /// A map, each key and value decoded generically.
    Map(Vec<(AnyValue, AnyValue)>),
    /// An extension, as raw `(code, payload)`.
    Ext(ExtensionData),
}

/// Peek, classify, and decode one value generically (`spec.md` §4.3.12).
/// Equivalent to `unpack::<AnyValue, _>` but exposed as a free function
/// since `Any` decode ignores any context parameter entirely.
pub fn unpack_any<R: Source>(src: &mut R) -> Result<AnyValue, UnpackError> {
    match wire::peek_format(src)? {
        WireKind::Nil => {
            wire::read_nil(src)?;
            Ok(AnyValue::Nil)
        }
        WireKind::Bool => Ok(AnyValue::Bool(wire::read_bool(src)?)),
        WireKind::Int => read_any_int(src),
        WireKind::Float => Ok(AnyValue::Float(wire::read_float(src)?)),
        WireKind::Str => Ok(AnyValue::Str(wire::read_str(src)?)),
        WireKind::Bin => Ok(AnyValue::Bin(wire::read_bin(src)?)),
        WireKind::Array => {
            let len = wire::read_array_header(src)?;
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                out.push(unpack_any(src)?);
            }
            Ok(AnyValue::Array(out))
        }
        WireKind::Map => {
            let len = wire::read_map_header(src)?;
            let mut out = Vec::with_capacity(len);
            for _ in 0..len {
                let k = unpack_any(src)?;
                let v = unpack_any(src)?;
                out.push((k, v));
            }
            Ok(AnyValue::Map(out))
        }
        WireKind::Ext => {
            let (code, len) = wire::read_ext_header(src)?;
            let payload = src.read_vec(len)?;
            Ok(AnyValue::Ext(ExtensionData { code, payload }))
        }
    }
}

/// `read_signed` tolerates the unsigned encodings too, so the sign of the
/// prefix byte itself decides which `AnyValue` integer variant to surface —
/// matching `read_unsigned`'s refusal to tolerate negative encodings
/// elsewhere in this engine.
fn read_any_int<R: Source>(src: &mut R) -> Result<AnyValue, UnpackError> {
    let b = src.peek_u8()?;
    let is_negative_capable = matches!(b, 0xe0..=0xff | 0xd0..=0xd3);
    if is_negative_capable {
        Ok(AnyValue::Int(wire::read_signed(src)?))
    } else {
        Ok(AnyValue::UInt(wire::read_unsigned(src)?))
    }
}

fn pack_any<S: Sink>(value: &AnyValue, sink: &mut S) -> Result<(), PackError> {
    match value {
        AnyValue::Nil => wire::write_nil(sink),
        AnyValue::Bool(b) => wire::write_bool(sink, *b),
        AnyValue::Int(i) => wire::write_signed(sink, *i),
        AnyValue::UInt(u) => wire::write_unsigned(sink, *u),
        AnyValue::Float(f) => wire::write_f64(sink, *f),
        AnyValue::Str(s) => wire::write_str(sink, s),
        AnyValue::Bin(b) => wire::write_bin(sink, b),
        AnyValue::Array(items) => {
            wire::write_array_header(sink, items.len())?;
            for item in items {
                pack_any(item, sink)?;
            }
            Ok(())
        }
        AnyValue::Map(entries) => {
            wire::write_map_header(sink, entries.len())?;
            for (k, v) in entries {
                pack_any(k, sink)?;
                pack_any(v, sink)?;
            }
            Ok(())
        }
        AnyValue::Ext(data) => {
            wire::write_ext_header(sink, data.code, data.payload.len())?;
            sink.write_bytes(&data.payload)
        }
    }
}

impl<C: Context> Formatted<C> for AnyValue {
    type Format = AnyFmt;
}

impl<C: Context> Pack<AnyFmt, C> for AnyValue {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        pack_any(self, sink)
    }
}

impl<C: Context> Unpack<AnyFmt, C> for AnyValue {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        unpack_any(src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{pack, unpack};
    use crate::context::DefaultContext;

    #[test]
    fn scalar_roundtrip() {
        let bytes = pack(&AnyValue::Int(-5), DefaultContext).unwrap();
        let back: AnyValue = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, AnyValue::Int(-5));
    }

    #[test]
    fn unsigned_classified_separately_from_signed() {
        let mut sink = crate::io::VecSink::new();
        wire::write_unsigned(&mut sink, 200).unwrap();
        let bytes = sink.into_vec();
        let back = unpack_any(&mut crate::io::SliceSource::new(&bytes)).unwrap();
        assert_eq!(back, AnyValue::UInt(200));
    }

    #[test]
    fn nested_array_and_map_roundtrip() {
        let value = AnyValue::Array(vec![
            AnyValue::Str("x".to_string()),
            AnyValue::Map(vec![(AnyValue::Str("k".to_string()), AnyValue::Bool(true))]),
        ]);
        let bytes = pack(&value, DefaultContext).unwrap();
        let back: AnyValue = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn extension_roundtrip() {
        let value = AnyValue::Ext(ExtensionData {
            code: 3,
            payload: vec![9, 9, 9],
        });
        let bytes = pack(&value, DefaultContext).unwrap();
        let back: AnyValue = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, value);
    }
}
