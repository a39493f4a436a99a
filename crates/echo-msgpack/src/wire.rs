// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! The MessagePack atom layer (`spec.md` §4.1, component C1). Bit-exact
//! read/write pairs for each atom, with shortest-legal-encoding selection on
//! write and tolerant (tagged-union) decoding on read where the spec calls
//! for it.

use crate::error::{PackError, UnpackError};
use crate::io::{Sink, Source};

/// The core MessagePack value classes, used by `peek_format`/`Any` to
/// classify the next byte without committing to a specific Rust type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireKind {
    /// `0xc0`.
    Nil,
    /// `0xc2`/`0xc3`.
    Bool,
    /// A signed or unsigned integer encoding.
    Int,
    /// `0xca`/`0xcb` (f16 is widened to f32 on read per `spec.md` §6.1).
    Float,
    /// A string encoding.
    Str,
    /// A binary encoding.
    Bin,
    /// An array header.
    Array,
    /// A map header.
    Map,
    /// An extension encoding.
    Ext,
}

/// Classify the next byte without consuming it (`peekformat`, §4.1/§6.2).
pub fn peek_format<S: Source>(src: &mut S) -> Result<WireKind, UnpackError> {
    let b = src.peek_u8()?;
    Ok(classify(b))
}

fn classify(b: u8) -> WireKind {
    match b {
        0xc0 => WireKind::Nil,
        0xc2 | 0xc3 => WireKind::Bool,
        0x00..=0x7f | 0xe0..=0xff | 0xcc..=0xcf | 0xd0..=0xd3 => WireKind::Int,
        0xca | 0xcb => WireKind::Float,
        0xa0..=0xbf | 0xd9 | 0xda | 0xdb => WireKind::Str,
        0xc4..=0xc6 => WireKind::Bin,
        0x90..=0x9f | 0xdc | 0xdd => WireKind::Array,
        0x80..=0x8f | 0xde | 0xdf => WireKind::Map,
        0xd4..=0xd8 | 0xc7..=0xc9 => WireKind::Ext,
        _ => WireKind::Int, // unreachable for valid MessagePack; see is_formatbyte checks below
    }
}

/// Whether `b` could plausibly begin an encoding of `format` (`isformatbyte`,
/// §4.1). Used by `Any` and by error messages naming the attempted format.
#[must_use]
pub fn is_format_byte(b: u8, format: &'static str) -> bool {
    match format {
        "Nil" => b == 0xc0,
        "Bool" => b == 0xc2 || b == 0xc3,
        "Signed" => matches!(b, 0x00..=0x7f | 0xe0..=0xff | 0xd0..=0xd3 | 0xcc..=0xcf),
        "Unsigned" => matches!(b, 0x00..=0x7f | 0xcc..=0xcf),
        "Float" => b == 0xca || b == 0xcb,
        "String" => matches!(b, 0xa0..=0xbf | 0xd9 | 0xda | 0xdb),
        "Binary" => matches!(b, 0xc4..=0xc6),
        "Array" | "Vector" => matches!(b, 0x90..=0x9f | 0xdc | 0xdd),
        "Map" => matches!(b, 0x80..=0x8f | 0xde | 0xdf),
        "Extension" => matches!(b, 0xd4..=0xd8 | 0xc7..=0xc9),
        _ => true,
    }
}

// ---------------------------------------------------------------------
// Nil / Bool
// ---------------------------------------------------------------------

/// Write `0xc0`.
pub fn write_nil<S: Sink>(sink: &mut S) -> Result<(), PackError> {
    sink.write_u8(0xc0)
}

/// Expect and consume `0xc0`.
pub fn read_nil<R: Source>(src: &mut R) -> Result<(), UnpackError> {
    let b = src.read_u8()?;
    if b != 0xc0 {
        return Err(UnpackError::BadPrefix { format: "Nil", byte: b });
    }
    Ok(())
}

/// Write `0xc2`/`0xc3`.
pub fn write_bool<S: Sink>(sink: &mut S, v: bool) -> Result<(), PackError> {
    sink.write_u8(if v { 0xc3 } else { 0xc2 })
}

/// Read `0xc2`/`0xc3`.
pub fn read_bool<R: Source>(src: &mut R) -> Result<bool, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0xc2 => Ok(false),
        0xc3 => Ok(true),
        _ => Err(UnpackError::BadPrefix { format: "Bool", byte: b }),
    }
}

// ---------------------------------------------------------------------
// Integers — shortest-legal-encoding selection on write
// ---------------------------------------------------------------------

/// Write a signed integer, choosing the smallest legal class.
pub fn write_signed<S: Sink>(sink: &mut S, v: i64) -> Result<(), PackError> {
    if (-32..=0x7f).contains(&v) {
        // Positive and negative fixint share one byte, sign-extended.
        sink.write_u8(v as i8 as u8)
    } else if let Ok(v8) = i8::try_from(v) {
        sink.write_u8(0xd0)?;
        sink.write_bytes(&v8.to_be_bytes())
    } else if let Ok(v16) = i16::try_from(v) {
        sink.write_u8(0xd1)?;
        sink.write_bytes(&v16.to_be_bytes())
    } else if let Ok(v32) = i32::try_from(v) {
        sink.write_u8(0xd2)?;
        sink.write_bytes(&v32.to_be_bytes())
    } else {
        sink.write_u8(0xd3)?;
        sink.write_bytes(&v.to_be_bytes())
    }
}

/// Read a signed integer. Tolerant: also accepts the unsigned encodings
/// (`0xcc..=0xcf`) for forward compatibility, per `spec.md` §6.1.
pub fn read_signed<R: Source>(src: &mut R) -> Result<i64, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0x00..=0x7f => Ok(i64::from(b as i8)),
        0xe0..=0xff => Ok(i64::from(b as i8)),
        0xd0 => Ok(i64::from(read_be::<1, R>(src)?[0] as i8)),
        0xd1 => {
            let buf = read_be::<2, R>(src)?;
            Ok(i64::from(i16::from_be_bytes(buf)))
        }
        0xd2 => {
            let buf = read_be::<4, R>(src)?;
            Ok(i64::from(i32::from_be_bytes(buf)))
        }
        0xd3 => {
            let buf = read_be::<8, R>(src)?;
            Ok(i64::from_be_bytes(buf))
        }
        0xcc => Ok(i64::from(read_be::<1, R>(src)?[0])),
        0xcd => {
            let buf = read_be::<2, R>(src)?;
            Ok(i64::from(u16::from_be_bytes(buf)))
        }
        0xce => {
            let buf = read_be::<4, R>(src)?;
            Ok(i64::from(u32::from_be_bytes(buf)))
        }
        0xcf => {
            let buf = read_be::<8, R>(src)?;
            let u = u64::from_be_bytes(buf);
            i64::try_from(u).map_err(|_| UnpackError::BadPrefix { format: "Signed", byte: b })
        }
        _ => Err(UnpackError::BadPrefix { format: "Signed", byte: b }),
    }
}

/// Write an unsigned integer, choosing the smallest legal class.
pub fn write_unsigned<S: Sink>(sink: &mut S, v: u64) -> Result<(), PackError> {
    if v <= 0x7f {
        sink.write_u8(v as u8)
    } else if let Ok(v8) = u8::try_from(v) {
        sink.write_u8(0xcc)?;
        sink.write_bytes(&v8.to_be_bytes())
    } else if let Ok(v16) = u16::try_from(v) {
        sink.write_u8(0xcd)?;
        sink.write_bytes(&v16.to_be_bytes())
    } else if let Ok(v32) = u32::try_from(v) {
        sink.write_u8(0xce)?;
        sink.write_bytes(&v32.to_be_bytes())
    } else {
        sink.write_u8(0xcf)?;
        sink.write_bytes(&v.to_be_bytes())
    }
}

/// Read an unsigned integer. Not tolerant of signed encodings — the spec's
/// asymmetry is intentional (§9 Open Questions).
pub fn read_unsigned<R: Source>(src: &mut R) -> Result<u64, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0x00..=0x7f => Ok(u64::from(b)),
        0xcc => Ok(u64::from(read_be::<1, R>(src)?[0])),
        0xcd => {
            let buf = read_be::<2, R>(src)?;
            Ok(u64::from(u16::from_be_bytes(buf)))
        }
        0xce => {
            let buf = read_be::<4, R>(src)?;
            Ok(u64::from(u32::from_be_bytes(buf)))
        }
        0xcf => {
            let buf = read_be::<8, R>(src)?;
            Ok(u64::from_be_bytes(buf))
        }
        _ => Err(UnpackError::BadPrefix { format: "Unsigned", byte: b }),
    }
}

// ---------------------------------------------------------------------
// Floats
// ---------------------------------------------------------------------

/// Write an f32 as `0xca`.
pub fn write_f32<S: Sink>(sink: &mut S, v: f32) -> Result<(), PackError> {
    sink.write_u8(0xca)?;
    sink.write_bytes(&v.to_be_bytes())
}

/// Write an f64 as `0xcb`.
pub fn write_f64<S: Sink>(sink: &mut S, v: f64) -> Result<(), PackError> {
    sink.write_u8(0xcb)?;
    sink.write_bytes(&v.to_be_bytes())
}

/// Read a float. Only `0xca`/`0xcb` are accepted on read (§6.1) — a
/// MessagePack f16 is not a wire form this engine emits or consumes
/// directly; `half::f16` values are widened to f32 on write (see
/// `core_formats`).
pub fn read_float<R: Source>(src: &mut R) -> Result<f64, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0xca => {
            let buf = read_be::<4, R>(src)?;
            Ok(f64::from(f32::from_be_bytes(buf)))
        }
        0xcb => {
            let buf = read_be::<8, R>(src)?;
            Ok(f64::from_be_bytes(buf))
        }
        _ => Err(UnpackError::BadPrefix { format: "Float", byte: b }),
    }
}

// ---------------------------------------------------------------------
// String / Binary
// ---------------------------------------------------------------------

/// Write a length header for a given major-class family, choosing the
/// shortest legal length-class.
fn write_len_class<S: Sink>(
    sink: &mut S,
    len: usize,
    fix_base: Option<(u8, u8)>, // (base byte, max fixed len) e.g. (0xa0, 31) for fixstr
    small: u8,                  // e.g. 0xd9 (str8) or 0xc4 (bin8)
    mid: u8,                    // str16 / bin16
    large: u8,                  // str32 / bin32
    format: &'static str,
) -> Result<(), PackError> {
    let len_u64 = len as u64;
    if let Some((base, max_fixed)) = fix_base {
        if len_u64 <= u64::from(max_fixed) {
            return sink.write_u8(base | len as u8);
        }
    }
    if let Ok(v) = u8::try_from(len) {
        sink.write_u8(small)?;
        return sink.write_bytes(&v.to_be_bytes());
    }
    if let Ok(v) = u16::try_from(len) {
        sink.write_u8(mid)?;
        return sink.write_bytes(&v.to_be_bytes());
    }
    if let Ok(v) = u32::try_from(len) {
        sink.write_u8(large)?;
        return sink.write_bytes(&v.to_be_bytes());
    }
    Err(PackError::LengthOverflow { format, len: len_u64 })
}

/// Write a UTF-8 string, choosing fixstr/str8/str16/str32.
pub fn write_str<S: Sink>(sink: &mut S, v: &str) -> Result<(), PackError> {
    write_len_class(
        sink,
        v.len(),
        Some((0xa0, 31)),
        0xd9,
        0xda,
        0xdb,
        "String",
    )?;
    sink.write_bytes(v.as_bytes())
}

/// Read a UTF-8 string header + payload.
pub fn read_str<R: Source>(src: &mut R) -> Result<String, UnpackError> {
    let len = read_str_header(src)?;
    let bytes = src.read_vec(len)?;
    String::from_utf8(bytes).map_err(|_| UnpackError::InvalidUtf8)
}

fn read_str_header<R: Source>(src: &mut R) -> Result<usize, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0xa0..=0xbf => Ok((b & 0x1f) as usize),
        0xd9 => Ok(read_be::<1, R>(src)?[0] as usize),
        0xda => Ok(u16::from_be_bytes(read_be::<2, R>(src)?) as usize),
        0xdb => Ok(u32::from_be_bytes(read_be::<4, R>(src)?) as usize),
        _ => Err(UnpackError::BadPrefix { format: "String", byte: b }),
    }
}

/// Write a binary blob, choosing bin8/bin16/bin32.
pub fn write_bin<S: Sink>(sink: &mut S, v: &[u8]) -> Result<(), PackError> {
    write_len_class(sink, v.len(), None, 0xc4, 0xc5, 0xc6, "Binary")?;
    sink.write_bytes(v)
}

/// Read a binary header + payload.
pub fn read_bin<R: Source>(src: &mut R) -> Result<Vec<u8>, UnpackError> {
    let b = src.read_u8()?;
    let len = match b {
        0xc4 => read_be::<1, R>(src)?[0] as usize,
        0xc5 => u16::from_be_bytes(read_be::<2, R>(src)?) as usize,
        0xc6 => u32::from_be_bytes(read_be::<4, R>(src)?) as usize,
        _ => return Err(UnpackError::BadPrefix { format: "Binary", byte: b }),
    };
    src.read_vec(len)
}

// ---------------------------------------------------------------------
// Array / Map headers
// ---------------------------------------------------------------------

/// Write an array header, choosing fixarray/array16/array32.
pub fn write_array_header<S: Sink>(sink: &mut S, len: usize) -> Result<(), PackError> {
    write_container_header(sink, len, 0x90, 15, 0xdc, 0xdd, "Array")
}

/// Read an array header, returning the element count.
pub fn read_array_header<R: Source>(src: &mut R) -> Result<usize, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0x90..=0x9f => Ok((b & 0x0f) as usize),
        0xdc => Ok(u16::from_be_bytes(read_be::<2, R>(src)?) as usize),
        0xdd => Ok(u32::from_be_bytes(read_be::<4, R>(src)?) as usize),
        _ => Err(UnpackError::BadPrefix { format: "Array", byte: b }),
    }
}

/// Write a map header, choosing fixmap/map16/map32.
pub fn write_map_header<S: Sink>(sink: &mut S, len: usize) -> Result<(), PackError> {
    write_container_header(sink, len, 0x80, 15, 0xde, 0xdf, "Map")
}

/// Shared two-tier (fix / 16 / 32) header writer for arrays and maps, which
/// have no 8-bit length class.
fn write_container_header<S: Sink>(
    sink: &mut S,
    len: usize,
    fix_base: u8,
    max_fixed: u8,
    class16: u8,
    class32: u8,
    format: &'static str,
) -> Result<(), PackError> {
    if len <= usize::from(max_fixed) {
        return sink.write_u8(fix_base | len as u8);
    }
    if let Ok(v) = u16::try_from(len) {
        sink.write_u8(class16)?;
        return sink.write_bytes(&v.to_be_bytes());
    }
    if let Ok(v) = u32::try_from(len) {
        sink.write_u8(class32)?;
        return sink.write_bytes(&v.to_be_bytes());
    }
    Err(PackError::LengthOverflow {
        format,
        len: len as u64,
    })
}

/// Read a map header, returning the entry count.
pub fn read_map_header<R: Source>(src: &mut R) -> Result<usize, UnpackError> {
    let b = src.read_u8()?;
    match b {
        0x80..=0x8f => Ok((b & 0x0f) as usize),
        0xde => Ok(u16::from_be_bytes(read_be::<2, R>(src)?) as usize),
        0xdf => Ok(u32::from_be_bytes(read_be::<4, R>(src)?) as usize),
        _ => Err(UnpackError::BadPrefix { format: "Map", byte: b }),
    }
}

// ---------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------

/// Write an extension header (fixext1/2/4/8/16 or ext8/16/32) followed by
/// the type code; the caller writes the payload.
pub fn write_ext_header<S: Sink>(sink: &mut S, code: i8, len: usize) -> Result<(), PackError> {
    match len {
        1 => sink.write_u8(0xd4)?,
        2 => sink.write_u8(0xd5)?,
        4 => sink.write_u8(0xd6)?,
        8 => sink.write_u8(0xd7)?,
        16 => sink.write_u8(0xd8)?,
        _ => {
            if let Ok(v) = u8::try_from(len) {
                sink.write_u8(0xc7)?;
                sink.write_bytes(&v.to_be_bytes())?;
            } else if let Ok(v) = u16::try_from(len) {
                sink.write_u8(0xc8)?;
                sink.write_bytes(&v.to_be_bytes())?;
            } else if let Ok(v) = u32::try_from(len) {
                sink.write_u8(0xc9)?;
                sink.write_bytes(&v.to_be_bytes())?;
            } else {
                return Err(PackError::LengthOverflow {
                    format: "Extension",
                    len: len as u64,
                });
            }
        }
    }
    sink.write_u8(code as u8)
}

/// Read an extension header, returning `(type_code, payload_len)`.
pub fn read_ext_header<R: Source>(src: &mut R) -> Result<(i8, usize), UnpackError> {
    let b = src.read_u8()?;
    let len = match b {
        0xd4 => 1,
        0xd5 => 2,
        0xd6 => 4,
        0xd7 => 8,
        0xd8 => 16,
        0xc7 => read_be::<1, R>(src)?[0] as usize,
        0xc8 => u16::from_be_bytes(read_be::<2, R>(src)?) as usize,
        0xc9 => u32::from_be_bytes(read_be::<4, R>(src)?) as usize,
        _ => return Err(UnpackError::BadPrefix { format: "Extension", byte: b }),
    };
    let code = src.read_u8()? as i8;
    Ok((code, len))
}

// ---------------------------------------------------------------------
// internal
// ---------------------------------------------------------------------

fn read_be<const N: usize, R: Source>(src: &mut R) -> Result<[u8; N], UnpackError> {
    let mut buf = [0u8; N];
    src.read_exact(&mut buf)?;
    Ok(buf)
}
