// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `skip`/`step` (`spec.md` §4.7, component C7): advance past one value on
//! the wire without decoding it to any Rust type. Used by `FlexibleStruct`
//! to discard unknown keys, and exposed publicly for callers that only need
//! to navigate a byte stream (e.g. an index scanning past a payload it
//! doesn't understand).

use crate::error::UnpackError;
use crate::io::Source;
use crate::wire::{self, WireKind};

/// Advance `src` past one complete value, recursing into containers.
/// Equivalent to decoding and discarding, but never allocates the
/// intermediate value.
pub fn skip<R: Source>(src: &mut R) -> Result<(), UnpackError> {
    match wire::peek_format(src)? {
        WireKind::Nil => wire::read_nil(src),
        WireKind::Bool => wire::read_bool(src).map(|_| ()),
        WireKind::Int => wire::read_signed(src).map(|_| ()),
        WireKind::Float => wire::read_float(src).map(|_| ()),
        WireKind::Str => wire::read_str(src).map(|_| ()),
        WireKind::Bin => wire::read_bin(src).map(|_| ()),
        WireKind::Array => {
            let len = wire::read_array_header(src)?;
            for _ in 0..len {
                skip(src)?;
            }
            Ok(())
        }
        WireKind::Map => {
            let len = wire::read_map_header(src)?;
            for _ in 0..len {
                skip(src)?;
                skip(src)?;
            }
            Ok(())
        }
        WireKind::Ext => {
            let (_code, len) = wire::read_ext_header(src)?;
            src.skip_bytes(len)
        }
    }
}

/// Report the next value's core format, entering (but not traversing)
/// array/map containers. For `Array`/`Map`, only the header is consumed —
/// the cursor is left at the first element, ready for sibling-by-sibling
/// traversal via further `step` calls. Every other kind is skipped in
/// full, same as [`skip`] (`step`, `spec.md` §4.7/§6.2).
pub fn step<R: Source>(src: &mut R) -> Result<WireKind, UnpackError> {
    let kind = wire::peek_format(src)?;
    match kind {
        WireKind::Array => {
            wire::read_array_header(src)?;
        }
        WireKind::Map => {
            wire::read_map_header(src)?;
        }
        _ => skip(src)?,
    }
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{SliceSource, VecSink};

    #[test]
    fn skip_scalar() {
        let mut buf = VecSink::new();
        wire::write_signed(&mut buf, 42).unwrap();
        wire::write_bool(&mut buf, true).unwrap();
        let bytes = buf.into_vec();
        let mut src = SliceSource::new(&bytes);
        skip(&mut src).unwrap();
        assert!(wire::read_bool(&mut src).unwrap());
    }

    #[test]
    fn skip_nested_container() {
        let mut buf = VecSink::new();
        wire::write_array_header(&mut buf, 2).unwrap();
        wire::write_map_header(&mut buf, 1).unwrap();
        wire::write_str(&mut buf, "k").unwrap();
        wire::write_signed(&mut buf, 1).unwrap();
        wire::write_signed(&mut buf, 99).unwrap();
        wire::write_signed(&mut buf, 7).unwrap();
        let bytes = buf.into_vec();
        let mut src = SliceSource::new(&bytes);
        skip(&mut src).unwrap();
        assert_eq!(wire::read_signed(&mut src).unwrap(), 7);
    }

    #[test]
    fn step_reports_kind_and_advances() {
        let mut buf = VecSink::new();
        wire::write_str(&mut buf, "hi").unwrap();
        wire::write_signed(&mut buf, 3).unwrap();
        let bytes = buf.into_vec();
        let mut src = SliceSource::new(&bytes);
        assert_eq!(step(&mut src).unwrap(), WireKind::Str);
        assert_eq!(wire::read_signed(&mut src).unwrap(), 3);
    }

    #[test]
    fn step_on_array_enters_header_only() {
        let mut buf = VecSink::new();
        wire::write_array_header(&mut buf, 2).unwrap();
        wire::write_signed(&mut buf, 1).unwrap();
        wire::write_signed(&mut buf, 2).unwrap();
        let bytes = buf.into_vec();
        let mut src = SliceSource::new(&bytes);
        assert_eq!(step(&mut src).unwrap(), WireKind::Array);
        // cursor sits at the first element, not past the whole array
        assert_eq!(wire::read_signed(&mut src).unwrap(), 1);
        assert_eq!(wire::read_signed(&mut src).unwrap(), 2);
    }

    #[test]
    fn step_on_map_enters_header_only() {
        let mut buf = VecSink::new();
        wire::write_map_header(&mut buf, 1).unwrap();
        wire::write_str(&mut buf, "k").unwrap();
        wire::write_signed(&mut buf, 1).unwrap();
        wire::write_signed(&mut buf, 42).unwrap();
        let bytes = buf.into_vec();
        let mut src = SliceSource::new(&bytes);
        assert_eq!(step(&mut src).unwrap(), WireKind::Map);
        // cursor sits at the first key, not past the whole map
        assert_eq!(wire::read_str(&mut src).unwrap(), "k");
        assert_eq!(wire::read_signed(&mut src).unwrap(), 1);
        assert_eq!(wire::read_signed(&mut src).unwrap(), 42);
    }
}
