// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shape-preserving array formats (`spec.md` §4.3.5/§4.3.6, component C3):
//! `ArrayShape`/`BinArray` pack a multi-dimensional value as a two-field map
//! `{"size", "data"}`; `BinVector` is the thin flat-binary adapter used by
//! `BinArray`'s `"data"` entry and reusable standalone.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{ArrayShape, BinArray, BinVector, Formatted};
use crate::io::{Sink, Source};
use crate::wire;

const FIELD_SIZE: &str = "size";
const FIELD_DATA: &str = "data";

/// `(size, data)` — a flattened multi-dimensional value plus the shape
/// needed to reconstruct it (`spec.md` §3 `ArrayValue`/`BinArrayValue`).
/// `size` is in row-major (outermost-first) order; `data` is `size`'s
/// product elements, flattened in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue<T> {
    /// Extent of each dimension, outermost first.
    pub size: Vec<usize>,
    /// Flattened elements in row-major order.
    pub data: Vec<T>,
}

impl<T> ArrayValue<T> {
    /// Build a shaped array, checking that `data.len()` matches the product
    /// of `size`.
    pub fn new(size: Vec<usize>, data: Vec<T>) -> Result<Self, PackError> {
        let expected: usize = size.iter().product();
        if expected != data.len() {
            return Err(PackError::MalformedExtension {
                code: 0,
                reason: format!(
                    "shape {size:?} (product {expected}) disagrees with {} data elements",
                    data.len()
                ),
            });
        }
        Ok(Self { size, data })
    }
}

fn check_shape(size: &[usize], len: usize, format: &'static str) -> Result<(), UnpackError> {
    let expected: usize = size.iter().product();
    if expected != len {
        return Err(UnpackError::LengthMismatch {
            format,
            expected,
            found: len,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------
// ArrayShape — "data" packed as Vector
// ---------------------------------------------------------------------

impl<T, C> Formatted<C> for ArrayValue<T>
where
    C: Context,
    T: Formatted<C>,
{
    type Format = ArrayShape;
}

impl<T, C> Pack<ArrayShape, C> for ArrayValue<T>
where
    C: Context,
    T: Formatted<C> + Pack<T::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_map_header(sink, 2)?;
        wire::write_str(sink, FIELD_SIZE)?;
        wire::write_array_header(sink, self.size.len())?;
        for dim in &self.size {
            wire::write_unsigned(sink, *dim as u64)?;
        }
        wire::write_str(sink, FIELD_DATA)?;
        wire::write_array_header(sink, self.data.len())?;
        for item in &self.data {
            item.pack(sink, ctx)?;
        }
        Ok(())
    }
}

impl<T, C> Unpack<ArrayShape, C> for ArrayValue<T>
where
    C: Context,
    T: Formatted<C> + Unpack<T::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let (size, data_len) = read_size_and_data_header(src, "ArrayShape")?;
        let mut data = Vec::with_capacity(data_len);
        for _ in 0..data_len {
            data.push(T::unpack(src, ctx)?);
        }
        check_shape(&size, data.len(), "ArrayShape")?;
        Ok(ArrayValue { size, data })
    }
}

/// Reads `{"size": [...], "data": <array header>}` up to (not including)
/// `data`'s elements, returning the decoded shape and the declared element
/// count.
fn read_size_and_data_header<R: Source>(
    src: &mut R,
    format: &'static str,
) -> Result<(Vec<usize>, usize), UnpackError> {
    let len = wire::read_map_header(src)?;
    if len != 2 {
        return Err(UnpackError::LengthMismatch {
            format,
            expected: 2,
            found: len,
        });
    }
    let mut size = None;
    let mut data_len = None;
    for _ in 0..2 {
        let key = wire::read_str(src)?;
        match key.as_str() {
            FIELD_SIZE => {
                let n = wire::read_array_header(src)?;
                let mut dims = Vec::with_capacity(n);
                for _ in 0..n {
                    dims.push(wire::read_unsigned(src)? as usize);
                }
                size = Some(dims);
            }
            FIELD_DATA if size.is_some() => {
                // shape-first ordering lets us validate ArrayShape's element
                // count without buffering; BinArray reads the bin header
                // directly instead of an array header.
                data_len = Some(wire::read_array_header(src)?);
            }
            FIELD_DATA => {
                return Err(UnpackError::MissingKey {
                    type_name: format,
                    key: "size",
                })
            }
            other => {
                return Err(UnpackError::UnexpectedKey {
                    type_name: format,
                    key: other.to_string(),
                })
            }
        }
    }
    Ok((
        size.ok_or(UnpackError::MissingKey {
            type_name: format,
            key: "size",
        })?,
        data_len.ok_or(UnpackError::MissingKey {
            type_name: format,
            key: "data",
        })?,
    ))
}

// ---------------------------------------------------------------------
// BinVector — a flat sequence of fixed-size primitives as one Binary blob
// ---------------------------------------------------------------------

/// Bit-cast conversion to/from a flat byte buffer, used both standalone
/// (`BinVector`) and as `BinArray`'s `"data"` entry. Elements are
/// big-endian, consistent with every other multi-byte atom this engine
/// writes (`spec.md` §9 "BitArray storage" open question — byte-per-element
/// chosen here, not packed bits).
pub trait BinVectorFormat<C: Context = crate::context::DefaultContext>: Sized {
    /// Flatten to bytes.
    fn to_flat_bytes(&self, ctx: C) -> Vec<u8>;
    /// Reconstruct from bytes previously produced by [`Self::to_flat_bytes`].
    fn from_flat_bytes(bytes: &[u8], ctx: C) -> Result<Self, UnpackError>;
}

macro_rules! bin_vector_primitive {
    ($ty:ty, $size:literal, $to_be:ident, $from_be:ident) => {
        impl<C: Context> BinVectorFormat<C> for Vec<$ty> {
            fn to_flat_bytes(&self, _ctx: C) -> Vec<u8> {
                let mut out = Vec::with_capacity(self.len() * $size);
                for v in self {
                    out.extend_from_slice(&v.$to_be());
                }
                out
            }

            fn from_flat_bytes(bytes: &[u8], _ctx: C) -> Result<Self, UnpackError> {
                if bytes.len() % $size != 0 {
                    return Err(UnpackError::LengthMismatch {
                        format: "BinVector",
                        expected: (bytes.len() / $size) * $size,
                        found: bytes.len(),
                    });
                }
                Ok(bytes
                    .chunks_exact($size)
                    .map(|c| {
                        let mut buf = [0u8; $size];
                        buf.copy_from_slice(c);
                        <$ty>::$from_be(buf)
                    })
                    .collect())
            }
        }
    };
}

bin_vector_primitive!(f64, 8, to_be_bytes, from_be_bytes);
bin_vector_primitive!(f32, 4, to_be_bytes, from_be_bytes);
bin_vector_primitive!(i32, 4, to_be_bytes, from_be_bytes);
bin_vector_primitive!(i64, 8, to_be_bytes, from_be_bytes);
bin_vector_primitive!(u32, 4, to_be_bytes, from_be_bytes);
bin_vector_primitive!(u64, 8, to_be_bytes, from_be_bytes);

impl<T, C> Pack<BinVector, C> for T
where
    C: Context,
    T: BinVectorFormat<C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_bin(sink, &self.to_flat_bytes(ctx))
    }
}

impl<T, C> Unpack<BinVector, C> for T
where
    C: Context,
    T: BinVectorFormat<C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let bytes = wire::read_bin(src)?;
        T::from_flat_bytes(&bytes, ctx)
    }
}

// ---------------------------------------------------------------------
// BinArray — like ArrayShape, but "data" is a single Binary blob
// ---------------------------------------------------------------------

// `ArrayValue<T>`'s single `Formatted` default remains `ArrayShape` (above);
// `BinArray` is reached explicitly via `pack_as::<BinArray, _, _>` /
// `unpack_as::<BinArray, _, _>` for element types that support the flat-byte
// cast, exactly as `Default`-format indirection elsewhere in this crate is
// the only way to have two valid encodings for one type (`spec.md` §4.3.11).

impl<T, C> Pack<BinArray, C> for ArrayValue<T>
where
    C: Context,
    Vec<T>: BinVectorFormat<C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_map_header(sink, 2)?;
        wire::write_str(sink, FIELD_SIZE)?;
        wire::write_array_header(sink, self.size.len())?;
        for dim in &self.size {
            wire::write_unsigned(sink, *dim as u64)?;
        }
        wire::write_str(sink, FIELD_DATA)?;
        wire::write_bin(sink, &self.data.to_flat_bytes(ctx))
    }
}

impl<T, C> Unpack<BinArray, C> for ArrayValue<T>
where
    C: Context,
    Vec<T>: BinVectorFormat<C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(src)?;
        if len != 2 {
            return Err(UnpackError::LengthMismatch {
                format: "BinArray",
                expected: 2,
                found: len,
            });
        }
        let mut size = None;
        let mut data = None;
        for _ in 0..2 {
            let key = wire::read_str(src)?;
            match key.as_str() {
                FIELD_SIZE => {
                    let n = wire::read_array_header(src)?;
                    let mut dims = Vec::with_capacity(n);
                    for _ in 0..n {
                        dims.push(wire::read_unsigned(src)? as usize);
                    }
                    size = Some(dims);
                }
                FIELD_DATA => {
                    let bytes = wire::read_bin(src)?;
                    data = Some(Vec::<T>::from_flat_bytes(&bytes, ctx)?);
                }
                other => {
                    return Err(UnpackError::UnexpectedKey {
                        type_name: "BinArray",
                        key: other.to_string(),
                    })
                }
            }
        }
        let size = size.ok_or(UnpackError::MissingKey {
            type_name: "BinArray",
            key: "size",
        })?;
        let data = data.ok_or(UnpackError::MissingKey {
            type_name: "BinArray",
            key: "data",
        })?;
        check_shape(&size, data.len(), "BinArray")?;
        Ok(ArrayValue { size, data })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{pack_as, unpack_as};
    use crate::context::DefaultContext;

    #[test]
    fn array_shape_roundtrip() {
        let av = ArrayValue::new(vec![2, 3], vec![1i32, 2, 3, 4, 5, 6]).unwrap();
        let bytes = pack_as::<ArrayShape, _, _>(&av, DefaultContext).unwrap();
        let back: ArrayValue<i32> = unpack_as::<ArrayShape, _, _>(&bytes, DefaultContext).unwrap();
        assert_eq!(back, av);
    }

    #[test]
    fn bin_array_5x5_f64() {
        let data: Vec<f64> = (0..25).map(f64::from).collect();
        let av = ArrayValue::new(vec![5, 5], data).unwrap();
        let bytes = pack_as::<BinArray, _, _>(&av, DefaultContext).unwrap();
        // fixmap(2) "size" fixarray(2) 5 5 "data" bin8(200 bytes)
        assert_eq!(bytes[0], 0x82);
        let back: ArrayValue<f64> = unpack_as::<BinArray, _, _>(&bytes, DefaultContext).unwrap();
        assert_eq!(back, av);
    }

    #[test]
    fn bin_vector_f32_roundtrip() {
        let v = vec![1.0f32, 2.5, -3.25];
        let bytes = pack_as::<BinVector, _, _>(&v, DefaultContext).unwrap();
        let back: Vec<f32> = unpack_as::<BinVector, _, _>(&bytes, DefaultContext).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn shape_mismatch_rejected() {
        let err = ArrayValue::new(vec![2, 2], vec![1i32, 2, 3]).unwrap_err();
        assert!(matches!(err, PackError::MalformedExtension { .. }));
    }
}
