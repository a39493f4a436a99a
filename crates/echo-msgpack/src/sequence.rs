// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Vector`/`DynamicVector` (`spec.md` §4.3.2, component C3): array-header +
//! N packed values, with positional (`Vector`) or state-threaded
//! (`DynamicVector`) per-element format resolution.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{Formatted, Vector};
use crate::generator::Generator;
use crate::io::{Sink, Source};
use crate::wire;

impl<T, C> Formatted<C> for Vec<T>
where
    C: Context,
    T: Formatted<C>,
{
    type Format = Vector;
}

impl<T, C> Pack<Vector, C> for Vec<T>
where
    C: Context,
    T: Formatted<C> + Pack<T::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_array_header(sink, self.len())?;
        for item in self {
            item.pack(sink, ctx)?;
        }
        Ok(())
    }
}

impl<T, C> Unpack<Vector, C> for Vec<T>
where
    C: Context,
    T: Formatted<C> + Unpack<T::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_array_header(src)?;
        let mut gen = Generator::new(src, len);
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            out.push(gen.next::<T, T::Format, C>(ctx)?);
        }
        Ok(out)
    }
}

impl<T, C, const N: usize> Formatted<C> for [T; N]
where
    C: Context,
    T: Formatted<C>,
{
    type Format = Vector;
}

impl<T, C, const N: usize> Pack<Vector, C> for [T; N]
where
    C: Context,
    T: Formatted<C> + Pack<T::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_array_header(sink, N)?;
        for item in self {
            item.pack(sink, ctx)?;
        }
        Ok(())
    }
}

impl<T, C, const N: usize> Unpack<Vector, C> for [T; N]
where
    C: Context,
    T: Formatted<C> + Unpack<T::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_array_header(src)?;
        if len != N {
            return Err(UnpackError::LengthMismatch {
                format: "Vector",
                expected: N,
                found: len,
            });
        }
        let mut gen = Generator::new(src, len);
        let mut out: Vec<T> = Vec::with_capacity(N);
        for _ in 0..N {
            out.push(gen.next::<T, T::Format, C>(ctx)?);
        }
        match out.try_into() {
            Ok(array) => Ok(array),
            Err(_) => unreachable!("length checked above"),
        }
    }
}

// ---------------------------------------------------------------------
// Heterogeneous tuples — each position has its own static type/format,
// which is exactly what `valueformat(T, i, F, ctx)` resolves to for a
// fixed-arity product type (`spec.md` §4.2).
// ---------------------------------------------------------------------

macro_rules! tuple_vector {
    ($len:literal; $($idx:tt => $name:ident),+) => {
        impl<C, $($name),+> Formatted<C> for ($($name,)+)
        where
            C: Context,
            $($name: Formatted<C>),+
        {
            type Format = Vector;
        }

        impl<C, $($name),+> Pack<Vector, C> for ($($name,)+)
        where
            C: Context,
            $($name: Formatted<C> + Pack<$name::Format, C>),+
        {
            fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
                wire::write_array_header(sink, $len)?;
                $(self.$idx.pack(sink, ctx)?;)+
                Ok(())
            }
        }

        impl<C, $($name),+> Unpack<Vector, C> for ($($name,)+)
        where
            C: Context,
            $($name: Formatted<C> + Unpack<$name::Format, C>),+
        {
            fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
                let len = wire::read_array_header(src)?;
                if len != $len {
                    return Err(UnpackError::LengthMismatch {
                        format: "Vector",
                        expected: $len,
                        found: len,
                    });
                }
                let mut gen = Generator::new(src, len);
                Ok((
                    $(gen.next::<$name, $name::Format, C>(ctx)?,)+
                ))
            }
        }
    };
}

tuple_vector!(1; 0 => A);
tuple_vector!(2; 0 => A, 1 => B);
tuple_vector!(3; 0 => A, 1 => B, 2 => C2);
tuple_vector!(4; 0 => A, 1 => B, 2 => C2, 3 => D);
tuple_vector!(5; 0 => A, 1 => B, 2 => C2, 3 => D, 4 => E);
tuple_vector!(6; 0 => A, 1 => B, 2 => C2, 3 => D, 4 => E, 5 => F);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{pack, unpack};
    use crate::context::DefaultContext;

    #[test]
    fn vec_roundtrip() {
        let v = vec![1i32, 2, 3];
        let bytes = pack(&v, DefaultContext).unwrap();
        assert_eq!(bytes[0], 0x93);
        let back: Vec<i32> = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn tuple_golden_bytes() {
        // Pack (5, "a", true) in Vector -> [0x93, 0x05, 0xa1, 0x61, 0xc3]
        let tup = (5i32, "a".to_string(), true);
        let bytes = pack(&tup, DefaultContext).unwrap();
        assert_eq!(bytes, [0x93, 0x05, 0xa1, 0x61, 0xc3]);
        let back: (i32, String, bool) = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, tup);
    }

    #[test]
    fn fixed_array_roundtrip() {
        let arr = [1u8, 2, 3, 4];
        let bytes = pack(&arr, DefaultContext).unwrap();
        let back: [u8; 4] = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, arr);
    }

    #[test]
    fn fixed_array_length_mismatch_errors() {
        let v = vec![1i32, 2, 3];
        let bytes = pack(&v, DefaultContext).unwrap();
        let err = unpack::<[i32; 4], DefaultContext>(&bytes, DefaultContext).unwrap_err();
        assert!(matches!(err, UnpackError::LengthMismatch { .. }));
    }
}
