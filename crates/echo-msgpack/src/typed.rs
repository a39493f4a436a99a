// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Typed<F>` (`spec.md` §4.3.8, component C3): packs `(type, value)` as a
//! two-entry map, enabling decode without prior knowledge of the concrete
//! type. Reconstruction is whitelist-gated (`Context::allow_reconstruct`,
//! checked *before* any constructor invocation) and recursion-guarded
//! (`spec.md` invariant 4: `Typed<Default>` is forbidden when a type's own
//! default format is itself `Typed`).

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{FormatTag, Formatted, Typed};
use crate::io::{Sink, Source};
use crate::typedesc::{check_type_param_formats, resolve_type_params, Described, TypeDescriptor};
use crate::wire;

const FIELD_TYPE: &str = "type";
const FIELD_VALUE: &str = "value";

/// `(type: TypeDescriptor, value: Opaque)` — the self-describing pair
/// `Typed<F>` materializes on pack, specialized to a statically-known
/// wrapped type `T` (`spec.md` §3 `TypedValue`). The decoded descriptor is
/// checked for exact identity against `T::descriptor()`, not the looser
/// subtype relation [`TypedFamily`] supports — use `TypedFamily` when the
/// expected type is a supertype of several concrete members.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue<T> {
    /// The concrete type's descriptor, as decoded from the wire.
    pub type_desc: TypeDescriptor,
    /// The wrapped value.
    pub value: T,
}

/// A closed family of concrete types reachable through a shared expected
/// (super)type under `Typed<F>` decode (`spec.md` §4.3.8's "assert `S <:
/// T`" subtype check, realized without open class hierarchies or
/// reflection). A caller unpacking `Typed<F>` as `Self` gets back whichever
/// concrete member the wire's type descriptor names; an unrelated
/// descriptor is a [`UnpackError::TypeMismatch`].
pub trait TypedFamily<C: Context = crate::context::DefaultContext>: Sized {
    /// This family's name, used as `expected` in [`UnpackError::TypeMismatch`].
    const FAMILY_NAME: &'static str;

    /// Decode the `value` entry as the concrete type named by `desc`,
    /// having already confirmed `desc` is whitelisted by `ctx`.
    fn reconstruct<R: Source>(
        desc: &TypeDescriptor,
        src: &mut R,
        ctx: C,
    ) -> Result<Self, UnpackError>;
}

/// Pack `value` as `{"type": <descriptor>, "value": <value>}`. `F` being
/// `Default` is rejected (`spec.md` invariant 4): `Typed` always needs a
/// concrete inner format to know how to write `value`.
pub fn pack_typed<T, F, S, C>(value: &T, sink: &mut S, ctx: C) -> Result<(), PackError>
where
    T: Described + Pack<F, C>,
    F: FormatTag,
    S: Sink,
    C: Context,
{
    if F::IS_DEFAULT {
        return Err(PackError::RecursiveTyped {
            type_name: core::any::type_name::<T>(),
        });
    }
    check_type_param_formats::<T>()?;
    wire::write_map_header(sink, 2)?;
    wire::write_str(sink, FIELD_TYPE)?;
    T::descriptor().pack(sink, ctx)?;
    wire::write_str(sink, FIELD_VALUE)?;
    value.pack(sink, ctx)
}

fn read_type_entry<R: Source, C: Context>(
    src: &mut R,
    ctx: C,
) -> Result<TypeDescriptor, UnpackError> {
    let len = wire::read_map_header(src)?;
    if len != 2 {
        return Err(UnpackError::LengthMismatch {
            format: "Typed",
            expected: 2,
            found: len,
        });
    }
    let key = wire::read_str(src)?;
    if key != FIELD_TYPE {
        return Err(UnpackError::MissingKey {
            type_name: "Typed",
            key: "type",
        });
    }
    TypeDescriptor::unpack(src, ctx)
}

fn expect_value_key<R: Source>(src: &mut R) -> Result<(), UnpackError> {
    let key = wire::read_str(src)?;
    if key != FIELD_VALUE {
        return Err(UnpackError::MissingKey {
            type_name: "Typed",
            key: "value",
        });
    }
    Ok(())
}

/// Unpack a `Typed<F>` value as a member of family `T`.
pub fn unpack_typed<T, R, C>(src: &mut R, ctx: C) -> Result<T, UnpackError>
where
    T: TypedFamily<C>,
    R: Source,
    C: Context,
{
    let desc = read_type_entry(src, ctx)?;
    expect_value_key(src)?;
    if !C::allow_reconstruct(&desc) {
        return Err(UnpackError::WhitelistRejected {
            type_name: desc.qualified_name(),
        });
    }
    T::reconstruct(&desc, src, ctx)
}

fn path_matches(path: &[String], expected: &'static [&'static str]) -> bool {
    path.len() == expected.len() && path.iter().zip(expected).all(|(a, b)| a == b)
}

impl<T, C> Formatted<C> for TypedValue<T>
where
    C: Context,
    T: Described + Formatted<C>,
{
    type Format = Typed<T::Format>;
}

impl<T, C> Pack<Typed<T::Format>, C> for TypedValue<T>
where
    C: Context,
    T: Described + Formatted<C> + Pack<T::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        pack_typed::<T, T::Format, S, C>(&self.value, sink, ctx)
    }
}

impl<T, C> Unpack<Typed<T::Format>, C> for TypedValue<T>
where
    C: Context,
    T: Described + Formatted<C> + Unpack<T::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        if <T::Format as FormatTag>::IS_DEFAULT {
            return Err(UnpackError::RecursiveTyped {
                type_name: core::any::type_name::<T>().to_string(),
            });
        }
        let desc = read_type_entry(src, ctx)?;
        expect_value_key(src)?;
        if desc.name != T::TYPE_NAME || !path_matches(&desc.path, T::TYPE_PATH) {
            return Err(UnpackError::TypeMismatch {
                expected: T::TYPE_NAME,
                found: desc.qualified_name(),
            });
        }
        resolve_type_params::<T>(&desc)?;
        if !C::allow_reconstruct(&desc) {
            return Err(UnpackError::WhitelistRejected {
                type_name: desc.qualified_name(),
            });
        }
        let value = T::unpack(src, ctx)?;
        Ok(TypedValue {
            type_desc: desc,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DefaultContext;
    use crate::format::{Signed, StructFmt};
    use crate::struct_::{StructBuilder, StructFormat};

    #[derive(Debug, Clone, PartialEq)]
    enum Vehicle {
        Boat(Boat),
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Boat {
        a: i32,
    }

    impl Described for Boat {
        const TYPE_NAME: &'static str = "Boat";
        const TYPE_PATH: &'static [&'static str] = &["vehicles"];
    }

    impl StructFormat<DefaultContext> for Boat {
        const TYPE_NAME: &'static str = "Boat";
        const FIELD_NAMES: &'static [&'static str] = &["a"];
        type Builder = BoatBuilder;

        fn pack_field<S: Sink>(
            &self,
            index: usize,
            sink: &mut S,
            ctx: DefaultContext,
        ) -> Result<(), PackError> {
            match index {
                0 => Pack::<Signed, _>::pack(&self.a, sink, ctx),
                _ => unreachable!(),
            }
        }
    }

    #[derive(Default)]
    struct BoatBuilder {
        a: Option<i32>,
    }

    impl StructBuilder<Boat, DefaultContext> for BoatBuilder {
        fn read_field<R: Source>(
            &mut self,
            index: usize,
            src: &mut R,
            ctx: DefaultContext,
        ) -> Result<(), UnpackError> {
            match index {
                0 => {
                    self.a = Some(Unpack::<Signed, _>::unpack(src, ctx)?);
                    Ok(())
                }
                _ => unreachable!(),
            }
        }

        fn finish(self, _ctx: DefaultContext) -> Result<Boat, UnpackError> {
            Ok(Boat { a: self.a.unwrap() })
        }
    }

    impl TypedFamily<DefaultContext> for Vehicle {
        const FAMILY_NAME: &'static str = "Vehicle";

        fn reconstruct<R: Source>(
            desc: &TypeDescriptor,
            src: &mut R,
            ctx: DefaultContext,
        ) -> Result<Self, UnpackError> {
            match desc.name.as_str() {
                "Boat" => Ok(Vehicle::Boat(
                    <Boat as Unpack<StructFmt, DefaultContext>>::unpack(src, ctx)?,
                )),
                other => Err(UnpackError::TypeMismatch {
                    expected: Self::FAMILY_NAME,
                    found: other.to_string(),
                }),
            }
        }
    }

    #[test]
    fn typed_struct_roundtrip_and_subtype_check() {
        let boat = Boat { a: 42 };
        let mut sink = crate::io::VecSink::new();
        pack_typed::<Boat, StructFmt, _, DefaultContext>(&boat, &mut sink, DefaultContext)
            .unwrap();
        let bytes = sink.into_vec();

        let decoded: Vehicle = unpack_typed::<Vehicle, _, DefaultContext>(
            &mut crate::io::SliceSource::new(&bytes),
            DefaultContext,
        )
        .unwrap();
        assert_eq!(decoded, Vehicle::Boat(boat));
    }

    #[test]
    fn typed_rejects_unrelated_type() {
        #[derive(Debug, Clone, PartialEq)]
        struct Cat;
        impl Described for Cat {
            const TYPE_NAME: &'static str = "Cat";
            const TYPE_PATH: &'static [&'static str] = &["animals"];
        }
        impl<C: Context> Formatted<C> for Cat {
            type Format = crate::format::Nil;
        }
        impl<C: Context> Pack<crate::format::Nil, C> for Cat {
            fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
                wire::write_nil(sink)
            }
        }

        let mut sink = crate::io::VecSink::new();
        pack_typed::<Cat, crate::format::Nil, _, DefaultContext>(&Cat, &mut sink, DefaultContext)
            .unwrap();
        let bytes = sink.into_vec();

        let err = unpack_typed::<Vehicle, _, DefaultContext>(
            &mut crate::io::SliceSource::new(&bytes),
            DefaultContext,
        )
        .unwrap_err();
        assert!(matches!(err, UnpackError::TypeMismatch { .. }));
    }

    #[test]
    fn typed_value_rejects_mismatched_concrete_type() {
        #[derive(Debug, Clone, PartialEq)]
        struct Other {
            a: i32,
        }
        impl Described for Other {
            const TYPE_NAME: &'static str = "Other";
            const TYPE_PATH: &'static [&'static str] = &["vehicles"];
        }
        impl StructFormat<DefaultContext> for Other {
            const TYPE_NAME: &'static str = "Other";
            const FIELD_NAMES: &'static [&'static str] = &["a"];
            type Builder = OtherBuilder;
            fn pack_field<S: Sink>(
                &self,
                _index: usize,
                sink: &mut S,
                ctx: DefaultContext,
            ) -> Result<(), PackError> {
                Pack::<Signed, _>::pack(&self.a, sink, ctx)
            }
        }
        #[derive(Default)]
        struct OtherBuilder {
            a: Option<i32>,
        }
        impl StructBuilder<Other, DefaultContext> for OtherBuilder {
            fn read_field<R: Source>(
                &mut self,
                _index: usize,
                src: &mut R,
                ctx: DefaultContext,
            ) -> Result<(), UnpackError> {
                self.a = Some(Unpack::<Signed, _>::unpack(src, ctx)?);
                Ok(())
            }
            fn finish(self, _ctx: DefaultContext) -> Result<Other, UnpackError> {
                Ok(Other { a: self.a.unwrap() })
            }
        }

        let mut sink = crate::io::VecSink::new();
        pack_typed::<Boat, StructFmt, _, DefaultContext>(
            &Boat { a: 1 },
            &mut sink,
            DefaultContext,
        )
        .unwrap();
        let bytes = sink.into_vec();

        let err = crate::construct::unpack_as::<Typed<StructFmt>, TypedValue<Other>, _>(
            &bytes,
            DefaultContext,
        )
        .unwrap_err();
        assert!(matches!(err, UnpackError::TypeMismatch { .. }));
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Wrapper(i32);

    impl Described for Wrapper {
        const TYPE_NAME: &'static str = "Wrapper";
        const TYPE_PATH: &'static [&'static str] = &["generics"];

        fn type_params() -> Vec<crate::typedesc::TypeParam> {
            vec![crate::typedesc::TypeParam::Type(TypeDescriptor::new(
                "Boat",
                ["vehicles"],
            ))]
        }

        fn typeparamformats() -> Vec<Option<&'static str>> {
            vec![Some("Signed")]
        }
    }

    impl<C: Context> Formatted<C> for Wrapper {
        type Format = Signed;
    }

    impl<C: Context> Pack<Signed, C> for Wrapper {
        fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
            Pack::<Signed, _>::pack(&self.0, sink, ctx)
        }
    }

    impl<C: Context> Unpack<Signed, C> for Wrapper {
        fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
            Ok(Wrapper(Unpack::<Signed, _>::unpack(src, ctx)?))
        }
    }

    #[test]
    fn typed_value_rejects_unregistered_typeparamtypes_on_unpack() {
        let mut sink = crate::io::VecSink::new();
        pack_typed::<Wrapper, Signed, _, DefaultContext>(&Wrapper(9), &mut sink, DefaultContext)
            .unwrap();
        let bytes = sink.into_vec();

        let err = crate::construct::unpack_as::<Typed<Signed>, TypedValue<Wrapper>, _>(
            &bytes,
            DefaultContext,
        )
        .unwrap_err();
        assert!(matches!(err, UnpackError::MissingTypeParamTypes { .. }));
    }

    #[test]
    fn pack_typed_rejects_unregistered_typeparamformats() {
        struct NoFormats;
        impl Described for NoFormats {
            const TYPE_NAME: &'static str = "NoFormats";
            const TYPE_PATH: &'static [&'static str] = &["generics"];

            fn type_params() -> Vec<crate::typedesc::TypeParam> {
                vec![crate::typedesc::TypeParam::Type(TypeDescriptor::new(
                    "Boat",
                    ["vehicles"],
                ))]
            }
        }
        impl<C: Context> Formatted<C> for NoFormats {
            type Format = Signed;
        }
        impl<C: Context> Pack<Signed, C> for NoFormats {
            fn pack<S: Sink>(&self, _sink: &mut S, _ctx: C) -> Result<(), PackError> {
                Ok(())
            }
        }

        let mut sink = crate::io::VecSink::new();
        let err =
            pack_typed::<NoFormats, Signed, _, DefaultContext>(&NoFormats, &mut sink, DefaultContext)
                .unwrap_err();
        assert!(matches!(err, PackError::MissingTypeParamFormats { .. }));
    }
}
