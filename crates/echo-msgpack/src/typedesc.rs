// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Type descriptors (`spec.md` §3/§4.3.7, part of component C3): the
//! serializable representation of a concrete type that `TypeFmt` packs, and
//! the `Described` hook a type implements to produce one.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{Formatted, TypeFmt};
use crate::io::{Sink, Source};
use crate::wire;

/// The namespace prefix recognized as this engine's own catalog
/// (`spec.md` §4.3.7's "well-known prefix ... recognized specially").
/// A nested parameter descriptor rooted here names one of this crate's own
/// types (e.g. a `TypeDescriptor` appearing as a parameter of itself) and
/// needs no `typeparamtypes` binding to resolve.
pub const ENGINE_NAMESPACE: &str = "echo_msgpack";

/// A type parameter value: either a nested type descriptor, or a primitive
/// constant (`spec.md` §3 `TypeDescriptor.params`).
#[derive(Debug, Clone, PartialEq)]
pub enum TypeParam {
    /// A parameter that is itself a type.
    Type(TypeDescriptor),
    /// A symbolic (identifier-like) constant.
    Symbol(String),
    /// An integer constant.
    Int(i64),
    /// A boolean constant.
    Bool(bool),
}

/// `(name, path, params)` — the serializable shape of a concrete type
/// (`spec.md` §3). `path` is the namespace chain, outermost first; `name` is
/// the final identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// The final identifier, e.g. `"Boat"`.
    pub name: String,
    /// The namespace chain, e.g. `["crate", "vehicles"]`.
    pub path: Vec<String>,
    /// Type parameter values, in declared order.
    pub params: Vec<TypeParam>,
}

impl TypeDescriptor {
    /// Construct a descriptor with no type parameters.
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            path: path.into_iter().map(Into::into).collect(),
            params: Vec::new(),
        }
    }

    /// The dotted namespace string used in `UnknownNamespace` error messages
    /// and namespace-registry lookups, e.g. `"crate::vehicles::Boat"`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            out.push_str(segment);
            out.push_str("::");
        }
        out.push_str(&self.name);
        out
    }
}

/// Produces the [`TypeDescriptor`] for `Self` (the source spec's implicit
/// "reduce a type to `TypeDescriptor(name, path, params)`", `spec.md`
/// §4.3.7). Required for any type packed under `Typed<F>` or reached
/// through `TypeFmt`.
pub trait Described {
    /// The type's final identifier.
    const TYPE_NAME: &'static str;
    /// The type's namespace chain, outermost-first.
    const TYPE_PATH: &'static [&'static str];

    /// Type parameter values. Empty for non-generic types.
    fn type_params() -> Vec<TypeParam> {
        Vec::new()
    }

    /// `typeparamtypes(T, ctx)`: the qualified name each `Type`-kind entry
    /// of [`Described::type_params`] is allowed to resolve to on unpack, by
    /// position (`spec.md` §4.3.7). `None` at an index means that slot has
    /// no registered binding; reconstructing a value with a `Type`
    /// parameter there fails with `UnpackError::MissingTypeParamTypes`.
    /// Non-generic types never consult this.
    fn typeparamtypes() -> Vec<Option<&'static str>> {
        Vec::new()
    }

    /// `typeparamformats(T, ctx)`: the format name each `Type`-kind entry
    /// of [`Described::type_params`] is packed under, by position. `None`
    /// at an index means that slot has no registered binding; packing a
    /// value with a `Type` parameter there fails with
    /// `PackError::MissingTypeParamFormats`.
    fn typeparamformats() -> Vec<Option<&'static str>> {
        Vec::new()
    }

    /// Build the full descriptor.
    fn descriptor() -> TypeDescriptor {
        TypeDescriptor {
            name: Self::TYPE_NAME.to_string(),
            path: Self::TYPE_PATH.iter().map(|s| (*s).to_string()).collect(),
            params: Self::type_params(),
        }
    }
}

/// Validate a decoded descriptor's `Type`-kind parameters against `T`'s
/// registered `typeparamtypes` bindings (`spec.md` §4.3.7 "Reconstruction").
/// Each `Type` parameter is resolved by position: a descriptor rooted at
/// [`ENGINE_NAMESPACE`] is trusted without a binding; otherwise the
/// registered name at that position must be present and must match the
/// decoded parameter's qualified name. Primitive parameters (`Symbol`/
/// `Int`/`Bool`) carry no nested type and are never checked.
///
/// # Errors
///
/// `MissingTypeParamTypes` if a `Type` parameter's slot has no registered
/// binding; `TypeMismatch` if the decoded parameter's name disagrees with
/// the registered one.
pub fn resolve_type_params<T: Described>(desc: &TypeDescriptor) -> Result<(), UnpackError> {
    let bindings = T::typeparamtypes();
    for (index, param) in desc.params.iter().enumerate() {
        let TypeParam::Type(inner) = param else {
            continue;
        };
        if inner.path.first().is_some_and(|seg| seg == ENGINE_NAMESPACE) {
            continue;
        }
        match bindings.get(index).and_then(|b| *b) {
            None => {
                return Err(UnpackError::MissingTypeParamTypes {
                    type_name: T::TYPE_NAME.to_string(),
                })
            }
            Some(expected) if inner.qualified_name() == expected => {}
            Some(expected) => {
                return Err(UnpackError::TypeMismatch {
                    expected,
                    found: inner.qualified_name(),
                })
            }
        }
    }
    Ok(())
}

/// Validate that `T` has registered `typeparamformats` bindings for every
/// `Type`-kind entry of its own [`Described::type_params`] before packing
/// it under `TypeFmt` (`spec.md` §4.3.7). Non-generic types (no `Type`
/// parameters) always succeed.
///
/// # Errors
///
/// `MissingTypeParamFormats` if a `Type` parameter's slot has no
/// registered binding.
pub fn check_type_param_formats<T: Described>() -> Result<(), PackError> {
    let bindings = T::typeparamformats();
    for (index, param) in T::type_params().iter().enumerate() {
        if !matches!(param, TypeParam::Type(_)) {
            continue;
        }
        if bindings.get(index).and_then(|b| *b).is_none() {
            return Err(PackError::MissingTypeParamFormats {
                type_name: T::TYPE_NAME,
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------
// Wire encoding: a 3-entry fixmap {"name", "path", "params"}
// ---------------------------------------------------------------------

const FIELD_NAME: &str = "name";
const FIELD_PATH: &str = "path";
const FIELD_PARAMS: &str = "params";

impl<C: Context> Formatted<C> for TypeDescriptor {
    type Format = TypeFmt;
}

impl<C: Context + Copy> Pack<TypeFmt, C> for TypeDescriptor {
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_map_header(sink, 3)?;
        wire::write_str(sink, FIELD_NAME)?;
        wire::write_str(sink, &self.name)?;
        wire::write_str(sink, FIELD_PATH)?;
        wire::write_array_header(sink, self.path.len())?;
        for segment in &self.path {
            wire::write_str(sink, segment)?;
        }
        wire::write_str(sink, FIELD_PARAMS)?;
        wire::write_array_header(sink, self.params.len())?;
        for param in &self.params {
            pack_param(param, sink, ctx)?;
        }
        Ok(())
    }
}

impl<C: Context + Copy> Unpack<TypeFmt, C> for TypeDescriptor {
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(src)?;
        if len != 3 {
            return Err(UnpackError::LengthMismatch {
                format: "TypeFmt",
                expected: 3,
                found: len,
            });
        }
        let mut name = None;
        let mut path = None;
        let mut params = None;
        for _ in 0..3 {
            let key = wire::read_str(src)?;
            match key.as_str() {
                FIELD_NAME => name = Some(wire::read_str(src)?),
                FIELD_PATH => {
                    let n = wire::read_array_header(src)?;
                    let mut segments = Vec::with_capacity(n);
                    for _ in 0..n {
                        segments.push(wire::read_str(src)?);
                    }
                    path = Some(segments);
                }
                FIELD_PARAMS => {
                    let n = wire::read_array_header(src)?;
                    let mut out = Vec::with_capacity(n);
                    for _ in 0..n {
                        out.push(unpack_param(src, ctx)?);
                    }
                    params = Some(out);
                }
                other => {
                    return Err(UnpackError::UnexpectedKey {
                        type_name: "TypeDescriptor",
                        key: other.to_string(),
                    })
                }
            }
        }
        Ok(TypeDescriptor {
            name: name.ok_or(UnpackError::MissingKey {
                type_name: "TypeDescriptor",
                key: "name",
            })?,
            path: path.ok_or(UnpackError::MissingKey {
                type_name: "TypeDescriptor",
                key: "path",
            })?,
            params: params.ok_or(UnpackError::MissingKey {
                type_name: "TypeDescriptor",
                key: "params",
            })?,
        })
    }
}

fn pack_param<S: Sink, C: Context + Copy>(
    param: &TypeParam,
    sink: &mut S,
    ctx: C,
) -> Result<(), PackError> {
    // Tagged as a two-entry fixmap {"kind", "value"} so the reader can
    // distinguish a nested TypeDescriptor from a primitive constant without
    // guessing from shape alone.
    match param {
        TypeParam::Type(desc) => {
            wire::write_map_header(sink, 1)?;
            wire::write_str(sink, "type")?;
            desc.pack(sink, ctx)
        }
        TypeParam::Symbol(s) => {
            wire::write_map_header(sink, 1)?;
            wire::write_str(sink, "symbol")?;
            wire::write_str(sink, s)
        }
        TypeParam::Int(i) => {
            wire::write_map_header(sink, 1)?;
            wire::write_str(sink, "int")?;
            wire::write_signed(sink, *i)
        }
        TypeParam::Bool(b) => {
            wire::write_map_header(sink, 1)?;
            wire::write_str(sink, "bool")?;
            wire::write_bool(sink, *b)
        }
    }
}

fn unpack_param<R: Source, C: Context + Copy>(
    src: &mut R,
    ctx: C,
) -> Result<TypeParam, UnpackError> {
    let len = wire::read_map_header(src)?;
    if len != 1 {
        return Err(UnpackError::LengthMismatch {
            format: "TypeParam",
            expected: 1,
            found: len,
        });
    }
    let key = wire::read_str(src)?;
    match key.as_str() {
        "type" => Ok(TypeParam::Type(TypeDescriptor::unpack(src, ctx)?)),
        "symbol" => Ok(TypeParam::Symbol(wire::read_str(src)?)),
        "int" => Ok(TypeParam::Int(wire::read_signed(src)?)),
        "bool" => Ok(TypeParam::Bool(wire::read_bool(src)?)),
        other => Err(UnpackError::UnknownNamespace {
            path: other.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::DefaultContext;

    #[test]
    fn descriptor_roundtrip_no_params() {
        let desc = TypeDescriptor::new("Boat", ["vehicles"]);
        let bytes = crate::construct::pack(&desc, DefaultContext).unwrap();
        let back: TypeDescriptor = crate::construct::unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(desc, back);
    }

    #[test]
    fn descriptor_roundtrip_with_params() {
        let mut desc = TypeDescriptor::new("Pair", ["core"]);
        desc.params.push(TypeParam::Int(2));
        desc.params.push(TypeParam::Type(TypeDescriptor::new("Boat", ["vehicles"])));
        let bytes = crate::construct::pack(&desc, DefaultContext).unwrap();
        let back: TypeDescriptor = crate::construct::unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(desc, back);
    }

    #[test]
    fn qualified_name_joins_path() {
        let desc = TypeDescriptor::new("Boat", ["crate", "vehicles"]);
        assert_eq!(desc.qualified_name(), "crate::vehicles::Boat");
    }

    struct Registered;
    impl Described for Registered {
        const TYPE_NAME: &'static str = "Registered";
        const TYPE_PATH: &'static [&'static str] = &["generics"];

        fn type_params() -> Vec<TypeParam> {
            vec![TypeParam::Type(TypeDescriptor::new("Boat", ["vehicles"]))]
        }

        fn typeparamtypes() -> Vec<Option<&'static str>> {
            vec![Some("vehicles::Boat")]
        }

        fn typeparamformats() -> Vec<Option<&'static str>> {
            vec![Some("Signed")]
        }
    }

    struct Unregistered;
    impl Described for Unregistered {
        const TYPE_NAME: &'static str = "Unregistered";
        const TYPE_PATH: &'static [&'static str] = &["generics"];

        fn type_params() -> Vec<TypeParam> {
            vec![TypeParam::Type(TypeDescriptor::new("Boat", ["vehicles"]))]
        }
    }

    #[test]
    fn resolve_type_params_accepts_matching_binding() {
        let desc = Registered::descriptor();
        resolve_type_params::<Registered>(&desc).unwrap();
    }

    #[test]
    fn resolve_type_params_rejects_unregistered_slot() {
        let desc = Unregistered::descriptor();
        let err = resolve_type_params::<Unregistered>(&desc).unwrap_err();
        assert!(matches!(err, UnpackError::MissingTypeParamTypes { .. }));
    }

    #[test]
    fn resolve_type_params_rejects_mismatched_binding() {
        let desc = TypeDescriptor {
            params: vec![TypeParam::Type(TypeDescriptor::new("Cat", ["animals"]))],
            ..Registered::descriptor()
        };
        let err = resolve_type_params::<Registered>(&desc).unwrap_err();
        assert!(matches!(err, UnpackError::TypeMismatch { .. }));
    }

    #[test]
    fn resolve_type_params_trusts_engine_namespace() {
        let desc = TypeDescriptor {
            params: vec![TypeParam::Type(TypeDescriptor::new(
                "TypeDescriptor",
                [ENGINE_NAMESPACE],
            ))],
            ..Unregistered::descriptor()
        };
        resolve_type_params::<Unregistered>(&desc).unwrap();
    }

    #[test]
    fn check_type_param_formats_accepts_registered_type() {
        check_type_param_formats::<Registered>().unwrap();
    }

    #[test]
    fn check_type_param_formats_rejects_unregistered_type() {
        let err = check_type_param_formats::<Unregistered>().unwrap_err();
        assert!(matches!(err, PackError::MissingTypeParamFormats { .. }));
    }
}
