// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! A type-driven, context-aware MessagePack serialization engine.
//!
//! A type's wire format is resolved from its Rust type and the context
//! active at the call site ([`Formatted<C>`](format::Formatted)), not from
//! field attributes baked into the type itself. The same `Vec<u8>` packs as
//! a positional `Vector` or as a raw `Bin` blob depending on which format is
//! asked for explicitly ([`pack_as`]/[`unpack_as`]); the same struct decodes
//! strictly, permutation-tolerantly, or forward-compatibly depending on
//! which of [`format::StructFmt`], [`format::UnorderedStruct`], or
//! [`format::FlexibleStruct`] it's bound under.
//!
//! Six free functions at the root cover the common paths: [`pack`]/[`unpack`]
//! resolve a type's default format; [`pack_as`]/[`unpack_as`] pin an
//! explicit format; [`unpack_any`] decodes without any target type at all;
//! [`skip`]/[`step`] advance past a value without decoding it.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod io;
pub mod wire;

pub mod format;

pub mod error;
pub use error::{InvariantError, PackError, UnpackError};

pub mod context;
pub use context::{ambient_context_name, enter, Context, ContextGuard, DefaultContext};

pub mod construct;
pub use construct::{pack, pack_as, pack_into, pack_into_as, unpack, unpack_as, unpack_from, unpack_from_as, Pack, Unpack};

pub mod typedesc;
pub use typedesc::{Described, TypeDescriptor, TypeParam};

pub mod generator;
pub use generator::Generator;

pub mod core_formats;
pub use core_formats::Bytes;

pub mod sequence;
pub mod map;

pub mod dynamic;
pub use dynamic::IterState;

pub mod struct_;
pub use struct_::StructBuilder;
pub use struct_::StructFormat;

pub mod array_shape;
pub use array_shape::{ArrayValue, BinVectorFormat};

pub mod typed;
pub use typed::{pack_typed, unpack_typed, TypedFamily, TypedValue};

pub mod extension;
pub use extension::{ExtensionData, ExtensionPayload};

pub mod wrappers;

pub mod any;
pub use any::{unpack_any, AnyValue};

pub mod skip;
pub use skip::{skip, step};

pub use wire::peek_format;
