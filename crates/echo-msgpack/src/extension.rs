// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Extension<CODE>`/`AnyExtension` (`spec.md` §4.3.9, component C3): one of
//! the 8 MessagePack ext encodings, tagged with a type code. `Extension<CODE>`
//! statically pins the code a type packs/expects; `AnyExtension` accepts (or
//! produces) any code, materializing the generic [`ExtensionData`].

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{AnyExtension, Extension, Formatted};
use crate::io::{Sink, Source};
use crate::wire;

/// A raw `(type code, payload)` pair — the materialized form `AnyExtension`
/// decodes to when no statically-known code is expected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionData {
    /// The MessagePack ext type code.
    pub code: i8,
    /// The raw payload bytes.
    pub payload: Vec<u8>,
}

/// The `destruct`/`construct` hook for a type packed as a fixed-code
/// extension (`spec.md` §4.3.9's `destruct(v, Extension<code>, ctx)`).
pub trait ExtensionPayload<C: Context = crate::context::DefaultContext>: Sized {
    /// Produce the raw payload bytes.
    fn to_payload(&self, ctx: C) -> Vec<u8>;
    /// Reconstruct from payload bytes previously produced by [`Self::to_payload`].
    fn from_payload(bytes: &[u8], ctx: C) -> Result<Self, UnpackError>;
}

impl<T, C, const CODE: i8> Pack<Extension<CODE>, C> for T
where
    C: Context,
    T: ExtensionPayload<C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        let payload = self.to_payload(ctx);
        wire::write_ext_header(sink, CODE, payload.len())?;
        sink.write_bytes(&payload)
    }
}

impl<T, C, const CODE: i8> Unpack<Extension<CODE>, C> for T
where
    C: Context,
    T: ExtensionPayload<C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let (code, len) = wire::read_ext_header(src)?;
        if code != CODE {
            return Err(UnpackError::ExtensionCodeMismatch {
                expected: CODE,
                found: code,
            });
        }
        let bytes = src.read_vec(len)?;
        T::from_payload(&bytes, ctx)
    }
}

impl<C: Context> Formatted<C> for ExtensionData {
    type Format = AnyExtension;
}

impl<C: Context> Pack<AnyExtension, C> for ExtensionData {
    fn pack<S: Sink>(&self, sink: &mut S, _ctx: C) -> Result<(), PackError> {
        wire::write_ext_header(sink, self.code, self.payload.len())?;
        sink.write_bytes(&self.payload)
    }
}

impl<C: Context> Unpack<AnyExtension, C> for ExtensionData {
    fn unpack<R: Source>(src: &mut R, _ctx: C) -> Result<Self, UnpackError> {
        let (code, len) = wire::read_ext_header(src)?;
        let payload = src.read_vec(len)?;
        Ok(ExtensionData { code, payload })
    }
}
