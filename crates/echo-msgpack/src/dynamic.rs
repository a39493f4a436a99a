// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `DynamicVector`/`DynamicMap` (`spec.md` §4.3.2/§4.3.3, component C3):
//! like `Vector`/`MapFmt`, but the wire representation of one entry may
//! depend on the entries already decoded before it — the mechanism that
//! powers `Typed`'s "value's type depends on the type already read" trick,
//! exposed here as a usable catalog member in its own right.
//!
//! The source model's `iterstate(T, F, ctx)`/`iterstate(T, state,
//! last_entry, F, ctx)` hooks assume a format value can vary per call; Rust
//! binds a format to a static type parameter on `Pack`/`Unpack`, so a
//! per-element format cannot be chosen by a runtime value the way the
//! source model's dynamic dispatch does. [`IterState`] realizes the same
//! state-threading contract with the element itself deciding, from the
//! accumulated state, how to read or write its own bytes — one Rust type,
//! several wire shapes, chosen by position/content rather than by type.

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{DynamicMap, DynamicVector};
use crate::generator::Generator;
use crate::io::{Sink, Source};
use crate::wire;

/// The per-type hook driving state-threaded element dispatch under
/// [`DynamicVector`]/[`DynamicMap`] (`iterstate`, `spec.md` §4.3.2).
pub trait IterState<C: Context = crate::context::DefaultContext>: Sized {
    /// Accumulated state threaded across a sequence's elements.
    type State: Clone;

    /// `iterstate(T, F, ctx)`: the state in effect before the first
    /// element.
    fn iterstate_init(ctx: C) -> Self::State;

    /// `iterstate(T, state, last_entry, F, ctx)`: the state in effect for
    /// the element following `last_entry`.
    fn iterstate_next(state: &Self::State, last_entry: &Self, ctx: C) -> Self::State;

    /// Write `self` under whatever wire shape `state` selects.
    fn pack_at<S: Sink>(&self, state: &Self::State, sink: &mut S, ctx: C) -> Result<(), PackError>;

    /// Read one element under whatever wire shape `state` selects.
    fn unpack_at<R: Source>(state: &Self::State, src: &mut R, ctx: C) -> Result<Self, UnpackError>;
}

impl<T, C> Pack<DynamicVector, C> for Vec<T>
where
    C: Context,
    T: IterState<C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_array_header(sink, self.len())?;
        let mut state = T::iterstate_init(ctx);
        for item in self {
            item.pack_at(&state, sink, ctx)?;
            state = T::iterstate_next(&state, item, ctx);
        }
        Ok(())
    }
}

impl<T, C> Unpack<DynamicVector, C> for Vec<T>
where
    C: Context,
    T: IterState<C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_array_header(src)?;
        let mut gen = Generator::new(src, len);
        let mut state = T::iterstate_init(ctx);
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let item = T::unpack_at(&state, gen.source(), ctx)?;
            gen.mark_yielded();
            state = T::iterstate_next(&state, &item, ctx);
            out.push(item);
        }
        Ok(out)
    }
}

impl<K, V, C> Pack<DynamicMap, C> for Vec<(K, V)>
where
    C: Context,
    (K, V): IterState<C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_map_header(sink, self.len())?;
        let mut state = <(K, V) as IterState<C>>::iterstate_init(ctx);
        for pair in self {
            pair.pack_at(&state, sink, ctx)?;
            state = <(K, V) as IterState<C>>::iterstate_next(&state, pair, ctx);
        }
        Ok(())
    }
}

impl<K, V, C> Unpack<DynamicMap, C> for Vec<(K, V)>
where
    C: Context,
    (K, V): IterState<C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(src)?;
        let mut gen = Generator::new(src, len);
        let mut state = <(K, V) as IterState<C>>::iterstate_init(ctx);
        let mut out = Vec::with_capacity(len);
        for _ in 0..len {
            let pair = <(K, V) as IterState<C>>::unpack_at(&state, gen.source(), ctx)?;
            gen.mark_yielded();
            state = <(K, V) as IterState<C>>::iterstate_next(&state, &pair, ctx);
            out.push(pair);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{pack_as, unpack_as};
    use crate::context::DefaultContext;

    /// An element whose wire shape flips after a negative value: the entry
    /// right after a negative one is wrapped in a one-field map, everything
    /// else is a plain signed int. Demonstrates a later element's format
    /// depending on a previously decoded entry's *value*, not just its
    /// position.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Toggled(i64);

    impl IterState<DefaultContext> for Toggled {
        type State = bool;

        fn iterstate_init(_ctx: DefaultContext) -> bool {
            false
        }

        fn iterstate_next(_state: &bool, last_entry: &Self, _ctx: DefaultContext) -> bool {
            last_entry.0 < 0
        }

        fn pack_at<S: Sink>(
            &self,
            state: &bool,
            sink: &mut S,
            _ctx: DefaultContext,
        ) -> Result<(), PackError> {
            if *state {
                wire::write_map_header(sink, 1)?;
                wire::write_str(sink, "v")?;
            }
            wire::write_signed(sink, self.0)
        }

        fn unpack_at<R: Source>(
            state: &bool,
            src: &mut R,
            _ctx: DefaultContext,
        ) -> Result<Self, UnpackError> {
            if *state {
                let len = wire::read_map_header(src)?;
                if len != 1 {
                    return Err(UnpackError::LengthMismatch {
                        format: "Toggled",
                        expected: 1,
                        found: len,
                    });
                }
                let key = wire::read_str(src)?;
                if key != "v" {
                    return Err(UnpackError::MissingKey {
                        type_name: "Toggled",
                        key: "v",
                    });
                }
            }
            Ok(Toggled(wire::read_signed(src)?))
        }
    }

    #[test]
    fn dynamic_vector_format_depends_on_prior_entry() {
        let values = vec![Toggled(5), Toggled(-3), Toggled(7)];
        let bytes = pack_as::<DynamicVector, _, _>(&values, DefaultContext).unwrap();

        // first two entries are plain ints; the third (following a
        // negative) is wrapped in a map.
        assert_eq!(bytes[0], 0x93); // fixarray len 3
        assert_eq!(bytes[1], 0x05); // Toggled(5)
        assert_eq!(bytes[2], 0xfd); // Toggled(-3), fixint negative
        assert_eq!(bytes[3], 0x81); // fixmap len 1, wrapping Toggled(7)

        let back: Vec<Toggled> = unpack_as::<DynamicVector, _, _>(&bytes, DefaultContext).unwrap();
        assert_eq!(back, values);
    }

    #[test]
    fn dynamic_vector_all_non_negative_stays_flat() {
        let values = vec![Toggled(1), Toggled(2), Toggled(3)];
        let bytes = pack_as::<DynamicVector, _, _>(&values, DefaultContext).unwrap();
        assert!(bytes.iter().all(|&b| b != 0x81));
        let back: Vec<Toggled> = unpack_as::<DynamicVector, _, _>(&bytes, DefaultContext).unwrap();
        assert_eq!(back, values);
    }

    /// Same toggle rule, keyed entries: `DynamicMap` threads the identical
    /// state machine across `(String, Toggled)` pairs.
    impl IterState<DefaultContext> for (String, Toggled) {
        type State = bool;

        fn iterstate_init(ctx: DefaultContext) -> bool {
            Toggled::iterstate_init(ctx)
        }

        fn iterstate_next(state: &bool, last_entry: &Self, ctx: DefaultContext) -> bool {
            Toggled::iterstate_next(state, &last_entry.1, ctx)
        }

        fn pack_at<S: Sink>(
            &self,
            state: &bool,
            sink: &mut S,
            ctx: DefaultContext,
        ) -> Result<(), PackError> {
            wire::write_str(sink, &self.0)?;
            self.1.pack_at(state, sink, ctx)
        }

        fn unpack_at<R: Source>(
            state: &bool,
            src: &mut R,
            ctx: DefaultContext,
        ) -> Result<Self, UnpackError> {
            let key = wire::read_str(src)?;
            let value = Toggled::unpack_at(state, src, ctx)?;
            Ok((key, value))
        }
    }

    #[test]
    fn dynamic_map_threads_state_across_entries() {
        let entries = vec![
            ("a".to_string(), Toggled(5)),
            ("b".to_string(), Toggled(-3)),
            ("c".to_string(), Toggled(7)),
        ];
        let bytes = pack_as::<DynamicMap, _, _>(&entries, DefaultContext).unwrap();
        assert_eq!(bytes[0], 0x83); // fixmap len 3

        let back: Vec<(String, Toggled)> =
            unpack_as::<DynamicMap, _, _>(&bytes, DefaultContext).unwrap();
        assert_eq!(back, entries);
    }
}
