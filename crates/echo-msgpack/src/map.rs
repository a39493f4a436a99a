// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! `Map`/`DynamicMap` (`spec.md` §4.3.3, component C3): map-header + N
//! (key, value) pairs. Realized over `BTreeMap` (deterministic iteration
//! order on pack, matching the "shortest legal encoding" determinism the
//! rest of the wire codec already guarantees) and `HashMap`.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;

use crate::construct::{Pack, Unpack};
use crate::context::Context;
use crate::error::{PackError, UnpackError};
use crate::format::{Formatted, MapFmt};
use crate::generator::Generator;
use crate::io::{Sink, Source};
use crate::wire;

impl<K, V, C> Formatted<C> for BTreeMap<K, V>
where
    C: Context,
    K: Formatted<C> + Ord,
    V: Formatted<C>,
{
    type Format = MapFmt;
}

impl<K, V, C> Pack<MapFmt, C> for BTreeMap<K, V>
where
    C: Context,
    K: Formatted<C> + Pack<K::Format, C> + Ord,
    V: Formatted<C> + Pack<V::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_map_header(sink, self.len())?;
        for (k, v) in self {
            k.pack(sink, ctx)?;
            v.pack(sink, ctx)?;
        }
        Ok(())
    }
}

impl<K, V, C> Unpack<MapFmt, C> for BTreeMap<K, V>
where
    C: Context,
    K: Formatted<C> + Unpack<K::Format, C> + Ord,
    V: Formatted<C> + Unpack<V::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(src)?;
        let mut gen = Generator::new(src, len);
        let mut out = BTreeMap::new();
        for _ in 0..len {
            let k = gen.next::<K, K::Format, C>(ctx)?;
            let v = gen.next::<V, V::Format, C>(ctx)?;
            out.insert(k, v);
        }
        Ok(out)
    }
}

impl<K, V, C> Formatted<C> for HashMap<K, V>
where
    C: Context,
    K: Formatted<C> + Eq + Hash,
    V: Formatted<C>,
{
    type Format = MapFmt;
}

impl<K, V, C> Pack<MapFmt, C> for HashMap<K, V>
where
    C: Context,
    K: Formatted<C> + Pack<K::Format, C> + Eq + Hash,
    V: Formatted<C> + Pack<V::Format, C>,
{
    fn pack<S: Sink>(&self, sink: &mut S, ctx: C) -> Result<(), PackError> {
        wire::write_map_header(sink, self.len())?;
        for (k, v) in self {
            k.pack(sink, ctx)?;
            v.pack(sink, ctx)?;
        }
        Ok(())
    }
}

impl<K, V, C> Unpack<MapFmt, C> for HashMap<K, V>
where
    C: Context,
    K: Formatted<C> + Unpack<K::Format, C> + Eq + Hash,
    V: Formatted<C> + Unpack<V::Format, C>,
{
    fn unpack<R: Source>(src: &mut R, ctx: C) -> Result<Self, UnpackError> {
        let len = wire::read_map_header(src)?;
        let mut gen = Generator::new(src, len);
        let mut out = HashMap::with_capacity(len);
        for _ in 0..len {
            let k = gen.next::<K, K::Format, C>(ctx)?;
            let v = gen.next::<V, V::Format, C>(ctx)?;
            out.insert(k, v);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::construct::{pack, unpack};
    use crate::context::DefaultContext;

    #[test]
    fn btreemap_roundtrip_sorted() {
        let mut m = BTreeMap::new();
        m.insert("b".to_string(), 2i32);
        m.insert("a".to_string(), 1i32);
        let bytes = pack(&m, DefaultContext).unwrap();
        assert_eq!(bytes[0], 0x82);
        let back: BTreeMap<String, i32> = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn hashmap_roundtrip() {
        let mut m = HashMap::new();
        m.insert(1u32, "x".to_string());
        m.insert(2u32, "y".to_string());
        let bytes = pack(&m, DefaultContext).unwrap();
        let back: HashMap<u32, String> = unpack(&bytes, DefaultContext).unwrap();
        assert_eq!(back, m);
    }
}
