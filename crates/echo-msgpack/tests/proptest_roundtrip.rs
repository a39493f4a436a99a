// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Property tests: arbitrary values of the core scalar/container types
//! survive a pack/unpack round trip, and `unpack_any` never panics on
//! arbitrary bytes.

use echo_msgpack::context::DefaultContext;
use echo_msgpack::{pack, unpack, unpack_any};
use proptest::prelude::*;

proptest! {
    #[test]
    fn i32_roundtrips(v in any::<i32>()) {
        let bytes = pack(&v, DefaultContext).unwrap();
        let back: i32 = unpack(&bytes, DefaultContext).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn i64_roundtrips(v in any::<i64>()) {
        let bytes = pack(&v, DefaultContext).unwrap();
        let back: i64 = unpack(&bytes, DefaultContext).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn f64_roundtrips(v in any::<f64>()) {
        let bytes = pack(&v, DefaultContext).unwrap();
        let back: f64 = unpack(&bytes, DefaultContext).unwrap();
        if v.is_nan() {
            prop_assert!(back.is_nan());
        } else {
            prop_assert_eq!(back, v);
        }
    }

    #[test]
    fn string_roundtrips(v in ".*") {
        let bytes = pack(&v, DefaultContext).unwrap();
        let back: String = unpack(&bytes, DefaultContext).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn vec_of_i32_roundtrips(v in prop::collection::vec(any::<i32>(), 0..64)) {
        let bytes = pack(&v, DefaultContext).unwrap();
        let back: Vec<i32> = unpack(&bytes, DefaultContext).unwrap();
        prop_assert_eq!(back, v);
    }

    #[test]
    fn unpack_any_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..256)) {
        let _ = unpack_any(&mut echo_msgpack::io::SliceSource::new(&bytes));
    }

    #[test]
    fn unpack_i32_never_panics_on_garbage(bytes in prop::collection::vec(any::<u8>(), 0..32)) {
        let _ = unpack::<i32, _>(&bytes, DefaultContext);
    }
}
