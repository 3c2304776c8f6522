use jval::{Kind, Value, ITER_FINISHED};
use proptest::prelude::*;

/// Rebuild a value from scratch through the public API.
fn deep_copy(v: &Value) -> Value {
    match v.kind() {
        Kind::Invalid => Value::invalid(),
        Kind::Null => Value::null(),
        Kind::False => Value::bool(false),
        Kind::True => Value::bool(true),
        Kind::Number => Value::number(v.number_value()),
        Kind::String => Value::string(v.string_value()),
        Kind::Array => v
            .array_iter()
            .fold(Value::array(), |a, e| a.array_append(deep_copy(&e))),
        Kind::Object => {
            let mut o = Value::object();
            let mut it = v.object_iter();
            while v.object_iter_valid(it) {
                o = o.object_set(v.object_iter_key(it), deep_copy(&v.object_iter_value(it)));
                it = v.object_iter_next(it);
            }
            o
        }
    }
}

fn atom() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::null()),
        any::<bool>().prop_map(Value::bool),
        (-1.0e9..1.0e9f64).prop_map(Value::number),
        "[a-zA-Z0-9 é]{0,12}".prop_map(|s| Value::string(&s)),
    ]
}

fn json_value(depth: u32) -> BoxedStrategy<Value> {
    if depth == 0 {
        atom().boxed()
    } else {
        prop_oneof![
            atom(),
            prop::collection::vec(json_value(depth - 1), 0..5).prop_map(|items| {
                items.into_iter().fold(Value::array(), Value::array_append)
            }),
            prop::collection::vec(("[a-z]{0,6}", json_value(depth - 1)), 0..5).prop_map(
                |entries| {
                    entries.into_iter().fold(Value::object(), |o, (k, v)| {
                        o.object_set(Value::string(&k), v)
                    })
                }
            ),
        ]
        .boxed()
    }
}

proptest! {
    #[test]
    fn equal_is_reflexive_and_symmetric(v in json_value(3), w in json_value(3)) {
        prop_assert!(v == v.clone());
        prop_assert_eq!(v == w, w == v);
    }

    #[test]
    fn deep_copy_is_equal(v in json_value(3)) {
        prop_assert_eq!(deep_copy(&v), v);
    }

    #[test]
    fn clone_is_identical_and_equal(v in json_value(2)) {
        let c = v.clone();
        prop_assert!(v.identical(&c));
        prop_assert_eq!(c, v);
    }

    #[test]
    fn every_value_contains_its_deep_copy(v in json_value(2)) {
        prop_assert!(v.contains(&deep_copy(&v)));
    }

    #[test]
    fn array_slice_round_trip(
        items in prop::collection::vec(-1000.0..1000.0f64, 0..12),
        s in 0..12i32,
        e in 0..12i32,
    ) {
        let a = items.iter().fold(Value::array(), |a, &n| a.array_append(Value::number(n)));
        let len = a.array_length();
        let (s, e) = (s.min(len), e.min(len));
        prop_assume!(s <= e);
        let sl = a.clone().array_slice(s, e);
        prop_assert_eq!(sl.array_length(), e - s);
        for i in 0..(e - s) {
            prop_assert_eq!(sl.array_get(i), a.array_get(s + i));
        }
    }

    #[test]
    fn string_from_bytes_is_always_valid_utf8(bytes in prop::collection::vec(any::<u8>(), 0..64)) {
        let v = Value::string_from_bytes(&bytes);
        // string_value returning &str is itself the guarantee; check the
        // replacement path kept the valid prefix bytes
        let s = v.string_value().to_owned();
        prop_assert!(std::str::from_utf8(s.as_bytes()).is_ok());
        if std::str::from_utf8(&bytes).is_ok() {
            prop_assert_eq!(s.as_bytes(), &bytes[..]);
        }
    }

    #[test]
    fn string_split_concat_inverse(
        parts in prop::collection::vec("[a-z]{1,5}", 1..6),
    ) {
        let joined = parts.join(",");
        let split = Value::string(&joined).string_split(Value::string(","));
        let collected: Vec<String> = split
            .array_iter()
            .map(|p| p.string_value().to_owned())
            .collect();
        prop_assert_eq!(collected, parts);
    }

    #[test]
    fn string_hash_agrees_with_equality(a in "[a-z]{0,12}", b in "[a-z]{0,12}") {
        let va = Value::string(&a);
        let vb = Value::string(&b);
        if va == vb {
            prop_assert_eq!(va.string_hash(), vb.string_hash());
        }
    }

    #[test]
    fn object_bindings_survive_growth(
        entries in prop::collection::btree_map("[a-z]{1,8}", -1000.0..1000.0f64, 0..40),
    ) {
        let o = entries.iter().fold(Value::object(), |o, (k, &v)| {
            o.object_set(Value::string(k), Value::number(v))
        });
        prop_assert_eq!(o.object_length() as usize, entries.len());
        for (k, &v) in &entries {
            prop_assert_eq!(o.object_get(&Value::string(k)), Value::number(v));
        }

        // cursor iteration visits each binding exactly once
        let mut seen = 0;
        let mut it = o.object_iter();
        while it != ITER_FINISHED {
            seen += 1;
            it = o.object_iter_next(it);
        }
        prop_assert_eq!(seen, entries.len());
    }

    #[test]
    fn object_delete_removes_only_its_key(
        entries in prop::collection::btree_map("[a-z]{1,6}", any::<bool>(), 1..20),
    ) {
        let o = entries.iter().fold(Value::object(), |o, (k, &v)| {
            o.object_set(Value::string(k), Value::bool(v))
        });
        let victim = entries.keys().next().unwrap().clone();
        let o = o.object_delete(Value::string(&victim));
        prop_assert!(!o.object_has(&Value::string(&victim)));
        prop_assert_eq!(o.object_length() as usize, entries.len() - 1);
        for k in entries.keys().skip(1) {
            prop_assert!(o.object_has(&Value::string(k)));
        }
    }

    #[test]
    fn cow_mutation_does_not_leak_through_clones(v in json_value(2)) {
        match v.kind() {
            Kind::Array => {
                let snapshot = deep_copy(&v);
                let _mutated = v.clone().array_set(0, Value::string("sentinel"));
                prop_assert_eq!(v, snapshot);
            }
            Kind::Object => {
                let snapshot = deep_copy(&v);
                let _mutated = v.clone().object_set(Value::string("sentinel"), Value::null());
                prop_assert_eq!(v, snapshot);
            }
            _ => {}
        }
    }
}
