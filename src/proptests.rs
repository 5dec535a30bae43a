use super::*;

use proptest::prelude::*;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
enum Op<K> {
    Insert(K, u32),
    Remove(K),
    Get(K),
}

fn op_strategy<K: Clone + std::fmt::Debug>(
    key: impl Strategy<Value = K> + Clone,
) -> impl Strategy<Value = Op<K>> {
    prop_oneof![
        4 => (key.clone(), any::<u32>()).prop_map(|(k, v)| Op::Insert(k, v)),
        3 => key.clone().prop_map(Op::Remove),
        2 => key.prop_map(Op::Get),
    ]
}

// Short keys over a small alphabet so that prefixes are shared often.
fn sequence_key() -> impl Strategy<Value = Vec<u8>> + Clone {
    prop::collection::vec(b'a'..b'e', 0..6)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_balanced_map_equivalence(ops in prop::collection::vec(op_strategy(0u16..512), 0..400)) {
        let mut t: BalancedMap<u16, u32> = BalancedMap::new();
        let mut m: BTreeMap<u16, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let expected = if m.contains_key(&key) {
                        Err(Error::KeyExists)
                    } else {
                        m.insert(key, value);
                        Ok(())
                    };
                    prop_assert_eq!(t.insert(key, value), expected);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.check_consistency();
        let bound = (1.44 * ((t.len() + 2) as f64).log2()).ceil() as usize;
        prop_assert!(t.height() <= bound);
        prop_assert_eq!(format!("{t:?}"), format!("{m:?}"));
    }

    #[test]
    fn prop_prefix_map_equivalence(
        ops in prop::collection::vec(op_strategy(sequence_key()), 0..300),
        prefix in prop::collection::vec(b'a'..b'e', 0..3),
    ) {
        let mut t: PrefixMap<u8, u32> = PrefixMap::new();
        let mut m: BTreeMap<Vec<u8>, u32> = BTreeMap::new();

        for op in ops {
            match op {
                Op::Insert(key, value) => {
                    let expected = if key.is_empty() {
                        Err(Error::EmptyKey)
                    } else if m.contains_key(&key) {
                        Err(Error::KeyExists)
                    } else {
                        m.insert(key.clone(), value);
                        Ok(())
                    };
                    prop_assert_eq!(t.insert(&key, value), expected);
                }
                Op::Remove(key) => {
                    prop_assert_eq!(t.remove(&key), m.remove(&key));
                }
                Op::Get(key) => {
                    prop_assert_eq!(t.get(&key), m.get(&key));
                }
            }

            prop_assert_eq!(t.len(), m.len());
        }

        t.check_consistency();

        let got: Vec<(Vec<u8>, u32)> = t.entries(&[]).into_iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(Vec<u8>, u32)> = m.iter().map(|(k, v)| (k.clone(), *v)).collect();
        prop_assert_eq!(got, expected);

        let got: Vec<(Vec<u8>, u32)> = t.entries(&prefix).into_iter().map(|(k, v)| (k, *v)).collect();
        let expected: Vec<(Vec<u8>, u32)> = m
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        prop_assert_eq!(got, expected);
    }
}
