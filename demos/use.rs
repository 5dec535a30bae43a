use forest::{BalancedMap, Error};

fn main() {
    let mut map = BalancedMap::new();
    for (key, name) in [(0, "zero"), (1, "one"), (2, "two"), (3, "three"), (4, "four")] {
        map.insert(key, name).unwrap();
    }
    assert_eq!(map.insert(2, "two"), Err(Error::KeyExists));
    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(map.remove(&1), Some("one"));
    assert!(map.get(&1).is_none());

    println!("{} entries in {} levels: {:?}", map.len(), map.height(), map);
}
