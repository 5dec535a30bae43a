//! Two ordered maps: [`BalancedMap`], an AVL tree keyed by a single ordered key, and
//! [`PrefixMap`], a ternary search tree keyed by sequences of ordered symbols that can
//! list every entry under a prefix in lexicographic order.
//!
//! ```
//! use forest::{BalancedMap, PrefixMap};
//!
//! let mut map = BalancedMap::new();
//! map.insert(10, "ten").unwrap();
//! map.insert(11, "eleven").unwrap();
//! assert_eq!(map.get(&11), Some(&"eleven"));
//! assert_eq!(map.remove(&10), Some("ten"));
//!
//! let mut words = PrefixMap::new();
//! words.insert(b"hell", 4).unwrap();
//! words.insert(b"hello", 1).unwrap();
//! words.insert(b"heaven", 3).unwrap();
//! let values: Vec<_> = words.values(b"hel").into_iter().copied().collect();
//! assert_eq!(values, [4, 1]);
//! ```
//!
//! Neither map synchronizes access internally. Wrap a map in a lock to share it
//! between threads.

#[cfg(feature = "tracing")]
macro_rules! trace {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

pub mod balanced_map;
mod error;
pub mod prefix_map;

pub use balanced_map::BalancedMap;
pub use error::{Error, Result};
pub use prefix_map::PrefixMap;

#[cfg(test)]
mod proptests;
