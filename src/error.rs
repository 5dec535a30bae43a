use thiserror::Error;

/// Errors returned by the mutating operations of the maps.
///
/// A failed operation never modifies the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The key is already stored; the existing value is kept.
    #[error("key already exists")]
    KeyExists,
    /// A sequence key must contain at least one symbol.
    #[error("key must not be empty")]
    EmptyKey,
}

pub type Result<T> = std::result::Result<T, Error>;
