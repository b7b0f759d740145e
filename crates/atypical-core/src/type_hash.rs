//! Deterministic hash-based identity for declarations.
//!
//! [`TypeHash`] is a 64-bit XXHash of a qualified name (for types) or of
//! owner + name + descriptor (for methods and fields). The structural index
//! keys its maps by these hashes, so lookups never depend on registration
//! order.
//!
//! ```
//! use atypical_core::TypeHash;
//!
//! let a = TypeHash::from_name("geo/Point");
//! assert_eq!(a, TypeHash::from_name("geo/Point"));
//!
//! let m1 = TypeHash::from_method(a, "len", "()I");
//! let m2 = TypeHash::from_method(a, "len", "(I)I");
//! assert_ne!(m1, m2);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain-specific mixing constants.
///
/// Keep types, methods and fields with the same spelling apart.
pub mod hash_constants {
    /// Separator between hashed components.
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for type hashes.
    pub const TYPE: u64 = 0x2fac10b63a6cc57c;

    /// Domain marker for method hashes.
    pub const METHOD: u64 = 0x7d3c8b4a92e15f6d;

    /// Domain marker for field hashes.
    pub const FIELD: u64 = 0x1a095090689d4647;
}

/// A deterministic 64-bit identity for a type, method or field.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Empty/invalid hash constant.
    pub const EMPTY: TypeHash = TypeHash(0);

    /// Hash of a qualified (slash separated) type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(hash_constants::TYPE ^ xxh64(name.as_bytes(), 0))
    }

    /// Hash of a method identified by owner, name and descriptor string.
    ///
    /// Two overloads differ only in descriptor, so it takes part in the hash.
    #[inline]
    pub fn from_method(owner: TypeHash, name: &str, descriptor: &str) -> Self {
        let name_hash = xxh64(name.as_bytes(), 0);
        let desc_hash = xxh64(descriptor.as_bytes(), 0);
        let hash = (hash_constants::METHOD ^ owner.0)
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(name_hash)
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(desc_hash);
        TypeHash(hash)
    }

    /// Hash of a field identified by owner and name.
    #[inline]
    pub fn from_field(owner: TypeHash, name: &str) -> Self {
        let hash = (hash_constants::FIELD ^ owner.0)
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(xxh64(name.as_bytes(), 0));
        TypeHash(hash)
    }

    /// Whether this is the empty hash.
    #[inline]
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
