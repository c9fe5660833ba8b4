//! Chat identifier case mapping.
//!
//! Nicknames and channel names compare case-insensitively under the
//! `rfc1459` mapping: ASCII letters fold to lowercase and four punctuation
//! pairs are equivalent:
//! - `[` → `{`
//! - `]` → `}`
//! - `\` → `|`
//! - `~` → `^`

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Fold a single byte to its canonical (lowercase) form.
#[inline]
pub const fn fold_byte(b: u8) -> u8 {
    match b {
        b'[' => b'{',
        b']' => b'}',
        b'\\' => b'|',
        b'~' => b'^',
        b'A'..=b'Z' => b + 32,
        _ => b,
    }
}

/// Fold a whole identifier.
pub fn to_folded(s: &[u8]) -> Vec<u8> {
    s.iter().copied().map(fold_byte).collect()
}

/// Three-way comparison of two identifiers after folding.
///
/// Lexicographic on folded bytes, so identifiers of different length are
/// never equal and the empty identifier sorts before everything else.
pub fn identifier_cmp(s: &[u8], t: &[u8]) -> Ordering {
    s.iter()
        .copied()
        .map(fold_byte)
        .cmp(t.iter().copied().map(fold_byte))
}

/// Equality under [`identifier_cmp`].
pub fn identifier_eq(s: &[u8], t: &[u8]) -> bool {
    s.len() == t.len() && identifier_cmp(s, t) == Ordering::Equal
}

/// An owned identifier whose `Eq`, `Ord` and `Hash` follow the case mapping.
///
/// The original spelling is kept for display.
#[derive(Clone, Default)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        identifier_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for Identifier {}

impl PartialOrd for Identifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Identifier {
    fn cmp(&self, other: &Self) -> Ordering {
        identifier_cmp(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(fold_byte(b));
        }
        state.write_usize(self.0.len());
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Borrowed key type so maps keyed by [`Identifier`] can be queried with a
/// plain string without allocating.
#[repr(transparent)]
#[derive(Debug)]
pub struct IdentStr(str);

impl IdentStr {
    pub fn new(s: &str) -> &IdentStr {
        // SAFETY: IdentStr is a transparent wrapper around str.
        unsafe { &*(s as *const str as *const IdentStr) }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<IdentStr> for Identifier {
    fn borrow(&self) -> &IdentStr {
        IdentStr::new(&self.0)
    }
}

impl PartialEq for IdentStr {
    fn eq(&self, other: &Self) -> bool {
        identifier_eq(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Eq for IdentStr {}

impl PartialOrd for IdentStr {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for IdentStr {
    fn cmp(&self, other: &Self) -> Ordering {
        identifier_cmp(self.0.as_bytes(), other.0.as_bytes())
    }
}

impl Hash for IdentStr {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(fold_byte(b));
        }
        state.write_usize(self.0.len());
    }
}
