//! # Bounded Strings
//!
//! Messages are plain values of bounded size, so every string they carry is
//! stored inline. Input longer than the capacity is cut at a character
//! boundary and the cut is remembered in the value itself.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Inline UTF-8 string holding at most `N` bytes.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoundedStr<const N: usize> {
    buf: [u8; N],
    len: u16,
    truncated: bool,
}

impl<const N: usize> BoundedStr<N> {
    /// Maximum number of bytes this string can hold.
    pub const CAPACITY: usize = N;

    /// Copy `s`, truncating at the last character boundary that fits.
    #[must_use]
    pub fn new(s: &str) -> Self {
        let mut end = s.len().min(N);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut buf = [0u8; N];
        buf[..end].copy_from_slice(&s.as_bytes()[..end]);
        Self {
            buf,
            len: end as u16,
            truncated: end < s.len(),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        // Only ever filled from a &str cut at a char boundary.
        std::str::from_utf8(&self.buf[..usize::from(self.len)]).unwrap_or_default()
    }

    /// Was the input cut to fit?
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        usize::from(self.len)
    }
}

impl<const N: usize> Default for BoundedStr<N> {
    fn default() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
            truncated: false,
        }
    }
}

impl<const N: usize> From<&str> for BoundedStr<N> {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<const N: usize> fmt::Debug for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.truncated {
            write!(f, "{:?}(truncated)", self.as_str())
        } else {
            fmt::Debug::fmt(self.as_str(), f)
        }
    }
}

impl<const N: usize> fmt::Display for BoundedStr<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<const N: usize> PartialEq<str> for BoundedStr<N> {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl<const N: usize> PartialEq<&str> for BoundedStr<N> {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

// Wire form is (text, truncated) so the flag survives a hop.
impl<const N: usize> Serialize for BoundedStr<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.as_str(), self.truncated).serialize(serializer)
    }
}

impl<'de, const N: usize> Deserialize<'de> for BoundedStr<N> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (text, truncated) = <(String, bool)>::deserialize(deserializer)?;
        let mut value = Self::new(&text);
        value.truncated |= truncated;
        Ok(value)
    }
}
