//! Wire-level constants: format version and tag bytes.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Major format version written and accepted.
pub const MAJOR_VERSION: u8 = 4;
/// Newest minor format version understood.
pub const MINOR_VERSION: u8 = 8;

/// A `major.minor` pair as found in a stream header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatVersion {
    pub major: u8,
    pub minor: u8,
}

impl FormatVersion {
    /// The version produced by the generator.
    pub const CURRENT: Self = Self {
        major: MAJOR_VERSION,
        minor: MINOR_VERSION,
    };

    pub fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    /// Whether a stream with this header can be read at all.
    pub fn is_readable(&self) -> bool {
        self.major == MAJOR_VERSION && self.minor <= MINOR_VERSION
    }

    /// Readable, but older than [`FormatVersion::CURRENT`].
    pub fn is_outdated(&self) -> bool {
        self.is_readable() && self.minor < MINOR_VERSION
    }
}

impl Default for FormatVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Tag bytes understood by this codec.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tag {
    Nil = b'0',
    True = b'T',
    False = b'F',
    Fixnum = b'i',
    Symbol = b':',
    Symlink = b';',
    Array = b'[',
    Object = b'o',
    Link = b'@',
}

impl Tag {
    /// The byte written for this tag.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Parse a tag byte. Returns `None` for anything outside the supported subset.
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            b'0' => Some(Self::Nil),
            b'T' => Some(Self::True),
            b'F' => Some(Self::False),
            b'i' => Some(Self::Fixnum),
            b':' => Some(Self::Symbol),
            b';' => Some(Self::Symlink),
            b'[' => Some(Self::Array),
            b'o' => Some(Self::Object),
            b'@' => Some(Self::Link),
            _ => None,
        }
    }
}

/// Names of tags that exist in the full marshal format but lie outside the
/// subset implemented here.
pub fn reserved_tag_name(byte: u8) -> Option<&'static str> {
    let name = match byte {
        b'e' => "extended object",
        b'C' => "user class",
        b'd' => "data object",
        b'u' => "user-defined dump",
        b'U' => "user marshal",
        b'f' => "float",
        b'l' => "bignum",
        b'"' => "string",
        b'/' => "regexp",
        b'{' => "hash",
        b'}' => "hash with default",
        b'S' => "struct",
        b'M' => "old module",
        b'c' => "class",
        b'm' => "module",
        b'I' => "instance variables",
        _ => return None,
    };
    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_bytes_match_wire_table() {
        assert_eq!(Tag::Nil.byte(), 0x30);
        assert_eq!(Tag::True.byte(), 0x54);
        assert_eq!(Tag::False.byte(), 0x46);
        assert_eq!(Tag::Fixnum.byte(), 0x69);
        assert_eq!(Tag::Symbol.byte(), 0x3A);
        assert_eq!(Tag::Symlink.byte(), 0x3B);
        assert_eq!(Tag::Array.byte(), 0x5B);
        assert_eq!(Tag::Object.byte(), 0x6F);
        assert_eq!(Tag::Link.byte(), 0x40);
    }

    #[test]
    fn from_byte_inverts_byte() {
        for tag in [
            Tag::Nil,
            Tag::True,
            Tag::False,
            Tag::Fixnum,
            Tag::Symbol,
            Tag::Symlink,
            Tag::Array,
            Tag::Object,
            Tag::Link,
        ] {
            assert_eq!(Tag::from_byte(tag.byte()), Some(tag));
        }
    }

    #[test]
    fn from_byte_unknown() {
        assert!(Tag::from_byte(0x00).is_none());
        assert!(Tag::from_byte(b'f').is_none());
        assert!(Tag::from_byte(0xFF).is_none());
    }

    #[test]
    fn reserved_tags_are_not_supported_tags() {
        for byte in 0..=u8::MAX {
            if reserved_tag_name(byte).is_some() {
                assert!(Tag::from_byte(byte).is_none(), "0x{byte:02x}");
            }
        }
        assert_eq!(reserved_tag_name(b'f'), Some("float"));
        assert_eq!(reserved_tag_name(b'x'), None);
    }

    #[test]
    fn version_readability() {
        assert!(FormatVersion::new(4, 8).is_readable());
        assert!(!FormatVersion::new(4, 8).is_outdated());
        assert!(FormatVersion::new(4, 7).is_outdated());
        assert!(!FormatVersion::new(4, 9).is_readable());
        assert!(!FormatVersion::new(3, 8).is_readable());
        assert!(!FormatVersion::new(5, 0).is_readable());
        assert_eq!(FormatVersion::default().to_string(), "4.8");
    }
}
