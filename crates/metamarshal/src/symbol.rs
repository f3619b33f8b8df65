use std::borrow::Cow;
use std::fmt;

/// An interned name used for class tags and instance-variable keys.
///
/// Symbols compare by content. The generator only accepts ASCII content;
/// the parser stores whatever bytes the stream carries.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(Box<[u8]>);

impl Symbol {
    pub fn new(name: impl AsRef<[u8]>) -> Self {
        Self(name.as_ref().into())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The name as UTF-8, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.0).ok()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.0)
    }

    pub fn is_ascii(&self) -> bool {
        self.0.is_ascii()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Symbol {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Symbol {
    fn from(name: String) -> Self {
        Self(name.into_bytes().into_boxed_slice())
    }
}

impl From<Vec<u8>> for Symbol {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes.into_boxed_slice())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.to_string_lossy())
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({:?})", self.to_string_lossy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_equality() {
        assert_eq!(Symbol::from("foo"), Symbol::new(b"foo"));
        assert_ne!(Symbol::from("foo"), Symbol::from("bar"));
    }

    #[test]
    fn ascii_detection() {
        assert!(Symbol::from("foo_bar?").is_ascii());
        assert!(Symbol::from("").is_ascii());
        assert!(!Symbol::from("caf\u{e9}").is_ascii());
    }

    #[test]
    fn raw_bytes_survive() {
        let sym = Symbol::new([0x66, 0xFF]);
        assert_eq!(sym.as_bytes(), &[0x66, 0xFF]);
        assert!(sym.as_str().is_none());
        assert_eq!(sym.len(), 2);
    }

    #[test]
    fn display_uses_colon_prefix() {
        assert_eq!(Symbol::from("foo").to_string(), ":foo");
        assert_eq!(format!("{:?}", Symbol::from("foo")), "Symbol(\"foo\")");
    }
}
