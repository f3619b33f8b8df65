//! Error types for marshal parsing and generation.

use thiserror::Error;

use crate::graph::ReferenceKind;
use crate::value::NodeId;

/// Errors raised by the parser, the generator and graph mutators.
///
/// Every error aborts the whole operation; there is no partial result.
#[derive(Debug, Error)]
pub enum MarshalError {
    /// Header major mismatch, or a minor version newer than supported.
    #[error(
        "incompatible marshal file format (can't be read): format version {req_major}.{req_minor} required; {major}.{minor} given",
        req_major = crate::format::MAJOR_VERSION,
        req_minor = crate::format::MINOR_VERSION
    )]
    IncompatibleVersion { major: u8, minor: u8 },

    #[error("marshal data too short at offset {offset}")]
    TruncatedInput { offset: u64 },

    #[error("dump format error (unlinked): object index {index} at offset {offset}")]
    BadBackreference { index: i64, offset: u64 },

    #[error("bad symbol: symbol index {index} at offset {offset}")]
    BadSymbolReference { index: i64, offset: u64 },

    #[error("dump format error (0x{tag:02x}) at offset {offset}")]
    UnknownTag { tag: u8, offset: u64 },

    /// A symbol was required (class name, ivar name) but another tag was found.
    #[error("dump format error for symbol (0x{tag:02x}) at offset {offset}")]
    ExpectedSymbol { tag: u8, offset: u64 },

    #[error("negative length {len} at offset {offset}")]
    NegativeLength { len: i64, offset: u64 },

    #[error("exceed depth limit {limit}")]
    DepthLimitExceeded { limit: usize },

    #[error("integer {0} is outside the 32-bit signed fixnum range")]
    IntegerTooLarge(i64),

    #[error("unsupported symbol encoding: {symbol:?} is not ASCII")]
    UnsupportedEncoding { symbol: String },

    /// A value outside the supported subset. `tag` and `offset` are set
    /// when the parser met it on the wire.
    #[error("unsupported construct: {construct}{}", location(.tag, .offset))]
    UnsupportedConstruct {
        construct: String,
        tag: Option<u8>,
        offset: Option<u64>,
    },

    #[error("node not found in graph: {0}")]
    NodeNotFound(NodeId),

    #[error("node {node} is {actual}, expected {expected}")]
    VariantMismatch {
        node: NodeId,
        expected: ReferenceKind,
        actual: ReferenceKind,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl MarshalError {
    pub(crate) fn unsupported(construct: impl Into<String>) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
            tag: None,
            offset: None,
        }
    }

    pub(crate) fn unsupported_tag(construct: impl Into<String>, tag: u8, offset: u64) -> Self {
        Self::UnsupportedConstruct {
            construct: construct.into(),
            tag: Some(tag),
            offset: Some(offset),
        }
    }
}

fn location(tag: &Option<u8>, offset: &Option<u64>) -> String {
    match (tag, offset) {
        (Some(tag), Some(offset)) => format!(" (tag 0x{tag:02x}) at offset {offset}"),
        _ => String::new(),
    }
}

pub type MarshalResult<T> = Result<T, MarshalError>;
