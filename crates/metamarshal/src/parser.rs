//! Byte stream → graph.

use std::fmt;
use std::io::{ErrorKind, Read};

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::{MarshalError, MarshalResult};
use crate::format::{reserved_tag_name, FormatVersion, Tag};
use crate::graph::{Graph, ObjectData, Reference};
use crate::symbol::Symbol;
use crate::value::{NodeId, Value};
use crate::varint::{decode_long, long_payload_len, MAX_LONG_BYTES};

/// Upper bound on capacity reserved from an untrusted length prefix.
const PREALLOC_LIMIT: usize = 1024;

/// Non-fatal conditions observed while parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParseWarning {
    /// The stream declares an older minor version than the one written here.
    OutdatedVersion(FormatVersion),
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutdatedVersion(given) => write!(
                f,
                "incompatible marshal file format (can be read): format version {} required; {} given",
                FormatVersion::CURRENT,
                given
            ),
        }
    }
}

/// Result of reading one tag.
enum Entry {
    Value(Value),
    Open(Frame),
}

/// A registered composite whose children are still being read.
enum Frame {
    Array {
        id: NodeId,
        remaining: usize,
    },
    Object {
        id: NodeId,
        remaining: usize,
        /// Ivar name read ahead of its value.
        name: Option<Symbol>,
    },
}

impl Frame {
    fn id(&self) -> NodeId {
        match self {
            Self::Array { id, .. } | Self::Object { id, .. } => *id,
        }
    }

    fn remaining(&self) -> usize {
        match self {
            Self::Array { remaining, .. } | Self::Object { remaining, .. } => *remaining,
        }
    }
}

/// Single-use parser over a byte source.
///
/// The object and symbol tables live in the parser and are dropped with it,
/// so nothing carries over between calls.
pub struct Parser<R> {
    src: R,
    offset: u64,
    graph: Graph,
    /// Reference nodes in order of first appearance; `@` indexes this.
    objects: Vec<NodeId>,
    /// Symbols in order of first appearance; `;` indexes this.
    symbols: Vec<Symbol>,
    warnings: Vec<ParseWarning>,
}

impl<R: Read> Parser<R> {
    pub fn new(src: R) -> Self {
        Self {
            src,
            offset: 0,
            graph: Graph::new(),
            objects: Vec::new(),
            symbols: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Read the header and exactly one object.
    ///
    /// Bytes after the root object are left unread.
    pub fn parse(mut self) -> MarshalResult<Document> {
        let major = self.read_byte()?;
        let minor = self.read_byte()?;
        let version = FormatVersion::new(major, minor);
        if !version.is_readable() {
            return Err(MarshalError::IncompatibleVersion { major, minor });
        }
        if version.is_outdated() {
            let warning = ParseWarning::OutdatedVersion(version);
            warn!("{warning}");
            self.warnings.push(warning);
        }

        let root = self.read_object()?;
        debug!(
            bytes = self.offset,
            nodes = self.graph.len(),
            symbols = self.symbols.len(),
            "parsed marshal stream"
        );

        Ok(Document {
            graph: self.graph,
            root,
            version,
            warnings: self.warnings,
        })
    }

    /// Read one complete value, including everything nested inside it.
    ///
    /// Composites waiting for children live on a heap stack rather than the
    /// call stack, so nesting depth is bounded only by the input.
    fn read_object(&mut self) -> MarshalResult<Value> {
        let mut stack: Vec<Frame> = Vec::new();
        loop {
            if let Some(Frame::Object { name, .. }) = stack.last_mut() {
                *name = Some(self.read_symbol()?);
            }

            let mut value = match self.read_entry()? {
                Entry::Value(value) => value,
                Entry::Open(frame) if frame.remaining() > 0 => {
                    stack.push(frame);
                    continue;
                }
                Entry::Open(frame) => Value::Ref(frame.id()),
            };

            // Hand the value to its parent, closing every parent it completes.
            loop {
                let Some(frame) = stack.last_mut() else {
                    return Ok(value);
                };
                self.attach(frame, value)?;
                if frame.remaining() > 0 {
                    break;
                }
                value = Value::Ref(frame.id());
                stack.pop();
            }
        }
    }

    /// Read a tag and its header. Composites come back open, already
    /// registered, with their children still on the wire.
    fn read_entry(&mut self) -> MarshalResult<Entry> {
        let offset = self.offset;
        let byte = self.read_byte()?;
        let Some(tag) = Tag::from_byte(byte) else {
            return Err(match reserved_tag_name(byte) {
                Some(name) => MarshalError::unsupported_tag(name, byte, offset),
                None => MarshalError::UnknownTag { tag: byte, offset },
            });
        };

        let value = match tag {
            Tag::Link => {
                let index = self.read_long()?;
                let id = usize::try_from(index)
                    .ok()
                    .and_then(|i| self.objects.get(i))
                    .copied()
                    .ok_or(MarshalError::BadBackreference { index, offset })?;
                Value::Ref(id)
            }
            Tag::Nil => Value::Nil,
            Tag::True => Value::True,
            Tag::False => Value::False,
            Tag::Fixnum => Value::Integer(self.read_long()?),
            Tag::Symbol => Value::Symbol(self.read_symbol_body()?),
            Tag::Symlink => Value::Symbol(self.read_symlink_body(offset)?),
            Tag::Array => {
                let len = self.read_length()?;
                let id = self.register(Reference::Array(Vec::with_capacity(
                    len.min(PREALLOC_LIMIT),
                )));
                return Ok(Entry::Open(Frame::Array { id, remaining: len }));
            }
            Tag::Object => {
                let class_name = self.read_symbol()?;
                let id = self.register(Reference::Object(ObjectData {
                    class_name: Some(class_name),
                    ivars: Vec::new(),
                }));
                let remaining = self.read_length()?;
                return Ok(Entry::Open(Frame::Object {
                    id,
                    remaining,
                    name: None,
                }));
            }
        };
        Ok(Entry::Value(value))
    }

    fn attach(&mut self, frame: &mut Frame, value: Value) -> MarshalResult<()> {
        match frame {
            Frame::Array { id, remaining } => {
                self.graph.push_element(*id, value)?;
                *remaining -= 1;
            }
            Frame::Object { id, remaining, name } => {
                // The name is read before every ivar value.
                if let Some(name) = name.take() {
                    self.graph.set_ivar(*id, name, value)?;
                }
                *remaining -= 1;
            }
        }
        Ok(())
    }

    /// Allocate a node and enter it in the object table before its
    /// children are read, so a child can link back to it.
    fn register(&mut self, node: Reference) -> NodeId {
        let id = self.graph.insert(node);
        self.objects.push(id);
        id
    }

    /// A symbol in a position where nothing else is allowed.
    fn read_symbol(&mut self) -> MarshalResult<Symbol> {
        let offset = self.offset;
        let byte = self.read_byte()?;
        match Tag::from_byte(byte) {
            Some(Tag::Symbol) => self.read_symbol_body(),
            Some(Tag::Symlink) => self.read_symlink_body(offset),
            _ => Err(MarshalError::ExpectedSymbol { tag: byte, offset }),
        }
    }

    fn read_symbol_body(&mut self) -> MarshalResult<Symbol> {
        let symbol = Symbol::from(self.read_bytes()?);
        self.symbols.push(symbol.clone());
        Ok(symbol)
    }

    fn read_symlink_body(&mut self, offset: u64) -> MarshalResult<Symbol> {
        let index = self.read_long()?;
        usize::try_from(index)
            .ok()
            .and_then(|i| self.symbols.get(i))
            .cloned()
            .ok_or(MarshalError::BadSymbolReference { index, offset })
    }

    // ---------------------------------------------------------------
    // Primitive reads
    // ---------------------------------------------------------------

    fn read_byte(&mut self) -> MarshalResult<u8> {
        let mut buf = [0u8; 1];
        self.fill(&mut buf)?;
        Ok(buf[0])
    }

    fn read_long(&mut self) -> MarshalResult<i64> {
        let mut buf = [0u8; 1 + MAX_LONG_BYTES];
        buf[0] = self.read_byte()?;
        let n = long_payload_len(buf[0]);
        self.fill(&mut buf[1..=n])?;
        let (value, _) = decode_long(&buf[..=n])?;
        Ok(value)
    }

    /// A non-negative count or byte length.
    fn read_length(&mut self) -> MarshalResult<usize> {
        let offset = self.offset;
        let len = self.read_long()?;
        usize::try_from(len).map_err(|_| MarshalError::NegativeLength { len, offset })
    }

    /// Length-prefixed raw bytes.
    fn read_bytes(&mut self) -> MarshalResult<Vec<u8>> {
        let len = self.read_length()?;
        let mut out = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        let got = (&mut self.src).take(len as u64).read_to_end(&mut out)?;
        self.offset += got as u64;
        if got < len {
            return Err(MarshalError::TruncatedInput {
                offset: self.offset,
            });
        }
        Ok(out)
    }

    fn fill(&mut self, buf: &mut [u8]) -> MarshalResult<()> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.src.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(MarshalError::TruncatedInput {
                        offset: self.offset,
                    })
                }
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }
}
