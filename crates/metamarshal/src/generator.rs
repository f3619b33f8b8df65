//! Graph → byte stream.

use std::collections::HashMap;
use std::io::Write;

use tracing::debug;

use crate::config::GeneratorConfig;
use crate::error::{MarshalError, MarshalResult};
use crate::format::{Tag, MAJOR_VERSION, MINOR_VERSION};
use crate::graph::{Graph, Reference};
use crate::symbol::Symbol;
use crate::value::{NodeId, Value};
use crate::varint::{encode_long, MAX_LONG_BYTES};

/// An array or object whose children are being written.
struct Frame<'g> {
    node: &'g Reference,
    /// Index of the next element or ivar.
    next: usize,
    /// Depth left for the children.
    depth: Option<usize>,
}

/// Single-use generator writing into a byte sink.
///
/// Identity and symbol tables are owned by the generator and dropped with
/// it. If generation fails midway, bytes already handed to the sink stay
/// there; callers that need all-or-nothing output should generate into a
/// buffer.
pub struct Generator<W> {
    dest: W,
    config: GeneratorConfig,
    /// Reference node → assignment order; `@` emits the order.
    objects: HashMap<NodeId, usize>,
    /// Symbol content → assignment order; `;` emits the order.
    symbols: HashMap<Symbol, usize>,
    written: u64,
}

impl<W: Write> Generator<W> {
    pub fn new(dest: W) -> Self {
        Self::with_config(dest, GeneratorConfig::default())
    }

    pub fn with_config(dest: W, config: GeneratorConfig) -> Self {
        Self {
            dest,
            config,
            objects: HashMap::new(),
            symbols: HashMap::new(),
            written: 0,
        }
    }

    /// Write the header and `root`, then hand the sink back.
    pub fn generate(mut self, graph: &Graph, root: &Value) -> MarshalResult<W> {
        self.write_bytes(&[MAJOR_VERSION, MINOR_VERSION])?;
        self.write_object(graph, root)?;
        self.dest.flush()?;
        debug!(
            bytes = self.written,
            objects = self.objects.len(),
            symbols = self.symbols.len(),
            "generated marshal stream"
        );
        Ok(self.dest)
    }

    /// Write `root` and everything reachable from it.
    ///
    /// Composites being written live on a heap stack rather than the call
    /// stack, so only the configured depth limit bounds nesting.
    fn write_object(&mut self, graph: &Graph, root: &Value) -> MarshalResult<()> {
        let mut stack = Vec::new();
        if let Some(frame) = self.write_value(graph, root, self.config.depth_limit)? {
            stack.push(frame);
        }

        while let Some(frame) = stack.last_mut() {
            let (node, index, depth) = (frame.node, frame.next, frame.depth);
            let child = match node {
                Reference::Array(elements) => elements.get(index),
                Reference::Object(data) => match data.ivars.get(index) {
                    Some((name, value)) => {
                        self.write_symbol(name)?;
                        Some(value)
                    }
                    None => None,
                },
                Reference::String => None,
            };
            let Some(child) = child else {
                stack.pop();
                continue;
            };
            frame.next += 1;

            if let Some(open) = self.write_value(graph, child, depth)? {
                stack.push(open);
            }
        }
        Ok(())
    }

    /// Write one value. A composite seen for the first time gets its tag
    /// and header written and comes back as a frame for its children.
    fn write_value<'g>(
        &mut self,
        graph: &'g Graph,
        value: &Value,
        remaining: Option<usize>,
    ) -> MarshalResult<Option<Frame<'g>>> {
        if remaining == Some(0) {
            return Err(MarshalError::DepthLimitExceeded {
                limit: self.config.depth_limit.unwrap_or_default(),
            });
        }

        match value {
            Value::Nil => self.write_tag(Tag::Nil)?,
            Value::True => self.write_tag(Tag::True)?,
            Value::False => self.write_tag(Tag::False)?,
            Value::Integer(n) => {
                let n = i32::try_from(*n).map_err(|_| MarshalError::IntegerTooLarge(*n))?;
                self.write_tag(Tag::Fixnum)?;
                self.write_long(n)?;
            }
            Value::Float(_) => return Err(MarshalError::unsupported("float")),
            Value::Symbol(symbol) => self.write_symbol(symbol)?,
            Value::Ref(id) => {
                let child_depth = remaining.map(|d| d - 1);
                return self.open_reference(graph, *id, child_depth);
            }
        }
        Ok(None)
    }

    fn open_reference<'g>(
        &mut self,
        graph: &'g Graph,
        id: NodeId,
        depth: Option<usize>,
    ) -> MarshalResult<Option<Frame<'g>>> {
        if let Some(&index) = self.objects.get(&id) {
            self.write_tag(Tag::Link)?;
            self.write_length(index)?;
            return Ok(None);
        }

        let node = graph.get(id)?;
        // Registered before the children so a cycle back to this node
        // resolves to its own index.
        let index = self.objects.len();
        self.objects.insert(id, index);

        match node {
            Reference::Array(elements) => {
                self.write_tag(Tag::Array)?;
                self.write_length(elements.len())?;
            }
            Reference::Object(data) => {
                let class_name = data
                    .class_name
                    .as_ref()
                    .ok_or_else(|| MarshalError::unsupported("object of an anonymous class"))?;
                self.write_tag(Tag::Object)?;
                self.write_symbol(class_name)?;
                self.write_length(data.ivars.len())?;
            }
            Reference::String => return Err(MarshalError::unsupported("string")),
        }
        Ok(Some(Frame {
            node,
            next: 0,
            depth,
        }))
    }

    fn write_symbol(&mut self, symbol: &Symbol) -> MarshalResult<()> {
        if let Some(&index) = self.symbols.get(symbol) {
            self.write_tag(Tag::Symlink)?;
            return self.write_length(index);
        }
        if !symbol.is_ascii() {
            return Err(MarshalError::UnsupportedEncoding {
                symbol: symbol.to_string_lossy().into_owned(),
            });
        }

        let index = self.symbols.len();
        self.symbols.insert(symbol.clone(), index);
        self.write_tag(Tag::Symbol)?;
        self.write_length(symbol.len())?;
        self.write_bytes(symbol.as_bytes())
    }

    // ---------------------------------------------------------------
    // Primitive writes
    // ---------------------------------------------------------------

    fn write_tag(&mut self, tag: Tag) -> MarshalResult<()> {
        self.write_bytes(&[tag.byte()])
    }

    fn write_long(&mut self, value: i32) -> MarshalResult<()> {
        let mut buf = Vec::with_capacity(1 + MAX_LONG_BYTES);
        encode_long(&mut buf, value);
        self.write_bytes(&buf)
    }

    /// Counts, lengths and table indices.
    fn write_length(&mut self, len: usize) -> MarshalResult<()> {
        let value = i32::try_from(len).map_err(|_| MarshalError::IntegerTooLarge(len as i64))?;
        self.write_long(value)
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> MarshalResult<()> {
        self.dest.write_all(bytes)?;
        self.written += bytes.len() as u64;
        Ok(())
    }
}
