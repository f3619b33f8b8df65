//! Pure implementation of the marshal 4.8 binary object format.
//!
//! Translates between byte streams and in-memory object graphs while
//! preserving aliasing and cycles exactly: parsing then generating
//! reproduces the input bytes, and generating then parsing yields a graph
//! isomorphic to the original.
//!
//! # Architecture
//!
//! - **Graph** (`graph`): arena of reference nodes; a [`NodeId`] is a node's identity
//! - **Parser** (`parser`): bytes → [`Document`], resolving `@` and `;` backreferences
//! - **Generator** (`generator`): graph → bytes, assigning backreference indices
//! - **Isomorphism** (`iso`): identity-aware comparison of two graphs
//!
//! Supported subset: `nil`, `true`, `false`, fixnums in the 32-bit signed
//! range, ASCII symbols, arrays and plain objects. Anything else is
//! rejected with an explicit error.

pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod generator;
pub mod graph;
pub mod inspect;
pub mod iso;
pub mod parser;
pub mod symbol;
pub mod value;
mod varint;

use std::io::{Read, Write};

pub use config::GeneratorConfig;
pub use document::Document;
pub use error::{MarshalError, MarshalResult};
pub use format::{FormatVersion, Tag, MAJOR_VERSION, MINOR_VERSION};
pub use generator::Generator;
pub use graph::{Graph, ObjectData, Reference, ReferenceKind};
pub use inspect::Inspect;
pub use iso::isomorphic;
pub use parser::{ParseWarning, Parser};
pub use symbol::Symbol;
pub use value::{NodeId, Value};

/// Parse an in-memory marshal stream.
pub fn parse(bytes: &[u8]) -> MarshalResult<Document> {
    Parser::new(bytes).parse()
}

/// Parse from any byte source. Wrap slow readers in a `BufReader`.
pub fn parse_reader<R: Read>(reader: R) -> MarshalResult<Document> {
    Parser::new(reader).parse()
}

/// Generate `root` into a fresh buffer with no depth limit.
pub fn generate(graph: &Graph, root: &Value) -> MarshalResult<Vec<u8>> {
    generate_with(graph, root, &GeneratorConfig::default())
}

pub fn generate_with(
    graph: &Graph,
    root: &Value,
    config: &GeneratorConfig,
) -> MarshalResult<Vec<u8>> {
    generate_into(graph, root, Vec::new(), config)
}

/// Stream `root` into `sink` and return the sink.
pub fn generate_into<W: Write>(
    graph: &Graph,
    root: &Value,
    sink: W,
    config: &GeneratorConfig,
) -> MarshalResult<W> {
    Generator::with_config(sink, config.clone()).generate(graph, root)
}
