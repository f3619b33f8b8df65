use crate::config::GeneratorConfig;
use crate::error::MarshalResult;
use crate::format::FormatVersion;
use crate::generator::Generator;
use crate::graph::Graph;
use crate::inspect::Inspect;
use crate::iso::isomorphic;
use crate::parser::ParseWarning;
use crate::value::Value;

/// A graph together with its root value.
///
/// This is what parsing produces; ownership of the graph passes to the
/// caller.
#[derive(Clone, Debug)]
pub struct Document {
    pub graph: Graph,
    pub root: Value,
    /// Version declared by the parsed header, or the current one for
    /// documents built in memory.
    pub version: FormatVersion,
    pub warnings: Vec<ParseWarning>,
}

impl Document {
    pub fn new(graph: Graph, root: impl Into<Value>) -> Self {
        Self {
            graph,
            root: root.into(),
            version: FormatVersion::CURRENT,
            warnings: Vec::new(),
        }
    }

    pub fn generate(&self) -> MarshalResult<Vec<u8>> {
        self.generate_with(&GeneratorConfig::default())
    }

    pub fn generate_with(&self, config: &GeneratorConfig) -> MarshalResult<Vec<u8>> {
        Generator::with_config(Vec::new(), config.clone()).generate(&self.graph, &self.root)
    }

    pub fn display(&self) -> Inspect<'_> {
        self.graph.display(&self.root)
    }

    pub fn is_isomorphic(&self, other: &Document) -> bool {
        isomorphic(&self.graph, &self.root, &other.graph, &other.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_document() {
        let mut graph = Graph::new();
        let a = graph.array(vec![1.into()]);
        let doc = Document::new(graph, a);

        assert_eq!(doc.version, FormatVersion::CURRENT);
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.generate().unwrap(), b"\x04\x08[\x06i\x06");
        assert_eq!(doc.display().to_string(), "Array([1])");
        assert!(doc.is_isomorphic(&doc.clone()));
    }

    #[test]
    fn generate_with_limit() {
        let mut graph = Graph::new();
        let a = graph.array(vec![1.into()]);
        let doc = Document::new(graph, a);
        assert!(doc.generate_with(&GeneratorConfig::with_depth_limit(1)).is_err());
        assert!(doc.generate_with(&GeneratorConfig::with_depth_limit(2)).is_ok());
    }
}
